//! Unit registry: the JSON lookup tables linking unit surfaces to QUDT
//! classes, plus derived indexes for dimensional aggregation and
//! similarity tie-breaks.
//!
//! Tables load once (builtin via `include_str!`, or from a directory) and
//! are read-only afterwards; a registry can be shared across threads.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;

use crate::error::QuinexError;
use crate::types::{Dimension, Number};

/// Placeholder class for bare cent surfaces; resolved against the
/// surrounding currency during conversion.
pub const PLACEHOLDER_CENT: &str = "http://qudt.org/PLACEHOLDER_CENT";

const CURRENCY_URI_PREFIXES: [&str; 2] = [
    "http://qudt.org/vocab/currency/",
    "http://qudt.org/vocab/unit/CCY_",
];

/// True for URIs of currency classes (including the cent placeholder).
pub fn is_currency_uri(uri: &str) -> bool {
    uri == PLACEHOLDER_CENT || CURRENCY_URI_PREFIXES.iter().any(|p| uri.starts_with(p))
}

/// Strip the vocabulary prefix from a currency URI, yielding the ISO 4217
/// code for regular currencies.
pub fn currency_iso_code(uri: &str) -> &str {
    CURRENCY_URI_PREFIXES
        .iter()
        .find_map(|p| uri.strip_prefix(p))
        .unwrap_or(uri)
}

#[derive(Debug, Clone, Deserialize)]
struct RawUnitInfo {
    dimension_vector: String,
    conversion_multiplier: Option<f64>,
    conversion_offset: Option<f64>,
    applicable_system: Vec<String>,
    is_currency: bool,
}

/// Conversion-relevant facts about one unit class.
#[derive(Debug, Clone)]
pub struct UnitInfo {
    pub dimension: Dimension,
    pub conversion_multiplier: Option<Number>,
    pub conversion_offset: Option<Number>,
    pub applicable_system: HashSet<String>,
    pub is_currency: bool,
}

/// All lookup tables plus derived indexes.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    symbol_lookup: HashMap<String, Vec<String>>,
    label_lookup: HashMap<String, Vec<String>>,
    priorities: HashMap<String, HashMap<String, i64>>,
    units: HashMap<String, UnitInfo>,
    ucum_codes: HashMap<String, Vec<String>>,
    /// (dimension vector, multiplier as f64 bits) → unit classes; the f64
    /// key gives the same equality semantics the tables were curated with.
    aggregation_index: HashMap<(String, u64), Vec<String>>,
    surfaces_by_uri: HashMap<String, Vec<String>>,
}

static BUILTIN: Lazy<UnitRegistry> = Lazy::new(|| {
    UnitRegistry::from_json(
        include_str!("../data/unit_symbol_lookup.json"),
        include_str!("../data/unit_label_lookup.json"),
        include_str!("../data/ambiguous_unit_priorities_curated.json"),
        include_str!("../data/unit_dimensions_and_kinds.json"),
        Some(include_str!("../data/ucum_codes.json")),
    )
    .expect("builtin lookup tables are well-formed")
});

impl UnitRegistry {
    /// The registry shipped with the crate.
    pub fn builtin() -> &'static UnitRegistry {
        &BUILTIN
    }

    /// Load lookup tables from a directory holding the JSON files of the
    /// data contract (`unit_symbol_lookup.json`, `unit_label_lookup.json`,
    /// `ambiguous_unit_priorities_curated.json`,
    /// `unit_dimensions_and_kinds.json`). `ucum_codes.json` is optional.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, QuinexError> {
        let dir = dir.as_ref();
        let read = |name: &str| -> Result<String, QuinexError> {
            std::fs::read_to_string(dir.join(name)).map_err(|source| QuinexError::LookupIo {
                path: dir.join(name).display().to_string(),
                source,
            })
        };
        let symbols = read("unit_symbol_lookup.json")?;
        let labels = read("unit_label_lookup.json")?;
        let priorities = read("ambiguous_unit_priorities_curated.json")?;
        let dimensions = read("unit_dimensions_and_kinds.json")?;
        let ucum = if dir.join("ucum_codes.json").exists() {
            Some(read("ucum_codes.json")?)
        } else {
            None
        };
        Self::from_json(&symbols, &labels, &priorities, &dimensions, ucum.as_deref())
    }

    fn from_json(
        symbols: &str,
        labels: &str,
        priorities: &str,
        dimensions: &str,
        ucum: Option<&str>,
    ) -> Result<Self, QuinexError> {
        fn decode<T: serde::de::DeserializeOwned>(s: &str, path: &str) -> Result<T, QuinexError> {
            serde_json::from_str(s).map_err(|source| QuinexError::LookupFormat {
                path: path.to_string(),
                source,
            })
        }

        let symbol_lookup: HashMap<String, Vec<String>> = decode(symbols, "unit_symbol_lookup.json")?;
        let label_lookup: HashMap<String, Vec<String>> = decode(labels, "unit_label_lookup.json")?;
        let raw_priorities: HashMap<String, HashMap<String, Option<i64>>> =
            decode(priorities, "ambiguous_unit_priorities_curated.json")?;
        let raw_units: HashMap<String, RawUnitInfo> =
            decode(dimensions, "unit_dimensions_and_kinds.json")?;
        let ucum_codes: HashMap<String, Vec<String>> = match ucum {
            Some(s) => decode(s, "ucum_codes.json")?,
            None => HashMap::new(),
        };

        // Null priorities mark curated-out links; drop them and any
        // surface left without candidates.
        let mut curated: HashMap<String, HashMap<String, i64>> = HashMap::new();
        for (surface, prios) in raw_priorities {
            let kept: HashMap<String, i64> = prios
                .into_iter()
                .filter_map(|(uri, p)| p.map(|p| (uri, p)))
                .collect();
            if !kept.is_empty() {
                curated.insert(surface, kept);
            }
        }

        let mut units: HashMap<String, UnitInfo> = HashMap::new();
        let mut aggregation_index: HashMap<(String, u64), Vec<String>> = HashMap::new();
        for (uri, raw) in raw_units {
            let dimension = Dimension::parse(&raw.dimension_vector).ok_or_else(|| {
                QuinexError::LookupFormat {
                    path: "unit_dimensions_and_kinds.json".into(),
                    source: serde::de::Error::custom(format!(
                        "bad dimension vector for {uri}: {}",
                        raw.dimension_vector
                    )),
                }
            })?;
            if let Some(m) = raw.conversion_multiplier {
                aggregation_index
                    .entry((raw.dimension_vector.clone(), m.to_bits()))
                    .or_default()
                    .push(uri.clone());
            }
            units.insert(
                uri,
                UnitInfo {
                    dimension,
                    conversion_multiplier: raw.conversion_multiplier.and_then(Decimal::from_f64),
                    conversion_offset: raw.conversion_offset.and_then(Decimal::from_f64),
                    applicable_system: raw.applicable_system.into_iter().collect(),
                    is_currency: raw.is_currency,
                },
            );
        }
        for uris in aggregation_index.values_mut() {
            uris.sort();
        }

        let mut surfaces_by_uri: HashMap<String, Vec<String>> = HashMap::new();
        for (surface, uris) in symbol_lookup.iter().chain(label_lookup.iter()) {
            for uri in uris {
                surfaces_by_uri
                    .entry(uri.clone())
                    .or_default()
                    .push(surface.clone());
            }
        }
        for surfaces in surfaces_by_uri.values_mut() {
            surfaces.sort();
            surfaces.dedup();
        }

        Ok(Self {
            symbol_lookup,
            label_lookup,
            priorities: curated,
            units,
            ucum_codes,
            aggregation_index,
            surfaces_by_uri,
        })
    }

    /// Case-sensitive symbol matches for a surface.
    pub fn symbol_matches(&self, surface: &str) -> &[String] {
        self.symbol_lookup.get(surface).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Label matches for an already-lowercased surface.
    pub fn label_matches(&self, lowercased: &str) -> &[String] {
        self.label_lookup.get(lowercased).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Curated priorities for an ambiguous surface, if any.
    pub fn priorities_for(&self, surface: &str) -> Option<&HashMap<String, i64>> {
        self.priorities.get(surface)
    }

    pub fn info(&self, uri: &str) -> Option<&UnitInfo> {
        self.units.get(uri)
    }

    pub fn ucum_codes_for(&self, uri: &str) -> &[String] {
        self.ucum_codes.get(uri).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_ucum_codes(&self) -> bool {
        !self.ucum_codes.is_empty()
    }

    /// Unit classes sharing a dimension vector and conversion multiplier.
    pub fn aggregation_candidates(&self, dimension_vector: &str, multiplier: Number) -> &[String] {
        let Ok(m) = f64::try_from(multiplier) else {
            return &[];
        };
        self.aggregation_index
            .get(&(dimension_vector.to_string(), m.to_bits()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Known surface forms (symbols and labels) of a unit class.
    pub fn surfaces(&self, uri: &str) -> &[String] {
        self.surfaces_by_uri.get(uri).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_load() {
        let reg = UnitRegistry::builtin();
        assert!(!reg.symbol_matches("km").is_empty());
        assert!(!reg.label_matches("kilometer").is_empty());
        assert!(reg.info("http://qudt.org/vocab/unit/KiloW-HR").is_some());
        assert!(reg.info(PLACEHOLDER_CENT).is_some());
    }

    #[test]
    fn currency_predicates() {
        assert!(is_currency_uri("http://qudt.org/vocab/unit/CCY_USD"));
        assert!(is_currency_uri(PLACEHOLDER_CENT));
        assert!(!is_currency_uri("http://qudt.org/vocab/unit/KiloM"));
        assert_eq!(currency_iso_code("http://qudt.org/vocab/unit/CCY_EUR"), "EUR");
    }

    #[test]
    fn aggregation_index_uses_multiplier_equality() {
        let reg = UnitRegistry::builtin();
        let candidates = reg.aggregation_candidates("A0E0L-3I0M1H0T0D0", Decimal::new(1, 3));
        assert!(candidates.contains(&"http://qudt.org/vocab/unit/MicroGM-PER-MilliL".to_string()));
    }

    #[test]
    fn blocked_priorities_are_dropped() {
        let reg = UnitRegistry::builtin();
        let prios = reg.priorities_for("a").unwrap();
        assert!(prios.contains_key("http://qudt.org/vocab/unit/YR"));
        assert!(!prios.contains_key("http://qudt.org/vocab/unit/ARE"));
    }
}
