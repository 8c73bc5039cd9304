//! Uncertainty-expression normalization: tolerances, typed and untyped
//! intervals and standard deviations, with unit linking against the
//! surrounding quantity.

use regex::Captures;

use crate::patterns::{
    STD_DEV_KEYWORD_FIRST, STD_DEV_VALUE_FIRST, TOLERANCE, TYPED_INTERVAL, UNTYPED_INTERVAL_BARE,
};
use crate::types::{
    NormalizedUncertainty, Number, Uncertainty, UncertaintyKind, UncertaintySlot, UncertaintyUnits,
    UnitReference,
};
use crate::unit::UnitParser;
use crate::value::{CastOptions, cast_value};

use std::collections::BTreeMap;

fn cast_bound(span: &str) -> Option<Number> {
    cast_value(
        span,
        CastOptions {
            consider_num_words: true,
            normalize_chars: false,
            skip_magnitude: false,
        },
    )
}

/// Account for the range grammar being slightly too greedy around
/// brackets.
fn clean_suffixed_unit(span: &str) -> Option<String> {
    let mut s = span;
    s = s.strip_suffix(')').unwrap_or(s);
    s = s.strip_suffix(']').unwrap_or(s);
    s = s.strip_prefix(')').unwrap_or(s);
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn interval_kind(keyword: &str) -> UncertaintyKind {
    let lowered = keyword.to_lowercase();
    if lowered.contains("cri") || lowered.contains("credible") {
        UncertaintyKind::CredibleInterval
    } else if lowered.contains("ui") || lowered.contains("uncertainty") {
        UncertaintyKind::UncertaintyInterval
    } else {
        UncertaintyKind::ConfidenceInterval
    }
}

struct RawUnits {
    prefixed: Option<String>,
    suffixed: Option<String>,
    prefixed_lb: Option<String>,
    suffixed_lb: Option<String>,
    prefixed_ub: Option<String>,
    suffixed_ub: Option<String>,
}

impl RawUnits {
    fn empty() -> Self {
        Self {
            prefixed: None,
            suffixed: None,
            prefixed_lb: None,
            suffixed_lb: None,
            prefixed_ub: None,
            suffixed_ub: None,
        }
    }

    fn none_present(&self) -> bool {
        self.prefixed.is_none()
            && self.suffixed.is_none()
            && self.prefixed_lb.is_none()
            && self.suffixed_lb.is_none()
            && self.prefixed_ub.is_none()
            && self.suffixed_ub.is_none()
    }
}

fn group(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.trim().is_empty())
}

/// Link one unit surface inside an uncertainty expression.
fn unit_reference(unit_parser: &UnitParser<'_>, span: &str) -> UnitReference {
    UnitReference {
        text: Some(span.to_string()),
        ellipsed_text: None,
        normalized: unit_parser.parse_with_exponent(span, 1, true),
    }
}

/// Normalize one uncertainty expression against the units of the
/// quantity it annotates. Units whose surface equals the corresponding
/// center unit set `is_same_as_mean` instead of being linked separately.
pub(crate) fn normalize_uncertainty_expression(
    unit_parser: &UnitParser<'_>,
    raw: &str,
    center_prefixed: Option<&UnitReference>,
    center_suffixed: Option<&UnitReference>,
) -> Option<Uncertainty> {
    if raw.is_empty() {
        return None;
    }
    let expr = raw.strip_prefix(", ").unwrap_or(raw).trim_end().to_string();

    let mut kind = UncertaintyKind::Unknown;
    let mut range: Option<(Option<Number>, Option<Number>)> = None;
    let mut units = RawUnits::empty();

    if let Some(caps) = TOLERANCE.captures(&expr) {
        kind = UncertaintyKind::Tolerance;
        let value = group(&caps, "num").and_then(|v| cast_bound(&v));
        range = Some((value.map(|v| -v), value));
        units.prefixed = group(&caps, "pfx");
        units.suffixed = group(&caps, "sfx").as_deref().and_then(clean_suffixed_unit);
    } else if let Some(caps) = TYPED_INTERVAL.captures(&expr) {
        kind = interval_kind(caps.name("typ").map_or("", |m| m.as_str()));
        let lb = group(&caps, "num_lb").and_then(|v| cast_bound(&v));
        let ub = group(&caps, "num_ub").and_then(|v| cast_bound(&v));
        range = Some((lb, ub));
        units.prefixed_lb = group(&caps, "pfx_lb");
        units.suffixed_lb = group(&caps, "sfx_lb");
        units.prefixed_ub = group(&caps, "pfx_ub");
        units.suffixed_ub = group(&caps, "sfx_ub").as_deref().and_then(clean_suffixed_unit);
    } else if let Some(caps) = UNTYPED_INTERVAL_BARE.captures(&expr) {
        kind = UncertaintyKind::Unknown;
        let lb = group(&caps, "num_lb").and_then(|v| cast_bound(&v));
        let ub = group(&caps, "num_ub").and_then(|v| cast_bound(&v));
        range = Some((lb, ub));
        units.prefixed_lb = group(&caps, "pfx_lb");
        units.suffixed_lb = group(&caps, "sfx_lb");
        units.prefixed_ub = group(&caps, "pfx_ub");
        units.suffixed_ub = group(&caps, "sfx_ub").as_deref().and_then(clean_suffixed_unit);
    } else if let Some(caps) = STD_DEV_KEYWORD_FIRST
        .captures(&expr)
        .or_else(|| STD_DEV_VALUE_FIRST.captures(&expr))
    {
        kind = UncertaintyKind::StandardDeviation;
        let value = group(&caps, "num").and_then(|v| cast_bound(&v));
        range = Some((value.map(|v| -v), value));
        units.prefixed = group(&caps, "pfx");
        units.suffixed = group(&caps, "sfx").as_deref().and_then(clean_suffixed_unit);
    }

    let normalized = range.map(|range| {
        let mut is_same_as_mean = false;
        let mut normalized_units: Option<BTreeMap<UncertaintySlot, UnitReference>> = None;

        if units.none_present() {
            is_same_as_mean = true;
        } else {
            let mut map = BTreeMap::new();
            let center_prefixed_text = center_prefixed.and_then(|u| u.text.as_deref());
            let center_suffixed_text = center_suffixed.and_then(|u| u.text.as_deref());
            let link = |slot: UncertaintySlot, surface: &Option<String>, center: Option<&str>,
                            map: &mut BTreeMap<UncertaintySlot, UnitReference>,
                            same: &mut bool| {
                if let Some(surface) = surface {
                    if center == Some(surface.as_str()) {
                        *same = true;
                    } else {
                        *same = false;
                        map.insert(slot, unit_reference(unit_parser, surface));
                    }
                }
            };
            link(UncertaintySlot::Prefixed, &units.prefixed, center_prefixed_text, &mut map, &mut is_same_as_mean);
            link(UncertaintySlot::Suffixed, &units.suffixed, center_suffixed_text, &mut map, &mut is_same_as_mean);
            link(UncertaintySlot::PrefixedLb, &units.prefixed_lb, center_prefixed_text, &mut map, &mut is_same_as_mean);
            link(UncertaintySlot::SuffixedLb, &units.suffixed_lb, center_suffixed_text, &mut map, &mut is_same_as_mean);
            link(UncertaintySlot::PrefixedUb, &units.prefixed_ub, center_prefixed_text, &mut map, &mut is_same_as_mean);
            link(UncertaintySlot::SuffixedUb, &units.suffixed_ub, center_suffixed_text, &mut map, &mut is_same_as_mean);
            normalized_units = Some(map);
        }

        NormalizedUncertainty {
            kind,
            value: range,
            unit: UncertaintyUnits {
                is_same_as_mean,
                normalized: normalized_units,
            },
        }
    });

    Some(Uncertainty {
        text: expr,
        normalized,
    })
}

/// Formal validity of a normalized uncertainty expression: both bounds
/// parsed, lower ≤ upper when units agree, and no chimera of one linked
/// and one foreign unit surface.
pub(crate) fn uncertainty_is_valid(uncertainty: &Uncertainty) -> bool {
    let Some(normalized) = &uncertainty.normalized else {
        return false;
    };

    let (lb, ub) = &normalized.value;
    let (Some(lb), Some(ub)) = (lb, ub) else {
        return false;
    };

    if let Some(units) = &normalized.unit.normalized {
        if units.len() == 2 {
            let linked: Vec<&UnitReference> =
                units.values().filter(|u| u.normalized.is_some()).collect();
            let unlinked: Vec<&UnitReference> =
                units.values().filter(|u| u.normalized.is_none()).collect();
            if linked.len() == 1 && unlinked.len() == 1 {
                let linked_text = linked[0].text.as_deref().unwrap_or("");
                let unlinked_text = unlinked[0].text.as_deref().unwrap_or("");
                if !unlinked_text.contains(linked_text) {
                    // Two very different surfaces ('th percentile' next to
                    // 'SEK/kWh') mean this is not a real interval.
                    return false;
                }
            }
        }
    }

    if lb >= ub {
        let units_match = match &normalized.unit.normalized {
            None => true,
            Some(units) if units.len() <= 1 => true,
            Some(units) => {
                let texts: std::collections::HashSet<&str> = units
                    .values()
                    .map(|u| u.text.as_deref().unwrap_or(""))
                    .collect();
                texts.len() == 1
            }
        };
        if units_match {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::UnitRegistry;
    use rust_decimal::Decimal;

    fn parser() -> UnitParser<'static> {
        UnitParser::new(UnitRegistry::builtin())
    }

    fn normalize(raw: &str) -> Option<Uncertainty> {
        normalize_uncertainty_expression(&parser(), raw, None, None)
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn tolerance_is_symmetric() {
        let u = normalize("± 3.7%").unwrap();
        let n = u.normalized.unwrap();
        assert_eq!(n.kind, UncertaintyKind::Tolerance);
        assert_eq!(n.value, (Some(d("-3.7")), Some(d("3.7"))));
        assert!(!n.unit.is_same_as_mean);
        let units = n.unit.normalized.unwrap();
        let pct = &units[&UncertaintySlot::Suffixed];
        assert_eq!(pct.text.as_deref(), Some("%"));
        assert_eq!(
            pct.normalized.as_ref().unwrap()[0].uri,
            "http://qudt.org/vocab/unit/PERCENT"
        );
    }

    #[test]
    fn confidence_interval_bounds() {
        let u = normalize("(95% CI 1.92-2.65)").unwrap();
        let n = u.normalized.unwrap();
        assert_eq!(n.kind, UncertaintyKind::ConfidenceInterval);
        assert_eq!(n.value, (Some(d("1.92")), Some(d("2.65"))));
        assert!(n.unit.is_same_as_mean);
        assert!(uncertainty_is_valid(&Uncertainty {
            text: String::new(),
            normalized: Some(n),
        }));
    }

    #[test]
    fn credible_and_uncertainty_intervals() {
        let u = normalize("(95% credible interval: 4.08-7.55)").unwrap();
        assert_eq!(u.normalized.unwrap().kind, UncertaintyKind::CredibleInterval);
        let u = normalize("(95% UI = 1.5-4.5)").unwrap();
        assert_eq!(u.normalized.unwrap().kind, UncertaintyKind::UncertaintyInterval);
    }

    #[test]
    fn standard_deviation_both_orders() {
        let u = normalize("(SD 4.27)").unwrap();
        let n = u.normalized.unwrap();
        assert_eq!(n.kind, UncertaintyKind::StandardDeviation);
        assert_eq!(n.value, (Some(d("-4.27")), Some(d("4.27"))));

        let u = normalize("(2.1 SD)").unwrap();
        assert_eq!(u.normalized.unwrap().kind, UncertaintyKind::StandardDeviation);
    }

    #[test]
    fn same_as_mean_detection() {
        let center = UnitReference {
            text: Some("%".into()),
            ellipsed_text: None,
            normalized: None,
        };
        let u =
            normalize_uncertainty_expression(&parser(), "± 3.7%", None, Some(&center)).unwrap();
        let n = u.normalized.unwrap();
        assert!(n.unit.is_same_as_mean);
        assert!(n.unit.normalized.unwrap().is_empty());
    }

    #[test]
    fn reversed_interval_is_invalid() {
        let u = normalize("(95% CI 2.65-1.92)").unwrap();
        assert!(!uncertainty_is_valid(&u));
    }

    #[test]
    fn chimera_of_linked_and_foreign_unit_is_invalid() {
        // One bound carries a real unit, the other a percentile phrase:
        // not an interval.
        let u = normalize("25th percentile to 1.15 SEK/kWh").unwrap();
        assert!(!uncertainty_is_valid(&u));
    }

    #[test]
    fn garbage_is_unnormalized() {
        let u = normalize("not an interval").unwrap();
        assert!(u.normalized.is_none());
        assert!(!uncertainty_is_valid(&u));
    }
}
