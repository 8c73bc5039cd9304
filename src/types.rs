//! Data model for parsed quantity expressions.
//!
//! A parse yields one [`ParseResult`] holding the original text, the
//! superstructure kind (single quantity, range, list, ratio or
//! multidimensional), the separators between quantities, and one
//! [`NormalizedQuantity`] per individual quantity. All entities are
//! immutable per parse; nothing is shared between parses.

use core::fmt;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Numeric type used for all normalized values and conversion factors.
pub type Number = Decimal;

/// QUDT dimension vector over eight base dimensions: amount of substance,
/// electric current, length, luminous intensity, mass, temperature, time
/// and a dimensionless slot.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension(pub [i32; 8]);

impl Dimension {
    pub const fn zero() -> Self {
        Self([0; 8])
    }

    /// True when the first seven slots are all zero.
    pub fn is_dimensionless(&self) -> bool {
        self.0[..7].iter().all(|&d| d == 0)
    }

    /// Parse the QUDT string form, e.g. `"A0E0L1I0M0H0T-1D0"`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut out = [0i32; 8];
        let mut rest = s;
        for (i, tag) in ['A', 'E', 'L', 'I', 'M', 'H', 'T', 'D'].into_iter().enumerate() {
            rest = rest.strip_prefix(tag)?;
            let end = rest
                .char_indices()
                .find(|&(j, c)| !(c == '-' && j == 0) && !c.is_ascii_digit())
                .map(|(j, _)| j)
                .unwrap_or(rest.len());
            let (num, tail) = rest.split_at(end);
            out[i] = if num.is_empty() { 0 } else { num.parse().ok()? };
            rest = tail;
        }
        rest.is_empty().then_some(Self(out))
    }

    /// Render the QUDT string form used as aggregation index key.
    pub fn encode(&self) -> String {
        let v = &self.0;
        format!(
            "A{}E{}L{}I{}M{}H{}T{}D{}",
            v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7]
        )
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// One component of a (possibly compound) linked unit: the surface form,
/// its exponent (negative for denominators), the linked unit class URI and
/// the year attached to currency units (e.g. `$2021`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitComponent {
    pub surface: String,
    pub exponent: i32,
    pub uri: String,
    pub year: Option<i32>,
}

impl UnitComponent {
    pub fn new(surface: impl Into<String>, exponent: i32, uri: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            exponent,
            uri: uri.into(),
            year: None,
        }
    }
}

/// A unit slot of a quantity. When the unit was ellipsed from a
/// neighbouring quantity (`"1, 2 and 3 km"`), `text` is `None` and
/// `ellipsed_text` carries the surface it was copied from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitReference {
    pub text: Option<String>,
    pub ellipsed_text: Option<String>,
    pub normalized: Option<Vec<UnitComponent>>,
}

/// Normalized numeric value. Either `numeric_value` is set, or the value
/// was an imprecise phrase (`"several"`, `"tens of thousands"`) and
/// `is_imprecise` is true. `order_of_magnitude` records an explicitly
/// expressed power of ten (already folded into `numeric_value`); it drives
/// magnitude ellipsis across lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedValue {
    pub numeric_value: Option<Number>,
    pub is_imprecise: bool,
    pub order_of_magnitude: Option<i32>,
}

/// A value slot: raw surface plus its normalization, if any.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub text: Option<String>,
    pub normalized: Option<NormalizedValue>,
}

/// A quantity modifier slot (`"about"`, `"at least"`, `"≥"`, ...),
/// normalized to a symbolic operator where the surface is known.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub text: String,
    pub normalized: Option<String>,
}

/// Kind of an uncertainty expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyKind {
    Tolerance,
    StandardDeviation,
    #[serde(rename = "CI")]
    ConfidenceInterval,
    #[serde(rename = "UI")]
    UncertaintyInterval,
    #[serde(rename = "CrI")]
    CredibleInterval,
    Unknown,
}

/// Position of a unit inside an uncertainty expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintySlot {
    Prefixed,
    Suffixed,
    PrefixedLb,
    SuffixedLb,
    PrefixedUb,
    SuffixedUb,
}

/// Units carried by an uncertainty expression. `is_same_as_mean` is true
/// when every unit surface inside the expression equals the corresponding
/// unit of the quantity it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyUnits {
    pub is_same_as_mean: bool,
    pub normalized: Option<BTreeMap<UncertaintySlot, UnitReference>>,
}

/// Normalized uncertainty: a typed `(lower, upper)` interval around the
/// mean. Tolerances and standard deviations are stored as `(-x, +x)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedUncertainty {
    #[serde(rename = "type")]
    pub kind: UncertaintyKind,
    pub value: (Option<Number>, Option<Number>),
    pub unit: UncertaintyUnits,
}

/// An uncertainty slot: raw surface plus its normalization, if any.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Uncertainty {
    pub text: String,
    pub normalized: Option<NormalizedUncertainty>,
}

/// One individual quantity, split into its seven positional slots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuantity {
    pub prefixed_modifier: Option<Modifier>,
    pub prefixed_unit: Option<UnitReference>,
    pub value: Option<Value>,
    pub uncertainty_expression_pre_unit: Option<Uncertainty>,
    pub suffixed_unit: Option<UnitReference>,
    pub uncertainty_expression_post_unit: Option<Uncertainty>,
    pub suffixed_modifier: Option<Modifier>,
    /// Filled by [`ParseResult::simplify`]; otherwise `None`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uncertainty: Option<Uncertainty>,
}

/// Superstructure kind of a quantity expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    SingleQuantity,
    Range,
    List,
    Ratio,
    Multidim,
    #[default]
    Unknown,
}

/// Kind of separator between two quantities in a superstructure.
/// `ModifierBoundary` marks a prefixed modifier promoted to a quantity
/// boundary; it does not define a structure on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparatorKind {
    RangeSeparator,
    ListSeparator,
    MultidimSeparator,
    RatioSeparator,
    ModifierBoundary,
}

impl SeparatorKind {
    pub fn structure(self) -> StructureKind {
        match self {
            SeparatorKind::RangeSeparator => StructureKind::Range,
            SeparatorKind::ListSeparator => StructureKind::List,
            SeparatorKind::MultidimSeparator => StructureKind::Multidim,
            SeparatorKind::RatioSeparator => StructureKind::Ratio,
            SeparatorKind::ModifierBoundary => StructureKind::Unknown,
        }
    }
}

/// A separator surface and its role, in superstructure order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Separator {
    pub text: String,
    pub kind: SeparatorKind,
}

/// Result of parsing one quantity expression.
///
/// `success` is tri-state: `Some(true)` for a clean parse, `Some(false)`
/// for a failed or very unlikely one, `None` when the parse succeeded
/// formally but carries unlikely parts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: StructureKind,
    pub nbr_quantities: usize,
    pub normalized_quantities: Vec<NormalizedQuantity>,
    pub separators: Vec<Separator>,
    pub success: Option<bool>,
}

impl ParseResult {
    /// Collapse the positional uncertainty slots into the single
    /// `uncertainty` field of each quantity.
    pub fn simplify(&mut self) {
        for q in &mut self.normalized_quantities {
            if q.uncertainty_expression_pre_unit.is_some() {
                q.uncertainty = q.uncertainty_expression_pre_unit.take();
                q.uncertainty_expression_post_unit = None;
            } else if q.uncertainty_expression_post_unit.is_some() {
                q.uncertainty = q.uncertainty_expression_post_unit.take();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_roundtrip() {
        let d = Dimension::parse("A0E0L-2I0M-1H0T3D0").unwrap();
        assert_eq!(d.0, [0, 0, -2, 0, -1, 0, 3, 0]);
        assert_eq!(d.encode(), "A0E0L-2I0M-1H0T3D0");
        assert!(!d.is_dimensionless());
        assert!(Dimension::parse("A0E0L0I0M0H0T0D1").unwrap().is_dimensionless());
    }

    #[test]
    fn dimension_rejects_garbage() {
        assert!(Dimension::parse("L1T-1").is_none());
        assert!(Dimension::parse("A0E0L1I0M0H0T0D0x").is_none());
    }

    #[test]
    fn structure_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&StructureKind::SingleQuantity).unwrap(),
            "\"single_quantity\""
        );
        assert_eq!(
            serde_json::to_string(&UncertaintyKind::ConfidenceInterval).unwrap(),
            "\"CI\""
        );
    }
}
