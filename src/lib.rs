//! quinex – symbolic quantity extraction
//!
//! This crate parses free-text quantity expressions – `"about 344 million
//! €"`, `"$0.07/kWh to $0.16/kWh"`, `"12.5 ± 3.7%"` – into structured
//! quantities: normalized numeric values, prefixed and suffixed units
//! linked to QUDT unit classes, symbolic modifiers and uncertainty
//! expressions, together with a classification of the overall expression
//! as a single quantity, range, list, ratio or multidimensional quantity.
//!
//! The parser is stateless: all lookup tables load once and are shared
//! read-only, so one parser instance can serve concurrent callers.
//!
//! ```
//! let result = quinex::parse("about 344 million €");
//! assert_eq!(result.nbr_quantities, 1);
//! assert_eq!(result.success, Some(true));
//! ```

mod convert;
mod error;
mod filters;
mod lookups;
mod modifier;
mod normalize;
mod patterns;
mod quantity;
mod registry;
mod tokenizer;
mod types;
mod uncertainty;
mod unit;
mod value;

pub use crate::convert::{CurrencyConverter, UnitConverter};
pub use crate::error::QuinexError;
pub use crate::modifier::widen_quantity_spans;
pub use crate::normalize::{normalize_quantity_span, normalize_unit_span, rectify_quantity_span};
pub use crate::quantity::QuantityParser;
pub use crate::registry::{PLACEHOLDER_CENT, UnitInfo, UnitRegistry, currency_iso_code, is_currency_uri};
pub use crate::types::{
    Dimension, Modifier, NormalizedQuantity, NormalizedUncertainty, NormalizedValue, Number,
    ParseResult, Separator, SeparatorKind, StructureKind, Uncertainty, UncertaintyKind,
    UncertaintySlot, UncertaintyUnits, UnitComponent, UnitReference, Value,
};
pub use crate::unit::{CompoundInfo, UcumCodes, UnitParser};
pub use crate::value::{NumFormat, num2str, str2num};

use once_cell::sync::Lazy;
use rust_decimal::Decimal;

static DEFAULT_PARSER: Lazy<QuantityParser<'static>> = Lazy::new(QuantityParser::new);

/// Parse a quantity expression with the builtin registry.
///
/// ```
/// let range = quinex::parse("-0.6 to -1.2 V");
/// assert_eq!(range.kind, quinex::StructureKind::Range);
/// ```
pub fn parse(text: &str) -> ParseResult {
    DEFAULT_PARSER
        .parse(text)
        .expect("non-strict parsing is infallible")
}

/// Parse with the positional uncertainty slots collapsed into one
/// `uncertainty` field per quantity.
pub fn parse_simplified(text: &str) -> ParseResult {
    DEFAULT_PARSER
        .parse_with_options(text, true)
        .expect("non-strict parsing is infallible")
}

/// Link a unit string to QUDT unit classes with the builtin registry.
///
/// ```
/// let units = quinex::parse_unit("TWh/a").unwrap();
/// assert_eq!(units.len(), 2);
/// assert_eq!(units[1].exponent, -1);
/// ```
pub fn parse_unit(text: &str) -> Option<Vec<UnitComponent>> {
    DEFAULT_PARSER.unit_parser().parse(text)
}

/// Convert a value between two unit strings with the builtin registry.
/// Physical conversion only; currency conversion needs a configured
/// [`UnitConverter`].
pub fn convert(
    value: Decimal,
    from: &str,
    to: &str,
) -> Result<Option<(Decimal, Vec<UnitComponent>)>, QuinexError> {
    let unit_parser = DEFAULT_PARSER.unit_parser();
    let (Some(from), Some(to)) = (unit_parser.parse(from), unit_parser.parse(to)) else {
        return Ok(None);
    };
    UnitConverter::new(UnitRegistry::builtin()).convert(value, &from, &to, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_parse() {
        let result = parse("10-15 min");
        assert_eq!(result.kind, StructureKind::Range);
        assert_eq!(result.nbr_quantities, 2);
    }

    #[test]
    fn top_level_simplify_moves_uncertainty() {
        let result = parse_simplified("12.5 ± 3.7%");
        let q = &result.normalized_quantities[0];
        assert!(q.uncertainty.is_some());
        assert!(q.uncertainty_expression_pre_unit.is_none());
    }

    #[test]
    fn top_level_convert() {
        let (value, _) = convert(Decimal::from(5), "km", "m").unwrap().unwrap();
        assert_eq!(value, Decimal::from(5000));
    }
}
