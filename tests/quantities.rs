//! End-to-end scenarios for the quantity parser: representative inputs
//! from scientific and economic text, plus structural invariants.

use quinex::{Number, NormalizedQuantity, ParseResult, StructureKind, UncertaintyKind, parse};
use rust_decimal::Decimal;

const U: &str = "http://qudt.org/vocab/unit/";

fn d(s: &str) -> Number {
    s.parse().unwrap()
}

fn value_of(q: &NormalizedQuantity) -> Option<Number> {
    q.value.as_ref()?.normalized.as_ref()?.numeric_value
}

fn suffixed_uri(q: &NormalizedQuantity) -> Option<&str> {
    Some(q.suffixed_unit.as_ref()?.normalized.as_ref()?.first()?.uri.as_str())
}

fn assert_invariants(result: &ParseResult) {
    if result.success != Some(false) {
        assert_eq!(result.nbr_quantities, result.normalized_quantities.len());
    }
    if !result.normalized_quantities.is_empty() {
        assert_eq!(result.separators.len(), result.nbr_quantities - 1);
    }
}

#[test]
fn approximate_amount_with_magnitude_and_currency() {
    let result = parse("about 344 million €");
    assert_eq!(result.kind, StructureKind::SingleQuantity);
    assert_eq!(result.success, Some(true));
    assert_invariants(&result);

    let q = &result.normalized_quantities[0];
    assert_eq!(q.prefixed_modifier.as_ref().unwrap().normalized.as_deref(), Some("~"));
    assert_eq!(value_of(q), Some(d("344000000")));
    assert_eq!(suffixed_uri(q), Some(&*format!("{U}CCY_EUR")));
}

#[test]
fn price_range_with_prefixed_and_suffixed_units() {
    let result = parse("$0.07/kWh to $0.16/kWh");
    assert_eq!(result.kind, StructureKind::Range);
    assert_eq!(result.nbr_quantities, 2);
    assert_invariants(&result);

    let values: Vec<_> = result.normalized_quantities.iter().map(value_of).collect();
    assert_eq!(values, vec![Some(d("0.07")), Some(d("0.16"))]);
    for q in &result.normalized_quantities {
        let prefixed = q.prefixed_unit.as_ref().unwrap().normalized.as_ref().unwrap();
        assert_eq!(prefixed[0].uri, format!("{U}CCY_USD"));
        let suffixed = q.suffixed_unit.as_ref().unwrap().normalized.as_ref().unwrap();
        assert_eq!(suffixed[0].uri, format!("{U}KiloW-HR"));
        assert_eq!(suffixed[0].exponent, -1);
    }
}

#[test]
fn negative_voltage_range() {
    let result = parse("−0.6 to −1.2 V");
    assert_eq!(result.kind, StructureKind::Range);
    assert_invariants(&result);

    let values: Vec<_> = result.normalized_quantities.iter().map(value_of).collect();
    assert_eq!(values, vec![Some(d("-0.6")), Some(d("-1.2"))]);
    let last = &result.normalized_quantities[1];
    assert_eq!(suffixed_uri(last), Some(&*format!("{U}V")));
    // The first bound inherits the voltage unit by ellipsis.
    let first_unit = result.normalized_quantities[0].suffixed_unit.as_ref().unwrap();
    assert_eq!(first_unit.text, None);
    assert_eq!(first_unit.ellipsed_text.as_deref(), Some("V"));
}

#[test]
fn tolerance_in_percent() {
    let result = parse("12.5 ± 3.7%");
    assert_eq!(result.kind, StructureKind::SingleQuantity);
    assert_invariants(&result);

    let q = &result.normalized_quantities[0];
    assert_eq!(value_of(q), Some(d("12.5")));
    assert_eq!(suffixed_uri(q), Some(&*format!("{U}PERCENT")));

    let unc = q.uncertainty_expression_pre_unit.as_ref().unwrap();
    let normalized = unc.normalized.as_ref().unwrap();
    assert_eq!(normalized.kind, UncertaintyKind::Tolerance);
    assert_eq!(normalized.value, (Some(d("-3.7")), Some(d("3.7"))));
}

#[test]
fn confidence_interval() {
    let result = parse("2.25 (95% CI 1.92-2.65)");
    assert_eq!(result.kind, StructureKind::SingleQuantity);
    assert_invariants(&result);

    let q = &result.normalized_quantities[0];
    assert_eq!(value_of(q), Some(d("2.25")));
    let normalized = q
        .uncertainty_expression_pre_unit
        .as_ref()
        .unwrap()
        .normalized
        .as_ref()
        .unwrap();
    assert_eq!(normalized.kind, UncertaintyKind::ConfidenceInterval);
    assert_eq!(normalized.value, (Some(d("1.92")), Some(d("2.65"))));
}

#[test]
fn comma_separated_confidence_interval() {
    let result = parse("2.30, 95% CI 1.03–5.13");
    assert_eq!(result.kind, StructureKind::SingleQuantity);
    let q = &result.normalized_quantities[0];
    assert_eq!(value_of(q), Some(d("2.30")));
    let normalized = q
        .uncertainty_expression_pre_unit
        .as_ref()
        .unwrap()
        .normalized
        .as_ref()
        .unwrap();
    assert_eq!(normalized.kind, UncertaintyKind::ConfidenceInterval);
    assert_eq!(normalized.value, (Some(d("1.03")), Some(d("5.13"))));
}

#[test]
fn three_dimensional_measurement() {
    let result = parse("100 mm x 100 mm x 400 mm");
    assert_eq!(result.kind, StructureKind::Multidim);
    assert_eq!(result.nbr_quantities, 3);
    assert_invariants(&result);
    let values: Vec<_> = result.normalized_quantities.iter().map(value_of).collect();
    assert_eq!(values, vec![Some(d("100")), Some(d("100")), Some(d("400"))]);
}

#[test]
fn list_with_ellipsed_unit_and_magnitude() {
    let result = parse("1, 2, 3, and 4 million km");
    assert_eq!(result.kind, StructureKind::List);
    assert_eq!(result.nbr_quantities, 4);
    assert_invariants(&result);

    let values: Vec<_> = result.normalized_quantities.iter().map(value_of).collect();
    assert_eq!(
        values,
        vec![
            Some(d("1000000")),
            Some(d("2000000")),
            Some(d("3000000")),
            Some(d("4000000")),
        ]
    );
    for q in &result.normalized_quantities[..3] {
        let unit = q.suffixed_unit.as_ref().unwrap();
        assert_eq!(unit.text, None);
        assert_eq!(unit.ellipsed_text.as_deref(), Some("km"));
    }
}

#[test]
fn dash_range_is_not_a_power_of_ten() {
    let result = parse("10-15 min");
    assert_eq!(result.kind, StructureKind::Range);
    let values: Vec<_> = result.normalized_quantities.iter().map(value_of).collect();
    assert_eq!(values, vec![Some(d("10")), Some(d("15"))]);
}

#[test]
fn caret_power_of_ten_is_not_a_range() {
    let result = parse("10^-15 m");
    assert_eq!(result.kind, StructureKind::SingleQuantity);
    let q = &result.normalized_quantities[0];
    assert_eq!(value_of(q), Some(d("0.000000000000001")));
    assert_eq!(suffixed_uri(q), Some(&*format!("{U}M")));
}

#[test]
fn comma_decimal_with_glued_currency() {
    let result = parse("0,378$/kWh");
    assert_eq!(result.kind, StructureKind::SingleQuantity);
    let q = &result.normalized_quantities[0];
    assert_eq!(value_of(q), Some(d("0.378")));
    let units = q.suffixed_unit.as_ref().unwrap().normalized.as_ref().unwrap();
    assert_eq!(units[0].uri, format!("{U}CCY_USD"));
    assert_eq!(units[1].uri, format!("{U}KiloW-HR"));
    assert_eq!(units[1].exponent, -1);
}

#[test]
fn wavenumber_is_not_a_range() {
    let result = parse("472 cm − 1");
    assert_eq!(result.kind, StructureKind::SingleQuantity);
    assert_eq!(result.nbr_quantities, 1);
    let q = &result.normalized_quantities[0];
    assert_eq!(value_of(q), Some(d("472")));
    assert!(
        q.suffixed_unit
            .as_ref()
            .unwrap()
            .text
            .as_deref()
            .unwrap()
            .contains("cm")
    );
}

#[test]
fn spelled_out_number() {
    let result = parse("one hundred and twenty three");
    assert_eq!(result.kind, StructureKind::SingleQuantity);
    assert_eq!(result.success, Some(true));
    assert_eq!(value_of(&result.normalized_quantities[0]), Some(d("123")));
}

#[test]
fn hyphenated_fraction() {
    let result = parse("two-thirds");
    assert_eq!(result.kind, StructureKind::SingleQuantity);
    let q = &result.normalized_quantities[0];
    assert_eq!(value_of(q), Some(d("2") * (Decimal::ONE / d("3"))));
    assert!(q.suffixed_unit.is_none());
    assert!(q.prefixed_unit.is_none());
}

#[test]
fn imprecise_quantity_parses_without_number() {
    let result = parse("few hundred rad m⁻²");
    assert_eq!(result.kind, StructureKind::SingleQuantity);
    let q = &result.normalized_quantities[0];
    let normalized = q.value.as_ref().unwrap().normalized.as_ref().unwrap();
    assert!(normalized.is_imprecise);
    assert_eq!(normalized.numeric_value, None);
    let units = q.suffixed_unit.as_ref().unwrap().normalized.as_ref().unwrap();
    assert_eq!(units[0].uri, format!("{U}RAD"));
    assert_eq!(units[1].uri, format!("{U}M"));
    assert_eq!(units[1].exponent, -2);
}

#[test]
fn ratio_with_colon() {
    let result = parse("1:7.5");
    assert_eq!(result.kind, StructureKind::Ratio);
    assert_eq!(result.nbr_quantities, 2);
}

#[test]
fn negative_seeds_fail_soft() {
    for text in [
        "this is not a quantity",
        "J mol −1",
        "severalt housand hours",
        ".19.23/kWh",
    ] {
        let result = parse(text);
        assert_eq!(result.success, Some(false), "{text:?} should fail");
    }
}

#[test]
fn parse_is_deterministic_and_idempotent() {
    for text in [
        "about 344 million €",
        "$0.07/kWh to $0.16/kWh",
        "12.5 ± 3.7%",
        "100 mm x 100 mm x 400 mm",
    ] {
        let first = parse(text);
        assert_eq!(first.text, text);
        let second = parse(&first.text);
        assert_eq!(first, second);
    }
}

#[test]
fn separator_whitespace_does_not_change_structure() {
    let tight = parse("10-15 min");
    let spaced = parse("10 - 15 min");
    assert_eq!(tight.kind, spaced.kind);
    assert_eq!(tight.nbr_quantities, spaced.nbr_quantities);
}

#[test]
fn original_text_is_preserved_verbatim() {
    let text = "approx.   12,5 ± 3  kWh";
    assert_eq!(parse(text).text, text);
}
