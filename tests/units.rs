//! End-to-end unit linking: surface forms, compound decomposition,
//! currency years and dimensional aggregation.

use quinex::{UnitComponent, parse_unit};

const U: &str = "http://qudt.org/vocab/unit/";

fn uri(name: &str) -> String {
    format!("{U}{name}")
}

#[test]
fn percent_and_simple_symbols() {
    assert_eq!(
        parse_unit("%").unwrap(),
        vec![UnitComponent::new("%", 1, uri("PERCENT"))]
    );
    assert_eq!(
        parse_unit("km").unwrap(),
        vec![UnitComponent::new("km", 1, uri("KiloM"))]
    );
}

#[test]
fn currency_per_energy() {
    let parsed = parse_unit("$/kWh").unwrap();
    assert_eq!(parsed[0].uri, uri("CCY_USD"));
    assert_eq!(parsed[1].uri, uri("KiloW-HR"));
    assert_eq!(parsed[1].exponent, -1);
}

#[test]
fn energy_per_year() {
    let parsed = parse_unit("TWh/a").unwrap();
    assert_eq!(
        parsed,
        vec![
            UnitComponent::new("TWh", 1, uri("TeraW-HR")),
            UnitComponent::new("a", -1, uri("YR")),
        ]
    );
}

#[test]
fn currency_with_year_tag_variants() {
    for text in ["$2021/kWh", "$_{2021}/kWh", "$_2021/kWh", "$ 2021/kWh", "$ 2021 /kWh"] {
        let parsed = parse_unit(text).unwrap_or_else(|| panic!("failed on {text}"));
        assert_eq!(parsed[0].uri, uri("CCY_USD"), "in {text}");
        assert_eq!(parsed[0].year, Some(2021), "in {text}");
        assert_eq!(parsed[1].exponent, -1, "in {text}");
    }
}

#[test]
fn unicode_minus_exponent() {
    let parsed = parse_unit("€ ton −1").unwrap();
    assert_eq!(parsed[0].uri, uri("CCY_EUR"));
    assert_eq!(parsed[1].uri, uri("TONNE"));
    assert_eq!(parsed[1].exponent, -1);
}

#[test]
fn denominator_with_glued_exponent() {
    let parsed = parse_unit("g /cm3").unwrap();
    assert_eq!(parsed[0].uri, uri("GM"));
    assert_eq!(parsed[1].uri, uri("CentiM"));
    assert_eq!(parsed[1].exponent, -3);
}

#[test]
fn whitespaced_compound_collapses_to_single_class() {
    let parsed = parse_unit("km / s").unwrap();
    assert_eq!(parsed, vec![UnitComponent::new("km / s", 1, uri("KiloM-PER-SEC"))]);
}

#[test]
fn nested_groups_with_group_exponents() {
    let parsed = parse_unit("TWh kg*s^2/(m^2 per year)^3").unwrap();
    assert_eq!(
        parsed,
        vec![
            UnitComponent::new("TWh", 1, uri("TeraW-HR")),
            UnitComponent::new("kg", 1, uri("KiloGM")),
            UnitComponent::new("s", 2, uri("SEC")),
            UnitComponent::new("m", -6, uri("M")),
            UnitComponent::new("year", 3, uri("YR")),
        ]
    );
}

#[test]
fn labels_and_plurals() {
    assert_eq!(parse_unit("kilowatt hours").unwrap()[0].uri, uri("KiloW-HR"));
    assert_eq!(parse_unit("euros").unwrap()[0].uri, uri("CCY_EUR"));
    assert_eq!(parse_unit("years").unwrap()[0].uri, uri("YR"));
}

#[test]
fn unknown_units_fail_soft() {
    assert_eq!(parse_unit("blorbs"), None);
    assert_eq!(parse_unit(""), None);
}
