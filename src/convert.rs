//! Value conversion between linked units: physical conversion via
//! dimension vectors and multiplier ratios, currency conversion via an
//! external service.

use rust_decimal::Decimal;

use crate::error::QuinexError;
use crate::registry::{PLACEHOLDER_CENT, UnitRegistry, currency_iso_code};
use crate::types::{Number, UnitComponent};
use crate::value::decimal_powi;

/// External currency service. Implementations adjust for inflation and
/// exchange rate between `(base_year, base_currency)` and
/// `(target_year, target_currency)`.
pub trait CurrencyConverter: Send + Sync {
    fn convert_currency(
        &self,
        value: Number,
        base_year: i32,
        base_currency: &str,
        target_year: i32,
        target_currency: &str,
        operation_order: &str,
    ) -> Result<Number, QuinexError>;
}

/// Converts values between compound units.
pub struct UnitConverter<'r> {
    registry: &'r UnitRegistry,
    currency: Option<Box<dyn CurrencyConverter>>,
}

impl<'r> UnitConverter<'r> {
    pub fn new(registry: &'r UnitRegistry) -> Self {
        Self {
            registry,
            currency: None,
        }
    }

    pub fn with_currency_converter(mut self, converter: Box<dyn CurrencyConverter>) -> Self {
        self.currency = Some(converter);
        self
    }

    /// Convert `value` from one compound unit to another. Soft failure
    /// (incommensurable units) yields `Ok(None)`; missing currency years
    /// or a missing currency service are hard errors.
    pub fn convert(
        &self,
        value: Number,
        from: &[UnitComponent],
        to: &[UnitComponent],
        from_default_year: Option<i32>,
        to_default_year: Option<i32>,
    ) -> Result<Option<(Number, Vec<UnitComponent>)>, QuinexError> {
        if from.is_empty() && to.is_empty() {
            return Ok(Some((value, Vec::new())));
        }
        if to.is_empty() {
            return Ok(None);
        }

        // A cent placeholder scales the value by 100 and defers to the
        // currency elsewhere in the compound; without one there is no way
        // to tell which currency's cent it is.
        let mut value = value;
        let mut from_units: Vec<UnitComponent> = Vec::with_capacity(from.len());
        for unit in from {
            if unit.uri == PLACEHOLDER_CENT {
                let scale =
                    decimal_powi(Decimal::from(100), unit.exponent).ok_or_else(|| {
                        QuinexError::conversion(unit.surface.clone(), "", "cent exponent overflow")
                    })?;
                value = value
                    .checked_div(scale)
                    .ok_or_else(|| QuinexError::conversion(unit.surface.clone(), "", "cent scale"))?;
                let has_currency = from.iter().any(|u| {
                    u.uri != PLACEHOLDER_CENT
                        && self
                            .registry
                            .info(&u.uri)
                            .is_some_and(|info| info.is_currency)
                });
                if !has_currency {
                    return Ok(None);
                }
            } else {
                from_units.push(unit.clone());
            }
        }

        let mut to_pool: Vec<UnitComponent> = to.to_vec();
        let mut converted: Vec<UnitComponent> = Vec::with_capacity(to.len());

        for from_unit in &from_units {
            let mut matched: Option<(usize, Option<i32>)> = None;

            for (j, to_unit) in to_pool.iter().enumerate() {
                if from_unit.exponent != to_unit.exponent {
                    continue;
                }
                let (Some(from_info), Some(to_info)) = (
                    self.registry.info(&from_unit.uri),
                    self.registry.info(&to_unit.uri),
                ) else {
                    continue;
                };

                if from_info.is_currency != to_info.is_currency {
                    continue;
                }

                if from_info.is_currency {
                    let converter = self
                        .currency
                        .as_deref()
                        .ok_or(QuinexError::NoCurrencyConverter)?;
                    let from_year = from_unit.year.or(from_default_year);
                    let to_year = to_unit.year.or(to_default_year);
                    let (Some(from_year), Some(to_year)) = (from_year, to_year) else {
                        return Err(QuinexError::MissingCurrencyYear);
                    };

                    if !(from_year == to_year && from_unit.uri == to_unit.uri) {
                        let from_iso = currency_iso_code(&from_unit.uri);
                        let to_iso = currency_iso_code(&to_unit.uri);
                        if from_iso.len() != 3 || to_iso.len() != 3 {
                            return Err(QuinexError::conversion(
                                from_unit.uri.clone(),
                                to_unit.uri.clone(),
                                "currency class does not carry an ISO 4217 code",
                            ));
                        }
                        value = converter.convert_currency(
                            value,
                            from_year,
                            from_iso,
                            to_year,
                            to_iso,
                            "inflation_first",
                        )?;
                    }
                    matched = Some((j, Some(to_year)));
                    break;
                }

                // Physical conversion: zero offsets, known multipliers,
                // recorded systems and equal dimension vectors.
                if from_unit.uri == to_unit.uri {
                    matched = Some((j, None));
                    break;
                }
                let zero_offset = |o: &Option<Number>| o.is_none() || o == &Some(Decimal::ZERO);
                if !zero_offset(&from_info.conversion_offset)
                    || !zero_offset(&to_info.conversion_offset)
                {
                    continue;
                }
                let (Some(from_mult), Some(to_mult)) =
                    (from_info.conversion_multiplier, to_info.conversion_multiplier)
                else {
                    continue;
                };
                if from_info.applicable_system.is_empty() || to_info.applicable_system.is_empty() {
                    continue;
                }
                if from_info.dimension != to_info.dimension {
                    continue;
                }
                if from_mult != to_mult {
                    let factor = from_mult
                        .checked_div(to_mult)
                        .and_then(|f| decimal_powi(f, from_unit.exponent))
                        .ok_or_else(|| {
                            QuinexError::conversion(
                                from_unit.uri.clone(),
                                to_unit.uri.clone(),
                                "conversion factor overflow",
                            )
                        })?;
                    value = value.checked_mul(factor).ok_or_else(|| {
                        QuinexError::conversion(
                            from_unit.uri.clone(),
                            to_unit.uri.clone(),
                            "converted value overflow",
                        )
                    })?;
                }
                matched = Some((j, None));
                break;
            }

            match matched {
                Some((j, currency_year)) => {
                    let mut unit = to_pool.remove(j);
                    if currency_year.is_some() {
                        unit.year = currency_year;
                    }
                    converted.push(unit);
                }
                None => break,
            }
        }

        if to_pool.is_empty() {
            Ok(Some((value, converted)))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::UnitRegistry;

    const U: &str = "http://qudt.org/vocab/unit/";

    struct FixedRate;

    impl CurrencyConverter for FixedRate {
        fn convert_currency(
            &self,
            value: Number,
            _base_year: i32,
            _base_currency: &str,
            _target_year: i32,
            _target_currency: &str,
            _operation_order: &str,
        ) -> Result<Number, QuinexError> {
            Ok(value * Decimal::new(11, 1))
        }
    }

    fn component(surface: &str, exponent: i32, name: &str) -> UnitComponent {
        UnitComponent::new(surface, exponent, format!("{U}{name}"))
    }

    #[test]
    fn physical_conversion_scales_by_multiplier_ratio() {
        let conv = UnitConverter::new(UnitRegistry::builtin());
        let (value, units) = conv
            .convert(
                Decimal::from(5),
                &[component("km", 1, "KiloM")],
                &[component("m", 1, "M")],
                None,
                None,
            )
            .unwrap()
            .unwrap();
        assert_eq!(value, Decimal::from(5000));
        assert_eq!(units[0].uri, format!("{U}M"));
    }

    #[test]
    fn compound_conversion_handles_denominators() {
        let conv = UnitConverter::new(UnitRegistry::builtin());
        let from = vec![component("kWh", 1, "KiloW-HR"), component("a", -1, "YR")];
        let to = vec![component("Wh", 1, "W-HR"), component("a", -1, "YR")];
        let (value, _) = conv
            .convert(Decimal::ONE, &from, &to, None, None)
            .unwrap()
            .unwrap();
        assert_eq!(value, Decimal::from(1000));
    }

    #[test]
    fn offset_units_do_not_convert() {
        let conv = UnitConverter::new(UnitRegistry::builtin());
        let result = conv
            .convert(
                Decimal::from(20),
                &[component("°C", 1, "DEG_C")],
                &[component("K", 1, "K")],
                None,
                None,
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn dimension_mismatch_is_soft() {
        let conv = UnitConverter::new(UnitRegistry::builtin());
        let result = conv
            .convert(
                Decimal::ONE,
                &[component("kg", 1, "KiloGM")],
                &[component("m", 1, "M")],
                None,
                None,
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn currency_conversion_requires_years() {
        let conv =
            UnitConverter::new(UnitRegistry::builtin()).with_currency_converter(Box::new(FixedRate));
        let from = vec![component("$", 1, "CCY_USD")];
        let to = vec![component("€", 1, "CCY_EUR")];
        let err = conv.convert(Decimal::ONE, &from, &to, None, None);
        assert!(matches!(err, Err(QuinexError::MissingCurrencyYear)));

        let (value, units) = conv
            .convert(Decimal::from(10), &from, &to, Some(2020), Some(2021))
            .unwrap()
            .unwrap();
        assert_eq!(value, Decimal::from(11));
        assert_eq!(units[0].year, Some(2021));
    }

    #[test]
    fn cent_placeholder_defers_to_sibling_currency() {
        let conv =
            UnitConverter::new(UnitRegistry::builtin()).with_currency_converter(Box::new(FixedRate));

        // A bare cent cannot be resolved to a currency.
        let from = vec![UnitComponent::new("¢", 1, PLACEHOLDER_CENT)];
        let to = vec![component("$", 1, "CCY_USD")];
        assert!(conv.convert(Decimal::from(100), &from, &to, Some(2020), Some(2020)).unwrap().is_none());

        // Cent next to a currency scales by 1/100 and drops out.
        let mut usd = component("$", 1, "CCY_USD");
        usd.year = Some(2020);
        let from = vec![UnitComponent::new("¢", 1, PLACEHOLDER_CENT), usd.clone()];
        let (value, _) = conv
            .convert(Decimal::from(250), &from, &to, Some(2020), Some(2020))
            .unwrap()
            .unwrap();
        assert_eq!(value, Decimal::new(25, 1));
    }
}
