//! Symbolic unit linking: resolves free-text unit surfaces to QUDT unit
//! classes, decomposes compound units while tracking exponents, and
//! collapses compounds back to a single class via dimensional analysis.

use std::collections::{BTreeSet, HashSet};

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use tracing::debug;

use crate::normalize::normalize_unit_span;
use crate::registry::{UnitRegistry, is_currency_uri};
use crate::types::{Dimension, Number, UnitComponent};
use crate::value::{CastOptions, cast_value, decimal_powi};

static IS_COMPOUND_ALPHA_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]{3,}([ \-][a-zA-Z]{3,})+$").unwrap());
static CURRENCY_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^_?\{?(\d{4})\}?").unwrap());

/// Parse a token of the form `2021`, `_2021`, `{2021}` or `_{2021}`.
pub(crate) fn parse_year_token(token: &str) -> Option<i32> {
    CURRENCY_YEAR.captures(token).and_then(|c| c[1].parse().ok())
}

/// Aggregated conversion facts of a compound unit.
#[derive(Debug, Clone)]
pub struct CompoundInfo {
    pub dimension: Dimension,
    pub multiplier: Number,
    pub applicable_system: HashSet<String>,
    /// False when any component blocks conversion (no multiplier, no
    /// applicable system, or a purely dimensionless vector).
    pub convertible: bool,
}

/// Compound UCUM code renderings of a linked unit, in `/` style and in
/// negative-exponent style.
#[derive(Debug, Clone, PartialEq)]
pub struct UcumCodes {
    pub slash: String,
    pub exponent: String,
}

/// Rule-based unit parser linking QUDT classes to unit strings.
pub struct UnitParser<'r> {
    registry: &'r UnitRegistry,
}

impl<'r> UnitParser<'r> {
    pub fn new(registry: &'r UnitRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r UnitRegistry {
        self.registry
    }

    /// Parse a unit string into linked components. Compound units are kept
    /// as coarse as possible: a direct match of the whole surface wins,
    /// and decomposed compounds are re-aggregated to a single class when
    /// dimensional analysis allows it.
    pub fn parse(&self, unit_string: &str) -> Option<Vec<UnitComponent>> {
        self.parse_with_exponent(unit_string, 1, false)
    }

    pub fn parse_with_exponent(
        &self,
        unit_string: &str,
        group_exponent: i32,
        quantity_normalization_done: bool,
    ) -> Option<Vec<UnitComponent>> {
        if unit_string.is_empty()
            || unit_string.matches('(').count() != unit_string.matches(')').count()
        {
            return None;
        }

        // Direct match on the raw surface.
        if let Some(uri) = self.link_surface(unit_string) {
            return Some(vec![UnitComponent::new(unit_string, group_exponent, uri)]);
        }

        // Direct match on normalized forms.
        let (normalized, display) = normalize_unit_span(unit_string, quantity_normalization_done);
        let wo_parens = normalized
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(&normalized)
            .to_string();
        let mut forms: Vec<String> = vec![normalized.clone(), wo_parens.clone()];
        if IS_COMPOUND_ALPHA_UNIT.is_match(&wo_parens) {
            forms.push(wo_parens.replace('-', " "));
        }
        forms.sort();
        forms.dedup();
        for form in &forms {
            if form != unit_string {
                if let Some(uri) = self.link_surface(form) {
                    return Some(vec![UnitComponent::new(display.clone(), group_exponent, uri)]);
                }
            }
        }

        // Decompose the compound unit.
        if let Some(mut units) = self.parse_compound(&normalized, group_exponent) {
            if units.len() == 1 {
                units[0].surface = display;
            } else if units.len() > 1 {
                if let Some(uri) = self.aggregate_single_class(&units, &normalized) {
                    units = vec![UnitComponent::new(display, 1, uri)];
                }
            }
            return Some(units);
        }

        // Last resort: drop all whitespace and retry the direct match.
        let squashed: String = wo_parens.split_whitespace().collect();
        self.link_surface(&squashed)
            .map(|uri| vec![UnitComponent::new(display, group_exponent, uri)])
    }

    /// Link a single surface to a unit class. Ambiguity resolves through
    /// curated priorities (lowest wins, ties yield nothing), then through
    /// capitalization hints for the mega/milli prefix clash.
    pub(crate) fn link_surface(&self, surface: &str) -> Option<String> {
        let lowered = surface.to_lowercase();
        let symbol_matches = self.registry.symbol_matches(surface);
        let mut label_matches = self.registry.label_matches(&lowered);
        if label_matches.is_empty() && surface.ends_with('s') {
            // Labels are singular; retry without the plural 's'.
            label_matches = self.registry.label_matches(&lowered[..lowered.len() - 1]);
        }

        let matches: BTreeSet<&String> = symbol_matches.iter().chain(label_matches.iter()).collect();
        match matches.len() {
            0 => None,
            1 => Some((*matches.iter().next().unwrap()).clone()),
            _ => self.disambiguate(surface, &lowered, &matches),
        }
    }

    fn disambiguate(
        &self,
        surface: &str,
        lowered: &str,
        matches: &BTreeSet<&String>,
    ) -> Option<String> {
        let priorities = self
            .registry
            .priorities_for(surface)
            .or_else(|| self.registry.priorities_for(lowered))
            .or_else(|| {
                surface
                    .strip_suffix('s')
                    .and_then(|s| self.registry.priorities_for(s))
            })
            .or_else(|| {
                lowered
                    .strip_suffix('s')
                    .and_then(|s| self.registry.priorities_for(s))
            });

        let prioritized: SmallVec<[(&String, i64); 4]> = matches
            .iter()
            .filter_map(|m| priorities.and_then(|p| p.get(*m)).map(|&prio| (*m, prio)))
            .collect();

        if !prioritized.is_empty() {
            let min_prio = prioritized.iter().map(|(_, p)| *p).min().unwrap();
            let at_min: SmallVec<[&String; 4]> = prioritized
                .iter()
                .filter(|(_, p)| *p == min_prio)
                .map(|(m, _)| *m)
                .collect();
            if at_min.len() == 1 {
                return Some(at_min[0].clone());
            }
            debug!(surface, "multiple unit classes share the minimum priority");
            return None;
        }

        // A lowered label may have collided with a case-sensitive symbol:
        // 'M' prefixes mean mega, 'm' prefixes before an uppercase letter
        // mean milli.
        let filtered: SmallVec<[&String; 4]> = if surface.starts_with('M') {
            matches.iter().filter(|m| !m.contains("Milli")).copied().collect()
        } else if surface.starts_with('m')
            && surface.chars().nth(1).is_some_and(char::is_uppercase)
        {
            matches.iter().filter(|m| m.contains("Milli")).copied().collect()
        } else {
            matches.iter().copied().collect()
        };

        if filtered.len() == 1 {
            Some(filtered[0].clone())
        } else {
            debug!(surface, "no priorities for ambiguous unit surface");
            None
        }
    }

    /// Split a normalized compound unit string into tokens, keeping
    /// parenthesized groups intact: whitespace, `/`, `*`, `^`, four-digit
    /// year tags and digit/letter boundaries all separate tokens.
    fn tokenize(&self, s: &str) -> Vec<String> {
        let chars: Vec<char> = s.chars().collect();
        let mut tokens: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut i = 0;

        let flush = |current: &mut String, tokens: &mut Vec<String>| {
            if !current.is_empty() {
                tokens.push(std::mem::take(current));
            }
        };

        while i < chars.len() {
            let c = chars[i];
            if c == '(' {
                flush(&mut current, &mut tokens);
                let mut depth = 0;
                let start = i;
                while i < chars.len() {
                    match chars[i] {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                let end = (i + 1).min(chars.len());
                tokens.push(chars[start..end].iter().collect());
                i = end;
                continue;
            }
            if matches!(c, ' ' | '/' | '*' | '^') {
                flush(&mut current, &mut tokens);
                tokens.push(c.to_string());
                i += 1;
                continue;
            }
            // Year tags: optionally '_'-prefixed or brace-wrapped runs of
            // exactly four digits.
            if c == '_' || c == '{' || c.is_ascii_digit() {
                let mut j = i;
                let mut probe = String::new();
                if chars.get(j) == Some(&'_') {
                    probe.push('_');
                    j += 1;
                }
                if chars.get(j) == Some(&'{') {
                    probe.push('{');
                    j += 1;
                }
                let digit_start = j;
                while j < chars.len() && chars[j].is_ascii_digit() {
                    j += 1;
                }
                if j - digit_start == 4 {
                    let digit_end = j;
                    if chars.get(j) == Some(&'}') {
                        j += 1;
                    }
                    let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
                    if !prev_digit {
                        let digits: String = chars[digit_start..digit_end].iter().collect();
                        probe.push_str(&digits);
                        flush(&mut current, &mut tokens);
                        tokens.push(probe);
                        i = j;
                        continue;
                    }
                }
            }
            // Split between a unit and its exponent: letter followed by an
            // optionally negative digit run.
            let starts_exponent = (c.is_ascii_digit()
                || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())))
                && current
                    .chars()
                    .last()
                    .is_some_and(|p| !p.is_ascii_digit() && p != '-');
            if starts_exponent {
                flush(&mut current, &mut tokens);
            }
            current.push(c);
            i += 1;
        }
        flush(&mut current, &mut tokens);
        tokens.retain(|t| !t.is_empty() && t != " ");
        tokens
    }

    /// Determine a component's exponent from its neighbours: a preceding
    /// `/` flips the sign, a following integer (or `^ N`) multiplies it.
    /// Returns the exponent and every token index consumed.
    fn resolve_exponent(
        &self,
        parts: &[String],
        min_i: usize,
        max_i: usize,
        exponent: i32,
    ) -> (i32, SmallVec<[usize; 4]>) {
        let mut used: SmallVec<[usize; 4]> = SmallVec::new();
        used.push(min_i);
        if max_i != min_i {
            used.push(max_i);
        }
        let mut exponent = exponent;

        if min_i > 0 && parts[min_i - 1] == "/" {
            exponent = -exponent;
            used.push(min_i - 1);
        }

        if max_i + 1 < parts.len() {
            if let Some(n) = integer_token(&parts[max_i + 1]) {
                exponent *= n;
                used.push(max_i + 1);
            } else if parts[max_i + 1] == "^" && max_i + 2 < parts.len() {
                if let Some(n) = integer_token(&parts[max_i + 2]) {
                    exponent *= n;
                    used.push(max_i + 1);
                    used.push(max_i + 2);
                }
            }
        }
        (exponent, used)
    }

    /// Decompose a compound unit string, linking each token and keeping
    /// track of exponents. Fails unless every token is consumed exactly
    /// once.
    fn parse_compound(&self, normalized: &str, group_exponent: i32) -> Option<Vec<UnitComponent>> {
        let parts = self.tokenize(normalized);
        let mut units: Vec<UnitComponent> = Vec::new();
        let mut used: Vec<usize> = Vec::new();

        for (i, part) in parts.iter().enumerate() {
            if used.contains(&i) {
                continue;
            }
            if part.starts_with('(') && part.ends_with(')') {
                let (exponent, consumed) = self.resolve_exponent(&parts, i, i, group_exponent);
                let inner = &part[1..part.len() - 1];
                let group = self.parse_with_exponent(inner, exponent, true)?;
                units.extend(group);
                used.extend(consumed);
            } else if let Some(uri) = self.link_surface(part) {
                let mut year = None;
                let mut max_i = i;
                let is_currency = self
                    .registry
                    .info(&uri)
                    .is_some_and(|info| info.is_currency);
                if is_currency && i + 1 < parts.len() {
                    // '0.03 $2021/kWh' attaches the year to the currency.
                    if let Some(y) = parse_year_token(&parts[i + 1]) {
                        year = Some(y);
                        max_i = i + 1;
                    }
                }
                let (exponent, consumed) = self.resolve_exponent(&parts, i, max_i, group_exponent);
                units.push(UnitComponent {
                    surface: part.clone(),
                    exponent,
                    uri,
                    year,
                });
                used.extend(consumed);
            } else {
                // Possibly a '/', 'per' or exponent helper consumed by a
                // neighbouring unit.
                continue;
            }

            let distinct: HashSet<usize> = used.iter().copied().collect();
            if distinct.len() != used.len() {
                return None;
            }
        }

        let distinct: HashSet<usize> = used.iter().copied().collect();
        if distinct.len() != parts.len() {
            return None;
        }
        Some(units)
    }

    /// Aggregate conversion facts over compound components.
    pub fn compound_conversion_info(
        &self,
        units: &[UnitComponent],
        break_if_not_convertible: bool,
    ) -> Option<CompoundInfo> {
        if units.len() <= 1 {
            return None;
        }

        let mut convertible = true;
        let mut dimension = Dimension::zero();
        let mut multiplier = Decimal::ONE;
        let mut systems: Option<HashSet<String>> = None;

        for unit in units {
            let info = self.registry.info(&unit.uri)?;

            if info.applicable_system.is_empty() {
                // No system recorded reads as 'any system', which is too
                // weak a basis for conversion.
                convertible = false;
            } else {
                systems = Some(match systems {
                    None => info.applicable_system.clone(),
                    Some(prev) => prev
                        .intersection(&info.applicable_system)
                        .cloned()
                        .collect(),
                });
            }

            let dv = info.dimension;
            if dv.is_dimensionless() && dv.0[7] != 0 {
                convertible = false;
            }
            for (slot, &d) in dimension.0.iter_mut().zip(dv.0.iter()) {
                *slot += d * unit.exponent;
            }

            match info.conversion_multiplier {
                Some(m) => match decimal_powi(m, unit.exponent) {
                    Some(p) => match multiplier.checked_mul(p) {
                        Some(product) => multiplier = product,
                        None => convertible = false,
                    },
                    None => convertible = false,
                },
                None => convertible = false,
            }

            if break_if_not_convertible && !convertible {
                break;
            }
        }

        if dimension.0[7] != 0 && dimension.0[..7].iter().any(|&d| d != 0) {
            // A compound that gained physical dimensions is no longer
            // dimensionless.
            dimension.0[7] = 0;
        }

        Some(CompoundInfo {
            dimension,
            multiplier,
            applicable_system: systems.unwrap_or_default(),
            convertible,
        })
    }

    /// Try to collapse a compound to one unit class via dimensional
    /// analysis; similarity against known surfaces breaks ties.
    pub fn aggregate_single_class(
        &self,
        units: &[UnitComponent],
        unit_string: &str,
    ) -> Option<String> {
        if units.iter().any(|u| u.year.is_some()) {
            return None;
        }
        if units.iter().any(|u| {
            self.registry
                .info(&u.uri)
                .is_some_and(|info| info.is_currency)
        }) {
            // Cent/kWh and EUR/kWh share dimensions but are not the same
            // class; currencies never collapse.
            return None;
        }

        let info = self.compound_conversion_info(units, true)?;
        if !info.convertible {
            return None;
        }

        let candidates = self
            .registry
            .aggregation_candidates(&info.dimension.encode(), info.multiplier);
        let valid: Vec<&String> = candidates
            .iter()
            .filter(|c| {
                self.registry.info(c).is_some_and(|ci| {
                    !info.applicable_system.is_disjoint(&ci.applicable_system)
                })
            })
            .collect();

        match valid.len() {
            0 => None,
            1 => Some(valid[0].clone()),
            _ => {
                let matcher = SkimMatcherV2::default();
                let target: String = unit_string.split_whitespace().collect();
                let mut best: Option<(i64, &String)> = None;
                for candidate in valid {
                    let score = self
                        .registry
                        .surfaces(candidate)
                        .iter()
                        .filter_map(|s| matcher.fuzzy_match(s, &target))
                        .max()
                        .unwrap_or(0);
                    best = match best {
                        None => Some((score, candidate)),
                        Some((best_score, best_uri)) => {
                            if score > best_score
                                || (score == best_score && candidate < best_uri)
                            {
                                Some((score, candidate))
                            } else {
                                Some((best_score, best_uri))
                            }
                        }
                    };
                }
                best.map(|(_, uri)| uri.clone())
            }
        }
    }

    /// Render a linked compound as UCUM codes. Currencies are skipped,
    /// mirroring the table convention of leaving them uncoded.
    pub fn compound_ucum_codes(&self, units: &[(i32, &str)]) -> Option<UcumCodes> {
        if !self.registry.has_ucum_codes() {
            return None;
        }
        if units.iter().any(|(_, uri)| is_currency_uri(uri)) {
            return None;
        }

        let mut slash_parts: Vec<String> = Vec::new();
        let mut exp_parts: Vec<String> = Vec::new();
        for (i, (exponent, uri)) in units.iter().enumerate() {
            if *exponent == 0 {
                return None;
            }
            let codes = self.registry.ucum_codes_for(uri);
            let code = codes.first()?;
            let (bare, included_exp) = split_ucum_exponent(code);
            let exponent = exponent * included_exp;

            let numeric = if exponent != 1 {
                format!("{bare}{exponent}")
            } else {
                bare.to_string()
            };
            let per = if i == 0 || exponent > 0 {
                numeric.clone()
            } else if exponent == -1 {
                format!("/{bare}")
            } else {
                format!("/{bare}{}", exponent.abs())
            };

            if bare.contains('/') {
                slash_parts.push(per);
            } else if bare.contains('-') {
                exp_parts.push(numeric);
            } else {
                slash_parts.push(per);
                exp_parts.push(numeric);
            }
        }

        let exponent_style = exp_parts.join(".");

        // Group consecutive '/'-prefixed parts into a parenthesized
        // denominator: erg/(cm2.s).
        let mut slash_style = String::new();
        let mut skip: HashSet<usize> = HashSet::new();
        for (i, part) in slash_parts.iter().enumerate() {
            if skip.contains(&i) {
                continue;
            }
            if i == 0 {
                slash_style.push_str(part);
            } else if part.starts_with('/')
                && slash_parts.get(i + 1).is_some_and(|p| p.starts_with('/'))
            {
                slash_style.push_str(&format!("/({}", &part[1..]));
                let mut j = i + 1;
                while let Some(next) = slash_parts.get(j) {
                    if next.starts_with('/') {
                        skip.insert(j);
                        slash_style.push('.');
                        slash_style.push_str(&next[1..]);
                        j += 1;
                    } else {
                        break;
                    }
                }
                slash_style.push(')');
            } else if part.starts_with('/') {
                slash_style.push_str(part);
            } else {
                slash_style.push('.');
                slash_style.push_str(part);
            }
        }

        Some(UcumCodes {
            slash: slash_style,
            exponent: exponent_style,
        })
    }
}

/// A token usable as an integer exponent next to a unit.
fn integer_token(token: &str) -> Option<i32> {
    let opts = CastOptions {
        consider_num_words: true,
        normalize_chars: false,
        skip_magnitude: false,
    };
    let n = cast_value(token, opts)?;
    if !n.is_integer() {
        return None;
    }
    i32::try_from(n).ok()
}

/// Split a trailing exponent off a single-unit UCUM code: `m2` → (`m`, 2).
fn split_ucum_exponent(code: &str) -> (&str, i32) {
    if code.len() <= 1 {
        return (code, 1);
    }
    let bytes = code.as_bytes();
    let start = if code.len() > 2 && bytes[code.len() - 2] == b'-' {
        code.len() - 2
    } else {
        code.len() - 1
    };
    match code[start..].parse::<i32>() {
        Ok(exp) => (&code[..start], exp),
        Err(_) => (code, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::UnitRegistry;

    fn parser() -> UnitParser<'static> {
        UnitParser::new(UnitRegistry::builtin())
    }

    const U: &str = "http://qudt.org/vocab/unit/";

    #[test]
    fn direct_symbol_and_label_matches() {
        let p = parser();
        let km = p.parse("km").unwrap();
        assert_eq!(km, vec![UnitComponent::new("km", 1, format!("{U}KiloM"))]);
        let years = p.parse("years").unwrap();
        assert_eq!(years[0].uri, format!("{U}YR"));
        assert_eq!(p.parse("%").unwrap()[0].uri, format!("{U}PERCENT"));
    }

    #[test]
    fn ambiguous_surface_resolved_by_priority() {
        let p = parser();
        // 'a' maps to both year and are; the curated priority keeps year.
        let a = p.parse("a").unwrap();
        assert_eq!(a[0].uri, format!("{U}YR"));
    }

    #[test]
    fn compound_decomposition_tracks_exponents() {
        let p = parser();
        let twh_per_a = p.parse("TWh/a").unwrap();
        assert_eq!(
            twh_per_a,
            vec![
                UnitComponent::new("TWh", 1, format!("{U}TeraW-HR")),
                UnitComponent::new("a", -1, format!("{U}YR")),
            ]
        );

        let per_kwh = p.parse("/kWh").unwrap();
        assert_eq!(per_kwh, vec![UnitComponent::new("/kWh", -1, format!("{U}KiloW-HR"))]);

        let with_exp = p.parse("cents kWh-1").unwrap();
        assert_eq!(with_exp.len(), 2);
        assert_eq!(with_exp[1].exponent, -1);

        let rad_per_m2 = p.parse("rad m^-2").unwrap();
        assert_eq!(
            rad_per_m2,
            vec![
                UnitComponent::new("rad", 1, format!("{U}RAD")),
                UnitComponent::new("m", -2, format!("{U}M")),
            ]
        );
    }

    #[test]
    fn currency_year_is_absorbed() {
        let p = parser();
        for s in ["$2021/kWh", "$_2021/kWh", "$_{2021}/kWh", "$ 2021/kWh", "$ 2021 /kWh"] {
            let parsed = p.parse(s).unwrap_or_else(|| panic!("failed on {s}"));
            assert_eq!(parsed[0].uri, format!("{U}CCY_USD"), "in {s}");
            assert_eq!(parsed[0].year, Some(2021), "in {s}");
            assert_eq!(parsed[1].uri, format!("{U}KiloW-HR"), "in {s}");
            assert_eq!(parsed[1].exponent, -1, "in {s}");
        }
    }

    #[test]
    fn aggregation_collapses_known_compounds() {
        let p = parser();
        let km_per_s = p.parse("km / s").unwrap();
        assert_eq!(km_per_s, vec![UnitComponent::new("km / s", 1, format!("{U}KiloM-PER-SEC"))]);

        let units = vec![
            UnitComponent::new("μg", 1, format!("{U}MicroGM")),
            UnitComponent::new("mL", -1, format!("{U}MilliL")),
        ];
        assert_eq!(
            p.aggregate_single_class(&units, "μg/ mL"),
            Some(format!("{U}MicroGM-PER-MilliL"))
        );
    }

    #[test]
    fn currencies_never_aggregate() {
        let p = parser();
        let parsed = p.parse("$/kWh").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].uri, format!("{U}CCY_USD"));
        assert_eq!(parsed[1].exponent, -1);
    }

    #[test]
    fn unknown_surfaces_fail_soft() {
        let p = parser();
        assert_eq!(p.parse("frobnicate"), None);
        assert_eq!(p.parse(""), None);
        assert_eq!(p.parse("(kWh"), None);
    }

    #[test]
    fn conversion_info_for_compounds() {
        let p = parser();
        let units = vec![
            UnitComponent::new("°C", 1, format!("{U}DEG_C")),
            UnitComponent::new("yr", -1, format!("{U}YR")),
        ];
        let info = p.compound_conversion_info(&units, false).unwrap();
        assert_eq!(info.dimension.encode(), "A0E0L0I0M0H1T-1D0");
        assert!(info.convertible);
        assert!(info.applicable_system.contains("SI"));
        assert!(info.applicable_system.contains("CGS"));

        let units = vec![
            UnitComponent::new("€", 1, format!("{U}CCY_EUR")),
            UnitComponent::new("kW", -1, format!("{U}KiloW")),
        ];
        let info = p.compound_conversion_info(&units, false).unwrap();
        assert_eq!(info.dimension.encode(), "A0E0L-2I0M-1H0T3D0");
        assert_eq!(info.multiplier, Decimal::new(1, 3));
        assert!(!info.convertible);
    }

    #[test]
    fn ucum_code_rendering() {
        let p = parser();
        let codes = p
            .compound_ucum_codes(&[(1, &format!("{U}KiloM")), (-1, &format!("{U}SEC"))])
            .unwrap();
        assert_eq!(codes.slash, "km/s");
        assert_eq!(codes.exponent, "km.s-1");
    }
}
