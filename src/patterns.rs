//! Shared regex fragments: numeric shapes, the uncertainty grammar and
//! the slot grammar matched against role-encoded token strings.
//!
//! The original formulations lean on look-around; here every contextual
//! condition is either folded into explicit groups or checked in code by
//! the caller.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lookups::{
    ALL_NUMBER_WORDS, IMPRECISE_MAGNITUDE_WORDS, IMPRECISE_QUANTITIES, ORDER_OF_MAGNITUDE_WORDS,
    STANDALONE_NUMBER_WORDS,
};
use crate::value::parse_value_with_magnitude;

/// Plain numeric shape: optional sign, grouped integer part, optional
/// decimal part. Interpretation is left to the value caster.
pub(crate) const NUM: &str = r"[-+]? ?\d+(?:[.,']\d{3})*(?:[.,]\d+)?";

/// Currency surfaces that prefix a value inside uncertainty expressions.
const PREFIXED_CURRENCIES: &str =
    r"(?:pH|USD|US dollar|dollar|\$|EUR|euro|€|GBP|pound|£|JPY|yen|¥|CNY|Chinese yuan|AUD|CAD|CHF)";

/// One unit chunk: no digits, whitespace, operators or brackets; must not
/// start with a dash (a leading dash reads as a range separator).
const UNIT_CHUNK: &str = r"[^\d\s/\^()\[\]{},;:±∓~=<>-][^\d\s/\^()\[\]{},;:±∓~=<>]{0,14}";

fn unit_chain() -> String {
    format!(r"{UNIT_CHUNK}(?:(?: ?/ ?| per | ){UNIT_CHUNK}){{0,5}}(?:\^?-?[1-3])?")
}

/// A quantity inside an uncertainty expression: optional currency prefix,
/// numeric value, optional suffixed unit chain. Group names are provided
/// by the caller so lower/upper bounds stay distinct.
fn quantity(prefix: &str, num: &str, suffix: &str) -> String {
    format!(
        r"(?:(?P<{prefix}>{PREFIXED_CURRENCIES}) ?)?(?P<{num}>{NUM})[\]\)\}}]? ?(?P<{suffix}>{chain})?",
        chain = unit_chain()
    )
}

fn quantity_anon() -> String {
    format!(
        r"(?:{PREFIXED_CURRENCIES} ?)?(?:{NUM})[\]\)\}}]? ?(?:{chain})?",
        chain = unit_chain()
    )
}

const PLUS_MINUS: &str = r"(?:[±∓]|\+/-|-/\+)";

fn interval_keyword() -> String {
    [
        "confidence intervals? \\(CI\\)",
        "confidence intervals? \\[CI\\]",
        "confidence intervals?-CI",
        "confidence intervals?",
        "uncertainty intervals? \\(UI\\)",
        "uncertainty intervals? \\[UI\\]",
        "uncertainty intervals?-UI",
        "uncertainty intervals?",
        "credible intervals? \\(CrI\\)",
        "credible intervals? \\[CrI\\]",
        "credible intervals?-CrI",
        "credible intervals?",
        "CrI",
        "CI",
        "UI",
    ]
    .join("|")
}

const RANGE_SEP: &str = r"(?: ?- ?|[,;:] ?| to | )";

/// Tolerance: `± X [unit]`, optionally parenthesized.
pub(crate) static TOLERANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^,? ?[\(\[]? ?{PLUS_MINUS} ?{q}\)?$",
        q = quantity("pfx", "num", "sfx")
    ))
    .unwrap()
});

/// Typed interval: `95% CI 1.92-2.65` and friends.
pub(crate) static TYPED_INTERVAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^,? ?[\(\[]? ?(?P<typ>(?:[5-9][059]% ?)?(?:{kw})) ?(?:[,:] ?| of | ?= ?)?{lb}{RANGE_SEP}{ub}[\)\]]?$",
        kw = interval_keyword(),
        lb = quantity("pfx_lb", "num_lb", "sfx_lb"),
        ub = quantity("pfx_ub", "num_ub", "sfx_ub"),
    ))
    .unwrap()
});

/// Untyped interval: `(1.92, 2.65)` / `, 1.92-2.65`. The caller enforces
/// the comma rule: a comma-separated interior is only valid behind a
/// bracketed opener.
pub(crate) static UNTYPED_INTERVAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:(?P<comma>, )|,? ?[\(\[]) ?{lb}(?P<sep>{RANGE_SEP}){ub}[\)\]]?$",
        lb = quantity("pfx_lb", "num_lb", "sfx_lb"),
        ub = quantity("pfx_ub", "num_ub", "sfx_ub"),
    ))
    .unwrap()
});

/// Untyped interval as it appears inside an already-extracted expression:
/// the opener is optional because the protection pass may have kept the
/// leading divider out of the span.
pub(crate) static UNTYPED_INTERVAL_BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^,? ?[\(\[]? ?{lb}(?:{RANGE_SEP}){ub}[\)\]]?$",
        lb = quantity("pfx_lb", "num_lb", "sfx_lb"),
        ub = quantity("pfx_ub", "num_ub", "sfx_ub"),
    ))
    .unwrap()
});

/// Standard deviation, keyword first: `SD 4.27` / `standard deviation: 2`.
pub(crate) static STD_DEV_KEYWORD_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^,? ?\(?(?:SD|standard deviation)(?: |[,;:] ?){PLUS_MINUS}? ?{q}\)?$",
        q = quantity("pfx", "num", "sfx")
    ))
    .unwrap()
});

/// Standard deviation, value first: `4.27 SD`.
pub(crate) static STD_DEV_VALUE_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^,? ?\(? ?{PLUS_MINUS}? ?{q} ?(?:SD|standard deviation)\)?$",
        q = quantity("pfx", "num", "sfx")
    ))
    .unwrap()
});

/// Unanchored scan for a value followed by an uncertainty expression; the
/// `protected` group is the uncertainty span kept atomic by tokenization.
pub(crate) static VALUE_WITH_UNCERTAINTY: Lazy<Regex> = Lazy::new(|| {
    let q = quantity_anon();
    let kw = interval_keyword();
    let typed = format!(
        r"(?:, |,? ?[\(\[])? ?(?:(?:[5-9][059]% ?)?(?:{kw})) ?(?:[,:] ?| of | ?= ?)?{q}{RANGE_SEP}{q}[\)\]]?"
    );
    let untyped = format!(r"(?:, |,? ?[\(\[]){q}(?: ?- ?|[,;:] ?| to ){q}[\)\]]?");
    let sd_a = format!(r",? ?\(?(?:SD|standard deviation)(?: |[,;:] ?){PLUS_MINUS}? ?{q}\)?");
    let sd_b = format!(r",? ?\(? ?{PLUS_MINUS}? ?{q} ?(?:SD|standard deviation)\)?");
    let tolerance = format!(r"(?:, |,? ?[\(\[])? ?{PLUS_MINUS} ?{q}\)?");
    Regex::new(&format!(
        r"(?:{q})(?P<protected>{typed}|{untyped}|{sd_a}|{sd_b}|{tolerance})"
    ))
    .unwrap()
});

/// Does a token hold a complete uncertainty expression?
pub(crate) fn is_uncertainty_expression(token: &str) -> bool {
    TOLERANCE.is_match(token)
        || TYPED_INTERVAL.is_match(token)
        || UNTYPED_INTERVAL.is_match(token)
        || STD_DEV_KEYWORD_FIRST.is_match(token)
        || STD_DEV_VALUE_FIRST.is_match(token)
}

/// Is this span an untyped interval (used by the comma-context rule)?
pub(crate) fn is_untyped_interval(span: &str) -> bool {
    UNTYPED_INTERVAL.is_match(span)
        && !TYPED_INTERVAL.is_match(span)
        && !TOLERANCE.is_match(span)
        && !STD_DEV_KEYWORD_FIRST.is_match(span)
        && !STD_DEV_VALUE_FIRST.is_match(span)
}

/// Words that cannot be units inside an uncertainty expression; a match
/// whose unit slot starts with one of them is a list or range read, not
/// an interval.
fn blacklisted_unit(surface: &str) -> bool {
    let first = surface.split([' ', '/']).next().unwrap_or("");
    matches!(first, "and" | "or" | "to" | "CI" | "in" | "-" | "," | ";" | ":")
}

fn units_plausible(caps: &regex::Captures<'_>, groups: &[&str]) -> bool {
    groups.iter().all(|&g| {
        caps.name(g)
            .is_none_or(|m| !blacklisted_unit(m.as_str()))
    })
}

/// Validate a scanned uncertainty span against the constraints the
/// original grammar encoded with look-around: interior commas only behind
/// a bracketed opener, and no blacklisted words in unit position.
pub(crate) fn uncertainty_span_is_plausible(span: &str) -> bool {
    if let Some(caps) = TOLERANCE.captures(span) {
        return units_plausible(&caps, &["sfx"]);
    }
    if let Some(caps) = TYPED_INTERVAL.captures(span) {
        return units_plausible(&caps, &["sfx_lb", "sfx_ub"]);
    }
    if let Some(caps) = UNTYPED_INTERVAL.captures(span) {
        if caps.name("comma").is_some()
            && caps.name("sep").is_some_and(|m| m.as_str().contains(','))
        {
            return false;
        }
        return units_plausible(&caps, &["sfx_lb", "sfx_ub"]);
    }
    if let Some(caps) = STD_DEV_KEYWORD_FIRST.captures(span) {
        return units_plausible(&caps, &["sfx"]);
    }
    if let Some(caps) = STD_DEV_VALUE_FIRST.captures(span) {
        return units_plausible(&caps, &["sfx"]);
    }
    false
}

pub(crate) static CURRENCY_YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_?\{?\d{4}\}?$").unwrap());

static NUMERIC_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("^{NUM}$")).unwrap());
static FRACTION_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^{NUM} ?/ ?{NUM}$")).unwrap());
static POWER_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"^{NUM}\^{NUM}$")).unwrap());

fn strip_article(s: &str) -> &str {
    for article in ["a ", "an ", "the "] {
        if let Some(rest) = s.strip_prefix(article) {
            return rest;
        }
    }
    s
}

/// Imprecise-value check: optional article plus a known imprecise phrase
/// or a pluralized magnitude word.
pub(crate) fn is_imprecise_value(s: &str) -> bool {
    let lowered = s.to_lowercase();
    let bare = strip_article(&lowered);
    IMPRECISE_QUANTITIES.iter().any(|p| p == bare) || IMPRECISE_MAGNITUDE_WORDS.contains(bare)
}

/// Number-word chain: words joined by `-`, `and` or spaces, or one of the
/// standalone number words.
pub(crate) fn is_number_word_chain(s: &str) -> bool {
    let lowered = s.to_lowercase();
    if STANDALONE_NUMBER_WORDS.contains_key(&lowered) {
        return true;
    }
    let mut saw_word = false;
    for token in lowered.split([' ', '-']) {
        if token.is_empty() || token == "and" {
            continue;
        }
        if ALL_NUMBER_WORDS.contains_key(token) || ORDER_OF_MAGNITUDE_WORDS.contains_key(token) {
            saw_word = true;
        } else {
            return false;
        }
    }
    saw_word
}

/// Chain of order-of-magnitude words only.
pub(crate) fn is_magnitude_word_chain(s: &str) -> bool {
    let lowered = s.to_lowercase();
    let mut saw_word = false;
    for token in lowered.split([' ', '-']) {
        if token.is_empty() || token == "and" {
            continue;
        }
        if ORDER_OF_MAGNITUDE_WORDS.contains_key(token) {
            saw_word = true;
        } else {
            return false;
        }
    }
    saw_word
}

/// Standalone number word (`once`, `a third`, ...).
pub(crate) fn is_standalone_number_word(s: &str) -> bool {
    STANDALONE_NUMBER_WORDS.contains_key(&s.to_lowercase())
}

/// Shape check backing the `number` role: numeric literals, fractions,
/// powers, number words, imprecise phrases and value-with-magnitude
/// forms.
pub(crate) fn is_numeric_value_token(token: &str) -> bool {
    if NUMERIC_SHAPE.is_match(token)
        || FRACTION_SHAPE.is_match(token)
        || POWER_SHAPE.is_match(token)
    {
        return true;
    }
    if is_imprecise_value(token) || is_number_word_chain(token) {
        return true;
    }
    parse_value_with_magnitude(token).is_some()
}

// ============================================================================
// Slot grammar over role-encoded strings
// ============================================================================

/// The abstract quantity grammar: each token contributes one character to
/// the role string (see `Role::code`), so match lengths count tokens.
///
/// Slots in order: prefixed modifiers, prefixed unit (with optional
/// year), value (numbers joined by math operators), pre-unit
/// uncertainty, suffixed units (with optional years, exponents and
/// operators), post-unit uncertainty, suffixed modifiers.
pub(crate) static SLOT_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)^
        (?P<prefixed_modifier>(?:w?p)+)?
        (?P<prefixed_unit>w?uy?)?
        (?P<value>w?n(?:w?m?w?n)*)
        (?P<unc_pre>l?w?x)?
        (?P<suffixed_unit>(?:w?m?w?u(?:w?y)?(?:w?m?w?n)?(?:w?m)?)*)
        (?P<unc_post>l?w?x)?
        (?P<suffixed_modifier>(?:w?s)+w?)?
        w?$",
    )
    .unwrap()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncertainty_expression_shapes() {
        assert!(is_uncertainty_expression("± 3.7"));
        assert!(is_uncertainty_expression("± 3.7%"));
        assert!(is_uncertainty_expression("(95% CI 1.92-2.65)"));
        assert!(is_uncertainty_expression("(95% UI = 1.5-4.5)"));
        assert!(is_uncertainty_expression("(SD 4.27)"));
        assert!(is_uncertainty_expression(", 95% CI 1.03-5.13"));
        assert!(is_uncertainty_expression("(95% credible interval: 4.08-7.55)"));
        assert!(!is_uncertainty_expression("km"));
        assert!(!is_uncertainty_expression("1.92"));
    }

    #[test]
    fn untyped_interval_detection() {
        assert!(is_untyped_interval("(1.92, 2.65)"));
        assert!(is_untyped_interval(", 1.92-2.65"));
        assert!(!is_untyped_interval("(95% CI 1.92-2.65)"));
    }

    #[test]
    fn value_with_uncertainty_scan() {
        let m = VALUE_WITH_UNCERTAINTY.captures("12.5 ± 3.7%").unwrap();
        assert_eq!(m.name("protected").unwrap().as_str(), " ± 3.7%");

        let m = VALUE_WITH_UNCERTAINTY
            .captures("2.25 (95% CI 1.92-2.65)")
            .unwrap();
        assert_eq!(m.name("protected").unwrap().as_str(), " (95% CI 1.92-2.65)");

        assert!(VALUE_WITH_UNCERTAINTY.captures("10-15 min").is_none());
    }

    #[test]
    fn numeric_value_token_shapes() {
        for token in ["344", "-0.6", "0,378", "1/5", "10^-15", "three", "a third",
                      "two-thirds", "few hundred", "several", "12.3 million"] {
            assert!(is_numeric_value_token(token), "{token} should be numeric");
        }
        for token in ["km", "to", "and", "€", "CI"] {
            assert!(!is_numeric_value_token(token), "{token} should not be numeric");
        }
    }

    #[test]
    fn slot_grammar_token_counts() {
        // 'about 344million €' roles: p w n w u
        let caps = SLOT_GRAMMAR.captures("pwnwu").unwrap();
        assert_eq!(caps.name("prefixed_modifier").unwrap().as_str(), "p");
        assert_eq!(caps.name("value").unwrap().as_str(), "wn");
        assert_eq!(caps.name("suffixed_unit").unwrap().as_str(), "wu");

        // '$ 0.07 / kWh' roles: u n m u
        let caps = SLOT_GRAMMAR.captures("unmu").unwrap();
        assert_eq!(caps.name("prefixed_unit").unwrap().as_str(), "u");
        assert_eq!(caps.name("value").unwrap().as_str(), "n");
        assert_eq!(caps.name("suffixed_unit").unwrap().as_str(), "mu");

        // uncertainty after value: n w x
        let caps = SLOT_GRAMMAR.captures("nwx").unwrap();
        assert_eq!(caps.name("unc_pre").unwrap().as_str(), "wx");
    }

    #[test]
    fn slot_grammar_rejects_value_free_sequences() {
        assert!(SLOT_GRAMMAR.captures("u").is_none());
        assert!(SLOT_GRAMMAR.captures("pwu").is_none());
    }
}
