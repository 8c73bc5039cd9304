//! Span normalization: Unicode, signs, operators and notation repairs
//! applied before tokenization.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const SUPERSCRIPTS: &str = "⁰¹²³⁴⁵⁶⁷⁸⁹⁺⁻⁼ⁿⁱ⁽⁾";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static MULT_BETWEEN_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)( ?[x×∙⋅·•] ?)([\d\-+])").unwrap());
static SPLIT_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d ?\.(?:\s+\d)+").unwrap());
static DOUBLE_STAR_POWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)\*\*([\d\-+])").unwrap());
static POWER_OF_TEN_SPACED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\^0-9])(10)( ?-| )([0-9]+)").unwrap());
static POWER_OF_TEN_AFTER_MULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\* (10)([1-9][0-9]{0,2})([^0-9]|$)").unwrap());
static E_NOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)[eE]([\d\-+])").unwrap());
static ALPHA_FOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-zA-Z]+)fold\b").unwrap());
static PAREN_AFTER_NONSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\S)\(").unwrap());
static DASH_BEFORE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\S)-(\s)").unwrap());
static OMITTED_LEADING_ZERO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|[^0-9])\.([0-9]+)").unwrap());
static MULT_GLYPHS_IN_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\*\.∙·⋅]").unwrap());
static X_IN_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^| )[x×] ").unwrap());
static PER_IN_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^| )per ").unwrap());
static DEGREE_GLYPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"[∘•] ?([CcFf]\b)").unwrap());
static ALPHA_BEFORE_PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-zA-Z])([%‰])").unwrap());

fn is_superscript(c: char) -> bool {
    SUPERSCRIPTS.contains(c)
}

/// NFKC normalization that keeps exponent semantics: a `^` is inserted
/// before each superscript run so `10²³` becomes `10^23`, not `1023`.
pub fn normalize_unicode(s: &str) -> String {
    let mut with_carets = String::with_capacity(s.len() + 4);
    let mut prev_superscript = false;
    for c in s.chars() {
        let superscript = is_superscript(c);
        if superscript && !prev_superscript {
            with_carets.push('^');
        }
        with_carets.push(c);
        prev_superscript = superscript;
    }
    with_carets.nfkc().collect()
}

fn replace_until_stable(re: &Regex, s: String, replacement: &str) -> String {
    let mut current = s;
    loop {
        let next = re.replace_all(&current, replacement).into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

fn recover_spaced_powers_of_ten(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for caps in POWER_OF_TEN_SPACED.captures_iter(s) {
        let whole = caps.get(0).unwrap();
        let prefix = &caps[1];
        let sep = &caps[3];
        let exponent = &caps[4];
        out.push_str(&s[last..whole.start()]);
        if sep.contains('-') {
            if exponent.len() >= 2 {
                // A two-or-more digit exponent after a dash reads as a
                // range bound, not a power of ten.
                out.push_str(whole.as_str());
            } else {
                out.push_str(prefix);
                out.push_str("10^-");
                out.push_str(exponent);
            }
        } else {
            out.push_str(prefix);
            out.push_str("10^");
            out.push_str(exponent);
        }
        last = whole.end();
    }
    out.push_str(&s[last..]);
    out
}

fn add_omitted_leading_zero(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 1);
    let mut last = 0;
    for caps in OMITTED_LEADING_ZERO.captures_iter(s) {
        let whole = caps.get(0).unwrap();
        if s[whole.end()..].starts_with('.') {
            // A second dot right after means this is not a plain decimal.
            continue;
        }
        out.push_str(&s[last..whole.start()]);
        out.push_str(&caps[1]);
        out.push_str("0.");
        out.push_str(&caps[2]);
        last = whole.end();
    }
    out.push_str(&s[last..]);
    out
}

fn strip_redundant_parentheses(s: &str) -> String {
    let s = s.trim();
    let open = s.matches('(').count();
    let close = s.matches(')').count();
    if open == 1 && close == 1 && s.starts_with('(') && s.ends_with(')') {
        s[1..s.len() - 1].trim().to_string()
    } else if open == 1 && close == 0 && s.starts_with('(') {
        s[1..].trim().to_string()
    } else if open == 0 && close == 1 && s.ends_with(')') {
        s[..s.len() - 1].trim().to_string()
    } else {
        s.to_string()
    }
}

/// Canonicalize a quantity span for parsing: Unicode, signs, operators,
/// powers of ten and punctuation repairs.
pub fn normalize_quantity_span(s: &str) -> String {
    let s = s.replace('\u{a0}', " ");
    let s = normalize_unicode(s.trim());
    let mut s = WHITESPACE_RUN.replace_all(&s, " ").trim().to_string();

    // Signs.
    s = s
        .chars()
        .map(|c| match c {
            '−' | '‐' | '‑' | '‒' | '–' | '—' | '―' => '-',
            c => c,
        })
        .collect();
    s = s.replace("+/-", "±").replace("+-", "±");
    s = s.replace("-/+", "∓").replace("-+", "∓");

    // Comparison operators.
    s = s.replace("!=", "≠");
    s = s.replace("<=>", "⇔");
    s = s.replace(">=", "≥");
    s = s.replace("<=", "≤");
    s = s.replace("<<", "≪");
    s = s.replace(">>", "≫");

    // Multiplication and division glyphs.
    s = replace_until_stable(&MULT_BETWEEN_DIGITS, s, "$1 * $3");
    s = s.replace('⁄', "/").replace('÷', "/");

    // Repair split decimals ('0. 0273' to '0.0273').
    if let Some(m) = SPLIT_DECIMAL.find(&s) {
        let repaired = m.as_str().replace(' ', "");
        s = s.replacen(m.as_str(), &repaired, 1);
    }

    // Powers of ten.
    s = DOUBLE_STAR_POWER.replace_all(&s, "$1^$2").into_owned();
    s = recover_spaced_powers_of_ten(&s);
    s = POWER_OF_TEN_AFTER_MULT.replace_all(&s, "* 10^$2$3").into_owned();
    s = E_NOTATION.replace_all(&s, "$1*10^$2").into_owned();

    // List glue and trailing garbage.
    s = s.replace(", and ", " and ");
    if let Some(rest) = s.strip_suffix("respectively") {
        s = rest.to_string();
    }
    if let Some(rest) = s.strip_suffix(", ") {
        s = rest.to_string();
    }

    s = ALPHA_FOLD.replace_all(&s, "$1-fold").into_owned();

    // Trailing dot after a non-letter ('%.' to '%', but keep 'perc.').
    if s.ends_with('.') {
        let before = s[..s.len() - 1].chars().last();
        if !before.is_some_and(|c| c.is_ascii_alphabetic()) {
            s.pop();
        }
    }

    s = strip_redundant_parentheses(&s);
    s = PAREN_AFTER_NONSPACE.replace_all(&s, "$1 (").into_owned();
    s = DASH_BEFORE_SPACE.replace_all(&s, "$1 -$2").into_owned();
    s = add_omitted_leading_zero(&s);

    s.trim().to_string()
}

/// Normalize a unit span. Returns `(normalized, display)` where `display`
/// keeps the lightly cleaned surface used in parse results.
pub fn normalize_unit_span(unit_str: &str, quantity_normalization_done: bool) -> (String, String) {
    let mut display = unit_str.trim();
    display = display.strip_suffix('.').unwrap_or(display);
    display = display.strip_prefix('-').unwrap_or(display);
    let display = display.trim().to_string();

    let mut s = if quantity_normalization_done {
        display.clone()
    } else {
        normalize_quantity_span(&display)
    };

    s = s.replace("**", "^");
    s = MULT_GLYPHS_IN_UNIT.replace_all(&s, " ").into_owned();
    s = X_IN_UNIT.replace_all(&s, "$1 ").into_owned();
    s = PER_IN_UNIT.replace_all(&s, "$1/ ").into_owned();
    s = DEGREE_GLYPH.replace_all(&s, "°$1").into_owned();
    s = ALPHA_BEFORE_PERCENT.replace_all(&s, "$1 $2").into_owned();
    for suffix in [':', ';', ','] {
        if let Some(stripped) = s.strip_suffix(suffix) {
            s = stripped.to_string();
        }
    }

    (s.trim().to_string(), display)
}

/// Normalize a numeric span: drop a leading `+` and lowercase.
pub fn normalize_num_span(s: &str) -> String {
    s.strip_prefix('+').unwrap_or(s).to_lowercase()
}

/// Strip known non-quantity prefixes and trailing punctuation from a
/// quantity span produced by an external tagger.
pub fn rectify_quantity_span(span: &str) -> &str {
    let mut span = span;
    for prefix in ["with a ", "with an ", "from ", "of "] {
        if let Some(rest) = span.strip_prefix(prefix) {
            span = rest;
            break;
        }
    }
    for suffix in [".", ":", ",", ";", "?", "!", " of"] {
        if let Some(rest) = span.strip_suffix(suffix) {
            span = rest;
            break;
        }
    }
    span
}
