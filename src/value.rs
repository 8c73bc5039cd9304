//! Numeric value casting: `str2num` tries an ordered list of
//! interpretations and returns the first that succeeds, `num2str` renders
//! numbers back into surface forms.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::lookups::{
    ALL_NUMBER_WORDS, AMBIGUOUS_FRACTION_WORDS, NUMBER_WORDS_THAT_DOUBLE_AS_UNITS,
    ORDER_OF_MAGNITUDE_WORDS,
};
use crate::normalize::{normalize_num_span, normalize_quantity_span};
use crate::types::Number;

static ORDINAL_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)(st|nd|rd|th)$").unwrap());
static SIGN_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([-+])\s+(\d(?:[.,]?\d)*)$").unwrap());
static INT_WITH_THOUSANDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9]{1,3}(?:[',.]\d{3})*$").unwrap());
static ARTICLE_AS_ONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|\s)(a|an)\s").unwrap());
static FRACTION_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)\s*/{1,2}\s*(\d)").unwrap());
static FRACTION_MINUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)\s*-\s*(\d)").unwrap());
static FRACTION_PLUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)\s*\+\s*(\d)").unwrap());
static MAGNITUDE_X_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?) ?[x×∙⋅·* ] ?10\^ ?([+-]?\d+)$").unwrap());
static MAGNITUDE_E_FORM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?) ?[eE] ?([+-]?\d+)$").unwrap());
static MAGNITUDE_WORD_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?) (hundred|thousand|million|billion|trillion)$").unwrap());
static MAGNITUDE_ABBR_FORM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?) ?([kKMB])$").unwrap());

/// Options threaded through the interpretation tower; callers inside the
/// parser skip re-normalization and the magnitude branch where the
/// surrounding stage already handles them.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CastOptions {
    pub consider_num_words: bool,
    pub normalize_chars: bool,
    pub skip_magnitude: bool,
}

impl Default for CastOptions {
    fn default() -> Self {
        Self {
            consider_num_words: true,
            normalize_chars: true,
            skip_magnitude: false,
        }
    }
}

/// 10^exp as an exact decimal; `None` outside the representable range.
pub(crate) fn pow10(exp: i32) -> Option<Number> {
    if (0..=28).contains(&exp) {
        let mut v = 1i128;
        for _ in 0..exp {
            v *= 10;
        }
        Some(Decimal::from_i128_with_scale(v, 0))
    } else if (-28..0).contains(&exp) {
        Some(Decimal::new(1, (-exp) as u32))
    } else {
        None
    }
}

/// Integer power of a decimal with overflow checking.
pub(crate) fn decimal_powi(base: Number, exp: i32) -> Option<Number> {
    let mut result = Decimal::ONE;
    for _ in 0..exp.unsigned_abs() {
        result = result.checked_mul(base)?;
    }
    if exp < 0 {
        if result.is_zero() {
            return None;
        }
        result = Decimal::ONE.checked_div(result)?;
    }
    Some(result)
}

/// True when `value` is an integer with absolute value below `threshold`.
pub(crate) fn is_small_int(value: Number, threshold: i64) -> bool {
    value.is_integer() && value.abs() < Decimal::from(threshold)
}

/// Convert a free-form numeric string to a number: `"12,3"`, `"9 3/4"`,
/// `"two-thirds"`, `"12.3 million"`, `"10^-3"`, `"2.6M"`, ...
pub fn str2num(s: &str) -> Option<Number> {
    cast_value(s, CastOptions::default())
}

pub(crate) fn cast_value(s: &str, opts: CastOptions) -> Option<Number> {
    if s.is_empty() {
        return None;
    }

    // '30th' reads as 30.
    let s = ORDINAL_SUFFIX.replace(s, "$1").into_owned();

    let clean = if opts.normalize_chars {
        normalize_quantity_span(&s)
    } else {
        s
    };
    let mut clean = normalize_num_span(&clean);

    if clean == "a" || clean == "an" {
        return Some(Decimal::ONE);
    }
    if clean.chars().count() == 1 && !clean.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }

    if let Some(n) = cast_int(&clean) {
        return Some(n);
    }

    // '- 10' to '-10'.
    clean = SIGN_SPACE.replace(&clean, "$1$2").into_owned();

    if let Some(n) = cast_float(&clean) {
        return Some(n);
    }
    if opts.consider_num_words {
        if let Some(n) = cast_number_word(&clean) {
            return Some(n);
        }
    }
    if let Some(n) = cast_fraction_sum(&clean) {
        return Some(n);
    }
    if let Some(n) = cast_power(&clean) {
        return Some(n);
    }
    if !opts.skip_magnitude {
        if let Some((value, exp)) = parse_value_with_magnitude(&clean) {
            return value.checked_mul(pow10(exp)?);
        }
    }
    if opts.consider_num_words {
        if let Some(n) = cast_digits_and_number_words(&clean, opts.normalize_chars) {
            return Some(n);
        }
    }
    None
}

fn cast_int(s: &str) -> Option<Number> {
    if let Ok(n) = s.parse::<i64>() {
        return Some(Decimal::from(n));
    }
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse::<Decimal>().ok();
    }
    // One consistent thousands separator, three-digit groups; dots count
    // only when there is more than one (a single dot reads as decimal).
    let separators = ["'", ",", "."];
    let kinds = separators.iter().filter(|sep| s.contains(**sep)).count();
    if kinds == 1
        && INT_WITH_THOUSANDS.is_match(s)
        && (!s.contains('.') || s.matches('.').count() > 1)
    {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        return digits.parse::<Decimal>().ok();
    }
    None
}

fn cast_float(s: &str) -> Option<Number> {
    let trimmed = s.strip_suffix('.').unwrap_or(s);
    if let Ok(n) = trimmed.parse::<Decimal>() {
        return Some(n);
    }
    if let Ok(n) = Decimal::from_scientific(trimmed) {
        return Some(n);
    }
    parse_localized(s)
}

/// Localized float: groups of three behind one consistent thousands
/// separator, decimal separator being whichever of `,`/`.` is left over
/// (the last one when both appear).
fn parse_localized(s: &str) -> Option<Number> {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(r) => ("-", r),
        None => ("", s.strip_prefix('+').unwrap_or(s)),
    };
    let rest = rest.strip_prefix(' ').unwrap_or(rest);

    let mut runs: Vec<&str> = Vec::new();
    let mut seps: Vec<char> = Vec::new();
    let mut start = 0;
    for (i, c) in rest.char_indices() {
        if c.is_ascii_digit() {
            continue;
        }
        if !matches!(c, '.' | ',' | '\'' | ' ') {
            return None;
        }
        runs.push(&rest[start..i]);
        seps.push(c);
        start = i + c.len_utf8();
    }
    runs.push(&rest[start..]);
    if runs.iter().any(|r| r.is_empty()) {
        return None;
    }

    let lead_ok = runs[0] != "0" || seps.is_empty() || matches!(seps[0], '.' | ',');
    if seps.is_empty() {
        return format!("{sign}{}", runs[0]).parse().ok();
    }

    // All separators thousands: same char, all groups of three.
    let all_same = seps.iter().all(|&c| c == seps[0]);
    let groups_of_three = runs[1..].iter().all(|r| r.len() == 3);
    if all_same && groups_of_three && runs[0] != "0" {
        let digits: String = runs.concat();
        return format!("{sign}{digits}").parse().ok();
    }

    // Last separator decimal, the rest thousands.
    let dec_sep = *seps.last().unwrap();
    if !matches!(dec_sep, '.' | ',') {
        return None;
    }
    let thousands = &seps[..seps.len() - 1];
    if !thousands.is_empty() {
        let t = thousands[0];
        if !thousands.iter().all(|&c| c == t) {
            return None;
        }
        if runs[0] == "0" {
            return None;
        }
        // '.'-grouped numbers take ',' as decimal and vice versa.
        if matches!(t, '.' | ',') && dec_sep == t {
            return None;
        }
        if !runs[1..runs.len() - 1].iter().all(|r| r.len() == 3) {
            return None;
        }
    } else if !lead_ok {
        return None;
    }
    let int_part: String = runs[..runs.len() - 1].concat();
    let frac_part = runs.last().unwrap();
    format!("{sign}{int_part}.{frac_part}").parse().ok()
}

fn small_number_word(word: &str) -> Option<Number> {
    if let Some(v) = ALL_NUMBER_WORDS.get(word) {
        return Some(*v);
    }
    if word != "tens" && word.ends_with('s') {
        if let Some(v) = ALL_NUMBER_WORDS.get(&word[..word.len() - 1]) {
            return Some(*v);
        }
    }
    None
}

fn cast_number_word(word: &str) -> Option<Number> {
    if let Some(v) = small_number_word(word) {
        return Some(v);
    }
    ORDER_OF_MAGNITUDE_WORDS.get(word).and_then(|&exp| pow10(exp))
}

fn cast_fraction_sum(s: &str) -> Option<Number> {
    if !s.contains('/') || !s.chars().all(|c| c.is_ascii_digit() || "/-+ ".contains(c)) {
        return None;
    }
    let s = FRACTION_SLASH.replace_all(s, "$1/$2").into_owned();
    let s = FRACTION_MINUS.replace_all(&s, "$1 -$2").into_owned();
    let s = FRACTION_PLUS.replace_all(&s, "$1 +$2").into_owned();

    let mut sum = Decimal::ZERO;
    for part in s.split_whitespace() {
        let (sign, body) = match part.strip_prefix('-') {
            Some(b) => (Decimal::NEGATIVE_ONE, b),
            None => (Decimal::ONE, part.strip_prefix('+').unwrap_or(part)),
        };
        let value = match body.split_once('/') {
            Some((num, den)) => {
                let num: Decimal = num.parse().ok()?;
                let den: Decimal = den.parse().ok()?;
                if den.is_zero() {
                    return None;
                }
                num / den
            }
            None => body.parse().ok()?,
        };
        sum += sign * value;
    }
    Some(sum)
}

fn cast_power(s: &str) -> Option<Number> {
    let s = s.replace("**", "^");
    let (base_str, exp_str) = s.split_once('^')?;
    let no_words = CastOptions {
        consider_num_words: false,
        normalize_chars: false,
        skip_magnitude: false,
    };
    let base = cast_value(base_str.trim(), no_words)?;
    let exp = cast_value(exp_str.trim(), no_words)?;
    if exp.is_integer() && exp.abs() <= Decimal::from(127) {
        let exp_i: i32 = exp.try_into().ok()?;
        decimal_powi(base, exp_i)
    } else {
        let approx = f64::try_from(base).ok()?.powf(f64::try_from(exp).ok()?);
        Decimal::try_from(approx).ok()
    }
}

/// Split a value span into its numeric part and an explicit power-of-ten
/// exponent: `"3.5×10^6"`, `"3.5e6"`, `"3.5 million"`, `"2.6M"`.
pub(crate) fn parse_value_with_magnitude(s: &str) -> Option<(Number, i32)> {
    let value_opts = CastOptions {
        consider_num_words: true,
        normalize_chars: false,
        skip_magnitude: true,
    };

    if let Some(caps) = MAGNITUDE_X_FORM.captures(s) {
        if let (Some(value), Ok(exp)) = (cast_value(caps[1].trim(), value_opts), caps[2].parse()) {
            return Some((value, exp));
        }
    }
    if let Some(caps) = MAGNITUDE_WORD_FORM.captures(s) {
        if let (Some(value), Some(&exp)) = (
            cast_value(caps[1].trim(), value_opts),
            ORDER_OF_MAGNITUDE_WORDS.get(&caps[2]),
        ) {
            return Some((value, exp));
        }
    }
    if let Some(caps) = MAGNITUDE_E_FORM.captures(s) {
        if let (Some(value), Ok(exp)) = (cast_value(caps[1].trim(), value_opts), caps[2].parse()) {
            return Some((value, exp));
        }
    }
    if let Some(caps) = MAGNITUDE_ABBR_FORM.captures(s) {
        let exp = match caps[2].to_lowercase().as_str() {
            "k" => 3,
            "m" => 6,
            "b" => 9,
            _ => return None,
        };
        if let Some(value) = cast_value(caps[1].trim(), value_opts) {
            return Some((value, exp));
        }
    }
    None
}

fn split_digits_and_words(s: &str) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if c == ' ' || c == '-' {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        if let Some(p) = prev {
            let boundary = (p.is_ascii_digit() && c.is_ascii_alphabetic())
                || (p.is_ascii_alphabetic() && c.is_ascii_digit());
            if boundary && !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
        prev = Some(c);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn cast_digits_and_number_words(s: &str, normalize_chars: bool) -> Option<Number> {
    if !s.chars().any(char::is_alphabetic) {
        return None;
    }
    let s = ARTICLE_AS_ONE.replace_all(s, " 1 ").trim().to_string();
    let s = s.replace(" plus ", " and ").replace(", ", " and ");

    let mut total = Decimal::ZERO;
    for part in s.split(" and ") {
        let tokens = split_digits_and_words(part);
        if let Some(last) = tokens.last() {
            let earlier_digits = tokens[..tokens.len() - 1]
                .iter()
                .any(|t| t.chars().any(|c| c.is_ascii_digit()));
            if NUMBER_WORDS_THAT_DOUBLE_AS_UNITS.contains(&last.as_str()) && earlier_digits {
                // 'second'/'quarter' after digits is a unit, not a number.
                return None;
            }
        }

        let mut num = Decimal::ZERO;
        for token in &tokens {
            if token.chars().any(|c| c.is_ascii_digit()) {
                let opts = CastOptions {
                    consider_num_words: false,
                    normalize_chars,
                    skip_magnitude: false,
                };
                num += cast_value(token, opts)?;
            } else if let Some(&exp) = ORDER_OF_MAGNITUDE_WORDS.get(token.as_str()) {
                let magnitude = pow10(exp)?;
                if num.is_zero() {
                    num = magnitude;
                } else {
                    num = num.checked_mul(magnitude)?;
                }
            } else if let Some(value) = small_number_word(token) {
                let small_prior = !num.is_zero() && num.abs() < Decimal::from(20);
                if AMBIGUOUS_FRACTION_WORDS.contains(token.as_str()) && small_prior {
                    if value > Decimal::ONE {
                        num /= value;
                    } else {
                        num *= value;
                    }
                } else {
                    num += value;
                }
            } else {
                return None;
            }
        }
        total += num;
    }
    Some(total)
}

/// Formatting options for [`num2str`].
#[derive(Clone, Debug)]
pub struct NumFormat {
    /// Power-of-ten base notation, e.g. `"×10^"` or `"e"`.
    pub base: &'static str,
    /// Exponent to factor out of the number.
    pub exp: i32,
    /// Spell the magnitude as a word when the exponent is a multiple of 3.
    pub spell_magnitude: bool,
    pub thousands_sep: &'static str,
    /// Decimal places of the mantissa; `None` keeps all digits.
    pub precision: Option<u32>,
    pub pad_exp: usize,
    pub show_plus: bool,
}

impl Default for NumFormat {
    fn default() -> Self {
        Self {
            base: "×10^",
            exp: 0,
            spell_magnitude: false,
            thousands_sep: "",
            precision: None,
            pad_exp: 0,
            show_plus: false,
        }
    }
}

const MAGNITUDE_WORDS: [&str; 8] = [
    "thousand", "million", "billion", "trillion", "quadrillion", "quintillion", "sextillion",
    "septillion",
];

/// Render a number as a surface string; inverse of [`str2num`] for the
/// default options.
pub fn num2str(num: Number, fmt: &NumFormat) -> Option<String> {
    let mantissa = num.checked_mul(pow10(-fmt.exp)?)?;
    let mantissa = match fmt.precision {
        Some(p) => mantissa.round_dp(p).normalize(),
        None => mantissa.normalize(),
    };

    let mut mantissa_str = mantissa.to_string();
    if !fmt.thousands_sep.is_empty() {
        let (int_end, _) = mantissa_str
            .char_indices()
            .find(|&(_, c)| c == '.')
            .unwrap_or((mantissa_str.len(), '.'));
        let digits_start = usize::from(mantissa_str.starts_with('-'));
        let mut grouped = String::new();
        let int_digits = &mantissa_str[digits_start..int_end];
        for (i, c) in int_digits.chars().enumerate() {
            if i > 0 && (int_digits.len() - i) % 3 == 0 {
                grouped.push_str(fmt.thousands_sep);
            }
            grouped.push(c);
        }
        mantissa_str = format!(
            "{}{}{}",
            &mantissa_str[..digits_start],
            grouped,
            &mantissa_str[int_end..]
        );
    }

    let magnitude_str = if fmt.exp == 0 {
        String::new()
    } else if fmt.spell_magnitude && fmt.exp > 0 && fmt.exp % 3 == 0 {
        let word = MAGNITUDE_WORDS.get((fmt.exp / 3 - 1) as usize)?;
        format!(" {word}")
    } else {
        let sign = if fmt.exp > 0 {
            if fmt.show_plus { "+" } else { "" }
        } else {
            "-"
        };
        format!("{}{}{:0>width$}", fmt.base, sign, fmt.exp.abs(), width = fmt.pad_exp)
    };

    Some(format!("{mantissa_str}{magnitude_str}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Number {
        s.parse().unwrap()
    }

    #[test]
    fn integers_and_thousands_separators() {
        assert_eq!(str2num("27"), Some(d("27")));
        assert_eq!(str2num("27."), Some(d("27")));
        assert_eq!(str2num("27th"), Some(d("27")));
        assert_eq!(str2num("6,351"), Some(d("6351")));
        assert_eq!(str2num("6'351"), Some(d("6351")));
        assert_eq!(str2num("6.351.432"), Some(d("6351432")));
        assert_eq!(str2num("1,331.4"), Some(d("1331.4")));
    }

    #[test]
    fn localized_floats() {
        assert_eq!(str2num("1.23"), Some(d("1.23")));
        assert_eq!(str2num("6.351"), Some(d("6.351")));
        assert_eq!(str2num("0,351"), Some(d("0.351")));
        assert_eq!(str2num("0,378"), Some(d("0.378")));
        assert_eq!(str2num("1.234.567,890"), Some(d("1234567.890")));
        assert_eq!(str2num("1,22,33"), None);
        assert_eq!(str2num("1.22.33"), None);
    }

    #[test]
    fn number_words() {
        assert_eq!(str2num("twenty-seven"), Some(d("27")));
        assert_eq!(str2num("seventy-eight"), Some(d("78")));
        assert_eq!(str2num("eighth"), Some(d("8")));
        assert_eq!(str2num("8th"), Some(d("8")));
        assert_eq!(str2num("an eighth"), Some(Decimal::ONE / d("8")));
        assert_eq!(str2num("one eighth"), Some(Decimal::ONE / d("8")));
        assert_eq!(str2num("one third"), Some(Decimal::ONE / d("3")));
        // 'thirds' multiplies by the stored 1/3, 'third' divides by 3; the
        // two differ in the last of 28 digits.
        assert_eq!(str2num("two thirds"), Some(d("2") * (Decimal::ONE / d("3"))));
        assert_eq!(str2num("two third"), Some(d("2") / d("3")));
        assert_eq!(str2num("one hundred and twenty three"), Some(d("123")));
        assert_eq!(str2num("fifty seven billion"), Some(d("57000000000")));
        assert_eq!(str2num("this is not a"), None);
        assert_eq!(str2num("a"), Some(Decimal::ONE));
    }

    #[test]
    fn fractions_and_powers() {
        assert_eq!(str2num("1/27"), Some(Decimal::ONE / d("27")));
        assert_eq!(str2num("9 3/4"), Some(d("9.75")));
        assert_eq!(str2num("9 -3/4"), Some(d("8.25")));
        assert_eq!(str2num("10^3"), Some(d("1000")));
        assert_eq!(str2num("10**3"), Some(d("1000")));
        assert_eq!(str2num("10^-3"), Some(d("0.001")));
    }

    #[test]
    fn magnitudes() {
        assert_eq!(str2num("12.3 million"), Some(d("12300000")));
        assert_eq!(str2num("1.23e-5"), Some(d("0.0000123")));
        assert_eq!(str2num("2.7x10^6"), Some(d("2700000")));
        assert_eq!(str2num("2.6M"), Some(d("2600000")));
        assert_eq!(str2num("2.6k"), Some(d("2600")));
        assert_eq!(str2num("2.6K"), Some(d("2600")));
        assert_eq!(str2num("2.6B"), Some(d("2600000000")));
    }

    #[test]
    fn unit_like_words_rejected_after_digits() {
        assert_eq!(str2num("2 second"), None);
        assert_eq!(str2num("1 quarter"), None);
    }

    #[test]
    fn magnitude_split() {
        assert_eq!(parse_value_with_magnitude("344 million"), Some((d("344"), 6)));
        assert_eq!(parse_value_with_magnitude("3.5*10^6"), Some((d("3.5"), 6)));
        assert_eq!(parse_value_with_magnitude("3.5e6"), Some((d("3.5"), 6)));
        assert_eq!(parse_value_with_magnitude("344"), None);
        assert_eq!(parse_value_with_magnitude("4 million km"), None);
    }

    #[test]
    fn num2str_roundtrip() {
        for s in ["1", "-42", "1234.5", "0.001", "123456789", "3.14159265"] {
            let n = d(s);
            let rendered = num2str(n, &NumFormat::default()).unwrap();
            assert_eq!(str2num(&rendered), Some(n), "round-trip of {s}");
        }
        let fmt = NumFormat {
            exp: 6,
            ..NumFormat::default()
        };
        assert_eq!(num2str(d("2500000"), &fmt).unwrap(), "2.5×10^6");
        let spelled = NumFormat {
            exp: 6,
            spell_magnitude: true,
            ..NumFormat::default()
        };
        assert_eq!(num2str(d("2500000"), &spelled).unwrap(), "2.5 million");
        assert_eq!(str2num("2.5 million"), Some(d("2500000")));
    }

    #[test]
    fn small_int_check() {
        assert!(is_small_int(d("1"), 10));
        assert!(is_small_int(d("-9"), 10));
        assert!(!is_small_int(d("10"), 10));
        assert!(!is_small_int(d("1.5"), 10));
    }
}
