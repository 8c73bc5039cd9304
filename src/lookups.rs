//! Static vocabularies: number words, order-of-magnitude words, imprecise
//! quantity phrases, quantity-modifier surfaces and separator sets.
//!
//! Core word maps are perfect-hash tables; combinatorially derived lists
//! (plural fractions, article variants, parenthesized suffixed modifiers)
//! are built once at first use.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use phf::phf_map;
use rust_decimal::Decimal;

use crate::types::Number;

/// Order-of-magnitude words mapped to their power of ten, short scale.
pub static ORDER_OF_MAGNITUDE_WORDS: phf::Map<&'static str, i32> = phf_map! {
    "hundred" => 2,
    "thousand" => 3,
    "million" => 6,
    "billion" => 9,
    "trillion" => 12,
    "quadrillion" => 15,
    "quintillion" => 18,
    "sextillion" => 21,
    "septillion" => 24,
    "octillion" => 27,
    "nonillion" => 30,
    "decillion" => 33,
    "undecillion" => 36,
    "duodecillion" => 39,
    "tredecillion" => 42,
    "quattuordecillion" => 45,
    "quindecillion" => 48,
    "sexdecillion" => 51,
    "septendecillion" => 54,
    "octodecillion" => 57,
    "novemdecillion" => 60,
    "vigintillion" => 63,
    "unvigintillion" => 66,
    "duovigintillion" => 69,
    "tresvigintillion" => 72,
    "quattuorvigintillion" => 75,
    "quinquavigintillion" => 78,
    "sesvigintillion" => 81,
    "septemvigintillion" => 84,
    "octovigintillion" => 87,
    "novemvigintillion" => 90,
    "trigintillion" => 93,
    "untrigintillion" => 96,
    "duotrigintillion" => 99,
    "trestrigintillion" => 102,
    "quattuortrigintillion" => 105,
    "quinquatrigintillion" => 108,
    "sestrigintillion" => 111,
    "septentrigintillion" => 114,
    "octotrigintillion" => 117,
    "noventrigintillion" => 120,
    "quadragintillion" => 123,
    "quinquagintillion" => 153,
    "sexagintillion" => 183,
    "septuagintillion" => 213,
    "octogintillion" => 243,
    "nonagintillion" => 273,
    "centillion" => 303,
};

/// Cardinal and ordinal number words with integer values, including common
/// plurals and counting units like `dozen`.
pub static INTEGER_WORDS: phf::Map<&'static str, i64> = phf_map! {
    "zero" => 0, "one" => 1, "two" => 2, "three" => 3, "four" => 4,
    "five" => 5, "six" => 6, "seven" => 7, "eight" => 8, "nine" => 9,
    "ten" => 10, "eleven" => 11, "twelve" => 12, "thirteen" => 13,
    "fourteen" => 14, "fifteen" => 15, "sixteen" => 16, "seventeen" => 17,
    "eighteen" => 18, "nineteen" => 19,
    "first" => 1, "second" => 2, "third" => 3, "fourth" => 4, "fifth" => 5,
    "sixth" => 6, "seventh" => 7, "eighth" => 8, "ninth" => 9,
    "tenth" => 10, "eleventh" => 11, "twelfth" => 12, "thirteenth" => 13,
    "fourteenth" => 14, "fifteenth" => 15, "sixteenth" => 16,
    "seventeenth" => 17, "eighteenth" => 18, "nineteenth" => 19,
    "ones" => 1, "twos" => 2, "threes" => 3, "fours" => 4, "fives" => 5,
    "sixes" => 6, "sevens" => 7, "eights" => 8, "nines" => 9,
    "tens" => 10, "elevens" => 11, "twelves" => 12, "thirteens" => 13,
    "fourteens" => 14, "fifteens" => 15, "sixteens" => 16,
    "seventeens" => 17, "eighteens" => 18, "nineteens" => 19,
    "twenty" => 20, "thirty" => 30, "forty" => 40, "fifty" => 50,
    "sixty" => 60, "seventy" => 70, "eighty" => 80, "ninety" => 90,
    "twentieth" => 20, "thirtieth" => 30, "fortieth" => 40,
    "fiftieth" => 50, "sixtieth" => 60, "seventieth" => 70,
    "eightieth" => 80, "ninetieth" => 90,
    "twenties" => 20, "thirties" => 30, "forties" => 40, "fifties" => 50,
    "sixties" => 60, "seventies" => 70, "eighties" => 80, "nineties" => 90,
    "hundredth" => 100, "thousandth" => 1000, "millionth" => 1000000,
    "billionth" => 1000000000,
    "dozen" => 12, "dozens" => 12, "gross" => 144, "great gross" => 1728,
    "small gross" => 120, "twelfty" => 120, "great hundred" => 120,
    "long hundred" => 120, "long thousand" => 1200,
};

/// Number words that can also be units and must not follow digits
/// (`"2 second"` is a duration, not 2 × 2).
pub const NUMBER_WORDS_THAT_DOUBLE_AS_UNITS: [&str; 2] = ["second", "quarter"];

fn dec(n: i64) -> Number {
    Decimal::from(n)
}

fn frac(num: i64, den: i64) -> Number {
    Decimal::from(num) / Decimal::from(den)
}

/// Every number word (cardinals, ordinals, fractions and plural fraction
/// forms) mapped to its numeric value.
pub static ALL_NUMBER_WORDS: Lazy<HashMap<String, Number>> = Lazy::new(|| {
    let mut map: HashMap<String, Number> = HashMap::new();
    for (word, &value) in INTEGER_WORDS.entries() {
        map.insert((*word).to_string(), dec(value));
    }
    map.insert("half".into(), frac(1, 2));
    map.insert("halves".into(), frac(1, 2));
    map.insert("thirds".into(), frac(1, 3));
    map.insert("quarter".into(), frac(1, 4));
    // Plural "th" words are fractions: "hundredths" is 1/100.
    for (word, &value) in INTEGER_WORDS.entries() {
        if word.ends_with("th") && value != 0 {
            map.insert(format!("{word}s"), dec(1) / dec(value));
        }
    }
    for (word, value) in STANDALONE_NUMBER_WORDS.iter() {
        map.insert(word.clone(), *value);
    }
    map
});

/// Number words unlikely to combine with other number words; `a`
/// distinguishes the fraction reading from the ordinal one.
pub static STANDALONE_NUMBER_WORDS: Lazy<HashMap<String, Number>> = Lazy::new(|| {
    let mut map: HashMap<String, Number> = HashMap::new();
    map.insert("a third".into(), frac(1, 3));
    map.insert("a quarter".into(), frac(1, 4));
    map.insert("once".into(), dec(1));
    map.insert("twice".into(), dec(2));
    map.insert("thrice".into(), dec(3));
    map.insert("single".into(), dec(1));
    map.insert("double".into(), dec(2));
    map.insert("triple".into(), dec(3));
    map.insert("quadruple".into(), dec(4));
    map.insert("quintuple".into(), dec(5));
    map.insert("zeroth".into(), dec(0));
    map.insert("zeros".into(), dec(0));
    for (word, &value) in INTEGER_WORDS.entries() {
        if word.ends_with("th") && value != 0 {
            map.insert(format!("a {word}"), dec(1) / dec(value));
        }
    }
    map
});

/// Words that are a fraction when preceded by a small number word and an
/// ordinal otherwise (`"one third"` is 1/3, `"twenty third"` is 23rd).
pub static AMBIGUOUS_FRACTION_WORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    let mut set: HashSet<String> = ["third", "thirds", "half", "halves", "quarter"]
        .into_iter()
        .map(str::to_string)
        .collect();
    for (word, &value) in INTEGER_WORDS.entries() {
        if word.ends_with("th") && value != 0 {
            set.insert((*word).to_string());
            set.insert(format!("{word}s"));
        }
    }
    set
});

/// All number-word surfaces (including magnitude words), longest first,
/// for gazetteer matching.
pub static NUMBER_WORD_SURFACES: Lazy<Vec<String>> = Lazy::new(|| {
    let mut words: Vec<String> = ALL_NUMBER_WORDS.keys().cloned().collect();
    words.extend(ORDER_OF_MAGNITUDE_WORDS.keys().map(|w| (*w).to_string()));
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    words
});

/// Standalone number-word surfaces, longest first.
pub static STANDALONE_NUMBER_WORD_SURFACES: Lazy<Vec<String>> = Lazy::new(|| {
    let mut words: Vec<String> = STANDALONE_NUMBER_WORDS.keys().cloned().collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    words
});

/// Phrases denoting an imprecise amount (`"several"`, `"a few hundred"`,
/// `"tens of thousands"`). Built combinatorially from quantifier nouns and
/// hedging adjectives.
pub static IMPRECISE_QUANTITIES: Lazy<Vec<String>> = Lazy::new(|| {
    let mut phrases: Vec<String> = [
        "multi",
        "multiple",
        "quadrillions of",
        "tens of thousands",
        "tens of millions",
        "tens of billions",
        "hundreds of thousands",
        "hundreds of millions",
        "hundreds of billions",
        "various",
        "several",
        "handful",
        "handful of",
        "many",
        "few",
        "few of",
        "couple",
        "couple of",
        "some",
        "lots of",
        "lot of",
        "not much",
        "not many",
        "ton of",
        "tons of",
        "bunch of",
        "plenty",
        "plenty of",
        "multitude of",
        "great deal of",
        "all kinds of",
        "too many to count",
        "uncountable",
        "infinitesimally small",
        "infinitely small",
        "infinitely large",
        "infinitely",
        "less",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();

    let quantifying: &[(&str, &str)] = &[
        ("dozen", "dozens"),
        ("hundred", "hundreds"),
        ("thousand", "thousands"),
        ("million", "millions"),
        ("billion", "billions"),
        ("trillion", "trillions"),
        ("plethora", "plethoras"),
        ("myriad", "myriads"),
    ];
    for (s, pl) in quantifying {
        phrases.push(format!("{s} of"));
        phrases.push(format!("{pl} of"));
        for adj in ["few", "several", "some", "couple", "couple of", "handful", "handful of", "many", "multiple"] {
            phrases.push(format!("{adj} {s}"));
            phrases.push(format!("{adj} {pl}"));
        }
    }

    let neutral: &[(&str, &str)] = &[
        ("number", "numbers"),
        ("amount", "amounts"),
        ("quantity", "quantities"),
    ];
    for (s, pl) in neutral {
        for adj in [
            "tiny", "very tiny", "small", "very small", "vanishingly small", "large", "very large",
            "great", "minuscule", "significant", "considerable", "vast", "huge", "massive",
        ] {
            let article = if adj.starts_with(['a', 'e', 'i', 'o', 'u']) { "an" } else { "a" };
            phrases.push(format!("{adj} {s} of"));
            phrases.push(format!("{article} {adj} {s} of"));
            phrases.push(format!("the {adj} {s} of"));
            phrases.push(format!("{adj} {pl} of"));
        }
    }

    // Bare magnitude nouns are precise unless pluralized.
    for bare in ["dozen", "dozens", "hundred", "hundreds", "thousand", "thousands", "million",
                 "millions", "billion", "billions", "trillion", "trillions", "ton", "tons"] {
        phrases.retain(|p| p != bare);
    }

    phrases.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    phrases.dedup();
    phrases
});

/// Imprecise phrases with optional leading article, plus pluralized
/// magnitude words (`"hundreds"`, `"millions"`).
pub static IMPRECISE_QUANTITIES_WITH_ARTICLE: Lazy<Vec<String>> = Lazy::new(|| {
    let mut phrases = IMPRECISE_QUANTITIES.clone();
    for p in IMPRECISE_QUANTITIES.iter() {
        phrases.push(format!("a {p}"));
        phrases.push(format!("an {p}"));
        phrases.push(format!("the {p}"));
    }
    phrases.push("tens".into());
    for word in ORDER_OF_MAGNITUDE_WORDS.keys() {
        phrases.push(format!("{word}s"));
    }
    phrases.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    phrases.dedup();
    phrases
});

/// Plural magnitude words that read as imprecise values on their own.
pub static IMPRECISE_MAGNITUDE_WORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    let mut set: HashSet<String> = HashSet::new();
    set.insert("tens".into());
    for word in ORDER_OF_MAGNITUDE_WORDS.keys() {
        set.insert(format!("{word}s"));
    }
    set
});

// Math symbols that belong to the quantity span itself rather than acting
// as modifiers.
pub const MATH_SYMBOLS_PART_OF_SPAN: [&str; 3] = ["+", "-", "−"];

/// Raw prefixed-modifier table: surface form to normalized operator.
/// `None` marks surfaces that are recognized (and protected from
/// tokenization) but carry no operator mapping.
const PREFIXED_MODIFIER_TABLE: &[(&str, Option<&str>)] = &[
    // Already normalized symbols.
    ("=", Some("=")),
    ("!=", Some("!=")),
    ("±", Some("±")),
    ("<", Some("<")),
    (">", Some(">")),
    ("<=", Some("≤")),
    (">=", Some("≥")),
    (">>", Some(">>")),
    ("<<", Some("<<")),
    ("~", Some("~")),
    ("~<", Some("~<")),
    ("~>=", Some("~>=")),
    ("<~", Some("<~")),
    (">~", Some(">~")),
    (">~=", Some(">~=")),
    ("<~=", Some("<~=")),
    ("<>", Some("<>")),
    ("><", Some("><")),
    ("<>=", Some("<>=")),
    ("∝", Some("∝")),
    ("∓", Some("±")),
    ("∼", Some("~")),
    ("≥", Some("≥")),
    ("≤", Some("≤")),
    ("⩽", Some("≤")),
    ("≃", Some("~")),
    ("≈", Some("~")),
    ("≠", Some("!=")),
    ("¬", Some("!=")),
    ("≪", Some("<<")),
    ("≫", Some(">>")),
    ("≳", Some(">~=")),
    ("<or=", Some("≤")),
    (">or=", Some("≥")),
    // Negations and signs.
    ("not", Some("!=")),
    ("not equal", Some("!=")),
    ("not equals", Some("!=")),
    ("not equal to", Some("!=")),
    ("minus", Some("-")),
    ("negative", Some("-")),
    ("non-", Some("!=")),
    // Approximation.
    ("approximately", Some("~")),
    ("approximate", Some("~")),
    ("approx.", Some("~")),
    ("approx", Some("~")),
    ("appro.", Some("~")),
    ("around", Some("~")),
    ("about", Some("~")),
    ("about ±", Some("")),
    ("some", Some("~")),
    ("close to", Some("~")),
    ("circa", Some("~")),
    ("ca.", Some("~")),
    ("ca", Some("~")),
    ("almost", Some("~<")),
    ("of around", Some("~")),
    ("at around", Some("~")),
    ("at about", Some("~")),
    ("near the", Some("~")),
    ("near", Some("~")),
    ("nearly", Some("~")),
    ("roughly", Some("~")),
    ("order of", Some("~")),
    ("in the order of", Some("~")),
    ("of the order of", Some("~")),
    ("on the order of", Some("~")),
    ("initially around", Some("~")),
    ("after about", Some("~")),
    ("less than ∼", Some("<~")),
    ("below around", Some("<~")),
    ("below ∼", Some("<~")),
    ("above ∼", Some(">~")),
    ("from ∼", Some(">~")),
    ("from approximately", Some(">~")),
    ("up to around", Some(">~=")),
    ("up to approximately", Some("<~=")),
    ("values as high as ~", Some("<~=")),
    ("slightly above the critical value of", Some("~>=")),
    ("slightly less", Some("~<")),
    // Bounds.
    ("higher than", Some(">")),
    ("up to", Some("≤")),
    ("upto", Some("≤")),
    ("up to at least", Some("<>=")),
    ("min.", Some("≥")),
    ("min", Some("≥")),
    ("minimum", Some("≥")),
    ("a minimum of", Some("≥")),
    ("max.", Some("≤")),
    ("max", Some("≤")),
    ("maximum", Some("≤")),
    ("a maximum of", Some("≤")),
    ("reached a maximum of", Some("≤")),
    ("below", Some("<")),
    ("well below", Some("<")),
    ("just below", Some("<")),
    ("as low as", Some("≥")),
    ("become as low as", Some("≥")),
    ("as high as", Some("≤")),
    ("as much as", Some("≤")),
    ("above", Some(">")),
    ("just above", Some(">")),
    ("well above", Some(">>")),
    ("still above", Some(">")),
    ("over", Some(">")),
    ("just over", Some(">")),
    ("well over", Some(">>")),
    ("over the", Some(">")),
    ("over more than", Some(">")),
    ("over <", Some("><")),
    ("at least", Some("≥")),
    ("at most", Some("≤")),
    ("not more than", Some("≤")),
    ("not less than", Some("≥")),
    ("not exceed", Some("≤")),
    ("exceed", Some(">")),
    ("exceeded", Some(">")),
    ("beyond", Some(">")),
    ("less than", Some("<")),
    ("lower than", Some("<")),
    ("smaller than", Some("<")),
    ("more than", Some(">")),
    ("greater than", Some(">")),
    ("far more than", Some(">>")),
    ("way more than", Some(">>")),
    ("much greater than", Some(">>")),
    ("much less than", Some("<<")),
    ("significantly higher than", Some(">>")),
    ("varied widely from", Some(">")),
    ("could drop to", Some("≥")),
    ("or below", Some("<")),
    ("lower limit of", Some("≥")),
    ("upper limit of", Some("≤")),
    ("uppermost", Some("≤")),
    ("possibly be made as high as", Some("≤")),
    ("was obtained as", None),
    // Equality and statistics.
    ("equal to", Some("=")),
    ("equals", Some("=")),
    ("stabilized at a value of", Some("=")),
    ("proportional to", Some("∝")),
    ("between", Some("")),
    ("between ∼", None),
    ("between about", None),
    ("between the ages of", None),
    // Recognized but unmapped range phrasings.
    ("inbetween", None),
    ("estimated", None),
    ("up to exceed", None),
    ("is identified to be", None),
    ("within <", None),
    ("evaluated to be", None),
    ("range of", None),
    ("ranging from", None),
    ("ranged from", None),
    ("ranged between", None),
    ("range from", None),
    ("range", None),
    ("ranges", None),
    ("in the range of", None),
    ("the range between", None),
    ("an initial value between", None),
    ("until", None),
    ("top", None),
    ("within the top", None),
    ("before", None),
    ("past", None),
    ("after", None),
    ("approximately every", None),
    ("every", None),
    ("low as", None),
    ("increases from", None),
    ("increases from ∼", None),
    ("increased from", None),
    ("decreased from the initial", None),
    ("decreased from", None),
    ("declined from", None),
    ("decreased below", None),
    ("decrease to", None),
    ("down to", None),
    ("fallen from", None),
    ("toward", None),
    ("approached", None),
    ("reach", None),
    ("calculated to", None),
    ("lower", None),
    ("upper", None),
    ("last", None),
    ("found to be", None),
    ("was as high as", None),
    ("were revealed to be", None),
    ("starts on", None),
    ("from", None),
    ("average maximum", None),
    ("better than", None),
    ("worse than", None),
    ("comes to", None),
    ("within", None),
    ("mean and 2sd of", None),
    ("in the amount of", None),
];

const STATISTICAL_MODIFIERS_PREFIXED: &[(&str, &str)] = &[
    ("average", "mean"),
    ("average of", "mean"),
    ("average over", "mean"),
    ("average value of", "mean"),
    ("averaging", "mean"),
    ("on average", "mean"),
    ("mean", "mean"),
    ("mean over", "mean"),
    ("mean value of", "mean"),
    ("median", "median"),
    ("median over", "median"),
    ("median value of", "median"),
    ("a median of", "median"),
];

const SUFFIXED_MODIFIER_TABLE: &[(&str, Option<&str>)] = &[
    ("or lower", Some("≤")),
    ("or higher", Some("≥")),
    ("or less", Some("≤")),
    ("or more", Some("≥")),
    ("at least", Some("≥")),
    ("at minimum", Some("≥")),
    ("at maximum", Some("≤")),
    ("at most", None),
    ("at best", Some("≤")),
    ("at worst", Some("≥")),
    ("approximately", Some("~")),
    ("approx.", Some("~")),
    ("approx", Some("~")),
    ("range", Some("~")),
    ("higher", None),
    ("nominally", None),
    ("larger", None),
];

const STATISTICAL_MODIFIERS_SUFFIXED: &[(&str, &str)] = &[
    ("on average,", "mean"),
    ("on average", "mean"),
    ("average", "mean"),
    ("median", "median"),
    ("mean", "mean"),
];

fn sort_longest_first(v: &mut Vec<String>) {
    v.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    v.dedup();
}

/// All prefixed-modifier surfaces, longest first, including `"<phrase> a"`
/// variants (`"up to a"`).
pub static PREFIXED_MODIFIER_SURFACES: Lazy<Vec<String>> = Lazy::new(|| {
    let mut surfaces: Vec<String> = PREFIXED_MODIFIER_TABLE
        .iter()
        .map(|(s, _)| (*s).to_string())
        .chain(STATISTICAL_MODIFIERS_PREFIXED.iter().map(|(s, _)| (*s).to_string()))
        .collect();
    let article_variants: Vec<String> = surfaces
        .iter()
        .filter(|s| !s.ends_with(" a") && *s != "non-" && *s != "negative")
        .map(|s| format!("{s} a"))
        .collect();
    surfaces.extend(article_variants);
    sort_longest_first(&mut surfaces);
    surfaces
});

/// All suffixed-modifier surfaces, longest first, including parenthesized
/// variants (`"(at least)"`).
pub static SUFFIXED_MODIFIER_SURFACES: Lazy<Vec<String>> = Lazy::new(|| {
    let mut surfaces: Vec<String> = SUFFIXED_MODIFIER_TABLE
        .iter()
        .map(|(s, _)| (*s).to_string())
        .chain(STATISTICAL_MODIFIERS_SUFFIXED.iter().map(|(s, _)| (*s).to_string()))
        .collect();
    let parenthesized: Vec<String> = surfaces
        .iter()
        .filter(|s| !s.ends_with(',') && !s.ends_with(')'))
        .map(|s| format!("({s})"))
        .collect();
    surfaces.extend(parenthesized);
    sort_longest_first(&mut surfaces);
    surfaces
});

fn modifier_map(
    table: &[(&'static str, Option<&'static str>)],
    statistical: &[(&'static str, &'static str)],
    article_suffix: bool,
    parenthesize: bool,
) -> HashMap<String, &'static str> {
    let mut map: HashMap<String, &'static str> = HashMap::new();
    for (surface, normalized) in table {
        if let Some(n) = normalized {
            map.insert((*surface).to_string(), *n);
        }
    }
    for (surface, normalized) in statistical {
        map.insert((*surface).to_string(), *normalized);
    }
    if article_suffix {
        let variants: Vec<(String, &'static str)> = map
            .iter()
            .filter(|(s, _)| !s.ends_with(" a") && *s != "non-" && *s != "negative")
            .map(|(s, n)| (format!("{s} a"), *n))
            .collect();
        map.extend(variants);
    }
    if parenthesize {
        let variants: Vec<(String, &'static str)> = map
            .iter()
            .filter(|(s, _)| !s.ends_with(',') && !s.ends_with(')'))
            .map(|(s, n)| (format!("({s})"), *n))
            .collect();
        map.extend(variants);
    }
    map
}

/// Prefixed modifier surface → normalized operator.
pub static PREFIXED_MODIFIER_MAP: Lazy<HashMap<String, &'static str>> =
    Lazy::new(|| modifier_map(PREFIXED_MODIFIER_TABLE, STATISTICAL_MODIFIERS_PREFIXED, true, false));

/// Suffixed modifier surface → normalized operator.
pub static SUFFIXED_MODIFIER_MAP: Lazy<HashMap<String, &'static str>> =
    Lazy::new(|| modifier_map(SUFFIXED_MODIFIER_TABLE, STATISTICAL_MODIFIERS_SUFFIXED, false, true));

/// Single-character modifier symbols plus the signs that belong to the
/// quantity span; used by the tokenizer for adjacency splits.
pub static PREFIXED_MODIFIER_SYMBOLS: Lazy<Vec<String>> = Lazy::new(|| {
    let mut symbols: Vec<String> = PREFIXED_MODIFIER_SURFACES
        .iter()
        .filter(|s| s.chars().count() == 1)
        .cloned()
        .collect();
    symbols.extend(MATH_SYMBOLS_PART_OF_SPAN.iter().map(|s| (*s).to_string()));
    symbols
});

pub const RANGE_SEPARATORS: [&str; 2] = ["-", "to"];
pub const LIST_SEPARATORS: [&str; 9] =
    ["and", "or", ";", ",", ", and", ", or", "vs.", "vs", "versus"];
pub const RATIO_SEPARATORS: [&str; 6] = [":", "of the", "out of", "out of the", "of", "per"];
pub const MULTIDIM_SEPARATORS: [&str; 4] = ["x", "*", "times", "by"];
pub const MATH_OPERATORS: [&str; 13] =
    ["+", "-", "*", "/", "^", "(", ")", "±", "∓", "[", "]", "{", "}"];
pub const MULTIWORD_SEPARATORS: [&str; 3] = ["of the", "out of", "out of the"];

/// Modifier surfaces that can also be units (`"2 min 45 s"`).
pub const MODIFIERS_THAT_DOUBLE_AS_UNITS: [&str; 4] = ["min", "min.", "max", "max."];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_words_cover_fractions_and_plurals() {
        assert_eq!(ALL_NUMBER_WORDS["twenty"], dec(20));
        assert_eq!(ALL_NUMBER_WORDS["third"], dec(3));
        assert_eq!(ALL_NUMBER_WORDS["thirds"], frac(1, 3));
        assert_eq!(ALL_NUMBER_WORDS["half"], frac(1, 2));
        assert_eq!(ALL_NUMBER_WORDS["hundredths"], frac(1, 100));
        assert_eq!(ALL_NUMBER_WORDS["dozen"], dec(12));
        assert_eq!(STANDALONE_NUMBER_WORDS["a tenth"], frac(1, 10));
    }

    #[test]
    fn ambiguous_fraction_words_include_derived_plurals() {
        assert!(AMBIGUOUS_FRACTION_WORDS.contains("third"));
        assert!(AMBIGUOUS_FRACTION_WORDS.contains("tenths"));
        assert!(!AMBIGUOUS_FRACTION_WORDS.contains("twenty"));
    }

    #[test]
    fn imprecise_phrases_exclude_bare_magnitudes() {
        assert!(IMPRECISE_QUANTITIES.iter().any(|p| p == "several"));
        assert!(IMPRECISE_QUANTITIES.iter().any(|p| p == "few hundred"));
        assert!(!IMPRECISE_QUANTITIES.iter().any(|p| p == "hundred"));
        assert!(IMPRECISE_QUANTITIES_WITH_ARTICLE.iter().any(|p| p == "a few hundred"));
        assert!(IMPRECISE_QUANTITIES_WITH_ARTICLE.iter().any(|p| p == "hundreds"));
    }

    #[test]
    fn modifier_maps_normalize_to_operator_set() {
        assert_eq!(PREFIXED_MODIFIER_MAP["about"], "~");
        assert_eq!(PREFIXED_MODIFIER_MAP["at least"], "≥");
        assert_eq!(PREFIXED_MODIFIER_MAP["up to a"], "≤");
        assert_eq!(SUFFIXED_MODIFIER_MAP["or more"], "≥");
        assert_eq!(SUFFIXED_MODIFIER_MAP["(at least)"], "≥");
        assert!(!PREFIXED_MODIFIER_MAP.contains_key("ranging from"));
        assert!(PREFIXED_MODIFIER_SURFACES.iter().any(|s| s == "ranging from"));
    }

    #[test]
    fn surfaces_sorted_longest_first() {
        for pair in PREFIXED_MODIFIER_SURFACES.windows(2) {
            assert!(pair[0].len() >= pair[1].len());
        }
    }
}
