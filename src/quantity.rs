//! The quantity parser: drives normalization, tokenization, role
//! tagging, superstructure segmentation, slot matching, per-slot
//! normalization, ellipsis resolution and validation.

use rust_decimal::Decimal;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::QuinexError;
use crate::filters::filter_ambiguous_candidates;
use crate::lookups::{
    LIST_SEPARATORS, MATH_OPERATORS, MATH_SYMBOLS_PART_OF_SPAN, MODIFIERS_THAT_DOUBLE_AS_UNITS,
    MULTIDIM_SEPARATORS, PREFIXED_MODIFIER_SURFACES, PREFIXED_MODIFIER_SYMBOLS, RANGE_SEPARATORS,
    RATIO_SEPARATORS, SUFFIXED_MODIFIER_SURFACES,
};
use crate::modifier::normalize_modifier;
use crate::normalize::normalize_quantity_span;
use crate::patterns::{
    CURRENCY_YEAR_TOKEN, SLOT_GRAMMAR, is_imprecise_value, is_numeric_value_token,
    is_standalone_number_word, is_uncertainty_expression,
};
use crate::registry::UnitRegistry;
use crate::tokenizer::{split_at_word_boundaries, tokenize_quantity};
use crate::types::{
    NormalizedQuantity, NormalizedValue, ParseResult, Separator, SeparatorKind, StructureKind,
    UncertaintySlot, UnitReference, Value,
};
use crate::uncertainty::{normalize_uncertainty_expression, uncertainty_is_valid};
use crate::unit::UnitParser;
use crate::value::{CastOptions, cast_value, parse_value_with_magnitude, pow10};

use once_cell::sync::Lazy;
use regex::Regex;

/// Candidate-lattice bound; beyond it every token keeps its first role.
const MAX_ROLE_CANDIDATES: usize = 64;

pub(crate) const SLOT_PREFIXED_MODIFIER: usize = 0;
pub(crate) const SLOT_PREFIXED_UNIT: usize = 1;
pub(crate) const SLOT_VALUE: usize = 2;
pub(crate) const SLOT_UNC_PRE: usize = 3;
pub(crate) const SLOT_SUFFIXED_UNIT: usize = 4;
pub(crate) const SLOT_UNC_POST: usize = 5;
pub(crate) const SLOT_SUFFIXED_MODIFIER: usize = 6;

const SLOT_NAMES: [&str; 7] = [
    "prefixed_modifier",
    "prefixed_unit",
    "value",
    "unc_pre",
    "suffixed_unit",
    "unc_post",
    "suffixed_modifier",
];

static CONTAINS_DECIMAL_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+").unwrap());
static NON_PHYSICAL_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z \-]{3,}$").unwrap());

/// Token role in the quantity superstructure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    Whitespace,
    Number,
    Year,
    Unit,
    RangeSeparator,
    ListSeparator,
    MultidimSeparator,
    RatioSeparator,
    MathOperator,
    PrefixedModifier,
    SuffixedModifier,
    Uncertainty,
}

impl Role {
    fn code(self) -> char {
        match self {
            Role::Whitespace => 'w',
            Role::Number => 'n',
            Role::Year => 'y',
            Role::Unit => 'u',
            Role::RangeSeparator => 'r',
            Role::ListSeparator => 'l',
            Role::MultidimSeparator => 'd',
            Role::RatioSeparator => 'o',
            Role::MathOperator => 'm',
            Role::PrefixedModifier => 'p',
            Role::SuffixedModifier => 's',
            Role::Uncertainty => 'x',
        }
    }

    fn separator_kind(self) -> Option<SeparatorKind> {
        match self {
            Role::RangeSeparator => Some(SeparatorKind::RangeSeparator),
            Role::ListSeparator => Some(SeparatorKind::ListSeparator),
            Role::MultidimSeparator => Some(SeparatorKind::MultidimSeparator),
            Role::RatioSeparator => Some(SeparatorKind::RatioSeparator),
            _ => None,
        }
    }
}

/// Slot surfaces of one segmented quantity, in positional order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Segmented {
    pub slots: [Option<String>; 7],
}

/// One interpretation of the superstructure under a fixed role
/// assignment.
#[derive(Clone, Debug)]
pub(crate) struct Candidate {
    pub quantities: Vec<Vec<String>>,
    pub segmented: Vec<Option<Segmented>>,
    pub separators: Vec<Separator>,
    pub kind: StructureKind,
}

impl Candidate {
    pub fn fully_segmented(&self) -> bool {
        !self.segmented.is_empty() && self.segmented.iter().all(Option::is_some)
    }

    pub fn same_interpretation(&self, other: &Candidate) -> bool {
        self.quantities == other.quantities
            && self.kind == other.kind
            && self.segmented == other.segmented
    }
}

struct EllipsedContext {
    prefixed_unit: Option<UnitReference>,
    suffixed_unit: Option<UnitReference>,
    magnitude: Option<i32>,
}

/// Rule-based parser for free-text quantity expressions.
pub struct QuantityParser<'r> {
    unit_parser: UnitParser<'r>,
    error_if_no_success: bool,
}

impl Default for QuantityParser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl QuantityParser<'static> {
    /// Parser over the builtin unit registry.
    pub fn new() -> Self {
        Self::with_registry(UnitRegistry::builtin())
    }
}

impl<'r> QuantityParser<'r> {
    pub fn with_registry(registry: &'r UnitRegistry) -> Self {
        Self {
            unit_parser: UnitParser::new(registry),
            error_if_no_success: false,
        }
    }

    /// Promote the final soft failure to an error.
    pub fn error_if_no_success(mut self, strict: bool) -> Self {
        self.error_if_no_success = strict;
        self
    }

    pub fn unit_parser(&self) -> &UnitParser<'r> {
        &self.unit_parser
    }

    /// Parse one quantity expression. Fails soft (`success = Some(false)`)
    /// unless strict mode is enabled.
    pub fn parse(&self, text: &str) -> Result<ParseResult, QuinexError> {
        self.parse_with_options(text, false)
    }

    /// Like [`parse`](Self::parse); `simplify` collapses the positional
    /// uncertainty slots into one field per quantity.
    pub fn parse_with_options(
        &self,
        text: &str,
        simplify: bool,
    ) -> Result<ParseResult, QuinexError> {
        let mut result = self.parse_inner(text);
        if simplify {
            result.simplify();
        }
        if self.error_if_no_success && result.success == Some(false) {
            return Err(QuinexError::ParseFailed {
                text: text.to_string(),
            });
        }
        Ok(result)
    }

    fn parse_inner(&self, text: &str) -> ParseResult {
        let mut clean = normalize_quantity_span(text);
        for suffix in [" and", ","] {
            if let Some(rest) = clean.strip_suffix(suffix) {
                clean = rest.to_string();
            }
        }

        let mut parts = tokenize_quantity(&clean);
        let mut role_sets = self.role_candidates(&parts);

        if parts.len() == 1
            && !role_sets
                .iter()
                .any(|rs| rs.iter().any(|r| *r == Role::Number))
        {
            // A single opaque token: re-tokenize at word boundaries and
            // try again.
            parts = split_at_word_boundaries(&clean);
            role_sets = self.role_candidates(&parts);
        }

        let mut candidates: Vec<Candidate> = role_sets
            .into_iter()
            .map(|roles| self.build_candidate(roles, &parts))
            .collect();
        if candidates.len() > 1 {
            candidates = filter_ambiguous_candidates(candidates, text);
        }
        let candidate = match candidates.into_iter().next() {
            Some(c) => c,
            None => Candidate {
                quantities: Vec::new(),
                segmented: Vec::new(),
                separators: Vec::new(),
                kind: StructureKind::SingleQuantity,
            },
        };

        let pre_segmented = candidate.fully_segmented();
        let total = candidate.quantities.len();
        let mut context: Option<EllipsedContext> = None;
        let mut failed = false;
        let mut normalized_rev: Vec<NormalizedQuantity> = Vec::with_capacity(total);

        for rev_i in 0..total {
            let orig_i = total - 1 - rev_i;
            let mut quantity = if pre_segmented {
                let mut segmented = candidate.segmented[orig_i].clone().expect("pre-segmented");
                if segmented.slots[SLOT_SUFFIXED_UNIT].as_deref() == Some("-") {
                    // A bare dash stands for 'same unit as the last one';
                    // clearing it lets ellipsis resolution fill it in.
                    segmented.slots[SLOT_SUFFIXED_UNIT] = None;
                }
                let normalized = self.normalize_segmented(&segmented);
                if validate_quantity(&normalized) {
                    normalized
                } else {
                    self.sliding_window(&candidate.quantities[orig_i])
                }
            } else {
                self.sliding_window(&candidate.quantities[orig_i])
            };

            self.promote_uncertainty_unit(&mut quantity);

            if !validate_quantity(&quantity) {
                failed = true;
                break;
            }

            let magnitude = quantity
                .value
                .as_ref()
                .and_then(|v| v.normalized.as_ref())
                .and_then(|n| n.order_of_magnitude);
            resolve_ellipses(rev_i, &mut quantity, &mut context, magnitude);
            normalized_rev.push(quantity);
        }
        normalized_rev.reverse();

        let mut kind = candidate.kind;
        let (normalized_quantities, success) = if failed {
            (Vec::new(), Some(false))
        } else {
            let formally_valid = superstructure_is_formally_valid(normalized_rev.len(), kind);
            let score = if formally_valid {
                superstructure_score(&normalized_rev, kind)
            } else {
                10
            };
            let success = if !formally_valid || score > 2 {
                Some(false)
            } else if score > 0 {
                None
            } else {
                Some(true)
            };
            (normalized_rev, success)
        };

        // 'between 1.23 and 1.24' reads as a range although 'and' is a
        // list separator.
        if kind == StructureKind::List {
            if let Some(first_modifier) = normalized_quantities
                .first()
                .and_then(|q| q.prefixed_modifier.as_ref())
            {
                if first_modifier.text.contains("between") {
                    kind = StructureKind::Range;
                }
            }
        }

        ParseResult {
            text: text.to_string(),
            kind,
            nbr_quantities: total,
            normalized_quantities,
            separators: candidate.separators,
            success,
        }
    }

    // ------------------------------------------------------------------
    // Role tagging
    // ------------------------------------------------------------------

    fn role_candidates(&self, parts: &[String]) -> Vec<Vec<Role>> {
        let per_token = self.token_roles(parts);

        let lattice_size: usize = per_token
            .iter()
            .map(|roles| roles.len())
            .try_fold(1usize, |acc, n| acc.checked_mul(n))
            .unwrap_or(usize::MAX);
        let mut candidates: Vec<Vec<Role>> = if lattice_size > MAX_ROLE_CANDIDATES {
            debug!(
                tokens = parts.len(),
                lattice_size, "role lattice too large, keeping first roles"
            );
            vec![per_token.iter().map(|roles| roles[0]).collect()]
        } else {
            let mut acc: Vec<Vec<Role>> = vec![Vec::with_capacity(parts.len())];
            for roles in &per_token {
                let mut next = Vec::with_capacity(acc.len() * roles.len());
                for prefix in &acc {
                    for &role in roles {
                        let mut extended = prefix.clone();
                        extended.push(role);
                        next.push(extended);
                    }
                }
                acc = next;
            }
            acc
        };

        if candidates.len() > 1 {
            candidates.retain(|rs| {
                !rs.windows(3).any(|w| {
                    w == [Role::RangeSeparator, Role::Whitespace, Role::RangeSeparator]
                })
            });
        }

        // A colon between numbers is a ratio, not a unit.
        if candidates.len() == 2 {
            let ratio = [Role::Number, Role::RatioSeparator, Role::Number];
            let unit = [Role::Number, Role::Unit, Role::Number];
            let spaced_ratio = [
                Role::Number,
                Role::Whitespace,
                Role::RatioSeparator,
                Role::Whitespace,
                Role::Number,
            ];
            let spaced_unit = [
                Role::Number,
                Role::Whitespace,
                Role::Unit,
                Role::Whitespace,
                Role::Number,
            ];
            if (candidates[0] == ratio && candidates[1] == unit)
                || (candidates[0] == spaced_ratio && candidates[1] == spaced_unit)
            {
                candidates.truncate(1);
            }
        }

        candidates
    }

    fn token_roles(&self, parts: &[String]) -> Vec<SmallVec<[Role; 4]>> {
        let mut assigned: Vec<SmallVec<[Role; 4]>> = Vec::with_capacity(parts.len());

        let preceded_by_number = |assigned: &[SmallVec<[Role; 4]>]| {
            assigned.last().is_some_and(|r| r.contains(&Role::Number))
        };
        let preceded_by_ws_and_number = |assigned: &[SmallVec<[Role; 4]>]| {
            assigned.len() > 1
                && assigned[assigned.len() - 1].contains(&Role::Whitespace)
                && assigned[assigned.len() - 2].contains(&Role::Number)
        };
        let preceded_by_list_separator = |assigned: &[SmallVec<[Role; 4]>]| {
            assigned
                .last()
                .is_some_and(|r| r.contains(&Role::ListSeparator))
                || (assigned.len() > 1
                    && assigned[assigned.len() - 2].contains(&Role::ListSeparator)
                    && assigned[assigned.len() - 1].contains(&Role::Whitespace))
        };
        let followed_by_number =
            |i: usize, parts: &[String]| parts.get(i + 1).is_some_and(|p| is_numeric_value_token(p));
        let followed_by_ws_and_number = |i: usize, parts: &[String]| {
            parts.get(i + 1).is_some_and(|p| p == " ")
                && parts.get(i + 2).is_some_and(|p| is_numeric_value_token(p))
        };

        for (i, part) in parts.iter().enumerate() {
            let sep_allowed = 0 < i && i < parts.len() - 1;
            let lowered = part.to_lowercase();
            let mut roles: SmallVec<[Role; 4]> = SmallVec::new();

            if part == " " {
                roles.push(Role::Whitespace);
            } else if (part == "a" || part == "an") && parts.len() > 1 {
                if followed_by_ws_and_number(i, parts) {
                    roles.push(Role::PrefixedModifier);
                    if assigned.iter().any(|r| r.contains(&Role::Number)) {
                        // After a number 'a' can be the unit year.
                        roles.push(Role::Unit);
                    }
                } else {
                    // 'up to a kilometer': the article acts as one.
                    roles.push(Role::Number);
                    if part == "a" {
                        roles.push(Role::Unit);
                    }
                }
            } else if CURRENCY_YEAR_TOKEN.is_match(part) {
                roles.push(Role::Year);
                roles.push(Role::Number);
            } else if is_numeric_value_token(part) {
                if is_standalone_number_word(part) && preceded_by_ws_and_number(&assigned) {
                    // '1 second': the number word is a unit here.
                    roles.push(Role::Unit);
                } else if is_imprecise_value(part) && preceded_by_ws_and_number(&assigned) {
                    // '100 tons of products': part of the unit.
                    roles.push(Role::Unit);
                } else {
                    roles.push(Role::Number);
                }
            } else if part == "e" || part == "E" {
                // Stranded exponent marker of scientific notation.
                roles.push(Role::Number);
            } else if sep_allowed && RANGE_SEPARATORS.contains(&part.as_str()) {
                roles.push(Role::RangeSeparator);
                if MATH_OPERATORS.contains(&part.as_str()) {
                    if preceded_by_list_separator(&assigned) && (part == "-" || part == "+") {
                        // '50 and -50%': a sign, not a range.
                        roles.push(Role::Number);
                    } else if part == "-"
                        && (preceded_by_number(&assigned) || preceded_by_ws_and_number(&assigned))
                    {
                        roles.push(Role::MathOperator);
                        // '3-to 5-years': can mark a unit ellipsis.
                        roles.push(Role::Unit);
                    } else {
                        roles.push(Role::MathOperator);
                    }
                } else if part == "to" && preceded_by_list_separator(&assigned) {
                    // '0%, 10%, to 20%'.
                    roles.push(Role::PrefixedModifier);
                }
            } else if sep_allowed && LIST_SEPARATORS.contains(&part.trim()) {
                roles.push(Role::ListSeparator);
            } else if sep_allowed && MULTIDIM_SEPARATORS.contains(&part.as_str()) {
                roles.push(Role::MultidimSeparator);
                if part == "times" || part == "by" {
                    // '2-3 times', '5% by weight'.
                    roles.push(Role::Unit);
                } else if part == "*" {
                    roles.push(Role::MathOperator);
                }
            } else if MATH_OPERATORS.contains(&part.as_str()) {
                if assigned.is_empty() && PREFIXED_MODIFIER_SYMBOLS.iter().any(|s| s == part) {
                    if MATH_SYMBOLS_PART_OF_SPAN.contains(&part.as_str())
                        && followed_by_ws_and_number(i, parts)
                    {
                        // '- 1' parses to -1.
                        roles.push(Role::Number);
                    } else {
                        roles.push(Role::PrefixedModifier);
                    }
                } else {
                    roles.push(Role::MathOperator);
                    roles.push(Role::PrefixedModifier);
                }
            } else if PREFIXED_MODIFIER_SURFACES.iter().any(|s| *s == lowered) {
                roles.push(Role::PrefixedModifier);
                if SUFFIXED_MODIFIER_SURFACES.iter().any(|s| *s == lowered) && !assigned.is_empty()
                {
                    roles.push(Role::SuffixedModifier);
                }
                if MODIFIERS_THAT_DOUBLE_AS_UNITS.contains(&part.as_str()) && !assigned.is_empty() {
                    // '2 min 45 s'.
                    roles.push(Role::Unit);
                }
            } else if SUFFIXED_MODIFIER_SURFACES.iter().any(|s| *s == lowered)
                && !assigned.is_empty()
            {
                roles.push(Role::SuffixedModifier);
            } else if is_uncertainty_expression(part) {
                roles.push(Role::Uncertainty);
            } else if sep_allowed && RATIO_SEPARATORS.contains(&part.as_str()) {
                roles.push(Role::RatioSeparator);
                let between_numbers = (preceded_by_number(&assigned)
                    || preceded_by_ws_and_number(&assigned))
                    && (followed_by_number(i, parts) || followed_by_ws_and_number(i, parts));
                if !between_numbers {
                    roles.push(Role::Unit);
                }
            } else {
                roles.push(Role::Unit);
            }

            assigned.push(roles);
        }
        assigned
    }

    // ------------------------------------------------------------------
    // Segmentation
    // ------------------------------------------------------------------

    fn build_candidate(&self, roles: Vec<Role>, parts: &[String]) -> Candidate {
        let (quantities, quantity_roles, separators) = self.segment(&roles, parts);
        let kind = superstructure_kind(&separators);
        let segmented = quantities
            .iter()
            .zip(&quantity_roles)
            .map(|(tokens, roles)| slots_for(tokens, roles))
            .collect();
        Candidate {
            quantities,
            segmented,
            separators,
            kind,
        }
    }

    #[allow(clippy::type_complexity)]
    fn segment(
        &self,
        roles: &[Role],
        parts: &[String],
    ) -> (Vec<Vec<String>>, Vec<Vec<Role>>, Vec<Separator>) {
        let mut quantities: Vec<Vec<String>> = Vec::new();
        let mut quantity_roles: Vec<Vec<Role>> = Vec::new();
        let mut separators: Vec<Separator> = Vec::new();
        let mut last = 0usize;

        for (i, &role) in roles.iter().enumerate() {
            let kind = if let Some(kind) = role.separator_kind() {
                if roles.get(i + 1) == Some(&Role::Uncertainty) {
                    // Commas inside '2.30, 95% CI 1.03-5.13' do not split.
                    continue;
                }
                Some(kind)
            } else if role == Role::PrefixedModifier
                && roles[last..i]
                    .iter()
                    .any(|r| !matches!(r, Role::PrefixedModifier | Role::Whitespace))
            {
                // A prefixed modifier after other content starts a new
                // quantity.
                if i == roles.len() - 1 {
                    None // reads as a suffixed modifier instead
                } else if parts[i] == "between" || parts[i] == "up to" {
                    Some(SeparatorKind::RangeSeparator)
                } else {
                    Some(SeparatorKind::ModifierBoundary)
                }
            } else {
                None
            };

            let Some(kind) = kind else { continue };

            let mut start = last;
            if start < i && parts[start] == " " {
                start += 1;
            }
            quantities.push(parts[start..i].to_vec());
            quantity_roles.push(roles[start..i].to_vec());
            separators.push(Separator {
                text: parts[i].clone(),
                kind,
            });
            last = i + 1;
        }

        if last < roles.len() {
            let mut start = last;
            if start < parts.len() && parts[start] == " " {
                start += 1;
            }
            quantities.push(parts[start..].to_vec());
            quantity_roles.push(roles[start..].to_vec());
        }

        (quantities, quantity_roles, separators)
    }

    // ------------------------------------------------------------------
    // Per-quantity normalization
    // ------------------------------------------------------------------

    fn normalize_segmented(&self, segmented: &Segmented) -> NormalizedQuantity {
        let (prefixed_unit, _) = self.normalize_units(
            segmented.slots[SLOT_PREFIXED_UNIT].as_deref(),
            false,
            false,
        );
        let (suffixed_unit, forgotten_magnitude) =
            self.normalize_units(segmented.slots[SLOT_SUFFIXED_UNIT].as_deref(), true, true);

        // A magnitude word mistakenly matched into the unit slot belongs
        // to the value: '1.24' + 'million euros'.
        let mut value_span = segmented.slots[SLOT_VALUE].clone();
        if !forgotten_magnitude.is_empty() {
            value_span = Some(match value_span {
                Some(v) => format!("{v} {forgotten_magnitude}"),
                None => forgotten_magnitude.clone(),
            });
        }
        let value = self.normalize_value(value_span.as_deref());

        let unc_pre = segmented.slots[SLOT_UNC_PRE].as_deref().and_then(|raw| {
            normalize_uncertainty_expression(
                &self.unit_parser,
                raw,
                prefixed_unit.as_ref(),
                suffixed_unit.as_ref(),
            )
        });
        let unc_post = segmented.slots[SLOT_UNC_POST].as_deref().and_then(|raw| {
            normalize_uncertainty_expression(
                &self.unit_parser,
                raw,
                prefixed_unit.as_ref(),
                suffixed_unit.as_ref(),
            )
        });

        NormalizedQuantity {
            prefixed_modifier: segmented.slots[SLOT_PREFIXED_MODIFIER]
                .as_deref()
                .and_then(|s| normalize_modifier(s, true)),
            prefixed_unit,
            value: Some(value),
            uncertainty_expression_pre_unit: unc_pre,
            suffixed_unit,
            uncertainty_expression_post_unit: unc_post,
            suffixed_modifier: segmented.slots[SLOT_SUFFIXED_MODIFIER]
                .as_deref()
                .and_then(|s| normalize_modifier(s, false)),
            uncertainty: None,
        }
    }

    /// Normalize a unit span: link it against the registry and detach a
    /// leading order-of-magnitude word when asked to. Returns the slot
    /// and the detached magnitude chain.
    fn normalize_units(
        &self,
        span: Option<&str>,
        check_forgotten_magnitude: bool,
        is_suffixed: bool,
    ) -> (Option<UnitReference>, String) {
        let Some(span) = span else {
            return (None, String::new());
        };
        if span.is_empty() {
            return (None, String::new());
        }

        let mut span = span.to_string();
        let mut forgotten = String::new();
        if check_forgotten_magnitude {
            if let Some((magnitude, rest)) = split_leading_magnitude(&span) {
                forgotten = magnitude;
                span = rest;
            }
        }

        let mut normalized = None;
        if !span.is_empty() && !CONTAINS_DECIMAL_NUMBER.is_match(&span) {
            normalized = self.unit_parser.parse_with_exponent(&span, 1, true);
        }

        // 'three-compartment': the unit is 'compartment'.
        if is_suffixed && span.starts_with('-') && NON_PHYSICAL_UNIT.is_match(&span) {
            span = span[1..].trim().to_string();
        }

        if let Some(units) = &normalized {
            if span.ends_with(" in") && units.len() > 1 {
                // 'in 2015' or 'in Paris' beats inch.
                normalized = None;
            }
        }

        (
            Some(UnitReference {
                text: Some(span),
                ellipsed_text: None,
                normalized,
            }),
            forgotten,
        )
    }

    fn normalize_value(&self, span: Option<&str>) -> Value {
        let Some(span) = span else {
            return Value {
                text: None,
                normalized: None,
            };
        };

        let no_norm = CastOptions {
            consider_num_words: true,
            normalize_chars: false,
            skip_magnitude: true,
        };
        let (value, magnitude) = match parse_value_with_magnitude(span) {
            Some((value, exp)) => (Some(value), Some(exp)),
            None => (cast_value(span, no_norm), None),
        };

        let mut text = span.to_string();
        let normalized = if let Some(value) = value {
            let numeric = match magnitude {
                Some(exp) => pow10(exp).and_then(|p| value.checked_mul(p)),
                None => Some(value),
            };
            numeric.map(|numeric| NormalizedValue {
                numeric_value: Some(numeric),
                is_imprecise: false,
                order_of_magnitude: magnitude,
            })
        } else if is_imprecise_value(span) {
            if let Some(stripped) = text.strip_suffix(" of") {
                text = stripped.to_string();
            }
            Some(NormalizedValue {
                numeric_value: None,
                is_imprecise: true,
                order_of_magnitude: None,
            })
        } else {
            None
        };

        Value {
            text: Some(text),
            normalized,
        }
    }

    /// Fallback when segmentation failed: grow a window per slot until
    /// the slot's normalizer accepts it, keep the longest acceptance.
    fn sliding_window(&self, parts: &[String]) -> NormalizedQuantity {
        let mut quantity = NormalizedQuantity::default();
        let mut max_valid = 0usize;

        for slot in 0..7 {
            let mut offset = max_valid;
            if offset < parts.len() && parts[offset] == " " {
                offset += 1;
            }

            let mut best: Option<NormalizedQuantity> = None;
            let mut best_end = max_valid;
            for end in (offset + 1)..=parts.len() {
                if parts[end - 1] == " " {
                    continue;
                }
                let window = parts[offset..end].concat().trim().to_string();
                if let Some(update) = self.try_slot(&quantity, slot, &window) {
                    best = Some(update);
                    best_end = end;
                }
            }
            if let Some(update) = best {
                quantity = update;
                max_valid = best_end;
            }
        }

        if max_valid != parts.len()
            && quantity
                .value
                .as_ref()
                .is_some_and(|v| v.normalized.is_some())
        {
            let leftover = parts[max_valid..].concat();
            if quantity.suffixed_modifier.is_none() {
                let mut span = quantity
                    .suffixed_unit
                    .as_ref()
                    .and_then(|u| u.text.clone())
                    .unwrap_or_default();
                span.push_str(&leftover);
                let (unit, _) = self.normalize_units(Some(span.trim()), false, true);
                quantity.suffixed_unit = unit;
            } else if quantity.suffixed_unit.is_none() {
                // 'two or more atoms': the tail is a unit before an
                // already-found suffixed modifier.
                let (unit, _) = self.normalize_units(Some(leftover.trim()), false, true);
                quantity.suffixed_unit = unit;
            } else {
                let mut span = quantity.suffixed_modifier.as_ref().map(|m| m.text.clone()).unwrap_or_default();
                span.push_str(&leftover);
                quantity.suffixed_modifier = normalize_modifier(span.trim(), false);
            }
        }

        quantity
    }

    /// Try to fill `slot` with `window`; `Some` when the slot normalizer
    /// accepts it.
    fn try_slot(
        &self,
        current: &NormalizedQuantity,
        slot: usize,
        window: &str,
    ) -> Option<NormalizedQuantity> {
        if window.is_empty() {
            return None;
        }
        let mut updated = current.clone();
        match slot {
            SLOT_PREFIXED_MODIFIER => {
                let modifier = normalize_modifier(window, true)?;
                modifier.normalized.as_ref()?;
                updated.prefixed_modifier = Some(modifier);
            }
            SLOT_PREFIXED_UNIT => {
                let (unit, forgotten) = self.normalize_units(Some(window), true, false);
                let unit = unit?;
                unit.normalized.as_ref()?;
                if !forgotten.is_empty() {
                    // A prefixed unit starting with a magnitude word is a
                    // value, not a unit.
                    return None;
                }
                updated.prefixed_unit = Some(unit);
            }
            SLOT_VALUE => {
                let value = self.normalize_value(Some(window));
                value.normalized.as_ref()?;
                updated.value = Some(value);
            }
            SLOT_UNC_PRE | SLOT_UNC_POST => {
                let uncertainty =
                    normalize_uncertainty_expression(&self.unit_parser, window, None, None)?;
                uncertainty.normalized.as_ref()?;
                if slot == SLOT_UNC_PRE {
                    updated.uncertainty_expression_pre_unit = Some(uncertainty);
                } else {
                    updated.uncertainty_expression_post_unit = Some(uncertainty);
                }
            }
            SLOT_SUFFIXED_UNIT => {
                let (unit, _) = self.normalize_units(Some(window), false, true);
                let unit = unit?;
                unit.normalized.as_ref()?;
                updated.suffixed_unit = Some(unit);
            }
            SLOT_SUFFIXED_MODIFIER => {
                let modifier = normalize_modifier(window, false)?;
                modifier.normalized.as_ref()?;
                updated.suffixed_modifier = Some(modifier);
            }
            _ => unreachable!(),
        }
        Some(updated)
    }

    /// A center without a unit takes the suffixed unit of its uncertainty
    /// expression when that one is not flagged as same-as-mean.
    fn promote_uncertainty_unit(&self, quantity: &mut NormalizedQuantity) {
        if quantity.suffixed_unit.is_some() {
            return;
        }
        let Some(uncertainty) = quantity.uncertainty_expression_pre_unit.as_mut() else {
            return;
        };
        let Some(normalized) = uncertainty.normalized.as_mut() else {
            return;
        };
        if normalized.unit.is_same_as_mean {
            return;
        }
        let Some(units) = normalized.unit.normalized.as_mut() else {
            return;
        };
        let slot = if units.contains_key(&UncertaintySlot::Suffixed) {
            UncertaintySlot::Suffixed
        } else if units.contains_key(&UncertaintySlot::SuffixedUb) {
            UncertaintySlot::SuffixedUb
        } else {
            return;
        };
        let unit = units[&slot].clone();
        if let Some(surface) = unit.text.as_deref() {
            if let Some(stripped) = uncertainty.text.strip_suffix(surface) {
                uncertainty.text = stripped.to_string();
            }
        }
        quantity.suffixed_unit = Some(unit);
        normalized.unit.is_same_as_mean = true;
        normalized.unit.normalized = Some(Default::default());
    }
}

// ----------------------------------------------------------------------
// Slot matching and structure helpers
// ----------------------------------------------------------------------

/// Match a quantity's role sequence against the slot grammar and collect
/// each slot's surface.
fn slots_for(tokens: &[String], roles: &[Role]) -> Option<Segmented> {
    let code: String = roles.iter().map(|r| Role::code(*r)).collect();
    let caps = SLOT_GRAMMAR.captures(&code)?;

    let mut slots: [Option<String>; 7] = Default::default();
    for (index, &name) in SLOT_NAMES.iter().enumerate() {
        if let Some(group) = caps.name(name) {
            if !group.is_empty() {
                let surface = tokens[group.start()..group.end()].concat().trim().to_string();
                slots[index] = if surface.is_empty() { None } else { Some(surface) };
            }
        }
    }
    Some(Segmented { slots })
}

fn superstructure_kind(separators: &[Separator]) -> StructureKind {
    let Some(first) = separators.first() else {
        return StructureKind::SingleQuantity;
    };
    if separators.iter().all(|s| s.kind == first.kind) {
        first.kind.structure()
    } else {
        StructureKind::Unknown
    }
}

fn superstructure_is_formally_valid(count: usize, kind: StructureKind) -> bool {
    match kind {
        StructureKind::SingleQuantity => count == 1,
        StructureKind::Range => count == 2,
        StructureKind::List | StructureKind::Multidim | StructureKind::Ratio => count >= 2,
        StructureKind::Unknown => true,
    }
}

fn validate_quantity(quantity: &NormalizedQuantity) -> bool {
    let Some(value) = &quantity.value else {
        return false;
    };
    if value.normalized.is_none() {
        return false;
    }
    for uncertainty in [
        &quantity.uncertainty_expression_pre_unit,
        &quantity.uncertainty_expression_post_unit,
    ]
    .into_iter()
    .flatten()
    {
        if !uncertainty_is_valid(uncertainty) {
            return false;
        }
    }
    true
}

fn units_match(a: &Option<UnitReference>, b: &Option<UnitReference>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.text == b.text
                || (a.ellipsed_text.is_some() && a.ellipsed_text == b.text)
                || a.normalized == b.normalized
        }
        _ => false,
    }
}

/// Concerns that do not invalidate a parse but lower confidence in it.
fn superstructure_score(quantities: &[NormalizedQuantity], kind: StructureKind) -> i32 {
    let mut score = 0;

    for quantity in quantities {
        if quantity
            .value
            .as_ref()
            .and_then(|v| v.normalized.as_ref())
            .is_none()
        {
            score += 3;
        }
        for unit in [&quantity.prefixed_unit, &quantity.suffixed_unit]
            .into_iter()
            .flatten()
        {
            if unit.text.is_some() && unit.normalized.is_none() {
                score += 1;
            }
        }
        for uncertainty in [
            &quantity.uncertainty_expression_pre_unit,
            &quantity.uncertainty_expression_post_unit,
        ]
        .into_iter()
        .flatten()
        {
            if uncertainty.normalized.is_none() {
                score += 1;
            }
        }
    }

    if kind == StructureKind::Range && quantities.len() == 2 {
        let (lower, upper) = (&quantities[0], &quantities[1]);
        let suffixed_match = units_match(&lower.suffixed_unit, &upper.suffixed_unit);
        let prefixed_match = units_match(&lower.prefixed_unit, &upper.prefixed_unit);

        let surface = |u: &Option<UnitReference>| u.as_ref().and_then(|u| u.text.clone());
        let surfaces = [
            surface(&lower.prefixed_unit),
            surface(&upper.prefixed_unit),
            surface(&lower.suffixed_unit),
            surface(&upper.suffixed_unit),
        ];
        if surfaces.iter().any(Option::is_some)
            && surfaces[0] == surfaces[1]
            && surfaces[2] == surfaces[3]
        {
            // Explicitly repeated units on both bounds are a good sign.
            score -= 1;
        }

        let bound = |q: &NormalizedQuantity| {
            q.value
                .as_ref()
                .and_then(|v| v.normalized.as_ref())
                .and_then(|n| n.numeric_value)
        };
        if let (Some(lb), Some(ub)) = (bound(lower), bound(upper)) {
            if lb > Decimal::ZERO && lb >= ub && suffixed_match && prefixed_match {
                score += 1;
            }
        }

        if !suffixed_match && prefixed_match {
            if let (Some(lb), Some(ub)) = (
                surface(&lower.suffixed_unit),
                surface(&upper.suffixed_unit),
            ) {
                if lb.contains(ub.as_str()) || ub.contains(lb.as_str()) {
                    // One bound's unit surface extends the other's: the
                    // extra characters are likely not part of the unit.
                    score += 1;
                }
            }
        }
    }

    score
}

fn resolve_ellipses(
    rev_index: usize,
    quantity: &mut NormalizedQuantity,
    context: &mut Option<EllipsedContext>,
    magnitude: Option<i32>,
) {
    if rev_index == 0 {
        *context = Some(EllipsedContext {
            prefixed_unit: quantity.prefixed_unit.clone(),
            suffixed_unit: quantity.suffixed_unit.clone(),
            magnitude,
        });
        return;
    }
    let Some(context) = context.as_ref() else {
        return;
    };

    if quantity.prefixed_unit.is_none() && quantity.suffixed_unit.is_none() {
        if let Some(unit) = &context.prefixed_unit {
            let mut ellipsed = unit.clone();
            ellipsed.ellipsed_text = ellipsed.text.take();
            quantity.prefixed_unit = Some(ellipsed);
        }
        if let Some(unit) = &context.suffixed_unit {
            let mut ellipsed = unit.clone();
            ellipsed.ellipsed_text = ellipsed.text.take();
            quantity.suffixed_unit = Some(ellipsed);
        }
    }

    if magnitude.is_none() {
        if let Some(exp) = context.magnitude.filter(|&e| e != 0) {
            if let Some(normalized) = quantity
                .value
                .as_mut()
                .and_then(|v| v.normalized.as_mut())
            {
                if let (Some(value), Some(scale)) = (normalized.numeric_value, pow10(exp)) {
                    if let Some(scaled) = value.checked_mul(scale) {
                        normalized.numeric_value = Some(scaled);
                    }
                }
            }
        }
    }
}

fn split_leading_magnitude(span: &str) -> Option<(String, String)> {
    use crate::lookups::ORDER_OF_MAGNITUDE_WORDS;

    let mut end = 0usize;
    let mut matched_any = false;
    let mut offset = 0usize;
    for word in span.split(' ') {
        let is_magnitude = ORDER_OF_MAGNITUDE_WORDS.contains_key(&word.to_lowercase());
        let is_connector = matched_any && word == "and";
        if is_magnitude {
            matched_any = true;
            end = offset + word.len();
        } else if !is_connector {
            break;
        }
        offset += word.len() + 1;
    }
    if !matched_any {
        return None;
    }
    let magnitude = span[..end].to_string();
    let rest = span[end..].trim_start().to_string();
    Some((magnitude, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> QuantityParser<'static> {
        QuantityParser::new()
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn value_of(q: &NormalizedQuantity) -> Option<Decimal> {
        q.value.as_ref()?.normalized.as_ref()?.numeric_value
    }

    #[test]
    fn single_quantity_with_modifier_and_magnitude() {
        let r = parser().parse("about 344 million €").unwrap();
        assert_eq!(r.kind, StructureKind::SingleQuantity);
        assert_eq!(r.nbr_quantities, 1);
        let q = &r.normalized_quantities[0];
        assert_eq!(
            q.prefixed_modifier.as_ref().unwrap().normalized.as_deref(),
            Some("~")
        );
        assert_eq!(value_of(q), Some(d("344000000")));
        let unit = q.suffixed_unit.as_ref().unwrap().normalized.as_ref().unwrap();
        assert_eq!(unit[0].uri, "http://qudt.org/vocab/unit/CCY_EUR");
        assert_eq!(r.success, Some(true));
    }

    #[test]
    fn slot_grammar_segmentation() {
        let roles = vec![Role::Unit, Role::Number, Role::MathOperator, Role::Unit];
        let tokens: Vec<String> = ["$", "0.07", "/", "kWh"].map(String::from).to_vec();
        let segmented = slots_for(&tokens, &roles).unwrap();
        assert_eq!(segmented.slots[SLOT_PREFIXED_UNIT].as_deref(), Some("$"));
        assert_eq!(segmented.slots[SLOT_VALUE].as_deref(), Some("0.07"));
        assert_eq!(segmented.slots[SLOT_SUFFIXED_UNIT].as_deref(), Some("/kWh"));
    }

    #[test]
    fn ranges_split_on_to() {
        let r = parser().parse("$0.07/kWh to $0.16/kWh").unwrap();
        assert_eq!(r.kind, StructureKind::Range);
        assert_eq!(r.nbr_quantities, 2);
        let values: Vec<_> = r.normalized_quantities.iter().map(value_of).collect();
        assert_eq!(values, vec![Some(d("0.07")), Some(d("0.16"))]);
        for q in &r.normalized_quantities {
            let prefixed = q.prefixed_unit.as_ref().unwrap().normalized.as_ref().unwrap();
            assert_eq!(prefixed[0].uri, "http://qudt.org/vocab/unit/CCY_USD");
            let suffixed = q.suffixed_unit.as_ref().unwrap().normalized.as_ref().unwrap();
            assert_eq!(suffixed[0].uri, "http://qudt.org/vocab/unit/KiloW-HR");
            assert_eq!(suffixed[0].exponent, -1);
        }
        assert_eq!(r.success, Some(true));
    }

    #[test]
    fn sliding_window_recovers_unsegmentable_spans() {
        let p = parser();
        let parts: Vec<String> = ["about", " ", "5", " ", "km"].map(String::from).to_vec();
        let q = p.sliding_window(&parts);
        assert_eq!(
            q.prefixed_modifier.as_ref().unwrap().normalized.as_deref(),
            Some("~")
        );
        assert_eq!(value_of(&q), Some(d("5")));
        assert!(q.suffixed_unit.as_ref().unwrap().normalized.is_some());
    }

    #[test]
    fn magnitude_word_detaches_from_unit() {
        let p = parser();
        let seg = Segmented {
            slots: [
                None,
                None,
                Some("1.24".into()),
                None,
                Some("million euros".into()),
                None,
                None,
            ],
        };
        let q = p.normalize_segmented(&seg);
        assert_eq!(value_of(&q), Some(d("1240000")));
        assert_eq!(q.suffixed_unit.as_ref().unwrap().text.as_deref(), Some("euros"));
    }

    #[test]
    fn ellipses_fill_units_and_magnitudes() {
        let r = parser().parse("1, 2, 3, and 4 million km").unwrap();
        assert_eq!(r.kind, StructureKind::List);
        assert_eq!(r.nbr_quantities, 4);
        let values: Vec<_> = r.normalized_quantities.iter().map(value_of).collect();
        assert_eq!(
            values,
            vec![
                Some(d("1000000")),
                Some(d("2000000")),
                Some(d("3000000")),
                Some(d("4000000"))
            ]
        );
        for q in &r.normalized_quantities[..3] {
            let unit = q.suffixed_unit.as_ref().unwrap();
            assert_eq!(unit.text, None);
            assert_eq!(unit.ellipsed_text.as_deref(), Some("km"));
        }
        let last = r.normalized_quantities[3].suffixed_unit.as_ref().unwrap();
        assert_eq!(last.text.as_deref(), Some("km"));
    }

    #[test]
    fn uncertainty_unit_promotes_to_center() {
        let r = parser().parse("12.5 ± 3.7%").unwrap();
        assert_eq!(r.kind, StructureKind::SingleQuantity);
        let q = &r.normalized_quantities[0];
        assert_eq!(value_of(q), Some(d("12.5")));
        let unc = q.uncertainty_expression_pre_unit.as_ref().unwrap();
        let normalized = unc.normalized.as_ref().unwrap();
        assert_eq!(normalized.value, (Some(d("-3.7")), Some(d("3.7"))));
        assert!(normalized.unit.is_same_as_mean);
        let unit = q.suffixed_unit.as_ref().unwrap().normalized.as_ref().unwrap();
        assert_eq!(unit[0].uri, "http://qudt.org/vocab/unit/PERCENT");
    }

    #[test]
    fn unparseable_spans_fail_soft() {
        let r = parser().parse("this is not a quantity").unwrap();
        assert_eq!(r.success, Some(false));
        assert!(r.normalized_quantities.is_empty());
    }

    #[test]
    fn strict_mode_raises() {
        let p = parser().error_if_no_success(true);
        assert!(matches!(
            p.parse("this is not a quantity"),
            Err(QuinexError::ParseFailed { .. })
        ));
        assert!(p.parse("5 km").is_ok());
    }
}
