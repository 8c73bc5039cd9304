//! Quantity-modifier normalization and the gazetteer-based span widener
//! used by external quantity taggers.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use once_cell::sync::Lazy;

use crate::lookups::{
    PREFIXED_MODIFIER_MAP, PREFIXED_MODIFIER_SURFACES, SUFFIXED_MODIFIER_MAP,
    SUFFIXED_MODIFIER_SURFACES,
};
use crate::types::Modifier;

/// Normalize a modifier surface to its symbolic operator. `a` maps to `=`
/// (an article acting as "one"), a bare sign at the start of a quantity is
/// kept verbatim, and a space-stripped retry catches glued variants.
pub(crate) fn normalize_modifier(span: &str, is_prefixed: bool) -> Option<Modifier> {
    if span.is_empty() {
        return None;
    }
    let map = if is_prefixed {
        &*PREFIXED_MODIFIER_MAP
    } else {
        &*SUFFIXED_MODIFIER_MAP
    };

    let lowered = span.to_lowercase();
    let mut normalized = map.get(&lowered).copied();
    if normalized.is_none() {
        if span == "a" {
            // Kept out of the gazetteer so years ('a' = annum) are not
            // swallowed as modifiers.
            normalized = Some("=");
        } else if (span == "-" || span == "+") && is_prefixed {
            normalized = Some(if span == "-" { "-" } else { "+" });
        } else {
            normalized = map.get(&lowered.replace(' ', "")).copied();
        }
    }

    Some(Modifier {
        text: span.to_string(),
        normalized: normalized.map(str::to_string),
    })
}

static PREFIXED_AUTOMATON: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .match_kind(MatchKind::LeftmostLongest)
        .ascii_case_insensitive(true)
        .build(PREFIXED_MODIFIER_SURFACES.iter())
        .expect("prefixed modifier gazetteer builds")
});

static SUFFIXED_AUTOMATON: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .match_kind(MatchKind::LeftmostLongest)
        .ascii_case_insensitive(true)
        .build(SUFFIXED_MODIFIER_SURFACES.iter())
        .expect("suffixed modifier gazetteer builds")
});

fn merge_adjacent(mut spans: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    spans.sort();
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (start, end) in spans {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 + 1 {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }
    merged
}

fn gap(a: (usize, usize), b: (usize, usize)) -> usize {
    if a.1 <= b.0 {
        b.0 - a.1
    } else if b.1 <= a.0 {
        a.0 - b.1
    } else {
        0
    }
}

/// Widen externally tagged quantity spans to include adjacent modifier
/// phrases. A modifier is accepted when it lies inside the span or within
/// a two-character gap of it.
pub fn widen_quantity_spans(text: &str, spans: &[(usize, usize)]) -> Vec<(usize, usize)> {
    spans
        .iter()
        .map(|&(start, end)| {
            let mut candidates: Vec<(usize, usize)> = Vec::new();
            for m in PREFIXED_AUTOMATON.find_iter(&text[..start]) {
                candidates.push((m.start(), m.end()));
            }
            for m in SUFFIXED_AUTOMATON.find_iter(&text[end..]) {
                candidates.push((end + m.start(), end + m.end()));
            }

            let mut widened = (start, end);
            for candidate in merge_adjacent(candidates) {
                if gap(candidate, (start, end)) < 2 {
                    widened.0 = widened.0.min(candidate.0);
                    widened.1 = widened.1.max(candidate.1);
                }
            }
            widened
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surfaces_normalize_to_operators() {
        assert_eq!(normalize_modifier("about", true).unwrap().normalized.as_deref(), Some("~"));
        assert_eq!(
            normalize_modifier("at least", true).unwrap().normalized.as_deref(),
            Some("≥")
        );
        assert_eq!(
            normalize_modifier("or more", false).unwrap().normalized.as_deref(),
            Some("≥")
        );
        assert_eq!(normalize_modifier("a", true).unwrap().normalized.as_deref(), Some("="));
        assert_eq!(normalize_modifier("-", true).unwrap().normalized.as_deref(), Some("-"));
        assert_eq!(normalize_modifier("", true), None);
    }

    #[test]
    fn unknown_surfaces_keep_text() {
        let m = normalize_modifier("allegedly", true).unwrap();
        assert_eq!(m.text, "allegedly");
        assert_eq!(m.normalized, None);
    }

    #[test]
    fn span_widening_picks_up_adjacent_modifiers() {
        let text = "the process takes about 25 s at most in theory";
        let quantity = (24, 28); // "25 s"
        let widened = widen_quantity_spans(text, &[quantity]);
        let (start, end) = widened[0];
        assert!(text[start..end].starts_with("about"), "{}", &text[start..end]);
        assert!(text[start..end].ends_with("at most"), "{}", &text[start..end]);
    }

    #[test]
    fn distant_modifiers_are_ignored() {
        let text = "about the figure, we measured 25 s";
        let widened = widen_quantity_spans(text, &[(30, 34)]);
        assert_eq!(widened[0], (30, 34));
    }
}
