//! Ambiguity cascade: when several role assignments survive, a sequence
//! of heuristics removes common false positives until one interpretation
//! remains.

use rust_decimal::Decimal;
use tracing::debug;

use crate::quantity::{Candidate, SLOT_SUFFIXED_UNIT, SLOT_VALUE};
use crate::types::{SeparatorKind, StructureKind};
use crate::value::{is_small_int, str2num};

/// Drop duplicate candidates, then prefer (in order) fully segmented
/// candidates with a known superstructure, fully segmented ones, and ones
/// with a known superstructure.
pub(crate) fn dedupe_and_prioritize(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut unique: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if !unique.iter().any(|c| c.same_interpretation(&candidate)) {
            unique.push(candidate);
        }
    }

    let segmented: Vec<&Candidate> = unique.iter().filter(|c| c.fully_segmented()).collect();
    let segmented_known: Vec<&Candidate> = segmented
        .iter()
        .copied()
        .filter(|c| c.kind != StructureKind::Unknown)
        .collect();
    let known: Vec<&Candidate> = unique
        .iter()
        .filter(|c| !c.fully_segmented() && c.kind != StructureKind::Unknown)
        .collect();

    if !segmented_known.is_empty() {
        segmented_known.into_iter().cloned().collect()
    } else if !segmented.is_empty() {
        segmented.into_iter().cloned().collect()
    } else if !known.is_empty() {
        known.into_iter().cloned().collect()
    } else {
        unique
    }
}

/// A range whose first quantity carries a suffixed unit while the last is
/// a bare small integer is no range: `472 cm - 1` ends in an exponent.
pub(crate) fn drop_false_positive_ranges(candidates: &mut Vec<Candidate>) {
    let Some(idx) = candidates.iter().position(|c| c.kind == StructureKind::Range) else {
        return;
    };
    let candidate = &candidates[idx];
    if !candidate.fully_segmented() {
        return;
    }
    let first = candidate.segmented.first().and_then(|s| s.as_ref());
    let last = candidate.segmented.last().and_then(|s| s.as_ref());
    let (Some(first), Some(last)) = (first, last) else {
        return;
    };
    if first.slots[SLOT_SUFFIXED_UNIT].is_some() && last.slots[SLOT_SUFFIXED_UNIT].is_none() {
        let last_value = last.slots[SLOT_VALUE].as_deref().and_then(str2num);
        if last_value.is_some_and(|v| is_small_int(v, 10)) {
            debug!("dropping range candidate ending in a bare small integer");
            candidates.remove(idx);
        }
    }
}

/// When a single-quantity reading competes with a range whose separator
/// is a dash, the range wins: `10,000 - 240,000` is not a subtraction.
pub(crate) fn drop_false_positive_single_quantities(candidates: &mut Vec<Candidate>) {
    let Some(range_idx) = candidates.iter().position(|c| c.kind == StructureKind::Range) else {
        return;
    };
    let Some(single_idx) = candidates
        .iter()
        .position(|c| c.kind == StructureKind::SingleQuantity)
    else {
        return;
    };
    let dashed = candidates[range_idx].separators.iter().any(|sep| {
        sep.kind == SeparatorKind::RangeSeparator
            && matches!(sep.text.trim(), "-" | "--" | "---")
    });
    if dashed {
        candidates.remove(single_idx);
    }
}

/// If one fully segmented candidate exists, unsegmentable ones lose.
pub(crate) fn drop_unsegmented(candidates: &mut Vec<Candidate>) {
    if candidates.iter().any(|c| c.fully_segmented()) {
        candidates.retain(|c| c.fully_segmented());
    }
}

/// Ranges run small to large; a reversed range loses against a
/// single-quantity reading and a proper range wins over one.
pub(crate) fn drop_reverse_ranges(candidates: &mut Vec<Candidate>) {
    let Some(range_idx) = candidates.iter().position(|c| c.kind == StructureKind::Range) else {
        return;
    };
    let bounds: Option<(Decimal, Decimal)> = {
        let candidate = &candidates[range_idx];
        let value_of = |seg: Option<&Option<crate::quantity::Segmented>>| {
            seg.and_then(|s| s.as_ref())
                .and_then(|s| s.slots[SLOT_VALUE].as_deref())
                .and_then(str2num)
        };
        let first = value_of(candidate.segmented.first());
        let last = value_of(candidate.segmented.last());
        match (first, last) {
            (Some(f), Some(l)) => Some((f, l)),
            _ => None,
        }
    };
    let Some((first, last)) = bounds else { return };
    if first > last {
        candidates.remove(range_idx);
    } else if let Some(single_idx) = candidates
        .iter()
        .position(|c| c.kind == StructureKind::SingleQuantity)
    {
        candidates.remove(single_idx);
    }
}

/// A multidimensional reading with exactly three dimensions wins; a
/// two-dimensional one clashes with scientific notation.
pub(crate) fn prefer_spatial_multidim(candidates: &mut Vec<Candidate>) {
    if !candidates.iter().any(|c| c.kind == StructureKind::Multidim) {
        return;
    }
    let spatial: Vec<Candidate> = candidates
        .iter()
        .filter(|c| c.kind == StructureKind::Multidim && c.quantities.len() == 3)
        .cloned()
        .collect();
    if !spatial.is_empty() {
        *candidates = spatial;
    }
}

/// Last resort: the interpretation with the fewest quantities.
pub(crate) fn take_simplest(candidates: &mut Vec<Candidate>, text: &str) {
    if candidates.len() > 1 {
        debug!(text, options = candidates.len(), "ambiguous quantity span");
    }
    if let Some(min) = candidates.iter().map(|c| c.quantities.len()).min() {
        let idx = candidates
            .iter()
            .position(|c| c.quantities.len() == min)
            .unwrap();
        let chosen = candidates.swap_remove(idx);
        *candidates = vec![chosen];
    }
}

/// Apply the full cascade until one candidate remains.
pub(crate) fn filter_ambiguous_candidates(mut candidates: Vec<Candidate>, text: &str) -> Vec<Candidate> {
    candidates = dedupe_and_prioritize(candidates);
    if candidates.len() > 1 {
        drop_false_positive_ranges(&mut candidates);
    }
    if candidates.len() > 1 {
        drop_false_positive_single_quantities(&mut candidates);
    }
    if candidates.len() > 1 {
        drop_unsegmented(&mut candidates);
    }
    if candidates.len() > 1 {
        drop_reverse_ranges(&mut candidates);
    }
    if candidates.len() > 1 {
        prefer_spatial_multidim(&mut candidates);
    }
    if candidates.len() > 1 {
        take_simplest(&mut candidates, text);
    }
    candidates
}
