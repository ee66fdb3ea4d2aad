
use log::trace;

use crate::data_types::scored_variant::AlleleSequence;
use crate::util::sequence_alignment::bounded_edit_distance;

/// Longest sequence we are willing to align; longer pairs are reported as unassessed
pub const MAX_SEQUENCE_LENGTH: usize = 50_000;
/// How far below the threshold a pair can land and still get the rotation retry
pub const UNROLL_MARGIN: f64 = 0.1;
/// Largest repeat period that counts as low-complexity for the rotation retry
pub const MAX_UNROLL_PERIOD: usize = 6;

/// Result of comparing two allele sequences
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SequenceOutcome {
    /// Nothing to compare, e.g. both alleles are symbolic
    Skipped,
    /// Full sequences are similar
    Match,
    /// Every available flank is similar
    PartialMatch,
    /// Sequences differ
    Mismatch,
    /// Bases were missing on one side or the pair was too long to align
    Unassessed
}

/// Maximum number of edits allowed for `max_len` bases to stay at or above `similarity`
fn edit_budget(similarity: f64, max_len: usize) -> usize {
    let allowed = (1.0 - similarity.clamp(0.0, 1.0)) * max_len as f64;
    // tolerate rounding noise like (1.0 - 0.9) * 10.0 = 0.99999...
    (allowed + 1e-9).floor() as usize
}

/// Smallest period (up to `MAX_UNROLL_PERIOD`) that generates the sequence, if any
fn short_period(sequence: &[u8]) -> Option<usize> {
    (1..=MAX_UNROLL_PERIOD.min(sequence.len()))
        .find(|&p| (p..sequence.len()).all(|i| sequence[i] == sequence[i-p]))
}

/// Compares two full sequences.
/// Pairs that miss the threshold but land within `UNROLL_MARGIN` are retried against every rotation of
/// the low-complexity side, since a repeat insertion can be reported at any phase of the repeat.
/// # Arguments
/// * `v1` - first sequence
/// * `v2` - second sequence
/// * `threshold` - minimum similarity, `1 - edit_distance / max_len`
pub fn compare_literal(v1: &[u8], v2: &[u8], threshold: f64) -> SequenceOutcome {
    let max_len = v1.len().max(v2.len());
    if max_len == 0 {
        return SequenceOutcome::Match;
    }
    if max_len > MAX_SEQUENCE_LENGTH {
        return SequenceOutcome::Unassessed;
    }

    let budget = edit_budget(threshold, max_len);
    let retry_budget = edit_budget(threshold - UNROLL_MARGIN, max_len);
    let edit_distance = match bounded_edit_distance(v1, v2, retry_budget) {
        Ok(ed) => ed,
        Err(_e) => return SequenceOutcome::Mismatch
    };
    if edit_distance <= budget {
        return SequenceOutcome::Match;
    }

    // near miss, try to unroll whichever side is a short repeat
    let (rotated, fixed, period) = if let Some(p) = short_period(v2) {
        (v2, v1, p)
    } else if let Some(p) = short_period(v1) {
        (v1, v2, p)
    } else {
        return SequenceOutcome::Mismatch;
    };

    for shift in 1..period.min(rotated.len()) {
        let rotation: Vec<u8> = rotated[shift..].iter()
            .chain(rotated[..shift].iter())
            .copied()
            .collect();
        if bounded_edit_distance(fixed, &rotation, budget).is_ok() {
            trace!("Sequence match after unrolling by {shift}");
            return SequenceOutcome::Match;
        }
    }
    SequenceOutcome::Mismatch
}

/// Compares the available flanks of a partial insertion against another allele.
/// Left flanks are compared to prefixes and right flanks to suffixes.
fn compare_flanks(left: Option<&[u8]>, right: Option<&[u8]>, other_left: &[u8], other_right: &[u8], threshold: f64) -> SequenceOutcome {
    let mut compared = false;
    for (flank, other, from_left) in [(left, other_left, true), (right, other_right, false)] {
        let Some(flank) = flank else {
            continue;
        };
        let shared = flank.len().min(other.len());
        if shared == 0 {
            continue;
        }
        let (a, b) = if from_left {
            (&flank[..shared], &other[..shared])
        } else {
            (&flank[flank.len()-shared..], &other[other.len()-shared..])
        };
        compared = true;
        if compare_literal(a, b, threshold) != SequenceOutcome::Match {
            return SequenceOutcome::Mismatch;
        }
    }

    if compared {
        SequenceOutcome::PartialMatch
    } else {
        SequenceOutcome::Unassessed
    }
}

/// Compares what is known about two alleles' bases
/// # Arguments
/// * `s1` - first allele
/// * `s2` - second allele
/// * `threshold` - minimum similarity; 0.0 or lower disables the comparison
pub fn compare_sequences(s1: &AlleleSequence, s2: &AlleleSequence, threshold: f64) -> SequenceOutcome {
    if threshold <= 0.0 {
        return SequenceOutcome::Skipped;
    }

    use AlleleSequence::*;
    match (s1, s2) {
        (Symbolic, Symbolic) => SequenceOutcome::Skipped,
        (Symbolic, _) | (_, Symbolic) => SequenceOutcome::Unassessed,
        (Literal(v1), Literal(v2)) => compare_literal(v1, v2, threshold),
        (Partial { left, right }, Literal(full)) |
        (Literal(full), Partial { left, right }) => {
            compare_flanks(left.as_deref(), right.as_deref(), full, full, threshold)
        },
        (Partial { left: l1, right: r1 }, Partial { left: l2, right: r2 }) => {
            let left = l1.as_deref().zip(l2.as_deref());
            let right = r1.as_deref().zip(r2.as_deref());
            match (left, right) {
                (None, None) => SequenceOutcome::Unassessed,
                _ => compare_flanks(
                    left.map(|(a, _)| a), right.map(|(a, _)| a),
                    left.map(|(_, b)| b).unwrap_or_default(), right.map(|(_, b)| b).unwrap_or_default(),
                    threshold
                )
            }
        }
    }
}
