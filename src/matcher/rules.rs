
use crate::config::TrTolerance;
use crate::data_types::decision::FailedReason;
use crate::data_types::interval::Interval;
use crate::data_types::match_set::{MatchFlag, MatchSet};
use crate::data_types::scored_variant::ScoredVariant;
use crate::data_types::sv_type::SvType;
use crate::matcher::sequence::{compare_sequences, SequenceOutcome};
use crate::tandem_repeat::compare_repeat_counts;

/// Classification of a single query/truth pair before genotypes are considered
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateOutcome {
    /// Flags achieved so far
    pub match_set: MatchSet,
    /// Every reason collected, in the order found
    pub reasons: Vec<FailedReason>,
    /// Shared bases of the two spans
    pub overlap_window: Option<Interval>
}

impl CandidateOutcome {
    /// The single surviving reason
    pub fn reason(&self, genotype_matters: bool) -> FailedReason {
        FailedReason::resolve(&self.reasons, genotype_matters)
    }

    /// Adds `AlleleMatch` unless a collected reason rules it out
    fn finish_allele(&mut self) {
        if !self.reasons.iter().any(|r| r.blocks_allele_match()) {
            self.match_set.insert(MatchFlag::AlleleMatch);
        }
    }
}

/// Length ratio `min / max`, 1.0 when both are zero
pub fn length_ratio(l1: u64, l2: u64) -> f64 {
    let (min, max) = (l1.min(l2), l1.max(l2));
    if max == 0 {
        1.0
    } else {
        min as f64 / max as f64
    }
}

/// Compares lengths, adding `Length`, `LengthMismatch`, or `LengthUnassessed`
fn check_length(outcome: &mut CandidateOutcome, query: &ScoredVariant, truth: &ScoredVariant, threshold: f64) {
    if threshold <= 0.0 {
        return;
    }
    match (query.length(), truth.length()) {
        (Some(l1), Some(l2)) => {
            if length_ratio(l1, l2) >= threshold {
                outcome.match_set.insert(MatchFlag::Length);
            } else {
                outcome.reasons.push(FailedReason::LengthMismatch);
            }
        },
        // translocations have no length to compare
        (None, None) if query.sv_type() == SvType::TranslocationBreakend && truth.sv_type() == SvType::TranslocationBreakend => {},
        _ => outcome.reasons.push(FailedReason::LengthUnassessed)
    }
}

/// Compares inserted sequences for same-type pairs of sequence-bearing types
fn check_sequence(outcome: &mut CandidateOutcome, query: &ScoredVariant, truth: &ScoredVariant, threshold: f64) {
    if query.sv_type() != truth.sv_type() || !query.sv_type().is_sequence_comparable() {
        return;
    }
    match compare_sequences(query.sequence(), truth.sequence(), threshold) {
        SequenceOutcome::Skipped => {},
        SequenceOutcome::Match => outcome.match_set.insert(MatchFlag::Sequence),
        SequenceOutcome::PartialMatch => outcome.match_set.insert(MatchFlag::PartialSequence),
        SequenceOutcome::Mismatch => outcome.reasons.push(FailedReason::SequenceMismatch),
        SequenceOutcome::Unassessed => outcome.reasons.push(FailedReason::SequenceUnassessed)
    }
}

/// Rule for breakends: the mate must land in the same place before anything else is compared
/// # Arguments
/// * `query` - the query breakend
/// * `truth` - the candidate truth breakend
/// * `similarity_threshold` - shared length ratio and sequence similarity threshold
pub fn breakend_rule(query: &ScoredVariant, truth: &ScoredVariant, similarity_threshold: f64) -> CandidateOutcome {
    let mut outcome = CandidateOutcome::default();
    if query.end_contig() != truth.end_contig() || !query.end_interval().overlaps(truth.end_interval()) {
        outcome.reasons.push(FailedReason::BndPartialMatch);
        return outcome;
    }
    if !query.pos_interval().overlaps(truth.pos_interval()) {
        outcome.reasons.push(FailedReason::BordersTooFarOff);
        return outcome;
    }
    outcome.match_set.insert(MatchFlag::LocalMatch);

    check_length(&mut outcome, query, truth, similarity_threshold);
    check_sequence(&mut outcome, query, truth, similarity_threshold);
    outcome.finish_allele();
    outcome
}

/// Rule for everything except breakends
/// # Arguments
/// * `query` - the query variant
/// * `truth` - the candidate truth variant
/// * `similarity_threshold` - shared length ratio and sequence similarity threshold
/// * `cross_type_enabled` - copy numbers are only compared when this is off
/// * `tr_tolerance` - repeat count tolerance for tandem repeat pairs
pub fn simple_rule(query: &ScoredVariant, truth: &ScoredVariant, similarity_threshold: f64, cross_type_enabled: bool, tr_tolerance: &TrTolerance) -> CandidateOutcome {
    let mut outcome = CandidateOutcome {
        overlap_window: query.overlap_window(truth),
        ..Default::default()
    };

    check_length(&mut outcome, query, truth, similarity_threshold);
    if !query.pos_interval().overlaps(truth.pos_interval()) || !query.end_interval().overlaps(truth.end_interval()) {
        outcome.reasons.push(FailedReason::BordersTooFarOff);
        return outcome;
    }
    outcome.match_set.insert(MatchFlag::LocalMatch);

    if query.sv_type() == SvType::TandemRepeat && truth.sv_type() == SvType::TandemRepeat {
        if let Err(reason) = compare_repeat_counts(query, truth, tr_tolerance) {
            outcome.reasons.push(reason);
        }
    }

    check_sequence(&mut outcome, query, truth, similarity_threshold);

    if query.sv_type().is_copy_number() && truth.sv_type().is_copy_number() && !cross_type_enabled {
        let (q_cn, t_cn) = (query.sample().copy_number(), truth.sample().copy_number());
        if q_cn.is_some() && t_cn.is_some() && q_cn != t_cn {
            outcome.reasons.push(FailedReason::CnMismatch);
        }
    }

    outcome.finish_allele();
    outcome
}

/// Picks the rule for the pair
pub fn classify_pair(query: &ScoredVariant, truth: &ScoredVariant, similarity_threshold: f64, cross_type_enabled: bool, tr_tolerance: &TrTolerance) -> CandidateOutcome {
    if query.sv_type().is_breakend() && truth.sv_type().is_breakend() {
        breakend_rule(query, truth, similarity_threshold)
    } else {
        simple_rule(query, truth, similarity_threshold, cross_type_enabled, tr_tolerance)
    }
}
