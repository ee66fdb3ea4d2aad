
use serde::Serialize;
use std::cmp::Ordering;

use crate::data_types::border_distance::BorderDistance;
use crate::data_types::decision::FailedReason;
use crate::data_types::interval::Interval;
use crate::data_types::match_set::MatchSet;

/// Stable index of a variant inside a benchmark arena
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct VariantId(pub usize);

/// One candidate match attached to a record.
/// Pairwise annotations exist on both records with the same `tag`, so either side can find and detach the other.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlapAnnotation {
    /// Tie-break identifier shared by both sides of a pair ("who")
    tag: u64,
    /// The other record, absent for annotations that only describe this record
    counterpart: Option<VariantId>,
    /// Flags achieved by the pair ("what")
    match_set: MatchSet,
    /// Shared bases of the two spans, for types with overlap windows ("wow")
    overlap_window: Option<Interval>,
    /// Breakpoint distance score ("where")
    border_distance: Option<BorderDistance>,
    /// Bin of the counterpart ("win")
    counterpart_bin: Option<u64>,
    /// Why a better classification was not reached ("why")
    reason: FailedReason
}

impl OverlapAnnotation {
    /// Constructor for a pairwise annotation
    pub fn new(
        tag: u64, counterpart: Option<VariantId>, match_set: MatchSet, overlap_window: Option<Interval>,
        border_distance: Option<BorderDistance>, counterpart_bin: Option<u64>, reason: FailedReason
    ) -> Self {
        Self {
            tag, counterpart, match_set, overlap_window, border_distance, counterpart_bin, reason
        }
    }

    /// An annotation with no counterpart, e.g. nothing overlapped the record
    pub fn unmatched(tag: u64, reason: FailedReason) -> Self {
        Self::new(tag, None, MatchSet::UNMATCHED, None, None, None, reason)
    }

    // getters
    pub fn tag(&self) -> u64 {
        self.tag
    }

    pub fn counterpart(&self) -> Option<VariantId> {
        self.counterpart
    }

    pub fn match_set(&self) -> MatchSet {
        self.match_set
    }

    pub fn match_set_mut(&mut self) -> &mut MatchSet {
        &mut self.match_set
    }

    pub fn overlap_window(&self) -> Option<&Interval> {
        self.overlap_window.as_ref()
    }

    pub fn border_distance(&self) -> Option<&BorderDistance> {
        self.border_distance.as_ref()
    }

    pub fn counterpart_bin(&self) -> Option<u64> {
        self.counterpart_bin
    }

    pub fn reason(&self) -> FailedReason {
        self.reason
    }

    pub fn set_reason(&mut self, reason: FailedReason) {
        self.reason = reason;
    }

    /// The counterpart view of this annotation: same tag and classification, pointing back at `owner`
    pub fn mirrored(&self, owner: VariantId, owner_bin: Option<u64>) -> Self {
        Self {
            counterpart: Some(owner),
            counterpart_bin: owner_bin,
            ..self.clone()
        }
    }

    /// Ranking order, where `Ordering::Less` is the better annotation:
    /// border distance ascending (missing is worst), match quality descending, tag, then reason.
    pub fn rank_cmp(&self, other: &OverlapAnnotation) -> Ordering {
        let distance_order = match (self.border_distance.as_ref(), other.border_distance.as_ref()) {
            (Some(d1), Some(d2)) => d1.cmp(d2),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal
        };
        distance_order
            .then_with(|| other.match_set.quality_cmp(&self.match_set))
            .then(self.tag.cmp(&other.tag))
            .then(self.reason.cmp(&other.reason))
    }
}

/// Sorts annotations so the best match is first
pub fn sort_annotations(annotations: &mut [OverlapAnnotation]) {
    annotations.sort_by(|a, b| a.rank_cmp(b));
}
