
use serde::Serialize;
use std::cmp::Ordering;

use crate::data_types::interval::Interval;

/// Distances between the confidence-interval bounds of two variants' breakpoints.
/// Each value is the absolute difference of one bound, so the score is symmetric.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct BorderDistance {
    /// Distance between the lower bounds of the position intervals
    pub pos_left: u64,
    /// Distance between the upper bounds of the position intervals
    pub pos_right: u64,
    /// Distance between the lower bounds of the end intervals
    pub end_left: u64,
    /// Distance between the upper bounds of the end intervals
    pub end_right: u64
}

impl BorderDistance {
    /// Constructor
    pub fn new(pos_left: u64, pos_right: u64, end_left: u64, end_right: u64) -> Self {
        Self { pos_left, pos_right, end_left, end_right }
    }

    /// Computes the distances from the unexpanded (CI-only) breakpoint intervals of two variants.
    /// # Arguments
    /// * `pos_a`, `end_a` - position and end intervals of the first variant
    /// * `pos_b`, `end_b` - position and end intervals of the second variant
    /// * `same_end_contig` - if false, the ends cannot be compared and are scored as maximally distant
    pub fn between(pos_a: &Interval, end_a: &Interval, pos_b: &Interval, end_b: &Interval, same_end_contig: bool) -> Self {
        let (end_left, end_right) = if same_end_contig {
            (end_a.start().abs_diff(end_b.start()), end_a.stop().abs_diff(end_b.stop()))
        } else {
            (u64::MAX, u64::MAX)
        };
        Self {
            pos_left: pos_a.start().abs_diff(pos_b.start()),
            pos_right: pos_a.stop().abs_diff(pos_b.stop()),
            end_left,
            end_right
        }
    }

    /// Sum of all four distances, saturating
    pub fn total(&self) -> u64 {
        self.pos_left
            .saturating_add(self.pos_right)
            .saturating_add(self.end_left)
            .saturating_add(self.end_right)
    }

    /// Largest single distance
    pub fn max_distance(&self) -> u64 {
        self.pos_left.max(self.pos_right).max(self.end_left).max(self.end_right)
    }

    fn as_tuple(&self) -> (u64, u64, u64, u64) {
        (self.pos_left, self.pos_right, self.end_left, self.end_right)
    }
}

impl Ord for BorderDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total().cmp(&other.total())
            .then(self.max_distance().cmp(&other.max_distance()))
            .then(self.as_tuple().cmp(&other.as_tuple()))
    }
}

impl PartialOrd for BorderDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for BorderDistance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.pos_left, self.pos_right, self.end_left, self.end_right)
    }
}
