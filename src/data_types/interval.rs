
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An interval on a contig axis where each side can independently be inclusive or exclusive.
/// Lengths and overlaps are measured in the integer positions covered, so `[10,13)` and `[10,12]` both have length 3.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Interval {
    /// Lower bound
    start: u64,
    /// If true, `start` is part of the interval
    start_inclusive: bool,
    /// Upper bound
    stop: u64,
    /// If true, `stop` is part of the interval
    stop_inclusive: bool
}

impl Interval {
    /// General constructor
    pub fn new(start: u64, start_inclusive: bool, stop: u64, stop_inclusive: bool) -> Self {
        Self { start, start_inclusive, stop, stop_inclusive }
    }

    /// Constructs the 0-based half-open interval `[start, stop)`
    pub fn half_open(start: u64, stop: u64) -> Self {
        Self::new(start, true, stop, false)
    }

    /// Constructs the closed interval `[start, stop]`
    pub fn closed(start: u64, stop: u64) -> Self {
        Self::new(start, true, stop, true)
    }

    /// Constructs the single point interval `[position, position]`
    pub fn point(position: u64) -> Self {
        Self::closed(position, position)
    }

    // getters
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn start_inclusive(&self) -> bool {
        self.start_inclusive
    }

    pub fn stop(&self) -> u64 {
        self.stop
    }

    pub fn stop_inclusive(&self) -> bool {
        self.stop_inclusive
    }

    /// Returns the first and last integer positions covered, or None if no integer is covered.
    pub fn integer_bounds(&self) -> Option<(u64, u64)> {
        let first = if self.start_inclusive { Some(self.start) } else { self.start.checked_add(1) }?;
        let last = if self.stop_inclusive { Some(self.stop) } else { self.stop.checked_sub(1) }?;
        (first <= last).then_some((first, last))
    }

    /// True if no integer position is covered
    pub fn is_empty(&self) -> bool {
        self.integer_bounds().is_none()
    }

    /// Number of integer positions covered
    pub fn len(&self) -> u64 {
        self.integer_bounds()
            .map(|(first, last)| last - first + 1)
            .unwrap_or(0)
    }

    /// Returns true if the two intervals share at least one integer position.
    pub fn overlaps(&self, other: &Interval) -> bool {
        match (self.integer_bounds(), other.integer_bounds()) {
            (Some((f1, l1)), Some((f2, l2))) => f1 <= l2 && f2 <= l1,
            _ => false
        }
    }

    /// Returns true if the union of the two intervals is connected on the real line.
    /// This is the merge criteria, so `[10,13)` touches `[13,15)` but `[10,13)` does not touch `(13,15)`.
    pub fn touches(&self, other: &Interval) -> bool {
        let (low, high) = if self.lower_cmp(other) != Ordering::Greater { (self, other) } else { (other, self) };
        match high.start.cmp(&low.stop) {
            Ordering::Less => true,
            Ordering::Equal => high.start_inclusive || low.stop_inclusive,
            Ordering::Greater => false
        }
    }

    /// Returns true if every integer position in `other` is also in `self`.
    /// Empty intervals are not contained by anything.
    pub fn contains(&self, other: &Interval) -> bool {
        match (self.integer_bounds(), other.integer_bounds()) {
            (Some((f1, l1)), Some((f2, l2))) => f1 <= f2 && l2 <= l1,
            _ => false
        }
    }

    /// Returns the shared region of the two intervals if it covers at least one integer position.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let (start, start_inclusive) = match self.lower_cmp(other) {
            Ordering::Less => (other.start, other.start_inclusive),
            _ => (self.start, self.start_inclusive)
        };
        let (stop, stop_inclusive) = match self.upper_cmp(other) {
            Ordering::Greater => (other.stop, other.stop_inclusive),
            _ => (self.stop, self.stop_inclusive)
        };
        let shared = Interval::new(start, start_inclusive, stop, stop_inclusive);
        (!shared.is_empty()).then_some(shared)
    }

    /// Smallest interval covering both inputs; an inclusive bound wins over an exclusive one at equal positions.
    pub fn hull(&self, other: &Interval) -> Interval {
        let (start, start_inclusive) = match self.lower_cmp(other) {
            Ordering::Greater => (other.start, other.start_inclusive),
            _ => (self.start, self.start_inclusive)
        };
        let (stop, stop_inclusive) = match self.upper_cmp(other) {
            Ordering::Less => (other.stop, other.stop_inclusive),
            _ => (self.stop, self.stop_inclusive)
        };
        Interval::new(start, start_inclusive, stop, stop_inclusive)
    }

    /// Grows the interval by `amount` on both sides, saturating at 0 and u64::MAX.
    pub fn expand(&self, amount: u64) -> Interval {
        Interval::new(
            self.start.saturating_sub(amount), self.start_inclusive,
            self.stop.saturating_add(amount), self.stop_inclusive
        )
    }

    /// Orders lower bounds; an inclusive start is lower than an exclusive start at the same position.
    pub fn lower_cmp(&self, other: &Interval) -> Ordering {
        self.start.cmp(&other.start)
            .then(other.start_inclusive.cmp(&self.start_inclusive))
    }

    /// Orders upper bounds; an inclusive stop is higher than an exclusive stop at the same position.
    pub fn upper_cmp(&self, other: &Interval) -> Ordering {
        self.stop.cmp(&other.stop)
            .then(self.stop_inclusive.cmp(&other.stop_inclusive))
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{},{}{}",
            if self.start_inclusive { '[' } else { '(' },
            self.start, self.stop,
            if self.stop_inclusive { ']' } else { ')' }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len() {
        assert_eq!(Interval::half_open(10, 13).len(), 3);
        assert_eq!(Interval::closed(10, 12).len(), 3);
        assert_eq!(Interval::new(10, false, 13, false).len(), 2);
        assert_eq!(Interval::half_open(10, 10).len(), 0);
        assert_eq!(Interval::point(13).len(), 1);
        assert!(Interval::new(10, false, 11, false).is_empty());
        assert!(Interval::half_open(0, 0).is_empty());
    }

    #[test]
    fn test_overlaps() {
        let a = Interval::half_open(10, 15);
        assert!(a.overlaps(&Interval::closed(14, 20)));
        assert!(!a.overlaps(&Interval::closed(15, 20)));
        assert!(a.overlaps(&Interval::point(10)));
        assert!(!a.overlaps(&Interval::half_open(12, 12)));
    }

    #[test]
    fn test_touches() {
        let a = Interval::half_open(10, 13);
        assert!(a.touches(&Interval::half_open(13, 15)));
        assert!(Interval::half_open(13, 15).touches(&a));
        assert!(!a.touches(&Interval::new(13, false, 15, false)));
        assert!(Interval::closed(10, 13).touches(&Interval::new(13, false, 15, false)));
        assert!(!a.touches(&Interval::half_open(14, 15)));
        assert!(a.touches(&Interval::closed(11, 12)));
    }

    #[test]
    fn test_intersect_and_hull() {
        let a = Interval::half_open(10, 15);
        let b = Interval::closed(12, 20);
        assert_eq!(a.intersect(&b), Some(Interval::half_open(12, 15)));
        assert_eq!(a.hull(&b), Interval::closed(10, 20));
        assert_eq!(a.intersect(&Interval::closed(15, 20)), None);

        // inclusive wins for the hull at equal positions
        let c = Interval::new(10, false, 15, true);
        assert_eq!(a.hull(&c), Interval::closed(10, 15));
        assert_eq!(a.intersect(&c), Some(Interval::new(10, false, 15, false)));
    }

    #[test]
    fn test_contains_and_expand() {
        let a = Interval::half_open(10, 15);
        assert!(a.contains(&Interval::closed(10, 14)));
        assert!(!a.contains(&Interval::closed(10, 15)));
        assert_eq!(Interval::closed(5, 10).expand(10), Interval::closed(0, 20));
        assert_eq!(format!("{a}"), "[10,15)");
    }
}
