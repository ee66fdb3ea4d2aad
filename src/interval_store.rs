/*!
# Merged interval store
A canonical, sorted set of non-overlapping intervals.
Inserting merges with everything the new interval touches, and subtraction is a pure function that never mutates a store.
This is what turns overlapping variant spans and overlap windows into base counts.

```
use svbench::data_types::interval::Interval;
use svbench::interval_store::{MergedIntervalStore, subtract};

let mut store = MergedIntervalStore::default();
store.insert(Interval::half_open(10, 20));
store.insert(Interval::half_open(20, 25));
assert_eq!(store.len(), 1);
assert_eq!(store.total_length(), 15);

let leftover = subtract(&Interval::half_open(10, 15), &[Interval::point(13)]);
assert_eq!(leftover, vec![Interval::closed(10, 12), Interval::closed(14, 14)]);
```
*/

use std::collections::BTreeMap;

use crate::data_types::interval::Interval;

/// Sort key for a lower bound; inclusive starts sort before exclusive ones at the same position
type LowerKey = (u64, bool);

fn lower_key(interval: &Interval) -> LowerKey {
    (interval.start(), !interval.start_inclusive())
}

/// Minimal set of non-overlapping intervals, kept sorted by lower bound.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MergedIntervalStore {
    /// Lower bound key -> stored interval
    intervals: BTreeMap<LowerKey, Interval>
}

impl MergedIntervalStore {
    /// Adds an interval, merging it with every stored interval it touches or overlaps.
    /// Intervals that cover no integer position are ignored.
    /// # Arguments
    /// * `interval` - the interval to add
    pub fn insert(&mut self, interval: Interval) {
        if interval.is_empty() {
            return;
        }

        // everything that can touch starts at or before our stop
        let mut merged = interval;
        let mut absorbed: Vec<LowerKey> = vec![];
        for (&key, stored) in self.intervals.range(..=(interval.stop(), true)).rev() {
            if stored.touches(&merged) {
                merged = merged.hull(stored);
                absorbed.push(key);
            } else if stored.stop() < merged.start() {
                // stored stops are ascending, nothing earlier can reach us
                break;
            }
        }

        for key in absorbed.iter() {
            self.intervals.remove(key);
        }
        self.intervals.insert(lower_key(&merged), merged);
    }

    /// Returns every stored interval that shares an integer position with `interval`, in ascending order.
    /// # Arguments
    /// * `interval` - the query interval
    pub fn search(&self, interval: &Interval) -> Vec<Interval> {
        let Some((first, _last)) = interval.integer_bounds() else {
            return vec![];
        };

        let mut ret: Vec<Interval> = vec![];
        for stored in self.intervals.range(..=(interval.stop(), true)).rev().map(|(_k, v)| v) {
            match stored.integer_bounds() {
                Some((_f, l)) if l < first => break,
                _ => {}
            }
            if stored.overlaps(interval) {
                ret.push(*stored);
            }
        }
        ret.reverse();
        ret
    }

    /// Sum of the lengths of all stored intervals
    pub fn total_length(&self) -> u64 {
        self.intervals.values().map(|i| i.len()).sum()
    }

    /// Iterates over the stored intervals in ascending order
    pub fn iter(&self) -> impl Iterator<Item=&Interval> {
        self.intervals.values()
    }

    /// Number of stored (merged) intervals
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Returns true if a single stored interval covers every integer position of `interval`.
    /// Because stored intervals are merged, abutting inputs count as one.
    pub fn contains(&self, interval: &Interval) -> bool {
        self.search(interval).iter()
            .any(|stored| stored.contains(interval))
    }
}

/// Removes every cutting interval from `target` and returns the leftover fragments in ascending order.
/// Fragments are reported as closed intervals and never cover zero positions, so a shared endpoint is never counted twice.
/// # Arguments
/// * `target` - the interval to cut up
/// * `cuts` - the intervals to remove, in any order
pub fn subtract(target: &Interval, cuts: &[Interval]) -> Vec<Interval> {
    let Some((first, last)) = target.integer_bounds() else {
        return vec![];
    };

    let mut cut_bounds: Vec<(u64, u64)> = cuts.iter()
        .filter_map(|c| c.integer_bounds())
        .filter(|&(cf, cl)| cf <= last && first <= cl)
        .collect();
    cut_bounds.sort_unstable();

    let mut fragments = vec![];
    let mut cursor = first;
    for (cut_first, cut_last) in cut_bounds.into_iter() {
        if cut_last < cursor {
            continue;
        }
        if cut_first > cursor {
            fragments.push(Interval::closed(cursor, cut_first - 1));
        }
        match cut_last.checked_add(1) {
            Some(next) => cursor = next,
            None => return fragments
        };
        if cursor > last {
            return fragments;
        }
    }
    fragments.push(Interval::closed(cursor, last));
    fragments
}

/// Total number of integer positions across a set of fragments
pub fn total_length(intervals: &[Interval]) -> u64 {
    intervals.iter().map(|i| i.len()).sum()
}

/// Collection of merged stores keyed by contig
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GenomeIntervalStore {
    contigs: BTreeMap<String, MergedIntervalStore>
}

impl GenomeIntervalStore {
    /// Adds an interval to the store for `contig`
    pub fn insert(&mut self, contig: &str, interval: Interval) {
        if interval.is_empty() {
            return;
        }
        match self.contigs.get_mut(contig) {
            Some(store) => store.insert(interval),
            None => {
                let mut store = MergedIntervalStore::default();
                store.insert(interval);
                self.contigs.insert(contig.to_string(), store);
            }
        }
    }

    /// Returns the store for a single contig, if anything was added there
    pub fn contig_store(&self, contig: &str) -> Option<&MergedIntervalStore> {
        self.contigs.get(contig)
    }

    /// Sum of lengths across all contigs
    pub fn total_length(&self) -> u64 {
        self.contigs.values().map(|s| s.total_length()).sum()
    }

    /// Number of positions in this store that are not covered by `covered`, computed contig by contig via subtraction.
    /// # Arguments
    /// * `covered` - the intervals to remove, typically the true positive windows
    pub fn uncovered_length(&self, covered: &GenomeIntervalStore) -> u64 {
        self.contigs.iter()
            .map(|(contig, store)| {
                let cover_store = covered.contig_store(contig);
                store.iter()
                    .map(|interval| {
                        let cuts = cover_store.map(|cs| cs.search(interval)).unwrap_or_default();
                        total_length(&subtract(interval, &cuts))
                    })
                    .sum::<u64>()
            })
            .sum()
    }
}
