
/*!
Tandem repeat comparisons.

Repeat-to-repeat pairs are compared on their repeat unit counts.
Repeat queries can also be matched against truth deletions and insertions at the same locus by
reconstructing the repeat length each haplotype would have after applying those truth edits.
*/

use indexmap::IndexMap;
use itertools::Itertools;
use log::trace;

use crate::config::TrTolerance;
use crate::data_types::annotation::VariantId;
use crate::data_types::decision::FailedReason;
use crate::data_types::sample::{Allele, Genotype};
use crate::data_types::scored_variant::ScoredVariant;

/// Compares the repeat unit counts of two tandem repeat records.
/// Counts come from the genotypes when both records have one, otherwise from the ALT count lists.
/// Query counts are rescaled to the truth's unit length when the unit lengths differ.
/// # Arguments
/// * `query` - the query repeat
/// * `truth` - the truth repeat
/// * `tolerance` - allowed count difference
/// # Errors
/// * `RucNotFoundOrInvalid` if counts are missing or invalid
/// * `RucAlleleCountDiff` if the records describe a different number of alleles
/// * `RucMismatch` if any paired count is outside the tolerance
pub fn compare_repeat_counts(query: &ScoredVariant, truth: &ScoredVariant, tolerance: &TrTolerance) -> Result<(), FailedReason> {
    let (Some(query_repeat), Some(truth_repeat)) = (query.repeat(), truth.repeat()) else {
        return Err(FailedReason::RucNotFoundOrInvalid);
    };

    let query_gt = query.sample().genotype();
    let truth_gt = truth.sample().genotype();
    let (query_counts, truth_counts) = if query_gt.is_some() && truth_gt.is_some() {
        (query_repeat.haplotype_counts(query_gt), truth_repeat.haplotype_counts(truth_gt))
    } else {
        (query_repeat.valid_allele_counts(), truth_repeat.valid_allele_counts())
    };
    let (Some(mut query_counts), Some(mut truth_counts)) = (query_counts, truth_counts) else {
        return Err(FailedReason::RucNotFoundOrInvalid);
    };

    if query_counts.len() != truth_counts.len() {
        return Err(FailedReason::RucAlleleCountDiff);
    }

    if let (Some(qul), Some(tul)) = (query_repeat.unit_length(), truth_repeat.unit_length()) {
        if qul != tul {
            let scale = qul as f64 / tul as f64;
            query_counts.iter_mut().for_each(|c| *c *= scale);
        }
    }

    query_counts.sort_by(|a, b| a.total_cmp(b));
    truth_counts.sort_by(|a, b| a.total_cmp(b));
    let all_match = query_counts.iter().zip(truth_counts.iter())
        .all(|(&q, &t)| {
            if q == 0.0 {
                // a fully contracted query only matches a truth that is also effectively gone
                t.round() == 0.0
            } else {
                (q - t).abs() <= tolerance.threshold(t)
            }
        });

    if all_match {
        Ok(())
    } else {
        Err(FailedReason::RucMismatch)
    }
}

/// Length change a truth record applies to the haplotypes carrying it
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LengthDelta {
    /// Known signed change in bases; deletions are negative
    Known(i64),
    /// An insertion without a known length
    UnknownInsertion
}

/// A truth record overlapping a repeat locus
#[derive(Clone, Debug)]
pub struct PhaseFragment {
    /// The truth record
    pub id: VariantId,
    /// How it changes the locus length
    pub delta: LengthDelta,
    /// Its genotype; records without one are treated as unphased heterozygous
    pub genotype: Option<Genotype>
}

/// Successful reconstruction
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseReconstruction {
    /// Truth records that contributed, in input order
    pub truth_ids: Vec<VariantId>,
    /// True if each haplotype was compared on its own instead of pooled
    pub haplotype_resolved: bool
}

/// How fragments are grouped into phase sets
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum PhaseKey {
    /// Everything is on one haplotype
    Haploid,
    /// Explicit phase set
    PhaseSet(u64),
    /// Phased without a phase set tag
    PhasedUntagged,
    /// A run of unphased records, numbered so a break starts a new group
    Unphased(usize)
}

#[derive(Debug, Default)]
struct PhaseGroup {
    /// Number of fragments
    size: usize,
    /// Ploidy of the first member
    ploidy: usize,
    /// True if any member is an unphased heterozygous call, which leaves haplotype assignment ambiguous
    ambiguous: bool
}

/// Alleles of a fragment, with the default for records without a genotype
fn fragment_alleles(fragment: &PhaseFragment) -> Vec<Allele> {
    match fragment.genotype.as_ref() {
        Some(gt) => gt.alleles().to_vec(),
        None => vec![Allele::Alternate(1), Allele::Reference]
    }
}

/// Groups fragments into phase sets, preserving the order each set first appears
fn group_fragments(fragments: &[PhaseFragment], query_ploidy: usize) -> IndexMap<PhaseKey, PhaseGroup> {
    let mut groups: IndexMap<PhaseKey, PhaseGroup> = IndexMap::new();
    let mut unphased_run: usize = 0;
    let mut previous_unphased = false;
    let mut previous_ploidy: Option<usize> = None;

    for fragment in fragments.iter() {
        let ploidy = fragment.genotype.as_ref().map(|gt| gt.ploidy()).unwrap_or(2);
        let phased = fragment.genotype.as_ref().is_some_and(|gt| gt.is_phased());
        let heterozygous = fragment.genotype.as_ref().map(|gt| gt.is_heterozygous()).unwrap_or(true);

        let mut key = if query_ploidy == 1 || ploidy == 1 {
            PhaseKey::Haploid
        } else if phased {
            match fragment.genotype.as_ref().and_then(|gt| gt.phase_set()) {
                Some(ps) => PhaseKey::PhaseSet(ps),
                None => PhaseKey::PhasedUntagged
            }
        } else {
            PhaseKey::Unphased(unphased_run)
        };

        // a ploidy change breaks the current group
        let ploidy_break = previous_ploidy.is_some_and(|p| p != ploidy) ||
            groups.get(&key).is_some_and(|g| g.ploidy != ploidy);
        let starts_run = matches!(key, PhaseKey::Unphased(_)) && !previous_unphased;
        if ploidy_break || starts_run {
            unphased_run += 1;
            key = PhaseKey::Unphased(unphased_run);
        }
        previous_unphased = matches!(key, PhaseKey::Unphased(_));
        previous_ploidy = Some(ploidy);

        let group = groups.entry(key).or_insert_with(|| PhaseGroup { ploidy, ..Default::default() });
        group.size += 1;
        group.ambiguous |= !phased && heterozygous && key != PhaseKey::Haploid;
    }
    groups
}

/// Checks a reconstructed length against an expected repeat count
/// # Arguments
/// * `known_length` - reference length plus all known deltas
/// * `unknown_insertions` - insertions of unknown length, each at least 1 bp
/// * `expected_count` - expected repeat unit count
/// * `unit_length` - repeat unit length
/// * `tolerance` - count tolerance
fn length_in_window(known_length: i64, unknown_insertions: usize, expected_count: f64, unit_length: u64, tolerance: &TrTolerance) -> bool {
    let center = expected_count * unit_length as f64;
    let margin = tolerance.threshold(expected_count) * unit_length as f64;
    let lower_bound = (known_length + unknown_insertions as i64) as f64;
    if unknown_insertions == 0 {
        (lower_bound - center).abs() <= margin
    } else {
        // unknown insertions can only make the haplotype longer
        lower_bound <= center + margin
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct HaplotypeLength {
    known: i64,
    unknown: usize
}

impl HaplotypeLength {
    fn add(&mut self, delta: LengthDelta, copies: usize) {
        match delta {
            LengthDelta::Known(d) => self.known += d * copies as i64,
            LengthDelta::UnknownInsertion => self.unknown += copies
        }
    }
}

/// Reconstructs the repeat length of each query haplotype from overlapping truth records.
/// With a single unambiguous phase group each haplotype is compared on its own, trying both pairings
/// of truth and query haplotypes. Otherwise all lengths are pooled and compared to the total expected length.
/// Returns None if the truth records cannot explain the expected counts or none of them carry an ALT allele.
/// # Arguments
/// * `query_ploidy` - ploidy of the query genotype
/// * `expected_counts` - expected repeat unit count per query haplotype
/// * `unit_length` - repeat unit length in bases
/// * `reference_length` - length of the reference repeat in bases
/// * `fragments` - truth records overlapping the locus, in positional order
/// * `tolerance` - count tolerance
pub fn reconstruct_phases(
    query_ploidy: usize, expected_counts: &[f64], unit_length: u64, reference_length: u64,
    fragments: &[PhaseFragment], tolerance: &TrTolerance
) -> Option<PhaseReconstruction> {
    if query_ploidy == 0 || unit_length == 0 || expected_counts.len() != query_ploidy {
        return None;
    }

    let contributing: Vec<VariantId> = fragments.iter()
        .filter(|f| fragment_alleles(f).iter().any(|a| matches!(a, Allele::Alternate(_))))
        .map(|f| f.id)
        .collect();
    if contributing.is_empty() {
        return None;
    }

    let reference_length = reference_length as i64;
    let groups = group_fragments(fragments, query_ploidy);
    let single_group = groups.len() == 1 && groups.values().all(|g| !g.ambiguous && g.ploidy == query_ploidy);
    trace!("Phase groups: {:?}", groups.values().map(|g| g.size).collect::<Vec<usize>>());

    if single_group {
        let mut haplotypes = vec![HaplotypeLength { known: reference_length, unknown: 0 }; query_ploidy];
        for fragment in fragments.iter() {
            for (slot, allele) in fragment_alleles(fragment).iter().enumerate().take(query_ploidy) {
                if matches!(allele, Allele::Alternate(_)) {
                    haplotypes[slot].add(fragment.delta, 1);
                }
            }
        }

        let resolved = (0..query_ploidy).permutations(query_ploidy)
            .any(|order| {
                order.iter().zip(expected_counts.iter())
                    .all(|(&slot, &expected)| {
                        let hap = haplotypes[slot];
                        length_in_window(hap.known, hap.unknown, expected, unit_length, tolerance)
                    })
            });
        trace!("Per-haplotype reconstruction {haplotypes:?} vs {expected_counts:?}: {resolved}");
        return resolved.then_some(PhaseReconstruction { truth_ids: contributing, haplotype_resolved: true });
    }

    // pooled across haplotypes
    let mut pooled = HaplotypeLength { known: reference_length * query_ploidy as i64, unknown: 0 };
    for fragment in fragments.iter() {
        let copies = fragment_alleles(fragment).iter()
            .filter(|a| matches!(a, Allele::Alternate(_)))
            .count();
        pooled.add(fragment.delta, copies);
    }
    let expected_total: f64 = expected_counts.iter().sum();
    let matched = length_in_window(pooled.known, pooled.unknown, expected_total, unit_length, tolerance);
    trace!("Pooled reconstruction {pooled:?} vs {expected_total}: {matched}");
    matched.then_some(PhaseReconstruction { truth_ids: contributing, haplotype_resolved: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeConfig;
    use crate::data_types::decision::VariantSource;
    use crate::data_types::input_record::InputRecordBuilder;

    fn fragment(id: usize, delta: LengthDelta, gt: &str, ps: Option<u64>) -> PhaseFragment {
        PhaseFragment {
            id: VariantId(id),
            delta,
            genotype: Some(Genotype::parse(gt, ps).unwrap())
        }
    }

    fn repeat(gt: &str, counts: Vec<f64>) -> ScoredVariant {
        let record = InputRecordBuilder::default()
            .id("tr").contig("chr4").position(3074877_u64).end(3074940_u64)
            .ref_allele("C").alt_allele("<CNV:TR>")
            .repeat_unit("CAG").reference_repeat_count(21.0)
            .repeat_counts(counts)
            .genotype(gt)
            .build().unwrap();
        ScoredVariant::from_record(&record, VariantSource::Query, Some(&TypeConfig::default())).unwrap()
    }

    #[test]
    fn test_compare_repeat_counts() {
        let tolerance = TrTolerance::default();
        let query = repeat("1/2", vec![23.0, 40.0]);
        let close = repeat("1/2", vec![40.5, 22.5]);
        assert_eq!(compare_repeat_counts(&query, &close, &tolerance), Ok(()));

        let far = repeat("1/2", vec![23.0, 35.0]);
        assert_eq!(compare_repeat_counts(&query, &far, &tolerance), Err(FailedReason::RucMismatch));

        // 0/1 uses the reference count of 21 for the first haplotype
        let het = repeat("0/1", vec![40.0]);
        assert_eq!(compare_repeat_counts(&query, &het, &tolerance), Err(FailedReason::RucMismatch));
        let het_query = repeat("0/1", vec![40.0]);
        assert_eq!(compare_repeat_counts(&het_query, &het, &tolerance), Ok(()));

        let haploid = repeat("1", vec![40.0]);
        assert_eq!(compare_repeat_counts(&query, &haploid, &tolerance), Err(FailedReason::RucAlleleCountDiff));
    }

    #[test]
    fn test_zero_count() {
        let tolerance = TrTolerance::new(1.0, 0.0);
        let contracted = repeat("1/1", vec![0.0]);
        let almost_gone = repeat("1/1", vec![0.4]);
        let small = repeat("1/1", vec![0.8]);
        assert_eq!(compare_repeat_counts(&contracted, &almost_gone, &tolerance), Ok(()));
        // within the absolute tolerance, but zero only matches zero
        assert_eq!(compare_repeat_counts(&contracted, &small, &tolerance), Err(FailedReason::RucMismatch));
        assert_eq!(compare_repeat_counts(&small, &contracted, &tolerance), Ok(()));
    }

    #[test]
    fn test_invalid_counts() {
        let tolerance = TrTolerance::default();
        let query = repeat("1/1", vec![f64::NAN]);
        let truth = repeat("1/1", vec![10.0]);
        assert_eq!(compare_repeat_counts(&query, &truth, &tolerance), Err(FailedReason::RucNotFoundOrInvalid));
    }

    #[test]
    fn test_phased_reconstruction() {
        let tolerance = TrTolerance::new(1.0, 0.0);
        // reference is 20 units of 3 bp; haplotype 1 loses 3 units, haplotype 2 gains 2
        let fragments = vec![
            fragment(0, LengthDelta::Known(-9), "1|0", Some(100)),
            fragment(1, LengthDelta::Known(6), "0|1", Some(100)),
        ];
        let result = reconstruct_phases(2, &[17.0, 22.0], 3, 60, &fragments, &tolerance).unwrap();
        assert_eq!(result, PhaseReconstruction { truth_ids: vec![VariantId(0), VariantId(1)], haplotype_resolved: true });

        // the opposite haplotype order also works
        assert!(reconstruct_phases(2, &[22.0, 17.0], 3, 60, &fragments, &tolerance).is_some());
        // both changes on one haplotype does not match
        assert!(reconstruct_phases(2, &[15.0, 20.0], 3, 60, &fragments, &tolerance).is_none());
    }

    #[test]
    fn test_pooled_reconstruction() {
        let tolerance = TrTolerance::new(1.0, 0.0);
        // two different phase sets cannot be lined up, so the totals are compared
        let fragments = vec![
            fragment(0, LengthDelta::Known(-9), "1|0", Some(100)),
            fragment(1, LengthDelta::Known(6), "0|1", Some(200)),
        ];
        let result = reconstruct_phases(2, &[17.0, 22.0], 3, 60, &fragments, &tolerance).unwrap();
        assert!(!result.haplotype_resolved);
        // only the total of 39 units matters here
        assert!(reconstruct_phases(2, &[16.0, 23.0], 3, 60, &fragments, &tolerance).is_some());
        assert!(reconstruct_phases(2, &[21.0, 21.0], 3, 60, &fragments, &tolerance).is_none());

        // unphased heterozygous records are ambiguous even in one group
        let unphased = vec![fragment(0, LengthDelta::Known(-9), "0/1", None)];
        let result = reconstruct_phases(2, &[17.0, 20.0], 3, 60, &unphased, &tolerance).unwrap();
        assert!(!result.haplotype_resolved);
    }

    #[test]
    fn test_ploidy_change_splits_group() {
        let tolerance = TrTolerance::new(1.0, 0.0);
        // same phase set on both sides of a haploid record
        let fragments = vec![
            fragment(0, LengthDelta::Known(-9), "1|0", Some(5)),
            fragment(1, LengthDelta::Known(3), "1", None),
            fragment(2, LengthDelta::Known(6), "0|1", Some(5)),
        ];
        let groups = group_fragments(&fragments, 2);
        assert_eq!(groups.len(), 3);
        assert!(!groups.contains_key(&PhaseKey::Haploid));

        let result = reconstruct_phases(2, &[18.0, 22.0], 3, 60, &fragments, &tolerance).unwrap();
        assert!(!result.haplotype_resolved);
        assert_eq!(result.truth_ids.len(), 3);
        // 54 and 66 bases per haplotype would not fit, but the pooled 120 does
        assert!(reconstruct_phases(2, &[16.0, 24.0], 3, 60, &fragments, &tolerance).is_some());
    }

    #[test]
    fn test_phased_without_phase_set() {
        let tolerance = TrTolerance::new(1.0, 0.0);
        let fragments = vec![
            fragment(0, LengthDelta::Known(-9), "1|0", None),
            fragment(1, LengthDelta::Known(6), "0|1", None),
        ];
        let groups = group_fragments(&fragments, 2);
        assert_eq!(groups.keys().copied().collect::<Vec<PhaseKey>>(), vec![PhaseKey::PhasedUntagged]);
        assert_eq!(groups[&PhaseKey::PhasedUntagged].size, 2);

        let result = reconstruct_phases(2, &[17.0, 22.0], 3, 60, &fragments, &tolerance).unwrap();
        assert!(result.haplotype_resolved);
        // the pooled total of 39 units would match, the haplotypes do not
        assert!(reconstruct_phases(2, &[15.0, 24.0], 3, 60, &fragments, &tolerance).is_none());
    }

    #[test]
    fn test_unknown_insertions() {
        let tolerance = TrTolerance::new(0.0, 0.0);
        let fragments = vec![fragment(0, LengthDelta::UnknownInsertion, "1|1", Some(5))];
        // any longer expected repeat is reachable
        assert!(reconstruct_phases(2, &[25.0, 25.0], 3, 60, &fragments, &tolerance).is_some());
        // but not one that needs the locus to stay at reference length
        assert!(reconstruct_phases(2, &[20.0, 20.0], 3, 60, &fragments, &tolerance).is_none());
    }

    #[test]
    fn test_haploid_and_empty() {
        let tolerance = TrTolerance::default();
        let fragments = vec![fragment(0, LengthDelta::Known(-30), "1", None)];
        let result = reconstruct_phases(1, &[10.0], 3, 60, &fragments, &tolerance).unwrap();
        assert!(result.haplotype_resolved);

        let reference_only = vec![fragment(0, LengthDelta::Known(-30), "0/0", None)];
        assert!(reconstruct_phases(2, &[10.0, 20.0], 3, 60, &reference_only, &tolerance).is_none());
        assert!(reconstruct_phases(2, &[20.0, 20.0], 3, 60, &[], &tolerance).is_none());
    }
}
