
/*!
Overlap matcher: finds the truth candidates for one query and annotates both sides of every pair.
*/

/// Pairwise classification rules
pub mod rules;
/// Allele sequence similarity
pub mod sequence;

use derive_builder::Builder;
use log::{debug, trace};

use crate::benchmark::VariantArena;
use crate::config::{EvaluationMode, TrTolerance, TypeConfig};
use crate::data_types::annotation::{OverlapAnnotation, VariantId};
use crate::data_types::border_distance::BorderDistance;
use crate::data_types::decision::FailedReason;
use crate::data_types::interval::Interval;
use crate::data_types::match_set::{MatchFlag, MatchSet};
use crate::data_types::scored_variant::ScoredVariant;
use crate::data_types::sv_type::SvType;
use crate::genome_index::GenomeIndex;
use crate::matcher::rules::{classify_pair, CandidateOutcome};
use crate::tandem_repeat::{reconstruct_phases, LengthDelta, PhaseFragment};

/// Settings that control how a query is matched
#[derive(Builder, Clone, Debug)]
#[builder(default)]
pub struct MatchParameters {
    /// Allows paired types to match each other, and tandem repeats to match deletions/insertions
    cross_type_enabled: bool,
    /// If false, genotype mismatches are a failure reason that matters
    simple_counting_enabled: bool,
    /// Repeat count tolerance
    tr_tolerance: TrTolerance,
    /// Length ratio and sequence similarity threshold, 0.0 disables both checks
    similarity_threshold: f64,
    /// Maximum matches kept per record, None means use the number of ALT alleles
    max_matches: Option<usize>
}

impl Default for MatchParameters {
    fn default() -> Self {
        Self {
            cross_type_enabled: false,
            simple_counting_enabled: true,
            tr_tolerance: TrTolerance::default(),
            similarity_threshold: 0.7,
            max_matches: None
        }
    }
}

impl MatchParameters {
    /// Parameters for queries of one type
    /// # Arguments
    /// * `mode` - the evaluation mode
    /// * `config` - settings of the query's type
    pub fn from_config(mode: EvaluationMode, config: &TypeConfig) -> Self {
        Self {
            cross_type_enabled: mode.cross_type_enabled(),
            simple_counting_enabled: mode.simple_counting_enabled(),
            tr_tolerance: config.tr_tolerance(),
            similarity_threshold: config.similarity_threshold(),
            max_matches: config.max_matches()
        }
    }

    pub fn cross_type_enabled(&self) -> bool {
        self.cross_type_enabled
    }

    pub fn genotype_matters(&self) -> bool {
        !self.simple_counting_enabled
    }

    pub fn max_matches(&self) -> Option<usize> {
        self.max_matches
    }
}

/// A scored pair that is not attached yet
#[derive(Debug)]
struct Candidate {
    truth_id: VariantId,
    outcome: CandidateOutcome,
    border_distance: BorderDistance,
    truth_bin: Option<u64>,
    /// None if the query has no genotype
    genotype_match: Option<bool>
}

impl Candidate {
    fn new(query: &ScoredVariant, truth: &ScoredVariant, outcome: CandidateOutcome) -> Self {
        let genotype_match = query.sample().genotype()
            .map(|q_gt| truth.sample().genotype().is_some_and(|t_gt| q_gt.matches(t_gt)));
        Self {
            truth_id: truth.id(),
            outcome,
            border_distance: query.border_distance(truth),
            truth_bin: truth.bin(),
            genotype_match
        }
    }
}

/// A truth record that took part in a successful repeat reconstruction
#[derive(Debug)]
struct ReconstructedPart {
    truth_id: VariantId,
    border_distance: BorderDistance,
    overlap_window: Option<Interval>,
    truth_bin: Option<u64>
}

/// Outcome of the tandem repeat cross-type path
#[derive(Debug)]
enum RepeatPath {
    /// Not applicable to this query
    Skipped,
    /// Could not run or found nothing, with the reason to record
    Failed(FailedReason),
    /// Truth records that explain the repeat
    Reconstructed { parts: Vec<ReconstructedPart>, haplotype_resolved: bool }
}

/// Classifies a tandem repeat query against a same-type candidate.
/// Only candidates covering exactly the same locus are compared, and differing repeat units never match.
fn repeat_candidate(query: &ScoredVariant, truth: &ScoredVariant, params: &MatchParameters) -> Option<CandidateOutcome> {
    if query.base_interval() != truth.base_interval() {
        return None;
    }
    let query_unit = query.repeat().and_then(|r| r.unit());
    let truth_unit = truth.repeat().and_then(|r| r.unit());
    match (query_unit, truth_unit) {
        (Some(q), Some(t)) if q != t => Some(CandidateOutcome {
            match_set: MatchSet::from_flags(&[MatchFlag::LocalMatch]),
            reasons: vec![FailedReason::RucMismatch],
            overlap_window: query.overlap_window(truth)
        }),
        _ => Some(classify_pair(query, truth, params.similarity_threshold, params.cross_type_enabled, &params.tr_tolerance))
    }
}

/// Compares a tandem repeat query against the truth deletions and insertions at its locus
fn repeat_path(arena: &VariantArena, query: &ScoredVariant, index: &dyn GenomeIndex, params: &MatchParameters) -> RepeatPath {
    if !params.cross_type_enabled || query.sv_type() != SvType::TandemRepeat {
        return RepeatPath::Skipped;
    }

    let expectation = query.repeat().and_then(|repeat| {
        let unit_length = repeat.unit_length()?;
        let expected = repeat.haplotype_counts(query.sample().genotype())?;
        let reference_length = repeat.reference_count()
            .map(|c| (c * unit_length as f64).round() as u64)
            .unwrap_or_else(|| query.base_interval().len());
        Some((unit_length, expected, reference_length))
    });
    let Some((unit_length, expected, reference_length)) = expectation else {
        return RepeatPath::Failed(FailedReason::RucAlleleTruthError);
    };

    let window = query.base_interval().expand(unit_length);
    let mut fragments: Vec<(u64, PhaseFragment)> = vec![];
    for sv_type in [SvType::Deletion, SvType::Insertion] {
        for truth_id in index.search(sv_type, query.contig(), &window) {
            let truth = arena.get(truth_id);
            if !truth.base_interval().overlaps(&window) {
                continue;
            }
            let delta = match (sv_type, truth.length()) {
                (SvType::Deletion, Some(length)) => LengthDelta::Known(-(length as i64)),
                (SvType::Insertion, Some(length)) => LengthDelta::Known(length as i64),
                (SvType::Insertion, None) => LengthDelta::UnknownInsertion,
                _ => continue
            };
            fragments.push((truth.base_interval().start(), PhaseFragment {
                id: truth_id,
                delta,
                genotype: truth.sample().genotype().cloned()
            }));
        }
    }
    fragments.sort_by_key(|(start, fragment)| (*start, fragment.id));
    let fragments: Vec<PhaseFragment> = fragments.into_iter().map(|(_, f)| f).collect();

    match reconstruct_phases(expected.len(), &expected, unit_length, reference_length, &fragments, &params.tr_tolerance) {
        Some(reconstruction) => {
            let parts = reconstruction.truth_ids.iter()
                .map(|&truth_id| {
                    let truth = arena.get(truth_id);
                    ReconstructedPart {
                        truth_id,
                        border_distance: query.border_distance(truth),
                        overlap_window: query.overlap_window(truth),
                        truth_bin: truth.bin()
                    }
                })
                .collect();
            RepeatPath::Reconstructed { parts, haplotype_resolved: reconstruction.haplotype_resolved }
        },
        None => RepeatPath::Failed(FailedReason::NoOverlap)
    }
}

/// Matches one query against the indexed truth records, attaching annotations to both sides of every candidate pair.
/// Annotations beyond the query's match limit are removed from both sides.
/// Returns the number of annotations the query keeps.
/// # Arguments
/// * `arena` - all records of the partition
/// * `query_id` - the query to match
/// * `index` - lookup of eligible truth records
/// * `params` - matching settings for the query's type
pub fn match_query(arena: &mut VariantArena, query_id: VariantId, index: &dyn GenomeIndex, params: &MatchParameters) -> usize {
    // everything is scored against immutable records first, then attached
    let (candidates, repeat_result, query_genotype, query_bin) = {
        let query = arena.get(query_id);
        let mut candidates: Vec<Candidate> = vec![];

        for truth_id in index.search(query.sv_type(), query.contig(), &query.search_interval()) {
            let truth = arena.get(truth_id);
            let outcome = if query.sv_type() == SvType::TandemRepeat {
                repeat_candidate(query, truth, params)
            } else {
                Some(classify_pair(query, truth, params.similarity_threshold, params.cross_type_enabled, &params.tr_tolerance))
            };
            if let Some(outcome) = outcome {
                candidates.push(Candidate::new(query, truth, outcome));
            }
        }

        if params.cross_type_enabled {
            for &partner in query.sv_type().cross_type_partners() {
                for truth_id in index.search(partner, query.contig(), &query.search_interval()) {
                    let truth = arena.get(truth_id);
                    let outcome = classify_pair(query, truth, params.similarity_threshold, true, &params.tr_tolerance);
                    candidates.push(Candidate::new(query, truth, outcome));
                }
            }
        }

        let repeat_result = repeat_path(arena, query, index, params);
        (candidates, repeat_result, query.sample().genotype().cloned(), query.bin())
    };

    // build the annotations with fresh tags
    let mut pairs: Vec<(VariantId, OverlapAnnotation, Vec<FailedReason>)> = Vec::with_capacity(candidates.len());
    for candidate in candidates.into_iter() {
        let mut outcome = candidate.outcome;
        match candidate.genotype_match {
            Some(true) => outcome.match_set.insert(MatchFlag::Genotype),
            Some(false) => outcome.reasons.push(FailedReason::GtMismatch),
            None => {}
        }
        let annotation = OverlapAnnotation::new(
            arena.next_tag(), Some(candidate.truth_id), outcome.match_set, outcome.overlap_window,
            Some(candidate.border_distance), candidate.truth_bin, outcome.reason(params.genotype_matters())
        );
        pairs.push((candidate.truth_id, annotation, outcome.reasons));
    }

    // several ALT alleles can each be covered by a different truth record
    if let (None, Some(gt)) = (params.max_matches, query_genotype.as_ref()) {
        let alt_alleles = gt.non_reference_count();
        let mut allele_matches: Vec<usize> = (0..pairs.len())
            .filter(|&i| pairs[i].1.match_set().contains(MatchFlag::AlleleMatch))
            .collect();
        if alt_alleles > 1 && allele_matches.len() >= alt_alleles {
            allele_matches.sort_by(|&a, &b| pairs[a].1.rank_cmp(&pairs[b].1));
            for &i in allele_matches.iter().take(alt_alleles) {
                let (_, annotation, reasons) = &mut pairs[i];
                reasons.retain(|&r| r != FailedReason::GtMismatch);
                annotation.match_set_mut().insert(MatchFlag::Genotype);
                annotation.set_reason(FailedReason::resolve(reasons, params.genotype_matters()));
            }
            trace!("Promoted {alt_alleles} allele matches to genotype matches for {}", arena.get(query_id).record_id());
        }
    }

    let mut produced = pairs.len();
    for (truth_id, annotation, _reasons) in pairs.into_iter() {
        arena.attach_pair(query_id, query_bin, truth_id, annotation);
    }

    match repeat_result {
        RepeatPath::Skipped => {},
        RepeatPath::Failed(reason) => {
            let tag = arena.next_tag();
            arena.attach_self(query_id, OverlapAnnotation::unmatched(tag, reason));
            produced += 1;
        },
        RepeatPath::Reconstructed { parts, haplotype_resolved } => {
            let tag = arena.next_tag();
            let mut match_set = MatchSet::from_flags(&[MatchFlag::AlleleMatch, MatchFlag::LocalMatch]);
            if haplotype_resolved {
                match_set.insert(MatchFlag::Genotype);
            }
            let reason = if haplotype_resolved || !params.genotype_matters() {
                FailedReason::Unset
            } else {
                FailedReason::GtMismatch
            };
            produced += parts.len();
            for part in parts.into_iter() {
                let annotation = OverlapAnnotation::new(
                    tag, Some(part.truth_id), match_set, part.overlap_window,
                    Some(part.border_distance), part.truth_bin, reason
                );
                arena.attach_pair(query_id, query_bin, part.truth_id, annotation);
            }
        }
    }

    // keep the best annotations, and pull the rest off the truth side as well
    let limit = arena.get(query_id).match_limit(params.max_matches);
    let removed = arena.get_mut(query_id).truncate_annotations(limit);
    for annotation in removed.iter() {
        arena.detach(query_id, annotation);
    }

    if produced == 0 {
        let tag = arena.next_tag();
        arena.attach_self(query_id, OverlapAnnotation::unmatched(tag, FailedReason::NoOverlap));
    }

    let query = arena.get(query_id);
    debug!(
        "{} {}: {} candidates, best {}",
        query.sv_type(), query.record_id(), produced,
        query.annotations().first().map(|a| a.match_set().to_string()).unwrap_or_else(|| "none".to_string())
    );
    query.annotations().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeConfig;
    use crate::data_types::decision::VariantSource;
    use crate::data_types::input_record::{InputRecord, InputRecordBuilder};
    use crate::genome_index::CoitreeGenomeIndex;

    fn deletion(id: &str, position: u64, end: u64, gt: &str) -> InputRecord {
        InputRecordBuilder::default()
            .id(id).contig("chr1").position(position).end(end)
            .ref_allele("N").alt_allele("<DEL>").genotype(gt)
            .build().unwrap()
    }

    /// Builds an arena with the truth records first, then the queries
    fn setup(truth: &[InputRecord], query: &[InputRecord]) -> (VariantArena, Vec<VariantId>, Vec<VariantId>) {
        let mut arena = VariantArena::default();
        let mut add = |record: &InputRecord, source: VariantSource| {
            let sv_type = record.classify().unwrap();
            let variant = ScoredVariant::from_record(record, source, Some(&TypeConfig::default_for(sv_type))).unwrap();
            arena.push(variant)
        };
        let truth_ids: Vec<VariantId> = truth.iter().map(|r| add(r, VariantSource::Truth)).collect();
        let query_ids: Vec<VariantId> = query.iter().map(|r| add(r, VariantSource::Query)).collect();
        (arena, truth_ids, query_ids)
    }

    fn truth_index(arena: &VariantArena, truth_ids: &[VariantId]) -> CoitreeGenomeIndex {
        CoitreeGenomeIndex::new(truth_ids.iter().map(|&id| arena.get(id))).unwrap()
    }

    #[test]
    fn test_mutual_annotations() {
        let (mut arena, truth_ids, query_ids) = setup(
            &[deletion("t1", 1000, 2000, "0/1"), deletion("t2", 1100, 2100, "0/1"), deletion("t3", 50000, 51000, "0/1")],
            &[deletion("q1", 1010, 2010, "0/1")]
        );
        let index = truth_index(&arena, &truth_ids);
        let params = MatchParameters::default();
        let kept = match_query(&mut arena, query_ids[0], &index, &params);

        // limit is one ALT allele, so only the closest truth keeps its annotation
        assert_eq!(kept, 1);
        let query = arena.get(query_ids[0]);
        let best = &query.annotations()[0];
        assert_eq!(best.counterpart(), Some(truth_ids[0]));
        assert!(best.match_set().satisfies(MatchSet::allele_and_genotype()));
        assert_eq!(best.border_distance(), Some(&BorderDistance::new(10, 10, 10, 10)));

        let t1 = arena.get(truth_ids[0]);
        assert_eq!(t1.annotations().len(), 1);
        assert_eq!(t1.annotations()[0].tag(), best.tag());
        assert_eq!(t1.annotations()[0].counterpart(), Some(query_ids[0]));
        // the runner-up was detached from its truth record
        assert!(arena.get(truth_ids[1]).annotations().is_empty());
        assert!(arena.get(truth_ids[2]).annotations().is_empty());
    }

    #[test]
    fn test_no_overlap() {
        let (mut arena, truth_ids, query_ids) = setup(
            &[deletion("t1", 1000, 2000, "0/1")],
            &[deletion("q1", 90000, 91000, "0/1")]
        );
        let index = truth_index(&arena, &truth_ids);
        let kept = match_query(&mut arena, query_ids[0], &index, &MatchParameters::default());
        assert_eq!(kept, 1);
        let annotation = &arena.get(query_ids[0]).annotations()[0];
        assert_eq!(annotation.counterpart(), None);
        assert_eq!(annotation.match_set(), MatchSet::UNMATCHED);
        assert_eq!(annotation.reason(), FailedReason::NoOverlap);
    }

    #[test]
    fn test_genotype_and_promotion() {
        // a homozygous query explained by two heterozygous truth records
        let (mut arena, truth_ids, query_ids) = setup(
            &[deletion("t1", 1000, 2000, "0/1"), deletion("t2", 1005, 2005, "0/1")],
            &[deletion("q1", 1000, 2000, "1/1")]
        );
        let index = truth_index(&arena, &truth_ids);
        let params = MatchParametersBuilder::default()
            .simple_counting_enabled(false)
            .build().unwrap();
        let kept = match_query(&mut arena, query_ids[0], &index, &params);
        assert_eq!(kept, 2);
        for annotation in arena.get(query_ids[0]).annotations() {
            assert!(annotation.match_set().contains(MatchFlag::Genotype));
            assert_eq!(annotation.reason(), FailedReason::Unset);
        }

        // with an explicit limit there is no promotion
        let (mut arena, truth_ids, query_ids) = setup(
            &[deletion("t1", 1000, 2000, "0/1"), deletion("t2", 1005, 2005, "0/1")],
            &[deletion("q1", 1000, 2000, "1/1")]
        );
        let index = truth_index(&arena, &truth_ids);
        let params = MatchParametersBuilder::default()
            .simple_counting_enabled(false)
            .max_matches(Some(2))
            .build().unwrap();
        match_query(&mut arena, query_ids[0], &index, &params);
        for annotation in arena.get(query_ids[0]).annotations() {
            assert!(!annotation.match_set().contains(MatchFlag::Genotype));
            assert_eq!(annotation.reason(), FailedReason::GtMismatch);
        }
    }

    #[test]
    fn test_max_matches_zero() {
        let (mut arena, truth_ids, query_ids) = setup(
            &[deletion("t1", 1000, 2000, "0/1"), deletion("t2", 1005, 2005, "0/1")],
            &[deletion("q1", 1000, 2000, "1/1")]
        );
        let index = truth_index(&arena, &truth_ids);
        let params = MatchParametersBuilder::default()
            .max_matches(Some(0))
            .build().unwrap();
        let kept = match_query(&mut arena, query_ids[0], &index, &params);
        assert_eq!(kept, 0);
        assert!(truth_ids.iter().all(|&id| arena.get(id).annotations().is_empty()));
    }

    fn repeat_query(counts: Vec<f64>, gt: &str) -> InputRecord {
        InputRecordBuilder::default()
            .id("tr").contig("chr1").position(10_000_u64).end(10_060_u64)
            .ref_allele("N").alt_allele("<CNV:TR>")
            .repeat_unit("CAG").reference_repeat_count(20.0).repeat_counts(counts)
            .genotype(gt)
            .build().unwrap()
    }

    #[test]
    fn test_repeat_candidates() {
        let truth_repeat = |id: &str, position: u64, end: u64, unit: &str| InputRecordBuilder::default()
            .id(id).contig("chr1").position(position).end(end)
            .ref_allele("N").alt_allele("<CNV:TR>")
            .repeat_unit(unit).reference_repeat_count(20.0).repeat_counts(vec![23.0])
            .genotype("0/1")
            .build().unwrap();
        let (mut arena, truth_ids, query_ids) = setup(
            &[truth_repeat("other_unit", 10_000, 10_060, "CAA"), truth_repeat("shifted", 10_005, 10_065, "CAG")],
            &[repeat_query(vec![23.0], "0/1")]
        );
        let index = truth_index(&arena, &truth_ids);
        let params = MatchParametersBuilder::default()
            .max_matches(Some(5))
            .build().unwrap();
        let kept = match_query(&mut arena, query_ids[0], &index, &params);

        // the shifted locus is never compared, the other unit is local only
        assert_eq!(kept, 1);
        let annotation = &arena.get(query_ids[0]).annotations()[0];
        assert_eq!(annotation.counterpart(), Some(truth_ids[0]));
        assert_eq!(annotation.reason(), FailedReason::RucMismatch);
        assert!(annotation.match_set().contains(MatchFlag::LocalMatch));
        assert!(!annotation.match_set().contains(MatchFlag::AlleleMatch));
        assert_eq!(arena.get(truth_ids[0]).annotations().len(), 1);
        assert!(arena.get(truth_ids[1]).annotations().is_empty());
    }

    #[test]
    fn test_repeat_reconstruction() {
        let truth_del = InputRecordBuilder::default()
            .id("del").contig("chr1").position(10_010_u64).end(10_019_u64)
            .ref_allele("N").alt_allele("<DEL>").genotype("1|0").phase_set(7_u64)
            .build().unwrap();
        let truth_ins = InputRecordBuilder::default()
            .id("ins").contig("chr1").position(10_030_u64)
            .ref_allele("A").alt_allele("ACAGCAG").genotype("0|1").phase_set(7_u64)
            .build().unwrap();
        let (mut arena, truth_ids, query_ids) = setup(&[truth_del, truth_ins], &[repeat_query(vec![17.0, 22.0], "1/2")]);
        let index = truth_index(&arena, &truth_ids);
        let params = MatchParametersBuilder::default()
            .cross_type_enabled(true)
            .tr_tolerance(TrTolerance::new(1.0, 0.0))
            .build().unwrap();
        let kept = match_query(&mut arena, query_ids[0], &index, &params);
        assert_eq!(kept, 2);

        let query = arena.get(query_ids[0]);
        let tags: Vec<u64> = query.annotations().iter().map(|a| a.tag()).collect();
        assert_eq!(tags[0], tags[1]);
        for annotation in query.annotations() {
            assert!(annotation.match_set().satisfies(MatchSet::allele_and_genotype()));
        }
        assert_eq!(arena.get(truth_ids[0]).annotations().len(), 1);
        assert_eq!(arena.get(truth_ids[1]).annotations().len(), 1);
    }

    #[test]
    fn test_repeat_missing_counts() {
        let (mut arena, truth_ids, query_ids) = setup(&[], &[repeat_query(vec![17.0], "./1")]);
        let index = truth_index(&arena, &truth_ids);
        let params = MatchParametersBuilder::default()
            .cross_type_enabled(true)
            .build().unwrap();
        match_query(&mut arena, query_ids[0], &index, &params);
        let annotation = &arena.get(query_ids[0]).annotations()[0];
        assert_eq!(annotation.reason(), FailedReason::RucAlleleTruthError);
    }
}
