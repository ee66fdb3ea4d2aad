
use log::trace;
use serde::Serialize;

use crate::benchmark::BenchmarkError;
use crate::config::TypeConfig;
use crate::data_types::annotation::{OverlapAnnotation, VariantId, sort_annotations};
use crate::data_types::border_distance::BorderDistance;
use crate::data_types::decision::{Decision, FailedReason, VariantSource};
use crate::data_types::input_record::{InputRecord, VariantError};
use crate::data_types::interval::Interval;
use crate::data_types::match_set::MatchSet;
use crate::data_types::sample::{Allele, Genotype, SampleSummary};
use crate::data_types::sv_type::SvType;
use crate::genome_index::RegionIndex;

/// What we know about the alternate allele's bases
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum AlleleSequence {
    /// No bases available (symbolic ALT)
    Symbolic,
    /// Full inserted sequence, uppercase
    Literal(Vec<u8>),
    /// Only the flanks of the inserted sequence are known
    Partial { left: Option<Vec<u8>>, right: Option<Vec<u8>> }
}

/// Repeat annotations for a tandem repeat record
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RepeatInfo {
    /// Repeat unit bases, uppercase
    unit: Option<Vec<u8>>,
    /// Repeat unit length; falls back to the unit sequence length
    unit_length: Option<u64>,
    /// Repeat unit count of the reference allele
    reference_count: Option<f64>,
    /// Repeat unit counts of the ALT alleles, in ALT order
    allele_counts: Vec<f64>
}

fn valid_count(count: f64) -> Option<f64> {
    (count.is_finite() && count >= 0.0).then_some(count)
}

impl RepeatInfo {
    /// Constructor
    pub fn new(unit: Option<Vec<u8>>, unit_length: Option<u64>, reference_count: Option<f64>, allele_counts: Vec<f64>) -> Self {
        Self { unit, unit_length, reference_count, allele_counts }
    }

    pub fn unit(&self) -> Option<&[u8]> {
        self.unit.as_deref()
    }

    /// Explicit unit length, or the length of the unit sequence
    pub fn unit_length(&self) -> Option<u64> {
        self.unit_length
            .or_else(|| self.unit.as_ref().map(|u| u.len() as u64))
            .filter(|&l| l > 0)
    }

    pub fn reference_count(&self) -> Option<f64> {
        self.reference_count
    }

    pub fn allele_counts(&self) -> &[f64] {
        &self.allele_counts
    }

    /// Repeat unit count on each haplotype, in genotype order.
    /// Returns None if there is no genotype, an allele is missing, or a needed count is unavailable or invalid.
    /// # Arguments
    /// * `genotype` - the genotype of the record
    pub fn haplotype_counts(&self, genotype: Option<&Genotype>) -> Option<Vec<f64>> {
        let genotype = genotype?;
        genotype.alleles().iter()
            .map(|allele| match allele {
                Allele::Missing => None,
                Allele::Reference => self.reference_count.and_then(valid_count),
                Allele::Alternate(index) => index.checked_sub(1)
                    .and_then(|i| self.allele_counts.get(i).copied())
                    .and_then(valid_count)
            })
            .collect()
    }

    /// ALT counts if they are all valid, None otherwise
    pub fn valid_allele_counts(&self) -> Option<Vec<f64>> {
        if self.allele_counts.is_empty() {
            return None;
        }
        self.allele_counts.iter()
            .map(|&c| valid_count(c))
            .collect()
    }
}

/// A single truth or query record prepared for matching
#[derive(Clone, Debug, Serialize)]
pub struct ScoredVariant {
    /// Index in the owning arena
    id: VariantId,
    /// Truth or query
    source: VariantSource,
    /// Original record ID
    record_id: String,
    /// Variant type
    sv_type: SvType,
    /// Contig of the first breakpoint
    contig: String,
    /// 0-based half-open bases covered by the event, or the anchor base for insertions and breakends
    base_interval: Interval,
    /// First breakpoint with its confidence interval only
    ci_pos: Interval,
    /// Second breakpoint with its confidence interval only; same as `ci_pos` for insertions
    ci_end: Interval,
    /// `ci_pos` expanded by the breakpoint tolerance
    pos_interval: Interval,
    /// `ci_end` expanded by the breakpoint tolerance
    end_interval: Interval,
    /// Contig of the second breakpoint, which differs from `contig` for translocations
    end_contig: String,
    /// Event length, if it can be known
    length: Option<u64>,
    /// Size bin floor
    bin: Option<u64>,
    /// Sample information
    sample: SampleSummary,
    /// Inserted bases, if any
    sequence: AlleleSequence,
    /// Tandem repeat annotations
    repeat: Option<RepeatInfo>,
    /// Breakend mate identifier
    mate_id: Option<String>,
    /// Set before matching if this record should not be assessed at all
    prefilter: Option<FailedReason>,
    /// Ranked candidate matches
    annotations: Vec<OverlapAnnotation>,
    /// Final decision, set exactly once
    decision: Option<Decision>,
    /// Reason reported with the decision
    decision_reason: FailedReason
}

/// Converts a 1-based coordinate plus a signed offset into a clamped u64
fn offset_position(position: u64, offset: i64) -> u64 {
    position.saturating_add_signed(offset)
}

/// Closed interval around a breakpoint from its (possibly reversed) confidence interval
fn confidence_interval(breakpoint: u64, ci: Option<(i64, i64)>) -> Interval {
    let (low, high) = ci.unwrap_or((0, 0));
    let (low, high) = (low.min(high).min(0), low.max(high).max(0));
    Interval::closed(offset_position(breakpoint, low), offset_position(breakpoint, high))
}

impl ScoredVariant {
    /// Builds a scoring variant from a classified input record.
    /// # Arguments
    /// * `record` - the parsed record
    /// * `source` - truth or query
    /// * `config` - the settings for this record's type; None means the type is not scored
    /// # Errors
    /// * if the record cannot be classified or its geometry is invalid
    pub fn from_record(record: &InputRecord, source: VariantSource, config: Option<&TypeConfig>) -> Result<Self, VariantError> {
        if record.position == 0 {
            return Err(VariantError::ZeroPosition { id: record.id.clone() });
        }
        let sv_type = record.classify()?;
        let default_config;
        let type_config = match config {
            Some(c) => c,
            None => {
                default_config = TypeConfig::default_for(sv_type);
                &default_config
            }
        };

        // the 1-based POS doubles as the 0-based coordinate just past the anchor base
        let position = record.position;
        let anchor = Interval::half_open(position - 1, position);
        let mut end_contig = record.contig.clone();
        let mut sequence = AlleleSequence::Symbolic;

        let (base_interval, ci_pos, ci_end, length) = if sv_type.is_breakend() {
            let bnd = record.breakend_alt()?;
            let breakpoint = position - 1;
            let length = (sv_type == SvType::IntraChromosomeBreakend)
                .then(|| breakpoint.abs_diff(bnd.mate_position));
            let ci_pos = confidence_interval(breakpoint, record.cipos);
            let ci_end = confidence_interval(bnd.mate_position, record.ciend.or(record.cipos));
            end_contig = bnd.mate_contig;
            if !bnd.inserted.is_empty() {
                sequence = AlleleSequence::Literal(bnd.inserted);
            }
            (anchor, ci_pos, ci_end, length)
        } else if sv_type == SvType::Insertion {
            let literal = record.symbolic_name().is_none() && record.alt_allele.len() > record.ref_allele.len();
            let length = match record.svlen {
                Some(svlen) => Some(svlen.unsigned_abs()),
                None if literal => Some((record.alt_allele.len() - record.ref_allele.len()) as u64),
                None => None
            };
            if literal {
                let inserted = record.alt_allele.get(record.ref_allele.len()..)
                    .filter(|seq| seq.is_ascii())
                    .ok_or_else(|| VariantError::InvalidAllele {
                        id: record.id.clone(),
                        ref_allele: record.ref_allele.clone(),
                        alt: record.alt_allele.clone()
                    })?;
                sequence = AlleleSequence::Literal(inserted.to_ascii_uppercase().into_bytes());
            } else if record.left_insertion_seq.is_some() || record.right_insertion_seq.is_some() {
                sequence = AlleleSequence::Partial {
                    left: record.left_insertion_seq.as_ref().map(|s| s.to_ascii_uppercase().into_bytes()),
                    right: record.right_insertion_seq.as_ref().map(|s| s.to_ascii_uppercase().into_bytes())
                };
            }
            let ci_pos = confidence_interval(position, record.cipos);
            (anchor, ci_pos, ci_pos, length)
        } else {
            let end = match (record.end, record.svlen) {
                (Some(end), _) => end,
                (None, Some(svlen)) => position + svlen.unsigned_abs(),
                (None, None) if record.ref_allele.len() > 1 => position + record.ref_allele.len() as u64 - 1,
                (None, None) => return Err(VariantError::MissingSpan { id: record.id.clone(), sv_type })
            };
            if end < position {
                return Err(VariantError::InvalidSpan { id: record.id.clone(), position, end });
            }
            let ci_pos = confidence_interval(position, record.cipos);
            let ci_end = confidence_interval(end, record.ciend);
            (Interval::half_open(position, end), ci_pos, ci_end, Some(end - position))
        };

        let tolerance = type_config.breakpoint_tolerance(sv_type, length);
        let pos_interval = ci_pos.expand(tolerance);
        let end_interval = if sv_type.has_end_breakpoint() { ci_end.expand(tolerance) } else { pos_interval };

        let genotype = record.genotype.as_deref()
            .map(|gt| Genotype::parse(gt, record.phase_set))
            .transpose()
            .map_err(|source| VariantError::Genotype { id: record.id.clone(), source })?;
        let sample = SampleSummary::from_parts(genotype, record.copy_number);

        let repeat = (sv_type == SvType::TandemRepeat).then(|| RepeatInfo::new(
            record.repeat_unit.as_ref().map(|u| u.to_ascii_uppercase().into_bytes()),
            record.repeat_unit_length,
            record.reference_repeat_count,
            record.repeat_counts.clone()
        ));

        let bin = type_config.bins().classify(length);
        let prefilter = if config.is_none() {
            Some(FailedReason::VariantTypeSkipped)
        } else if bin.is_none() ||
            !type_config.passes_filters(&record.filters) ||
            (!record.sample_filters.is_empty() && !type_config.passes_filters(&record.sample_filters)) {
            Some(FailedReason::FilteredBySettings)
        } else {
            None
        };

        Ok(Self {
            id: VariantId(0),
            source,
            record_id: record.id.clone(),
            sv_type,
            contig: record.contig.clone(),
            base_interval,
            ci_pos,
            ci_end,
            pos_interval,
            end_interval,
            end_contig,
            length,
            bin,
            sample,
            sequence,
            repeat,
            mate_id: record.mate_id.clone(),
            prefilter,
            annotations: vec![],
            decision: None,
            decision_reason: FailedReason::Unset
        })
    }

    // getters
    pub fn id(&self) -> VariantId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: VariantId) {
        self.id = id;
    }

    pub fn source(&self) -> VariantSource {
        self.source
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn sv_type(&self) -> SvType {
        self.sv_type
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn end_contig(&self) -> &str {
        &self.end_contig
    }

    pub fn base_interval(&self) -> &Interval {
        &self.base_interval
    }

    pub fn ci_pos(&self) -> &Interval {
        &self.ci_pos
    }

    pub fn ci_end(&self) -> &Interval {
        &self.ci_end
    }

    pub fn pos_interval(&self) -> &Interval {
        &self.pos_interval
    }

    pub fn end_interval(&self) -> &Interval {
        &self.end_interval
    }

    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn bin(&self) -> Option<u64> {
        self.bin
    }

    pub fn sample(&self) -> &SampleSummary {
        &self.sample
    }

    pub fn sequence(&self) -> &AlleleSequence {
        &self.sequence
    }

    pub fn repeat(&self) -> Option<&RepeatInfo> {
        self.repeat.as_ref()
    }

    pub fn mate_id(&self) -> Option<&str> {
        self.mate_id.as_deref()
    }

    pub fn prefilter(&self) -> Option<FailedReason> {
        self.prefilter
    }

    pub fn set_prefilter(&mut self, reason: FailedReason) {
        self.prefilter = Some(reason);
    }

    /// Returns true if this record takes part in matching
    pub fn is_eligible(&self) -> bool {
        self.prefilter.is_none()
    }

    pub fn annotations(&self) -> &[OverlapAnnotation] {
        &self.annotations
    }

    pub fn decision(&self) -> Option<Decision> {
        self.decision
    }

    pub fn decision_reason(&self) -> FailedReason {
        self.decision_reason
    }

    /// Interval used to find candidates: the hull of both tolerance intervals when both breakpoints are on this contig
    pub fn search_interval(&self) -> Interval {
        if self.end_contig == self.contig {
            self.pos_interval.hull(&self.end_interval)
        } else {
            self.pos_interval
        }
    }

    /// Border distance score against another variant, from CI-only breakpoints
    pub fn border_distance(&self, other: &ScoredVariant) -> BorderDistance {
        BorderDistance::between(
            &self.ci_pos, &self.ci_end,
            &other.ci_pos, &other.ci_end,
            self.end_contig == other.end_contig
        )
    }

    /// Shared bases of the two spans, only when both types track overlap windows
    pub fn overlap_window(&self, other: &ScoredVariant) -> Option<Interval> {
        if !(self.sv_type.has_overlap_window() && other.sv_type.has_overlap_window()) || self.contig != other.contig {
            return None;
        }
        self.base_interval.intersect(&other.base_interval)
    }

    /// Maximum number of annotations this record keeps
    /// # Arguments
    /// * `max_matches` - the configured override, None means use the number of ALT alleles in the genotype
    pub fn match_limit(&self, max_matches: Option<usize>) -> usize {
        max_matches.unwrap_or_else(|| self.sample.allele_match_limit())
    }

    pub(crate) fn push_annotation(&mut self, annotation: OverlapAnnotation) {
        self.annotations.push(annotation);
    }

    /// Removes the annotation with `tag` pointing at `counterpart`; returns true if one was removed
    pub(crate) fn detach(&mut self, tag: u64, counterpart: VariantId) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|a| !(a.tag() == tag && a.counterpart() == Some(counterpart)));
        self.annotations.len() != before
    }

    /// Sorts annotations best first and keeps at most `limit`, returning the removed ones
    pub(crate) fn truncate_annotations(&mut self, limit: usize) -> Vec<OverlapAnnotation> {
        sort_annotations(&mut self.annotations);
        if self.annotations.len() > limit {
            self.annotations.split_off(limit)
        } else {
            vec![]
        }
    }

    /// Reduces the annotation list to a single decision. This can only happen once.
    /// # Arguments
    /// * `limit` - maximum retained annotations
    /// * `required` - flags an annotation needs for this record to be a true positive
    /// * `regions` - optional included regions; records not fully inside are not assessed
    /// # Errors
    /// * if the record was already finalized
    /// * if the prefilter reason is not one that excludes records from assessment
    pub fn finalize(&mut self, limit: usize, required: MatchSet, regions: Option<&RegionIndex>) -> Result<Decision, BenchmarkError> {
        if self.decision.is_some() {
            return Err(BenchmarkError::AlreadyFinalized { record_id: self.record_id.clone() });
        }

        let _removed = self.truncate_annotations(limit);
        let (decision, reason) = if let Some(reason) = self.prefilter {
            if !reason.is_disqualifying() {
                return Err(BenchmarkError::InvariantViolation(
                    format!("record {:?} was prefiltered with {}", self.record_id, reason.as_ref())
                ));
            }
            (Decision::NotAssessed, reason)
        } else if regions.is_some_and(|r| !r.contains(&self.contig, &self.base_interval)) {
            (Decision::NotAssessed, FailedReason::OutsideBedRegion)
        } else if let Some(hit) = self.annotations.iter().find(|a| a.match_set().satisfies(required)) {
            (Decision::TruePositive, hit.reason())
        } else {
            let reason = self.annotations.first()
                .map(|a| a.reason())
                .unwrap_or(FailedReason::NoOverlap);
            (self.source.false_decision(), reason)
        };

        trace!("Finalized {} {}: {} ({})", self.source.as_ref(), self.record_id, decision.as_ref(), reason.as_ref());
        self.decision = Some(decision);
        self.decision_reason = reason;
        Ok(decision)
    }

    /// Parts of the event span that count for base-level statistics
    /// # Arguments
    /// * `regions` - optional included regions to clip against
    pub fn counted_bases(&self, regions: Option<&RegionIndex>) -> Vec<Interval> {
        match regions {
            Some(r) => r.clip(&self.contig, &self.base_interval),
            None if self.base_interval.is_empty() => vec![],
            None => vec![self.base_interval]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeConfigBuilder;
    use crate::data_types::input_record::InputRecordBuilder;
    use crate::data_types::match_set::MatchFlag;

    fn deletion(position: u64, end: u64) -> InputRecord {
        InputRecordBuilder::default()
            .id(format!("del_{position}"))
            .contig("15")
            .position(position)
            .ref_allele("N")
            .alt_allele("<DEL>")
            .end(end)
            .genotype("0/1")
            .build().unwrap()
    }

    #[test]
    fn test_span_geometry() {
        let config = TypeConfig::default();
        let variant = ScoredVariant::from_record(&deletion(1000, 2000), VariantSource::Truth, Some(&config)).unwrap();
        assert_eq!(variant.sv_type(), SvType::Deletion);
        assert_eq!(variant.base_interval(), &Interval::half_open(1000, 2000));
        assert_eq!(variant.length(), Some(1000));
        assert_eq!(variant.bin(), Some(1000));
        // 25% of 1000 is 250, below the 500 bp cap
        assert_eq!(variant.pos_interval(), &Interval::closed(750, 1250));
        assert_eq!(variant.end_interval(), &Interval::closed(1750, 2250));
        assert!(variant.pos_interval().contains(variant.ci_pos()));
        assert!(variant.is_eligible());
        assert_eq!(variant.match_limit(None), 1);
    }

    #[test]
    fn test_insertion_geometry() {
        let record = InputRecordBuilder::default()
            .id("ins").contig("chr1").position(500_u64)
            .ref_allele("A").alt_allele("AcgtACGTAC")
            .cipos((-5_i64, 5_i64))
            .build().unwrap();
        let variant = ScoredVariant::from_record(&record, VariantSource::Query, Some(&TypeConfig::default_for(SvType::Insertion))).unwrap();
        assert_eq!(variant.sv_type(), SvType::Insertion);
        assert_eq!(variant.length(), Some(9));
        assert_eq!(variant.sequence(), &AlleleSequence::Literal(b"CGTACGTAC".to_vec()));
        assert_eq!(variant.ci_pos(), &Interval::closed(495, 505));
        assert_eq!(variant.pos_interval(), variant.end_interval());
        assert_eq!(variant.pos_interval(), &Interval::closed(395, 605));
    }

    #[test]
    fn test_insertion_non_nucleotide() {
        let insertion = |ref_allele: &str, alt: &str| InputRecordBuilder::default()
            .id("ins").contig("chr1").position(500_u64)
            .ref_allele(ref_allele).alt_allele(alt)
            .build().unwrap();
        let config = TypeConfig::default_for(SvType::Insertion);

        // REF ends inside a multi-byte character of ALT
        let split_char = insertion("AC", "A\u{e9}CGTACGTAC");
        assert_eq!(split_char.classify().unwrap(), SvType::Insertion);
        assert!(matches!(
            ScoredVariant::from_record(&split_char, VariantSource::Query, Some(&config)),
            Err(VariantError::InvalidAllele { .. })
        ));

        let non_ascii = insertion("A", "A\u{e9}CGTACGTAC");
        assert!(matches!(
            ScoredVariant::from_record(&non_ascii, VariantSource::Query, Some(&config)),
            Err(VariantError::InvalidAllele { .. })
        ));
    }

    #[test]
    fn test_breakend_geometry() {
        let record = InputRecordBuilder::default()
            .id("bnd1").contig("chr1").position(1000_u64)
            .ref_allele("A").alt_allele("A[chr5:2001[")
            .build().unwrap();
        let variant = ScoredVariant::from_record(&record, VariantSource::Truth, Some(&TypeConfig::default())).unwrap();
        assert_eq!(variant.sv_type(), SvType::TranslocationBreakend);
        assert_eq!(variant.end_contig(), "chr5");
        assert_eq!(variant.ci_end(), &Interval::point(2000));
        assert_eq!(variant.length(), None);
        // unknown length lands in the first bin
        assert_eq!(variant.bin(), Some(1));
        assert_eq!(variant.search_interval(), *variant.pos_interval());
    }

    #[test]
    fn test_prefilters() {
        let config = TypeConfigBuilder::default()
            .bins(crate::data_types::bins::Bins::from_floors(&[50]).unwrap())
            .build().unwrap();
        let small = ScoredVariant::from_record(&deletion(1000, 1010), VariantSource::Truth, Some(&config)).unwrap();
        assert_eq!(small.prefilter(), Some(FailedReason::FilteredBySettings));

        let mut filtered = deletion(1000, 2000);
        filtered.filters = vec!["LowQual".to_string()];
        let filtered = ScoredVariant::from_record(&filtered, VariantSource::Truth, Some(&config)).unwrap();
        assert_eq!(filtered.prefilter(), Some(FailedReason::FilteredBySettings));

        let skipped = ScoredVariant::from_record(&deletion(1000, 2000), VariantSource::Truth, None).unwrap();
        assert_eq!(skipped.prefilter(), Some(FailedReason::VariantTypeSkipped));
    }

    #[test]
    fn test_known_border_distance() {
        let config = TypeConfig::default();
        let query = ScoredVariant::from_record(&deletion(83895501, 83905001), VariantSource::Query, Some(&config)).unwrap();
        let truth = ScoredVariant::from_record(&deletion(83895314, 83905837), VariantSource::Truth, Some(&config)).unwrap();
        assert_eq!(query.border_distance(&truth), BorderDistance::new(187, 187, 836, 836));
        assert_eq!(truth.border_distance(&query), BorderDistance::new(187, 187, 836, 836));
    }

    #[test]
    fn test_finalize_once() {
        let config = TypeConfig::default();
        let mut variant = ScoredVariant::from_record(&deletion(1000, 2000), VariantSource::Query, Some(&config)).unwrap();
        variant.push_annotation(OverlapAnnotation::new(
            0, Some(VariantId(1)), MatchSet::from_flags(&[MatchFlag::AlleleMatch, MatchFlag::LocalMatch]),
            None, Some(BorderDistance::new(0, 0, 0, 0)), Some(1000), FailedReason::Unset
        ));
        let required = MatchSet::from_flags(&[MatchFlag::AlleleMatch]);
        assert_eq!(variant.finalize(1, required, None).unwrap(), Decision::TruePositive);

        // a second call is rejected and the decision is unchanged
        assert!(matches!(variant.finalize(0, required, None), Err(BenchmarkError::AlreadyFinalized { .. })));
        assert_eq!(variant.decision(), Some(Decision::TruePositive));
        assert_eq!(variant.annotations().len(), 1);
    }

    #[test]
    fn test_finalize_prefiltered() {
        let config = TypeConfig::default();
        let required = MatchSet::from_flags(&[MatchFlag::AlleleMatch]);
        let mut variant = ScoredVariant::from_record(&deletion(1000, 2000), VariantSource::Truth, Some(&config)).unwrap();
        variant.set_prefilter(FailedReason::UnpairedBnd);
        assert_eq!(variant.finalize(1, required, None).unwrap(), Decision::NotAssessed);
        assert_eq!(variant.decision_reason(), FailedReason::UnpairedBnd);

        // matching reasons cannot exclude a record before it was matched
        let mut variant = ScoredVariant::from_record(&deletion(1000, 2000), VariantSource::Truth, Some(&config)).unwrap();
        variant.set_prefilter(FailedReason::LengthMismatch);
        assert!(matches!(variant.finalize(1, required, None), Err(BenchmarkError::InvariantViolation(_))));
        assert_eq!(variant.decision(), None);
    }

    #[test]
    fn test_finalize_limit_and_regions() {
        let config = TypeConfig::default();
        let required = MatchSet::from_flags(&[MatchFlag::AlleleMatch]);
        let annotation = OverlapAnnotation::new(
            0, Some(VariantId(1)), MatchSet::from_flags(&[MatchFlag::AlleleMatch]), None, None, None, FailedReason::Unset
        );

        let mut variant = ScoredVariant::from_record(&deletion(1000, 2000), VariantSource::Truth, Some(&config)).unwrap();
        variant.push_annotation(annotation.clone());
        assert_eq!(variant.finalize(0, required, None).unwrap(), Decision::FalseNegative);
        assert_eq!(variant.decision_reason(), FailedReason::NoOverlap);

        let mut regions = RegionIndex::default();
        regions.insert("15", Interval::half_open(1500, 3000));
        let mut variant = ScoredVariant::from_record(&deletion(1000, 2000), VariantSource::Truth, Some(&config)).unwrap();
        variant.push_annotation(annotation);
        assert_eq!(variant.finalize(1, required, Some(&regions)).unwrap(), Decision::NotAssessed);
        assert_eq!(variant.decision_reason(), FailedReason::OutsideBedRegion);
        assert_eq!(variant.counted_bases(Some(&regions)), vec![Interval::half_open(1500, 2000)]);
    }

    #[test]
    fn test_repeat_counts() {
        let repeat = RepeatInfo::new(Some(b"CAG".to_vec()), None, Some(10.0), vec![12.0, 8.0]);
        assert_eq!(repeat.unit_length(), Some(3));
        let gt = Genotype::parse("1|2", None).unwrap();
        assert_eq!(repeat.haplotype_counts(Some(&gt)), Some(vec![12.0, 8.0]));
        let gt = Genotype::parse("0/1", None).unwrap();
        assert_eq!(repeat.haplotype_counts(Some(&gt)), Some(vec![10.0, 12.0]));
        let gt = Genotype::parse("./1", None).unwrap();
        assert_eq!(repeat.haplotype_counts(Some(&gt)), None);
        assert_eq!(repeat.haplotype_counts(None), None);

        let no_reference = RepeatInfo::new(None, Some(4), None, vec![f64::NAN]);
        let gt = Genotype::parse("0/1", None).unwrap();
        assert_eq!(no_reference.haplotype_counts(Some(&gt)), None);
        assert_eq!(no_reference.valid_allele_counts(), None);
    }
}
