
/*!
Turns finalized records into event and base level counts, per type and per size bin.
*/

use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::benchmark::BenchmarkError;
use crate::config::{EvaluationConfig, TypeConfig};
use crate::data_types::decision::VariantSource;
use crate::data_types::match_set::MatchSet;
use crate::data_types::scored_variant::ScoredVariant;
use crate::data_types::summary_metrics::SummaryMetrics;
use crate::data_types::sv_type::SvType;
use crate::genome_index::RegionIndex;
use crate::interval_store::GenomeIntervalStore;

/// Accepted difference between the summed per-bin base counts of copy number events and the merged overall count.
/// Adjacent calls in different bins can share a few bases, which each bin counts once.
pub const CNV_BASE_COUNT_TOLERANCE: u64 = 5;

/// Counts for one bin (or one overall roll-up)
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BinStats {
    /// Record counts
    pub event: SummaryMetrics,
    /// Base counts, only for types that span reference bases
    pub base: Option<SummaryMetrics>
}

impl BinStats {
    fn new(base_level: bool) -> Self {
        Self {
            event: SummaryMetrics::default(),
            base: base_level.then(SummaryMetrics::default)
        }
    }
}

/// Counts for one variant type
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TypeStats {
    /// All reported bins together
    pub overall: BinStats,
    /// Keyed by bin floor, reported bins only
    pub bins: BTreeMap<u64, BinStats>
}

/// Counts for a full benchmark
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BenchmarkStats {
    /// Per scored type
    pub types: BTreeMap<SvType, TypeStats>,
    /// Every type together; bases only from types that span reference bases
    pub overall: BinStats
}

#[derive(Debug, Default)]
struct SourceStores {
    /// Every counted base
    total: GenomeIntervalStore,
    /// Bases inside true positive overlap windows
    covered: GenomeIntervalStore
}

/// Merged stores for truth and query bases
#[derive(Debug, Default)]
struct BaseAccumulator {
    truth: SourceStores,
    query: SourceStores
}

impl BaseAccumulator {
    /// Adds the counted bases of a record, and the overlap windows of its annotations that meet `required`
    fn add(&mut self, variant: &ScoredVariant, required: MatchSet, regions: Option<&RegionIndex>) {
        let stores = match variant.source() {
            VariantSource::Truth => &mut self.truth,
            VariantSource::Query => &mut self.query
        };
        let contig = variant.contig();
        for interval in variant.counted_bases(regions) {
            stores.total.insert(contig, interval);
        }

        let windows = variant.annotations().iter()
            .filter(|a| a.match_set().satisfies(required))
            .filter_map(|a| a.overlap_window());
        for window in windows {
            match regions {
                Some(r) => {
                    for clipped in r.clip(contig, window) {
                        stores.covered.insert(contig, clipped);
                    }
                },
                None => stores.covered.insert(contig, *window)
            }
        }
    }

    /// True bases are the covered part of the total, and everything else is false
    /// # Errors
    /// * if more false bases are found than there are bases in total
    fn metrics(&self) -> Result<SummaryMetrics, BenchmarkError> {
        let mut metrics = SummaryMetrics::default();
        for (source, stores) in [(VariantSource::Truth, &self.truth), (VariantSource::Query, &self.query)] {
            let total = stores.total.total_length();
            let false_bases = stores.total.uncovered_length(&stores.covered);
            if false_bases > total {
                return Err(BenchmarkError::InvariantViolation(format!(
                    "{} false bases ({false_bases}) exceed total bases ({total})", source.as_ref()
                )));
            }
            metrics.set_source(source, total - false_bases, false_bases);
        }
        Ok(metrics)
    }
}

/// Returns the bin of a record if it should be counted at all
fn counted_bin(variant: &ScoredVariant, type_config: &TypeConfig) -> Option<u64> {
    if !variant.is_eligible() {
        return None;
    }
    variant.bin().filter(|&bin| !type_config.bins().is_skipped(bin))
}

/// Aggregates all records of one type
/// # Arguments
/// * `sv_type` - the type being aggregated
/// * `type_config` - settings for this type
/// * `variants` - finalized records of this type, truth and query
/// * `required` - flags an annotation needs to count its overlap window as true
/// # Errors
/// * if a record was not finalized
/// * if a record landed in a bin that is not configured
/// * if the base counts are inconsistent
pub fn aggregate_type(sv_type: SvType, type_config: &TypeConfig, variants: &[&ScoredVariant], required: MatchSet) -> Result<TypeStats, BenchmarkError> {
    let base_level = sv_type.has_base_level_stats();
    let regions = type_config.included_regions();
    let mut stats = TypeStats {
        overall: BinStats::new(base_level),
        bins: type_config.bins().reported_floors()
            .map(|floor| (floor, BinStats::new(base_level)))
            .collect()
    };
    let mut bin_bases: BTreeMap<u64, BaseAccumulator> = BTreeMap::new();
    let mut overall_bases = BaseAccumulator::default();

    for &variant in variants.iter() {
        let Some(bin) = counted_bin(variant, type_config) else {
            continue;
        };
        let decision = variant.decision()
            .ok_or_else(|| BenchmarkError::NotFinalized { record_id: variant.record_id().to_string() })?;
        let bin_stats = stats.bins.get_mut(&bin)
            .ok_or_else(|| BenchmarkError::InvariantViolation(format!("{} is in unknown bin {bin}", variant.record_id())))?;

        bin_stats.event.add_decision(variant.source(), decision, 1);
        stats.overall.event.add_decision(variant.source(), decision, 1);
        if base_level {
            bin_bases.entry(bin).or_default().add(variant, required, regions);
            overall_bases.add(variant, required, regions);
        }
    }

    if base_level {
        for (bin, accumulator) in bin_bases.iter() {
            if let Some(bin_stats) = stats.bins.get_mut(bin) {
                bin_stats.base = Some(accumulator.metrics()?);
            }
        }
        stats.overall.base = Some(overall_bases.metrics()?);
    }
    debug!("{sv_type} event stats: {:?}", stats.overall.event);
    Ok(stats)
}

/// Aggregates every configured type in parallel, then rolls everything up
/// # Arguments
/// * `variants` - all finalized records
/// * `config` - the evaluation config used to score them
/// # Errors
/// * see `aggregate_type(...)`
pub fn aggregate<'a>(variants: impl IntoIterator<Item=&'a ScoredVariant>, config: &EvaluationConfig) -> Result<BenchmarkStats, BenchmarkError> {
    let required = config.mode.required_match();
    let mut by_type: BTreeMap<SvType, Vec<&ScoredVariant>> = BTreeMap::new();
    for variant in variants.into_iter() {
        by_type.entry(variant.sv_type()).or_default().push(variant);
    }

    let types: BTreeMap<SvType, TypeStats> = config.types.par_iter()
        .map(|(&sv_type, type_config)| {
            let type_variants = by_type.get(&sv_type).map(|v| v.as_slice()).unwrap_or_default();
            aggregate_type(sv_type, type_config, type_variants, required)
                .map(|stats| (sv_type, stats))
        })
        .collect::<Result<Vec<(SvType, TypeStats)>, BenchmarkError>>()?
        .into_iter()
        .collect();

    // the grand total needs its own stores, spans from different types can overlap
    let mut overall = BinStats::new(true);
    let mut overall_bases = BaseAccumulator::default();
    for (sv_type, type_stats) in types.iter() {
        overall.event += type_stats.overall.event;
        if !sv_type.has_base_level_stats() {
            continue;
        }
        let Some(type_config) = config.type_config(*sv_type) else {
            continue;
        };
        for &variant in by_type.get(sv_type).map(|v| v.as_slice()).unwrap_or_default() {
            if counted_bin(variant, type_config).is_some() {
                overall_bases.add(variant, required, type_config.included_regions());
            }
        }
    }
    overall.base = Some(overall_bases.metrics()?);

    Ok(BenchmarkStats { types, overall })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::annotation::{OverlapAnnotation, VariantId};
    use crate::data_types::decision::{Decision, FailedReason};
    use crate::data_types::input_record::InputRecordBuilder;
    use crate::data_types::interval::Interval;
    use crate::data_types::match_set::MatchFlag;

    fn variant(id: &str, source: VariantSource, position: u64, end: u64, window: Option<Interval>) -> ScoredVariant {
        let record = InputRecordBuilder::default()
            .id(id).contig("chr1").position(position).end(end)
            .ref_allele("N").alt_allele("<DEL>").genotype("0/1")
            .build().unwrap();
        let mut variant = ScoredVariant::from_record(&record, source, Some(&TypeConfig::default())).unwrap();
        if let Some(window) = window {
            variant.push_annotation(OverlapAnnotation::new(
                0, Some(VariantId(99)), MatchSet::from_flags(&[MatchFlag::AlleleMatch, MatchFlag::LocalMatch]),
                Some(window), None, None, FailedReason::Unset
            ));
        }
        variant
    }

    fn finalized(mut variant: ScoredVariant) -> ScoredVariant {
        let required = MatchSet::from_flags(&[MatchFlag::AlleleMatch]);
        variant.finalize(1, required, None).unwrap();
        variant
    }

    fn deletion_only() -> EvaluationConfig {
        EvaluationConfig {
            types: [(SvType::Deletion, TypeConfig::default())].into_iter().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_event_and_base_counts() {
        // truth 1000-2000 matched over 1100-2000, truth 5000-5500 missed, query 1100-2100 matched
        let variants = vec![
            finalized(variant("t1", VariantSource::Truth, 1000, 2000, Some(Interval::half_open(1100, 2000)))),
            finalized(variant("t2", VariantSource::Truth, 5000, 5500, None)),
            finalized(variant("q1", VariantSource::Query, 1100, 2100, Some(Interval::half_open(1100, 2000)))),
        ];
        let stats = aggregate(variants.iter(), &deletion_only()).unwrap();

        let deletions = &stats.types[&SvType::Deletion];
        assert_eq!(deletions.overall.event, SummaryMetrics::new(1, 1, 1, 0));
        assert_eq!(deletions.overall.base, Some(SummaryMetrics::new(900, 600, 900, 100)));
        // t2 (500 bp) is in the first bin, t1 and q1 in the 1000 bp bin
        assert_eq!(deletions.bins[&1].event, SummaryMetrics::new(0, 1, 0, 0));
        assert_eq!(deletions.bins[&1000].event, SummaryMetrics::new(1, 0, 1, 0));
        assert_eq!(deletions.bins[&10000].event, SummaryMetrics::default());
        assert_eq!(stats.overall, deletions.overall);
    }

    #[test]
    fn test_not_finalized() {
        let variants = [variant("t1", VariantSource::Truth, 1000, 2000, None)];
        let result = aggregate(variants.iter(), &deletion_only());
        assert!(matches!(result, Err(BenchmarkError::NotFinalized { .. })));
    }

    #[test]
    fn test_skipped_records() {
        let mut filtered = variant("t1", VariantSource::Truth, 1000, 2000, None);
        filtered.set_prefilter(FailedReason::FilteredBySettings);
        let filtered = finalized(filtered);
        assert_eq!(filtered.decision(), Some(Decision::NotAssessed));

        let stats = aggregate([&filtered], &deletion_only()).unwrap();
        assert_eq!(stats.types[&SvType::Deletion].overall, BinStats::new(true));

        // types without base stats have no base counts
        let config = EvaluationConfig {
            types: [(SvType::Insertion, TypeConfig::default_for(SvType::Insertion))].into_iter().collect(),
            ..Default::default()
        };
        let stats = aggregate([&filtered], &config).unwrap();
        assert_eq!(stats.types[&SvType::Insertion].overall.base, None);
        assert_eq!(stats.overall.base, Some(SummaryMetrics::default()));
    }
}
