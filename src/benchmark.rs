
/*!
A benchmark session: prepares records, matches every query against the truth, finalizes every record, and aggregates.
*/

use indicatif::ParallelProgressIterator;
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap as HashMap;
use std::collections::BTreeMap;

use crate::config::{ConfigError, EvaluationConfig};
use crate::data_types::annotation::{OverlapAnnotation, VariantId};
use crate::data_types::decision::{FailedReason, VariantSource};
use crate::data_types::input_record::InputRecord;
use crate::data_types::scored_variant::ScoredVariant;
use crate::data_types::sv_type::SvType;
use crate::genome_index::{CoitreeGenomeIndex, IndexError};
use crate::matcher::{match_query, MatchParameters};
use crate::statistics::{aggregate, BenchmarkStats};
use crate::util::progress_bar::get_progress_style;

#[derive(thiserror::Error, Debug)]
pub enum BenchmarkError {
    #[error("record {record_id:?} was finalized more than once")]
    AlreadyFinalized { record_id: String },
    #[error("record {record_id:?} reached aggregation without a decision")]
    NotFinalized { record_id: String },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("error while indexing truth records: {0}")]
    Index(#[from] IndexError)
}

/// Owns every record of one partition, so annotations can refer to each other by index.
/// Tags are unique within the arena, which is all that detaching needs.
#[derive(Debug, Default)]
pub struct VariantArena {
    /// Records, where the position is the `VariantId`
    variants: Vec<ScoredVariant>,
    /// Next tag to hand out
    next_tag: u64
}

impl VariantArena {
    /// Adds a record and returns its ID
    pub fn push(&mut self, mut variant: ScoredVariant) -> VariantId {
        let id = VariantId(self.variants.len());
        variant.set_id(id);
        self.variants.push(variant);
        id
    }

    /// Returns a record; IDs are only ever handed out by this arena
    pub fn get(&self, id: VariantId) -> &ScoredVariant {
        &self.variants[id.0]
    }

    pub fn get_mut(&mut self, id: VariantId) -> &mut ScoredVariant {
        &mut self.variants[id.0]
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=&ScoredVariant> {
        self.variants.iter()
    }

    /// Hands out a fresh tag
    pub fn next_tag(&mut self) -> u64 {
        let tag = self.next_tag;
        self.next_tag += 1;
        tag
    }

    /// Attaches an annotation to `owner` and its mirror to `counterpart`
    /// # Arguments
    /// * `owner` - the record the annotation is written from
    /// * `owner_bin` - bin of the owner, reported on the mirrored side
    /// * `counterpart` - the other record of the pair
    /// * `annotation` - the annotation as seen from `owner`
    pub fn attach_pair(&mut self, owner: VariantId, owner_bin: Option<u64>, counterpart: VariantId, annotation: OverlapAnnotation) {
        let mirrored = annotation.mirrored(owner, owner_bin);
        self.get_mut(counterpart).push_annotation(mirrored);
        self.get_mut(owner).push_annotation(annotation);
    }

    /// Attaches an annotation that only describes `owner`
    pub fn attach_self(&mut self, owner: VariantId, annotation: OverlapAnnotation) {
        self.get_mut(owner).push_annotation(annotation);
    }

    /// Removes the mirror of an annotation that was taken off `owner`.
    /// Returns true if the counterpart had it.
    pub fn detach(&mut self, owner: VariantId, annotation: &OverlapAnnotation) -> bool {
        match annotation.counterpart() {
            Some(counterpart) => self.get_mut(counterpart).detach(annotation.tag(), owner),
            None => false
        }
    }
}

/// Converts parsed records into scoring records.
/// Records that cannot be classified are logged and skipped.
/// Only one record of each breakend pair is scored: the mate with the lower (contig, position, ID), so both call sets
/// describe a junction from the same side regardless of record order. Breakends whose mate is missing are not assessed.
/// # Arguments
/// * `records` - parsed records
/// * `source` - truth or query
/// * `config` - evaluation config
pub fn prepare_variants(records: &[InputRecord], source: VariantSource, config: &EvaluationConfig) -> Vec<ScoredVariant> {
    let mut skipped: usize = 0;
    let mut prepared: Vec<(&InputRecord, ScoredVariant)> = Vec::with_capacity(records.len());
    for record in records.iter() {
        let type_config = record.classify().ok()
            .and_then(|sv_type| config.type_config(sv_type));
        match ScoredVariant::from_record(record, source, type_config) {
            Ok(v) => prepared.push((record, v)),
            Err(e) => {
                warn!("Skipping {} record: {e}", source.as_ref());
                skipped += 1;
            }
        };
    }

    // sort keys of every usable breakend, by record ID
    let breakend_keys: HashMap<&str, (&str, u64, &str)> = prepared.iter()
        .filter(|(_, v)| v.sv_type().is_breakend())
        .map(|(r, _)| (r.id.as_str(), (r.contig.as_str(), r.position, r.id.as_str())))
        .collect();

    let mut dropped_mates: usize = 0;
    let mut variants = Vec::with_capacity(prepared.len());
    for (record, mut variant) in prepared.into_iter() {
        if variant.sv_type().is_breakend() {
            if let Some(mate_id) = record.mate_id.as_deref() {
                match breakend_keys.get(mate_id) {
                    Some(&mate_key) => {
                        let own_key = (record.contig.as_str(), record.position, record.id.as_str());
                        if own_key > mate_key {
                            // the mate represents this junction
                            dropped_mates += 1;
                            continue;
                        }
                    },
                    None => variant.set_prefilter(FailedReason::UnpairedBnd)
                }
            }
        }
        variants.push(variant);
    }

    info!("Prepared {} {} records ({skipped} skipped, {dropped_mates} breakend mates merged)", variants.len(), source.as_ref());
    variants
}

/// Records of one partition, truth first
#[derive(Debug, Default)]
struct Partition {
    truth: Vec<ScoredVariant>,
    query: Vec<ScoredVariant>
}

/// Matches and finalizes one partition
/// # Errors
/// * if the truth index cannot be built
/// * if a record is finalized twice
fn score_partition(family: SvType, partition: Partition, config: &EvaluationConfig) -> Result<VariantArena, BenchmarkError> {
    let mut arena = VariantArena::default();
    let truth_ids: Vec<VariantId> = partition.truth.into_iter().map(|v| arena.push(v)).collect();
    let query_ids: Vec<VariantId> = partition.query.into_iter().map(|v| arena.push(v)).collect();

    let index = CoitreeGenomeIndex::new(
        truth_ids.iter()
            .map(|&id| arena.get(id))
            .filter(|v| v.is_eligible())
    )?;
    debug!("{family} partition: {} indexed truth, {} query", index.len(), query_ids.len());

    // queries share truth annotations, so they run one at a time
    for &query_id in query_ids.iter() {
        let query = arena.get(query_id);
        if !query.is_eligible() {
            continue;
        }
        let Some(type_config) = config.type_config(query.sv_type()) else {
            continue;
        };
        let params = MatchParameters::from_config(config.mode, type_config);
        match_query(&mut arena, query_id, &index, &params);
    }

    let required = config.mode.required_match();
    for &id in truth_ids.iter().chain(query_ids.iter()) {
        let variant = arena.get_mut(id);
        let type_config = config.type_config(variant.sv_type());
        let limit = variant.match_limit(type_config.and_then(|c| c.max_matches()));
        let regions = type_config.and_then(|c| c.included_regions());
        variant.finalize(limit, required, regions)?;
    }
    Ok(arena)
}

/// Everything produced by a benchmark
#[derive(Debug)]
pub struct BenchmarkResults {
    /// One arena per partition; annotation counterparts refer to records in the same arena
    pub arenas: Vec<VariantArena>,
    /// Aggregated counts
    pub stats: BenchmarkStats
}

impl BenchmarkResults {
    /// All finalized records
    pub fn variants(&self) -> impl Iterator<Item=&ScoredVariant> {
        self.arenas.iter().flat_map(|a| a.iter())
    }
}

/// Runs a full benchmark of `query` against `truth`
/// # Arguments
/// * `truth` - parsed truth records
/// * `query` - parsed query records
/// * `config` - evaluation config, including any included regions
/// # Errors
/// * if the config is invalid
/// * if scoring or aggregation hits an internal inconsistency
pub fn run_benchmark(truth: &[InputRecord], query: &[InputRecord], config: &EvaluationConfig) -> anyhow::Result<BenchmarkResults> {
    config.validate().map_err(BenchmarkError::from)?;

    let truth_variants = prepare_variants(truth, VariantSource::Truth, config);
    let query_variants = prepare_variants(query, VariantSource::Query, config);

    // types that can annotate each other must share an arena
    let cross_type = config.mode.cross_type_enabled();
    let mut partitions: BTreeMap<SvType, Partition> = BTreeMap::new();
    for variant in truth_variants.into_iter() {
        partitions.entry(variant.sv_type().family(cross_type)).or_default().truth.push(variant);
    }
    for variant in query_variants.into_iter() {
        partitions.entry(variant.sv_type().family(cross_type)).or_default().query.push(variant);
    }

    info!("Scoring {} variant type partitions...", partitions.len());
    let arenas: Vec<VariantArena> = partitions.into_iter()
        .collect::<Vec<(SvType, Partition)>>()
        .into_par_iter()
        .map(|(family, partition)| score_partition(family, partition, config))
        .progress_with_style(get_progress_style())
        .collect::<Result<Vec<VariantArena>, BenchmarkError>>()?;

    info!("Aggregating statistics...");
    let stats = aggregate(arenas.iter().flat_map(|a| a.iter()), config)?;
    Ok(BenchmarkResults { arenas, stats })
}
