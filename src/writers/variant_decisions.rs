
use anyhow::Context;
use itertools::Itertools;
use serde::Serialize;
use std::path::Path;

use crate::benchmark::VariantArena;
use crate::data_types::scored_variant::ScoredVariant;
use crate::util::json_io::open_writer;

/// One row per record, explaining how it was classified
#[derive(Serialize)]
struct DecisionRow<'a> {
    /// TRUTH or QUERY
    source: String,
    /// Record ID from the input
    record_id: &'a str,
    /// Scored type
    variant_type: String,
    /// Contig of the record
    contig: &'a str,
    /// 0-based start of the scored span
    start: u64,
    /// 0-based exclusive end of the scored span
    end: u64,
    /// Variant length, if known
    length: Option<u64>,
    /// Bin floor, if the record fit a bin
    bin: Option<u64>,
    /// TP, FP, FN, or N
    decision: String,
    /// Reason for the decision
    reason: String,
    /// Flags of the best retained annotation
    best_match: String,
    /// Border distance to the best counterpart
    border_distance: Option<String>,
    /// Overlap window with the best counterpart
    overlap_window: Option<String>,
    /// Record IDs of every retained counterpart, best first
    counterparts: String
}

impl<'a> DecisionRow<'a> {
    fn new(variant: &'a ScoredVariant, arena: &'a VariantArena) -> Self {
        let best = variant.annotations().first();
        let counterparts = variant.annotations().iter()
            .filter_map(|a| a.counterpart())
            .map(|id| arena.get(id).record_id())
            .unique()
            .join(",");
        Self {
            source: variant.source().as_ref().to_string(),
            record_id: variant.record_id(),
            variant_type: variant.sv_type().to_string(),
            contig: variant.contig(),
            start: variant.base_interval().start(),
            end: variant.base_interval().stop(),
            length: variant.length(),
            bin: variant.bin(),
            decision: variant.decision().map(|d| d.as_ref().to_string()).unwrap_or_else(|| ".".to_string()),
            reason: variant.decision_reason().as_ref().to_string(),
            best_match: best.map(|a| a.match_set().to_string()).unwrap_or_else(|| ".".to_string()),
            border_distance: best.and_then(|a| a.border_distance()).map(|d| d.to_string()),
            overlap_window: best.and_then(|a| a.overlap_window()).map(|w| w.to_string()),
            counterparts
        }
    }
}

/// Writes every finalized record of every arena to a TSV (or CSV if the name ends in .csv), optionally gzipped
/// # Arguments
/// * `filename` - output path
/// * `arenas` - the scored partitions
/// # Errors
/// * if the file cannot be created or written
pub fn write_variant_decisions(filename: &Path, arenas: &[VariantArena]) -> anyhow::Result<()> {
    let plain_name = filename.to_string_lossy();
    let is_csv = plain_name.trim_end_matches(".gz").ends_with(".csv");
    let delimiter: u8 = if is_csv { b',' } else { b'\t' };
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(open_writer(filename)?);

    for arena in arenas.iter() {
        for variant in arena.iter() {
            csv_writer.serialize(DecisionRow::new(variant, arena))
                .with_context(|| format!("Error while writing to {filename:?}:"))?;
        }
    }
    csv_writer.flush()
        .with_context(|| format!("Error while flushing {filename:?}:"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::run_benchmark;
    use crate::config::EvaluationConfig;
    use crate::data_types::input_record::InputRecordBuilder;

    #[test]
    fn test_write_variant_decisions() {
        let deletion = |id: &str, position: u64, end: u64| InputRecordBuilder::default()
            .id(id).contig("chr1").position(position).end(end)
            .ref_allele("N").alt_allele("<DEL>").genotype("0/1")
            .build().unwrap();
        let truth = vec![deletion("t1", 10_000, 12_000)];
        let query = vec![deletion("q1", 10_050, 12_020), deletion("q2", 50_000, 50_500)];
        let results = run_benchmark(&truth, &query, &EvaluationConfig::default()).unwrap();

        let filename = std::env::temp_dir().join(format!("svbench_{}_decisions.tsv", std::process::id()));
        write_variant_decisions(&filename, &results.arenas).unwrap();
        let contents = std::fs::read_to_string(&filename).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("source\trecord_id\tvariant_type"));
        assert!(lines[1].starts_with("TRUTH\tt1\tDEL\tchr1\t10000\t12000\t2000\t1000\tTP\t"));
        assert!(lines[1].ends_with("\tq1"));
        assert!(lines[2].starts_with("QUERY\tq1\tDEL"));
        assert!(lines[2].ends_with("\tt1"));
        assert!(lines[3].starts_with("QUERY\tq2\tDEL\tchr1\t50000\t50500\t500\t1\tFP\tNoOverlap"));
        std::fs::remove_file(filename).unwrap();
    }
}
