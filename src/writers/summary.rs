
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::config::EvaluationConfig;
use crate::data_types::summary_metrics::SummaryMetrics;
use crate::statistics::{BenchmarkStats, BinStats};

pub const LEVEL_EVENT: &str = "EVENT";
pub const LEVEL_BASE: &str = "BASE";
pub const ALL_LABEL: &str = "ALL";

/// This is a wrapper for writing out summary stats to a file
pub struct SummaryWriter {
    /// Comparison label to go on each row
    compare_label: String
}

/// Contains all the data written to each row of our stats file
#[derive(Serialize)]
struct SummaryRow {
    /// User provided label
    compare_label: String,
    /// The type of variant represented by this row
    variant_type: String,
    /// Length bin, or ALL
    bin: String,
    /// EVENT or BASE
    level: String,
    /// Total number of truth entries
    truth_total: u64,
    /// Total number of true positives in truth
    truth_tp: u64,
    /// Total number of false negatives
    truth_fn: u64,
    /// Total number of query entries
    query_total: u64,
    /// Total number of true positives in query
    query_tp: u64,
    /// Total number of false positives
    query_fp: u64,
    /// Recall = truth.TP / (truth.TP+truth.FN)
    metric_recall: Option<f64>,
    /// Precision = query.TP / (query.TP + query.FP)
    metric_precision: Option<f64>,
    /// F1 = combination score of recall and precision
    metric_f1: Option<f64>
}

impl SummaryRow {
    /// Creates a new row from labels and summary metrics
    pub fn new(compare_label: String, variant_type: String, bin: String, level: String, metrics: &SummaryMetrics) -> Self {
        Self {
            compare_label,
            variant_type, bin, level,
            truth_total: metrics.truth_total(),
            truth_tp: metrics.truth_tp,
            truth_fn: metrics.truth_fn,
            query_total: metrics.query_total(),
            query_tp: metrics.query_tp,
            query_fp: metrics.query_fp,
            metric_recall: metrics.recall(),
            metric_precision: metrics.precision(),
            metric_f1: metrics.f1(),
        }
    }
}

impl SummaryWriter {
    pub fn new(compare_label: String) -> Self {
        Self { compare_label }
    }

    /// Will write the summary out to the given file path.
    /// The overall rows come first, then each type with its overall row followed by its bins.
    /// # Arguments
    /// * `filename` - the filename for the output (tsv/csv)
    /// * `stats` - the aggregated counts
    /// * `config` - the config used, for bin labels
    pub fn write_summary(&self, filename: &Path, stats: &BenchmarkStats, config: &EvaluationConfig) -> csv::Result<()> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;

        self.write_bin(&mut csv_writer, ALL_LABEL, ALL_LABEL.to_string(), &stats.overall)?;
        for (sv_type, type_stats) in stats.types.iter() {
            let type_label = sv_type.as_ref();
            self.write_bin(&mut csv_writer, type_label, ALL_LABEL.to_string(), &type_stats.overall)?;

            for (&floor, bin_stats) in type_stats.bins.iter() {
                let bin_label = match config.type_config(*sv_type) {
                    Some(type_config) => type_config.bins().label(floor),
                    None => floor.to_string()
                };
                self.write_bin(&mut csv_writer, type_label, bin_label, bin_stats)?;
            }
        }

        // save everything
        csv_writer.flush()?;
        Ok(())
    }

    /// Writes the event row, and the base row if there is one
    fn write_bin(&self, csv_writer: &mut csv::Writer<File>, variant_type: &str, bin: String, bin_stats: &BinStats) -> csv::Result<()> {
        let event_row = SummaryRow::new(
            self.compare_label.clone(), variant_type.to_string(), bin.clone(), LEVEL_EVENT.to_string(), &bin_stats.event
        );
        csv_writer.serialize(&event_row)?;

        if let Some(base) = bin_stats.base.as_ref() {
            let base_row = SummaryRow::new(
                self.compare_label.clone(), variant_type.to_string(), bin, LEVEL_BASE.to_string(), base
            );
            csv_writer.serialize(&base_row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::sv_type::SvType;
    use crate::statistics::TypeStats;

    #[test]
    fn test_write_summary() {
        let mut stats = BenchmarkStats::default();
        let deletions = TypeStats {
            overall: BinStats { event: SummaryMetrics::new(1, 1, 1, 0), base: Some(SummaryMetrics::new(900, 600, 900, 100)) },
            bins: [
                (1, BinStats { event: SummaryMetrics::new(0, 1, 0, 0), base: Some(SummaryMetrics::new(0, 500, 0, 0)) }),
                (1000, BinStats { event: SummaryMetrics::new(1, 0, 1, 0), base: Some(SummaryMetrics::new(900, 100, 900, 100)) })
            ].into_iter().collect()
        };
        stats.overall = deletions.overall.clone();
        stats.types.insert(SvType::Deletion, deletions);

        let filename = std::env::temp_dir().join(format!("svbench_{}_summary.tsv", std::process::id()));
        SummaryWriter::new("test".to_string())
            .write_summary(&filename, &stats, &EvaluationConfig::default())
            .unwrap();

        let contents = std::fs::read_to_string(&filename).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        // header, 2 overall rows, 2 type rows, and 2 rows per bin
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("compare_label\tvariant_type\tbin\tlevel"));
        assert!(lines[3].starts_with("test\tDEL\tALL\tEVENT\t2\t1\t1\t1\t1\t0\t0.5\t1.0"));
        assert!(lines[5].starts_with("test\tDEL\t[1,1000)\tEVENT"));
        assert!(lines[7].starts_with("test\tDEL\t[1000,10000)\tEVENT"));
        std::fs::remove_file(filename).unwrap();
    }
}
