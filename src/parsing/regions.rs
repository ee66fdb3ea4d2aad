
use anyhow::{anyhow, bail, Context};
use log::debug;
use std::path::Path;

use crate::data_types::interval::Interval;
use crate::genome_index::RegionIndex;
use crate::util::json_io::open_reader;

/// Loads a BED file of included regions. Coordinates are 0-based half-open, so they map directly onto our intervals.
/// Comment lines ('#'), `track` and `browser` lines are ignored, and anything past the third column is ignored.
/// # Arguments
/// * `filename` - the BED file, optionally gzipped
/// # Errors
/// * if the file cannot be opened or read
/// * if a row is missing columns or has invalid coordinates
pub fn load_bed_regions(filename: &Path) -> anyhow::Result<RegionIndex> {
    let reader = open_reader(filename)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);

    let mut regions = RegionIndex::default();
    let mut row_count: usize = 0;
    for (row_index, result) in csv_reader.records().enumerate() {
        let row = result.with_context(|| format!("Error while reading {filename:?}"))?;
        let chrom = row.get(0).ok_or(anyhow!("Missing chrom on row {row_index}: {row:?}"))?;
        if chrom.is_empty() || chrom.starts_with("track") || chrom.starts_with("browser") {
            continue;
        }

        let parse_coordinate = |column: usize, label: &str| -> anyhow::Result<u64> {
            row.get(column)
                .ok_or(anyhow!("Missing {label} on row {row_index}: {row:?}"))?
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid {label} on row {row_index}: {row:?}"))
        };
        let start = parse_coordinate(1, "start")?;
        let end = parse_coordinate(2, "end")?;
        if end < start {
            bail!("End before start on row {row_index}: {row:?}");
        }
        if end > start {
            regions.insert(chrom, Interval::half_open(start, end));
            row_count += 1;
        }
    }

    debug!("Loaded {row_count} regions covering {} bp from {filename:?}", regions.total_length());
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let filename = std::env::temp_dir().join(format!("svbench_{}_{name}", std::process::id()));
        let mut file = std::fs::File::create(&filename).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        filename
    }

    #[test]
    fn test_load_bed_regions() {
        let filename = write_temp("regions.bed", "#chrom\tstart\tend\nchr1\t100\t200\tname\nchr1\t150\t300\nchr2\t0\t10\nchr2\t5\t5\n");
        let regions = load_bed_regions(&filename).unwrap();
        assert_eq!(regions.total_length(), 210);
        assert!(regions.contains("chr1", &Interval::half_open(120, 290)));
        assert!(!regions.contains("chr1", &Interval::half_open(90, 110)));
        assert!(regions.contains("chr2", &Interval::half_open(0, 10)));
        std::fs::remove_file(filename).unwrap();
    }

    #[test]
    fn test_bad_bed() {
        let filename = write_temp("bad.bed", "chr1\t300\t200\n");
        assert!(load_bed_regions(&filename).is_err());
        std::fs::remove_file(&filename).unwrap();

        let filename = write_temp("short.bed", "chr1\t300\n");
        assert!(load_bed_regions(&filename).is_err());
        std::fs::remove_file(filename).unwrap();
    }
}
