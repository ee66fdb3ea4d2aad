
use anyhow::{bail, Context};
use log::{debug, info};
use rustc_hash::FxHashSet as HashSet;
use std::path::Path;

use crate::config::EvaluationConfig;
use crate::data_types::input_record::InputRecord;
use crate::util::json_io::load_json;

/// Loads a JSON list of records (optionally gzipped).
/// Records without an ID are named by their position in the file, so every record can be reported.
/// # Arguments
/// * `filename` - the JSON file
/// * `label` - label for log and error messages, e.g. "truth"
/// # Errors
/// * if the file cannot be parsed
/// * if two records share an ID
pub fn load_records(filename: &Path, label: &str) -> anyhow::Result<Vec<InputRecord>> {
    info!("Loading {label} records from {filename:?}...");
    let mut records: Vec<InputRecord> = load_json(filename)
        .with_context(|| format!("Error while loading {label} records:"))?;

    let mut ids: HashSet<String> = Default::default();
    for (index, record) in records.iter_mut().enumerate() {
        if record.id.is_empty() || record.id == "." {
            record.id = format!("{label}_{index}");
        }
        if !ids.insert(record.id.clone()) {
            bail!("Duplicate {label} record ID: {:?}", record.id);
        }
    }
    debug!("Loaded {} {label} records", records.len());
    Ok(records)
}

/// Loads an evaluation config. Missing fields take their defaults, and types that are not listed are not scored.
/// # Errors
/// * if the file cannot be parsed
/// * if the config does not validate
pub fn load_evaluation_config(filename: &Path) -> anyhow::Result<EvaluationConfig> {
    let config: EvaluationConfig = load_json(filename)
        .with_context(|| format!("Error while loading evaluation config {filename:?}:"))?;
    config.validate()
        .with_context(|| format!("Invalid evaluation config {filename:?}:"))?;
    Ok(config)
}
