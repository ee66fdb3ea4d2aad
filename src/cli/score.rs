
use anyhow::bail;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_optional_filename, check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::config::EvaluationMode;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct ScoreSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    svbench_version: String,

    /// Truth records (JSON, optionally gzipped)
    #[clap(required = true)]
    #[clap(short = 't')]
    #[clap(long = "truth")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub truth_filename: PathBuf,

    /// Query records (JSON, optionally gzipped)
    #[clap(required = true)]
    #[clap(short = 'q')]
    #[clap(long = "query")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub query_filename: PathBuf,

    /// Evaluation config; every type is scored with default settings if omitted
    #[clap(short = 'c')]
    #[clap(long = "config")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub config_filename: Option<PathBuf>,

    /// Included regions (BED); records not fully inside are not assessed
    #[clap(short = 'b')]
    #[clap(long = "include-bed")]
    #[clap(value_name = "BED")]
    #[clap(help_heading = Some("Input/Output"))]
    pub include_bed: Option<PathBuf>,

    /// Output directory containing the summary and decision files
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_folder: PathBuf,

    /// Optional comparison label for the summary output
    #[clap(long = "label")]
    #[clap(value_name = "LABEL")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "score")]
    pub compare_label: String,

    /// Evaluation mode, overrides the mode in the config [default: sc]
    #[clap(short = 'm')]
    #[clap(long = "mode")]
    #[clap(value_name = "MODE")]
    #[clap(help_heading = Some("Scoring parameters"))]
    pub mode: Option<EvaluationMode>,

    /// Maximum retained matches per record for every type, overrides the config [default: ALT allele count]
    #[clap(long = "max-matches")]
    #[clap(value_name = "INT")]
    #[clap(help_heading = Some("Scoring parameters"))]
    pub max_matches: Option<usize>,

    /// Number of threads to use in the benchmarking step
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_score_settings(mut settings: ScoreSettings) -> anyhow::Result<ScoreSettings> {
    // hard code the version in
    settings.svbench_version = FULL_VERSION.clone();
    info!("SVbench version: {:?}", &settings.svbench_version);
    info!("Sub-command: score");
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.truth_filename, "Truth records")?;
    check_required_filename(&settings.query_filename, "Query records")?;
    check_optional_filename(settings.config_filename.as_deref(), "Evaluation config")?;
    check_optional_filename(settings.include_bed.as_deref(), "Included regions")?;

    // dump stuff to the logger
    info!("\tTruth: {:?}", &settings.truth_filename);
    info!("\tQuery: {:?}", &settings.query_filename);
    match settings.config_filename.as_deref() {
        Some(filename) => info!("\tConfig: {filename:?}"),
        None => info!("\tConfig: default")
    };
    match settings.include_bed.as_deref() {
        Some(filename) => info!("\tIncluded regions: {filename:?}"),
        None => info!("\tIncluded regions: None")
    };

    // outputs
    info!("Outputs:");
    info!("\tCompare label: {:?}", &settings.compare_label);
    info!("\tOutput folder: {:?}", &settings.output_folder);
    if settings.compare_label.contains(['\t', '\n']) {
        bail!("--label cannot contain tabs or newlines");
    }

    info!("Scoring parameters:");
    match settings.mode {
        Some(mode) => info!("\tMode: {mode}"),
        None => info!("\tMode: from config")
    };
    if let Some(max_matches) = settings.max_matches {
        info!("\tMax matches: {max_matches}");
    }

    if settings.threads == 0 {
        settings.threads = 1;
    }
    info!("Processing threads: {}", settings.threads);

    Ok(settings)
}
