
use log::{LevelFilter, error, info};
use std::sync::Arc;
use std::time::Instant;

use svbench::benchmark::run_benchmark;
use svbench::cli::core::{Commands, get_cli};
use svbench::cli::score::{ScoreSettings, check_score_settings};
use svbench::config::EvaluationConfig;
use svbench::parsing::records::{load_evaluation_config, load_records};
use svbench::parsing::regions::load_bed_regions;
use svbench::util::json_io::save_json;
use svbench::writers::summary::SummaryWriter;
use svbench::writers::variant_decisions::write_variant_decisions;

fn run_score(settings: ScoreSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    let filter_level: LevelFilter = match settings.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    let settings = match check_score_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // set up the number of threads for rayon
    match rayon::ThreadPoolBuilder::new().num_threads(settings.threads).build_global() {
        Ok(()) => {},
        Err(e) => {
            error!("Error while building thread pool: {e}");
            std::process::exit(exitcode::OSERR);
        }
    };

    // create the primary output folder
    info!("Creating output folder at {:?}...", settings.output_folder);
    match std::fs::create_dir_all(&settings.output_folder) {
        Ok(()) => {},
        Err(e) => {
            error!("Error while creating output folder: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // save the CLI settings for reproducibility
    let cli_settings_fn = settings.output_folder.join("cli_settings.json");
    info!("Saving CLI settings to {cli_settings_fn:?}...");
    if let Err(e) = save_json(&settings, &cli_settings_fn) {
        error!("Error while saving CLI settings: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    // build the evaluation config from the file and the overrides
    let mut config = match settings.config_filename.as_deref() {
        Some(filename) => match load_evaluation_config(filename) {
            Ok(c) => c,
            Err(e) => {
                error!("Error while loading evaluation config: {e:#}");
                std::process::exit(exitcode::CONFIG);
            }
        },
        None => EvaluationConfig::default()
    };
    if let Some(mode) = settings.mode {
        config.mode = mode;
    }
    if settings.max_matches.is_some() {
        config.set_max_matches(settings.max_matches);
    }
    info!("Evaluation mode: {}", config.mode);
    info!("Scored types: {}", config.types.keys().map(|t| t.to_string()).collect::<Vec<String>>().join(", "));

    if let Some(bed_filename) = settings.include_bed.as_deref() {
        info!("Loading included regions from {bed_filename:?}...");
        match load_bed_regions(bed_filename) {
            Ok(regions) => {
                info!("Loaded included regions covering {} bp", regions.total_length());
                config.set_included_regions(Arc::new(regions));
            },
            Err(e) => {
                error!("Error while loading included regions: {e:#}");
                std::process::exit(exitcode::IOERR);
            }
        };
    }

    // the config is saved after overrides so the run can be reproduced from it
    let config_fn = settings.output_folder.join("evaluation_config.json");
    if let Err(e) = save_json(&config, &config_fn) {
        error!("Error while saving evaluation config: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    let truth = match load_records(&settings.truth_filename, "truth") {
        Ok(r) => r,
        Err(e) => {
            error!("Error while loading truth records: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    let query = match load_records(&settings.query_filename, "query") {
        Ok(r) => r,
        Err(e) => {
            error!("Error while loading query records: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    info!("Starting scoring process...");
    let results = match run_benchmark(&truth, &query, &config) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while scoring: {e:#}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    // now write all the outputs
    let summary_fn = settings.output_folder.join("summary.tsv");
    info!("Saving summary to {summary_fn:?}...");
    let summary_writer = SummaryWriter::new(settings.compare_label.clone());
    if let Err(e) = summary_writer.write_summary(&summary_fn, &results.stats, &config) {
        error!("Error while saving summary: {e}");
        std::process::exit(exitcode::IOERR);
    }

    let stats_fn = settings.output_folder.join("summary.json");
    if let Err(e) = save_json(&results.stats, &stats_fn) {
        error!("Error while saving summary JSON: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    let decisions_fn = settings.output_folder.join("variant_decisions.tsv.gz");
    info!("Saving per-record decisions to {decisions_fn:?}...");
    if let Err(e) = write_variant_decisions(&decisions_fn, &results.arenas) {
        error!("Error while saving per-record decisions: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    let overall = results.stats.overall.event;
    let format_metric = |metric: Option<f64>| metric.map(|m| format!("{m:.4}")).unwrap_or_else(|| "NA".to_string());
    info!("Event recall: {}", format_metric(overall.recall()));
    info!("Event precision: {}", format_metric(overall.precision()));
    info!("Event F1: {}", format_metric(overall.f1()));
    if let Some(bases) = results.stats.overall.base {
        info!("Base recall: {}", format_metric(bases.recall()));
        info!("Base precision: {}", format_metric(bases.precision()));
    }

    info!("Score completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Score(settings) => {
            run_score(*settings);
        }
    }

    info!("Process finished successfully.");
}
