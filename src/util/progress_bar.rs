
use indicatif::{ProgressState, ProgressStyle};

/// Shared function to pull our progress bar styling
pub fn get_progress_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {msg:>12} {bar:40.cyan/blue} {pos}/{len} ({percent}); ETA: {eta_precise}")
        .unwrap_or_else(|_e| ProgressStyle::default_bar())
        .with_key("percent", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            // a failed write only loses the label
            let _ = write!(w, "{:.1}%", state.fraction() * 100.0);
        })
        .progress_chars("##-")
}
