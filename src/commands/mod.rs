pub mod analyze;
pub mod init;
pub mod lookup;
pub mod reverify;

use crate::core::model::AnalysisResult;
use crate::io::output::{create_writer, OutputFormat};
use crate::observability::{set_phase_persistent, AnalysisPhase};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Write `result` to `output` (a file) or stdout.
pub(crate) fn write_output(
    format: OutputFormat,
    output: Option<&Path>,
    result: &AnalysisResult,
) -> Result<()> {
    set_phase_persistent(AnalysisPhase::OutputGeneration);
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            colored::control::set_override(false);
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };
    create_writer(format, writer).write_results(result)?;
    Ok(())
}

/// Spinner on stderr; hidden automatically when stderr is not a terminal.
pub(crate) fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
