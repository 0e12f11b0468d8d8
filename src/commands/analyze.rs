use super::{spinner, write_output};
use crate::backend::{AnalysisBackend, ExternalToolBackend, NativeBackend};
use crate::cli::setup::{analysis_options, configure_thread_pool};
use crate::cli::{AnalyzeArgs, BackendKind};
use crate::config::ImplmapConfig;
use anyhow::{Context, Result};
use tracing::info;

pub fn analyze_project(args: AnalyzeArgs, config: &ImplmapConfig) -> Result<()> {
    let (options, jobs) = analysis_options(&args.extraction, config);
    configure_thread_pool(jobs);

    let backend: Box<dyn AnalysisBackend> = match args.backend {
        BackendKind::Native => Box::new(NativeBackend::new(options)),
        BackendKind::External => Box::new(ExternalToolBackend::locate(&args.tool)?),
    };
    info!(backend = backend.name(), path = %args.path.display(), "starting analysis");

    let progress = spinner(format!("Analyzing {}", args.path.display()));
    let analysis = backend.analyze(&args.path);
    progress.finish_and_clear();
    let analysis =
        analysis.with_context(|| format!("failed to analyze {}", args.path.display()))?;

    if !analysis.diagnostics.is_empty() {
        info!(
            skipped = analysis.diagnostics.len(),
            "some packages were skipped; run with -v for details"
        );
    }

    let format = args.format.unwrap_or_else(|| config.output_format());
    write_output(format, args.output.as_deref(), &analysis.result)
}
