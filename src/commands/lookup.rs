use crate::cli::setup::{analysis_options, configure_thread_pool};
use crate::cli::LookupArgs;
use crate::config::ImplmapConfig;
use crate::engine::{analyze_corpus, lookup_struct};
use crate::io::output::JsonWriter;
use anyhow::{bail, Context, Result};

pub fn lookup(args: LookupArgs, config: &ImplmapConfig) -> Result<()> {
    let (options, jobs) = analysis_options(&args.extraction, config);
    configure_thread_pool(jobs);

    let analysis = analyze_corpus(&args.path, &options)
        .with_context(|| format!("failed to analyze {}", args.path.display()))?;

    match lookup_struct(&analysis.result, &args.name) {
        Some(found) => {
            JsonWriter::new(std::io::stdout().lock()).write_value(found)?;
            Ok(())
        }
        None => bail!("struct not found: {}", args.name),
    }
}
