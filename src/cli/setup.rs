//! Runtime setup: thread pool and option resolution.
//!
//! Command-line flags override `.implmap.toml`, which overrides the
//! built-in defaults.

use crate::cli::ExtractionArgs;
use crate::config::ImplmapConfig;
use crate::engine::AnalysisOptions;

/// Rayon thread stack size; tree-sitter walks recurse on deeply nested types
const RAYON_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Configure the rayon global thread pool once at startup
pub fn configure_thread_pool(jobs: usize) {
    let mut builder = rayon::ThreadPoolBuilder::new().stack_size(RAYON_STACK_SIZE);

    if jobs > 0 {
        builder = builder.num_threads(jobs);
    }

    if let Err(e) = builder.build_global() {
        tracing::debug!("thread pool already configured: {}", e);
    }
}

/// Worker count a `jobs` setting resolves to
pub fn get_worker_count(jobs: usize) -> usize {
    if jobs == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    } else {
        jobs
    }
}

/// Merge flags and configuration into analysis options.
/// Returns the options and the resolved job count.
pub fn analysis_options(args: &ExtractionArgs, config: &ImplmapConfig) -> (AnalysisOptions, usize) {
    let analysis = config.analysis();
    let options = AnalysisOptions {
        include_tests: args.include_tests || analysis.include_tests,
        position_segments: analysis.position_segments,
        ignore_patterns: config.ignore_patterns(),
        parallel: analysis.parallel && !args.no_parallel,
        ..AnalysisOptions::default()
    };
    (options, args.jobs.unwrap_or(analysis.jobs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, IgnoreConfig};

    #[test]
    fn test_flags_override_config() {
        let config = ImplmapConfig {
            analysis: Some(AnalysisConfig {
                include_tests: false,
                position_segments: 2,
                parallel: true,
                jobs: 8,
            }),
            ignore: Some(IgnoreConfig {
                patterns: vec!["gen/**".into()],
            }),
            output: None,
        };
        let args = ExtractionArgs {
            include_tests: true,
            jobs: Some(1),
            no_parallel: true,
        };

        let (options, jobs) = analysis_options(&args, &config);
        assert!(options.include_tests);
        assert!(!options.parallel);
        assert_eq!(options.position_segments, 2);
        assert_eq!(options.ignore_patterns, vec!["gen/**"]);
        assert_eq!(jobs, 1);
    }

    #[test]
    fn test_config_used_without_flags() {
        let (options, jobs) = analysis_options(&ExtractionArgs::default(), &ImplmapConfig::default());
        assert!(options.parallel);
        assert_eq!(options.position_segments, 3);
        assert_eq!(jobs, 0);
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(get_worker_count(3), 3);
        assert!(get_worker_count(0) >= 1);
    }
}
