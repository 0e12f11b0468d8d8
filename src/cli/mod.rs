use crate::backend::DEFAULT_TOOL_NAME;
use crate::io::output::OutputFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod setup;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// In-process extraction and typed matching (default)
    #[default]
    Native,
    /// Delegate to an installed Go analyzer executable
    External,
}

#[derive(Parser, Debug)]
#[command(name = "implmap")]
#[command(about = "Find which Go structs implement which interfaces", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a Go source tree
    Analyze(AnalyzeArgs),

    /// Print the record of one struct
    Lookup(LookupArgs),

    /// Validate a serialized result and re-resolve it without type information
    Reverify(ReverifyArgs),

    /// Write a default .implmap.toml to the current directory
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Corpus root
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format (defaults to the config file, then json)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub extraction: ExtractionArgs,

    /// Which analysis backend to use
    #[arg(long, value_enum, default_value = "native")]
    pub backend: BackendKind,

    /// Analyzer executable for the external backend
    #[arg(long, default_value = DEFAULT_TOOL_NAME)]
    pub tool: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExtractionArgs {
    /// Also analyze _test.go files
    #[arg(long = "include-tests")]
    pub include_tests: bool,

    /// Number of worker threads (0 = all cores)
    #[arg(short = 'j', long = "jobs")]
    pub jobs: Option<usize>,

    /// Disable parallel processing
    #[arg(long = "no-parallel")]
    pub no_parallel: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    /// Struct name
    pub name: String,

    /// Corpus root
    #[arg(default_value = ".")]
    pub path: PathBuf,

    #[command(flatten)]
    pub extraction: ExtractionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ReverifyArgs {
    /// Serialized result to read, or - for stdin
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::try_parse_from(["implmap", "analyze"]).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.path, PathBuf::from("."));
        assert_eq!(args.format, None);
        assert_eq!(args.backend, BackendKind::Native);
        assert_eq!(args.tool, "goanalyzer");
        assert!(!args.extraction.no_parallel);
    }

    #[test]
    fn test_global_verbosity_and_flags() {
        let cli = Cli::try_parse_from([
            "implmap",
            "-vv",
            "analyze",
            "src",
            "--format",
            "terminal",
            "--jobs",
            "2",
            "--include-tests",
        ])
        .unwrap();
        assert_eq!(cli.verbosity, 2);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.format, Some(OutputFormat::Terminal));
        assert_eq!(args.extraction.jobs, Some(2));
        assert!(args.extraction.include_tests);
    }

    #[test]
    fn test_lookup_requires_name() {
        assert!(Cli::try_parse_from(["implmap", "lookup"]).is_err());
        let cli = Cli::try_parse_from(["implmap", "lookup", "Circle", "shapes"]).unwrap();
        let Commands::Lookup(args) = cli.command else {
            panic!("expected lookup");
        };
        assert_eq!(args.name, "Circle");
        assert_eq!(args.path, PathBuf::from("shapes"));
    }
}
