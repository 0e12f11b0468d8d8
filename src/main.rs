use anyhow::Result;
use clap::Parser;
use implmap::cli::{Cli, Commands};
use implmap::commands;
use implmap::config::load_config;
use implmap::observability::{init_logging, install_panic_hook};

fn main() -> Result<()> {
    install_panic_hook();
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Analyze(args) => commands::analyze::analyze_project(args, &load_config()),
        Commands::Lookup(args) => commands::lookup::lookup(args, &load_config()),
        Commands::Reverify(args) => commands::reverify::reverify_file(args),
        Commands::Init { force } => commands::init::init_config(force),
    }
}
