use super::write_output;
use crate::cli::ReverifyArgs;
use crate::engine::reverify;
use crate::io::output::OutputFormat;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

pub fn reverify_file(args: ReverifyArgs) -> Result<()> {
    let json = read_input(&args.input)?;
    let result = reverify(&json)
        .with_context(|| format!("invalid analysis result in {}", args.input.display()))?;
    write_output(OutputFormat::Json, args.output.as_deref(), &result)
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut json = String::new();
        std::io::stdin()
            .read_to_string(&mut json)
            .context("failed to read stdin")?;
        return Ok(json);
    }
    std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}
