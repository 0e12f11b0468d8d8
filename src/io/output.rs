use crate::core::errors::Result;
use crate::core::model::{AnalysisResult, StructInfo};
use clap::ValueEnum;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Terminal,
}

pub trait OutputWriter {
    fn write_results(&mut self, results: &AnalysisResult) -> Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write any serializable value, e.g. a single struct record.
    pub fn write_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_results(&mut self, results: &AnalysisResult) -> Result<()> {
        self.write_value(results)
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_results(&mut self, results: &AnalysisResult) -> Result<()> {
        self.write_header(results)?;
        self.write_struct_table(results)?;
        self.write_implementors(results)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> TerminalWriter<W> {
    fn write_header(&mut self, results: &AnalysisResult) -> Result<()> {
        writeln!(self.writer, "{}", "Interface Implementations".bold().underline())?;
        writeln!(
            self.writer,
            "{} interfaces, {} structs",
            results.interfaces.len().to_string().cyan(),
            results.structs.len().to_string().cyan()
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_struct_table(&mut self, results: &AnalysisResult) -> Result<()> {
        if results.structs.is_empty() {
            writeln!(self.writer, "{}", "No structs found.".dimmed())?;
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Struct", "Location", "Methods", "Implements"]);

        for s in &results.structs {
            table.add_row(vec![
                Cell::new(&s.name).fg(Color::Cyan),
                Cell::new(s.position.to_string()),
                Cell::new(s.methods.len()),
                implements_cell(s),
            ]);
        }
        writeln!(self.writer, "{}", table)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_implementors(&mut self, results: &AnalysisResult) -> Result<()> {
        // same-named interfaces from different packages are listed once
        let mut by_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for interface in &results.interfaces {
            by_name
                .entry(interface.name.as_str())
                .or_insert_with(|| results.implementors_of(&interface.name));
        }

        for (name, implementors) in by_name {
            let label = format!("{}:", name).bold();
            if implementors.is_empty() {
                writeln!(self.writer, "{} {}", label, "no implementations".yellow())?;
            } else {
                writeln!(self.writer, "{} {}", label, implementors.join(", ").green())?;
            }
        }
        Ok(())
    }
}

fn implements_cell(s: &StructInfo) -> Cell {
    if s.implemented_interfaces.is_empty() {
        return Cell::new("-").fg(Color::DarkGrey);
    }
    let names: Vec<&str> = s
        .implemented_interfaces
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    Cell::new(names.join(", ")).fg(Color::Green)
}

pub fn create_writer<'w, W: Write + 'w>(
    format: OutputFormat,
    writer: W,
) -> Box<dyn OutputWriter + 'w> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}
