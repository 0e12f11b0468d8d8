//! Analysis backends.
//!
//! The native backend runs the in-process engine. The external backend
//! delegates to a separately installed Go analyzer executable and only
//! trusts what comes back after validating it. The tool's links are
//! returned as reported; they are never re-resolved here.

use crate::core::errors::{Error, Result};
use crate::engine::{analyze_corpus, parse_result, validate_result, Analysis, AnalysisOptions};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info_span};

pub const DEFAULT_TOOL_NAME: &str = "goanalyzer";

pub trait AnalysisBackend {
    fn analyze(&self, root: &Path) -> Result<Analysis>;

    fn name(&self) -> &'static str;
}

#[derive(Clone, Debug, Default)]
pub struct NativeBackend {
    options: AnalysisOptions,
}

impl NativeBackend {
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }
}

impl AnalysisBackend for NativeBackend {
    fn analyze(&self, root: &Path) -> Result<Analysis> {
        analyze_corpus(root, &self.options)
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

/// Runs `<tool> -path <root>` and reads an analysis result from stdout.
#[derive(Clone, Debug)]
pub struct ExternalToolBackend {
    tool: PathBuf,
}

impl ExternalToolBackend {
    /// Locate `tool` (a name on `PATH` or a path to an executable).
    pub fn locate(tool: &str) -> Result<Self> {
        let tool = which::which(tool)
            .map_err(|e| Error::ToolchainUnavailable(format!("{} not found: {}", tool, e)))?;
        Ok(Self { tool })
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }
}

impl AnalysisBackend for ExternalToolBackend {
    fn analyze(&self, root: &Path) -> Result<Analysis> {
        let _span = info_span!("external_analyze", tool = %self.tool.display()).entered();

        let output = Command::new(&self.tool)
            .arg("-path")
            .arg(root)
            .output()
            .map_err(|e| {
                Error::ToolchainUnavailable(format!("failed to run {}: {}", self.tool.display(), e))
            })?;

        if !output.status.success() {
            return Err(Error::ToolFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(bytes = stdout.len(), "external analyzer finished");
        let result = parse_result(&stdout)?;
        validate_result(&result)?;
        Ok(Analysis {
            result,
            diagnostics: Vec::new(),
        })
    }

    fn name(&self) -> &'static str {
        "external"
    }
}
