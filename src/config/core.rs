use crate::io::output::OutputFormat;
use serde::{Deserialize, Serialize};

/// Root configuration structure for implmap
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ImplmapConfig {
    /// Extraction behaviour
    #[serde(default)]
    pub analysis: Option<AnalysisConfig>,

    /// Ignore patterns
    #[serde(default)]
    pub ignore: Option<IgnoreConfig>,

    /// Output configuration
    #[serde(default)]
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Also extract `_test.go` files
    #[serde(default)]
    pub include_tests: bool,

    /// Path components kept in reported positions
    #[serde(default = "default_position_segments")]
    pub position_segments: usize,

    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Worker threads; 0 lets rayon decide
    #[serde(default)]
    pub jobs: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include_tests: false,
            position_segments: default_position_segments(),
            parallel: default_parallel(),
            jobs: 0,
        }
    }
}

pub fn default_position_segments() -> usize {
    3
}

pub fn default_parallel() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IgnoreConfig {
    /// Glob patterns matched against paths relative to the corpus root
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

impl ImplmapConfig {
    pub fn analysis(&self) -> AnalysisConfig {
        self.analysis.clone().unwrap_or_default()
    }

    pub fn ignore_patterns(&self) -> Vec<String> {
        self.ignore
            .as_ref()
            .map(|i| i.patterns.clone())
            .unwrap_or_default()
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output
            .as_ref()
            .and_then(|o| o.format)
            .unwrap_or_default()
    }
}
