//! Query surface.
//!
//! [`analyze_corpus`] runs extraction and typed resolution over a
//! directory tree. [`reverify`] takes a serialized result, validates it and
//! re-resolves it with the string heuristic, adding links on top of the ones
//! it already carries.

use crate::analyzers::implementation_resolver::{resolve_all, ImplementationResolver};
use crate::analyzers::signature_matcher::StringHeuristic;
use crate::core::cancellation::CancellationToken;
use crate::core::errors::{Error, Result};
use crate::core::model::{AnalysisResult, Declaration, MethodInfo, Position, StructInfo};
use crate::extraction::extractor::{extract_corpus, Diagnostic, ExtractionOptions};
use crate::io::walker::GoFileWalker;
use crate::observability::{set_phase_persistent, AnalysisPhase};
use std::path::Path;
use tracing::{info, info_span};

#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    pub include_tests: bool,
    pub position_segments: usize,
    pub ignore_patterns: Vec<String>,
    pub parallel: bool,
    pub cancellation: CancellationToken,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            include_tests: false,
            position_segments: 3,
            ignore_patterns: Vec::new(),
            parallel: true,
            cancellation: CancellationToken::default(),
        }
    }
}

impl AnalysisOptions {
    fn extraction(&self) -> ExtractionOptions {
        ExtractionOptions {
            position_segments: self.position_segments,
            parallel: self.parallel,
            cancellation: self.cancellation.clone(),
        }
    }
}

/// A resolved result plus the packages that were skipped on the way.
#[derive(Clone, Debug, Default)]
pub struct Analysis {
    pub result: AnalysisResult,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn analyze_corpus(root: &Path, options: &AnalysisOptions) -> Result<Analysis> {
    let _span = info_span!("analyze", root = %root.display()).entered();

    set_phase_persistent(AnalysisPhase::Discovery);
    let units = GoFileWalker::new(root.to_path_buf())
        .with_tests(options.include_tests)
        .with_ignore_patterns(&options.ignore_patterns)?
        .units()?;

    let corpus = extract_corpus(&units, &options.extraction())?;
    if options.cancellation.is_cancelled() {
        return Err(Error::Cancelled);
    }

    set_phase_persistent(AnalysisPhase::Resolution);
    let mut result = corpus.result;
    ImplementationResolver::typed(&result.interfaces, corpus.typed)
        .with_parallel(options.parallel)
        .resolve(&mut result.structs);

    info!(
        interfaces = result.interfaces.len(),
        structs = result.structs.len(),
        skipped = corpus.diagnostics.len(),
        "analysis complete"
    );
    Ok(Analysis {
        result,
        diagnostics: corpus.diagnostics,
    })
}

/// First struct with the given name, in result order.
pub fn lookup_struct<'r>(result: &'r AnalysisResult, name: &str) -> Option<&'r StructInfo> {
    result.find_struct(name)
}

/// Parse, validate and re-resolve a serialized result.
pub fn reverify(json: &str) -> Result<AnalysisResult> {
    let result = parse_result(json)?;
    reverify_result(result)
}

pub fn reverify_result(mut result: AnalysisResult) -> Result<AnalysisResult> {
    validate_result(&result)?;
    let _span = info_span!("reverify", structs = result.structs.len()).entered();
    resolve_all(&mut result, StringHeuristic, true);
    Ok(result)
}

/// Deserialize a result, reporting shape errors as validation failures.
pub fn parse_result(json: &str) -> Result<AnalysisResult> {
    serde_json::from_str(json).map_err(|e| Error::validation(format!("malformed result JSON: {}", e)))
}

/// Reject records that no extraction could have produced.
pub fn validate_result(result: &AnalysisResult) -> Result<()> {
    for interface in &result.interfaces {
        let at = format!("interface '{}'", interface.name);
        check_name(&interface.name, "interface")?;
        check_position(&interface.position, &at)?;
        for method in &interface.methods {
            check_method(method, &at)?;
        }
    }
    for s in &result.structs {
        let at = format!("struct '{}'", s.name);
        check_name(&s.name, "struct")?;
        check_position(&s.position, &at)?;
        for method in &s.methods {
            check_method(method, &at)?;
        }
        for link in &s.implemented_interfaces {
            check_link(link, &at)?;
        }
    }
    Ok(())
}

fn check_name(name: &str, kind: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation(format!("{} with empty name", kind)));
    }
    Ok(())
}

fn check_position(position: &Position, at: &str) -> Result<()> {
    if position.line < 1 {
        return Err(Error::validation(format!(
            "{} has line {} (lines start at 1)",
            at, position.line
        )));
    }
    Ok(())
}

fn check_method(method: &MethodInfo, owner: &str) -> Result<()> {
    if method.name.is_empty() {
        return Err(Error::validation(format!("{} has a method with empty name", owner)));
    }
    let at = format!("{} method '{}'", owner, method.name);
    check_position(&method.position, &at)?;
    for link in &method.implemented_from {
        check_link(link, &at)?;
    }
    Ok(())
}

fn check_link(link: &Declaration, at: &str) -> Result<()> {
    if link.name.is_empty() {
        return Err(Error::validation(format!("{} links to an unnamed declaration", at)));
    }
    check_position(&link.position, at)
}
