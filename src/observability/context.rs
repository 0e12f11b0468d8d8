//! Thread-local context tracking for crash reports.
//!
//! Records which phase of an analysis is running and which package the
//! current thread is working on. Thread-local storage keeps the context
//! correct inside rayon workers; progress is a pair of atomic counters.
//!
//! The counters only feed the crash report. Analyses running side by side
//! share them, which can make the reported progress approximate.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static UNITS_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static UNITS_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<AnalysisContext> = const { RefCell::new(AnalysisContext::new()) };
}

/// What the current thread was doing.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub phase: Option<AnalysisPhase>,
    /// Import path of the package being extracted
    pub current_unit: Option<String>,
    /// Directory of that package
    pub current_dir: Option<PathBuf>,
}

impl AnalysisContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_unit: None,
            current_dir: None,
        }
    }
}

/// Major stages of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    /// Walking the corpus for Go packages
    Discovery,
    /// Parsing and checking packages
    Parsing,
    /// Building interface and struct records after the barrier
    Collection,
    /// Matching structs against interfaces
    Resolution,
    /// Writing results
    OutputGeneration,
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovery => write!(f, "discovery"),
            Self::Parsing => write!(f, "parsing"),
            Self::Collection => write!(f, "collection"),
            Self::Resolution => write!(f, "resolution"),
            Self::OutputGeneration => write!(f, "output_generation"),
        }
    }
}

/// Restores the previous context when dropped.
pub struct ContextGuard {
    previous: AnalysisContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

/// Set the current phase until the returned guard drops.
#[must_use]
pub fn set_phase(phase: AnalysisPhase) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        ctx.borrow_mut().phase = Some(phase);
        ContextGuard { previous }
    })
}

/// Set the current phase without a guard. Used for top-level transitions.
pub fn set_phase_persistent(phase: AnalysisPhase) {
    CURRENT_CONTEXT.with(|ctx| {
        ctx.borrow_mut().phase = Some(phase);
    });
}

/// Set the package being extracted on this thread.
///
/// ```ignore
/// for unit in units {
///     let _unit = set_current_unit(&unit.import_path, &unit.dir);
///     collect_unit(unit, segments)?;
/// }
/// ```
#[must_use]
pub fn set_current_unit(import_path: impl Into<String>, dir: impl Into<PathBuf>) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        {
            let mut current = ctx.borrow_mut();
            current.current_unit = Some(import_path.into());
            current.current_dir = Some(dir.into());
        }
        ContextGuard { previous }
    })
}

pub fn set_progress(processed: usize, total: usize) {
    UNITS_PROCESSED.store(processed, Ordering::Relaxed);
    UNITS_TOTAL.store(total, Ordering::Relaxed);
}

pub fn increment_processed() {
    UNITS_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn get_current_context() -> AnalysisContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        UNITS_PROCESSED.load(Ordering::Relaxed),
        UNITS_TOTAL.load(Ordering::Relaxed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset_context() {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = AnalysisContext::new();
        });
    }

    #[test]
    fn test_context_guard_restores_previous() {
        reset_context();

        let _parsing = set_phase(AnalysisPhase::Parsing);
        {
            let _resolution = set_phase(AnalysisPhase::Resolution);
            assert_eq!(
                get_current_context().phase,
                Some(AnalysisPhase::Resolution)
            );
        }
        assert_eq!(get_current_context().phase, Some(AnalysisPhase::Parsing));
    }

    #[test]
    fn test_unit_context() {
        reset_context();

        let _phase = set_phase(AnalysisPhase::Parsing);
        {
            let _unit = set_current_unit("example.com/app/shapes", "/src/app/shapes");
            let ctx = get_current_context();
            assert_eq!(ctx.current_unit.as_deref(), Some("example.com/app/shapes"));
            assert_eq!(ctx.current_dir, Some(PathBuf::from("/src/app/shapes")));
        }
        assert!(get_current_context().current_unit.is_none());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(AnalysisPhase::Discovery.to_string(), "discovery");
        assert_eq!(AnalysisPhase::Collection.to_string(), "collection");
        assert_eq!(
            AnalysisPhase::OutputGeneration.to_string(),
            "output_generation"
        );
    }
}
