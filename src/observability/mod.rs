//! Observability: log setup, crash reports and context tracking.
//!
//! Install the panic hook and the subscriber at startup:
//!
//! ```ignore
//! use implmap::observability::{init_logging, install_panic_hook};
//!
//! fn main() {
//!     install_panic_hook();
//!     init_logging(0);
//! }
//! ```

pub mod context;
pub mod panic_hook;
pub mod tracing;

pub use context::{
    get_current_context, get_progress, increment_processed, set_current_unit, set_phase,
    set_phase_persistent, set_progress, AnalysisContext, AnalysisPhase, ContextGuard,
};
pub use panic_hook::install_panic_hook;
pub use self::tracing::init_logging;
