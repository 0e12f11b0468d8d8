//! Crash reports for panics.
//!
//! The report names the analysis phase, the package being extracted and how
//! many packages were done, so a crash on a large tree can be narrowed down
//! to one directory.

use super::context::{get_current_context, get_progress, AnalysisContext};
use std::fmt::Write;
use std::panic::PanicHookInfo;

const WIDTH: usize = 78;

/// Install the crash reporter. Call early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let report = CrashReport::capture(info);
        eprintln!();
        eprint!("{}", report.render());
        if report.backtrace {
            eprintln!("{}", std::backtrace::Backtrace::capture());
        }
    }));
}

#[derive(Debug, Default)]
struct CrashReport {
    message: String,
    location: Option<String>,
    context: AnalysisContext,
    progress: (usize, usize),
    timestamp: String,
    backtrace: bool,
}

impl CrashReport {
    fn capture(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Unknown panic".to_string());

        Self {
            message,
            location: info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
            context: get_current_context(),
            progress: get_progress(),
            timestamp: chrono::Utc::now()
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
            backtrace: std::env::var_os("RUST_BACKTRACE").is_some(),
        }
    }

    fn render(&self) -> String {
        let rule = "═".repeat(WIDTH);
        let mut out = String::new();
        let _ = writeln!(out, "╔{}╗", rule);
        row(&mut out, &format!("IMPLMAP {} CRASH REPORT", env!("CARGO_PKG_VERSION")));
        row(&mut out, &format!("{} at {}", std::env::consts::OS, self.timestamp));
        let _ = writeln!(out, "╠{}╣", rule);

        row(&mut out, &format!("panic: {}", self.message));
        if let Some(location) = &self.location {
            row(&mut out, &format!("at: {}", location));
        }
        match self.context.phase {
            Some(phase) => row(&mut out, &format!("phase: {}", phase)),
            None => row(&mut out, "phase: none (before analysis started)"),
        }
        if let Some(unit) = &self.context.current_unit {
            row(&mut out, &format!("package: {}", unit));
        }
        if let Some(dir) = &self.context.current_dir {
            row(&mut out, &format!("directory: {}", dir.display()));
        }
        let (processed, total) = self.progress;
        if total > 0 {
            row(
                &mut out,
                &format!(
                    "progress: {}/{} packages ({}%)",
                    processed,
                    total,
                    processed * 100 / total
                ),
            );
        }

        if !self.backtrace {
            row(&mut out, "set RUST_BACKTRACE=1 for a stack trace");
        }
        let _ = writeln!(out, "╚{}╝", rule);
        out
    }
}

fn row(out: &mut String, text: &str) {
    let text = truncate(text, WIDTH - 2);
    let pad = WIDTH - 2 - text.chars().count();
    let _ = writeln!(out, "║ {}{} ║", text, " ".repeat(pad));
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::context::AnalysisPhase;
    use std::path::PathBuf;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        let long = truncate("example.com/some/deeply/nested/package/path", 20);
        assert_eq!(long.chars().count(), 20);
        assert!(long.ends_with("..."));
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_render_includes_context() {
        let report = CrashReport {
            message: "index out of bounds".to_string(),
            context: AnalysisContext {
                phase: Some(AnalysisPhase::Collection),
                current_unit: Some("example.com/app/store".to_string()),
                current_dir: Some(PathBuf::from("/src/app/store")),
            },
            progress: (3, 12),
            timestamp: "2026-01-01 00:00:00 UTC".to_string(),
            ..CrashReport::default()
        };
        let rendered = report.render();

        assert!(rendered.contains("panic: index out of bounds"));
        assert!(rendered.contains("package: example.com/app/store"));
        assert!(rendered.contains("progress: 3/12 packages (25%)"));
        assert!(rendered.contains("RUST_BACKTRACE"));
        let widths: Vec<usize> = rendered.lines().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|w| *w == WIDTH + 2));
    }

    #[test]
    fn test_render_without_phase() {
        let rendered = CrashReport::default().render();
        assert!(rendered.contains("before analysis started"));
        assert!(!rendered.contains("package:"));
    }
}
