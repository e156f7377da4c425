//! Output formatting and the JSON report.

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use rosetta_core::{LogEntry, ResultSet};

/// Format a duration for display.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.001 {
        format!("{:.2}µs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.2}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.3}s")
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{mins}m{remaining:.1}s")
    }
}

/// `"1 change"`, `"3 changes"`.
#[must_use]
pub fn format_change_count(n: usize) -> String {
    if n == 1 {
        "1 change".to_string()
    } else {
        format!("{n} changes")
    }
}

/// Machine-readable summary of a finished run.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    #[serde(flatten)]
    results: &'a ResultSet,
    total_changes: usize,
    succeeded: usize,
    failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    logs: Option<&'a [LogEntry]>,
}

impl<'a> RunReport<'a> {
    #[must_use]
    pub fn new(results: &'a ResultSet) -> Self {
        Self {
            results,
            total_changes: results.total_changes(),
            succeeded: results.succeeded(),
            failed: results.failed(),
            logs: None,
        }
    }

    /// Include the event log of the run.
    #[must_use]
    pub fn with_logs(mut self, logs: &'a [LogEntry]) -> Self {
        self.logs = Some(logs);
        self
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Write `contents` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or written.
pub fn write_to_file(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(contents.as_bytes())?;
    if !contents.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    debug!(path = %path.display(), bytes = contents.len(), "report written");
    Ok(())
}
