//! Rendering of suite results as text, JSON or TAP.

use crate::harness::{SuiteResults, TestResult};
use crate::result::ProbeResult;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document of [`SuiteResults`]
    Json,
    /// TAP (Test Anything Protocol) version 13
    Tap,
}

impl ReportFormat {
    /// File extension used when the report is written to disk
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Tap => "tap",
        }
    }
}

/// Render `results` in `format`
///
/// # Errors
///
/// Returns error if JSON serialisation fails
pub fn render(results: &SuiteResults, format: ReportFormat) -> ProbeResult<String> {
    Ok(match format {
        ReportFormat::Text => render_text(results),
        ReportFormat::Json => serde_json::to_string_pretty(results)?,
        ReportFormat::Tap => render_tap(results),
    })
}

/// Write the report to `dir/report.<ext>` and return the path
///
/// # Errors
///
/// Returns error if the directory cannot be created or the file written
pub async fn write_report(
    results: &SuiteResults,
    format: ReportFormat,
    dir: &Path,
) -> ProbeResult<PathBuf> {
    let body = render(results, format)?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("report.{}", format.extension()));
    tokio::fs::write(&path, body).await?;
    tracing::debug!(path = %path.display(), "report written");
    Ok(path)
}

fn status(result: &TestResult) -> &'static str {
    if result.passed {
        "PASS"
    } else {
        "FAIL"
    }
}

/// Plain text listing, one line per case plus failure details
#[must_use]
pub fn render_text(results: &SuiteResults) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", results.suite_name);
    for result in &results.results {
        let _ = writeln!(
            out,
            "  {} {} ({}ms)",
            status(result),
            result.name,
            result.duration_ms
        );
        if let Some(ref error) = result.error {
            let _ = writeln!(out, "       {error}");
        }
        if let Some(ref page) = result.page {
            let _ = writeln!(out, "       stopped on the {page} page");
        }
        if let Some(ref shot) = result.screenshot {
            let _ = writeln!(out, "       screenshot: {}", shot.display());
        }
    }
    let _ = writeln!(
        out,
        "{} passed, {} failed, {} total in {}ms",
        results.passed_count(),
        results.failed_count(),
        results.total(),
        results.duration_ms
    );
    out
}

/// TAP version 13 with a YAML diagnostic block per failure
#[must_use]
pub fn render_tap(results: &SuiteResults) -> String {
    let mut out = String::from("TAP version 13\n");
    let _ = writeln!(out, "1..{}", results.total());
    for (index, result) in results.results.iter().enumerate() {
        let number = index + 1;
        let name = result.name.replace('#', "\\#");
        if result.passed {
            let _ = writeln!(out, "ok {number} - {name}");
            continue;
        }
        let _ = writeln!(out, "not ok {number} - {name}");
        out.push_str("  ---\n");
        if let Some(ref error) = result.error {
            let _ = writeln!(out, "  message: {}", yaml_scalar(error));
        }
        if let Some(ref page) = result.page {
            let _ = writeln!(out, "  page: {}", yaml_scalar(page));
        }
        let _ = writeln!(out, "  duration_ms: {}", result.duration_ms);
        out.push_str("  ...\n");
    }
    out
}

/// Single-line, double-quoted YAML scalar
fn yaml_scalar(value: &str) -> String {
    serde_json::Value::String(value.replace('\n', " ")).to_string()
}
