//! End-of-run report rendering.
mod json;
mod text;


use std::time::Duration;

use crate::error::AppResult;
use crate::scheduler::RunSummary;

pub use json::json_report;
pub use text::text_report;

/// Microseconds per millisecond.
const US_PER_MS: u128 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Renders `summary` in the requested format.
///
/// # Errors
///
/// Returns an error if the JSON report cannot be serialized.
pub fn render(summary: &RunSummary, format: ReportFormat, color: bool) -> AppResult<String> {
    match format {
        ReportFormat::Text => Ok(text_report(summary, color)),
        ReportFormat::Json => Ok(json_report(summary)?),
    }
}

/// Milliseconds with microsecond precision, e.g. `12.345ms`.
pub(crate) fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    format!(
        "{}.{:03}ms",
        micros.checked_div(US_PER_MS).unwrap_or(0),
        micros.checked_rem(US_PER_MS).unwrap_or(0)
    )
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
