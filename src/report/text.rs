use crate::config::RunMode;
use crate::scheduler::RunSummary;

use super::format_duration;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Human-readable report. Status codes and error messages are sorted.
#[must_use]
pub fn text_report(summary: &RunSummary, color: bool) -> String {
    let snapshot = &summary.snapshot;
    let paint = |code: &str, text: String| {
        if color {
            format!("{}{}{}", code, text, RESET)
        } else {
            text
        }
    };

    let mut lines = Vec::new();
    lines.push(paint(BOLD, "--- Load Report ---".to_owned()));
    lines.push(format!("Mode: {}", summary.mode.as_str()));
    lines.push(format!(
        "Configured Duration: {}s",
        summary.target_duration.as_secs()
    ));
    match summary.mode {
        RunMode::Fixed => lines.push(format!("Configured RPS: {}", summary.requests_per_second)),
        RunMode::Ramp => lines.push(format!("Starting RPS: {}", summary.requests_per_second)),
    }
    lines.push(format!("Elapsed: {}", format_duration(summary.elapsed)));
    lines.push(format!("Dispatched: {}", summary.dispatched));
    if summary.skipped_ticks > 0 {
        lines.push(format!("Skipped Ticks (in-flight cap): {}", summary.skipped_ticks));
    }
    lines.push(format!("Total Requests: {}", snapshot.total_requests));
    lines.push(format!("Successful Requests: {}", snapshot.successful_requests));
    lines.push(format!("Failed Requests: {}", snapshot.failed_requests));
    if snapshot.total_requests > 0 {
        let rate = format!("{:.2}%", snapshot.error_rate());
        let painted = if snapshot.failed_requests > 0 {
            paint(RED, rate)
        } else {
            paint(GREEN, rate)
        };
        lines.push(format!("Error Rate: {}", painted));
    }
    lines.push(format!(
        "Achieved RPS: {:.2}",
        snapshot.achieved_rps(summary.elapsed)
    ));
    lines.push(format!(
        "Min/Avg/Max Request Time: {} / {} / {}",
        format_duration(snapshot.min_duration),
        format_duration(snapshot.avg_duration),
        format_duration(snapshot.max_duration)
    ));
    lines.push(format!(
        "P50/P90/P99 Request Time: {} / {} / {}",
        format_duration(snapshot.p50_duration),
        format_duration(snapshot.p90_duration),
        format_duration(snapshot.p99_duration)
    ));

    lines.push(String::new());
    lines.push(paint(BOLD, "Status Code Distribution:".to_owned()));
    if snapshot.status_codes.is_empty() {
        lines.push("  none".to_owned());
    }
    for (code, count) in &snapshot.status_codes {
        let label = if *code == 0 {
            "  No Response".to_owned()
        } else {
            format!("  Status {}", code)
        };
        lines.push(format!("{}: {}", label, count));
    }

    if !snapshot.errors.is_empty() {
        lines.push(String::new());
        lines.push(paint(BOLD, "Error Message Summary:".to_owned()));
        for (message, count) in &snapshot.errors {
            lines.push(format!("  '{}': {} times", message, count));
        }
    }

    lines.push(paint(BOLD, "--- End of Report ---".to_owned()));
    lines.join("\n")
}
