use std::collections::BTreeMap;

use serde::Serialize;

use crate::scheduler::RunSummary;

use super::duration_ms;

#[derive(Debug, Serialize)]
struct JsonReport<'summary> {
    mode: &'static str,
    configured_duration_s: u64,
    requests_per_second: u64,
    elapsed_ms: u64,
    dispatched: u64,
    skipped_ticks: u64,
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    error_rate_percent: f64,
    achieved_rps: f64,
    latency_ms: LatencyReport,
    status_codes: BTreeMap<String, u64>,
    errors: &'summary BTreeMap<String, u64>,
    first_request_at: Option<String>,
    last_request_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct LatencyReport {
    min: u64,
    avg: u64,
    max: u64,
    p50: u64,
    p90: u64,
    p99: u64,
}

/// Machine-readable report. Durations are whole milliseconds.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn json_report(summary: &RunSummary) -> Result<String, serde_json::Error> {
    let snapshot = &summary.snapshot;
    let report = JsonReport {
        mode: summary.mode.as_str(),
        configured_duration_s: summary.target_duration.as_secs(),
        requests_per_second: summary.requests_per_second,
        elapsed_ms: duration_ms(summary.elapsed),
        dispatched: summary.dispatched,
        skipped_ticks: summary.skipped_ticks,
        total_requests: snapshot.total_requests,
        successful_requests: snapshot.successful_requests,
        failed_requests: snapshot.failed_requests,
        error_rate_percent: snapshot.error_rate(),
        achieved_rps: snapshot.achieved_rps(summary.elapsed),
        latency_ms: LatencyReport {
            min: duration_ms(snapshot.min_duration),
            avg: duration_ms(snapshot.avg_duration),
            max: duration_ms(snapshot.max_duration),
            p50: duration_ms(snapshot.p50_duration),
            p90: duration_ms(snapshot.p90_duration),
            p99: duration_ms(snapshot.p99_duration),
        },
        status_codes: snapshot
            .status_codes
            .iter()
            .map(|(code, count)| (code.to_string(), *count))
            .collect(),
        errors: &snapshot.errors,
        first_request_at: snapshot.first_timestamp.map(|at| at.to_rfc3339()),
        last_request_at: snapshot.last_timestamp.map(|at| at.to_rfc3339()),
    };
    serde_json::to_string_pretty(&report)
}
