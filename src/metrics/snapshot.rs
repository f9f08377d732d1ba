use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{LatencyHistogram, ResultRecord};

/// Aggregates over every record seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub total_duration: Duration,
    pub min_duration: Duration,
    pub max_duration: Duration,
    pub avg_duration: Duration,
    pub p50_duration: Duration,
    pub p90_duration: Duration,
    pub p99_duration: Duration,
    pub status_codes: BTreeMap<u16, u64>,
    pub errors: BTreeMap<String, u64>,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl AggregatedSnapshot {
    /// Computes a snapshot from scratch over `records`.
    #[must_use]
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let mut snapshot = Self::default();
        let mut histogram = LatencyHistogram::new()
            .inspect_err(|err| tracing::warn!("Latency percentiles unavailable: {}", err))
            .ok();

        for record in records {
            snapshot.total_requests = snapshot.total_requests.saturating_add(1);
            if record.is_failure() {
                snapshot.failed_requests = snapshot.failed_requests.saturating_add(1);
            } else {
                snapshot.successful_requests = snapshot.successful_requests.saturating_add(1);
            }
            bump(&mut snapshot.status_codes, record.status_code);
            if record.is_failure() && !record.error_message.is_empty() {
                bump(&mut snapshot.errors, record.error_message.clone());
            }

            snapshot.total_duration = snapshot.total_duration.saturating_add(record.elapsed);
            if snapshot.total_requests == 1 || record.elapsed < snapshot.min_duration {
                snapshot.min_duration = record.elapsed;
            }
            snapshot.max_duration = snapshot.max_duration.max(record.elapsed);

            if let Some(active) = histogram.as_mut()
                && let Err(err) = active.record(record.elapsed)
            {
                tracing::warn!("Dropping latency percentiles: {}", err);
                histogram = None;
            }

            snapshot.first_timestamp = Some(
                snapshot
                    .first_timestamp
                    .map_or(record.timestamp, |first| first.min(record.timestamp)),
            );
            snapshot.last_timestamp = Some(
                snapshot
                    .last_timestamp
                    .map_or(record.timestamp, |last| last.max(record.timestamp)),
            );
        }

        snapshot.avg_duration = average(snapshot.total_duration, snapshot.total_requests);
        if let Some(histogram) = histogram {
            let (p50, p90, p99) = histogram.percentiles();
            snapshot.p50_duration = p50;
            snapshot.p90_duration = p90;
            snapshot.p99_duration = p99;
        }
        snapshot
    }

    /// Failed share in percent, zero for an empty run.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "rates are reported as floating point percentages"
    )]
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.failed_requests as f64 * 100.0 / self.total_requests as f64
    }

    /// Records per second over `elapsed`, zero when `elapsed` is zero.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "throughput is a real-valued rate")]
    pub fn achieved_rps(&self, elapsed: Duration) -> f64 {
        let seconds = elapsed.as_secs_f64();
        if seconds <= 0.0 {
            return 0.0;
        }
        self.total_requests as f64 / seconds
    }
}

fn bump<K: Ord>(map: &mut BTreeMap<K, u64>, key: K) {
    let count = map.entry(key).or_insert(0);
    *count = count.saturating_add(1);
}

fn average(total: Duration, count: u64) -> Duration {
    total
        .as_nanos()
        .checked_div(u128::from(count))
        .and_then(|nanos| u64::try_from(nanos).ok())
        .map_or(Duration::ZERO, Duration::from_nanos)
}
