//! Result records, collectors and aggregated snapshots.
mod collector;
mod histogram;
mod record;
mod snapshot;


pub use collector::{MetricsCollector, SharedCollector, spawn_aggregator};
pub use histogram::LatencyHistogram;
pub use record::ResultRecord;
pub use snapshot::AggregatedSnapshot;
