use std::sync::{Mutex, PoisonError};

use tokio::{sync::mpsc, task::JoinHandle};

use super::{AggregatedSnapshot, ResultRecord};

/// Record store with a single owner.
///
/// Fed by exactly one consumer, usually the aggregator task spawned with
/// [`spawn_aggregator`], so appends need no locking.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    records: Vec<ResultRecord>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> AggregatedSnapshot {
        AggregatedSnapshot::from_records(&self.records)
    }
}

/// Record store written to directly by many tasks.
///
/// Appends and snapshots take the same lock.
#[derive(Debug, Default)]
pub struct SharedCollector {
    inner: Mutex<MetricsCollector>,
}

impl SharedCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: ResultRecord) {
        self.lock().record(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> AggregatedSnapshot {
        self.lock().snapshot()
    }

    #[must_use]
    pub fn into_inner(self) -> MetricsCollector {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MetricsCollector> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drains `results_rx` into a fresh [`MetricsCollector`] until every sender
/// is dropped, then hands the collector back.
#[must_use]
pub fn spawn_aggregator(mut results_rx: mpsc::Receiver<ResultRecord>) -> JoinHandle<MetricsCollector> {
    tokio::spawn(async move {
        let mut collector = MetricsCollector::new();
        while let Some(record) = results_rx.recv().await {
            collector.record(record);
        }
        tracing::debug!("Result channel closed after {} records", collector.len());
        collector
    })
}
