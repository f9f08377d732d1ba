//! Rate-controlled dispatch of request attempts.
//!
//! A run moves through [`Phase::Idle`], [`Phase::Running`],
//! [`Phase::Draining`] and [`Phase::Done`]. One control loop paces ticks;
//! each dispatching tick spawns a request task that hands its record to the
//! collector. Tasks are never awaited by the loop itself.
mod rate;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{CollectorMode, EndpointSpec, LoadPlan, RunMode};
use crate::error::{AppError, AppResult};
use crate::metrics::{AggregatedSnapshot, ResultRecord, SharedCollector, spawn_aggregator};
use crate::selector::TargetSelector;

pub(crate) use rate::{Pacer, RatePlan, Tick};

/// Performs one request attempt. Implementations never fail: every outcome,
/// including errors, is a [`ResultRecord`].
#[async_trait]
pub trait RequestSender: Send + Sync + 'static {
    async fn send(&self, base_url: &str, endpoint: &EndpointSpec) -> ResultRecord;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Draining,
    Done,
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: RunMode,
    pub target_duration: Duration,
    pub requests_per_second: u64,
    pub elapsed: Duration,
    pub dispatched: u64,
    pub skipped_ticks: u64,
    pub snapshot: AggregatedSnapshot,
}

enum ResultSink {
    Channel(mpsc::Sender<ResultRecord>),
    Shared(Arc<SharedCollector>),
}

impl ResultSink {
    async fn deliver(&self, record: ResultRecord) {
        match self {
            Self::Channel(results_tx) => {
                if results_tx.send(record).await.is_err() {
                    warn!("Result channel closed before a record was delivered");
                }
            }
            Self::Shared(collector) => collector.record(record),
        }
    }
}

impl Clone for ResultSink {
    fn clone(&self) -> Self {
        match self {
            Self::Channel(results_tx) => Self::Channel(results_tx.clone()),
            Self::Shared(collector) => Self::Shared(Arc::clone(collector)),
        }
    }
}

/// Drives one load run.
pub struct LoadScheduler<S> {
    plan: Arc<LoadPlan>,
    selector: Arc<TargetSelector>,
    sender: Arc<S>,
    phase: Phase,
}

impl<S> LoadScheduler<S>
where
    S: RequestSender,
{
    #[must_use]
    pub fn new(plan: LoadPlan, selector: TargetSelector, sender: S) -> Self {
        Self {
            plan: Arc::new(plan),
            selector: Arc::new(selector),
            sender: Arc::new(sender),
            phase: Phase::Idle,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Runs until the configured duration has passed and every dispatched
    /// request has finished.
    ///
    /// # Errors
    ///
    /// Returns a configuration error before dispatching anything when the
    /// plan is invalid, or an error if the aggregator task fails.
    pub async fn run(&mut self) -> AppResult<RunSummary> {
        self.plan.validate().map_err(AppError::config)?;
        self.enter(Phase::Running);

        let plan = Arc::clone(&self.plan);
        info!(
            "Starting {} run: {} rps for {}s across {} endpoints and {} base URLs",
            plan.mode.as_str(),
            plan.requests_per_second,
            plan.duration.as_secs(),
            plan.endpoints.len(),
            plan.base_urls.len()
        );
        for endpoint in plan.endpoints.values() {
            for (location, err) in endpoint.invalid_parameters() {
                warn!(
                    "Endpoint '{}' has an invalid {}; every attempt will fail: {}",
                    endpoint.name, location, err
                );
            }
        }

        let (sink, aggregator, shared) = match plan.collector {
            CollectorMode::Aggregator => {
                let (results_tx, results_rx) = mpsc::channel(plan.result_buffer);
                (
                    ResultSink::Channel(results_tx),
                    Some(spawn_aggregator(results_rx)),
                    None,
                )
            }
            CollectorMode::Direct => {
                let collector = Arc::new(SharedCollector::new());
                (ResultSink::Shared(Arc::clone(&collector)), None, Some(collector))
            }
        };
        let in_flight = plan.max_in_flight.map(|cap| Arc::new(Semaphore::new(cap)));

        let start = Instant::now();
        let deadline = start.checked_add(plan.duration).unwrap_or(start);
        let mut pacer = Pacer::new(RatePlan::from_plan(&plan), start);
        let mut tasks = JoinSet::new();
        let mut dispatched: u64 = 0;
        let mut skipped_ticks: u64 = 0;

        let deadline_timer = tokio::time::sleep_until(deadline);
        tokio::pin!(deadline_timer);
        let (mut due, mut tick) = pacer.next_tick(start);

        loop {
            tokio::select! {
                biased;
                () = &mut deadline_timer => {
                    debug!("Run deadline reached");
                    break;
                }
                () = tokio::time::sleep_until(due) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    if tick == Tick::Dispatch {
                        let permit = match in_flight.as_ref() {
                            None => None,
                            Some(semaphore) => match Arc::clone(semaphore).try_acquire_owned() {
                                Ok(permit) => Some(permit),
                                Err(_full) => {
                                    skipped_ticks = skipped_ticks.saturating_add(1);
                                    (due, tick) = pacer.next_tick(now);
                                    continue;
                                }
                            },
                        };
                        if self.dispatch(&mut tasks, &sink, permit) {
                            dispatched = dispatched.saturating_add(1);
                        } else {
                            skipped_ticks = skipped_ticks.saturating_add(1);
                        }
                    }
                    while let Some(joined) = tasks.try_join_next() {
                        log_join(joined);
                    }
                    (due, tick) = pacer.next_tick(now);
                }
            }
        }

        self.enter(Phase::Draining);
        info!("Dispatched {} requests, waiting for {} in flight", dispatched, tasks.len());
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        drop(sink);

        let snapshot = match (aggregator, shared) {
            (Some(aggregator), _) => aggregator.await?.snapshot(),
            (None, Some(collector)) => collector.snapshot(),
            (None, None) => AggregatedSnapshot::default(),
        };
        let elapsed = start.elapsed();
        self.enter(Phase::Done);
        if skipped_ticks > 0 {
            info!("Skipped {} ticks at the in-flight cap", skipped_ticks);
        }

        Ok(RunSummary {
            mode: plan.mode,
            target_duration: plan.duration,
            requests_per_second: plan.requests_per_second,
            elapsed,
            dispatched,
            skipped_ticks,
            snapshot,
        })
    }

    fn enter(&mut self, phase: Phase) {
        debug!("Scheduler phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Spawns one request task. Returns false when nothing was selected.
    fn dispatch(
        &self,
        tasks: &mut JoinSet<()>,
        sink: &ResultSink,
        permit: Option<OwnedSemaphorePermit>,
    ) -> bool {
        let Some(selection) = self.selector.select() else {
            warn!("No target available for this tick");
            return false;
        };
        let endpoint_name = selection.endpoint.to_owned();
        let base_url = selection.base_url.to_owned();
        let plan = Arc::clone(&self.plan);
        let sender = Arc::clone(&self.sender);
        let sink = sink.clone();

        tasks.spawn(async move {
            let Some(endpoint) = plan.endpoints.get(&endpoint_name) else {
                warn!("Selected unknown endpoint '{}'", endpoint_name);
                return;
            };
            let record = sender.send(&base_url, endpoint).await;
            sink.deliver(record).await;
            drop(permit);
        });
        true
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(err) = joined {
        warn!("Request task failed: {}", err);
    }
}
