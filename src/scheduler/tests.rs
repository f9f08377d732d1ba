use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tokio::time::Instant;

use super::rate::period_for;
use super::*;
use crate::config::{ConfigFile, LoadPlan};
use crate::error::{AppError, ConfigError};
use crate::generator::GeneratorRegistry;
use crate::http::RequestExecutor;
use crate::selector::TargetSelector;

#[derive(Clone, Default)]
struct FakeSender {
    calls: Arc<Mutex<Vec<String>>>,
    delay: Duration,
    status: u16,
}

impl FakeSender {
    fn ok() -> Self {
        Self {
            status: 200,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RequestSender for FakeSender {
    async fn send(&self, base_url: &str, endpoint: &EndpointSpec) -> ResultRecord {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(endpoint.name.clone());
        ResultRecord::response(
            format!("{}{}", base_url, endpoint.path),
            endpoint.method.clone(),
            self.status,
            self.delay,
        )
    }
}

fn plan(execution: serde_json::Value) -> Result<LoadPlan, String> {
    let config: ConfigFile = serde_json::from_value(json!({
        "baseUrls": ["http://one", "http://two"],
        "execution": execution,
        "endpoints": {
            "a": { "path": "/a" },
            "b": { "path": "/b" },
            "c": { "path": "/c" }
        }
    }))
    .map_err(|err| format!("bad fixture: {}", err))?;
    LoadPlan::from_config(&config).map_err(|err| err.to_string())
}

fn selector_for(plan: &LoadPlan) -> TargetSelector {
    TargetSelector::with_rng(
        plan.selection,
        plan.endpoint_names(),
        plan.base_urls.clone(),
        &plan.weights,
        StdRng::seed_from_u64(11),
    )
}

#[tokio::test(flavor = "current_thread")]
async fn fixed_rate_dispatches_about_rate_times_duration() -> Result<(), String> {
    let plan = plan(json!({ "requestsPerSecond": 10, "durationSeconds": 1 }))?;
    let selector = selector_for(&plan);
    let sender = FakeSender::ok();
    let mut scheduler = LoadScheduler::new(plan, selector, sender.clone());

    let summary = scheduler.run().await.map_err(|err| err.to_string())?;
    let snapshot = &summary.snapshot;
    if !(9..=11).contains(&snapshot.total_requests) {
        return Err(format!("Unexpected total: {}", snapshot.total_requests));
    }
    if snapshot.failed_requests != 0 || snapshot.total_requests != summary.dispatched {
        return Err(format!("Unexpected summary: {:?}", summary));
    }
    if scheduler.phase() != Phase::Done {
        return Err(format!("Unexpected phase: {:?}", scheduler.phase()));
    }
    if summary.elapsed < Duration::from_millis(950) || summary.elapsed > Duration::from_secs(3) {
        return Err(format!("Unexpected elapsed: {:?}", summary.elapsed));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn round_robin_spreads_evenly() -> Result<(), String> {
    let plan = plan(json!({ "requestsPerSecond": 30, "durationSeconds": 1 }))?;
    let selector = selector_for(&plan);
    let sender = FakeSender::ok();
    let mut scheduler = LoadScheduler::new(plan, selector, sender.clone());
    scheduler.run().await.map_err(|err| err.to_string())?;

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for name in sender.calls() {
        let entry = counts.entry(name).or_insert(0);
        *entry = entry.saturating_add(1);
    }
    let (Some(min), Some(max)) = (counts.values().min(), counts.values().max()) else {
        return Err("No calls recorded".to_owned());
    };
    if max.saturating_sub(*min) > 1 {
        return Err(format!("Uneven spread: {:?}", counts));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn slow_requests_drain_before_done() -> Result<(), String> {
    let plan = plan(json!({ "requestsPerSecond": 5, "durationSeconds": 1 }))?;
    let selector = selector_for(&plan);
    let sender = FakeSender {
        delay: Duration::from_millis(700),
        ..FakeSender::ok()
    };
    let mut scheduler = LoadScheduler::new(plan, selector, sender.clone());
    let summary = scheduler.run().await.map_err(|err| err.to_string())?;
    if summary.snapshot.total_requests != summary.dispatched {
        return Err(format!("Lost records: {:?}", summary));
    }
    if summary.elapsed < Duration::from_millis(1_500) {
        return Err(format!("Run ended before draining: {:?}", summary.elapsed));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn in_flight_cap_skips_ticks() -> Result<(), String> {
    let plan = plan(json!({
        "requestsPerSecond": 20,
        "durationSeconds": 1,
        "maxInFlight": 1
    }))?;
    let selector = selector_for(&plan);
    let sender = FakeSender {
        delay: Duration::from_millis(400),
        ..FakeSender::ok()
    };
    let mut scheduler = LoadScheduler::new(plan, selector, sender);
    let summary = scheduler.run().await.map_err(|err| err.to_string())?;
    if summary.dispatched > 4 || summary.dispatched == 0 {
        return Err(format!("Cap not enforced: {:?}", summary));
    }
    if summary.skipped_ticks == 0 {
        return Err("Expected skipped ticks".to_owned());
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn direct_collector_sees_every_record() -> Result<(), String> {
    let plan = plan(json!({
        "requestsPerSecond": 20,
        "durationSeconds": 1,
        "collector": "direct"
    }))?;
    let selector = selector_for(&plan);
    let sender = FakeSender {
        status: 500,
        ..FakeSender::default()
    };
    let mut scheduler = LoadScheduler::new(plan, selector, sender);
    let summary = scheduler.run().await.map_err(|err| err.to_string())?;
    let snapshot = &summary.snapshot;
    if snapshot.total_requests != summary.dispatched || snapshot.total_requests == 0 {
        return Err(format!("Unexpected totals: {:?}", summary));
    }
    if snapshot.failed_requests != snapshot.total_requests {
        return Err("5xx responses should count as failures".to_owned());
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn invalid_plan_fails_before_dispatch() -> Result<(), String> {
    let mut plan = plan(json!({ "requestsPerSecond": 10, "durationSeconds": 1 }))?;
    plan.requests_per_second = 0;
    let selector = selector_for(&plan);
    let sender = FakeSender::ok();
    let mut scheduler = LoadScheduler::new(plan, selector, sender.clone());
    match scheduler.run().await {
        Err(AppError::Config(ConfigError::RateMustBePositive)) => {}
        other => return Err(format!("Unexpected result: {:?}", other.map(|summary| summary.dispatched))),
    }
    if !sender.calls().is_empty() || scheduler.phase() != Phase::Idle {
        return Err("Nothing should have been dispatched".to_owned());
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn malformed_parameter_fails_every_attempt() -> Result<(), String> {
    let config: ConfigFile = serde_json::from_value(json!({
        "baseUrls": ["http://127.0.0.1:9"],
        "execution": { "requestsPerSecond": 10, "durationSeconds": 1 },
        "endpoints": {
            "broken": {
                "path": "/items/{id}",
                "pathParameters": { "id": { "type": "choice", "values": [] } }
            }
        }
    }))
    .map_err(|err| format!("bad fixture: {}", err))?;
    let plan = LoadPlan::from_config(&config).map_err(|err| err.to_string())?;
    let selector = selector_for(&plan);
    let executor = RequestExecutor::new(Arc::new(GeneratorRegistry::default()), plan.request_timeout)
        .map_err(|err| err.to_string())?;
    let mut scheduler = LoadScheduler::new(plan, selector, executor);

    let summary = scheduler.run().await.map_err(|err| err.to_string())?;
    let snapshot = &summary.snapshot;
    if snapshot.total_requests == 0 || snapshot.failed_requests != snapshot.total_requests {
        return Err(format!("Expected only failures: {:?}", snapshot));
    }
    if snapshot.status_codes.get(&0) != Some(&snapshot.total_requests) {
        return Err(format!("Expected status 0: {:?}", snapshot.status_codes));
    }
    if snapshot.errors.keys().any(String::is_empty) || snapshot.errors.is_empty() {
        return Err(format!("Expected error messages: {:?}", snapshot.errors));
    }
    if summary.elapsed > Duration::from_secs(3) {
        return Err(format!("Run overran: {:?}", summary.elapsed));
    }
    Ok(())
}

#[test]
fn rate_plan_interpolates_per_second() -> Result<(), String> {
    let plan = RatePlan {
        initial_rps: 0,
        stages: vec![
            rate::RateStage {
                duration_secs: 10,
                target_rps: 100,
            },
            rate::RateStage {
                duration_secs: 5,
                target_rps: 50,
            },
        ],
    };
    let expected = [(0, 0), (1, 10), (5, 50), (9, 90), (10, 100), (12, 80), (15, 50), (60, 50)];
    for (second, rps) in expected {
        if plan.rps_at(second) != rps {
            return Err(format!("rps_at({}) = {}, expected {}", second, plan.rps_at(second), rps));
        }
    }
    Ok(())
}

#[test]
fn fixed_plan_is_constant() -> Result<(), String> {
    let plan = RatePlan::fixed(25);
    if plan.rps_at(0) != 25 || plan.rps_at(1_000) != 25 {
        return Err("Fixed plan should not change".to_owned());
    }
    Ok(())
}

#[test]
fn period_matches_rate() -> Result<(), String> {
    if period_for(10) != Duration::from_millis(100) || period_for(1) != Duration::from_secs(1) {
        return Err("Unexpected periods".to_owned());
    }
    if period_for(u64::MAX) != Duration::from_micros(1) {
        return Err("Period should clamp to the minimum".to_owned());
    }
    Ok(())
}

#[test]
fn pacer_spaces_ticks_and_pauses_at_zero() -> Result<(), String> {
    let start = Instant::now();
    let mut pacer = Pacer::new(RatePlan::fixed(4), start);
    let mut now = start;
    let mut seen = Vec::new();
    for _ in 0..4 {
        let (at, tick) = pacer.next_tick(now);
        seen.push((at.saturating_duration_since(start), tick));
        now = at;
    }
    let expected: Vec<_> = [0, 250, 500, 750]
        .iter()
        .map(|millis| (Duration::from_millis(*millis), Tick::Dispatch))
        .collect();
    if seen != expected {
        return Err(format!("Unexpected ticks: {:?}", seen));
    }

    let mut paused = Pacer::new(RatePlan::fixed(0), start);
    let (first, tick) = paused.next_tick(start);
    let (second, _) = paused.next_tick(first);
    if tick != Tick::Pause || second.saturating_duration_since(first) != Duration::from_millis(100) {
        return Err("Zero rate should pause in fixed steps".to_owned());
    }
    Ok(())
}

#[test]
fn pacer_drops_missed_ticks() -> Result<(), String> {
    let start = Instant::now();
    let mut pacer = Pacer::new(RatePlan::fixed(10), start);
    let (first, _) = pacer.next_tick(start);
    let late = first
        .checked_add(Duration::from_millis(550))
        .ok_or("instant overflow")?;
    let (second, _) = pacer.next_tick(late);
    if second != late {
        return Err("Late tick should realign to now".to_owned());
    }
    Ok(())
}
