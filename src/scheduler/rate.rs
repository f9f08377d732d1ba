use std::time::Duration;

use tokio::time::Instant;

use crate::config::{LoadPlan, RampStage, RunMode};

const PAUSE_STEP: Duration = Duration::from_millis(100);
const MIN_PERIOD: Duration = Duration::from_micros(1);

/// Requests-per-second over the run, resolved per whole elapsed second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RatePlan {
    pub initial_rps: u64,
    pub stages: Vec<RateStage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RateStage {
    pub duration_secs: u64,
    pub target_rps: u64,
}

impl RatePlan {
    pub(crate) const fn fixed(rps: u64) -> Self {
        Self {
            initial_rps: rps,
            stages: Vec::new(),
        }
    }

    pub(crate) fn from_plan(plan: &LoadPlan) -> Self {
        match plan.mode {
            RunMode::Fixed => Self::fixed(plan.requests_per_second),
            RunMode::Ramp => Self {
                initial_rps: plan.requests_per_second,
                stages: plan.stages.iter().map(RateStage::from).collect(),
            },
        }
    }

    /// Rate in effect during second `elapsed_secs` of the run.
    ///
    /// Each stage moves linearly from the previous rate to its target. Past
    /// the last stage the final target holds.
    pub(crate) fn rps_at(&self, elapsed_secs: u64) -> u64 {
        let mut stage_start_rps = self.initial_rps;
        let mut remaining = elapsed_secs;
        for stage in &self.stages {
            let stage_secs = stage.duration_secs.max(1);
            if remaining < stage_secs {
                return interpolate(stage_start_rps, stage.target_rps, remaining, stage_secs);
            }
            remaining = remaining.saturating_sub(stage_secs);
            stage_start_rps = stage.target_rps;
        }
        stage_start_rps
    }
}

impl From<&RampStage> for RateStage {
    fn from(stage: &RampStage) -> Self {
        Self {
            duration_secs: stage.duration.as_secs().max(1),
            target_rps: stage.target_rps,
        }
    }
}

fn interpolate(start: u64, target: u64, elapsed: u64, stage_secs: u64) -> u64 {
    let start_i128 = i128::from(start);
    let delta = i128::from(target).saturating_sub(start_i128);
    let step = delta
        .saturating_mul(i128::from(elapsed))
        .checked_div(i128::from(stage_secs))
        .unwrap_or(0);
    let rps = start_i128.saturating_add(step);
    if rps < 0 {
        0
    } else {
        u64::try_from(rps).unwrap_or(u64::MAX)
    }
}

/// Spacing between dispatches at `rps`.
pub(crate) fn period_for(rps: u64) -> Duration {
    let divisor = u32::try_from(rps).unwrap_or(u32::MAX).max(1);
    Duration::from_secs(1)
        .checked_div(divisor)
        .unwrap_or(MIN_PERIOD)
        .max(MIN_PERIOD)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    Dispatch,
    Pause,
}

/// Produces the dispatch schedule for one run.
///
/// Ticks follow the current rate. A tick that is more than one period late
/// is dropped and the schedule realigns to `now`.
#[derive(Debug)]
pub(crate) struct Pacer {
    plan: RatePlan,
    start: Instant,
    next_at: Instant,
    step: Duration,
}

impl Pacer {
    pub(crate) const fn new(plan: RatePlan, start: Instant) -> Self {
        Self {
            plan,
            start,
            next_at: start,
            step: Duration::ZERO,
        }
    }

    /// Returns when the next tick is due and what it does.
    pub(crate) fn next_tick(&mut self, now: Instant) -> (Instant, Tick) {
        let mut at = self.next_at;
        if let Some(latest) = at.checked_add(self.step)
            && now > latest
        {
            at = now;
        }

        let elapsed_secs = at.saturating_duration_since(self.start).as_secs();
        let rps = self.plan.rps_at(elapsed_secs);
        let (tick, step) = if rps == 0 {
            (Tick::Pause, PAUSE_STEP)
        } else {
            (Tick::Dispatch, period_for(rps))
        };
        self.step = step;
        self.next_at = at.checked_add(step).unwrap_or(at);
        (at, tick)
    }
}
