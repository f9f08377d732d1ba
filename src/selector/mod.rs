//! Endpoint and base-URL selection.
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::generator::weighted_index;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionStrategy {
    #[default]
    RoundRobin,
    Weighted,
    Random,
}

impl SelectionStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RoundRobin => "roundRobin",
            Self::Weighted => "weighted",
            Self::Random => "random",
        }
    }
}

/// One pick: which endpoint to hit and against which base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'sel> {
    pub endpoint: &'sel str,
    pub base_url: &'sel str,
}

#[derive(Debug)]
struct SelectorState {
    endpoint_counter: u64,
    base_url_counter: u64,
    rng: StdRng,
}

/// Picks targets for request attempts. Safe to share across tasks.
///
/// Endpoint and base-URL counters advance independently. Both live behind a
/// single lock so every read-then-increment is serialized.
#[derive(Debug)]
pub struct TargetSelector {
    strategy: SelectionStrategy,
    endpoints: Vec<String>,
    base_urls: Vec<String>,
    // Endpoints present in the weight map, parallel to `weights`.
    weighted: Vec<usize>,
    weights: Vec<f64>,
    state: Mutex<SelectorState>,
}

impl TargetSelector {
    /// Creates a selector seeded from the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error when the OS entropy source cannot seed the generator.
    pub fn new(
        strategy: SelectionStrategy,
        endpoints: Vec<String>,
        base_urls: Vec<String>,
        weights: &BTreeMap<String, f64>,
    ) -> AppResult<Self> {
        let rng = StdRng::from_rng(OsRng)?;
        Ok(Self::with_rng(strategy, endpoints, base_urls, weights, rng))
    }

    #[must_use]
    pub fn with_rng(
        strategy: SelectionStrategy,
        endpoints: Vec<String>,
        base_urls: Vec<String>,
        weights: &BTreeMap<String, f64>,
        rng: StdRng,
    ) -> Self {
        let (weighted, weight_values): (Vec<usize>, Vec<f64>) = endpoints
            .iter()
            .enumerate()
            .filter_map(|(index, name)| weights.get(name).map(|weight| (index, *weight)))
            .unzip();
        Self {
            strategy,
            endpoints,
            base_urls,
            weighted,
            weights: weight_values,
            state: Mutex::new(SelectorState {
                endpoint_counter: 0,
                base_url_counter: 0,
                rng,
            }),
        }
    }

    #[must_use]
    pub const fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Picks an endpoint and a base URL.
    ///
    /// Returns `None` only when either list is empty.
    #[must_use]
    pub fn select(&self) -> Option<Selection<'_>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let endpoint = self.pick_endpoint(&mut state)?;
        let base_url = round_robin(&self.base_urls, &mut state.base_url_counter)?;
        Some(Selection { endpoint, base_url })
    }

    fn pick_endpoint(&self, state: &mut SelectorState) -> Option<&str> {
        match self.strategy {
            SelectionStrategy::RoundRobin => {
                round_robin(&self.endpoints, &mut state.endpoint_counter)
            }
            SelectionStrategy::Random => self
                .endpoints
                .choose(&mut state.rng)
                .map(String::as_str)
                .or_else(|| round_robin(&self.endpoints, &mut state.endpoint_counter)),
            SelectionStrategy::Weighted => weighted_index(&self.weights, &mut state.rng)
                .and_then(|slot| self.weighted.get(slot))
                .and_then(|index| self.endpoints.get(*index))
                .map(String::as_str)
                .or_else(|| round_robin(&self.endpoints, &mut state.endpoint_counter)),
        }
    }
}

fn round_robin<'list>(names: &'list [String], counter: &mut u64) -> Option<&'list str> {
    let len = u64::try_from(names.len()).ok().filter(|len| *len > 0)?;
    let slot = usize::try_from(counter.checked_rem(len)?).ok()?;
    *counter = counter.wrapping_add(1);
    names.get(slot).map(String::as_str)
}
