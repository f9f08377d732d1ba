use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::error::{ConfigError, GenerationError};
use crate::generator::{GeneratorRegistry, GeneratorSpec, evaluate_with};
use crate::selector::SelectionStrategy;

use super::types::{CollectorMode, ConfigFile, EndpointConfig, RunMode};

/// Endpoint parameter decoded at load time.
///
/// A malformed inline definition does not stop the run: it is kept as the
/// decode error and every attempt that needs it records that failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSpec {
    Ready(GeneratorSpec),
    Invalid(GenerationError),
}

impl ParamSpec {
    #[must_use]
    pub fn decode(definition: &Value) -> Self {
        GeneratorSpec::decode(definition).map_or_else(Self::Invalid, Self::Ready)
    }

    /// Evaluates the parameter, or replays its decode error.
    ///
    /// # Errors
    ///
    /// Returns the stored decode error or the evaluation failure.
    pub fn evaluate_with<R>(
        &self,
        registry: &GeneratorRegistry,
        rng: &mut R,
    ) -> Result<Value, GenerationError>
    where
        R: rand::Rng + rand::CryptoRng + ?Sized,
    {
        match self {
            Self::Ready(spec) => evaluate_with(spec, registry, rng),
            Self::Invalid(err) => Err(err.clone()),
        }
    }
}

/// One endpoint, ready for request building.
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub name: String,
    pub path: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub path_parameters: BTreeMap<String, ParamSpec>,
    pub query_parameters: BTreeMap<String, ParamSpec>,
    pub body: Option<ParamSpec>,
}

impl EndpointSpec {
    /// Prepares a configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown HTTP method or an invalid header.
    pub fn from_config(name: &str, config: &EndpointConfig) -> Result<Self, ConfigError> {
        let method = Method::from_bytes(config.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_err| ConfigError::InvalidMethod {
                endpoint: name.to_owned(),
                method: config.method.clone(),
            })?;

        let mut headers = HeaderMap::with_capacity(config.headers.len());
        for (key, value) in &config.headers {
            let invalid = || ConfigError::InvalidHeader {
                endpoint: name.to_owned(),
                header: key.clone(),
            };
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|_err| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_err| invalid())?;
            headers.insert(header_name, header_value);
        }

        Ok(Self {
            name: name.to_owned(),
            path: config.path.clone(),
            method,
            headers,
            path_parameters: decode_params(&config.path_parameters),
            query_parameters: decode_params(&config.query_parameters),
            body: config.body_parameters.as_ref().map(ParamSpec::decode),
        })
    }

    /// Inline parameters that failed to decode, by location.
    pub fn invalid_parameters(&self) -> impl Iterator<Item = (String, &GenerationError)> {
        let path = self
            .path_parameters
            .iter()
            .map(|(name, spec)| (format!("path parameter {}", name), spec));
        let query = self
            .query_parameters
            .iter()
            .map(|(name, spec)| (format!("query parameter {}", name), spec));
        let body = self.body.iter().map(|spec| ("body".to_owned(), spec));
        path.chain(query)
            .chain(body)
            .filter_map(|(location, spec)| match spec {
                ParamSpec::Invalid(err) => Some((location, err)),
                ParamSpec::Ready(_) => None,
            })
    }
}

/// One ramp stage: reach `target_rps` linearly over `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampStage {
    pub duration: Duration,
    pub target_rps: u64,
}

/// Validated, typed run description.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub mode: RunMode,
    pub duration: Duration,
    pub request_timeout: Duration,
    pub requests_per_second: u64,
    pub max_in_flight: Option<usize>,
    pub result_buffer: usize,
    pub collector: CollectorMode,
    pub stages: Vec<RampStage>,
    pub base_urls: Vec<String>,
    pub endpoints: BTreeMap<String, EndpointSpec>,
    pub selection: SelectionStrategy,
    pub weights: BTreeMap<String, f64>,
}

impl LoadPlan {
    /// Builds and validates a plan from a parsed file.
    ///
    /// Named generators are not part of the plan; build them with
    /// [`GeneratorRegistry::from_definitions`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn from_config(config: &ConfigFile) -> Result<Self, ConfigError> {
        let execution = &config.execution;
        let endpoints = config
            .endpoints
            .iter()
            .map(|(name, endpoint)| {
                EndpointSpec::from_config(name, endpoint).map(|spec| (name.clone(), spec))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let plan = Self {
            mode: execution.mode,
            duration: Duration::from_secs(execution.duration_seconds),
            request_timeout: Duration::from_millis(execution.request_timeout_ms),
            requests_per_second: execution.requests_per_second,
            max_in_flight: execution.max_in_flight,
            result_buffer: execution.result_buffer,
            collector: execution.collector,
            stages: execution
                .stages
                .iter()
                .map(|stage| RampStage {
                    duration: Duration::from_secs(stage.duration_seconds),
                    target_rps: stage.target_rps,
                })
                .collect(),
            base_urls: config.base_urls.clone(),
            endpoints,
            selection: config.endpoint_selection.strategy,
            weights: config.endpoint_selection.weights.clone(),
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Checks every precondition for starting a run.
    ///
    /// # Errors
    ///
    /// Returns the first violated precondition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == RunMode::Fixed && self.requests_per_second == 0 {
            return Err(ConfigError::RateMustBePositive);
        }
        if self.duration.is_zero() {
            return Err(ConfigError::DurationMustBePositive);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::TimeoutMustBePositive);
        }
        if self.result_buffer == 0 {
            return Err(ConfigError::ResultBufferMustBePositive);
        }
        if self.max_in_flight == Some(0) {
            return Err(ConfigError::MaxInFlightMustBePositive);
        }
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        if self.base_urls.is_empty() {
            return Err(ConfigError::NoBaseUrls);
        }
        if self.mode == RunMode::Ramp {
            if self.stages.is_empty() {
                return Err(ConfigError::RampWithoutStages);
            }
            if let Some(index) = self.stages.iter().position(|stage| stage.duration.is_zero()) {
                return Err(ConfigError::RampStageDurationZero { index });
            }
        }
        for (endpoint, weight) in &self.weights {
            if !self.endpoints.contains_key(endpoint) {
                return Err(ConfigError::WeightForUnknownEndpoint {
                    endpoint: endpoint.clone(),
                });
            }
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    endpoint: endpoint.clone(),
                });
            }
        }
        Ok(())
    }

    /// Endpoint names in selection order.
    #[must_use]
    pub fn endpoint_names(&self) -> Vec<String> {
        self.endpoints.keys().cloned().collect()
    }
}

fn decode_params(raw: &BTreeMap<String, Value>) -> BTreeMap<String, ParamSpec> {
    raw.iter()
        .map(|(name, definition)| (name.clone(), ParamSpec::decode(definition)))
        .collect()
}
