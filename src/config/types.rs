use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::selector::SelectionStrategy;

const DEFAULT_DURATION_SECONDS: u64 = 60;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;
const DEFAULT_REQUESTS_PER_SECOND: u64 = 10;
const DEFAULT_RESULT_BUFFER: usize = 1000;
const DEFAULT_METHOD: &str = "GET";

/// Configuration file as written by the user. Every section is optional;
/// missing keys take their defaults, explicit values are validated later.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default)]
    pub base_urls: Vec<String>,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub parameter_generators: BTreeMap<String, Value>,
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointConfig>,
    #[serde(default)]
    pub endpoint_selection: SelectionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Fixed,
    Ramp,
}

impl RunMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Ramp => "ramp",
        }
    }
}

/// How result records reach the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectorMode {
    /// Request tasks send records over a bounded channel to one aggregator.
    #[default]
    Aggregator,
    /// Request tasks append to a shared, locked collector.
    Direct,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfig {
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u64,
    #[serde(default)]
    pub max_in_flight: Option<usize>,
    #[serde(default = "default_result_buffer")]
    pub result_buffer: usize,
    #[serde(default)]
    pub collector: CollectorMode,
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            duration_seconds: DEFAULT_DURATION_SECONDS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            max_in_flight: None,
            result_buffer: DEFAULT_RESULT_BUFFER,
            collector: CollectorMode::default(),
            stages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageConfig {
    pub duration_seconds: u64,
    pub target_rps: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub path: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub path_parameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub query_parameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub body_parameters: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionConfig {
    #[serde(default)]
    pub strategy: SelectionStrategy,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

const fn default_duration_seconds() -> u64 {
    DEFAULT_DURATION_SECONDS
}

const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

const fn default_requests_per_second() -> u64 {
    DEFAULT_REQUESTS_PER_SECOND
}

const fn default_result_buffer() -> usize {
    DEFAULT_RESULT_BUFFER
}

fn default_method() -> String {
    DEFAULT_METHOD.to_owned()
}
