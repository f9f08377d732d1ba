use std::path::PathBuf;
use thiserror::Error;

use super::GenerationError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse YAML config '{path}': {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml, .json, .yaml or .yml.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have a .toml, .json, .yaml or .yml extension.")]
    MissingExtension,
    #[error("No config file given and none of {candidates} exists.")]
    NoConfigFound { candidates: String },
    #[error("requestsPerSecond must be >= 1.")]
    RateMustBePositive,
    #[error("durationSeconds must be >= 1.")]
    DurationMustBePositive,
    #[error("requestTimeoutMs must be >= 1.")]
    TimeoutMustBePositive,
    #[error("resultBuffer must be >= 1.")]
    ResultBufferMustBePositive,
    #[error("maxInFlight must be >= 1 when set.")]
    MaxInFlightMustBePositive,
    #[error("No endpoints configured.")]
    NoEndpoints,
    #[error("No base URLs configured.")]
    NoBaseUrls,
    #[error("Invalid HTTP method '{method}' for endpoint '{endpoint}'.")]
    InvalidMethod { endpoint: String, method: String },
    #[error("Invalid header '{header}' for endpoint '{endpoint}'.")]
    InvalidHeader { endpoint: String, header: String },
    #[error("Ramp mode requires at least one entry in execution.stages.")]
    RampWithoutStages,
    #[error("Ramp stage {index} must have durationSeconds >= 1.")]
    RampStageDurationZero { index: usize },
    #[error("Weight for endpoint '{endpoint}' must be a finite number >= 0.")]
    InvalidWeight { endpoint: String },
    #[error("Weight given for unknown endpoint '{endpoint}'.")]
    WeightForUnknownEndpoint { endpoint: String },
    #[error("Failed to create named generator '{name}': {source}")]
    InvalidGenerator {
        name: String,
        #[source]
        source: GenerationError,
    },
    #[error("Named generators form a reference cycle: {path}.")]
    ReferenceCycle { path: String },
}
