//! Configuration loading and run preparation.
mod apply;
mod loader;
mod plan;
pub mod types;


pub use apply::{ConfigOverrides, apply_overrides};
pub use loader::{DEFAULT_CONFIG_CANDIDATES, load_config, load_config_file};
pub use plan::{EndpointSpec, LoadPlan, ParamSpec, RampStage};
pub use types::{CollectorMode, ConfigFile, RunMode};
