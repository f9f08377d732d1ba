use clap::Parser;

use crate::config::ConfigOverrides;
use crate::report::ReportFormat;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Configurable HTTP load generator with randomized parameters, ramp profiles, and latency reports."
)]
pub struct CliArgs {
    /// Path to a TOML, JSON, or YAML config file (defaults to ratefire.toml, ratefire.json, ratefire.yaml, or config.yaml)
    #[arg(value_name = "CONFIG", env = "RATEFIRE_CONFIG")]
    pub config: Option<String>,

    /// Override the run duration in seconds
    #[arg(long = "duration", short = 'd', value_parser = clap::value_parser!(u64).range(1..))]
    pub duration: Option<u64>,

    /// Override the fixed request rate (requests per second)
    #[arg(long = "rate", short = 'r', value_parser = clap::value_parser!(u64).range(1..))]
    pub rate: Option<u64>,

    /// Report output format
    #[arg(long = "format", value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Enable debug logging
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl CliArgs {
    #[must_use]
    pub const fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            duration_seconds: self.duration,
            requests_per_second: self.rate,
        }
    }
}
