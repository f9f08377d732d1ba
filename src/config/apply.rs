use super::types::ConfigFile;

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub duration_seconds: Option<u64>,
    pub requests_per_second: Option<u64>,
}

/// Applies command-line overrides on top of a loaded file.
pub fn apply_overrides(config: &mut ConfigFile, overrides: ConfigOverrides) {
    if let Some(duration) = overrides.duration_seconds {
        config.execution.duration_seconds = duration;
    }
    if let Some(rate) = overrides.requests_per_second {
        config.execution.requests_per_second = rate;
    }
}
