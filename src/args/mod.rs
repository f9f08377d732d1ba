//! Command-line arguments.
mod cli;
mod defaults;


pub use cli::CliArgs;

pub(crate) use defaults::DEFAULT_USER_AGENT;
