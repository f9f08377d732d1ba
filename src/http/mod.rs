//! HTTP request building and execution.
mod client;
mod executor;
mod target;


pub use client::build_client;
pub use executor::RequestExecutor;
