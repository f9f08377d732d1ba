mod app;
mod config;
mod generation;
mod http;
mod metrics;
mod request;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use generation::GenerationError;
pub use http::HttpError;
pub use metrics::MetricsError;
pub use request::RequestError;
