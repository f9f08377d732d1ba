//! Parameter generation engine.
//!
//! Endpoint parameters are described declaratively as [`GeneratorSpec`]
//! trees. Specs are decoded from configuration once, collected into an
//! immutable [`GeneratorRegistry`] and evaluated on demand. Every evaluation
//! draws fresh randomness; nothing is cached between requests, so concurrent
//! evaluations only share the read-only registry.
mod eval;
mod registry;
mod spec;
mod template;
mod weighted;


pub use eval::{display_value, evaluate, evaluate_with, seeded_rng};
pub use registry::GeneratorRegistry;
pub use spec::{Charset, GeneratorSpec};

pub(crate) use template::render_template;
pub(crate) use weighted::weighted_index;
