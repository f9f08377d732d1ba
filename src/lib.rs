//! Core library for the `ratefire` CLI.
//!
//! This crate provides the building blocks used by the binary: parameter
//! generators, target selection, request execution, rate scheduling, metrics
//! aggregation, and report rendering. The primary user-facing interface is
//! the `ratefire` command-line application; library APIs may evolve as the
//! CLI grows.
pub mod args;
pub mod config;
pub mod error;
pub mod generator;
pub mod http;
pub mod metrics;
pub mod report;
pub mod scheduler;
pub mod selector;
