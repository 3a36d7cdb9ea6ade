//! Synthetic telemetry service.
//!
//! Deterministically synthesizes minute-resolution operational telemetry for
//! simulated power generation assets and serves it over HTTP.

pub mod api;
pub mod app;
pub mod config;
pub mod observability;
pub mod simulation;
