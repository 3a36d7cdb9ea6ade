//! # Synthetic Telemetry Simulation
//!
//! Deterministic, minute-resolution telemetry for simulated power
//! generation assets.
//!
//! ## Components
//!
//! - **Profile**: static asset characteristics derived from the asset id
//! - **Shape**: daily, weekly and seasonal load structure (no randomness)
//! - **Noise**: independently seeded layers at several time scales
//! - **Pattern**: shape + noise combined into the load factor
//! - **Derivation**: load factor mapped to engineering-unit channels
//! - **Record**: rounding and packaging into flat per-minute records
//! - **Generator**: the entry point tying the stages together
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use synthetic_telemetry::simulation::TelemetryGenerator;
//!
//! let generator = TelemetryGenerator::default();
//! let start = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2024, 1, 15, 8, 5, 0).unwrap();
//!
//! let records = generator.generate("GEN-001", start, end).unwrap();
//! assert_eq!(records.len(), 5);
//! ```

pub mod derivation;
pub mod error;
pub mod generator;
pub mod noise;
pub mod pattern;
pub mod profile;
pub mod record;
pub mod seed;
pub mod shape;

pub use derivation::{derive_channels, ChannelSeries};
pub use error::GeneratorError;
pub use generator::{floor_to_minute, minute_count, GenerationRequest, TelemetryGenerator};
pub use noise::{
    HighFrequencyNoise, HourlyNoise, MediumFrequencyNoise, NoiseConfig, NoiseLayer, NoiseStack,
    RandomWalkNoise, SeriesWindow, StepChangeNoise,
};
pub use pattern::{LoadFactorSeries, PatternSynthesizer, MAX_LOAD_FACTOR, MIN_LOAD_FACTOR};
pub use profile::{AssetProfile, ProfileRegistry};
pub use record::{emit_records, round_to, round_within, Channel, TelemetryRecord};
