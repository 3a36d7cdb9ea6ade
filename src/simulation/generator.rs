//! # Telemetry Generator
//!
//! Entry point of the simulation: turns `(asset_id, start_time, end_time)`
//! into an ordered sequence of per-minute records.
//!
//! Data flows one way: profile → load factor → channels → records.

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use strum::IntoEnumIterator;
use tracing::debug;

use super::derivation::derive_channels;
use super::error::GeneratorError;
use super::noise::{NoiseConfig, NoiseStack};
use super::pattern::PatternSynthesizer;
use super::profile::{AssetProfile, ProfileRegistry};
use super::record::{emit_records, Channel, TelemetryRecord};

const SELF_CHECK_ASSET: &str = "self-check";

/// A request for one asset over the half-open range `[start_time, end_time)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub asset_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl GenerationRequest {
    pub fn new(asset_id: impl Into<String>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            asset_id: asset_id.into(),
            start_time,
            end_time,
        }
    }
}

/// Truncate sub-minute components
pub fn floor_to_minute(time: DateTime<Utc>) -> DateTime<Utc> {
    time.duration_trunc(Duration::minutes(1)).unwrap_or(time)
}

/// Number of minute samples `floor(start) + k·1min` that fall before `end`
pub fn minute_count(start: DateTime<Utc>, end: DateTime<Utc>) -> usize {
    let start = floor_to_minute(start);
    if end <= start {
        return 0;
    }
    let whole = (end - start).num_minutes();
    let count = if start + Duration::minutes(whole) < end {
        whole + 1
    } else {
        whole
    };
    count as usize
}

/// Deterministic synthetic telemetry source.
///
/// Shared between request handlers; the only mutable state is the profile
/// cache, which serializes first-time creation internally.
#[derive(Debug)]
pub struct TelemetryGenerator {
    profiles: ProfileRegistry,
    synthesizer: PatternSynthesizer,
}

impl Default for TelemetryGenerator {
    fn default() -> Self {
        Self::with_noise(NoiseStack::default())
    }
}

impl TelemetryGenerator {
    /// Build a generator from noise configuration
    pub fn new(noise: &NoiseConfig) -> Result<Self, GeneratorError> {
        Ok(Self::with_noise(NoiseStack::from_config(noise)?))
    }

    pub fn with_noise(noise: NoiseStack) -> Self {
        Self {
            profiles: ProfileRegistry::new(),
            synthesizer: PatternSynthesizer::new(noise),
        }
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    pub fn synthesizer(&self) -> &PatternSynthesizer {
        &self.synthesizer
    }

    pub fn get_or_create_profile(&self, asset_id: &str) -> Arc<AssetProfile> {
        self.profiles.get_or_create(asset_id)
    }

    /// Records for every minute in `[start, end)`.
    ///
    /// `start == end` yields an empty sequence; `start > end` is rejected.
    pub fn generate(
        &self,
        asset_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TelemetryRecord>, GeneratorError> {
        if start > end {
            return Err(GeneratorError::InvalidRange { start, end });
        }

        let started = Instant::now();
        let n_points = minute_count(start, end);
        if n_points == 0 {
            return Ok(Vec::new());
        }

        let start = floor_to_minute(start);
        let profile = self.get_or_create_profile(asset_id);
        let records = self.render(&profile, start, n_points);

        debug!(
            asset_id,
            points = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated telemetry"
        );
        Ok(records)
    }

    /// Run one minute through the full pipeline for a throwaway profile.
    ///
    /// The profile is not cached. Fails when any emitted channel is not finite.
    pub fn self_check(&self) -> Result<(), GeneratorError> {
        let profile = AssetProfile::from_asset_id(SELF_CHECK_ASSET);
        let records = self.render(&profile, DateTime::<Utc>::UNIX_EPOCH, 1);
        let record = records
            .first()
            .ok_or_else(|| GeneratorError::SelfCheck("no record emitted".to_string()))?;
        match Channel::iter().find(|c| !record.channel(*c).is_finite()) {
            Some(channel) => Err(GeneratorError::SelfCheck(format!(
                "{channel} is not finite"
            ))),
            None => Ok(()),
        }
    }

    fn render(
        &self,
        profile: &AssetProfile,
        start: DateTime<Utc>,
        n_points: usize,
    ) -> Vec<TelemetryRecord> {
        let load_factor = self
            .synthesizer
            .synthesize_load_factor(profile, start, n_points);
        let channels = derive_channels(profile, &load_factor, start);
        emit_records(profile, start, &channels)
    }

    pub fn generate_request(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<TelemetryRecord>, GeneratorError> {
        self.generate(&request.asset_id, request.start_time, request.end_time)
    }
}
