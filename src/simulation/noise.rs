//! # Noise Layers
//!
//! Additive pseudo-random contributions to the load factor, each scoped to
//! its own time granularity:
//!
//! - **High frequency**: one Gaussian draw per minute, seeded per request
//! - **Medium frequency**: 30-minute chunks with faded edges, seeded per chunk
//! - **Hourly**: one draw per calendar hour under a half-cosine envelope
//! - **Random walk**: cumulative Gaussian steps, de-drifted to end at zero
//! - **Step change**: occasional equipment switching events every 3 hours
//!
//! Chunked layers (medium, hourly, step change) seed a fresh RNG from the
//! absolute bucket they cover, so a bucket's values never depend on how many
//! draws happened before it. The high-frequency and random-walk layers are
//! seeded from the request start and only agree between requests that share
//! the same `start_time`.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::Range;
use validator::{Validate, ValidationError};

use super::error::GeneratorError;
use super::seed::scoped_rng;

/// Parameters of the noise layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_chunking"))]
#[serde(default)]
pub struct NoiseConfig {
    #[validate(range(min = 0.0, max = 1.0))]
    pub high_frequency_std: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub medium_frequency_std: f64,
    #[validate(range(min = 2, max = 1440))]
    pub medium_chunk_minutes: u32,
    #[validate(range(min = 1, max = 720))]
    pub medium_fade_samples: u32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub hourly_std: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub random_walk_std: f64,
    #[validate(range(min = 1, max = 24))]
    pub step_interval_hours: u32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub step_probability: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub step_std: f64,
    #[validate(range(min = 1, max = 720))]
    pub step_ramp_minutes: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            high_frequency_std: 0.01,
            medium_frequency_std: 0.015,
            medium_chunk_minutes: 30,
            medium_fade_samples: 5,
            hourly_std: 0.02,
            random_walk_std: 0.005,
            step_interval_hours: 3,
            step_probability: 0.3,
            step_std: 0.03,
            step_ramp_minutes: 30,
        }
    }
}

fn validate_chunking(cfg: &NoiseConfig) -> Result<(), ValidationError> {
    if cfg.medium_chunk_minutes < 2 * cfg.medium_fade_samples {
        return Err(ValidationError::new("medium_fade_exceeds_chunk"));
    }
    if cfg.step_interval_hours * 60 < 2 * cfg.step_ramp_minutes {
        return Err(ValidationError::new("step_ramp_exceeds_interval"));
    }
    Ok(())
}

/// The minutes a series covers, as seen by a noise layer
#[derive(Debug, Clone, Copy)]
pub struct SeriesWindow<'a> {
    pub asset_id: &'a str,
    /// Minute-aligned start of the series
    pub start: DateTime<Utc>,
    pub len: usize,
}

impl<'a> SeriesWindow<'a> {
    pub fn new(asset_id: &'a str, start: DateTime<Utc>, len: usize) -> Self {
        Self {
            asset_id,
            start,
            len,
        }
    }

    /// Minutes since the Unix epoch of sample `i`
    pub fn epoch_minute(&self, i: usize) -> i64 {
        self.start.timestamp().div_euclid(60) + i as i64
    }

    /// Split the window into absolute buckets of `bucket_minutes`.
    ///
    /// Calls `visit(bucket_index, output_range, offset_of_first_sample)` once
    /// per bucket touched, in time order.
    fn for_each_bucket(&self, bucket_minutes: i64, mut visit: impl FnMut(i64, Range<usize>, i64)) {
        let mut i = 0usize;
        while i < self.len {
            let minute = self.epoch_minute(i);
            let bucket = minute.div_euclid(bucket_minutes);
            let offset = minute.rem_euclid(bucket_minutes);
            let take = ((bucket_minutes - offset) as usize).min(self.len - i);
            visit(bucket, i..i + take, offset);
            i += take;
        }
    }
}

fn bucket_start(bucket: i64, bucket_minutes: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(bucket * bucket_minutes)
}

fn gaussian<R: Rng>(rng: &mut R, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z * std_dev
}

/// One additive contribution to the load factor
pub trait NoiseLayer: Send + Sync {
    /// Short identifier, also used as the seed scope
    fn name(&self) -> &'static str;

    /// Add this layer's contribution for every sample of `window` into `out`
    fn apply(&self, window: &SeriesWindow<'_>, out: &mut [f64]);
}

/// Per-minute white noise, seeded from the request start
#[derive(Debug, Clone)]
pub struct HighFrequencyNoise {
    pub std_dev: f64,
}

impl NoiseLayer for HighFrequencyNoise {
    fn name(&self) -> &'static str {
        "high-frequency"
    }

    fn apply(&self, window: &SeriesWindow<'_>, out: &mut [f64]) {
        let mut rng = scoped_rng(window.asset_id, self.name(), window.start, 0);
        for slot in out.iter_mut() {
            *slot += gaussian(&mut rng, self.std_dev);
        }
    }
}

/// White noise in absolute chunks with linear fades at the chunk edges
#[derive(Debug, Clone)]
pub struct MediumFrequencyNoise {
    pub std_dev: f64,
    pub chunk_minutes: u32,
    pub fade_samples: u32,
}

impl MediumFrequencyNoise {
    fn envelope(&self, offset: i64) -> f64 {
        if self.fade_samples <= 1 {
            return 1.0;
        }
        let ramp = (self.fade_samples - 1) as f64;
        let from_start = offset as f64 / ramp;
        let from_end = (self.chunk_minutes as i64 - 1 - offset) as f64 / ramp;
        from_start.min(from_end).min(1.0)
    }

    fn chunk_samples(&self, asset_id: &str, chunk: i64) -> Vec<f64> {
        let chunk_minutes = self.chunk_minutes as i64;
        let mut rng = scoped_rng(asset_id, self.name(), bucket_start(chunk, chunk_minutes), chunk);
        (0..chunk_minutes)
            .map(|offset| gaussian(&mut rng, self.std_dev) * self.envelope(offset))
            .collect()
    }
}

impl NoiseLayer for MediumFrequencyNoise {
    fn name(&self) -> &'static str {
        "medium-frequency"
    }

    fn apply(&self, window: &SeriesWindow<'_>, out: &mut [f64]) {
        window.for_each_bucket(self.chunk_minutes as i64, |chunk, range, offset| {
            // The whole chunk is drawn so partial coverage sees the same values
            let samples = self.chunk_samples(window.asset_id, chunk);
            for (k, slot) in out[range].iter_mut().enumerate() {
                *slot += samples[offset as usize + k];
            }
        });
    }
}

/// One draw per calendar hour, faded in and out across the hour
#[derive(Debug, Clone)]
pub struct HourlyNoise {
    pub std_dev: f64,
}

impl NoiseLayer for HourlyNoise {
    fn name(&self) -> &'static str {
        "hourly"
    }

    fn apply(&self, window: &SeriesWindow<'_>, out: &mut [f64]) {
        window.for_each_bucket(60, |hour, range, offset| {
            let mut rng = scoped_rng(window.asset_id, self.name(), bucket_start(hour, 60), hour);
            let value = gaussian(&mut rng, self.std_dev);
            for (k, slot) in out[range].iter_mut().enumerate() {
                let minute = (offset + k as i64) as f64;
                *slot += value * 0.5 * (1.0 - (2.0 * PI * minute / 60.0).cos());
            }
        });
    }
}

/// Cumulative Gaussian walk, de-drifted so it ends where it began
#[derive(Debug, Clone)]
pub struct RandomWalkNoise {
    pub std_dev: f64,
}

impl NoiseLayer for RandomWalkNoise {
    fn name(&self) -> &'static str {
        "random-walk"
    }

    fn apply(&self, window: &SeriesWindow<'_>, out: &mut [f64]) {
        if out.is_empty() {
            return;
        }
        let mut rng = scoped_rng(window.asset_id, self.name(), window.start, 0);
        let mut level = 0.0;
        let walk: Vec<f64> = out
            .iter()
            .map(|_| {
                level += gaussian(&mut rng, self.std_dev);
                level
            })
            .collect();

        let end = walk[walk.len() - 1];
        let span = (walk.len() - 1).max(1) as f64;
        for (i, (slot, value)) in out.iter_mut().zip(&walk).enumerate() {
            let weight = 0.5 * (1.0 - (PI * i as f64 / span).cos());
            *slot += value - end * weight;
        }
    }
}

/// Occasional load steps from equipment switching.
///
/// Each absolute `interval_hours` window fires independently with
/// `probability`. A fired step ramps in over the first `ramp_minutes` of the
/// window, holds, and ramps out over the last `ramp_minutes`.
#[derive(Debug, Clone)]
pub struct StepChangeNoise {
    pub interval_hours: u32,
    pub probability: f64,
    pub std_dev: f64,
    pub ramp_minutes: u32,
}

impl StepChangeNoise {
    /// Step magnitude for a window, zero when the window does not fire
    fn magnitude(&self, asset_id: &str, window_index: i64) -> f64 {
        let window_minutes = self.interval_hours as i64 * 60;
        let mut rng = scoped_rng(
            asset_id,
            self.name(),
            bucket_start(window_index, window_minutes),
            window_index,
        );
        let roll: f64 = rng.gen();
        let step = gaussian(&mut rng, self.std_dev);
        if roll < self.probability {
            step
        } else {
            0.0
        }
    }

    fn envelope(&self, offset: i64) -> f64 {
        let window_minutes = self.interval_hours as i64 * 60;
        let ramp = self.ramp_minutes.max(1) as f64;
        let ramp_in = offset as f64 / ramp;
        let ramp_out = (window_minutes - 1 - offset) as f64 / ramp;
        ramp_in.min(ramp_out).min(1.0)
    }
}

impl NoiseLayer for StepChangeNoise {
    fn name(&self) -> &'static str {
        "step-change"
    }

    fn apply(&self, window: &SeriesWindow<'_>, out: &mut [f64]) {
        let window_minutes = self.interval_hours as i64 * 60;
        window.for_each_bucket(window_minutes, |index, range, offset| {
            let step = self.magnitude(window.asset_id, index);
            if step == 0.0 {
                return;
            }
            for (k, slot) in out[range].iter_mut().enumerate() {
                *slot += step * self.envelope(offset + k as i64);
            }
        });
    }
}

/// The ordered set of noise layers applied to a load-factor series
pub struct NoiseStack {
    layers: Vec<Box<dyn NoiseLayer>>,
}

impl std::fmt::Debug for NoiseStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.layers.iter().map(|l| l.name()))
            .finish()
    }
}

impl Default for NoiseStack {
    fn default() -> Self {
        Self::standard(&NoiseConfig::default())
    }
}

impl NoiseStack {
    /// Build the five standard layers from validated configuration
    pub fn from_config(cfg: &NoiseConfig) -> Result<Self, GeneratorError> {
        cfg.validate()?;
        let params = [
            cfg.high_frequency_std,
            cfg.medium_frequency_std,
            cfg.hourly_std,
            cfg.random_walk_std,
            cfg.step_probability,
            cfg.step_std,
        ];
        if params.iter().any(|v| !v.is_finite()) {
            return Err(GeneratorError::InvalidNoiseConfig(
                "noise parameters must be finite".to_string(),
            ));
        }

        Ok(Self::standard(cfg))
    }

    /// The five standard layers, without validating `cfg`
    fn standard(cfg: &NoiseConfig) -> Self {
        Self::new(vec![
            Box::new(HighFrequencyNoise {
                std_dev: cfg.high_frequency_std,
            }),
            Box::new(MediumFrequencyNoise {
                std_dev: cfg.medium_frequency_std,
                chunk_minutes: cfg.medium_chunk_minutes,
                fade_samples: cfg.medium_fade_samples,
            }),
            Box::new(HourlyNoise {
                std_dev: cfg.hourly_std,
            }),
            Box::new(RandomWalkNoise {
                std_dev: cfg.random_walk_std,
            }),
            Box::new(StepChangeNoise {
                interval_hours: cfg.step_interval_hours,
                probability: cfg.step_probability,
                std_dev: cfg.step_std,
                ramp_minutes: cfg.step_ramp_minutes,
            }),
        ])
    }

    pub fn new(layers: Vec<Box<dyn NoiseLayer>>) -> Self {
        Self { layers }
    }

    /// Sum of all layers for every sample of `window`
    pub fn sample(&self, window: &SeriesWindow<'_>) -> Vec<f64> {
        let mut out = vec![0.0; window.len];
        for layer in &self.layers {
            layer.apply(window, &mut out);
        }
        out
    }

    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name()).collect()
    }
}
