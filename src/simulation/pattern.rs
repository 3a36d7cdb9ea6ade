//! # Load Factor Synthesis
//!
//! Combines the deterministic shape terms with the noise stack into the
//! dimensionless load factor that drives every engineering channel.

use chrono::{DateTime, Duration, Utc};

use super::noise::{NoiseStack, SeriesWindow};
use super::profile::AssetProfile;
use super::shape::{daily_pattern, weekly_factor};

/// Lowest load factor ever emitted
pub const MIN_LOAD_FACTOR: f64 = 0.25;
/// Highest load factor ever emitted
pub const MAX_LOAD_FACTOR: f64 = 1.0;

const LOAD_OFFSET: f64 = 0.4;
const LOAD_GAIN: f64 = 0.45;

/// Timestamp of sample `i` of a series starting at `start`
pub fn minute_at(start: DateTime<Utc>, i: usize) -> DateTime<Utc> {
    start + Duration::minutes(i as i64)
}

/// Load factor together with the terms it was built from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadFactorSeries {
    /// Final clipped load factor
    pub load_factor: Vec<f64>,
    /// Seasonally scaled daily pattern
    pub daily_pattern: Vec<f64>,
    /// Weekend multiplier
    pub weekly_factor: Vec<f64>,
    /// Summed noise layers
    pub noise: Vec<f64>,
}

impl LoadFactorSeries {
    pub fn len(&self) -> usize {
        self.load_factor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.load_factor.is_empty()
    }
}

/// Builds load factor series for an asset
#[derive(Debug)]
pub struct PatternSynthesizer {
    noise: NoiseStack,
}

impl PatternSynthesizer {
    pub fn new(noise: NoiseStack) -> Self {
        Self { noise }
    }

    pub fn noise(&self) -> &NoiseStack {
        &self.noise
    }

    /// `n_points` load factors in [0.25, 1.0], one per minute from `start`
    pub fn synthesize_load_factor(
        &self,
        profile: &AssetProfile,
        start: DateTime<Utc>,
        n_points: usize,
    ) -> Vec<f64> {
        self.synthesize(profile, start, n_points).load_factor
    }

    /// Full decomposition of the load factor series
    pub fn synthesize(
        &self,
        profile: &AssetProfile,
        start: DateTime<Utc>,
        n_points: usize,
    ) -> LoadFactorSeries {
        if n_points == 0 {
            return LoadFactorSeries::default();
        }

        let window = SeriesWindow::new(&profile.asset_id, start, n_points);
        let noise = self.noise.sample(&window);

        let (daily, weekly): (Vec<f64>, Vec<f64>) = (0..n_points)
            .map(|i| {
                let t = minute_at(start, i);
                (daily_pattern(t), weekly_factor(t))
            })
            .unzip();

        let load_factor = daily
            .iter()
            .zip(&weekly)
            .zip(&noise)
            .map(|((d, w), n)| {
                (LOAD_OFFSET + LOAD_GAIN * d * w + n).clamp(MIN_LOAD_FACTOR, MAX_LOAD_FACTOR)
            })
            .collect();

        LoadFactorSeries {
            load_factor,
            daily_pattern: daily,
            weekly_factor: weekly,
            noise,
        }
    }
}
