//! # Physical Channel Derivation
//!
//! Maps a load factor series onto engineering-unit channels using
//! closed-form plant relations. The transform is batch-oriented: some
//! channels (battery power) depend on neighbouring samples.
//!
//! Each jittered channel draws from its own stream seeded by
//! `(asset_id, start_time, channel)`, one draw per minute in time order, so
//! a longer request with the same start reproduces every value of a shorter
//! one.

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng};
use rand_distr::StandardNormal;
use std::f64::consts::PI;

use super::pattern::minute_at;
use super::profile::AssetProfile;
use super::seed::scoped_rng;
use super::shape::daily_pattern;

/// Nominal grid frequency in Hz
pub const NOMINAL_FREQUENCY_HZ: f64 = 50.0;
/// Largest frequency deviation ever emitted
pub const MAX_FREQUENCY_DEVIATION_HZ: f64 = 0.2;
/// Nominal line voltage in V (11 kV)
pub const NOMINAL_VOLTAGE_V: f64 = 11_000.0;
/// Power factor used for the current calculation
pub const POWER_FACTOR: f64 = 0.85;
/// Diesel emission factor, kg CO2 per kg fuel
pub const CO2_PER_KG_FUEL: f64 = 2.68;
/// Rated power at or above which the machine runs at 3000 RPM
pub const HIGH_SPEED_THRESHOLD_MW: f64 = 60.0;
/// Battery state-of-charge limits in %
pub const SOC_LIMITS: (f64, f64) = (20.0, 95.0);
/// Battery power limit in MW (charge and discharge)
pub const BATTERY_POWER_LIMIT_MW: f64 = 5.0;

const MINUTES_PER_DAY: f64 = 1440.0;
const MINUTES_PER_WEEK: f64 = MINUTES_PER_DAY * 7.0;

const RPM_JITTER_STD: f64 = 0.5;
const TEMP_JITTER_STD: f64 = 0.5;
const VOLTAGE_JITTER_STD: f64 = 20.0;
const FREQUENCY_JITTER_STD: f64 = 0.02;
const SOC_NOISE_GAIN: f64 = 2.0;
const BATTERY_POWER_JITTER_STD: f64 = 0.05;

/// Unrounded per-minute channel values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSeries {
    pub power_gen_mw: Vec<f64>,
    /// Part-load efficiency multiplier, not emitted
    pub efficiency_curve: Vec<f64>,
    pub fuel_flow_kg_h: Vec<f64>,
    pub engine_load_percent: Vec<f64>,
    pub engine_rpm: Vec<f64>,
    pub engine_temp_c: Vec<f64>,
    pub ambient_temp_c: Vec<f64>,
    pub voltage_v: Vec<f64>,
    pub current_a: Vec<f64>,
    pub frequency_hz: Vec<f64>,
    pub battery_soc_percent: Vec<f64>,
    pub battery_power_mw: Vec<f64>,
    pub efficiency_percent: Vec<f64>,
}

impl ChannelSeries {
    pub fn len(&self) -> usize {
        self.power_gen_mw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power_gen_mw.is_empty()
    }
}

/// Part-load efficiency multiplier
pub fn part_load_efficiency(load_factor: f64) -> f64 {
    0.85 + 0.15 * load_factor - 0.1 * (1.0 - load_factor).powi(2)
}

/// CO2 emitted per minute for a fuel flow in kg/h
pub fn co2_kg_per_min(fuel_flow_kg_h: f64) -> f64 {
    fuel_flow_kg_h * CO2_PER_KG_FUEL / 60.0
}

/// Synchronous speed anchor for a machine of the given rating
pub fn synchronous_rpm(max_power_mw: f64) -> f64 {
    if max_power_mw >= HIGH_SPEED_THRESHOLD_MW {
        3000.0
    } else {
        1500.0
    }
}

fn channel_rng(profile: &AssetProfile, start: DateTime<Utc>, channel: &str) -> StdRng {
    scoped_rng(&profile.asset_id, &format!("channel:{channel}"), start, 0)
}

fn gaussian(rng: &mut StdRng, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z * std_dev
}

/// Derive every channel for a load factor series starting at `start`
pub fn derive_channels(
    profile: &AssetProfile,
    load_factor: &[f64],
    start: DateTime<Utc>,
) -> ChannelSeries {
    let n = load_factor.len();
    if n == 0 {
        return ChannelSeries::default();
    }

    let power_gen_mw: Vec<f64> = load_factor.iter().map(|lf| lf * profile.max_power).collect();
    let efficiency_curve: Vec<f64> = load_factor.iter().map(|lf| part_load_efficiency(*lf)).collect();
    let fuel_flow_kg_h = power_gen_mw
        .iter()
        .zip(&efficiency_curve)
        .map(|(p, eff)| p / eff / profile.efficiency * 3.6)
        .collect();
    let engine_load_percent = load_factor.iter().map(|lf| lf * 100.0).collect();
    let efficiency_percent = efficiency_curve
        .iter()
        .map(|eff| eff * profile.efficiency * 100.0)
        .collect();

    let mut rpm_rng = channel_rng(profile, start, "engine_rpm");
    let anchor = synchronous_rpm(profile.max_power);
    let engine_rpm = (0..n).map(|_| anchor + gaussian(&mut rpm_rng, RPM_JITTER_STD)).collect();

    // Weekly and daily swing shared by engine and ambient temperature
    let mut temp_rng = channel_rng(profile, start, "temperature");
    let temp_variation: Vec<f64> = (0..n)
        .map(|i| {
            let minute = i as f64;
            5.0 * (2.0 * PI * minute / MINUTES_PER_WEEK).sin()
                + 2.0 * (2.0 * PI * minute / MINUTES_PER_DAY).sin()
                + gaussian(&mut temp_rng, TEMP_JITTER_STD)
        })
        .collect();
    let engine_temp_c = load_factor
        .iter()
        .zip(&temp_variation)
        .map(|(lf, tv)| profile.base_temp + 30.0 * lf + tv)
        .collect();
    let ambient_temp_c = temp_variation.iter().map(|tv| profile.base_temp + tv).collect();

    let mut voltage_rng = channel_rng(profile, start, "voltage");
    let voltage_v: Vec<f64> = (0..n)
        .map(|_| NOMINAL_VOLTAGE_V + gaussian(&mut voltage_rng, VOLTAGE_JITTER_STD))
        .collect();
    let current_a = power_gen_mw
        .iter()
        .zip(&voltage_v)
        .map(|(p, v)| p * 1000.0 / (3f64.sqrt() * v * POWER_FACTOR))
        .collect();

    let mut frequency_rng = channel_rng(profile, start, "frequency");
    let frequency_hz = (0..n)
        .map(|_| {
            let deviation = gaussian(&mut frequency_rng, FREQUENCY_JITTER_STD)
                .clamp(-MAX_FREQUENCY_DEVIATION_HZ, MAX_FREQUENCY_DEVIATION_HZ);
            NOMINAL_FREQUENCY_HZ + deviation
        })
        .collect();

    let (battery_soc_percent, battery_power_mw) = derive_battery(profile, start, n);

    ChannelSeries {
        power_gen_mw,
        efficiency_curve,
        fuel_flow_kg_h,
        engine_load_percent,
        engine_rpm,
        engine_temp_c,
        ambient_temp_c,
        voltage_v,
        current_a,
        frequency_hz,
        battery_soc_percent,
        battery_power_mw,
        efficiency_percent,
    }
}

/// Battery state of charge and power for `n` minutes from `start`.
///
/// SOC is evaluated on a series padded by one minute on each side so the
/// central-difference gradient at the window edges does not depend on the
/// request length.
fn derive_battery(profile: &AssetProfile, start: DateTime<Utc>, n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut soc_rng = channel_rng(profile, start, "battery_soc");
    let padded: Vec<f64> = (-1..=n as i64)
        .map(|i| {
            let t = start + chrono::Duration::minutes(i);
            let minute = i as f64;
            let soc = 50.0
                + 20.0 * daily_pattern(t)
                + 10.0 * (2.0 * PI * minute / MINUTES_PER_DAY).sin()
                + SOC_NOISE_GAIN * gaussian(&mut soc_rng, 1.0);
            soc.clamp(SOC_LIMITS.0, SOC_LIMITS.1)
        })
        .collect();

    let mut power_rng = channel_rng(profile, start, "battery_power");
    let power = padded
        .windows(3)
        .map(|w| {
            let gradient = (w[2] - w[0]) / 2.0;
            (-0.5 * gradient + gaussian(&mut power_rng, BATTERY_POWER_JITTER_STD))
                .clamp(-BATTERY_POWER_LIMIT_MW, BATTERY_POWER_LIMIT_MW)
        })
        .collect();

    (padded[1..=n].to_vec(), power)
}

/// Timestamps matching a derived series
pub fn series_times(start: DateTime<Utc>, n: usize) -> Vec<DateTime<Utc>> {
    (0..n).map(|i| minute_at(start, i)).collect()
}
