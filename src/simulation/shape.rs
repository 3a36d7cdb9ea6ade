//! # Load Shape Functions
//!
//! Deterministic daily, weekly and seasonal structure of generator load.
//! Every function here is a pure function of absolute UTC calendar time, so
//! two requests covering the same minute always agree on the shape terms.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};
use std::f64::consts::PI;

/// Constant industrial base load before seasonal scaling
pub const BASE_LOAD: f64 = 0.6;
/// Morning peak amplitude in winter months
pub const MORNING_PEAK_WINTER: f64 = 0.35;
/// Morning peak amplitude outside winter
pub const MORNING_PEAK_DEFAULT: f64 = 0.25;
/// Daytime plateau amplitude
pub const DAYTIME_PLATEAU: f64 = 0.15;
/// Evening peak amplitude
pub const EVENING_PEAK: f64 = 0.25;
/// Night reduction amplitude
pub const NIGHT_REDUCTION: f64 = 0.4;
/// Weekend load multiplier
pub const WEEKEND_FACTOR: f64 = 0.9;

/// Length of the cross-fade between adjacent seasonal quarters
pub const SEASON_BLEND_DAYS: f64 = 1.0;

const MORNING_CENTER_H: f64 = 7.5;
const MORNING_SPREAD_H: f64 = 1.0;
const PLATEAU_START_H: f64 = 9.0;
const PLATEAU_CENTER_H: f64 = 13.5;
const PLATEAU_END_H: f64 = 16.0;
const EVENING_CENTER_H: f64 = 19.0;
const EVENING_SPREAD_H: f64 = 1.5;
const NIGHT_START_H: f64 = 22.0;
const NIGHT_LENGTH_H: f64 = 8.0;

/// Fractional hour of day (0.0-24.0)
pub fn hour_of_day(time: DateTime<Utc>) -> f64 {
    time.hour() as f64 + time.minute() as f64 / 60.0
}

/// Winter is day-of-year > 300 or < 60
pub fn is_winter(time: DateTime<Utc>) -> bool {
    let day = time.ordinal();
    day > 300 || day < 60
}

fn gaussian_bump(hour: f64, center: f64, spread: f64) -> f64 {
    let d = hour - center;
    (-(d * d) / (2.0 * spread * spread)).exp()
}

/// Morning peak centered at 07:30
pub fn morning_peak(time: DateTime<Utc>) -> f64 {
    let amplitude = if is_winter(time) {
        MORNING_PEAK_WINTER
    } else {
        MORNING_PEAK_DEFAULT
    };
    amplitude * gaussian_bump(hour_of_day(time), MORNING_CENTER_H, MORNING_SPREAD_H)
}

/// Raised-cosine plateau over 09:00-16:00 with its crest at 13:30
pub fn daytime_plateau(time: DateTime<Utc>) -> f64 {
    let hour = hour_of_day(time);
    if !(PLATEAU_START_H..PLATEAU_END_H).contains(&hour) {
        return 0.0;
    }

    // Rising and falling halves have different widths so the crest sits at 13:30
    let phase = if hour <= PLATEAU_CENTER_H {
        PI * (hour - PLATEAU_CENTER_H) / (PLATEAU_CENTER_H - PLATEAU_START_H)
    } else {
        PI * (hour - PLATEAU_CENTER_H) / (PLATEAU_END_H - PLATEAU_CENTER_H)
    };
    DAYTIME_PLATEAU * 0.5 * (1.0 + phase.cos())
}

/// Evening peak centered at 19:00
pub fn evening_peak(time: DateTime<Utc>) -> f64 {
    EVENING_PEAK * gaussian_bump(hour_of_day(time), EVENING_CENTER_H, EVENING_SPREAD_H)
}

/// Cosine-shaped reduction active 22:00-06:00, deepest at 02:00
pub fn night_reduction(time: DateTime<Utc>) -> f64 {
    let since_start = (hour_of_day(time) - NIGHT_START_H).rem_euclid(24.0);
    if since_start >= NIGHT_LENGTH_H {
        return 0.0;
    }
    NIGHT_REDUCTION * 0.5 * (1.0 - (2.0 * PI * since_start / NIGHT_LENGTH_H).cos())
}

/// Unscaled daily load shape, clipped to [0.3, 1.0]
pub fn daily_shape(time: DateTime<Utc>) -> f64 {
    let raw = BASE_LOAD + morning_peak(time) + daytime_plateau(time) + evening_peak(time)
        - night_reduction(time);
    raw.clamp(0.3, 1.0)
}

fn ordinal0_of(year: i32, month: u32) -> f64 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.ordinal0() as f64)
        .unwrap_or_default()
}

/// Seasonal curve of one quarter at progress `p` in `[0, 1)`
fn quarter_curve(quarter: usize, p: f64) -> f64 {
    match quarter {
        0 => 1.4 + 0.2 * p + 0.05 * (6.0 * PI * p).sin(),
        1 => 1.0 - 0.3 * p,
        2 => 0.7 + 0.1 * p + 0.03 * (4.0 * PI * p).sin(),
        _ => 0.8 + 0.6 * p,
    }
}

/// Seasonal multiplier, piecewise by quarter of the year.
///
/// Uses a fractional day-of-year so the factor moves every minute rather
/// than stepping at midnight. Over the last `SEASON_BLEND_DAYS` of each
/// quarter the curve cross-fades into the start of the next one, so the
/// factor is continuous at every quarter seam, including the new year.
pub fn seasonal_factor(time: DateTime<Utc>) -> f64 {
    let year = time.year();
    let day = time.ordinal0() as f64 + (time.hour() * 60 + time.minute()) as f64 / 1440.0;
    let days_in_year = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366.0
    } else {
        365.0
    };

    let bounds = [
        0.0,
        ordinal0_of(year, 4),
        ordinal0_of(year, 7),
        ordinal0_of(year, 10),
        days_in_year,
    ];
    let quarter = (0..4).find(|&q| day < bounds[q + 1]).unwrap_or(3);
    let (from, to) = (bounds[quarter], bounds[quarter + 1]);
    let value = quarter_curve(quarter, (day - from) / (to - from));

    let remaining = to - day;
    if remaining >= SEASON_BLEND_DAYS {
        return value;
    }
    let weight = 0.5 * (1.0 - (PI * (1.0 - remaining / SEASON_BLEND_DAYS)).cos());
    let next = quarter_curve((quarter + 1) % 4, 0.0);
    value * (1.0 - weight) + next * weight
}

/// Weekend multiplier
pub fn weekly_factor(time: DateTime<Utc>) -> f64 {
    match time.weekday() {
        Weekday::Sat | Weekday::Sun => WEEKEND_FACTOR,
        _ => 1.0,
    }
}

/// Seasonally scaled daily pattern, the shape input of the load factor
pub fn daily_pattern(time: DateTime<Utc>) -> f64 {
    daily_shape(time) * seasonal_factor(time)
}
