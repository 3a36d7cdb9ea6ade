//! # Telemetry Records
//!
//! Flat per-minute records as delivered to consumers. Output rounding is
//! part of the record contract: every channel has a fixed precision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

use super::derivation::{co2_kg_per_min, series_times, ChannelSeries};
use super::pattern::{MAX_LOAD_FACTOR, MIN_LOAD_FACTOR};
use super::profile::AssetProfile;

/// Emitted telemetry channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr, Display)]
pub enum Channel {
    #[strum(serialize = "power_gen_MW")]
    PowerGen,
    #[strum(serialize = "fuel_flow_kg_h")]
    FuelFlow,
    #[strum(serialize = "engine_load_percent")]
    EngineLoad,
    #[strum(serialize = "engine_rpm")]
    EngineRpm,
    #[strum(serialize = "engine_temp_C")]
    EngineTemp,
    #[strum(serialize = "ambient_temp_C")]
    AmbientTemp,
    #[strum(serialize = "voltage_V")]
    Voltage,
    #[strum(serialize = "current_A")]
    Current,
    #[strum(serialize = "frequency_Hz")]
    Frequency,
    #[strum(serialize = "battery_soc_percent")]
    BatterySoc,
    #[strum(serialize = "battery_power_MW")]
    BatteryPower,
    #[strum(serialize = "co2_emissions_kg_min")]
    Co2Emissions,
    #[strum(serialize = "efficiency_percent")]
    Efficiency,
}

impl Channel {
    /// Decimal places kept in the emitted value
    pub const fn precision(self) -> i32 {
        match self {
            Channel::EngineRpm | Channel::Voltage => 0,
            Channel::EngineLoad
            | Channel::EngineTemp
            | Channel::AmbientTemp
            | Channel::Current
            | Channel::BatterySoc
            | Channel::Efficiency => 1,
            Channel::PowerGen
            | Channel::FuelFlow
            | Channel::Frequency
            | Channel::BatteryPower => 2,
            Channel::Co2Emissions => 3,
        }
    }

    /// Round `value` to this channel's precision
    pub fn round(self, value: f64) -> f64 {
        round_to(value, self.precision())
    }
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Round to `places` decimals without leaving `[min, max]`.
///
/// A value whose nearest rounding falls outside the interval is rounded
/// toward it instead, to the closest representable step still inside.
pub fn round_within(value: f64, places: i32, min: f64, max: f64) -> f64 {
    let scale = 10f64.powi(places);
    let rounded = round_to(value, places);
    if rounded > max {
        let steps = (max * scale).floor();
        if steps / scale > max {
            (steps - 1.0) / scale
        } else {
            steps / scale
        }
    } else if rounded < min {
        let steps = (min * scale).ceil();
        if steps / scale < min {
            (steps + 1.0) / scale
        } else {
            steps / scale
        }
    } else {
        rounded
    }
}

/// One minute of telemetry for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub asset_id: String,
    #[serde(rename = "power_gen_MW")]
    pub power_gen_mw: f64,
    pub fuel_flow_kg_h: f64,
    pub engine_load_percent: f64,
    pub engine_rpm: f64,
    #[serde(rename = "engine_temp_C")]
    pub engine_temp_c: f64,
    #[serde(rename = "ambient_temp_C")]
    pub ambient_temp_c: f64,
    #[serde(rename = "voltage_V")]
    pub voltage_v: f64,
    #[serde(rename = "current_A")]
    pub current_a: f64,
    #[serde(rename = "frequency_Hz")]
    pub frequency_hz: f64,
    pub battery_soc_percent: f64,
    #[serde(rename = "battery_power_MW")]
    pub battery_power_mw: f64,
    pub co2_emissions_kg_min: f64,
    pub efficiency_percent: f64,
}

impl TelemetryRecord {
    /// Value of a channel by name
    pub fn channel(&self, channel: Channel) -> f64 {
        match channel {
            Channel::PowerGen => self.power_gen_mw,
            Channel::FuelFlow => self.fuel_flow_kg_h,
            Channel::EngineLoad => self.engine_load_percent,
            Channel::EngineRpm => self.engine_rpm,
            Channel::EngineTemp => self.engine_temp_c,
            Channel::AmbientTemp => self.ambient_temp_c,
            Channel::Voltage => self.voltage_v,
            Channel::Current => self.current_a,
            Channel::Frequency => self.frequency_hz,
            Channel::BatterySoc => self.battery_soc_percent,
            Channel::BatteryPower => self.battery_power_mw,
            Channel::Co2Emissions => self.co2_emissions_kg_min,
            Channel::Efficiency => self.efficiency_percent,
        }
    }
}

/// Zip timestamps and channel values into records, in time order.
///
/// CO2 is computed from the rounded fuel flow so the emitted pair always
/// satisfies `co2 = round(fuel × 2.68 / 60, 3)`. Power stays inside the
/// asset's operating range after rounding.
pub fn emit_records(
    profile: &AssetProfile,
    start: DateTime<Utc>,
    channels: &ChannelSeries,
) -> Vec<TelemetryRecord> {
    let min_power = MIN_LOAD_FACTOR * profile.max_power;
    let max_power = MAX_LOAD_FACTOR * profile.max_power;
    series_times(start, channels.len())
        .into_iter()
        .enumerate()
        .map(|(i, timestamp)| {
            let fuel_flow_kg_h = Channel::FuelFlow.round(channels.fuel_flow_kg_h[i]);
            TelemetryRecord {
                timestamp,
                asset_id: profile.asset_id.clone(),
                power_gen_mw: round_within(
                    channels.power_gen_mw[i],
                    Channel::PowerGen.precision(),
                    min_power,
                    max_power,
                ),
                fuel_flow_kg_h,
                engine_load_percent: Channel::EngineLoad.round(channels.engine_load_percent[i]),
                engine_rpm: Channel::EngineRpm.round(channels.engine_rpm[i]),
                engine_temp_c: Channel::EngineTemp.round(channels.engine_temp_c[i]),
                ambient_temp_c: Channel::AmbientTemp.round(channels.ambient_temp_c[i]),
                voltage_v: Channel::Voltage.round(channels.voltage_v[i]),
                current_a: Channel::Current.round(channels.current_a[i]),
                frequency_hz: Channel::Frequency.round(channels.frequency_hz[i]),
                battery_soc_percent: Channel::BatterySoc.round(channels.battery_soc_percent[i]),
                battery_power_mw: Channel::BatteryPower.round(channels.battery_power_mw[i]),
                co2_emissions_kg_min: Channel::Co2Emissions.round(co2_kg_per_min(fuel_flow_kg_h)),
                efficiency_percent: Channel::Efficiency.round(channels.efficiency_percent[i]),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use strum::IntoEnumIterator;

    fn profile(max_power: f64) -> AssetProfile {
        AssetProfile {
            asset_id: "GEN-001".to_string(),
            max_power,
            efficiency: 0.4,
            fuel_rate_at_max: 230.0,
            base_temp: 30.0,
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.235001, 2), 1.24);
        assert_eq!(round_to(1499.6, 0), 1500.0);
        assert_eq!(round_to(-0.125001, 2), -0.13);
    }

    #[test]
    fn test_round_within_rounds_toward_interval() {
        let max = 49.51567754922617;
        assert_eq!(round_within(max, 2, 0.25 * max, max), 49.51);
        assert_eq!(round_within(30.126, 2, 0.25 * max, max), 30.13);

        let min = 0.25 * 41.98;
        let low = round_within(min, 2, min, 41.98);
        assert_eq!(low, 10.5);
        assert!(low >= min);
    }

    #[test]
    fn test_emitted_power_never_exceeds_rating() {
        let max_power = 49.51567754922617;
        let channels = ChannelSeries {
            power_gen_mw: vec![max_power, 0.25 * max_power],
            efficiency_curve: vec![1.0, 0.83],
            fuel_flow_kg_h: vec![260.0, 80.0],
            engine_load_percent: vec![100.0, 25.0],
            engine_rpm: vec![1500.0, 1500.0],
            engine_temp_c: vec![90.0, 60.0],
            ambient_temp_c: vec![5.0, 5.0],
            voltage_v: vec![11000.0, 11000.0],
            current_a: vec![3057.0, 764.0],
            frequency_hz: vec![50.0, 50.0],
            battery_soc_percent: vec![60.0, 60.0],
            battery_power_mw: vec![0.0, 0.0],
            efficiency_percent: vec![40.0, 33.0],
        };
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 7, 17, 0).unwrap();
        let records = emit_records(&profile(max_power), start, &channels);

        assert_eq!(records[0].power_gen_mw, 49.51);
        assert!(records[0].power_gen_mw <= max_power);
        assert!(records[1].power_gen_mw >= 0.25 * max_power);
    }

    #[test]
    fn test_thirteen_channels() {
        assert_eq!(Channel::iter().count(), 13);
        assert_eq!(Channel::PowerGen.to_string(), "power_gen_MW");
        assert_eq!(Channel::Co2Emissions.precision(), 3);
    }

    #[test]
    fn test_serialized_keys_match_channel_names() {
        let channels = ChannelSeries {
            power_gen_mw: vec![45.678],
            efficiency_curve: vec![0.95],
            fuel_flow_kg_h: vec![432.109],
            engine_load_percent: vec![76.54],
            engine_rpm: vec![1500.4],
            engine_temp_c: vec![71.23],
            ambient_temp_c: vec![28.76],
            voltage_v: vec![11012.6],
            current_a: vec![2.817],
            frequency_hz: vec![50.013],
            battery_soc_percent: vec![63.25],
            battery_power_mw: vec![-0.337],
            efficiency_percent: vec![36.12],
        };
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let records = emit_records(&profile(60.0), start, &channels);
        assert_eq!(records.len(), 1);

        let value = serde_json::to_value(&records[0]).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 15);
        assert_eq!(object["timestamp"], "2024-01-15T08:00:00Z");
        assert_eq!(object["asset_id"], "GEN-001");
        for channel in Channel::iter() {
            let emitted = object[channel.as_ref()].as_f64().unwrap();
            assert_eq!(emitted, records[0].channel(channel));
        }

        let record = &records[0];
        assert_eq!(record.power_gen_mw, 45.68);
        assert_eq!(record.engine_rpm, 1500.0);
        assert_eq!(record.battery_power_mw, -0.34);
        assert_eq!(
            record.co2_emissions_kg_min,
            round_to(record.fuel_flow_kg_h * 2.68 / 60.0, 3)
        );
    }
}
