//! # Asset Profiles
//!
//! Static physical characteristics of a simulated generation asset, derived
//! once from the asset identifier and cached for the process lifetime.

use parking_lot::RwLock;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::seed::asset_seed;

/// Rated power range in MW
pub const MAX_POWER_RANGE_MW: (f64, f64) = (40.0, 90.0);
/// Base thermal efficiency range (fraction)
pub const EFFICIENCY_RANGE: (f64, f64) = (0.30, 0.45);
/// Fuel consumption at full load in kg/h
pub const FUEL_RATE_RANGE_KG_H: (f64, f64) = (190.0, 270.0);
/// Ambient baseline temperature in °C
pub const BASE_TEMP_RANGE_C: (f64, f64) = (20.0, 40.0);

/// Fixed characterization of one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetProfile {
    /// Opaque identifier, the only seed source
    pub asset_id: String,
    /// Rated power capacity in MW
    pub max_power: f64,
    /// Base thermal efficiency (0.0-1.0)
    pub efficiency: f64,
    /// Reference fuel consumption at full load in kg/h
    pub fuel_rate_at_max: f64,
    /// Ambient baseline temperature in °C
    pub base_temp: f64,
}

impl AssetProfile {
    /// Derive the profile for an asset identifier.
    ///
    /// Values are drawn in a fixed order from an RNG owned by this call, so
    /// the result depends on nothing but `asset_id`.
    pub fn from_asset_id(asset_id: &str) -> Self {
        let mut rng = StdRng::seed_from_u64(asset_seed(asset_id));

        let max_power = rng.gen_range(MAX_POWER_RANGE_MW.0..=MAX_POWER_RANGE_MW.1);
        let efficiency = rng.gen_range(EFFICIENCY_RANGE.0..=EFFICIENCY_RANGE.1);
        let fuel_rate_at_max = rng.gen_range(FUEL_RATE_RANGE_KG_H.0..=FUEL_RATE_RANGE_KG_H.1);
        let base_temp = rng.gen_range(BASE_TEMP_RANGE_C.0..=BASE_TEMP_RANGE_C.1);

        Self {
            asset_id: asset_id.to_string(),
            max_power,
            efficiency,
            fuel_rate_at_max,
            base_temp,
        }
    }
}

/// Process-wide cache of asset profiles keyed by asset id
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: RwLock<HashMap<String, Arc<AssetProfile>>>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached profile for `asset_id`, creating it on first use.
    ///
    /// Creation happens under the write lock, so concurrent first calls for
    /// the same id all observe the single inserted instance.
    pub fn get_or_create(&self, asset_id: &str) -> Arc<AssetProfile> {
        if let Some(profile) = self.profiles.read().get(asset_id) {
            return Arc::clone(profile);
        }

        let mut profiles = self.profiles.write();
        let profile = profiles.entry(asset_id.to_string()).or_insert_with(|| {
            let profile = AssetProfile::from_asset_id(asset_id);
            info!(
                asset_id,
                max_power_mw = profile.max_power,
                efficiency = profile.efficiency,
                base_temp_c = profile.base_temp,
                "created asset profile"
            );
            Arc::new(profile)
        });
        Arc::clone(profile)
    }

    /// Drop a cached profile. Returns whether one was present.
    pub fn evict(&self, asset_id: &str) -> bool {
        self.profiles.write().remove(asset_id).is_some()
    }

    /// Number of cached profiles
    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn in_range(value: f64, range: (f64, f64)) -> bool {
        value >= range.0 && value <= range.1
    }

    #[test]
    fn test_profile_ranges() {
        for id in ["GEN-001", "GEN-002", "power-plant-001", "", "ünïcødé"] {
            let p = AssetProfile::from_asset_id(id);
            assert!(in_range(p.max_power, MAX_POWER_RANGE_MW), "{id}: {}", p.max_power);
            assert!(in_range(p.efficiency, EFFICIENCY_RANGE));
            assert!(in_range(p.fuel_rate_at_max, FUEL_RATE_RANGE_KG_H));
            assert!(in_range(p.base_temp, BASE_TEMP_RANGE_C));
        }
    }

    #[test]
    fn test_profile_deterministic() {
        assert_eq!(
            AssetProfile::from_asset_id("GEN-001"),
            AssetProfile::from_asset_id("GEN-001")
        );
        assert_ne!(
            AssetProfile::from_asset_id("GEN-001").max_power,
            AssetProfile::from_asset_id("GEN-002").max_power
        );
    }

    #[test]
    fn test_registry_caches_and_evicts() {
        let registry = ProfileRegistry::new();
        assert!(registry.is_empty());

        let a = registry.get_or_create("GEN-001");
        let b = registry.get_or_create("GEN-001");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);

        assert!(registry.evict("GEN-001"));
        assert!(!registry.evict("GEN-001"));
        assert_eq!(*registry.get_or_create("GEN-001"), *a);
    }

    #[test]
    fn test_concurrent_first_use_yields_single_instance() {
        let registry = Arc::new(ProfileRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.get_or_create("GEN-RACE"))
            })
            .collect();

        let profiles: Vec<Arc<AssetProfile>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        for p in &profiles[1..] {
            assert!(Arc::ptr_eq(&profiles[0], p));
        }
        assert_eq!(registry.len(), 1);
    }
}
