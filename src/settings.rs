//! Player-adjustable tuning
//!
//! The in-game tuning panel: a handful of sliders layered over the base
//! `Tuning` at run start. Persisted separately from the garage.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError};
use crate::tuning::Tuning;

/// Slider ranges (min, max)
pub const SPEED_SCALE_RANGE: (f32, f32) = (0.5, 2.0);
pub const BASE_ACCEL_RANGE: (f32, f32) = (1.0, 25.0);
pub const BRAKE_ACCEL_RANGE: (f32, f32) = (2.0, 60.0);
pub const FOV_MIN_RANGE: (f32, f32) = (40.0, 85.0);
pub const FOV_MAX_LIMIT: f32 = 95.0;
pub const HITBOX_X_RANGE: (f32, f32) = (0.2, 1.5);
pub const HITBOX_Z_RANGE: (f32, f32) = (0.4, 3.0);

/// Tuning panel values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Top speed multiplier
    pub speed_scale: f32,
    /// Acceleration (m/s²)
    pub base_accel: f32,
    /// Braking (m/s²)
    pub brake_accel: f32,

    // === Camera ===
    pub fov_min: f32,
    pub fov_max: f32,

    // === Hitbox extras (m) ===
    pub hitbox_x_extra: f32,
    pub hitbox_z_extra: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_tuning(&Tuning::default())
    }
}

impl Settings {
    /// LocalStorage / file key
    pub const STORAGE_KEY: &'static str = "eo_settings";

    /// Panel values matching a tuning table
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            speed_scale: tuning.speed_scale,
            base_accel: tuning.base_accel,
            brake_accel: tuning.brake_accel,
            fov_min: tuning.fov_min,
            fov_max: tuning.fov_max,
            hitbox_x_extra: tuning.hitbox_x_extra,
            hitbox_z_extra: tuning.hitbox_z_extra,
        }
    }

    /// Pull every value back into its slider range
    pub fn clamped(&self) -> Self {
        let clamp = |v: f32, (lo, hi): (f32, f32)| v.clamp(lo, hi);
        let fov_min = clamp(self.fov_min, FOV_MIN_RANGE);
        Self {
            speed_scale: clamp(self.speed_scale, SPEED_SCALE_RANGE),
            base_accel: clamp(self.base_accel, BASE_ACCEL_RANGE),
            brake_accel: clamp(self.brake_accel, BRAKE_ACCEL_RANGE),
            fov_min,
            // Max slider starts one degree above the min
            fov_max: clamp(self.fov_max, (fov_min + 1.0, FOV_MAX_LIMIT)),
            hitbox_x_extra: clamp(self.hitbox_x_extra, HITBOX_X_RANGE),
            hitbox_z_extra: clamp(self.hitbox_z_extra, HITBOX_Z_RANGE),
        }
    }

    /// Base table for a run: `base` with the (clamped) panel values applied
    pub fn apply(&self, base: &Tuning) -> Tuning {
        let s = self.clamped();
        Tuning {
            speed_scale: s.speed_scale,
            base_accel: s.base_accel,
            brake_accel: s.brake_accel,
            fov_min: s.fov_min,
            fov_max: s.fov_max,
            hitbox_x_extra: s.hitbox_x_extra,
            hitbox_z_extra: s.hitbox_z_extra,
            ..base.clone()
        }
    }

    /// Load settings, falling back to defaults
    pub fn load_from<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        if let Ok(Some(json)) = store.load(Self::STORAGE_KEY) {
            if let Ok(settings) = serde_json::from_str::<Settings>(&json) {
                log::info!("Loaded settings");
                return settings.clamped();
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings; failures are logged
    pub fn save_to<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        let result = serde_json::to_string(self)
            .map_err(StoreError::from)
            .and_then(|json| store.save(Self::STORAGE_KEY, &json));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Unable to save settings: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_default_matches_tuning() {
        let tuning = Tuning::default();
        assert_eq!(Settings::default().apply(&tuning), tuning);
    }

    #[test]
    fn test_clamped_to_slider_ranges() {
        let wild = Settings {
            speed_scale: 9.0,
            base_accel: 0.0,
            brake_accel: 100.0,
            fov_min: 80.0,
            fov_max: 50.0,
            hitbox_x_extra: -1.0,
            hitbox_z_extra: 10.0,
        };
        let s = wild.clamped();
        assert_eq!(s.speed_scale, 2.0);
        assert_eq!(s.base_accel, 1.0);
        assert_eq!(s.brake_accel, 60.0);
        assert_eq!(s.fov_min, 80.0);
        assert_eq!(s.fov_max, 81.0);
        assert_eq!(s.hitbox_x_extra, 0.2);
        assert_eq!(s.hitbox_z_extra, 3.0);
    }

    #[test]
    fn test_apply_leaves_other_fields() {
        let settings = Settings {
            base_accel: 12.0,
            ..Default::default()
        };
        let tuning = settings.apply(&Tuning::default());
        assert_eq!(tuning.base_accel, 12.0);
        assert_eq!(tuning.lateral_accel, Tuning::default().lateral_accel);
    }

    #[test]
    fn test_store_roundtrip() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            speed_scale: 1.5,
            ..Default::default()
        };
        settings.save_to(&mut store);
        assert_eq!(Settings::load_from(&store), settings);
    }

    #[test]
    fn test_garbage_loads_defaults() {
        let mut store = MemoryStore::new();
        store.save(Settings::STORAGE_KEY, "][").unwrap();
        assert_eq!(Settings::load_from(&store), Settings::default());
    }
}
