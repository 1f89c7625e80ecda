//! Cross-run progression: credits and permanent upgrades
//!
//! Persisted through a `KeyValueStore` as
//! `{ credits, upgrades: { accel, brake, maxSpeed, lateral } }`.
//! Loading never fails; anything unreadable yields a fresh garage.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError};

/// Highest exponent used by the upgrade cost curve
pub const MAX_COST_EXPONENT: u32 = 10;

/// Credits needed to buy the next level when at `level`
pub fn upgrade_cost(level: u32) -> u64 {
    10 * (1u64 << level.min(MAX_COST_EXPONENT))
}

/// The four permanent upgrade tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeKind {
    Accel,
    Brake,
    MaxSpeed,
    Lateral,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 4] = [
        UpgradeKind::Accel,
        UpgradeKind::Brake,
        UpgradeKind::MaxSpeed,
        UpgradeKind::Lateral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeKind::Accel => "accel",
            UpgradeKind::Brake => "brake",
            UpgradeKind::MaxSpeed => "maxSpeed",
            UpgradeKind::Lateral => "lateral",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "accel" | "a" => Some(UpgradeKind::Accel),
            "brake" | "b" => Some(UpgradeKind::Brake),
            "maxspeed" | "max_speed" | "s" => Some(UpgradeKind::MaxSpeed),
            "lateral" | "l" => Some(UpgradeKind::Lateral),
            _ => None,
        }
    }
}

/// Permanent upgrade levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Upgrades {
    pub accel: u32,
    pub brake: u32,
    pub max_speed: u32,
    pub lateral: u32,
}

impl Upgrades {
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Accel => self.accel,
            UpgradeKind::Brake => self.brake,
            UpgradeKind::MaxSpeed => self.max_speed,
            UpgradeKind::Lateral => self.lateral,
        }
    }

    fn level_mut(&mut self, kind: UpgradeKind) -> &mut u32 {
        match kind {
            UpgradeKind::Accel => &mut self.accel,
            UpgradeKind::Brake => &mut self.brake,
            UpgradeKind::MaxSpeed => &mut self.max_speed,
            UpgradeKind::Lateral => &mut self.lateral,
        }
    }

    /// +5% acceleration per level
    pub fn accel_bonus(&self) -> f32 {
        1.0 + self.accel as f32 * 0.05
    }

    /// +5% braking per level
    pub fn brake_bonus(&self) -> f32 {
        1.0 + self.brake as f32 * 0.05
    }

    /// +3% top speed per level
    pub fn max_speed_bonus(&self) -> f32 {
        1.0 + self.max_speed as f32 * 0.03
    }

    /// +5% lateral control per level
    pub fn lateral_bonus(&self) -> f32 {
        1.0 + self.lateral as f32 * 0.05
    }
}

/// Persisted meta progression
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Garage {
    pub credits: u64,
    pub upgrades: Upgrades,
}

impl Garage {
    /// Store key
    pub const STORAGE_KEY: &'static str = "eo_meta";

    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a persisted record; malformed input yields `None`
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }

    /// Load from a store, falling back to an empty garage
    pub fn load_from<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        match store.load(Self::STORAGE_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Some(garage) => {
                    log::info!(
                        "Loaded garage: {} credits, upgrades {:?}",
                        garage.credits,
                        garage.upgrades
                    );
                    garage
                }
                None => {
                    log::info!("Garage record unreadable, starting fresh");
                    Self::new()
                }
            },
            Ok(None) => {
                log::info!("No garage found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::info!("Garage load failed ({e}), starting fresh");
                Self::new()
            }
        }
    }

    /// Write to a store
    pub fn try_save_to<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.save(Self::STORAGE_KEY, &json)
    }

    /// Write to a store; failures are logged and the in-memory state kept
    pub fn save_to<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        match self.try_save_to(store) {
            Ok(()) => log::info!("Garage saved ({} credits)", self.credits),
            Err(e) => log::warn!("Unable to save garage: {e}"),
        }
    }

    /// Bank a crash payout
    pub fn credit(&mut self, amount: u64) {
        self.credits = self.credits.saturating_add(amount);
    }

    /// Cost of the next level of `kind`
    pub fn cost_of(&self, kind: UpgradeKind) -> u64 {
        upgrade_cost(self.upgrades.level(kind))
    }

    /// Buy one level of `kind`.
    ///
    /// Returns the new level, or `None` (nothing changed) if credits
    /// don't cover the cost.
    pub fn purchase(&mut self, kind: UpgradeKind) -> Option<u32> {
        let cost = self.cost_of(kind);
        if self.credits < cost {
            return None;
        }
        self.credits -= cost;
        let level = self.upgrades.level_mut(kind);
        *level += 1;
        Some(*level)
    }
}
