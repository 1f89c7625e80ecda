//! Endless Overtake - simulation core for an endless arcade driving game
//!
//! Core modules:
//! - `sim`: Per-frame simulation (vehicle, traffic, collisions, progression)
//! - `session`: Outer driver (menu, run start, prompts, crash payout)
//! - `platform`: Frame timing
//! - `persistence`: Key-value stores for cross-run progression
//! - `tuning`: Data-driven game balance

pub mod garage;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use garage::{Garage, UpgradeKind, Upgrades, upgrade_cost};
pub use session::Session;
pub use settings::Settings;
pub use tuning::{SPEED_STAGES, SpeedStage, Tuning};

/// Game configuration constants
pub mod consts {
    /// Largest elapsed time fed into a single tick (stall protection)
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Hitbox half-extents before the tunable extras are added
    pub const HITBOX_BASE_X: f32 = 0.45;
    pub const HITBOX_BASE_Z: f32 = 1.1;

    /// Visible window for NPCs, relative to the player
    pub const WINDOW_NEAR: f32 = -20.0;
    pub const WINDOW_FAR: f32 = 200.0;

    /// An NPC behind this relative position has been passed
    pub const OVERTAKE_THRESHOLD: f32 = -2.0;
    pub const HEAT_PER_ONCOMING: f32 = 0.15;
    pub const HEAT_PER_SAME: f32 = 0.08;
    /// Heat value that fills the HUD heat bar
    pub const HEAT_BAR_FULL: f32 = 1.5;

    /// Score per meter traveled (before combo and modifiers)
    pub const SCORE_RATE: f32 = 0.5;
    pub const PAYOUT_SCORE_FRACTION: f32 = 0.2;
    pub const PAYOUT_PER_OVERTAKE: f32 = 2.0;

    /// Glitch prompt: per-tick chance once the run is old enough
    pub const GLITCH_CHANCE_PER_TICK: f32 = 0.005;
    pub const GLITCH_MIN_RUN_TIME: f32 = 10.0;
    /// Number of choices offered by run-modifier and glitch prompts
    pub const OFFER_SIZE: usize = 3;
}

/// Meters per second to whole km/h (truncating, as the speedometer shows it)
#[inline]
pub fn kmh(mps: f32) -> i32 {
    (mps * 3.6) as i32
}

/// Hermite smoothstep. Works with reversed edges (edge0 > edge1).
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
