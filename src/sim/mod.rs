//! Simulation core
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Randomness only from the seeded RNG in `SimState`
//! - Stable NPC iteration order (pool order, by ID)
//! - Base tuning never mutated; effective parameters derived every tick

pub mod autopilot;
pub mod collision;
pub mod modifiers;
pub mod progression;
pub mod road;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod traffic;
pub mod vehicle;

pub use autopilot::Autopilot;
pub use collision::{CrashImpulse, Hitbox, apply_crash};
pub use modifiers::{
    ActiveGlitch, EffectiveParams, Effects, FovShift, GLITCHES, Glitch, RUN_MODIFIERS,
    RunModifier, pick_distinct,
};
pub use progression::{Progression, crash_payout};
pub use road::{curve_offset, curve_offset_scaled};
pub use snapshot::{CameraView, Hud, NpcView, RenderFrame, Snapshot, Transform};
pub use state::{CrashReport, PlayerState, RunPhase, SimEvent, SimState};
pub use tick::{TickInput, tick};
pub use traffic::{Direction, Npc};
