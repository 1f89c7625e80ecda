//! Data-driven game balance
//!
//! `Tuning` is the base constant table every tick derives its effective
//! parameters from. It is never mutated during a run.

use serde::{Deserialize, Serialize};

/// One speed tier: its cap and the overtakes needed to leave it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedStage {
    pub cap_kmh: f32,
    pub goal: u32,
}

impl SpeedStage {
    /// Speed cap in m/s
    pub fn cap_mps(&self) -> f32 {
        self.cap_kmh / 3.6
    }
}

/// Stage table (caps strictly increasing)
pub const SPEED_STAGES: [SpeedStage; 7] = [
    SpeedStage { cap_kmh: 100.0, goal: 3 },
    SpeedStage { cap_kmh: 130.0, goal: 4 },
    SpeedStage { cap_kmh: 160.0, goal: 5 },
    SpeedStage { cap_kmh: 190.0, goal: 6 },
    SpeedStage { cap_kmh: 220.0, goal: 7 },
    SpeedStage { cap_kmh: 250.0, goal: 8 },
    SpeedStage { cap_kmh: 280.0, goal: 9 },
];

/// Stage lookup, clamped to the last stage
pub fn stage(index: usize) -> &'static SpeedStage {
    &SPEED_STAGES[index.min(SPEED_STAGES.len() - 1)]
}

/// Base tuning table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player lateral ===
    pub lateral_accel: f32,
    pub damping_x: f32,
    /// Player may drift this far past either lane center
    pub lane_offset_max: f32,
    pub lean_hold_scale: f32,

    // === Player longitudinal (m/s²) ===
    pub base_accel: f32,
    pub brake_accel: f32,
    /// Deceleration applied while not accelerating
    pub auto_down: f32,
    pub speed_scale: f32,

    // === Traffic seeding ===
    pub oncoming_seed_count: usize,
    pub oncoming_seed_z_start: f32,
    pub oncoming_spacing: f32,
    pub oncoming_seed_rand: f32,
    pub same_seed_count: usize,
    pub same_seed_z_start: f32,
    pub same_seed_spacing: f32,
    pub same_seed_rand: f32,
    /// Jitter around the base offset when an NPC is recycled
    pub respawn_jitter: f32,

    // === Traffic respawn countdowns (seconds) ===
    pub oncoming_respawn_min: f32,
    pub oncoming_respawn_var: f32,
    pub same_respawn_min: f32,
    pub same_respawn_var: f32,

    // === Traffic speeds (m/s) ===
    pub oncoming_speed_min: f32,
    pub oncoming_speed_max: f32,
    pub same_speed_min: f32,
    pub same_speed_max: f32,

    // === Traffic lane behavior ===
    pub lane_margin_x: f32,
    pub lane_wander_amp_same: f32,
    pub lane_wander_amp_oncoming: f32,
    pub lane_wander_freq_min: f32,
    pub lane_wander_freq_max: f32,

    // === Avoidance ===
    pub avoid_lookahead_sec: f32,
    /// NPCs this far behind have their respawn countdown cut to zero
    pub avoid_lookahead_dist: f32,
    /// Rendered lateral scale of the avoidance offset
    pub avoid_x_max: f32,
    pub avoid_lerp: f32,
    pub avoid_relax_lerp: f32,
    /// Clamp on the raw avoidance offset
    pub avoid_skill_threshold: f32,
    pub ttc_danger: f32,

    // === Crash ===
    pub crash_rel_speed_same: f32,
    pub crash_impact_oncoming: f32,
    pub crash_push: f32,
    pub crash_kick_vx: f32,

    // === Combo ===
    pub combo_add: f32,
    pub combo_decay: f32,

    // === Hitbox extras (added to base half-extents) ===
    pub hitbox_x_extra: f32,
    pub hitbox_z_extra: f32,

    // === Presentation ===
    pub corridor_red_sec: f32,
    pub corridor_amber_sec: f32,
    pub cam_follow_lerp: f32,
    pub look_pitch_limit: f32,
    pub look_yaw_limit: f32,
    pub fov_min: f32,
    pub fov_max: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            lateral_accel: 28.0,
            damping_x: 6.0,
            lane_offset_max: 0.35,
            lean_hold_scale: 1.5,

            base_accel: 9.5,
            brake_accel: 16.0,
            auto_down: 3.0,
            speed_scale: 1.0,

            oncoming_seed_count: 4,
            oncoming_seed_z_start: 80.0,
            oncoming_spacing: 70.0,
            oncoming_seed_rand: 30.0,
            same_seed_count: 6,
            same_seed_z_start: 50.0,
            same_seed_spacing: 35.0,
            same_seed_rand: 30.0,
            respawn_jitter: 10.0,

            oncoming_respawn_min: 180.0,
            oncoming_respawn_var: 140.0,
            same_respawn_min: 120.0,
            same_respawn_var: 160.0,

            oncoming_speed_min: 16.0,
            oncoming_speed_max: 24.0,
            same_speed_min: 12.0,
            same_speed_max: 23.0,

            lane_margin_x: 0.15,
            lane_wander_amp_same: 0.1,
            lane_wander_amp_oncoming: 0.14,
            lane_wander_freq_min: 0.4,
            lane_wander_freq_max: 0.9,

            avoid_lookahead_sec: 1.6,
            avoid_lookahead_dist: 38.0,
            avoid_x_max: 0.55,
            avoid_lerp: 0.08,
            avoid_relax_lerp: 0.04,
            avoid_skill_threshold: 0.35,
            ttc_danger: 1.0,

            crash_rel_speed_same: 7.0,
            crash_impact_oncoming: 2.0,
            crash_push: 0.5,
            crash_kick_vx: 6.0,

            combo_add: 0.5,
            combo_decay: 0.28,

            hitbox_x_extra: 0.85,
            hitbox_z_extra: 1.6,

            corridor_red_sec: 1.2,
            corridor_amber_sec: 2.5,
            cam_follow_lerp: 0.22,
            look_pitch_limit: 0.35,
            look_yaw_limit: 0.6,
            fov_min: 40.0,
            fov_max: 58.0,
        }
    }
}

impl Tuning {
    /// Lateral bound on the player's offset: `[-bound, bound]`
    pub fn lateral_bound(&self) -> f32 {
        1.0 + self.lane_offset_max
    }
}
