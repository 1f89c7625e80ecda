//! NPC traffic: seeding, recycling, lane wander and predictive avoidance
//!
//! The pool is created once per run and never resized. "Respawning" an NPC
//! rewrites its fields in place through [`Npc::randomize`], the same
//! routine used for initial seeding.
//!
//! Positions are in the player's frame: `z` is longitudinal distance ahead
//! of the player (negative = behind). Signed speed follows the closing
//! convention `closing = player_speed + npc.speed`.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::modifiers::EffectiveParams;
use super::road::curve_offset_scaled;
use crate::consts::{WINDOW_FAR, WINDOW_NEAR};
use crate::tuning::Tuning;

/// Travel direction relative to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Same,
    Oncoming,
}

impl Direction {
    /// Speed magnitude range (m/s)
    pub fn speed_range(&self, t: &Tuning) -> (f32, f32) {
        match self {
            Direction::Same => (t.same_speed_min, t.same_speed_max),
            Direction::Oncoming => (t.oncoming_speed_min, t.oncoming_speed_max),
        }
    }

    /// Respawn countdown range (seconds): min, min + variance
    pub fn respawn_range(&self, t: &Tuning) -> (f32, f32) {
        match self {
            Direction::Same => (t.same_respawn_min, t.same_respawn_min + t.same_respawn_var),
            Direction::Oncoming => (
                t.oncoming_respawn_min,
                t.oncoming_respawn_min + t.oncoming_respawn_var,
            ),
        }
    }

    fn sign(&self) -> f32 {
        match self {
            Direction::Same => 1.0,
            Direction::Oncoming => -1.0,
        }
    }
}

/// Uniform sample in `[min, max)`, tolerant of `min >= max`
fn sample<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

/// A computer-controlled car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: u32,
    pub direction: Direction,
    /// Lane side, ±1
    pub lane: f32,
    /// Longitudinal position relative to the player
    pub z: f32,
    /// Signed speed (positive same-direction, negative oncoming)
    pub speed: f32,
    /// Seconds until the NPC may be recycled
    pub respawn: f32,
    pub wander_phase: f32,
    pub wander_freq: f32,
    pub wander_amp: f32,
    /// Avoidance offset, clamped to `±avoid_skill_threshold`
    pub avoid: f32,
    /// Sampled position (lateral x, relative z) used for collision and rendering
    pub pos: Vec2,
    /// Already counted as overtaken since its last respawn
    pub passed: bool,
}

/// Per-tick context shared by every NPC update
#[derive(Debug, Clone, Copy)]
pub struct TrafficFrame<'a> {
    pub params: &'a EffectiveParams,
    pub player_speed: f32,
    pub player_z: f32,
    pub dt: f32,
}

impl Npc {
    pub fn new(id: u32, direction: Direction) -> Self {
        Self {
            id,
            direction,
            lane: 1.0,
            z: 0.0,
            speed: 0.0,
            respawn: 0.0,
            wander_phase: 0.0,
            wander_freq: 0.0,
            wander_amp: 0.0,
            avoid: 0.0,
            pos: Vec2::ZERO,
            passed: false,
        }
    }

    pub fn is_oncoming(&self) -> bool {
        self.direction == Direction::Oncoming
    }

    /// Rewrite every per-life field.
    ///
    /// `slot` is the seeding index at run start (spreads the pool along the
    /// road); `None` places the NPC at the direction's respawn offset.
    pub fn randomize<R: Rng + ?Sized>(&mut self, slot: Option<usize>, t: &Tuning, rng: &mut R) {
        let oncoming = self.is_oncoming();
        self.lane = if rng.random_bool(0.5) { 1.0 } else { -1.0 };

        self.z = match slot {
            Some(i) => {
                let (start, spacing, jitter) = if oncoming {
                    (t.oncoming_seed_z_start, t.oncoming_spacing, t.oncoming_seed_rand)
                } else {
                    (t.same_seed_z_start, t.same_seed_spacing, t.same_seed_rand)
                };
                start + i as f32 * spacing + sample(rng, -jitter, jitter)
            }
            None => {
                let start = if oncoming {
                    t.oncoming_seed_z_start
                } else {
                    t.same_seed_z_start
                };
                start + sample(rng, -t.respawn_jitter, t.respawn_jitter)
            }
        };

        let (lo, hi) = self.direction.speed_range(t);
        self.speed = sample(rng, lo, hi) * self.direction.sign();

        let (lo, hi) = self.direction.respawn_range(t);
        self.respawn = sample(rng, lo, hi);

        self.wander_phase = rng.random::<f32>() * TAU;
        self.wander_freq = sample(rng, t.lane_wander_freq_min, t.lane_wander_freq_max);
        let amp = if oncoming {
            t.lane_wander_amp_oncoming
        } else {
            t.lane_wander_amp_same
        };
        self.wander_amp = amp * sample(rng, 0.7, 1.3);

        self.avoid = 0.0;
        self.passed = false;
    }

    /// Closing speed against a player moving at `player_speed`
    #[inline]
    pub fn closing_speed(&self, player_speed: f32) -> f32 {
        player_speed + self.speed
    }

    /// Inside the visible window
    #[inline]
    pub fn in_window(&self) -> bool {
        self.z >= WINDOW_NEAR && self.z <= WINDOW_FAR
    }

    fn place(&mut self, frame: &TrafficFrame) {
        let t = &frame.params.tuning;
        let wander = self.wander_phase.sin() * self.wander_amp;
        let avoid = self.avoid * t.avoid_x_max;
        let road = curve_offset_scaled(frame.player_z + self.z, frame.params.curve_scale);
        self.pos = Vec2::new(
            self.lane * (1.0 + t.lane_margin_x + wander + avoid) + road,
            self.z,
        );
    }

    /// Motion step: countdown, placement, advance, wander, forced and
    /// regular respawn.
    pub fn update_motion<R: Rng + ?Sized>(&mut self, frame: &TrafficFrame, rng: &mut R) {
        let dt = frame.dt;
        self.respawn = (self.respawn - dt).max(0.0);

        self.place(frame);
        self.z -= self.closing_speed(frame.player_speed) * dt;
        self.wander_phase += self.wander_freq * dt;

        let forced_rate = if self.is_oncoming() {
            frame.params.oncoming_spawn_rate
        } else {
            frame.params.same_spawn_rate
        };
        if forced_rate > 0.0 && rng.random::<f32>() < forced_rate * dt {
            self.respawn = 0.0;
        }

        if !self.in_window() && self.respawn <= 0.0 {
            self.randomize(None, &frame.params.tuning, rng);
            self.place(frame);
            log::debug!(
                "NPC {} respawned ({:?}) at z={:.1} speed={:.1}",
                self.id,
                self.direction,
                self.z,
                self.speed
            );
        }
    }

    /// Predictive avoidance. Nudges toward the opposite lane while the
    /// player is closing in from behind within the lookahead, relaxes
    /// otherwise.
    ///
    /// Returns the time-to-collision when the player is closing on this NPC
    /// from behind, `None` when diverging or already passed.
    pub fn avoid_player(&mut self, player_speed: f32, t: &Tuning, dt: f32) -> Option<f32> {
        let closing = self.closing_speed(player_speed);
        if closing <= 0.0 {
            return None;
        }
        let gap = self.z;
        let ttc = gap / closing;
        if gap > 0.0 && ttc < t.avoid_lookahead_sec {
            let away = if self.lane > 0.0 { -1.0 } else { 1.0 };
            self.avoid += t.avoid_lerp * dt * away;
            self.avoid = self
                .avoid
                .clamp(-t.avoid_skill_threshold, t.avoid_skill_threshold);
        } else {
            self.avoid *= 1.0 - t.avoid_relax_lerp * dt;
        }
        (gap > 0.0).then_some(ttc)
    }
}

/// Build the run's NPC pool
pub fn seed_pool<R: Rng + ?Sized>(t: &Tuning, rng: &mut R) -> Vec<Npc> {
    let mut pool = Vec::with_capacity(t.oncoming_seed_count + t.same_seed_count);
    let mut next_id = 1u32;
    for (direction, count) in [
        (Direction::Oncoming, t.oncoming_seed_count),
        (Direction::Same, t.same_seed_count),
    ] {
        for slot in 0..count {
            let mut npc = Npc::new(next_id, direction);
            npc.randomize(Some(slot), t, rng);
            pool.push(npc);
            next_id += 1;
        }
    }
    pool
}
