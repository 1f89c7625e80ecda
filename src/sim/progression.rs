//! Overtakes, stages, heat/combo and score

use serde::{Deserialize, Serialize};

use super::modifiers::EffectiveParams;
use super::state::PlayerState;
use super::traffic::Npc;
use crate::consts::*;
use crate::tuning::{self, SPEED_STAGES};

/// Credits earned by a run ending with `score` and `overtakes`
pub fn crash_payout(score: f32, overtakes: u32) -> u64 {
    let raw = score * PAYOUT_SCORE_FRACTION + overtakes as f32 * PAYOUT_PER_OVERTAKE;
    raw.round().max(0.0) as u64
}

/// Stage and overtake goal tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub overtakes: u32,
    /// 0-based stage index
    pub stage: usize,
    /// Cumulative overtakes needed to leave the current stage
    pub goal: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            overtakes: 0,
            stage: 0,
            goal: SPEED_STAGES[0].goal,
        }
    }
}

impl Progression {
    /// Count one overtake and add its heat. Returns the new stage index
    /// when the goal was reached.
    pub fn register_overtake(&mut self, player: &mut PlayerState, oncoming: bool) -> Option<usize> {
        self.overtakes += 1;
        player.heat += if oncoming {
            HEAT_PER_ONCOMING
        } else {
            HEAT_PER_SAME
        };

        if self.overtakes < self.goal {
            return None;
        }
        self.stage = (self.stage + 1).min(SPEED_STAGES.len() - 1);
        self.goal = tuning::stage(self.stage).goal + self.overtakes;
        Some(self.stage)
    }

    /// Detect an NPC passing behind the player while still closing.
    /// Each NPC counts once per life.
    pub fn check_overtake(
        &mut self,
        npc: &mut Npc,
        player: &mut PlayerState,
    ) -> Option<Option<usize>> {
        if npc.passed || npc.z >= OVERTAKE_THRESHOLD || npc.closing_speed(player.speed) <= 0.0 {
            return None;
        }
        npc.passed = true;
        Some(self.register_overtake(player, npc.is_oncoming()))
    }
}

/// Heat decays linearly; combo follows heat
pub fn update_combo(player: &mut PlayerState, params: &EffectiveParams, dt: f32) {
    let t = &params.tuning;
    player.heat = (player.heat - t.combo_decay * dt).max(0.0);
    player.combo = 1.0 + player.heat * t.combo_add;
}

/// Distance score for one tick
pub fn accrue_score(player: &mut PlayerState, params: &EffectiveParams, dt: f32) {
    player.score += dt * player.speed * SCORE_RATE * player.combo * params.score_multiplier;
}

/// Lane-centering window for the slipstream bonus
pub const SLIPSTREAM_WINDOW: f32 = 0.3;
/// Bonus score per meter when perfectly centered
pub const SLIPSTREAM_RATE: f32 = 0.25;

/// Slipstream: small extra score the closer the player holds to center
pub fn slipstream_bonus(player: &mut PlayerState, dt: f32) {
    let centered = (SLIPSTREAM_WINDOW - player.x.abs()).max(0.0) / SLIPSTREAM_WINDOW;
    player.score += centered * SLIPSTREAM_RATE * player.speed * dt;
}
