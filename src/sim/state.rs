//! Simulation context and run state machine
//!
//! Everything a tick reads or writes lives in [`SimState`]: the seeded
//! RNG, the run's base tuning, the player, the NPC pool and progression.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::modifiers::{ActiveGlitch, EffectiveParams, Effects, GLITCHES, RUN_MODIFIERS};
use super::progression::Progression;
use super::traffic::{self, Npc};
use crate::garage::Upgrades;
use crate::tuning::Tuning;

/// Camera rest height above the road (m)
pub const CAMERA_HEIGHT: f32 = 1.8;
/// Camera distance behind the player (m)
pub const CAMERA_BACK: f32 = 5.0;

/// The player's car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Forward speed (m/s), `[0, max_speed]`
    pub speed: f32,
    /// Lateral offset from the road center
    pub x: f32,
    pub vx: f32,
    /// Distance traveled (m)
    pub z: f32,
    /// Score multiplier, `1 + heat * combo_add`
    pub combo: f32,
    pub heat: f32,
    pub score: f32,
    /// Last steering signal (for body roll)
    pub steer: f32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            speed: 0.0,
            x: 0.0,
            vx: 0.0,
            z: 0.0,
            combo: 1.0,
            heat: 0.0,
            score: 0.0,
            steer: 0.0,
        }
    }
}

/// Where the run is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunPhase {
    /// Menu, no run in progress
    #[default]
    Idle,
    Running,
    /// Glitch prompt open; `offer` holds catalog indices
    AwaitingModifierChoice { offer: Vec<usize> },
    /// Run over, waiting to return to the menu
    Crashed,
}

/// End-of-run summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrashReport {
    pub score: f32,
    pub overtakes: u32,
    /// Distance traveled (m)
    pub meters: f32,
    /// Credits earned
    pub payout: u64,
}

/// Things that happened during a tick, drained by the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Overtake { oncoming: bool },
    /// New 0-based stage index
    StageAdvanced { stage: usize },
    GlitchOffered { offer: Vec<usize> },
    GlitchStarted { index: usize },
    GlitchExpired { index: usize },
    Crashed(CrashReport),
}

/// Owned simulation context
#[derive(Debug, Clone)]
pub struct SimState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Base table for the run (settings already applied)
    pub tuning: Tuning,
    /// Garage levels captured at run start
    pub upgrades: Upgrades,
    /// Index into `RUN_MODIFIERS`
    pub run_modifier: Option<usize>,
    pub glitch: Option<ActiveGlitch>,
    pub phase: RunPhase,
    pub player: PlayerState,
    pub npcs: Vec<Npc>,
    pub progression: Progression,
    /// Simulated seconds since run start
    pub run_time: f32,
    /// Smoothed camera eye, player frame (player at z = 0)
    pub camera: Vec3,
    /// Smallest time-to-collision seen last tick
    pub min_ttc: f32,
    /// Parameters used by the last tick
    pub params: EffectiveParams,
    pub last_crash: Option<CrashReport>,
    /// Events since the last drain
    pub events: Vec<SimEvent>,
}

impl SimState {
    /// Idle simulation with the given seed
    pub fn new(seed: u64, tuning: Tuning, upgrades: Upgrades) -> Self {
        let params = EffectiveParams::derive(&tuning, &upgrades, &Effects::NONE, None, 0);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            upgrades,
            run_modifier: None,
            glitch: None,
            phase: RunPhase::Idle,
            player: PlayerState::default(),
            npcs: Vec::new(),
            progression: Progression::default(),
            run_time: 0.0,
            camera: Vec3::new(0.0, CAMERA_HEIGHT, -CAMERA_BACK),
            min_ttc: f32::INFINITY,
            params,
            last_crash: None,
            events: Vec::new(),
        }
    }

    /// Reset the run and start driving.
    ///
    /// `run_modifier` is an index into `RUN_MODIFIERS`; out-of-range
    /// indices are a caller bug and run without a modifier.
    pub fn start_run(&mut self, tuning: Tuning, upgrades: Upgrades, run_modifier: Option<usize>) {
        let run_modifier = match run_modifier {
            Some(i) if i >= RUN_MODIFIERS.len() => {
                debug_assert!(false, "run modifier index {i} out of range");
                log::warn!("Ignoring run modifier index {i}");
                None
            }
            other => other,
        };

        self.tuning = tuning;
        self.upgrades = upgrades;
        self.run_modifier = run_modifier;
        self.glitch = None;
        self.player = PlayerState::default();
        self.npcs = traffic::seed_pool(&self.tuning, &mut self.rng);
        self.progression = Progression::default();
        self.run_time = 0.0;
        self.camera = Vec3::new(0.0, CAMERA_HEIGHT, -CAMERA_BACK);
        self.min_ttc = f32::INFINITY;
        self.last_crash = None;
        self.events.clear();
        self.params = self.derive_params();
        self.phase = RunPhase::Running;

        log::info!(
            "Run started (seed {}, modifier {}, {} NPCs)",
            self.seed,
            self.run_effects_name(),
            self.npcs.len()
        );
    }

    fn run_effects_name(&self) -> &'static str {
        self.run_modifier
            .map(|i| RUN_MODIFIERS[i].name)
            .unwrap_or("none")
    }

    /// Effects of the chosen run modifier
    pub fn run_effects(&self) -> Effects {
        self.run_modifier
            .map(|i| RUN_MODIFIERS[i].effects)
            .unwrap_or(Effects::NONE)
    }

    /// Fold base tuning, upgrades, run modifier and glitch for the current stage
    pub fn derive_params(&self) -> EffectiveParams {
        let run = self.run_effects();
        let glitch = self.glitch.map(|g| g.glitch().effects);
        EffectiveParams::derive(
            &self.tuning,
            &self.upgrades,
            &run,
            glitch.as_ref(),
            self.progression.stage,
        )
    }

    /// Resolve the open glitch prompt with a catalog index from the offer.
    ///
    /// Returns false (nothing changed) when no prompt is open or the index
    /// was not offered.
    pub fn choose_glitch(&mut self, index: usize) -> bool {
        let RunPhase::AwaitingModifierChoice { offer } = &self.phase else {
            log::warn!("Glitch choice {index} with no prompt open");
            return false;
        };
        if !offer.contains(&index) {
            debug_assert!(false, "glitch {index} was not offered ({offer:?})");
            log::warn!("Ignoring glitch choice {index}, not in offer {offer:?}");
            return false;
        }

        let active = ActiveGlitch::start(index);
        log::info!(
            "Glitch started: {} ({:.0}s)",
            GLITCHES[index].name,
            active.remaining
        );
        self.glitch = Some(active);
        self.params = self.derive_params();
        self.events.push(SimEvent::GlitchStarted { index });
        self.phase = RunPhase::Running;
        true
    }

    /// Leave the crash screen
    pub fn return_to_menu(&mut self) {
        if self.phase == RunPhase::Crashed {
            self.phase = RunPhase::Idle;
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> SimState {
        SimState::new(42, Tuning::default(), Upgrades::default())
    }

    #[test]
    fn test_new_is_idle() {
        let state = fresh();
        assert_eq!(state.phase, RunPhase::Idle);
        assert!(state.npcs.is_empty());
        assert_eq!(state.player.combo, 1.0);
    }

    #[test]
    fn test_start_run_resets() {
        let mut state = fresh();
        state.player.score = 99.0;
        state.player.z = 500.0;
        state.start_run(Tuning::default(), Upgrades::default(), Some(0));
        assert_eq!(state.phase, RunPhase::Running);
        assert_eq!(state.player, PlayerState::default());
        assert_eq!(state.npcs.len(), 10);
        assert_eq!(state.run_effects(), RUN_MODIFIERS[0].effects);
        // Nitro raises the cap above the plain stage-1 cap
        assert!(state.params.max_speed > 100.0 / 3.6);
    }

    #[test]
    fn test_choose_glitch_resumes() {
        let mut state = fresh();
        state.start_run(Tuning::default(), Upgrades::default(), None);
        state.phase = RunPhase::AwaitingModifierChoice {
            offer: vec![4, 9, 12],
        };
        assert!(state.choose_glitch(9));
        assert_eq!(state.phase, RunPhase::Running);
        assert_eq!(state.glitch.map(|g| g.index), Some(9));
        assert!(state.events.contains(&SimEvent::GlitchStarted { index: 9 }));
    }

    #[test]
    fn test_choose_glitch_without_prompt() {
        let mut state = fresh();
        state.start_run(Tuning::default(), Upgrades::default(), None);
        assert!(!state.choose_glitch(0));
        assert!(state.glitch.is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_choose_unoffered_glitch_panics_in_debug() {
        let mut state = fresh();
        state.start_run(Tuning::default(), Upgrades::default(), None);
        state.phase = RunPhase::AwaitingModifierChoice {
            offer: vec![1, 2, 3],
        };
        state.choose_glitch(17);
    }

    #[test]
    fn test_return_to_menu_only_from_crash() {
        let mut state = fresh();
        state.start_run(Tuning::default(), Upgrades::default(), None);
        state.return_to_menu();
        assert_eq!(state.phase, RunPhase::Running);
        state.phase = RunPhase::Crashed;
        state.return_to_menu();
        assert_eq!(state.phase, RunPhase::Idle);
    }

    #[test]
    fn test_same_seed_same_pool() {
        let mut a = fresh();
        let mut b = fresh();
        a.start_run(Tuning::default(), Upgrades::default(), None);
        b.start_run(Tuning::default(), Upgrades::default(), None);
        assert_eq!(a.npcs, b.npcs);
    }
}
