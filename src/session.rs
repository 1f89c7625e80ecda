//! Outer driver: menu, run start, glitch prompts, crash payout
//!
//! Owns the frame clock, the persistent store and everything loaded from
//! it. The browser facade and the headless binary both drive a `Session`.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::OFFER_SIZE;
use crate::garage::{Garage, UpgradeKind};
use crate::persistence::KeyValueStore;
use crate::platform::FrameClock;
use crate::settings::Settings;
use crate::sim::{
    RUN_MODIFIERS, RunPhase, SimEvent, SimState, Snapshot, TickInput, pick_distinct, tick,
};
use crate::tuning::Tuning;

/// Stream offset so menu picks don't share the simulation's sequence
const MENU_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct Session<S: KeyValueStore> {
    store: S,
    garage: Garage,
    settings: Settings,
    base_tuning: Tuning,
    clock: FrameClock,
    sim: SimState,
    menu_rng: Pcg32,
    run_offer: Vec<usize>,
    events: Vec<SimEvent>,
}

impl<S: KeyValueStore> Session<S> {
    /// Load garage and settings from `store`; start idle
    pub fn new(store: S, seed: u64) -> Self {
        let garage = Garage::load_from(&store);
        let settings = Settings::load_from(&store);
        let base_tuning = Tuning::default();
        let sim = SimState::new(seed, settings.apply(&base_tuning), garage.upgrades);
        Self {
            store,
            garage,
            settings,
            base_tuning,
            clock: FrameClock::new(),
            sim,
            menu_rng: Pcg32::seed_from_u64(seed ^ MENU_SEED_SALT),
            run_offer: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn garage(&self) -> &Garage {
        &self.garage
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sim(&self) -> &SimState {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut SimState {
        &mut self.sim
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn phase(&self) -> &RunPhase {
        &self.sim.phase
    }

    /// Run modifiers on offer for the next run (catalog indices)
    pub fn run_offer(&self) -> &[usize] {
        &self.run_offer
    }

    /// Draw a fresh set of run modifiers to choose from
    pub fn offer_run_modifiers(&mut self) -> &[usize] {
        self.run_offer = pick_distinct(&mut self.menu_rng, OFFER_SIZE, RUN_MODIFIERS.len());
        log::info!(
            "Run modifiers on offer: {}",
            self.run_offer
                .iter()
                .map(|&i| RUN_MODIFIERS[i].name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        &self.run_offer
    }

    /// Start a run with run modifier `choice` (a catalog index from the
    /// current offer). Returns false when the choice wasn't offered or a
    /// run is already in progress.
    pub fn start_run(&mut self, choice: usize, now_ms: f64) -> bool {
        if !matches!(self.sim.phase, RunPhase::Idle | RunPhase::Crashed) {
            log::warn!("Run start ignored, run already in progress");
            return false;
        }
        if !self.run_offer.contains(&choice) {
            debug_assert!(false, "run modifier {choice} was not offered");
            log::warn!("Ignoring run modifier {choice}, not in offer {:?}", self.run_offer);
            return false;
        }

        let tuning = self.settings.apply(&self.base_tuning);
        self.sim.start_run(tuning, self.garage.upgrades, Some(choice));
        self.run_offer.clear();
        self.events.clear();
        self.clock.start(now_ms);
        true
    }

    /// One animation frame: advance the clock, tick, settle crashes.
    /// `None` once the clock has been stopped.
    pub fn frame(&mut self, now_ms: f64, input: &TickInput) -> Option<Snapshot> {
        let dt = self.clock.advance(now_ms)?;
        self.step(input, dt);
        Some(Snapshot::capture(&self.sim, input.pointer))
    }

    /// Tick with an explicit `dt` (headless driving)
    pub fn step(&mut self, input: &TickInput, dt: f32) {
        tick(&mut self.sim, input, dt);
        for event in self.sim.drain_events() {
            if let SimEvent::Crashed(report) = &event {
                self.garage.credit(report.payout);
                self.garage.save_to(&mut self.store);
            }
            self.events.push(event);
        }
    }

    /// Events since the last call
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Resolve the open glitch prompt
    pub fn choose_glitch(&mut self, index: usize) -> bool {
        let chosen = self.sim.choose_glitch(index);
        self.events.extend(self.sim.drain_events());
        chosen
    }

    /// Back to the menu after a crash
    pub fn return_to_menu(&mut self) {
        self.sim.return_to_menu();
    }

    /// Buy an upgrade level; saved immediately on success
    pub fn purchase(&mut self, kind: UpgradeKind) -> Option<u32> {
        let level = self.garage.purchase(kind)?;
        log::info!(
            "Purchased {} level {} ({} credits left)",
            kind.as_str(),
            level,
            self.garage.credits
        );
        self.garage.save_to(&mut self.store);
        Some(level)
    }

    /// Replace the tuning panel values (clamped); applies from the next run
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings.clamped();
        self.settings.save_to(&mut self.store);
    }

    /// Teardown: no further frames
    pub fn stop(&mut self) {
        self.clock.stop();
        log::info!("Session stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::{Direction, Npc, crash_payout};

    fn session() -> Session<MemoryStore> {
        Session::new(MemoryStore::new(), 77)
    }

    fn start(session: &mut Session<MemoryStore>) {
        let choice = session.offer_run_modifiers()[0];
        assert!(session.start_run(choice, 0.0));
    }

    /// Park an oncoming car on top of the player
    fn force_crash(session: &mut Session<MemoryStore>) {
        let sim = session.sim_mut();
        sim.npcs.clear();
        let mut npc = Npc::new(99, Direction::Oncoming);
        npc.lane = 0.0;
        npc.speed = -15.0;
        npc.z = 0.3;
        npc.respawn = 100.0;
        sim.npcs.push(npc);
    }

    #[test]
    fn test_offer_is_distinct() {
        let mut s = session();
        let offer = s.offer_run_modifiers().to_vec();
        assert_eq!(offer.len(), OFFER_SIZE);
        assert!(offer.iter().all(|&i| i < RUN_MODIFIERS.len()));
        assert!(offer[0] != offer[1] && offer[1] != offer[2] && offer[0] != offer[2]);
    }

    #[test]
    fn test_start_requires_offered_choice() {
        let mut s = session();
        let offer = s.offer_run_modifiers().to_vec();
        let missing = (0..RUN_MODIFIERS.len()).find(|i| !offer.contains(i)).unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            s.start_run(missing, 0.0)
        }));
        // Debug builds assert, release builds refuse
        assert!(matches!(result, Err(_) | Ok(false)));
    }

    #[test]
    fn test_frames_advance_run() {
        let mut s = session();
        start(&mut s);
        s.sim_mut().npcs.clear();
        let gas = TickInput {
            accelerate: true,
            ..Default::default()
        };
        let mut last = None;
        for i in 1..=60 {
            last = s.frame(i as f64 * 16.0, &gas);
        }
        let snap = last.unwrap();
        assert_eq!(snap.phase, RunPhase::Running);
        assert!(snap.hud.speed_kmh > 0);
    }

    #[test]
    fn test_crash_payout_persisted() {
        let mut store = MemoryStore::new();
        Garage {
            credits: 5,
            ..Default::default()
        }
        .try_save_to(&mut store)
        .unwrap();
        let mut s = Session::new(store, 3);
        start(&mut s);
        force_crash(&mut s);
        s.sim_mut().player.score = 123.4;
        s.sim_mut().progression.overtakes = 4;
        s.sim_mut().player.speed = 10.0;

        s.step(&TickInput::default(), 1.0 / 60.0);

        let expected = crash_payout(123.4, 4);
        assert_eq!(expected, 33);
        assert_eq!(*s.phase(), RunPhase::Crashed);
        assert_eq!(s.garage().credits, 5 + expected);
        assert_eq!(Garage::load_from(s.store()).credits, 5 + expected);
        assert!(
            s.take_events()
                .iter()
                .any(|e| matches!(e, SimEvent::Crashed(r) if r.payout == expected))
        );
    }

    #[test]
    fn test_save_failure_keeps_credits_in_memory() {
        let mut store = MemoryStore::new();
        store.fail_writes = true;
        let mut s = Session::new(store, 4);
        start(&mut s);
        force_crash(&mut s);
        s.sim_mut().player.score = 50.0;
        s.step(&TickInput::default(), 1.0 / 60.0);
        assert_eq!(s.garage().credits, 10);
        assert_eq!(Garage::load_from(s.store()).credits, 0);
    }

    #[test]
    fn test_restart_after_crash() {
        let mut s = session();
        start(&mut s);
        force_crash(&mut s);
        s.step(&TickInput::default(), 1.0 / 60.0);
        assert_eq!(*s.phase(), RunPhase::Crashed);
        s.return_to_menu();
        assert_eq!(*s.phase(), RunPhase::Idle);
        start(&mut s);
        assert_eq!(*s.phase(), RunPhase::Running);
        assert_eq!(s.sim().progression.overtakes, 0);
    }

    #[test]
    fn test_purchase_saves() {
        let mut store = MemoryStore::new();
        Garage {
            credits: 30,
            ..Default::default()
        }
        .try_save_to(&mut store)
        .unwrap();
        let mut s = Session::new(store, 5);
        assert_eq!(s.purchase(UpgradeKind::Brake), Some(1));
        assert_eq!(s.purchase(UpgradeKind::Brake), Some(2));
        assert_eq!(s.purchase(UpgradeKind::Brake), None);
        let saved = Garage::load_from(s.store());
        assert_eq!(saved.credits, 0);
        assert_eq!(saved.upgrades.brake, 2);
    }

    #[test]
    fn test_upgrades_reach_the_run() {
        let mut store = MemoryStore::new();
        Garage {
            credits: 0,
            upgrades: crate::garage::Upgrades {
                max_speed: 4,
                ..Default::default()
            },
        }
        .try_save_to(&mut store)
        .unwrap();
        let mut s = Session::new(store, 6);
        start(&mut s);
        assert_eq!(s.sim().upgrades.max_speed, 4);
    }

    #[test]
    fn test_settings_apply_next_run() {
        let mut s = session();
        let mut settings = s.settings().clone();
        settings.base_accel = 20.0;
        s.update_settings(settings);
        start(&mut s);
        assert_eq!(s.sim().tuning.base_accel, 20.0);
        assert_eq!(Settings::load_from(s.store()).base_accel, 20.0);
    }

    #[test]
    fn test_stop_ends_frames() {
        let mut s = session();
        start(&mut s);
        assert!(s.frame(16.0, &TickInput::default()).is_some());
        s.stop();
        assert!(s.frame(32.0, &TickInput::default()).is_none());
    }
}
