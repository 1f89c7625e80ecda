//! Browser facade
//!
//! Thin `wasm-bindgen` wrapper around [`Session`]: the page polls devices,
//! feeds inputs and timestamps in, and draws from the JSON snapshot.

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::garage::UpgradeKind;
use crate::persistence::LocalStorageStore;
use crate::session::Session;
use crate::sim::{GLITCHES, RUN_MODIFIERS, RunPhase, TickInput};

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Endless Overtake core loaded");
}

#[wasm_bindgen]
pub struct WebSession {
    session: Session<LocalStorageStore>,
    input: TickInput,
}

#[wasm_bindgen]
impl WebSession {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> WebSession {
        WebSession {
            session: Session::new(LocalStorageStore, seed),
            input: TickInput::default(),
        }
    }

    /// Catalog indices of the run modifiers on offer
    pub fn offer_run_modifiers(&mut self) -> Vec<u32> {
        self.session
            .offer_run_modifiers()
            .iter()
            .map(|&i| i as u32)
            .collect()
    }

    pub fn run_modifier_name(index: u32) -> String {
        RUN_MODIFIERS
            .get(index as usize)
            .map(|m| format!("{}: {}", m.name, m.description))
            .unwrap_or_default()
    }

    pub fn glitch_name(index: u32) -> String {
        GLITCHES
            .get(index as usize)
            .map(|g| format!("{}: {}", g.name, g.description))
            .unwrap_or_default()
    }

    pub fn start_run(&mut self, choice: u32, now_ms: f64) -> bool {
        self.session.start_run(choice as usize, now_ms)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_input(
        &mut self,
        steer_left: bool,
        steer_right: bool,
        accelerate: bool,
        brake: bool,
        lean: bool,
        pointer_x: f32,
        pointer_y: f32,
    ) {
        self.input = TickInput {
            steer_left,
            steer_right,
            accelerate,
            brake,
            lean,
            pointer: Vec2::new(pointer_x, pointer_y),
        };
    }

    /// Advance one animation frame; JSON snapshot, or `None` once stopped
    pub fn frame(&mut self, now_ms: f64) -> Option<String> {
        let snapshot = self.session.frame(now_ms, &self.input)?;
        match serde_json::to_string(&snapshot) {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("Snapshot serialization failed: {e}");
                None
            }
        }
    }

    /// Glitch catalog indices awaiting a choice (empty when no prompt)
    pub fn glitch_offer(&self) -> Vec<u32> {
        match self.session.phase() {
            RunPhase::AwaitingModifierChoice { offer } => offer.iter().map(|&i| i as u32).collect(),
            _ => Vec::new(),
        }
    }

    pub fn choose_glitch(&mut self, index: u32) -> bool {
        self.session.choose_glitch(index as usize)
    }

    /// JSON list of events since the last call
    pub fn take_events(&mut self) -> String {
        serde_json::to_string(&self.session.take_events()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn return_to_menu(&mut self) {
        self.session.return_to_menu();
    }

    /// Buy one level of `kind` ("accel", "brake", "maxSpeed", "lateral").
    /// New level, or -1 when rejected.
    pub fn purchase(&mut self, kind: &str) -> i32 {
        UpgradeKind::parse(kind)
            .and_then(|k| self.session.purchase(k))
            .map(|level| level as i32)
            .unwrap_or(-1)
    }

    pub fn upgrade_cost(&self, kind: &str) -> f64 {
        UpgradeKind::parse(kind)
            .map(|k| self.session.garage().cost_of(k) as f64)
            .unwrap_or(f64::NAN)
    }

    pub fn credits(&self) -> f64 {
        self.session.garage().credits as f64
    }

    /// Persisted garage record as JSON
    pub fn garage_json(&self) -> String {
        serde_json::to_string(self.session.garage()).unwrap_or_default()
    }

    pub fn stop(&mut self) {
        self.session.stop();
    }
}
