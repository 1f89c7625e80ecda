//! Read-only views of the simulation for the renderer and HUD
//!
//! Render coordinates are in the player's frame: the player sits at z = 0,
//! +z is ahead, x is lateral including the road curve.

use glam::{Vec2, Vec3};
use serde::Serialize;

use super::modifiers::GLITCHES;
use super::road::curve_offset_scaled;
use super::state::{RunPhase, SimState};
use crate::consts::HEAT_BAR_FULL;
use crate::{kmh, smoothstep};

/// Car body height above the road
pub const CAR_HEIGHT: f32 = 0.2;
/// Yaw per unit of steering signal
pub const STEER_YAW: f32 = 0.12;
/// Camera look-ahead distance
pub const LOOK_AHEAD: f32 = 12.0;
pub const LOOK_TARGET_HEIGHT: f32 = 0.8;
/// Hard pitch clamp after pointer look
pub const PITCH_CLAMP: f32 = 0.3;
pub const FOV_CLAMP: (f32, f32) = (35.0, 95.0);
pub const FOG_DENSITY: f32 = 0.03;
pub const FOG_BANK_EXTRA: f32 = 0.03;
pub const SHAKE_FREQ: f32 = 20.0;
pub const SHAKE_AMPLITUDE: f32 = 0.02;

/// Position and heading
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub position: Vec3,
    pub yaw: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NpcView {
    pub id: u32,
    pub oncoming: bool,
    pub transform: Transform,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraView {
    pub eye: Vec3,
    pub target: Vec3,
    /// Pointer look added on top of look-at
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view, degrees
    pub fov: f32,
}

/// Everything the scene needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub player: Transform,
    pub npcs: Vec<NpcView>,
    pub camera: CameraView,
    pub fog_density: f32,
}

/// On-screen display values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub speed_kmh: i32,
    pub overtakes: u32,
    pub goal: u32,
    /// 1-based
    pub stage: usize,
    /// 0..1
    pub speed_bar: f32,
    pub score: i64,
    pub combo: f32,
    /// 0..1
    pub heat_bar: f32,
    /// Danger overlay opacity
    pub vignette: f32,
    /// Active glitch name and seconds left
    pub glitch: Option<(&'static str, f32)>,
}

impl Hud {
    pub fn speed_label(&self) -> String {
        format!("{} km/h", self.speed_kmh)
    }

    pub fn stage_label(&self) -> String {
        format!("Stage {}", self.stage)
    }

    pub fn combo_label(&self) -> String {
        format!("{:.2}×", self.combo)
    }

    pub fn goal_label(&self) -> String {
        format!("{} / {}", self.overtakes, self.goal)
    }
}

/// One frame's worth of output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: RunPhase,
    pub render: RenderFrame,
    pub hud: Hud,
}

impl Snapshot {
    /// Capture the current state. `pointer` drives camera look.
    pub fn capture(state: &SimState, pointer: Vec2) -> Self {
        Self {
            phase: state.phase.clone(),
            render: render_frame(state, pointer),
            hud: hud(state),
        }
    }
}

/// Road heading (radians) at `distance`, from a central difference
fn road_yaw(distance: f32, scale: f32) -> f32 {
    let h = 0.5;
    let dx = curve_offset_scaled(distance + h, scale) - curve_offset_scaled(distance - h, scale);
    dx.atan2(2.0 * h)
}

pub fn render_frame(state: &SimState, pointer: Vec2) -> RenderFrame {
    let params = &state.params;
    let t = &params.tuning;
    let player = &state.player;
    let scale = params.curve_scale;

    let player_x = player.x + curve_offset_scaled(player.z, scale);
    let player_transform = Transform {
        position: Vec3::new(player_x, CAR_HEIGHT, 0.0),
        yaw: player.steer * STEER_YAW,
    };

    let npcs = state
        .npcs
        .iter()
        .filter(|npc| npc.in_window())
        .map(|npc| {
            let heading = road_yaw(player.z + npc.z, scale);
            NpcView {
                id: npc.id,
                oncoming: npc.is_oncoming(),
                transform: Transform {
                    position: Vec3::new(npc.pos.x, CAR_HEIGHT, npc.z),
                    yaw: if npc.is_oncoming() {
                        heading + std::f32::consts::PI
                    } else {
                        heading
                    },
                },
            }
        })
        .collect();

    let mut eye = state.camera;
    if params.shake {
        eye.x += (state.run_time * SHAKE_FREQ).sin() * SHAKE_AMPLITUDE;
    }
    let target = Vec3::new(
        curve_offset_scaled(player.z + LOOK_AHEAD, scale),
        LOOK_TARGET_HEIGHT,
        LOOK_AHEAD,
    );
    let speed_frac = if params.max_speed > 0.0 {
        player.speed / (params.max_speed * 1.2)
    } else {
        0.0
    };
    let fov = (t.fov_min + speed_frac * (t.fov_max - t.fov_min)).clamp(FOV_CLAMP.0, FOV_CLAMP.1);

    RenderFrame {
        player: player_transform,
        npcs,
        camera: CameraView {
            eye,
            target,
            yaw: pointer.x * t.look_yaw_limit,
            pitch: (pointer.y * t.look_pitch_limit).clamp(-PITCH_CLAMP, PITCH_CLAMP),
            fov,
        },
        fog_density: FOG_DENSITY + if params.fog { FOG_BANK_EXTRA } else { 0.0 },
    }
}

pub fn hud(state: &SimState) -> Hud {
    let params = &state.params;
    let t = &params.tuning;
    let player = &state.player;
    let speed_bar = if params.max_speed > 0.0 {
        (player.speed / params.max_speed).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Hud {
        speed_kmh: kmh(player.speed),
        overtakes: state.progression.overtakes,
        goal: state.progression.goal,
        stage: state.progression.stage + 1,
        speed_bar,
        score: player.score.round() as i64,
        combo: player.combo,
        heat_bar: (player.heat / HEAT_BAR_FULL).clamp(0.0, 1.0),
        vignette: smoothstep(t.corridor_amber_sec, t.corridor_red_sec, player.heat) * 0.5,
        glitch: state
            .glitch
            .map(|g| (GLITCHES[g.index].name, g.remaining)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::garage::Upgrades;
    use crate::sim::modifiers::ActiveGlitch;
    use crate::tuning::Tuning;

    fn running() -> SimState {
        let mut state = SimState::new(5, Tuning::default(), Upgrades::default());
        state.start_run(Tuning::default(), Upgrades::default(), None);
        state
    }

    #[test]
    fn test_hud_fresh_run() {
        let state = running();
        let hud = hud(&state);
        assert_eq!(hud.speed_kmh, 0);
        assert_eq!(hud.stage, 1);
        assert_eq!(hud.goal, 3);
        assert_eq!(hud.score, 0);
        assert_eq!(hud.combo_label(), "1.00×");
        assert_eq!(hud.stage_label(), "Stage 1");
        assert_eq!(hud.heat_bar, 0.0);
        assert!(hud.glitch.is_none());
    }

    #[test]
    fn test_hud_values() {
        let mut state = running();
        state.player.speed = 13.0;
        state.player.score = 41.6;
        state.player.heat = 3.0;
        state.player.combo = 2.5;
        let hud = hud(&state);
        assert_eq!(hud.speed_label(), "46 km/h");
        assert_eq!(hud.score, 42);
        assert_eq!(hud.heat_bar, 1.0);
        assert_eq!(hud.combo_label(), "2.50×");
        assert!(hud.speed_bar > 0.0 && hud.speed_bar < 1.0);
        // Heat above the amber constant: overlay off
        assert_eq!(hud.vignette, 0.0);
    }

    #[test]
    fn test_fov_widens_with_speed() {
        let mut state = running();
        let slow = render_frame(&state, Vec2::ZERO).camera.fov;
        state.player.speed = state.params.max_speed;
        let fast = render_frame(&state, Vec2::ZERO).camera.fov;
        assert_eq!(slow, state.params.tuning.fov_min);
        assert!(fast > slow);
        assert!(fast <= state.params.tuning.fov_max);
    }

    #[test]
    fn test_fog_bank_thickens_fog() {
        let mut state = running();
        let clear = render_frame(&state, Vec2::ZERO).fog_density;
        // Fog Bank
        state.glitch = Some(ActiveGlitch::start(6));
        state.params = state.derive_params();
        let foggy = render_frame(&state, Vec2::ZERO).fog_density;
        assert!((foggy - clear - FOG_BANK_EXTRA).abs() < 1e-6);
        assert_eq!(hud(&state).glitch.map(|g| g.0), Some("Fog Bank"));
    }

    #[test]
    fn test_pointer_look_clamped() {
        let state = running();
        let cam = render_frame(&state, Vec2::new(0.5, 2.0)).camera;
        assert!((cam.yaw - 0.5 * state.params.tuning.look_yaw_limit).abs() < 1e-6);
        assert_eq!(cam.pitch, PITCH_CLAMP);
    }

    #[test]
    fn test_oncoming_faces_player() {
        let state = running();
        let frame = render_frame(&state, Vec2::ZERO);
        assert!(!frame.npcs.is_empty());
        for view in frame.npcs.iter().filter(|v| v.oncoming) {
            assert!(view.transform.yaw > std::f32::consts::FRAC_PI_2);
        }
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = running();
        let snap = Snapshot::capture(&state, Vec2::ZERO);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"Running\""));
        assert!(json.contains("\"speed_kmh\":0"));
    }
}
