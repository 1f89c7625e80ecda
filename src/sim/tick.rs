//! Per-frame simulation tick
//!
//! Order: glitch prompt and countdown, parameter fold, vehicle, traffic
//! (motion, avoidance, collision, overtakes per NPC), score, camera.

use glam::{Vec2, Vec3};
use rand::Rng;

use super::collision::{Hitbox, apply_crash};
use super::modifiers::{GLITCHES, pick_distinct};
use super::progression::{self, crash_payout};
use super::road::curve_offset_scaled;
use super::state::{CAMERA_BACK, CAMERA_HEIGHT, CrashReport, RunPhase, SimEvent, SimState};
use super::traffic::TrafficFrame;
use super::vehicle;
use crate::consts::*;

/// Time scale while Bullet Time sees danger
pub const BULLET_TIME_SCALE: f32 = 0.5;

/// Input for a single tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub steer_left: bool,
    pub steer_right: bool,
    pub accelerate: bool,
    pub brake: bool,
    /// Held lean: stronger lateral response
    pub lean: bool,
    /// Pointer position, roughly [-0.5, 0.5] on each axis
    pub pointer: Vec2,
}

/// Advance the simulation by `dt` seconds. No-op unless a run is active.
pub fn tick(state: &mut SimState, input: &TickInput, dt: f32) {
    if !dt.is_finite() || dt < 0.0 {
        debug_assert!(false, "invalid tick dt {dt}");
        log::warn!("Skipping tick with invalid dt {dt}");
        return;
    }
    if state.phase != RunPhase::Running {
        return;
    }
    let mut dt = dt.min(MAX_FRAME_DT);

    // Glitch prompt pauses everything from this tick on
    if state.glitch.is_none()
        && state.run_time > GLITCH_MIN_RUN_TIME
        && state.rng.random::<f32>() < GLITCH_CHANCE_PER_TICK
    {
        let offer = pick_distinct(&mut state.rng, OFFER_SIZE, GLITCHES.len());
        log::info!(
            "Glitch prompt: {}",
            offer
                .iter()
                .map(|&i| GLITCHES[i].name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        state.events.push(SimEvent::GlitchOffered {
            offer: offer.clone(),
        });
        state.phase = RunPhase::AwaitingModifierChoice { offer };
        return;
    }

    if let Some(active) = state.glitch.as_mut()
        && active.count_down(dt)
    {
        let index = active.index;
        log::info!("Glitch expired: {}", GLITCHES[index].name);
        state.glitch = None;
        state.events.push(SimEvent::GlitchExpired { index });
    }

    let params = state.derive_params();
    let t = &params.tuning;

    if params.bullet_time && state.min_ttc < t.ttc_danger {
        dt *= BULLET_TIME_SCALE;
    }
    state.run_time += dt;

    let steer = vehicle::integrate(&mut state.player, input, &params, dt);
    state.player.steer = steer;

    let player_world_x =
        state.player.x + curve_offset_scaled(state.player.z, params.curve_scale);
    let player_pos = Vec2::new(player_world_x, 0.0);
    let hitbox = Hitbox::from_tuning(t);
    let frame = TrafficFrame {
        params: &params,
        player_speed: state.player.speed,
        player_z: state.player.z,
        dt,
    };

    let mut crashed = false;
    let mut min_ttc = f32::INFINITY;
    for npc in state.npcs.iter_mut() {
        npc.update_motion(&frame, &mut state.rng);

        if let Some(ttc) = npc.avoid_player(state.player.speed, t, dt) {
            min_ttc = min_ttc.min(ttc);
        }

        if !crashed && hitbox.overlaps(player_pos, npc.pos) {
            crashed = true;
            let impulse = apply_crash(&mut state.player, player_pos, npc, &params);
            let report = CrashReport {
                score: state.player.score,
                overtakes: state.progression.overtakes,
                meters: state.player.z,
                payout: crash_payout(state.player.score, state.progression.overtakes),
            };
            log::info!(
                "Crashed into NPC {} ({:?}): score {:.0}, {} overtakes, {:.0} m, payout {} (speed -{:.1})",
                npc.id,
                npc.direction,
                report.score,
                report.overtakes,
                report.meters,
                report.payout,
                impulse.speed_loss
            );
            state.last_crash = Some(report);
            state.events.push(SimEvent::Crashed(report));
        }

        if let Some(advanced) = state.progression.check_overtake(npc, &mut state.player) {
            state.events.push(SimEvent::Overtake {
                oncoming: npc.is_oncoming(),
            });
            if let Some(stage) = advanced {
                log::info!(
                    "Stage {} reached, next goal {} overtakes",
                    stage + 1,
                    state.progression.goal
                );
                state.events.push(SimEvent::StageAdvanced { stage });
            }
        }

        // Far behind: free to recycle as soon as it leaves the window
        if npc.z < -t.avoid_lookahead_dist {
            npc.respawn = 0.0;
        }
    }
    state.min_ttc = min_ttc;

    progression::update_combo(&mut state.player, &params, dt);
    if !crashed {
        progression::accrue_score(&mut state.player, &params, dt);
        if params.slipstream {
            progression::slipstream_bonus(&mut state.player, dt);
        }
    }

    let eye = Vec3::new(player_world_x, CAMERA_HEIGHT, -CAMERA_BACK);
    state.camera = state.camera.lerp(eye, t.cam_follow_lerp);

    state.params = params;

    if crashed {
        if let Some(g) = state.glitch.take() {
            log::info!("Glitch cleared by crash: {}", g.glitch().name);
        }
        state.phase = RunPhase::Crashed;
    }
}
