//! Player vehicle dynamics
//!
//! Lateral: steering drives acceleration, an explicit `vx * damping * dt`
//! term bleeds velocity off, position is clamped to the lane bounds.
//! Longitudinal: accelerate, auto-decay when coasting, brake stacked on
//! top; speed clamped to `[0, max_speed]`.

use super::modifiers::EffectiveParams;
use super::state::PlayerState;
use super::tick::TickInput;

/// Pointer x (about ±0.5) to steering units
pub const POINTER_STEER_GAIN: f32 = 1.5;

/// Combined steering signal: keys (±1 each, opposite keys cancel) plus pointer
pub fn steering_signal(input: &TickInput, mirror: bool) -> f32 {
    let mut steer = 0.0;
    if input.steer_left {
        steer -= 1.0;
    }
    if input.steer_right {
        steer += 1.0;
    }
    steer += input.pointer.x * POINTER_STEER_GAIN;
    if mirror { -steer } else { steer }
}

/// Advance lateral motion. Returns the steering signal used.
pub fn integrate_lateral(
    player: &mut PlayerState,
    input: &TickInput,
    params: &EffectiveParams,
    dt: f32,
) -> f32 {
    let t = &params.tuning;
    let steer = steering_signal(input, params.mirror_steering);
    let lean = if input.lean { t.lean_hold_scale } else { 1.0 };

    player.vx += steer * t.lateral_accel * lean * dt;
    player.vx -= player.vx * t.damping_x * dt;
    player.x += player.vx * dt;

    let bound = t.lateral_bound();
    player.x = player.x.clamp(-bound, bound);
    steer
}

/// Advance speed and distance
pub fn integrate_longitudinal(
    player: &mut PlayerState,
    input: &TickInput,
    params: &EffectiveParams,
    dt: f32,
) {
    let t = &params.tuning;
    if input.accelerate {
        player.speed += t.base_accel * dt;
    } else {
        player.speed -= t.auto_down * dt;
    }
    if input.brake {
        player.speed -= t.brake_accel * dt;
    }
    player.speed = player.speed.clamp(0.0, params.max_speed);
    player.z += player.speed * dt;
}

/// Full vehicle step. Returns the steering signal used.
pub fn integrate(
    player: &mut PlayerState,
    input: &TickInput,
    params: &EffectiveParams,
    dt: f32,
) -> f32 {
    let steer = integrate_lateral(player, input, params, dt);
    integrate_longitudinal(player, input, params, dt);
    steer
}
