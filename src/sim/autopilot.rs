//! Demo driver
//!
//! Drives the car for attract mode and the headless binary: holds the
//! throttle, steers around the nearest car ahead and takes the first
//! glitch it is offered.

use super::road::curve_offset_scaled;
use super::state::SimState;
use super::tick::TickInput;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Autopilot {
    /// How far ahead (m) a car counts as a threat
    pub lookahead: f32,
    /// Lateral distance (road units) treated as "in our lane"
    pub threat_width: f32,
    /// Lateral target to dodge toward
    pub dodge_x: f32,
    /// No steering inside this error band
    pub deadzone: f32,
    /// Brake when time-to-collision drops under this with no room to dodge
    pub panic_ttc: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            lookahead: 45.0,
            threat_width: 1.4,
            dodge_x: 1.0,
            deadzone: 0.08,
            panic_ttc: 0.45,
        }
    }
}

impl Autopilot {
    /// Input for the next tick
    pub fn drive(&self, state: &SimState) -> TickInput {
        let player = &state.player;
        let scale = state.params.curve_scale;

        // Nearest closing car ahead that overlaps our lateral position
        let threat = state
            .npcs
            .iter()
            .filter(|npc| npc.z > 0.0 && npc.z < self.lookahead)
            .filter(|npc| npc.closing_speed(player.speed) > 0.0)
            .map(|npc| {
                let road_x = npc.pos.x - curve_offset_scaled(player.z + npc.z, scale);
                (npc, road_x)
            })
            .filter(|(_, road_x)| (road_x - player.x).abs() < self.threat_width)
            .min_by(|a, b| a.0.z.total_cmp(&b.0.z));

        // Small wander so runs don't all trace the same line
        let wobble = (state.run_time * 0.7).sin() * 0.1;
        let mut input = TickInput {
            accelerate: true,
            ..Default::default()
        };

        let target_x = match threat {
            Some((npc, road_x)) => {
                let ttc = npc.z / npc.closing_speed(player.speed);
                if ttc < self.panic_ttc && (road_x - player.x).abs() < self.threat_width * 0.5 {
                    input.accelerate = false;
                    input.brake = true;
                }
                if road_x > player.x {
                    -self.dodge_x
                } else {
                    self.dodge_x
                }
            }
            None => wobble,
        };

        let error = target_x - player.x;
        if error > self.deadzone {
            input.steer_right = true;
        } else if error < -self.deadzone {
            input.steer_left = true;
        }
        input.lean = threat.is_some();
        input
    }

    /// Glitch choice from an offer
    pub fn pick_glitch(&self, offer: &[usize]) -> Option<usize> {
        offer.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::garage::Upgrades;
    use crate::sim::tick::tick;
    use crate::sim::traffic::{Direction, Npc};
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn empty_road() -> SimState {
        let mut state = SimState::new(11, Tuning::default(), Upgrades::default());
        state.start_run(Tuning::default(), Upgrades::default(), None);
        state.npcs.clear();
        state
    }

    fn car_ahead(state: &mut SimState, lane_x: f32, z: f32) {
        let mut npc = Npc::new(1, Direction::Same);
        npc.speed = 5.0;
        npc.z = z;
        npc.pos = Vec2::new(
            lane_x + curve_offset_scaled(state.player.z + z, state.params.curve_scale),
            z,
        );
        state.npcs.push(npc);
    }

    #[test]
    fn test_open_road_full_throttle() {
        let state = empty_road();
        let input = Autopilot::default().drive(&state);
        assert!(input.accelerate);
        assert!(!input.brake);
        assert!(!input.steer_left && !input.steer_right);
    }

    #[test]
    fn test_dodges_car_on_the_right() {
        let mut state = empty_road();
        state.player.speed = 20.0;
        car_ahead(&mut state, 0.5, 20.0);
        let input = Autopilot::default().drive(&state);
        assert!(input.steer_left);
        assert!(input.lean);
    }

    #[test]
    fn test_dodges_car_on_the_left() {
        let mut state = empty_road();
        state.player.speed = 20.0;
        car_ahead(&mut state, -0.5, 20.0);
        let input = Autopilot::default().drive(&state);
        assert!(input.steer_right);
    }

    #[test]
    fn test_brakes_when_too_close() {
        let mut state = empty_road();
        state.player.speed = 25.0;
        car_ahead(&mut state, 0.1, 3.0);
        let input = Autopilot::default().drive(&state);
        assert!(input.brake);
        assert!(!input.accelerate);
    }

    #[test]
    fn test_ignores_car_far_ahead() {
        let mut state = empty_road();
        state.player.speed = 20.0;
        car_ahead(&mut state, 0.0, 150.0);
        let input = Autopilot::default().drive(&state);
        assert!(!input.lean);
    }

    #[test]
    fn test_takes_first_glitch() {
        assert_eq!(Autopilot::default().pick_glitch(&[5, 2, 9]), Some(5));
        assert_eq!(Autopilot::default().pick_glitch(&[]), None);
    }

    #[test]
    fn test_autopilot_makes_progress() {
        let mut state = SimState::new(12, Tuning::default(), Upgrades::default());
        state.start_run(Tuning::default(), Upgrades::default(), None);
        let pilot = Autopilot::default();
        for _ in 0..120 {
            let input = pilot.drive(&state);
            tick(&mut state, &input, 1.0 / 60.0);
        }
        assert!(state.player.z > 0.0);
    }
}
