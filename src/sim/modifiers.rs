//! Run modifiers, glitches and the effective parameter fold
//!
//! Every tick, the physical constants used by the simulation are derived
//! fresh from four layers:
//!
//! 1. the run's base `Tuning` (never mutated),
//! 2. permanent garage upgrades,
//! 3. the run modifier picked at run start,
//! 4. at most one active glitch.
//!
//! Layers 3 and 4 are both `Effects`. They are combined with
//! [`Effects::then`]: multipliers stack multiplicatively, additive fields
//! sum, hitbox overrides are last-applied-wins and flags are OR-ed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::garage::Upgrades;
use crate::tuning::{self, Tuning};

/// Field-of-view effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FovShift {
    /// Both FOV bounds ×0.85
    Tight,
    /// FOV max ×1.15
    Wide,
}

/// A sparse set of gameplay effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    // Multipliers
    pub accel: Option<f32>,
    pub brake: Option<f32>,
    pub lateral: Option<f32>,
    pub damping: Option<f32>,
    pub score: Option<f32>,
    pub curve: Option<f32>,
    /// Crash severity
    pub scrape: Option<f32>,
    /// Oncoming traffic speed and wander
    pub oncoming_speed: Option<f32>,

    // Additive
    /// Extra top speed as a fraction of the cap
    pub max_speed: Option<f32>,
    /// Forced respawn rate (per second) for oncoming traffic
    pub oncoming_spawn: Option<f32>,
    /// Forced respawn rate (per second) for same-direction traffic
    pub same_spawn: Option<f32>,

    // Overrides
    /// Scale on the lateral hitbox extra
    pub hitbox_x: Option<f32>,
    /// Scale on the longitudinal hitbox extra
    pub hitbox_z: Option<f32>,
    pub fov: Option<FovShift>,

    // Flags
    /// Halves both hitbox extras, overriding `hitbox_x`/`hitbox_z`
    pub ghost: bool,
    pub bullet_time: bool,
    pub fog: bool,
    pub shake: bool,
    pub mirror: bool,
    pub slipstream: bool,
}

impl Default for Effects {
    fn default() -> Self {
        Self::NONE
    }
}

fn stack(a: Option<f32>, b: Option<f32>) -> Option<f32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x * y),
        (x, None) => x,
        (None, y) => y,
    }
}

fn sum(a: Option<f32>, b: Option<f32>) -> Option<f32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        (x, None) => x,
        (None, y) => y,
    }
}

impl Effects {
    /// No effect at all
    pub const NONE: Effects = Effects {
        accel: None,
        brake: None,
        lateral: None,
        damping: None,
        score: None,
        curve: None,
        scrape: None,
        oncoming_speed: None,
        max_speed: None,
        oncoming_spawn: None,
        same_spawn: None,
        hitbox_x: None,
        hitbox_z: None,
        fov: None,
        ghost: false,
        bullet_time: false,
        fog: false,
        shake: false,
        mirror: false,
        slipstream: false,
    };

    /// Fold `next` on top of `self`
    pub fn then(&self, next: &Effects) -> Effects {
        Effects {
            accel: stack(self.accel, next.accel),
            brake: stack(self.brake, next.brake),
            lateral: stack(self.lateral, next.lateral),
            damping: stack(self.damping, next.damping),
            score: stack(self.score, next.score),
            curve: stack(self.curve, next.curve),
            scrape: stack(self.scrape, next.scrape),
            oncoming_speed: stack(self.oncoming_speed, next.oncoming_speed),
            max_speed: sum(self.max_speed, next.max_speed),
            oncoming_spawn: sum(self.oncoming_spawn, next.oncoming_spawn),
            same_spawn: sum(self.same_spawn, next.same_spawn),
            hitbox_x: next.hitbox_x.or(self.hitbox_x),
            hitbox_z: next.hitbox_z.or(self.hitbox_z),
            fov: next.fov.or(self.fov),
            ghost: self.ghost || next.ghost,
            bullet_time: self.bullet_time || next.bullet_time,
            fog: self.fog || next.fog,
            shake: self.shake || next.shake,
            mirror: self.mirror || next.mirror,
            slipstream: self.slipstream || next.slipstream,
        }
    }
}

/// Catalog entry for a run-long modifier
#[derive(Debug, Clone, Copy)]
pub struct RunModifier {
    pub name: &'static str,
    pub description: &'static str,
    pub effects: Effects,
}

/// Catalog entry for a time-limited glitch
#[derive(Debug, Clone, Copy)]
pub struct Glitch {
    pub name: &'static str,
    pub description: &'static str,
    /// Seconds
    pub duration: f32,
    pub effects: Effects,
}

pub const RUN_MODIFIERS: [RunModifier; 4] = [
    RunModifier {
        name: "Nitro",
        description: "Accel +25%, Max +5%",
        effects: Effects {
            accel: Some(1.25),
            max_speed: Some(0.05),
            ..Effects::NONE
        },
    },
    RunModifier {
        name: "Sharp Brakes",
        description: "Brake +30%",
        effects: Effects {
            brake: Some(1.3),
            ..Effects::NONE
        },
    },
    RunModifier {
        name: "Sticky Tires",
        description: "Lateral +25%",
        effects: Effects {
            lateral: Some(1.25),
            ..Effects::NONE
        },
    },
    RunModifier {
        name: "Hot Streak",
        description: "Combo +0.15",
        effects: Effects {
            score: Some(1.15),
            ..Effects::NONE
        },
    },
];

pub const GLITCHES: [Glitch; 18] = [
    Glitch {
        name: "Bullet Time",
        description: "Time slows near danger. +20% score",
        duration: 22.0,
        effects: Effects {
            bullet_time: true,
            score: Some(1.2),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Needle Threader",
        description: "Half width hitbox; -10% score",
        duration: 28.0,
        effects: Effects {
            hitbox_x: Some(0.5),
            score: Some(0.9),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Truck Mode",
        description: "Long hitbox, heavier scrapes",
        duration: 30.0,
        effects: Effects {
            hitbox_z: Some(1.6),
            scrape: Some(1.4),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Reverse Flow",
        description: "More oncoming spawns. +30% score",
        duration: 26.0,
        effects: Effects {
            oncoming_spawn: Some(0.35),
            score: Some(1.3),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Snake Road",
        description: "Road curves swell",
        duration: 24.0,
        effects: Effects {
            curve: Some(1.8),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Lean Ghost",
        description: "Leaning shrinks width by 50%",
        duration: 25.0,
        effects: Effects {
            ghost: true,
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Fog Bank",
        description: "Heavy fog. +15% score",
        duration: 22.0,
        effects: Effects {
            fog: true,
            score: Some(1.15),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Nitro Drip",
        description: "+20% accel",
        duration: 24.0,
        effects: Effects {
            accel: Some(1.2),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Mirror Controls",
        description: "Steering inverted",
        duration: 18.0,
        effects: Effects {
            mirror: true,
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Tunnel Vision",
        description: "Tighter FOV. +10% score",
        duration: 20.0,
        effects: Effects {
            fov: Some(FovShift::Tight),
            score: Some(1.1),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Fisheye",
        description: "Wider FOV. -10% score",
        duration: 20.0,
        effects: Effects {
            fov: Some(FovShift::Wide),
            score: Some(0.9),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Slipstream Draft",
        description: "Boost when tailing",
        duration: 26.0,
        effects: Effects {
            slipstream: true,
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Drift King",
        description: "+50% lateral, -40% damping",
        duration: 22.0,
        effects: Effects {
            lateral: Some(1.5),
            damping: Some(0.6),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Greased Road",
        description: "-30% lateral, -30% brake",
        duration: 22.0,
        effects: Effects {
            lateral: Some(0.7),
            brake: Some(0.7),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Blade Runner",
        description: "Faster oncoming. +20% score",
        duration: 24.0,
        effects: Effects {
            oncoming_speed: Some(1.35),
            score: Some(1.2),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Car-nival",
        description: "More same-lane spawns",
        duration: 24.0,
        effects: Effects {
            same_spawn: Some(0.3),
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Quake",
        description: "Cab shakes",
        duration: 18.0,
        effects: Effects {
            shake: true,
            ..Effects::NONE
        },
    },
    Glitch {
        name: "Straight Shot",
        description: "Road straightens",
        duration: 22.0,
        effects: Effects {
            curve: Some(0.6),
            ..Effects::NONE
        },
    },
];

/// Choose `k` distinct indices from `0..n`, uniformly, rejecting repeats
pub fn pick_distinct<R: Rng + ?Sized>(rng: &mut R, k: usize, n: usize) -> Vec<usize> {
    debug_assert!(k <= n, "cannot pick {k} distinct entries from {n}");
    let k = k.min(n);
    let mut picked = Vec::with_capacity(k);
    while picked.len() < k {
        let i = rng.random_range(0..n);
        if !picked.contains(&i) {
            picked.push(i);
        }
    }
    picked
}

/// The glitch currently in effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveGlitch {
    /// Index into `GLITCHES`
    pub index: usize,
    /// Seconds left
    pub remaining: f32,
}

impl ActiveGlitch {
    pub fn start(index: usize) -> Self {
        Self {
            index,
            remaining: GLITCHES[index].duration,
        }
    }

    pub fn glitch(&self) -> &'static Glitch {
        &GLITCHES[self.index]
    }

    /// Count down; returns true once expired
    pub fn count_down(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt).max(0.0);
        self.remaining <= 0.0
    }
}

/// Parameters used for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveParams {
    /// Base table with multipliers folded in
    pub tuning: Tuning,
    /// Speed cap in m/s for this tick
    pub max_speed: f32,
    pub score_multiplier: f32,
    pub curve_scale: f32,
    pub crash_severity_scale: f32,
    pub oncoming_spawn_rate: f32,
    pub same_spawn_rate: f32,
    pub bullet_time: bool,
    pub fog: bool,
    pub shake: bool,
    pub mirror_steering: bool,
    pub slipstream: bool,
}

impl EffectiveParams {
    /// Fold base tuning, upgrades, run modifier and glitch for `stage_index`
    pub fn derive(
        base: &Tuning,
        upgrades: &Upgrades,
        run: &Effects,
        glitch: Option<&Effects>,
        stage_index: usize,
    ) -> Self {
        let fx = match glitch {
            Some(g) => run.then(g),
            None => *run,
        };

        let mut t = base.clone();
        t.base_accel *= upgrades.accel_bonus() * fx.accel.unwrap_or(1.0);
        t.brake_accel *= upgrades.brake_bonus() * fx.brake.unwrap_or(1.0);
        t.lateral_accel *= upgrades.lateral_bonus() * fx.lateral.unwrap_or(1.0);
        t.damping_x *= fx.damping.unwrap_or(1.0);

        match fx.fov {
            Some(FovShift::Tight) => {
                t.fov_min *= 0.85;
                t.fov_max *= 0.85;
            }
            Some(FovShift::Wide) => t.fov_max *= 1.15,
            None => {}
        }

        let oncoming_scale = fx.oncoming_speed.unwrap_or(1.0);
        t.oncoming_speed_min *= oncoming_scale;
        t.oncoming_speed_max *= oncoming_scale;
        t.lane_wander_amp_oncoming *= oncoming_scale;
        if fx.same_spawn.is_some() {
            t.lane_wander_amp_same *= 1.3;
        }

        if fx.ghost {
            t.hitbox_x_extra *= 0.5;
            t.hitbox_z_extra *= 0.5;
        } else {
            t.hitbox_x_extra *= fx.hitbox_x.unwrap_or(1.0);
            t.hitbox_z_extra *= fx.hitbox_z.unwrap_or(1.0);
        }

        let max_speed = tuning::stage(stage_index).cap_mps()
            * upgrades.max_speed_bonus()
            * (1.0 + fx.max_speed.unwrap_or(0.0))
            * t.speed_scale;

        Self {
            tuning: t,
            max_speed,
            score_multiplier: fx.score.unwrap_or(1.0),
            curve_scale: fx.curve.unwrap_or(1.0),
            crash_severity_scale: fx.scrape.unwrap_or(1.0),
            oncoming_spawn_rate: fx.oncoming_spawn.unwrap_or(0.0),
            same_spawn_rate: fx.same_spawn.unwrap_or(0.0),
            bullet_time: fx.bullet_time,
            fog: fx.fog,
            shake: fx.shake,
            mirror_steering: fx.mirror,
            slipstream: fx.slipstream,
        }
    }
}
