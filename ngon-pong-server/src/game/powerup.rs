//! Powerups
//!
//! Static collectibles spawned on an elapsed-time schedule. A ball touching
//! one collects it; the effect either changes that ball permanently or runs
//! for a fixed time on the whole session.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::core::vec2::{Vec2, EPS};
use crate::game::body::{Ball, Circle};

/// Collision radius of every powerup.
pub const POWERUP_RADIUS: f64 = 10.0;

/// Seconds a timed effect lasts.
pub const EFFECT_DURATION: f64 = 10.0;

/// Largest radius a ball can grow from.
const MAX_GROW_RADIUS: f64 = 50.0;

/// Smallest radius a ball can shrink from.
const MIN_SHRINK_RADIUS: f64 = 3.0;

/// Powerup effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PowerupKind {
    /// Collecting ball grows by half
    IncreaseBallSize = 0,
    /// All paddles move twice as fast
    IncreasePaddleSpeed = 1,
    /// All paddles move half as fast
    DecreasePaddleSpeed = 2,
    /// Collecting ball shrinks by a quarter
    DecreaseBallSize = 3,
    /// Simulation runs at 1.5x
    SuperSpeed = 4,
    /// Paddle controls are swapped
    ReverseControls = 5,
}

impl PowerupKind {
    /// All kinds, in weight-table order.
    pub const ALL: [PowerupKind; 6] = [
        PowerupKind::IncreaseBallSize,
        PowerupKind::IncreasePaddleSpeed,
        PowerupKind::DecreasePaddleSpeed,
        PowerupKind::DecreaseBallSize,
        PowerupKind::SuperSpeed,
        PowerupKind::ReverseControls,
    ];

    /// Relative spawn weight.
    pub const fn weight(self) -> u32 {
        match self {
            PowerupKind::IncreaseBallSize => 40,
            PowerupKind::IncreasePaddleSpeed => 25,
            PowerupKind::DecreasePaddleSpeed => 25,
            PowerupKind::DecreaseBallSize => 20,
            PowerupKind::SuperSpeed => 15,
            PowerupKind::ReverseControls => 15,
        }
    }

    /// Effect duration; `None` for permanent effects.
    pub const fn duration(self) -> Option<f64> {
        match self {
            PowerupKind::IncreaseBallSize | PowerupKind::DecreaseBallSize => None,
            PowerupKind::IncreasePaddleSpeed
            | PowerupKind::DecreasePaddleSpeed
            | PowerupKind::SuperSpeed
            | PowerupKind::ReverseControls => Some(EFFECT_DURATION),
        }
    }

    /// Draw a kind according to the weight table.
    pub fn roll(rng: &mut DeterministicRng) -> Self {
        let weights = Self::ALL.map(Self::weight);
        let index = rng.weighted_index(&weights).unwrap_or(0);
        Self::ALL[index]
    }
}

/// A powerup on the field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Powerup {
    /// Unique id within the session
    pub id: u32,
    /// Effect granted on collection
    pub kind: PowerupKind,
    /// Position
    pub center: Vec2,
    /// Collision radius
    pub radius: f64,
    /// Elapsed time at spawn
    pub spawn_time: f64,
}

impl Powerup {
    /// Kinematic view; powerups never move.
    #[inline]
    pub fn circle(&self) -> Circle {
        Circle::new(self.center, Vec2::ZERO, self.radius)
    }

    /// Hash this powerup's state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id);
        hasher.update_u8(self.kind as u8);
        hasher.update_vec2(self.center);
        hasher.update_f64(self.radius);
        hasher.update_f64(self.spawn_time);
    }
}

/// Apply a ball-size effect to the collecting ball.
///
/// Returns whether the ball changed.
pub fn apply_to_ball(kind: PowerupKind, ball: &mut Ball) -> bool {
    match kind {
        PowerupKind::IncreaseBallSize if ball.radius < MAX_GROW_RADIUS => {
            ball.set_radius(ball.radius * 1.5);
            true
        }
        PowerupKind::DecreaseBallSize if ball.radius > MIN_SHRINK_RADIUS => {
            ball.set_radius(ball.radius * 0.75);
            true
        }
        _ => false,
    }
}

// =============================================================================
// TIMED EFFECTS
// =============================================================================

/// A running timed effect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// Effect kind
    pub kind: PowerupKind,
    /// Elapsed time at which it ends
    pub expires_at: f64,
}

/// Session-wide timed effects. Multipliers are derived from the active set,
/// so expiry needs no undo bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct EffectState {
    active: Vec<ActiveEffect>,
}

impl EffectState {
    /// Start the timed part of `kind` at `now`. Permanent kinds are ignored.
    pub fn activate(&mut self, kind: PowerupKind, now: f64) {
        if let Some(duration) = kind.duration() {
            self.active.push(ActiveEffect {
                kind,
                expires_at: now + duration,
            });
        }
    }

    /// Drop effects that have run out by `now`, returning their kinds in
    /// activation order.
    pub fn expire(&mut self, now: f64) -> Vec<PowerupKind> {
        let mut expired = Vec::new();
        self.active.retain(|effect| {
            let done = now + EPS >= effect.expires_at;
            if done {
                expired.push(effect.kind);
            }
            !done
        });
        expired
    }

    /// Running effects in activation order.
    pub fn active(&self) -> &[ActiveEffect] {
        &self.active
    }

    fn count(&self, kind: PowerupKind) -> usize {
        self.active.iter().filter(|e| e.kind == kind).count()
    }

    /// Product of the running paddle speed effects.
    pub fn paddle_speed_multiplier(&self) -> f64 {
        self.active.iter().fold(1.0, |m, effect| match effect.kind {
            PowerupKind::IncreasePaddleSpeed => m * 2.0,
            PowerupKind::DecreasePaddleSpeed => m * 0.5,
            _ => m,
        })
    }

    /// Physics time multiplier.
    pub fn time_scale(&self) -> f64 {
        if self.count(PowerupKind::SuperSpeed) > 0 { 1.5 } else { 1.0 }
    }

    /// Whether paddle controls are swapped.
    pub fn controls_reversed(&self) -> bool {
        self.count(PowerupKind::ReverseControls) > 0
    }

    /// Hash the running effects.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.active.len() as u32);
        for effect in &self.active {
            hasher.update_u8(effect.kind as u8);
            hasher.update_f64(effect.expires_at);
        }
    }
}

// =============================================================================
// SPAWNING
// =============================================================================

/// Spawn schedule for one session.
#[derive(Clone, Debug)]
pub struct PowerupSpawner {
    frequency: f64,
    center: Vec2,
    spawn_radius: f64,
    next_spawn_time: f64,
    next_id: u32,
}

impl PowerupSpawner {
    /// Schedule with mean interval `frequency`; 0 disables spawning.
    /// The first powerup appears at time 0.
    pub fn new(frequency: f64, center: Vec2, spawn_radius: f64) -> Self {
        Self {
            frequency,
            center,
            spawn_radius,
            next_spawn_time: 0.0,
            next_id: 0,
        }
    }

    /// Whether a spawn is due at `now`.
    pub fn is_due(&self, now: f64) -> bool {
        self.frequency > 0.0 && now >= self.next_spawn_time
    }

    /// Elapsed time of the next spawn.
    pub fn next_spawn_time(&self) -> f64 {
        self.next_spawn_time
    }

    /// Create the next powerup and advance the schedule.
    pub fn spawn(&mut self, rng: &mut DeterministicRng, now: f64) -> Powerup {
        let kind = PowerupKind::roll(rng);
        let center = rng.random_point_in_disc(self.center, self.spawn_radius);
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.next_spawn_time += self.frequency * rng.next_f64_range(0.8, 1.2);

        Powerup {
            id,
            kind,
            center,
            radius: POWERUP_RADIUS,
            spawn_time: now,
        }
    }

    /// Hash the schedule.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_f64(self.next_spawn_time);
        hasher.update_u32(self.next_id);
    }
}
