//! Game Session
//!
//! One match: arena, balls, paddles, powerups and scores, advanced by
//! [`GameSession::play_simulation`]. A session is single-threaded; callers
//! serialize access (see `network::registry`).
//!
//! # Determinism
//!
//! Every random draw comes from the session's own seeded RNG and every
//! collection iterates in a fixed order, so two sessions built with the same
//! seed and fed the same intents and tick lengths stay bit-identical.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::{derive_session_seed, DeterministicRng};
use crate::core::vec2::{Vec2, EPS};
use crate::game::arena::{build_arena, Arena};
use crate::game::body::{Ball, IdAllocator, PlayerId, Segment, SegmentKind};
use crate::game::config::{ConfigError, GameConfig};
use crate::game::events::GameEvent;
use crate::game::paddle::{corner_clearance, PaddleIntent};
use crate::game::powerup::{apply_to_ball, EffectState, PowerupSpawner};
use crate::game::snapshot::{
    score_map, BallTuple, BoardMetadata, BoardSnapshot, EffectTuple, PowerupTuple, SegmentTuple,
};
use crate::game::substep::{run_substeps, ContactHandler, Scene, SubstepOutcome};

/// Result of one [`GameSession::play_simulation`] call.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Tick number just completed
    pub tick: u64,
    /// Events generated this tick, in order
    pub events: Vec<GameEvent>,
    /// Collisions resolved
    pub substeps: u32,
    /// Whether any step hit the substep bound
    pub budget_exceeded: bool,
}

/// An authoritative match.
#[derive(Clone, Debug)]
pub struct GameSession {
    id: u64,
    players: Vec<PlayerId>,
    config: GameConfig,
    seed: u64,
    rng: DeterministicRng,
    arena: Arena,
    scene: Scene,
    ball_ids: IdAllocator,
    intents: BTreeMap<PlayerId, PaddleIntent>,
    concedes: BTreeMap<PlayerId, u32>,
    effects: EffectState,
    spawner: PowerupSpawner,
    elapsed_time: f64,
    tick: u64,
}

impl GameSession {
    /// Create a session, seeding its RNG from `id` and `players`.
    pub fn create(id: u64, players: &[PlayerId], config: GameConfig) -> Result<Self, ConfigError> {
        let seed = derive_session_seed(id, players);
        Self::with_seed(id, players, config, seed)
    }

    /// Create a session with an explicit seed (client-side prediction).
    pub fn with_seed(
        id: u64,
        players: &[PlayerId],
        config: GameConfig,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate(players)?;
        let layout = build_arena(players, &config)?;

        let mut rng = DeterministicRng::new(seed);
        let mut ball_ids = IdAllocator::new();
        let center = layout.arena.center;

        let balls = (0..config.ball_count)
            .map(|_| {
                let velocity = rng.random_direction() * config.ball_speed;
                Ball::new(ball_ids.next_ball_id(), center, velocity, Ball::DEFAULT_RADIUS)
            })
            .collect();

        let spawner = PowerupSpawner::new(config.powerup_frequency, center, layout.powerup_spawn_radius);

        info!(
            "Created session {} with {} players, {} balls",
            id,
            players.len(),
            config.ball_count
        );

        Ok(Self {
            id,
            players: players.to_vec(),
            seed,
            rng,
            arena: layout.arena,
            scene: Scene {
                balls,
                walls: layout.walls,
                paddles: layout.paddles,
                powerups: Vec::new(),
            },
            ball_ids,
            intents: BTreeMap::new(),
            concedes: players.iter().map(|p| (*p, 0)).collect(),
            effects: EffectState::default(),
            spawner,
            elapsed_time: 0.0,
            tick: 0,
            config,
        })
    }

    /// Session id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Players in seat order (broadcast recipients).
    pub fn get_players(&self) -> Vec<PlayerId> {
        self.players.clone()
    }

    /// Creation options.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Arena geometry.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// All colliding bodies.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Simulated seconds so far.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Ticks played.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Times each player has conceded.
    pub fn concedes(&self) -> &BTreeMap<PlayerId, u32> {
        &self.concedes
    }

    /// Record the latest movement intent for `player`.
    ///
    /// Intents persist until replaced. Returns `false` if the player has no
    /// paddle in this session.
    pub fn queue_intent(&mut self, player: PlayerId, intent: PaddleIntent) -> bool {
        if !self.scene.paddles.iter().any(|p| p.player == player) {
            return false;
        }
        self.intents.insert(player, intent);
        true
    }

    /// Remove a player who left mid-match.
    ///
    /// Their paddle disappears and their wall becomes a neutral wall. The
    /// player stays in [`get_players`](Self::get_players).
    pub fn remove_player(&mut self, player: PlayerId) -> Option<GameEvent> {
        let before = self.scene.paddles.len();
        self.scene.paddles.retain(|p| p.player != player);
        let had_paddle = self.scene.paddles.len() != before;

        let mut had_wall = false;
        for wall in &mut self.scene.walls {
            if wall.kind == SegmentKind::PlayerWall(player) {
                *wall = Segment::wall(wall.a, wall.b);
                had_wall = true;
            }
        }
        self.intents.remove(&player);

        if !had_paddle && !had_wall {
            return None;
        }
        info!("Player {} removed from session {}", player, self.id);
        Some(GameEvent::player_removed(self.tick, player))
    }

    /// Advance the session by `delta_time` seconds.
    ///
    /// Non-finite or negative times are treated as zero.
    pub fn play_simulation(&mut self, delta_time: f64) -> TickReport {
        let delta_time = if delta_time.is_finite() { delta_time.max(0.0) } else { 0.0 };
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        // 1. Expire timed effects
        for kind in self.effects.expire(self.elapsed_time) {
            debug!("Session {}: {:?} expired", self.id, kind);
            report.events.push(GameEvent::powerup_expired(self.tick, kind));
        }

        // 2. Spawn powerups on schedule
        if self.spawner.is_due(self.elapsed_time) {
            let powerup = self.spawner.spawn(&mut self.rng, self.elapsed_time);
            debug!(
                "Session {}: spawned {:?} at ({:.2}, {:.2})",
                self.id, powerup.kind, powerup.center.x, powerup.center.y
            );
            report.events.push(GameEvent::powerup_spawned(
                self.tick,
                powerup.id,
                powerup.kind,
                powerup.center,
            ));
            self.scene.powerups.push(powerup);
        }

        // 3. Physics, split wherever a paddle reaches the end of its track
        let mut remaining = delta_time * self.effects.time_scale();
        while remaining > EPS {
            let step = remaining.min(self.steer_paddles());
            let outcome = self.run_step(step, &mut report.events);

            report.substeps += outcome.substeps;
            if outcome.budget_exceeded {
                report.budget_exceeded = true;
                warn!(
                    "Session {}: substep budget exceeded ({} substeps, {:.6}s unresolved)",
                    self.id, outcome.substeps, outcome.unresolved_time
                );
                report.events.push(GameEvent::substep_budget_exceeded(
                    self.tick,
                    outcome.substeps,
                    outcome.unresolved_time,
                ));
            }

            for paddle in &mut self.scene.paddles {
                paddle.settle();
            }
            self.recover_escaped_balls();
            remaining -= step;
        }

        // 4. Advance the clock
        self.elapsed_time += delta_time;

        report
    }

    /// Set paddle velocities from intents; returns the earliest time any
    /// moving paddle reaches its track end.
    fn steer_paddles(&mut self) -> f64 {
        let multiplier = self.effects.paddle_speed_multiplier();
        let reversed = self.effects.controls_reversed();

        let largest = self.scene.balls.iter().map(|b| b.radius).fold(0.0, f64::max);
        let clearance = corner_clearance(largest);

        let mut earliest = f64::INFINITY;
        for paddle in &mut self.scene.paddles {
            paddle.set_clearance(clearance);
            let mut intent = self.intents.get(&paddle.player).copied().unwrap_or_default();
            if reversed {
                intent = intent.reversed();
            }
            let speed = paddle.base_speed() * multiplier;
            earliest = earliest.min(paddle.steer(intent, speed));
        }
        earliest
    }

    /// Return any ball whose center left the polygon to the center with a
    /// fresh serve. Only a step that ran out of substeps can lose a ball.
    fn recover_escaped_balls(&mut self) {
        for ball in &mut self.scene.balls {
            if self.arena.contains(ball.center) {
                continue;
            }
            warn!(
                "Session {}: ball {} escaped to ({:.2}, {:.2}), re-serving",
                self.id, ball.id.0, ball.center.x, ball.center.y
            );
            ball.center = self.arena.center;
            ball.velocity = self.rng.random_direction() * self.config.ball_speed;
        }
    }

    fn run_step(&mut self, dt: f64, events: &mut Vec<GameEvent>) -> SubstepOutcome {
        let mut contacts = SessionContacts {
            session_id: self.id,
            tick: self.tick,
            now: self.elapsed_time,
            center: self.arena.center,
            ball_speed: self.config.ball_speed,
            rng: &mut self.rng,
            concedes: &mut self.concedes,
            effects: &mut self.effects,
            events,
        };
        run_substeps(&mut self.scene, dt, &mut contacts)
    }

    /// Board state for broadcast.
    ///
    /// Contains no clock, so a board with no motion is identical across ticks.
    pub fn fetch_board_json(&self) -> BoardSnapshot {
        BoardSnapshot {
            metadata: BoardMetadata {
                players: self.players.clone(),
            },
            walls: self.scene.walls.iter().map(SegmentTuple::from).collect(),
            paddles: self.scene.paddles.iter().map(|p| SegmentTuple::from(&p.body)).collect(),
            balls: self.scene.balls.iter().map(BallTuple::from).collect(),
            powerups: self.scene.powerups.iter().map(PowerupTuple::from).collect(),
            effects: self
                .effects
                .active()
                .iter()
                .map(|e| EffectTuple::at(e, self.elapsed_time))
                .collect(),
            score: score_map(&self.players, &self.concedes),
        }
    }

    /// Hash of the full simulation state.
    pub fn state_hash(&self) -> StateHash {
        compute_state_hash(self.elapsed_time, self.seed, |hasher| {
            hasher.update_u64(self.tick);
            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);

            hasher.update_u32(self.scene.balls.len() as u32);
            for ball in &self.scene.balls {
                ball.hash_into(hasher);
            }
            hasher.update_u32(self.scene.walls.len() as u32);
            for wall in &self.scene.walls {
                wall.hash_into(hasher);
            }
            hasher.update_u32(self.scene.paddles.len() as u32);
            for paddle in &self.scene.paddles {
                paddle.body.hash_into(hasher);
            }
            hasher.update_u32(self.scene.powerups.len() as u32);
            for powerup in &self.scene.powerups {
                powerup.hash_into(hasher);
            }

            self.effects.hash_into(hasher);
            self.spawner.hash_into(hasher);
            hasher.update_u32(self.ball_ids.allocated());

            for (player, count) in &self.concedes {
                hasher.update_u32(*player);
                hasher.update_u32(*count);
            }
        })
    }
}

/// Session-side reactions to scoring and pickups.
struct SessionContacts<'a> {
    session_id: u64,
    tick: u64,
    now: f64,
    center: Vec2,
    ball_speed: f64,
    rng: &'a mut DeterministicRng,
    concedes: &'a mut BTreeMap<PlayerId, u32>,
    effects: &'a mut EffectState,
    events: &'a mut Vec<GameEvent>,
}

impl ContactHandler for SessionContacts<'_> {
    fn on_score(&mut self, scene: &mut Scene, ball: usize, player: PlayerId) {
        let count = self.concedes.entry(player).or_insert(0);
        *count += 1;

        let ball = &mut scene.balls[ball];
        ball.center = self.center;
        ball.velocity = self.rng.random_direction() * self.ball_speed;

        debug!(
            "Session {}: player {} conceded (total {})",
            self.session_id, player, *count
        );
        self.events.push(GameEvent::ball_scored(self.tick, ball.id, player));
    }

    fn on_collect(&mut self, scene: &mut Scene, ball: usize, powerup: usize) {
        let powerup = scene.powerups.remove(powerup);
        let ball = &mut scene.balls[ball];

        apply_to_ball(powerup.kind, ball);
        self.effects.activate(powerup.kind, self.now);

        debug!(
            "Session {}: ball {} collected {:?}",
            self.session_id, ball.id.0, powerup.kind
        );
        self.events.push(GameEvent::powerup_collected(self.tick, powerup.id, powerup.kind, ball.id));
    }
}
