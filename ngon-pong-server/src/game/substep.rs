//! Continuous Collision Substep Loop
//!
//! Advances a scene by one step of length `dt`, stopping at every collision
//! inside the step. The loop is a pure function of the scene, `dt` and the
//! handler, so a client predictor running it on the same state reaches the
//! same result.
//!
//! Candidate pairs are enumerated in a fixed order (each ball against the
//! walls, then paddles, then later balls, then powerups) and only a strictly
//! earlier time replaces the current best, which makes ties deterministic.

#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::vec2::EPS;
use crate::game::body::{Ball, BodyKind, PlayerId, Segment};
use crate::game::collision::{
    get_ball_collision_time, get_wall_collision_time,
    resolve_ball_collision, resolve_circle_line_collision,
};
use crate::game::paddle::Paddle;
use crate::game::powerup::Powerup;
use crate::game::response::{interacts, resolve_response, CollisionResponse};

/// Upper bound on resolved collisions per step.
pub const MAX_SUBSTEPS: u32 = 128;

/// Every body taking part in collision.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Balls, in spawn order
    pub balls: Vec<Ball>,
    /// Boundary segments
    pub walls: Vec<Segment>,
    /// Player paddles
    pub paddles: Vec<Paddle>,
    /// Powerups on the field
    pub powerups: Vec<Powerup>,
}

impl Scene {
    /// Integrate every moving body over `dt` without collision checks.
    pub fn advance(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        for ball in &mut self.balls {
            ball.advance(dt);
        }
        for wall in &mut self.walls {
            wall.advance(dt);
        }
        for paddle in &mut self.paddles {
            paddle.body.advance(dt);
        }
    }
}

/// A pair that will touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contact {
    /// Ball against `scene.walls[wall]`
    Wall { ball: usize, wall: usize },
    /// Ball against `scene.paddles[paddle]`
    Paddle { ball: usize, paddle: usize },
    /// Two balls, `a < b`
    Ball { a: usize, b: usize },
    /// Ball against `scene.powerups[powerup]`
    Powerup { ball: usize, powerup: usize },
}

/// Earliest contact within a window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impact {
    /// Time from now
    pub time: f64,
    /// Pair involved
    pub contact: Contact,
    /// How the pair is handled
    pub response: CollisionResponse,
}

/// Game-level reactions to non-physical responses.
pub trait ContactHandler {
    /// A ball reached `player`'s wall. The handler must move the ball away
    /// from the wall (usually back to the center).
    fn on_score(&mut self, scene: &mut Scene, ball: usize, player: PlayerId);

    /// A ball touched a powerup. The handler must remove the powerup.
    fn on_collect(&mut self, scene: &mut Scene, ball: usize, powerup: usize);
}

/// What happened during one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SubstepOutcome {
    /// Collisions resolved
    pub substeps: u32,
    /// Whether the loop gave up before the end of the step
    pub budget_exceeded: bool,
    /// Time integrated without resolution after giving up
    pub unresolved_time: f64,
}

/// Find the earliest contact in `[0, max_time]`.
pub fn find_earliest_impact(scene: &Scene, max_time: f64) -> Option<Impact> {
    let mut best: Option<Impact> = None;
    let mut consider = |time: Option<f64>, contact: Contact, response: CollisionResponse| {
        if let Some(time) = time {
            if best.map_or(true, |b| time < b.time) {
                best = Some(Impact { time, contact, response });
            }
        }
    };

    for (i, ball) in scene.balls.iter().enumerate() {
        let circle = ball.circle();

        for (j, wall) in scene.walls.iter().enumerate() {
            if !interacts(BodyKind::Ball, wall.body_kind()) {
                continue;
            }
            let response = resolve_response(BodyKind::Ball, wall.body_kind());
            let time = get_wall_collision_time(&circle, wall, max_time);
            consider(time, Contact::Wall { ball: i, wall: j }, response);
        }

        for (j, paddle) in scene.paddles.iter().enumerate() {
            let response = resolve_response(BodyKind::Ball, paddle.body.body_kind());
            let time = get_wall_collision_time(&circle, &paddle.body, max_time);
            consider(time, Contact::Paddle { ball: i, paddle: j }, response);
        }

        for (j, other) in scene.balls.iter().enumerate().skip(i + 1) {
            let time = get_ball_collision_time(&circle, &other.circle(), max_time);
            let response = resolve_response(BodyKind::Ball, BodyKind::Ball);
            consider(time, Contact::Ball { a: i, b: j }, response);
        }

        for (j, powerup) in scene.powerups.iter().enumerate() {
            let time = get_ball_collision_time(&circle, &powerup.circle(), max_time);
            let response = resolve_response(BodyKind::Ball, BodyKind::Powerup);
            consider(time, Contact::Powerup { ball: i, powerup: j }, response);
        }
    }

    best
}

/// Run the substep loop over `dt`.
///
/// Bounce pairs are resolved here; score and destroy responses go to
/// `handler`. After [`MAX_SUBSTEPS`] resolutions the rest of the step is
/// integrated without further resolution and the outcome is flagged.
pub fn run_substeps<H: ContactHandler>(scene: &mut Scene, dt: f64, handler: &mut H) -> SubstepOutcome {
    let mut outcome = SubstepOutcome::default();
    let mut remaining = dt.max(0.0);

    while remaining > EPS {
        let Some(impact) = find_earliest_impact(scene, remaining) else {
            scene.advance(remaining);
            return outcome;
        };

        if outcome.substeps >= MAX_SUBSTEPS {
            scene.advance(remaining);
            outcome.budget_exceeded = true;
            outcome.unresolved_time = remaining;
            return outcome;
        }

        #[cfg(feature = "debug-tracing")]
        trace!(
            substep = outcome.substeps,
            time = impact.time,
            remaining,
            contact = ?impact.contact,
            response = ?impact.response,
            "substep impact"
        );

        scene.advance(impact.time);
        remaining -= impact.time;
        outcome.substeps += 1;
        apply_impact(scene, impact, handler);
    }

    // Sub-EPS leftovers still move the bodies
    scene.advance(remaining);
    outcome
}

fn apply_impact<H: ContactHandler>(scene: &mut Scene, impact: Impact, handler: &mut H) {
    match (impact.contact, impact.response) {
        (_, CollisionResponse::PassThrough) => {}

        (Contact::Wall { ball, wall }, CollisionResponse::Score) => {
            match scene.walls[wall].owner() {
                Some(player) => handler.on_score(scene, ball, player),
                None => resolve_circle_line_collision(&mut scene.balls[ball], &mut scene.walls[wall]),
            }
        }
        (Contact::Wall { ball, wall }, _) => {
            resolve_circle_line_collision(&mut scene.balls[ball], &mut scene.walls[wall]);
        }

        (Contact::Paddle { ball, paddle }, _) => {
            resolve_circle_line_collision(&mut scene.balls[ball], &mut scene.paddles[paddle].body);
        }

        (Contact::Ball { a, b }, _) => {
            let (left, right) = scene.balls.split_at_mut(b);
            resolve_ball_collision(&mut left[a], &mut right[0]);
        }

        (Contact::Powerup { ball, powerup }, _) => {
            handler.on_collect(scene, ball, powerup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::{is_nearly, Vec2};
    use crate::game::body::BallId;
    use crate::game::powerup::{PowerupKind, POWERUP_RADIUS};

    /// Records responses; scores send the ball to the origin at rest.
    #[derive(Default)]
    struct Recorder {
        scored: Vec<(usize, PlayerId)>,
        collected: Vec<(usize, u32)>,
    }

    impl ContactHandler for Recorder {
        fn on_score(&mut self, scene: &mut Scene, ball: usize, player: PlayerId) {
            self.scored.push((ball, player));
            scene.balls[ball].center = Vec2::ZERO;
            scene.balls[ball].velocity = Vec2::ZERO;
        }

        fn on_collect(&mut self, scene: &mut Scene, ball: usize, powerup: usize) {
            let removed = scene.powerups.remove(powerup);
            self.collected.push((ball, removed.id));
        }
    }

    fn ball(id: u32, x: f64, y: f64, vx: f64, vy: f64) -> Ball {
        Ball::new(BallId(id), Vec2::new(x, y), Vec2::new(vx, vy), 10.0)
    }

    /// Square box from (0,0) to (size,size), all neutral walls.
    fn boxed(size: f64) -> Vec<Segment> {
        let c = [
            Vec2::new(0.0, 0.0),
            Vec2::new(size, 0.0),
            Vec2::new(size, size),
            Vec2::new(0.0, size),
        ];
        (0..4).map(|i| Segment::wall(c[i], c[(i + 1) % 4])).collect()
    }

    #[test]
    fn test_free_flight_without_contacts() {
        let mut scene = Scene {
            balls: vec![ball(0, 50.0, 50.0, 10.0, 5.0)],
            walls: boxed(1000.0),
            ..Scene::default()
        };
        let outcome = run_substeps(&mut scene, 1.0, &mut Recorder::default());
        assert_eq!(outcome.substeps, 0);
        assert_eq!(scene.balls[0].center, Vec2::new(60.0, 55.0));
    }

    #[test]
    fn test_bounce_inside_step() {
        // Hits the right wall at t=0.5 and travels back for 0.5
        let mut scene = Scene {
            balls: vec![ball(0, 940.0, 500.0, 100.0, 0.0)],
            walls: boxed(1000.0),
            ..Scene::default()
        };
        let outcome = run_substeps(&mut scene, 1.0, &mut Recorder::default());
        assert_eq!(outcome.substeps, 1);
        assert!(!outcome.budget_exceeded);
        assert!(is_nearly(scene.balls[0].center.x, 940.0));
        assert!(is_nearly(scene.balls[0].velocity.x, -100.0));
    }

    #[test]
    fn test_fast_ball_never_tunnels() {
        // Ten box widths per step
        let mut scene = Scene {
            balls: vec![ball(0, 500.0, 500.0, 10_000.0, 3_700.0)],
            walls: boxed(1000.0),
            ..Scene::default()
        };
        let outcome = run_substeps(&mut scene, 1.0, &mut Recorder::default());
        assert!(outcome.substeps > 10);
        let c = scene.balls[0].center;
        let r = scene.balls[0].radius;
        assert!(c.x >= r - EPS && c.x <= 1000.0 - r + EPS);
        assert!(c.y >= r - EPS && c.y <= 1000.0 - r + EPS);
        assert!(is_nearly(scene.balls[0].velocity.length(), Vec2::new(10_000.0, 3_700.0).length()));
    }

    #[test]
    fn test_player_wall_scores_instead_of_bouncing() {
        let mut walls = boxed(1000.0);
        walls[1] = Segment::player_wall(walls[1].a, walls[1].b, 42);
        let mut scene = Scene {
            balls: vec![ball(0, 940.0, 500.0, 100.0, 0.0)],
            walls,
            ..Scene::default()
        };
        let mut recorder = Recorder::default();
        run_substeps(&mut scene, 1.0, &mut recorder);
        assert_eq!(recorder.scored, vec![(0, 42)]);
        assert_eq!(scene.balls[0].center, Vec2::ZERO);
    }

    #[test]
    fn test_decoration_is_ignored() {
        let mut scene = Scene {
            balls: vec![ball(0, 0.0, 50.0, 0.0, -100.0)],
            walls: vec![Segment::decoration(Vec2::new(-100.0, 0.0), Vec2::new(100.0, 0.0))],
            ..Scene::default()
        };
        let outcome = run_substeps(&mut scene, 1.0, &mut Recorder::default());
        assert_eq!(outcome.substeps, 0);
        assert!(is_nearly(scene.balls[0].center.y, -50.0));
    }

    #[test]
    fn test_earliest_impact_skips_decoration() {
        let scene = Scene {
            balls: vec![ball(0, 0.0, 0.0, 0.0, 100.0)],
            walls: vec![
                Segment::decoration(Vec2::new(-100.0, 20.0), Vec2::new(100.0, 20.0)),
                Segment::wall(Vec2::new(-100.0, 60.0), Vec2::new(100.0, 60.0)),
            ],
            ..Scene::default()
        };
        let impact = find_earliest_impact(&scene, 1.0).unwrap();
        assert_eq!(impact.contact, Contact::Wall { ball: 0, wall: 1 });
        assert_eq!(impact.response, CollisionResponse::Bounce);
    }

    #[test]
    fn test_powerup_collected_ball_unaffected() {
        let mut scene = Scene {
            balls: vec![ball(0, 0.0, 0.0, 100.0, 0.0)],
            powerups: vec![Powerup {
                id: 9,
                kind: PowerupKind::SuperSpeed,
                center: Vec2::new(50.0, 0.0),
                radius: POWERUP_RADIUS,
                spawn_time: 0.0,
            }],
            ..Scene::default()
        };
        let mut recorder = Recorder::default();
        run_substeps(&mut scene, 1.0, &mut recorder);
        assert_eq!(recorder.collected, vec![(0, 9)]);
        assert!(scene.powerups.is_empty());
        assert!(is_nearly(scene.balls[0].center.x, 100.0));
        assert_eq!(scene.balls[0].velocity, Vec2::new(100.0, 0.0));
    }

    #[test]
    fn test_ball_pair_resolved() {
        let mut scene = Scene {
            balls: vec![ball(0, 0.0, 0.0, 50.0, 0.0), ball(1, 100.0, 0.0, -50.0, 0.0)],
            ..Scene::default()
        };
        let outcome = run_substeps(&mut scene, 1.0, &mut Recorder::default());
        assert_eq!(outcome.substeps, 1);
        assert!(is_nearly(scene.balls[0].velocity.x, -50.0));
        assert!(is_nearly(scene.balls[1].velocity.x, 50.0));
        // Met at t=0.8 and separated for 0.2
        assert!(is_nearly(scene.balls[0].center.x, 30.0));
        assert!(is_nearly(scene.balls[1].center.x, 70.0));
    }

    #[test]
    fn test_tie_broken_by_enumeration_order() {
        // Ball 0 reaches the wall and ball 1 at the same instant
        let wall = Segment::wall(Vec2::new(100.0, -100.0), Vec2::new(100.0, 100.0));
        let scene = Scene {
            balls: vec![ball(0, 40.0, 0.0, 50.0, 0.0), ball(1, 40.0, 70.0, 50.0, 0.0)],
            walls: vec![wall],
            ..Scene::default()
        };
        let impact = find_earliest_impact(&scene, 10.0).unwrap();
        assert_eq!(impact.contact, Contact::Wall { ball: 0, wall: 0 });
    }

    #[test]
    fn test_budget_exceeded_is_fail_soft() {
        struct Bouncer;
        impl ContactHandler for Bouncer {
            fn on_score(&mut self, _: &mut Scene, _: usize, _: PlayerId) {}
            fn on_collect(&mut self, _: &mut Scene, _: usize, _: usize) {}
        }

        // A scoring wall whose handler never moves the ball keeps
        // reporting contact at t=0
        let mut scene = Scene {
            balls: vec![ball(0, 0.0, 10.0, 0.0, -10.0)],
            walls: vec![Segment::player_wall(Vec2::new(-100.0, 0.0), Vec2::new(100.0, 0.0), 1)],
            ..Scene::default()
        };
        let outcome = run_substeps(&mut scene, 0.5, &mut Bouncer);
        assert!(outcome.budget_exceeded);
        assert_eq!(outcome.substeps, MAX_SUBSTEPS);
        assert!(is_nearly(outcome.unresolved_time, 0.5));
        assert!(is_nearly(scene.balls[0].center.y, 5.0));
    }
}
