//! Physical Bodies
//!
//! Balls and line segments (walls, scoring walls, paddles) as plain values.
//! A closed set of kinds replaces a class hierarchy; the collision policy
//! for a pair of kinds lives in [`crate::game::response`].

use std::f64::consts::PI;
use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::vec2::{Vec2, EPS};

/// Player identifier, as assigned by the match-lifecycle collaborator.
pub type PlayerId = u32;

/// Unique ball identifier within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BallId(pub u32);

/// Monotonic ball id allocator, owned by its session.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Create an allocator starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next ball id.
    pub fn next_ball_id(&mut self) -> BallId {
        let id = BallId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next
    }
}

/// Kind tag used to look up collision policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Moving ball
    Ball,
    /// Neutral arena boundary
    Wall,
    /// Scoring wall owned by a player
    PlayerWall,
    /// Player paddle
    Paddle,
    /// Collectible powerup
    Powerup,
    /// Decorative edge with no collision policy
    Decoration,
}

/// Kinematic view of a circular body, used by time-of-impact queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    /// Center position
    pub center: Vec2,
    /// Velocity (units per second)
    pub velocity: Vec2,
    /// Radius (0 for a point)
    pub radius: f64,
}

impl Circle {
    /// Create a circle.
    pub const fn new(center: Vec2, velocity: Vec2, radius: f64) -> Self {
        Self { center, velocity, radius }
    }
}

// =============================================================================
// BALL
// =============================================================================

/// A ball.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ball {
    /// Unique id within the session
    pub id: BallId,
    /// Center position
    pub center: Vec2,
    /// Velocity (units per second)
    pub velocity: Vec2,
    /// Radius
    pub radius: f64,
    /// Inverse mass (0 = immovable)
    pub inverse_mass: f64,
    /// Restitution in [0, 1]
    pub restitution: f64,
}

impl Ball {
    /// Default ball radius.
    pub const DEFAULT_RADIUS: f64 = 10.0;

    /// Create a perfectly elastic ball whose mass is its disc area.
    pub fn new(id: BallId, center: Vec2, velocity: Vec2, radius: f64) -> Self {
        Self {
            id,
            center,
            velocity,
            radius,
            inverse_mass: area_inverse_mass(radius),
            restitution: 1.0,
        }
    }

    /// Change the radius, keeping mass proportional to area.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
        self.inverse_mass = area_inverse_mass(radius);
    }

    /// Kinematic view.
    #[inline]
    pub fn circle(&self) -> Circle {
        Circle::new(self.center, self.velocity, self.radius)
    }

    /// Integrate position over `dt`.
    #[inline]
    pub fn advance(&mut self, dt: f64) {
        self.center = self.center + self.velocity * dt;
    }

    /// Hash this ball's state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_vec2(self.center);
        hasher.update_vec2(self.velocity);
        hasher.update_f64(self.radius);
        hasher.update_f64(self.inverse_mass);
        hasher.update_f64(self.restitution);
    }
}

/// `1 / (π r²)`, or 0 for a degenerate radius.
fn area_inverse_mass(radius: f64) -> f64 {
    let area = PI * radius * radius;
    if area <= EPS {
        return 0.0;
    }
    1.0 / area
}

// =============================================================================
// SEGMENT
// =============================================================================

/// What a segment is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    /// Neutral boundary between two player walls
    Wall,
    /// Scoring wall for a player
    PlayerWall(PlayerId),
    /// Paddle face for a player
    Paddle(PlayerId),
    /// Non-colliding edge
    Decoration,
}

/// A (possibly moving) line segment with optional thickness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Segment {
    /// First endpoint
    pub a: Vec2,
    /// Second endpoint
    pub b: Vec2,
    /// Velocity shared by both endpoints
    pub velocity: Vec2,
    /// Inverse mass (0 = immovable)
    pub inverse_mass: f64,
    /// Restitution in [0, 1]
    pub restitution: f64,
    /// Contact distance added to a ball's radius (rounded ends)
    pub half_thickness: f64,
    /// Role of this segment
    pub kind: SegmentKind,
}

impl Segment {
    fn with_kind(a: Vec2, b: Vec2, half_thickness: f64, kind: SegmentKind) -> Self {
        Self {
            a,
            b,
            velocity: Vec2::ZERO,
            inverse_mass: 0.0,
            restitution: 1.0,
            half_thickness,
            kind,
        }
    }

    /// Static neutral wall.
    pub fn wall(a: Vec2, b: Vec2) -> Self {
        Self::with_kind(a, b, 0.0, SegmentKind::Wall)
    }

    /// Static scoring wall for `player`.
    pub fn player_wall(a: Vec2, b: Vec2, player: PlayerId) -> Self {
        Self::with_kind(a, b, 0.0, SegmentKind::PlayerWall(player))
    }

    /// Paddle face for `player`.
    pub fn paddle(a: Vec2, b: Vec2, half_thickness: f64, player: PlayerId) -> Self {
        Self::with_kind(a, b, half_thickness, SegmentKind::Paddle(player))
    }

    /// Non-colliding edge.
    pub fn decoration(a: Vec2, b: Vec2) -> Self {
        Self::with_kind(a, b, 0.0, SegmentKind::Decoration)
    }

    /// Collision-policy kind.
    pub fn body_kind(&self) -> BodyKind {
        match self.kind {
            SegmentKind::Wall => BodyKind::Wall,
            SegmentKind::PlayerWall(_) => BodyKind::PlayerWall,
            SegmentKind::Paddle(_) => BodyKind::Paddle,
            SegmentKind::Decoration => BodyKind::Decoration,
        }
    }

    /// Owning player, if any.
    pub fn owner(&self) -> Option<PlayerId> {
        match self.kind {
            SegmentKind::PlayerWall(id) | SegmentKind::Paddle(id) => Some(id),
            SegmentKind::Wall | SegmentKind::Decoration => None,
        }
    }

    /// `b - a`
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.b - self.a
    }

    /// Segment length.
    #[inline]
    pub fn length(&self) -> f64 {
        self.direction().length()
    }

    /// Midpoint.
    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        self.a.lerp(self.b, 0.5)
    }

    /// Unit normal, `perp(b - a)` normalized. Zero for a degenerate segment.
    #[inline]
    pub fn normal(&self) -> Vec2 {
        self.direction().perpendicular().normalize()
    }

    /// Closest point on the segment to `p`.
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        let w = self.direction();
        let len_sq = w.length_squared();
        if len_sq <= EPS {
            return self.a;
        }
        let t = ((p - self.a).dot(w) / len_sq).clamp(0.0, 1.0);
        self.a + w * t
    }

    /// Integrate both endpoints over `dt`.
    #[inline]
    pub fn advance(&mut self, dt: f64) {
        let delta = self.velocity * dt;
        self.a = self.a + delta;
        self.b = self.b + delta;
    }

    /// Move both endpoints by `delta`.
    #[inline]
    pub fn translate(&mut self, delta: Vec2) {
        self.a = self.a + delta;
        self.b = self.b + delta;
    }

    /// Hash this segment's state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_vec2(self.a);
        hasher.update_vec2(self.b);
        hasher.update_vec2(self.velocity);
        hasher.update_f64(self.half_thickness);
        match self.kind {
            SegmentKind::Wall => hasher.update_u8(0),
            SegmentKind::PlayerWall(id) => {
                hasher.update_u8(1);
                hasher.update_u32(id);
            }
            SegmentKind::Paddle(id) => {
                hasher.update_u8(2);
                hasher.update_u32(id);
            }
            SegmentKind::Decoration => hasher.update_u8(3),
        }
    }
}
