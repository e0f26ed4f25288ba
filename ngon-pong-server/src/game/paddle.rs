//! Paddles
//!
//! A paddle is a thick segment sliding along a straight track parallel to its
//! player's wall. Its position lives in the segment itself; the track only
//! bounds it.

use serde::{Serialize, Deserialize};

use crate::core::vec2::{Vec2, EPS, FAT_EPS};
use crate::game::body::{PlayerId, Segment};

/// Movement requested by a player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddleIntent {
    /// Move counter-clockwise around the arena
    CounterClockwise,
    /// Hold position
    #[default]
    Stop,
    /// Move clockwise around the arena
    Clockwise,
}

impl PaddleIntent {
    /// Signed direction along the track axis.
    #[inline]
    pub fn direction(self) -> f64 {
        match self {
            PaddleIntent::CounterClockwise => -1.0,
            PaddleIntent::Stop => 0.0,
            PaddleIntent::Clockwise => 1.0,
        }
    }

    /// Opposite intent (reversed controls).
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            PaddleIntent::CounterClockwise => PaddleIntent::Clockwise,
            PaddleIntent::Stop => PaddleIntent::Stop,
            PaddleIntent::Clockwise => PaddleIntent::CounterClockwise,
        }
    }
}

/// How the end of a paddle approaches the neighbouring wall.
///
/// At offset 0 the paddle surface is `distance` from the wall; each unit of
/// offset toward it closes the gap by `rate`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    /// Surface-to-wall gap at offset 0
    pub distance: f64,
    /// Gap closed per unit of offset
    pub rate: f64,
}

impl Corner {
    /// No neighbouring wall in this direction.
    pub const OPEN: Corner = Corner { distance: f64::INFINITY, rate: 1.0 };

    /// Largest offset that leaves at least `clearance` free.
    pub fn limit(&self, clearance: f64) -> f64 {
        if self.rate <= EPS {
            return f64::INFINITY;
        }
        (self.distance - clearance) / self.rate
    }
}

/// Gap a paddle end keeps from a neighbouring wall while the largest ball on
/// the field has radius `radius`: one diameter plus a margin of at least one
/// radius, so a ball caught in the corner is never pinned.
pub fn corner_clearance(radius: f64) -> f64 {
    2.0 * radius + radius.max(1.0)
}

/// A player's paddle and its track.
#[derive(Clone, Debug)]
pub struct Paddle {
    /// Owning player
    pub player: PlayerId,
    /// Collision body
    pub body: Segment,
    anchor: Vec2,
    axis: Vec2,
    travel: f64,
    corners: [Corner; 2],
    clearance: f64,
    base_speed: f64,
}

impl Paddle {
    /// Create a paddle centered on its track.
    ///
    /// `axis` is the unit clockwise direction; `travel` is the largest offset
    /// of the paddle center from `anchor` in either direction.
    pub fn new(
        player: PlayerId,
        anchor: Vec2,
        axis: Vec2,
        half_width: f64,
        half_thickness: f64,
        travel: f64,
        base_speed: f64,
    ) -> Self {
        let axis = axis.normalize();
        let body = Segment::paddle(
            anchor - axis * half_width,
            anchor + axis * half_width,
            half_thickness,
            player,
        );
        Self {
            player,
            body,
            anchor,
            axis,
            travel: travel.max(0.0),
            corners: [Corner::OPEN, Corner::OPEN],
            clearance: 0.0,
            base_speed,
        }
    }

    /// Bound the track by the walls met going clockwise and counterclockwise.
    pub fn with_corners(mut self, clockwise: Corner, counter_clockwise: Corner) -> Self {
        self.corners = [clockwise, counter_clockwise];
        self
    }

    /// Gap to keep between the paddle ends and the neighbouring walls.
    pub fn set_clearance(&mut self, clearance: f64) {
        self.clearance = clearance.max(0.0);
    }

    /// Largest `|offset|` reachable moving in `direction` (sign only).
    pub fn bound(&self, direction: f64) -> f64 {
        let corner = if direction >= 0.0 { self.corners[0] } else { self.corners[1] };
        self.travel.min(corner.limit(self.clearance)).max(0.0)
    }

    /// Current center.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.body.midpoint()
    }

    /// Signed distance of the center from the track midpoint.
    #[inline]
    pub fn offset(&self) -> f64 {
        (self.center() - self.anchor).dot(self.axis)
    }

    /// Track midpoint.
    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Unit clockwise direction.
    pub fn axis(&self) -> Vec2 {
        self.axis
    }

    /// Largest `|offset|` the wall extent allows.
    pub fn travel(&self) -> f64 {
        self.travel
    }

    /// Speed before powerup multipliers.
    pub fn base_speed(&self) -> f64 {
        self.base_speed
    }

    /// Set velocity for `intent` at `speed`.
    ///
    /// Returns the time until the paddle reaches the end of its track, or
    /// `f64::INFINITY` when it is not moving.
    pub fn steer(&mut self, intent: PaddleIntent, speed: f64) -> f64 {
        let direction = intent.direction();
        if direction == 0.0 || speed <= EPS {
            self.body.velocity = Vec2::ZERO;
            return f64::INFINITY;
        }

        let gap = (direction * self.bound(direction) - self.offset()) * direction;
        if gap <= EPS {
            self.body.velocity = Vec2::ZERO;
            return f64::INFINITY;
        }

        self.body.velocity = self.axis * (direction * speed);
        gap / speed
    }

    /// Stop a moving paddle that has reached its track end, snapping it
    /// exactly onto the bound.
    pub fn settle(&mut self) {
        let along = self.body.velocity.dot(self.axis);
        if along == 0.0 {
            return;
        }
        let target = along.signum() * self.bound(along);
        let offset = self.offset();
        if (target - offset) * along.signum() <= FAT_EPS {
            self.body.translate(self.axis * (target - offset));
            self.body.velocity = Vec2::ZERO;
        }
    }
}
