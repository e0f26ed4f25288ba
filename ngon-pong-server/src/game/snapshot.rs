//! Board Snapshot
//!
//! The per-tick board state handed to the broadcast layer. Bodies are
//! fixed-order tuples, which serialize as JSON arrays:
//!
//! - ball: `[x, y, vx, vy, radius, inverseMass]`
//! - segment: `[ax, ay, bx, by, vx, vy, playerId | null]`
//! - powerup: `[x, y, radius, kind]`
//! - effect: `[kind, secondsRemaining]`

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::game::body::{Ball, PlayerId, Segment};
use crate::game::powerup::{ActiveEffect, Powerup, PowerupKind};

/// `[x, y, vx, vy, radius, inverseMass]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallTuple(pub f64, pub f64, pub f64, pub f64, pub f64, pub f64);

impl From<&Ball> for BallTuple {
    fn from(ball: &Ball) -> Self {
        BallTuple(
            ball.center.x,
            ball.center.y,
            ball.velocity.x,
            ball.velocity.y,
            ball.radius,
            ball.inverse_mass,
        )
    }
}

/// `[ax, ay, bx, by, vx, vy, playerId | null]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentTuple(
    pub f64,
    pub f64,
    pub f64,
    pub f64,
    pub f64,
    pub f64,
    pub Option<PlayerId>,
);

impl From<&Segment> for SegmentTuple {
    fn from(seg: &Segment) -> Self {
        SegmentTuple(
            seg.a.x,
            seg.a.y,
            seg.b.x,
            seg.b.y,
            seg.velocity.x,
            seg.velocity.y,
            seg.owner(),
        )
    }
}

/// `[x, y, radius, kind]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerupTuple(pub f64, pub f64, pub f64, pub PowerupKind);

impl From<&Powerup> for PowerupTuple {
    fn from(p: &Powerup) -> Self {
        PowerupTuple(p.center.x, p.center.y, p.radius, p.kind)
    }
}

/// `[kind, secondsRemaining]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectTuple(pub PowerupKind, pub f64);

impl EffectTuple {
    /// Tuple for `effect` as seen at elapsed time `now`.
    pub fn at(effect: &ActiveEffect, now: f64) -> Self {
        EffectTuple(effect.kind, (effect.expires_at - now).max(0.0))
    }
}

/// Static session facts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardMetadata {
    /// Players in seat order
    pub players: Vec<PlayerId>,
}

/// Full board state for one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Static session facts
    pub metadata: BoardMetadata,
    /// Boundary walls in edge order
    pub walls: Vec<SegmentTuple>,
    /// Paddles in seat order
    pub paddles: Vec<SegmentTuple>,
    /// Balls in spawn order
    pub balls: Vec<BallTuple>,
    /// Powerups on the field
    pub powerups: Vec<PowerupTuple>,
    /// Running timed effects
    pub effects: Vec<EffectTuple>,
    /// Points per player
    pub score: BTreeMap<PlayerId, u32>,
}

impl BoardSnapshot {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Points per player: each player earns the concedes of every opponent.
pub fn score_map(
    players: &[PlayerId],
    concedes: &BTreeMap<PlayerId, u32>,
) -> BTreeMap<PlayerId, u32> {
    let total: u32 = players
        .iter()
        .map(|p| concedes.get(p).copied().unwrap_or(0))
        .sum();
    players
        .iter()
        .map(|p| {
            let own = concedes.get(p).copied().unwrap_or(0);
            (*p, total - own)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::body::BallId;

    #[test]
    fn test_ball_tuple_layout() {
        let mut ball = Ball::new(BallId(3), Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0), 5.0);
        ball.inverse_mass = 0.5;
        let json = serde_json::to_string(&BallTuple::from(&ball)).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0,5.0,0.5]");
    }

    #[test]
    fn test_segment_tuple_layout() {
        let wall = Segment::wall(Vec2::new(0.0, 1.0), Vec2::new(2.0, 3.0));
        let json = serde_json::to_string(&SegmentTuple::from(&wall)).unwrap();
        assert_eq!(json, "[0.0,1.0,2.0,3.0,0.0,0.0,null]");

        let mut paddle = Segment::paddle(Vec2::new(0.0, 1.0), Vec2::new(2.0, 3.0), 1.0, 7);
        paddle.velocity = Vec2::new(-1.0, 0.5);
        let json = serde_json::to_string(&SegmentTuple::from(&paddle)).unwrap();
        assert_eq!(json, "[0.0,1.0,2.0,3.0,-1.0,0.5,7]");
    }

    #[test]
    fn test_score_map_credits_opponents() {
        let players = [1, 2, 3];
        let mut concedes = BTreeMap::new();
        concedes.insert(1, 2);
        concedes.insert(3, 1);

        let score = score_map(&players, &concedes);
        assert_eq!(score[&1], 1);
        assert_eq!(score[&2], 3);
        assert_eq!(score[&3], 2);
    }

    #[test]
    fn test_effect_tuple_remaining() {
        let effect = ActiveEffect { kind: PowerupKind::SuperSpeed, expires_at: 12.0 };
        assert_eq!(EffectTuple::at(&effect, 10.5), EffectTuple(PowerupKind::SuperSpeed, 1.5));
        assert_eq!(EffectTuple::at(&effect, 20.0).1, 0.0);
    }
}
