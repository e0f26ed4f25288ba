//! Collision Response Table
//!
//! Policy is a pure function of the two body kinds, so a given state always
//! resolves the same way on server and client.

use serde::{Serialize, Deserialize};
use crate::game::body::BodyKind;

/// How a collision between two bodies is handled.
///
/// Ordered by precedence: when the two bodies disagree, the higher wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CollisionResponse {
    /// No physical interaction.
    PassThrough,
    /// Impulse-based bounce.
    Bounce,
    /// Ball conceded against a player's wall; the ball is reset.
    Score,
    /// The non-ball body is consumed (powerup pickup).
    Destroy,
}

/// Policy `kind` applies when touched by `other`. `None` means no policy.
pub const fn policy(kind: BodyKind, other: BodyKind) -> Option<CollisionResponse> {
    use BodyKind::*;
    match (kind, other) {
        (Ball, Ball | Wall | PlayerWall | Paddle) => Some(CollisionResponse::Bounce),
        (Wall | Paddle, Ball) => Some(CollisionResponse::Bounce),
        (PlayerWall, Ball) => Some(CollisionResponse::Score),
        (Powerup, Ball) => Some(CollisionResponse::Destroy),
        _ => None,
    }
}

/// Combined response for a pair. A body without a policy acts as
/// [`CollisionResponse::PassThrough`].
pub const fn resolve_response(a: BodyKind, b: BodyKind) -> CollisionResponse {
    let ra = match policy(a, b) {
        Some(r) => r,
        None => CollisionResponse::PassThrough,
    };
    let rb = match policy(b, a) {
        Some(r) => r,
        None => CollisionResponse::PassThrough,
    };
    if (rb as u8) > (ra as u8) { rb } else { ra }
}

/// Whether the pair needs time-of-impact solving at all.
#[inline]
pub const fn interacts(a: BodyKind, b: BodyKind) -> bool {
    !matches!(resolve_response(a, b), CollisionResponse::PassThrough)
}
