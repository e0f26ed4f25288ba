//! Game Logic Module
//!
//! All simulation code. Deterministic given a seed, intents and tick lengths.
//!
//! ## Module Structure
//!
//! - `body`: Balls, segments and their ids
//! - `response`: Collision response table keyed by body kind
//! - `collision`: Time-of-impact and impulse resolution
//! - `substep`: Continuous collision loop over one step
//! - `arena`: N-gon walls and paddle tracks
//! - `paddle`: Paddle movement and intents
//! - `powerup`: Powerup spawning and effects
//! - `config`: Session options and validation
//! - `session`: The authoritative match
//! - `snapshot`: Fixed-order board tuples
//! - `events`: Game events for broadcast/verification

pub mod body;
pub mod response;
pub mod collision;
pub mod substep;
pub mod arena;
pub mod paddle;
pub mod powerup;
pub mod config;
pub mod session;
pub mod snapshot;
pub mod events;

// Re-export key types
pub use body::{Ball, BallId, BodyKind, PlayerId, Segment, SegmentKind};
pub use response::CollisionResponse;
pub use config::{ConfigError, GameConfig};
pub use paddle::PaddleIntent;
pub use powerup::PowerupKind;
pub use session::{GameSession, TickReport};
pub use snapshot::BoardSnapshot;
pub use events::{GameEvent, GameEventData};
