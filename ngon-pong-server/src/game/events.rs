//! Game Events
//!
//! Events generated during a tick, for broadcast and replay checks.

use serde::{Serialize, Deserialize};
use crate::core::vec2::Vec2;
use crate::game::body::{BallId, PlayerId};
use crate::game::powerup::PowerupKind;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Concedes first
    Score = 0,
    /// Then pickups
    PowerupCollection = 1,
    /// Then effect expiry
    PowerupExpiry = 2,
    /// Then new powerups
    PowerupSpawn = 3,
    /// Lowest priority
    Other = 255,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A ball reached a player's wall
    BallScored {
        /// Ball that reached the wall
        ball_id: BallId,
        /// Owner of the wall
        conceded_by: PlayerId,
    },

    /// A powerup appeared on the field
    PowerupSpawned {
        /// New powerup
        powerup_id: u32,
        /// Effect it grants
        kind: PowerupKind,
        /// Where it appeared
        position: Vec2,
    },

    /// A ball collected a powerup
    PowerupCollected {
        /// Collected powerup
        powerup_id: u32,
        /// Effect applied
        kind: PowerupKind,
        /// Collecting ball
        ball_id: BallId,
    },

    /// A timed effect ran out
    PowerupExpired {
        /// Effect that ended
        kind: PowerupKind,
    },

    /// The substep loop hit its bound and integrated the rest of the tick
    SubstepBudgetExceeded {
        /// Substeps run before giving up
        substeps: u32,
        /// Seconds integrated without collision checks
        unresolved_time: f64,
    },

    /// A player left; their wall became neutral
    PlayerRemoved {
        /// Player who left
        player_id: PlayerId,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u64,

    /// Processing priority
    pub priority: EventPriority,

    /// Player involved (for tie-breaking)
    pub player_id: Option<PlayerId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u64, priority: EventPriority, data: GameEventData) -> Self {
        let player_id = match &data {
            GameEventData::BallScored { conceded_by, .. } => Some(*conceded_by),
            GameEventData::PlayerRemoved { player_id } => Some(*player_id),
            _ => None,
        };

        Self {
            tick,
            priority,
            player_id,
            data,
        }
    }

    /// Create ball scored event.
    pub fn ball_scored(tick: u64, ball_id: BallId, conceded_by: PlayerId) -> Self {
        Self::new(
            tick,
            EventPriority::Score,
            GameEventData::BallScored { ball_id, conceded_by },
        )
    }

    /// Create powerup spawned event.
    pub fn powerup_spawned(tick: u64, powerup_id: u32, kind: PowerupKind, position: Vec2) -> Self {
        Self::new(
            tick,
            EventPriority::PowerupSpawn,
            GameEventData::PowerupSpawned { powerup_id, kind, position },
        )
    }

    /// Create powerup collected event.
    pub fn powerup_collected(tick: u64, powerup_id: u32, kind: PowerupKind, ball_id: BallId) -> Self {
        Self::new(
            tick,
            EventPriority::PowerupCollection,
            GameEventData::PowerupCollected { powerup_id, kind, ball_id },
        )
    }

    /// Create powerup expired event.
    pub fn powerup_expired(tick: u64, kind: PowerupKind) -> Self {
        Self::new(tick, EventPriority::PowerupExpiry, GameEventData::PowerupExpired { kind })
    }

    /// Create substep budget exceeded event.
    pub fn substep_budget_exceeded(tick: u64, substeps: u32, unresolved_time: f64) -> Self {
        Self::new(
            tick,
            EventPriority::Other,
            GameEventData::SubstepBudgetExceeded { substeps, unresolved_time },
        )
    }

    /// Create player removed event.
    pub fn player_removed(tick: u64, player_id: PlayerId) -> Self {
        Self::new(tick, EventPriority::Other, GameEventData::PlayerRemoved { player_id })
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.player_id == other.player_id
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then player_id
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.player_id.cmp(&other.player_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        let score_a = GameEvent::ball_scored(10, BallId(0), 1);
        let pickup = GameEvent::powerup_collected(10, 3, PowerupKind::SuperSpeed, BallId(0));
        let score_b = GameEvent::ball_scored(10, BallId(1), 2);
        let earlier = GameEvent::powerup_expired(9, PowerupKind::SuperSpeed);

        // Same tick, but score < collection
        assert!(score_a < pickup);

        // Same tick and priority, but player 1 < player 2
        assert!(score_a < score_b);

        assert!(earlier < score_a);
    }

    #[test]
    fn test_player_id_extracted() {
        assert_eq!(GameEvent::ball_scored(0, BallId(0), 4).player_id, Some(4));
        assert_eq!(GameEvent::player_removed(0, 6).player_id, Some(6));
        assert_eq!(GameEvent::powerup_expired(0, PowerupKind::SuperSpeed).player_id, None);
    }
}
