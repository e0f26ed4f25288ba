//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Control messages are JSON text frames. Paddle input may also arrive as a
//! compact binary (bincode) frame.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::game::body::{BallId, PlayerId};
use crate::game::config::GameConfig;
use crate::game::paddle::PaddleIntent;
use crate::game::snapshot::BoardSnapshot;
use crate::network::registry::SessionId;

/// Protocol decode/encode failures.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Malformed JSON frame.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed binary frame.
    #[error("Binary error: {0}")]
    Bincode(#[from] bincode::Error),
}

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Bind this connection to a player id. Identity is trusted.
    Hello {
        /// Player behind this connection
        player_id: PlayerId,
    },

    /// Create a session for the listed players.
    StartGame {
        /// Seat order of the new session
        players: Vec<PlayerId>,
        /// Overrides for the server's default options
        #[serde(default)]
        options: Option<GameConfig>,
    },

    /// Set the sender's paddle intent.
    MovePaddle {
        /// Target session
        game_id: SessionId,
        /// New intent
        intent: PaddleIntent,
    },

    /// Stop and discard a session.
    EndGame {
        /// Target session
        game_id: SessionId,
    },

    /// Ping for latency measurement.
    Ping {
        /// Client timestamp, echoed back
        timestamp: u64,
    },
}

/// Binary paddle input frame.
///
/// Tagged enums do not survive bincode, so the binary path carries only
/// this flat struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddleInput {
    /// Target session
    pub game_id: SessionId,
    /// New intent
    pub intent: PaddleIntent,
}

impl PaddleInput {
    /// Equivalent control message.
    pub fn to_message(self) -> ClientMessage {
        ClientMessage::MovePaddle {
            game_id: self.game_id,
            intent: self.intent,
        }
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Hello accepted.
    Welcome {
        /// Bound player id
        player_id: PlayerId,
        /// Server version
        server_version: String,
    },

    /// A session was created and is running.
    GameCreated {
        /// New session id
        game_id: SessionId,
        /// Seat order
        players: Vec<PlayerId>,
        /// Seed for client-side prediction
        seed: u64,
    },

    /// Board state after one tick.
    Board {
        /// Session id
        game_id: SessionId,
        /// Ticks simulated so far
        tick: u64,
        /// Hex-encoded state hash
        state_hash: String,
        /// Fixed-order board tuples
        board: BoardSnapshot,
    },

    /// A ball reached a player's wall.
    Scored {
        /// Session id
        game_id: SessionId,
        /// Ball that scored
        ball_id: BallId,
        /// Player whose wall was hit
        conceded_by: PlayerId,
    },

    /// Session stopped.
    GameEnded {
        /// Session id
        game_id: SessionId,
        /// Final points per player
        score: BTreeMap<PlayerId, u32>,
    },

    /// Pong response.
    Pong {
        /// Echoed client timestamp
        timestamp: u64,
        /// Server wall clock (ms)
        server_time: u64,
    },

    /// Error message.
    Error(ServerError),
}

/// Server error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ServerError {
    /// Build an error message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No Hello on this connection yet.
    NotIntroduced,
    /// Invalid input.
    InvalidInput,
    /// Session options rejected.
    InvalidConfig,
    /// Session not found.
    GameNotFound,
    /// Sender has no paddle in this session.
    NotInGame,
    /// Internal error.
    InternalError,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Decode a WebSocket frame: text is JSON, binary is a [`PaddleInput`].
    pub fn decode_frame(text: Option<&str>, data: &[u8]) -> Result<Self, ProtocolError> {
        match text {
            Some(s) => Ok(Self::from_json(s)?),
            None => {
                let input: PaddleInput = bincode::deserialize(data)?;
                Ok(input.to_message())
            }
        }
    }
}

impl PaddleInput {
    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Shorthand for an error message.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ServerError::new(code, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::session::GameSession;

    #[test]
    fn test_client_message_json() {
        let msg = ClientMessage::from_json(r#"{"type":"hello","player_id":7}"#).unwrap();
        assert_eq!(msg, ClientMessage::Hello { player_id: 7 });

        let msg = ClientMessage::from_json(
            r#"{"type":"move_paddle","game_id":3,"intent":"clockwise"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::MovePaddle { game_id: 3, intent: PaddleIntent::Clockwise }
        );
    }

    #[test]
    fn test_start_game_options() {
        let msg = ClientMessage::from_json(r#"{"type":"start_game","players":[1,2]}"#).unwrap();
        assert_eq!(msg, ClientMessage::StartGame { players: vec![1, 2], options: None });

        let msg = ClientMessage::from_json(
            r#"{"type":"start_game","players":[1,2,3],"options":{"ballSpeed":300.0,"amountOfBalls":2}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::StartGame { players, options: Some(options) } => {
                assert_eq!(players, vec![1, 2, 3]);
                assert_eq!(options.ball_speed, 300.0);
                assert_eq!(options.ball_count, 2);
                assert_eq!(options.canvas_width, GameConfig::default().canvas_width);
            }
            other => panic!("Wrong message: {:?}", other),
        }
    }

    #[test]
    fn test_ping_roundtrip() {
        let msg = ClientMessage::Ping { timestamp: 42 };
        let json = msg.to_json().unwrap();
        assert_eq!(ClientMessage::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_binary_paddle_input() {
        let input = PaddleInput { game_id: 9, intent: PaddleIntent::CounterClockwise };
        let bytes = input.to_bytes().unwrap();

        let msg = ClientMessage::decode_frame(None, &bytes).unwrap();
        assert_eq!(
            msg,
            ClientMessage::MovePaddle { game_id: 9, intent: PaddleIntent::CounterClockwise }
        );
    }

    #[test]
    fn test_decode_frame_errors() {
        assert!(matches!(
            ClientMessage::decode_frame(Some("{not json"), &[]),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            ClientMessage::decode_frame(None, &[1]),
            Err(ProtocolError::Bincode(_))
        ));
    }

    #[test]
    fn test_board_message_carries_tuples() {
        let session = GameSession::with_seed(1, &[1, 2], GameConfig::default(), 5).unwrap();
        let msg = ServerMessage::Board {
            game_id: 1,
            tick: session.tick(),
            state_hash: hex::encode(session.state_hash()),
            board: session.fetch_board_json(),
        };

        let json = msg.to_json().unwrap();
        assert!(json.starts_with(r#"{"type":"board""#));
        assert!(json.contains(r#""walls":[["#));
        assert!(json.contains(r#""players":[1,2]"#));
    }

    #[test]
    fn test_error_codes() {
        let msg = ServerMessage::error(ErrorCode::GameNotFound, "no such game");
        let json = msg.to_json().unwrap();
        assert!(json.contains("game_not_found"));

        match ServerMessage::from_json(&json).unwrap() {
            ServerMessage::Error(err) => assert_eq!(err.code, ErrorCode::GameNotFound),
            other => panic!("Wrong message: {:?}", other),
        }
    }
}
