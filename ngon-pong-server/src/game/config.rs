//! Game Configuration
//!
//! The creation record for a session. Field names are camelCase on the wire
//! so lobby options (`canvasWidth`, `ballSpeed`, ...) deserialize directly.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::body::PlayerId;

/// Minimum players in a session.
pub const MIN_PLAYERS: usize = 2;

/// Maximum players in a session.
pub const MAX_PLAYERS: usize = 8;

/// Session creation options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Arena width
    pub canvas_width: f64,
    /// Arena height
    pub canvas_height: f64,
    /// Ball speed on spawn and after every reset (units per second)
    pub ball_speed: f64,
    /// Paddle speed as a fraction of its wall length per second
    pub paddle_speed_factor: f64,
    /// Paddle length as a fraction of its wall length
    pub paddle_width_factor: f64,
    /// Paddle thickness
    pub paddle_height: f64,
    /// Distance from a player's wall to its paddle track
    pub paddle_wall_offset: f64,
    /// Number of balls, fixed for the session's lifetime
    #[serde(alias = "amountOfBalls")]
    pub ball_count: u32,
    /// Mean seconds between powerup spawns (0 disables powerups)
    pub powerup_frequency: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1000.0,
            canvas_height: 1000.0,
            ball_speed: 450.0,
            paddle_speed_factor: 1.5,
            paddle_width_factor: 0.3,
            paddle_height: 15.0,
            paddle_wall_offset: 50.0,
            ball_count: 1,
            powerup_frequency: 10.0,
        }
    }
}

/// Reasons a session cannot be created.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Player count outside 2..=8.
    #[error("invalid player count {0} (expected 2..=8)")]
    InvalidPlayerCount(usize),

    /// The same player id appears twice.
    #[error("player {0} listed more than once")]
    DuplicatePlayer(PlayerId),

    /// Arena width or height is not a positive finite number.
    #[error("arena dimensions must be positive, got {width}x{height}")]
    NonPositiveDimensions {
        /// Requested width
        width: f64,
        /// Requested height
        height: f64,
    },

    /// Ball speed is negative or not finite.
    #[error("invalid ball speed {0}")]
    InvalidBallSpeed(f64),

    /// No balls requested.
    #[error("ball count must be at least 1")]
    InvalidBallCount,

    /// Paddle options cannot produce a paddle inside the arena.
    #[error("invalid paddle configuration: {0}")]
    InvalidPaddle(&'static str),

    /// Powerup frequency is negative or not finite.
    #[error("invalid powerup frequency {0}")]
    InvalidPowerupFrequency(f64),
}

impl GameConfig {
    /// Check the options against a player list.
    ///
    /// Geometry-dependent paddle checks happen when the arena is built.
    pub fn validate(&self, players: &[PlayerId]) -> Result<(), ConfigError> {
        if players.len() < MIN_PLAYERS || players.len() > MAX_PLAYERS {
            return Err(ConfigError::InvalidPlayerCount(players.len()));
        }
        for (i, id) in players.iter().enumerate() {
            if players[..i].contains(id) {
                return Err(ConfigError::DuplicatePlayer(*id));
            }
        }

        let dimension_ok = |v: f64| v.is_finite() && v > 0.0;
        if !dimension_ok(self.canvas_width) || !dimension_ok(self.canvas_height) {
            return Err(ConfigError::NonPositiveDimensions {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }

        if !self.ball_speed.is_finite() || self.ball_speed < 0.0 {
            return Err(ConfigError::InvalidBallSpeed(self.ball_speed));
        }
        if self.ball_count == 0 {
            return Err(ConfigError::InvalidBallCount);
        }

        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !non_negative(self.paddle_speed_factor) {
            return Err(ConfigError::InvalidPaddle("speed factor must be non-negative"));
        }
        if !(self.paddle_width_factor.is_finite()
            && self.paddle_width_factor > 0.0
            && self.paddle_width_factor <= 1.0)
        {
            return Err(ConfigError::InvalidPaddle("width factor must be in (0, 1]"));
        }
        if !non_negative(self.paddle_height) {
            return Err(ConfigError::InvalidPaddle("height must be non-negative"));
        }
        if !non_negative(self.paddle_wall_offset) {
            return Err(ConfigError::InvalidPaddle("wall offset must be non-negative"));
        }

        if !non_negative(self.powerup_frequency) {
            return Err(ConfigError::InvalidPowerupFrequency(self.powerup_frequency));
        }

        Ok(())
    }

    /// Whether powerups spawn at all.
    #[inline]
    pub fn powerups_enabled(&self) -> bool {
        self.powerup_frequency > 0.0
    }
}
