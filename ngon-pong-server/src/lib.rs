//! # N-gon Pong Server
//!
//! Authoritative continuous-collision simulation for 2 to 8 player Pong on a
//! regular polygon arena.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    NGON PONG SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── vec2.rs     - f64 2D vector, EPS / FAT_EPS              │
//! │  ├── solver.rs   - Closed-form quadratic roots               │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Simulation (deterministic)                │
//! │  ├── body.rs     - Balls and segments                        │
//! │  ├── collision.rs- Time of impact and resolution             │
//! │  ├── substep.rs  - Continuous collision loop                 │
//! │  ├── arena.rs    - N-gon walls and paddle tracks             │
//! │  ├── powerup.rs  - Powerups and timed effects                │
//! │  └── session.rs  - The authoritative match                   │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── registry.rs - Session ownership                         │
//! │  ├── driver.rs   - Fixed-rate tick loop                      │
//! │  ├── server.rs   - WebSocket server                          │
//! │  └── protocol.rs - Message types                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from a per-session seeded Xorshift128+
//! - Collision ties broken by a fixed pair enumeration order
//!
//! Given the same seed, intents and tick lengths, a client-side predictor
//! running this crate produces the same board as the server.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::vec2::{Vec2, EPS, FAT_EPS};
pub use core::solver::solve_quadratic;
pub use core::rng::DeterministicRng;
pub use game::config::{ConfigError, GameConfig};
pub use game::session::{GameSession, TickReport};
pub use game::snapshot::BoardSnapshot;
pub use game::body::PlayerId;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
