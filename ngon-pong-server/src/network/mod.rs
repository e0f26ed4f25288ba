//! Network Layer
//!
//! WebSocket server for real-time multiplayer communication.
//! This layer is **non-deterministic** - all game logic runs through `game/`.

pub mod protocol;
pub mod registry;
pub mod driver;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, PaddleInput, ProtocolError};
pub use registry::{SessionId, SessionRegistry, SharedSession, RegistryError};
pub use driver::{run_session_loop, Outbound};
pub use server::{GameServer, ServerConfig, GameServerError};
