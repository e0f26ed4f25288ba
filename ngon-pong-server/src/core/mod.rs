//! Core deterministic primitives.
//!
//! Shared verbatim between the authoritative simulation and client-side
//! prediction, so both compute identical outcomes from identical inputs.

pub mod vec2;
pub mod solver;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::{Vec2, EPS, FAT_EPS, is_nearly};
pub use solver::{solve_quadratic, Roots};
pub use rng::DeterministicRng;
pub use hash::{StateHash, StateHasher, compute_state_hash};
