//! delve-core: procedural dungeon level generation
//!
//! This crate carves the spatial layout of a level: rooms joined by
//! tunnels, labyrinths, and cellular caves, followed by a connectivity pass
//! and mineral veins. It performs no I/O and draws all randomness from a
//! caller-owned [`GameRng`], so a seed fully determines a level.

pub mod config;
pub mod dungeon;
mod error;
mod rng;

pub use config::{DungeonConfig, Paradigm};
pub use dungeon::{Chunk, Feature, GeneratedLevel, LevelRequest, Loc, RoomRegistry, generate_level};
pub use error::{ConfigError, GenError};
pub use rng::GameRng;
