//! Error types for level generation and configuration loading

use thiserror::Error;

use crate::config::Paradigm;

/// Failures that propagate out of a generation call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("cavern stayed below its floor minimum after {tries} tries")]
    CavernTooSparse { tries: u32 },

    #[error("depth {depth} is too shallow for this paradigm (minimum {min_depth})")]
    TooShallow { depth: i32, min_depth: i32 },

    #[error("chunk of {height}x{width} is too small to generate into")]
    ChunkTooSmall { height: i32, width: i32 },

    #[error("no cave profile configured for paradigm {paradigm}")]
    NoProfile { paradigm: Paradigm },
}

/// Failures while loading or validating a `DungeonConfig`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not parse dungeon config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid dungeon config: {0}")]
    Invalid(String),
}
