//! Grid cells and their info flags

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::Feature;

bitflags! {
    /// Per-grid info flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct SquareFlags: u16 {
        /// Part of a room (floor or its walls)
        const ROOM = 0x0001;
        /// Part of a vault; never carved by the connectivity pass
        const VAULT = 0x0002;
        /// Lit
        const GLOW = 0x0004;
        /// Inward-facing wall of a room
        const WALL_INNER = 0x0008;
        /// Room boundary that tunnels may pierce
        const WALL_OUTER = 0x0010;
        /// Wall that must never be pierced
        const WALL_SOLID = 0x0020;
        /// Corridor hole reserved for possible stair placement
        const STAIRS = 0x0040;
        /// A trap is to be placed here
        const TRAP = 0x0080;
        /// Seen marker
        const MARK = 0x0100;

        const WALL_ANY = Self::WALL_INNER.bits() | Self::WALL_OUTER.bits() | Self::WALL_SOLID.bits();
    }
}

impl Serialize for SquareFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SquareFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u16::deserialize(deserializer)?;
        Ok(SquareFlags::from_bits_truncate(bits))
    }
}

/// A single grid of a chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Terrain feature
    pub feat: Feature,

    /// Info flags
    pub info: SquareFlags,
}

impl Cell {
    /// Plain granite with no flags
    pub const fn granite() -> Self {
        Self {
            feat: Feature::Granite,
            info: SquareFlags::empty(),
        }
    }

    pub fn has(&self, flag: SquareFlags) -> bool {
        self.info.contains(flag)
    }

    /// Granite carrying the given tunnelling helper flag
    pub fn is_granite_with(&self, flag: SquareFlags) -> bool {
        self.feat == Feature::Granite && self.info.contains(flag)
    }

    pub fn is_room(&self) -> bool {
        self.has(SquareFlags::ROOM)
    }

    pub fn is_vault(&self) -> bool {
        self.has(SquareFlags::VAULT)
    }

    /// Permanent wall that is not the inner wall of a room
    pub fn is_perm_outer(&self) -> bool {
        self.feat.is_permanent() && !self.has(SquareFlags::WALL_INNER)
    }

    /// Open floor with nothing placed on it
    pub fn is_empty(&self) -> bool {
        self.feat.is_floor() && !self.has(SquareFlags::TRAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granite_flags() {
        let mut cell = Cell::granite();
        assert!(!cell.is_granite_with(SquareFlags::WALL_OUTER));
        cell.info |= SquareFlags::WALL_OUTER;
        assert!(cell.is_granite_with(SquareFlags::WALL_OUTER));
        cell.feat = Feature::Floor;
        assert!(!cell.is_granite_with(SquareFlags::WALL_OUTER));
    }

    #[test]
    fn test_perm_outer() {
        let mut cell = Cell {
            feat: Feature::Permanent,
            info: SquareFlags::empty(),
        };
        assert!(cell.is_perm_outer());
        cell.info |= SquareFlags::WALL_INNER;
        assert!(!cell.is_perm_outer());
    }

    #[test]
    fn test_flags_roundtrip_through_bits() {
        let flags = SquareFlags::ROOM | SquareFlags::GLOW | SquareFlags::STAIRS;
        let json = serde_json::to_string(&flags).unwrap();
        let back: SquareFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(flags, back);
    }
}
