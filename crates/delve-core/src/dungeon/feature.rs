//! Terrain features

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter};

/// Terrain feature of a single grid
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
)]
#[repr(u8)]
pub enum Feature {
    Floor = 0,
    ClosedDoor = 1,
    LockedDoor = 2,
    OpenDoor = 3,
    BrokenDoor = 4,
    SecretDoor = 5,
    #[default]
    Granite = 6,
    Permanent = 7,
    Magma = 8,
    Quartz = 9,
    MagmaTreasure = 10, // magma with a treasure seam
    QuartzTreasure = 11, // quartz with a treasure seam
    Lava = 12,
    Water = 13,
    Sandwall = 14,
}

impl Feature {
    /// Index into per-feature counters
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_floor(self) -> bool {
        matches!(self, Feature::Floor)
    }

    /// Any kind of door, including secret ones
    pub const fn is_door(self) -> bool {
        matches!(
            self,
            Feature::ClosedDoor
                | Feature::LockedDoor
                | Feature::OpenDoor
                | Feature::BrokenDoor
                | Feature::SecretDoor
        )
    }

    /// Diggable rock: granite, mineral veins and sand
    pub const fn is_rock(self) -> bool {
        matches!(
            self,
            Feature::Granite
                | Feature::Magma
                | Feature::Quartz
                | Feature::MagmaTreasure
                | Feature::QuartzTreasure
                | Feature::Sandwall
        )
    }

    pub const fn is_permanent(self) -> bool {
        matches!(self, Feature::Permanent)
    }

    /// Rock or permanent wall
    pub const fn is_wall(self) -> bool {
        self.is_rock() || self.is_permanent()
    }

    /// A wall that doorways can be framed by
    pub const fn is_strong_wall(self) -> bool {
        self.is_wall()
    }

    /// Walkable once any door is dealt with
    ///
    /// Lava and water are hazards, not corridors, and do not count.
    pub const fn is_passable(self) -> bool {
        self.is_floor() || self.is_door()
    }

    /// Mineral vein variant carrying treasure, if this feature has one
    pub const fn with_treasure(self) -> Option<Feature> {
        match self {
            Feature::Magma => Some(Feature::MagmaTreasure),
            Feature::Quartz => Some(Feature::QuartzTreasure),
            _ => None,
        }
    }

    /// Display character for ASCII dumps
    pub const fn symbol(self) -> char {
        match self {
            Feature::Floor => '.',
            Feature::ClosedDoor | Feature::LockedDoor => '+',
            Feature::OpenDoor => '\'',
            Feature::BrokenDoor => '\'',
            Feature::SecretDoor => '#',
            Feature::Granite => '#',
            Feature::Permanent => '%',
            Feature::Magma | Feature::Quartz => ':',
            Feature::MagmaTreasure | Feature::QuartzTreasure => '*',
            Feature::Lava => '~',
            Feature::Water => '=',
            Feature::Sandwall => ';',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_indices_are_dense() {
        for (i, feat) in Feature::iter().enumerate() {
            assert_eq!(feat.index(), i);
        }
        assert_eq!(Feature::iter().count(), Feature::COUNT);
    }

    #[test]
    fn test_classification() {
        assert!(Feature::Granite.is_rock());
        assert!(Feature::QuartzTreasure.is_rock());
        assert!(!Feature::Permanent.is_rock());
        assert!(Feature::Permanent.is_strong_wall());
        assert!(Feature::LockedDoor.is_passable());
        assert!(!Feature::Lava.is_passable());
        assert!(!Feature::Lava.is_wall());
    }

    #[test]
    fn test_treasure_upgrade() {
        assert_eq!(Feature::Magma.with_treasure(), Some(Feature::MagmaTreasure));
        assert_eq!(Feature::Quartz.with_treasure(), Some(Feature::QuartzTreasure));
        assert_eq!(Feature::Lava.with_treasure(), None);
    }
}
