//! Generation profiles and limits
//!
//! Everything here is read-only during a generation call. Defaults reproduce
//! the traditional profile set; a JSON document can override any field.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::ConfigError;

/// Level layout paradigm
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Paradigm {
    /// Rooms in block slots joined by tunnels
    Classic,
    /// Rooms that find their own space until a floor-area target is met
    Modified,
    /// Randomized Kruskal maze
    Labyrinth,
    /// Cellular-automaton cave
    Cavern,
    /// Large ragged oval rooms placed until a floor-area target is met
    Moria,
}

/// Tunnel windiness and door odds, all in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelParams {
    /// Chance of a random direction when a bend happens
    pub rnd: i32,
    /// Chance per step of bending toward the target
    pub chg: i32,
    /// Chance per intersection of continuing instead of stopping early
    pub con: i32,
    /// Chance of a door in each wall piercing
    pub pen: i32,
    /// Chance of a door at each junction
    pub jct: i32,
}

impl Default for TunnelParams {
    fn default() -> Self {
        Self {
            rnd: 10,
            chg: 30,
            con: 15,
            pen: 25,
            jct: 50,
        }
    }
}

/// Mineral vein parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerParams {
    /// Grids converted per frontier step
    pub den: i32,
    /// Jitter radius around the frontier
    pub rng: i32,
    /// Number of magma streamers
    pub mag: i32,
    /// One in `mc` magma grids carries treasure
    pub mc: i32,
    /// Number of quartz streamers
    pub qua: i32,
    /// One in `qc` quartz grids carries treasure
    pub qc: i32,
}

impl Default for StreamerParams {
    fn default() -> Self {
        Self {
            den: 5,
            rng: 2,
            mag: 3,
            mc: 90,
            qua: 2,
            qc: 40,
        }
    }
}

impl StreamerParams {
    /// No veins at all
    pub const fn none() -> Self {
        Self {
            den: 5,
            rng: 2,
            mag: 0,
            mc: 90,
            qua: 0,
            qc: 40,
        }
    }
}

/// Which river-like streamers a dungeon allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverParams {
    pub lava: bool,
    pub water: bool,
    pub sand: bool,
}

/// Cellular-automaton cave parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CavernParams {
    /// Initial floor percentage, picked in `density_min..=density_max`
    pub density_min: i32,
    pub density_max: i32,
    /// Relaxation passes, picked in `passes_min..=passes_max`
    pub passes_min: i32,
    pub passes_max: i32,
    /// Reseeding attempts before giving up
    pub max_tries: u32,
    /// The cave needs at least `area / floor_divisor` floor grids
    pub floor_divisor: i32,
    /// Regions smaller than this are filled in
    pub min_region: u32,
}

impl Default for CavernParams {
    fn default() -> Self {
        Self {
            density_min: 25,
            density_max: 40,
            passes_min: 3,
            passes_max: 6,
            max_tries: 10,
            floor_divisor: 13,
            min_region: 9,
        }
    }
}

/// One entry of a room selection table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomProfile {
    pub name: String,
    /// Name the builder is registered under in the `RoomRegistry`
    pub builder: String,
    /// Footprint reserved in block-slot placement
    pub height: i32,
    pub width: i32,
    /// Shallowest depth this room appears at
    #[serde(default)]
    pub min_depth: i32,
    /// Rolled rarity must be at least this
    #[serde(default)]
    pub rarity: i32,
    /// Rolled key must be below this
    pub cutoff: i32,
}

impl RoomProfile {
    pub fn new(name: &str, builder: &str, height: i32, width: i32, rarity: i32, cutoff: i32) -> Self {
        Self {
            name: name.to_string(),
            builder: builder.to_string(),
            height,
            width,
            min_depth: 0,
            rarity,
            cutoff,
        }
    }
}

fn default_rooms() -> Vec<RoomProfile> {
    vec![
        RoomProfile::new("Circular room", "circular", 22, 22, 1, 30),
        RoomProfile::new("Overlapping rooms", "overlap", 11, 22, 0, 35),
        RoomProfile::new("Simple room", "simple", 11, 22, 0, 100),
    ]
}

fn moria_rooms() -> Vec<RoomProfile> {
    vec![
        RoomProfile::new("Moria room", "moria", 15, 41, 0, 80),
        RoomProfile::new("Overlapping rooms", "overlap", 11, 22, 0, 90),
        RoomProfile::new("Simple room", "simple", 11, 22, 0, 100),
    ]
}

/// Parameters of one generation paradigm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaveProfile {
    pub name: String,
    pub paradigm: Paradigm,
    /// Edge length of a placement block in grids
    #[serde(default = "CaveProfile::default_block_size")]
    pub block_size: i32,
    /// Nominal room target
    #[serde(default)]
    pub dun_rooms: i32,
    /// Higher values make unusual rooms rarer
    #[serde(default = "CaveProfile::default_unusual")]
    pub dun_unusual: i32,
    /// Cap on the rolled room rarity
    #[serde(default)]
    pub max_rarity: i32,
    /// Shallowest depth this paradigm is used at
    #[serde(default)]
    pub min_depth: i32,
    /// Weight in the classic/modified pick
    #[serde(default)]
    pub alloc: i32,
    #[serde(default)]
    pub tunnel: TunnelParams,
    #[serde(default = "StreamerParams::none")]
    pub streamer: StreamerParams,
    #[serde(default)]
    pub rivers: RiverParams,
    #[serde(default)]
    pub cavern: CavernParams,
    #[serde(default)]
    pub rooms: Vec<RoomProfile>,
}

impl CaveProfile {
    fn default_block_size() -> i32 {
        11
    }

    fn default_unusual() -> i32 {
        200
    }

    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            paradigm: Paradigm::Classic,
            block_size: 11,
            dun_rooms: 50,
            dun_unusual: 200,
            max_rarity: 2,
            min_depth: 0,
            alloc: 40,
            tunnel: TunnelParams::default(),
            streamer: StreamerParams::default(),
            rivers: RiverParams::default(),
            cavern: CavernParams::default(),
            rooms: default_rooms(),
        }
    }

    pub fn modified() -> Self {
        Self {
            name: "modified".to_string(),
            paradigm: Paradigm::Modified,
            block_size: 1,
            dun_rooms: 50,
            dun_unusual: 300,
            max_rarity: 2,
            min_depth: 0,
            alloc: 60,
            tunnel: TunnelParams::default(),
            streamer: StreamerParams::default(),
            rivers: RiverParams {
                lava: true,
                water: true,
                sand: false,
            },
            cavern: CavernParams::default(),
            rooms: default_rooms(),
        }
    }

    pub fn labyrinth() -> Self {
        Self {
            name: "labyrinth".to_string(),
            paradigm: Paradigm::Labyrinth,
            block_size: 1,
            dun_rooms: 0,
            dun_unusual: 200,
            max_rarity: 0,
            min_depth: 13,
            alloc: 0,
            tunnel: TunnelParams::default(),
            streamer: StreamerParams::none(),
            rivers: RiverParams::default(),
            cavern: CavernParams::default(),
            rooms: Vec::new(),
        }
    }

    /// Rolled on its own between depths 10 and 40, so `alloc` stays zero
    pub fn moria() -> Self {
        Self {
            name: "moria".to_string(),
            paradigm: Paradigm::Moria,
            block_size: 1,
            dun_rooms: 50,
            dun_unusual: 250,
            max_rarity: 2,
            min_depth: 10,
            alloc: 0,
            tunnel: TunnelParams::default(),
            streamer: StreamerParams::default(),
            rivers: RiverParams {
                lava: true,
                water: true,
                sand: true,
            },
            cavern: CavernParams::default(),
            rooms: moria_rooms(),
        }
    }

    pub fn cavern() -> Self {
        Self {
            name: "cavern".to_string(),
            paradigm: Paradigm::Cavern,
            block_size: 1,
            dun_rooms: 0,
            dun_unusual: 200,
            max_rarity: 0,
            min_depth: 15,
            alloc: 0,
            tunnel: TunnelParams::default(),
            streamer: StreamerParams::none(),
            rivers: RiverParams::default(),
            cavern: CavernParams::default(),
            rooms: Vec::new(),
        }
    }
}

/// Capacities and attempt caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Room centroids remembered per level
    pub room_max: usize,
    /// Door candidates remembered per level
    pub door_max: usize,
    /// Wall piercings remembered per tunnel
    pub wall_pierce_max: usize,
    /// Carved grids remembered per tunnel
    pub tunnel_grid_max: usize,
    /// Iterations before a tunnel gives up
    pub tunnel_step_max: u32,
    /// Tries per labyrinth door
    pub door_place_attempts: u32,
    /// Failed builds tolerated by the floor-target room allocator
    pub room_attempt_max: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            room_max: 100,
            door_max: 200,
            wall_pierce_max: 500,
            tunnel_grid_max: 900,
            tunnel_step_max: 2000,
            door_place_attempts: 10,
            room_attempt_max: 500,
        }
    }
}

/// Complete generation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// Nominal level height
    pub dungeon_hgt: i32,
    /// Nominal level width
    pub dungeon_wid: i32,
    /// Single-width tunnels and single doors
    pub turn_based: bool,
    pub limits: Limits,
    pub profiles: Vec<CaveProfile>,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            dungeon_hgt: 66,
            dungeon_wid: 198,
            turn_based: false,
            limits: Limits::default(),
            profiles: vec![
                CaveProfile::classic(),
                CaveProfile::modified(),
                CaveProfile::labyrinth(),
                CaveProfile::cavern(),
                CaveProfile::moria(),
            ],
        }
    }
}

impl DungeonConfig {
    /// Parse a JSON document and validate it
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: DungeonConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Profile used for a paradigm
    pub fn profile(&self, paradigm: Paradigm) -> Option<&CaveProfile> {
        self.profiles.iter().find(|p| p.paradigm == paradigm)
    }

    /// Reject values the generators cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dungeon_hgt < 22 || self.dungeon_wid < 22 {
            return Err(ConfigError::Invalid(format!(
                "dungeon size {}x{} is below 22x22",
                self.dungeon_hgt, self.dungeon_wid
            )));
        }
        if self.limits.tunnel_step_max == 0 {
            return Err(ConfigError::Invalid("tunnel_step_max must be positive".to_string()));
        }
        for profile in &self.profiles {
            let name = &profile.name;
            if profile.block_size < 1 {
                return Err(ConfigError::Invalid(format!("profile {name}: block_size must be at least 1")));
            }
            if profile.dun_unusual < 1 {
                return Err(ConfigError::Invalid(format!("profile {name}: dun_unusual must be positive")));
            }
            let t = &profile.tunnel;
            for (field, value) in [("rnd", t.rnd), ("chg", t.chg), ("con", t.con), ("pen", t.pen), ("jct", t.jct)] {
                if !(0..=100).contains(&value) {
                    return Err(ConfigError::Invalid(format!("profile {name}: tunnel.{field} must be a percentage")));
                }
            }
            let c = &profile.cavern;
            if c.density_min > c.density_max || c.density_min < 1 || c.density_max > 100 {
                return Err(ConfigError::Invalid(format!("profile {name}: cavern density range is invalid")));
            }
            if c.passes_min > c.passes_max || c.floor_divisor < 1 {
                return Err(ConfigError::Invalid(format!("profile {name}: cavern passes or floor divisor invalid")));
            }
            for room in &profile.rooms {
                if room.builder.is_empty() || room.height < 1 || room.width < 1 {
                    return Err(ConfigError::Invalid(format!(
                        "profile {name}: room '{}' needs a builder and a positive footprint",
                        room.name
                    )));
                }
            }
        }
        Ok(())
    }
}
