//! Dungeon system
//!
//! Contains the chunk model and every phase of level generation.

mod blocks;
mod cavern;
mod cell;
mod chunk;
mod connect;
mod doors;
mod feature;
mod generation;
mod labyrinth;
mod rooms;
mod streamer;
mod tunnel;

pub use blocks::{BlockGrid, BlockRect, RoomSite, allocate_rooms_classic, allocate_rooms_floor_target, roll_rarity};
pub use cavern::{CavernOutcome, cavern_chunk, count_adj_walls, init_cavern, mutate_cavern};
pub use cell::{Cell, SquareFlags};
pub use chunk::{Chunk, DDGRID_DDD, DIR_E, DIR_N, DIR_S, DIR_W, Loc, WorldPos};
pub use connect::{Regions, ensure_connectedness, is_fully_connected, join_regions};
pub use doors::{
    next_to_corr, place_closed_door, place_junction_doors, place_random_door, possible_doorway,
    possible_wide_doorway, try_door,
};
pub use feature::Feature;
pub use generation::{
    GeneratedLevel, LevelRequest, choose_paradigm, generate_level, labyrinth_check,
    remove_unused_holes,
};
pub use labyrinth::{Labyrinth, MazeStyle, lab_is_tunnel, lab_is_wide_tunnel, labyrinth_chunk};
pub use rooms::{CircularRoom, MoriaRoom, OverlapRoom, RoomBuilder, RoomRegistry, SimpleRoom};
pub use streamer::{add_river_streamers, build_streamer, find_nearby_grid};
pub use tunnel::{Piercing, TunnelCarver, TunnelOutcome, correct_dir, rand_dir};
