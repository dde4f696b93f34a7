//! Level generation entry point
//!
//! Picks a paradigm, lays out the level with it, then runs the shared
//! finishing sequence: connectivity, mineral veins, and a sealed boundary.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{CaveProfile, DungeonConfig, Paradigm};
use crate::error::GenError;
use crate::rng::GameRng;

use super::{
    Chunk, DDGRID_DDD, Feature, Loc, MazeStyle, RoomRegistry, SquareFlags, TunnelCarver, add_river_streamers,
    allocate_rooms_classic, allocate_rooms_floor_target, build_streamer, cavern_chunk, ensure_connectedness,
    labyrinth_chunk, place_junction_doors,
};

/// Shallowest depth a labyrinth is rolled for
const LABYRINTH_MIN_DEPTH: i32 = 13;

/// Smallest maze area edge
const MAZE_MIN_SIZE: i32 = 3;

/// Moria levels are rolled above this depth only
const MORIA_MAX_DEPTH: i32 = 40;

/// What the caller wants generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelRequest {
    pub depth: i32,
    /// Smallest acceptable chunk height
    pub min_height: i32,
    /// Smallest acceptable chunk width
    pub min_width: i32,
    /// Quest levels are always full size and never labyrinths
    pub quest: bool,
    /// Force a paradigm instead of rolling one
    pub paradigm: Option<Paradigm>,
}

impl LevelRequest {
    pub fn new(depth: i32) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    pub fn with_paradigm(mut self, paradigm: Paradigm) -> Self {
        self.paradigm = Some(paradigm);
        self
    }
}

/// A finished level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedLevel {
    pub chunk: Chunk,
    /// Room centres, for stair and monster placement
    pub centres: Vec<Loc>,
    pub paradigm: Paradigm,
    /// Seed of the generator it was built with; a fresh `GameRng` on this
    /// seed and the same request rebuilds it
    pub seed: u64,
}

/// Roll whether a level is a labyrinth
///
/// Never on quest levels or above depth 13. The base 2% chance gains a
/// point for each of 3, 5, 7, 11 and 13 that divides the depth.
pub fn labyrinth_check(rng: &mut GameRng, depth: i32, quest: bool) -> bool {
    if quest || depth < LABYRINTH_MIN_DEPTH {
        return false;
    }
    let chance = 2 + [3, 5, 7, 11, 13].iter().filter(|&&d| depth % d == 0).count() as i32;
    rng.randint0(100) < chance
}

/// Paradigm for a request
///
/// A forced paradigm wins. Otherwise labyrinth, then cavern (1 in 10 once
/// deep enough), then moria (1 in 40 from its minimum depth to 40), then a
/// pick between classic and modified weighted by their `alloc`.
pub fn choose_paradigm(config: &DungeonConfig, request: &LevelRequest, rng: &mut GameRng) -> Paradigm {
    if let Some(paradigm) = request.paradigm {
        return paradigm;
    }

    if config.profile(Paradigm::Labyrinth).is_some() && labyrinth_check(rng, request.depth, request.quest) {
        return Paradigm::Labyrinth;
    }

    if let Some(cavern) = config.profile(Paradigm::Cavern)
        && request.depth >= cavern.min_depth
        && !request.quest
        && rng.one_in(10)
    {
        return Paradigm::Cavern;
    }

    if let Some(moria) = config.profile(Paradigm::Moria)
        && (moria.min_depth..MORIA_MAX_DEPTH).contains(&request.depth)
        && rng.one_in(40)
    {
        return Paradigm::Moria;
    }

    let weights: Vec<(Paradigm, i32)> = [Paradigm::Classic, Paradigm::Modified]
        .into_iter()
        .filter_map(|p| config.profile(p).map(|profile| (p, profile.alloc.max(0))))
        .collect();
    let total: i32 = weights.iter().map(|&(_, alloc)| alloc).sum();
    if total == 0 {
        return weights.first().map_or(Paradigm::Classic, |&(p, _)| p);
    }

    let mut roll = rng.randint0(total);
    for (paradigm, alloc) in weights {
        if roll < alloc {
            return paradigm;
        }
        roll -= alloc;
    }
    Paradigm::Classic
}

/// Generate one level
///
/// Only a cavern can fail. A rolled cavern that fails falls back to
/// classic; a forced one reports its error.
pub fn generate_level(
    config: &DungeonConfig,
    registry: &RoomRegistry,
    request: &LevelRequest,
    rng: &mut GameRng,
) -> Result<GeneratedLevel, GenError> {
    if config.dungeon_hgt < MAZE_MIN_SIZE || config.dungeon_wid < MAZE_MIN_SIZE {
        return Err(GenError::ChunkTooSmall {
            height: config.dungeon_hgt,
            width: config.dungeon_wid,
        });
    }

    let paradigm = choose_paradigm(config, request, rng);
    debug!(%paradigm, depth = request.depth, seed = rng.seed(), "generating level");

    let level = match build_paradigm(config, registry, request, rng, paradigm) {
        Err(err @ (GenError::CavernTooSparse { .. } | GenError::TooShallow { .. }))
            if request.paradigm.is_none() =>
        {
            warn!(%err, "cavern failed, falling back to classic");
            build_paradigm(config, registry, request, rng, Paradigm::Classic)?
        }
        result => result?,
    };

    debug!(
        paradigm = %level.paradigm,
        height = level.chunk.height(),
        width = level.chunk.width(),
        rooms = level.centres.len(),
        floors = level.chunk.feat_count(Feature::Floor),
        "level generated"
    );
    Ok(level)
}

fn build_paradigm(
    config: &DungeonConfig,
    registry: &RoomRegistry,
    request: &LevelRequest,
    rng: &mut GameRng,
    paradigm: Paradigm,
) -> Result<GeneratedLevel, GenError> {
    let profile = config.profile(paradigm).ok_or(GenError::NoProfile { paradigm })?;

    let (mut chunk, centres) = match paradigm {
        Paradigm::Classic => classic_gen(config, registry, profile, request, rng),
        Paradigm::Modified => floor_target_gen(config, registry, profile, request, rng, 2),
        Paradigm::Moria => floor_target_gen(config, registry, profile, request, rng, 0),
        Paradigm::Labyrinth => (labyrinth_gen(config, request, rng)?, Vec::new()),
        Paradigm::Cavern => (cavern_gen(config, profile, request, rng)?, Vec::new()),
    };

    finish_level(&mut chunk, rng, profile);
    Ok(GeneratedLevel {
        chunk,
        centres,
        paradigm,
        seed: rng.seed(),
    })
}

/// Connectivity, veins, then the permanent ring
fn finish_level(chunk: &mut Chunk, rng: &mut GameRng, profile: &CaveProfile) {
    ensure_connectedness(chunk);

    let streamer = &profile.streamer;
    for _ in 0..streamer.mag {
        build_streamer(chunk, rng, Feature::Magma, streamer, streamer.mc);
    }
    for _ in 0..streamer.qua {
        build_streamer(chunk, rng, Feature::Quartz, streamer, streamer.qc);
    }
    add_river_streamers(chunk, rng, &profile.rivers, streamer);

    chunk.seal_boundary();
}

/// Depth-biased level scale in percent
///
/// Quest levels are always full size.
fn size_percent(rng: &mut GameRng, depth: i32, quest: bool) -> i32 {
    if quest {
        return 100;
    }
    match rng.randint1(10) + depth / 24 {
        i if i < 2 => 75,
        2 => 80,
        3 => 85,
        4 => 90,
        5 => 95,
        _ => 100,
    }
}

/// Swap random pairs of room centres, as many times as there are rooms
fn scramble(rng: &mut GameRng, centres: &mut [Loc]) {
    let n = centres.len() as i32;
    for _ in 0..n {
        let pick1 = rng.randint0(n) as usize;
        let pick2 = rng.randint0(n) as usize;
        centres.swap(pick1, pick2);
    }
}

/// Tunnel every room to the one before it, the first to the last, then try
/// doors at the junctions found on the way
fn connect_rooms(
    config: &DungeonConfig,
    profile: &CaveProfile,
    chunk: &mut Chunk,
    rng: &mut GameRng,
    centres: &[Loc],
) {
    let Some(&last) = centres.last() else {
        return;
    };

    let mut carver = TunnelCarver::new(profile.tunnel, config.limits, config.turn_based);
    let mut previous = last;
    let (mut carved, mut gave_up, mut stopped) = (0, 0, 0);
    for &centre in centres {
        let out = carver.build_tunnel(chunk, rng, centre, previous);
        carved += out.carved.len();
        gave_up += usize::from(out.gave_up);
        stopped += usize::from(out.stopped_early);
        previous = centre;
    }

    let wide = carver.is_wide();
    let candidates = carver.into_door_candidates();
    let doors = place_junction_doors(chunk, rng, &candidates, profile.tunnel.jct, wide);
    debug!(tunnels = centres.len(), carved, gave_up, stopped, candidates = candidates.len(), doors, "rooms connected");
}

/// Rooms in block slots across a full-size level
fn classic_gen(
    config: &DungeonConfig,
    registry: &RoomRegistry,
    profile: &CaveProfile,
    request: &LevelRequest,
    rng: &mut GameRng,
) -> (Chunk, Vec<Loc>) {
    let size_percent = size_percent(rng, request.depth, request.quest);
    let num_rooms = profile.dun_rooms * size_percent / 100;

    let mut chunk = Chunk::new(
        config.dungeon_hgt.max(request.min_height),
        config.dungeon_wid.max(request.min_width),
    );
    chunk.wpos.depth = request.depth;

    let mut centres = allocate_rooms_classic(&mut chunk, rng, registry, profile, num_rooms, &config.limits);
    chunk.seal_boundary();
    scramble(rng, &mut centres);
    connect_rooms(config, profile, &mut chunk, rng, &centres);
    (chunk, centres)
}

/// Rooms that place themselves until floor covers a seventh of a level
/// scaled around the size percent
///
/// Modified levels also insist on `min_rooms` rooms; moria levels stop on
/// the floor target alone.
fn floor_target_gen(
    config: &DungeonConfig,
    registry: &RoomRegistry,
    profile: &CaveProfile,
    request: &LevelRequest,
    rng: &mut GameRng,
    min_rooms: usize,
) -> (Chunk, Vec<Loc>) {
    let size_percent = size_percent(rng, request.depth, request.quest);
    let y_size = config.dungeon_hgt * (size_percent - 5 + rng.randint0(10)) / 100;
    let x_size = config.dungeon_wid * (size_percent - 5 + rng.randint0(10)) / 100;
    let height = y_size.max(request.min_height).min(config.dungeon_hgt);
    let width = x_size.max(request.min_width).min(config.dungeon_wid);

    let mut chunk = Chunk::new(height, width);
    chunk.wpos.depth = request.depth;
    // the ring goes in first so rooms and tunnels keep off it
    chunk.seal_boundary();

    let mut centres = allocate_rooms_floor_target(&mut chunk, rng, registry, profile, min_rooms, &config.limits);
    scramble(rng, &mut centres);
    connect_rooms(config, profile, &mut chunk, rng, &centres);
    (chunk, centres)
}

/// A maze sized by depth
fn labyrinth_gen(config: &DungeonConfig, request: &LevelRequest, rng: &mut GameRng) -> Result<Chunk, GenError> {
    let depth = request.depth;
    let wide = !config.turn_based && rng.percent(90);
    let (hmax, wmax) = if wide {
        (config.dungeon_hgt / 2 - 2, config.dungeon_wid / 2 - 2)
    } else {
        (config.dungeon_hgt - 3, config.dungeon_wid - 3)
    };

    let mut h = 15 + 2 * rng.randint0(depth / 10);
    let mut w = 51 + 2 * rng.randint0(depth / 10);

    let lit = rng.randint0(depth) < 25 || rng.one_in(2);
    let known = lit && rng.randint0(depth) < 25;
    let soft = rng.randint0(depth) < 35 || rng.randint0(3) < 2;

    h = h.max(request.min_height).min(hmax);
    w = w.max(request.min_width).min(wmax);
    if h % 2 == 0 {
        h -= 1;
    }
    if w % 2 == 0 {
        w -= 1;
    }
    if h < MAZE_MIN_SIZE || w < MAZE_MIN_SIZE {
        return Err(GenError::ChunkTooSmall { height: h, width: w });
    }

    let style = MazeStyle { lit, soft, wide };
    let mut maze = labyrinth_chunk(rng, h, w, style, config.limits.door_place_attempts);
    maze.chunk.wpos.depth = depth;
    maze.chunk.light_level = known;
    Ok(maze.chunk)
}

/// A cave covering half to three quarters of a full level
fn cavern_gen(
    config: &DungeonConfig,
    profile: &CaveProfile,
    request: &LevelRequest,
    rng: &mut GameRng,
) -> Result<Chunk, GenError> {
    let h = rng.range(config.dungeon_hgt / 2, config.dungeon_hgt * 3 / 4);
    let w = rng.range(config.dungeon_wid / 2, config.dungeon_wid * 3 / 4);

    if request.depth < profile.min_depth {
        return Err(GenError::TooShallow {
            depth: request.depth,
            min_depth: profile.min_depth,
        });
    }

    let h = h.max(request.min_height);
    let w = w.max(request.min_width);
    let mut cave = cavern_chunk(rng, h, w, &profile.cavern)?;
    cave.chunk.wpos.depth = request.depth;
    Ok(cave.chunk)
}

/// Fill in stair holes nobody used, then forget every hole
///
/// Meant to run after stairs are placed. A hole is filled back with granite
/// when it is still empty floor with exactly five walls around it.
pub fn remove_unused_holes(chunk: &mut Chunk) -> usize {
    let mut filled = 0;
    for grid in chunk.interior_locs() {
        if !chunk.cell(grid).has(SquareFlags::STAIRS) {
            continue;
        }
        let walls = DDGRID_DDD
            .iter()
            .filter(|&&offset| chunk.feat(grid + offset).is_wall())
            .count();
        if chunk.cell(grid).is_empty() && walls == 5 {
            chunk.set_feat(grid, Feature::Granite);
            filled += 1;
        }
        chunk.remove_info(grid, SquareFlags::STAIRS);
    }
    filled
}
