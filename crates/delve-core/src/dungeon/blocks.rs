//! Block grid and room allocation
//!
//! The chunk is partitioned into square blocks of `block_size` grids. Rooms
//! reserve whole blocks, which keeps them from overlapping without any
//! per-grid checks.

use tracing::{debug, warn};

use crate::config::{CaveProfile, Limits};
use crate::rng::GameRng;

use super::{Chunk, Feature, Loc, RoomRegistry};

/// Guesses made when a room looks for its own space
const FIND_SPACE_GUESSES: u32 = 25;

/// An inclusive rectangle of blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRect {
    pub by1: i32,
    pub bx1: i32,
    pub by2: i32,
    pub bx2: i32,
}

/// Occupancy of the coarse block grid
#[derive(Debug, Clone)]
pub struct BlockGrid {
    rows: i32,
    cols: i32,
    block_size: i32,
    used: Vec<bool>,
}

impl BlockGrid {
    pub fn new(chunk: &Chunk, block_size: i32) -> Self {
        assert!(block_size > 0, "block size must be positive");
        let rows = chunk.height() / block_size;
        let cols = chunk.width() / block_size;
        Self {
            rows,
            cols,
            block_size,
            used: vec![false; (rows * cols).max(0) as usize],
        }
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    fn index(&self, by: i32, bx: i32) -> usize {
        (by * self.cols + bx) as usize
    }

    pub fn is_used(&self, by: i32, bx: i32) -> bool {
        self.used[self.index(by, bx)]
    }

    /// The rectangle lies on the grid and none of its blocks are used
    pub fn is_free(&self, rect: BlockRect) -> bool {
        if rect.by1 < 0 || rect.bx1 < 0 || rect.by2 >= self.rows || rect.bx2 >= self.cols {
            return false;
        }
        (rect.by1..=rect.by2).all(|by| (rect.bx1..=rect.bx2).all(|bx| !self.is_used(by, bx)))
    }

    pub fn reserve(&mut self, rect: BlockRect) {
        for by in rect.by1..=rect.by2 {
            for bx in rect.bx1..=rect.bx2 {
                let i = self.index(by, bx);
                self.used[i] = true;
            }
        }
    }

    /// Grid at the middle of a block rectangle
    pub fn centre(&self, rect: BlockRect) -> Loc {
        Loc::new(
            (rect.bx1 + rect.bx2 + 1) * self.block_size / 2,
            (rect.by1 + rect.by2 + 1) * self.block_size / 2,
        )
    }
}

/// Where a room is allowed to go, handed to a `RoomBuilder`
pub struct RoomSite<'a> {
    pub chunk: &'a mut Chunk,
    pub rng: &'a mut GameRng,
    blocks: &'a mut BlockGrid,
    centres: &'a mut Vec<Loc>,
    room_max: usize,
    /// Pre-validated footprint in block-slot placement
    slot: Option<BlockRect>,
}

impl<'a> RoomSite<'a> {
    pub fn new(
        chunk: &'a mut Chunk,
        rng: &'a mut GameRng,
        blocks: &'a mut BlockGrid,
        centres: &'a mut Vec<Loc>,
        room_max: usize,
        slot: Option<BlockRect>,
    ) -> Self {
        Self {
            chunk,
            rng,
            blocks,
            centres,
            room_max,
            slot,
        }
    }

    pub fn depth(&self) -> i32 {
        self.chunk.depth()
    }

    /// Roll whether a new room is lit
    pub fn light(&mut self) -> bool {
        self.chunk.depth() <= self.rng.randint1(25)
    }

    /// Reserve space for a room whose outer walls span `height` by `width`
    ///
    /// In block-slot placement the slot chosen by the allocator is used;
    /// otherwise up to 25 random top-left blocks are tried. On success the
    /// blocks are reserved, the centre is registered and returned.
    pub fn find_space(&mut self, height: i32, width: i32) -> Option<Loc> {
        if self.centres.len() >= self.room_max {
            return None;
        }

        let rect = match self.slot.take() {
            Some(rect) => {
                let centre = self.blocks.centre(rect);
                if !self.fits(centre, height, width) {
                    return None;
                }
                rect
            }
            None => self.guess_space(height, width)?,
        };

        let centre = self.blocks.centre(rect);
        self.blocks.reserve(rect);
        self.centres.push(centre);
        Some(centre)
    }

    fn guess_space(&mut self, height: i32, width: i32) -> Option<BlockRect> {
        let size = self.blocks.block_size;
        let blocks_high = 1 + (height - 1) / size;
        let blocks_wide = 1 + (width - 1) / size;

        for _ in 0..FIND_SPACE_GUESSES {
            let by1 = self.rng.randint0(self.blocks.rows);
            let bx1 = self.rng.randint0(self.blocks.cols);
            let rect = BlockRect {
                by1,
                bx1,
                by2: by1 + blocks_high - 1,
                bx2: bx1 + blocks_wide - 1,
            };
            if !self.blocks.is_free(rect) {
                continue;
            }
            if self.fits(self.blocks.centre(rect), height, width) {
                return Some(rect);
            }
        }
        None
    }

    /// The extent centred on `centre` lies inside the chunk
    fn fits(&self, centre: Loc, height: i32, width: i32) -> bool {
        let top_left = Loc::new(centre.x - width / 2, centre.y - height / 2);
        let bottom_right = Loc::new(top_left.x + width - 1, top_left.y + height - 1);
        self.chunk.in_bounds(top_left) && self.chunk.in_bounds(bottom_right)
    }
}

/// Depth-biased room rarity
///
/// Each level of rarity needs another successful roll, so rarity `n` has
/// roughly a `((50 + depth/2) / dun_unusual)^n` chance.
pub fn roll_rarity(rng: &mut GameRng, depth: i32, dun_unusual: i32, max_rarity: i32) -> i32 {
    let mut rarity = 0;
    let mut i = 0;
    while i == rarity && i < max_rarity {
        if rng.randint0(dun_unusual) < 50 + depth / 2 {
            rarity += 1;
        }
        i += 1;
    }
    rarity
}

/// Shared state of one room allocation pass
struct Allocation<'a> {
    registry: &'a RoomRegistry,
    profile: &'a CaveProfile,
    blocks: BlockGrid,
    centres: Vec<Loc>,
    room_max: usize,
}

impl Allocation<'_> {
    /// Roll a key and rarity, then try every matching table entry in order
    fn build_from_table(&mut self, chunk: &mut Chunk, rng: &mut GameRng, slot: Option<(i32, i32)>) -> bool {
        let depth = chunk.depth();
        let key = rng.randint0(100);
        let rarity = roll_rarity(rng, depth, self.profile.dun_unusual, self.profile.max_rarity);

        for room in &self.profile.rooms {
            if room.rarity > rarity || room.cutoff <= key || room.min_depth > depth {
                continue;
            }
            let Some(builder) = self.registry.get(&room.builder) else {
                warn!(builder = %room.builder, "room profile names an unknown builder");
                continue;
            };

            let rect = match slot {
                Some((by, bx)) => {
                    let rect = BlockRect {
                        by1: by,
                        bx1: bx,
                        by2: by + room.height / self.blocks.block_size,
                        bx2: bx + room.width / self.blocks.block_size,
                    };
                    if !self.blocks.is_free(rect) {
                        continue;
                    }
                    Some(rect)
                }
                None => None,
            };

            let mut site = RoomSite::new(chunk, rng, &mut self.blocks, &mut self.centres, self.room_max, rect);
            if builder.build(&mut site) {
                return true;
            }
        }
        false
    }
}

/// Place rooms in block slots until `num_rooms` are built or every block
/// has been tried
///
/// Blocks are drawn uniformly among the untried ones by reservoir sampling.
/// Returns the registered room centres.
pub fn allocate_rooms_classic(
    chunk: &mut Chunk,
    rng: &mut GameRng,
    registry: &RoomRegistry,
    profile: &CaveProfile,
    num_rooms: i32,
    limits: &Limits,
) -> Vec<Loc> {
    let blocks = BlockGrid::new(chunk, profile.block_size);
    let (rows, cols) = (blocks.rows(), blocks.cols());
    let mut tried = vec![false; (rows * cols).max(0) as usize];
    let mut alloc = Allocation {
        registry,
        profile,
        blocks,
        centres: Vec::new(),
        room_max: limits.room_max,
    };

    let mut built = 0;
    let mut attempts = 0;
    while built < num_rooms {
        let mut untried = 0;
        let mut pick = None;
        for by in 0..rows {
            for bx in 0..cols {
                if tried[(by * cols + bx) as usize] {
                    continue;
                }
                untried += 1;
                if rng.one_in(untried) {
                    pick = Some((by, bx));
                }
            }
        }
        let Some((by, bx)) = pick else {
            break;
        };

        let i = (by * cols + bx) as usize;
        assert!(!tried[i], "block ({by}, {bx}) was already tried");
        tried[i] = true;
        attempts += 1;

        if alloc.build_from_table(chunk, rng, Some((by, bx))) {
            built += 1;
        }
    }

    debug!(built, attempts, target = num_rooms, "classic rooms placed");
    alloc.centres
}

/// Let rooms find their own space until floor covers a seventh of the chunk
/// and at least `min_rooms` rooms exist
///
/// Gives up after `limits.room_attempt_max` failed builds.
pub fn allocate_rooms_floor_target(
    chunk: &mut Chunk,
    rng: &mut GameRng,
    registry: &RoomRegistry,
    profile: &CaveProfile,
    min_rooms: usize,
    limits: &Limits,
) -> Vec<Loc> {
    let target = (chunk.area() / 7) as u32;
    let mut alloc = Allocation {
        registry,
        profile,
        blocks: BlockGrid::new(chunk, profile.block_size),
        centres: Vec::new(),
        room_max: limits.room_max,
    };

    let mut failures = 0;
    while chunk.feat_count(Feature::Floor) < target || alloc.centres.len() < min_rooms {
        if failures >= limits.room_attempt_max {
            warn!(
                floors = chunk.feat_count(Feature::Floor),
                target,
                rooms = alloc.centres.len(),
                "room allocation gave up before reaching its floor target"
            );
            break;
        }
        if !alloc.build_from_table(chunk, rng, None) {
            failures += 1;
        }
    }

    debug!(rooms = alloc.centres.len(), failures, "rooms placed by floor target");
    alloc.centres
}
