//! Chunk structure and placement primitives
//!
//! A chunk is the rectangular grid one level is generated into. All terrain
//! changes go through `set_feat` so the per-feature population counters stay
//! exact.

use core::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use strum::EnumCount;

use super::{Cell, Feature, SquareFlags};

/// A grid location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Loc {
    pub x: i32,
    pub y: i32,
}

impl Loc {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance
    pub fn chebyshev(self, other: Loc) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Offset rotated a quarter turn, scaled by `sign`
    ///
    /// For a step `offset` this is the lateral neighbour used to widen
    /// tunnels and openings.
    pub fn lateral(self, offset: Loc, sign: i32) -> Loc {
        Loc::new(self.x + sign * offset.y, self.y + sign * offset.x)
    }
}

impl Add for Loc {
    type Output = Loc;

    fn add(self, rhs: Loc) -> Loc {
        Loc::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Loc {
    type Output = Loc;

    fn sub(self, rhs: Loc) -> Loc {
        Loc::new(self.x - rhs.x, self.y - rhs.y)
    }
}

pub const DIR_N: Loc = Loc::new(0, -1);
pub const DIR_S: Loc = Loc::new(0, 1);
pub const DIR_E: Loc = Loc::new(1, 0);
pub const DIR_W: Loc = Loc::new(-1, 0);

/// Neighbour offsets: the four cardinals first, then the diagonals
pub const DDGRID_DDD: [Loc; 8] = [
    DIR_S,
    DIR_N,
    DIR_E,
    DIR_W,
    Loc::new(1, 1),
    Loc::new(-1, 1),
    Loc::new(1, -1),
    Loc::new(-1, -1),
];

/// Where a chunk sits in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: i32,
    pub y: i32,
    pub depth: i32,
}

/// A generated (or in-generation) level grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    height: i32,
    width: i32,
    /// Cells indexed `[x][y]`
    cells: Vec<Vec<Cell>>,
    feat_count: [u32; Feature::COUNT],
    pub wpos: WorldPos,
    /// Whether the layout is known to the player on arrival
    pub light_level: bool,
}

impl Chunk {
    /// Allocate a chunk filled with plain granite
    pub fn new(height: i32, width: i32) -> Self {
        assert!(height > 0 && width > 0, "chunk dimensions must be positive");
        let mut feat_count = [0; Feature::COUNT];
        feat_count[Feature::Granite.index()] = (height * width) as u32;
        Self {
            height,
            width,
            cells: vec![vec![Cell::granite(); height as usize]; width as usize],
            feat_count,
            wpos: WorldPos::default(),
            light_level: false,
        }
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn area(&self) -> i32 {
        self.height * self.width
    }

    pub fn depth(&self) -> i32 {
        self.wpos.depth
    }

    /// Anywhere inside the chunk, including the outer ring
    pub fn in_bounds(&self, grid: Loc) -> bool {
        grid.x >= 0 && grid.x < self.width && grid.y >= 0 && grid.y < self.height
    }

    /// Strictly inside the outer ring
    pub fn in_bounds_fully(&self, grid: Loc) -> bool {
        grid.x > 0 && grid.x < self.width - 1 && grid.y > 0 && grid.y < self.height - 1
    }

    /// Cell at `grid`; panics when out of bounds
    pub fn cell(&self, grid: Loc) -> &Cell {
        assert!(self.in_bounds(grid), "grid {grid:?} out of bounds");
        &self.cells[grid.x as usize][grid.y as usize]
    }

    pub fn feat(&self, grid: Loc) -> Feature {
        self.cell(grid).feat
    }

    pub fn info(&self, grid: Loc) -> SquareFlags {
        self.cell(grid).info
    }

    /// Number of grids currently holding `feat`
    pub fn feat_count(&self, feat: Feature) -> u32 {
        self.feat_count[feat.index()]
    }

    /// Change the feature of a grid, keeping counters exact
    pub fn set_feat(&mut self, grid: Loc, feat: Feature) {
        assert!(self.in_bounds(grid), "grid {grid:?} out of bounds");
        let cell = &mut self.cells[grid.x as usize][grid.y as usize];
        self.feat_count[cell.feat.index()] -= 1;
        self.feat_count[feat.index()] += 1;
        cell.feat = feat;
    }

    pub fn add_info(&mut self, grid: Loc, flag: SquareFlags) {
        assert!(self.in_bounds(grid), "grid {grid:?} out of bounds");
        self.cells[grid.x as usize][grid.y as usize].info |= flag;
    }

    pub fn remove_info(&mut self, grid: Loc, flag: SquareFlags) {
        assert!(self.in_bounds(grid), "grid {grid:?} out of bounds");
        self.cells[grid.x as usize][grid.y as usize].info -= flag;
    }

    /// Replace all info flags of a grid
    pub fn set_info(&mut self, grid: Loc, info: SquareFlags) {
        assert!(self.in_bounds(grid), "grid {grid:?} out of bounds");
        self.cells[grid.x as usize][grid.y as usize].info = info;
    }

    /// Turn a grid into granite carrying exactly one wall flag
    pub fn set_marked_granite(&mut self, grid: Loc, flag: SquareFlags) {
        self.set_feat(grid, Feature::Granite);
        self.remove_info(grid, SquareFlags::WALL_ANY);
        self.add_info(grid, flag);
    }

    pub fn is_rock(&self, grid: Loc) -> bool {
        self.feat(grid).is_rock()
    }

    pub fn is_floor(&self, grid: Loc) -> bool {
        self.feat(grid).is_floor()
    }

    pub fn is_passable(&self, grid: Loc) -> bool {
        self.feat(grid).is_passable()
    }

    pub fn is_room(&self, grid: Loc) -> bool {
        self.cell(grid).is_room()
    }

    pub fn is_vault(&self, grid: Loc) -> bool {
        self.cell(grid).is_vault()
    }

    /// Fill the inclusive rectangle `top_left..=bottom_right`, OR-ing `flag`
    /// into every grid
    pub fn fill_rectangle(&mut self, top_left: Loc, bottom_right: Loc, feat: Feature, flag: SquareFlags) {
        for y in top_left.y..=bottom_right.y {
            for x in top_left.x..=bottom_right.x {
                let grid = Loc::new(x, y);
                self.set_feat(grid, feat);
                self.add_info(grid, flag);
            }
        }
    }

    /// Draw only the border of the inclusive rectangle
    pub fn draw_rectangle(&mut self, top_left: Loc, bottom_right: Loc, feat: Feature, flag: SquareFlags) {
        for y in top_left.y..=bottom_right.y {
            for x in [top_left.x, bottom_right.x] {
                let grid = Loc::new(x, y);
                self.set_feat(grid, feat);
                self.add_info(grid, flag);
            }
        }
        for x in top_left.x + 1..bottom_right.x {
            for y in [top_left.y, bottom_right.y] {
                let grid = Loc::new(x, y);
                self.set_feat(grid, feat);
                self.add_info(grid, flag);
            }
        }
    }

    /// Mark an inclusive rectangle as room, optionally lit
    pub fn generate_room(&mut self, top_left: Loc, bottom_right: Loc, light: bool) {
        let mut flag = SquareFlags::ROOM;
        if light {
            flag |= SquareFlags::GLOW;
        }
        for y in top_left.y..=bottom_right.y {
            for x in top_left.x..=bottom_right.x {
                self.add_info(Loc::new(x, y), flag);
            }
        }
    }

    /// Seal the outer ring with permanent wall
    pub fn seal_boundary(&mut self) {
        let bottom_right = Loc::new(self.width - 1, self.height - 1);
        self.draw_rectangle(Loc::new(0, 0), bottom_right, Feature::Permanent, SquareFlags::empty());
    }

    /// Every grid, row by row
    pub fn locs(&self) -> impl Iterator<Item = Loc> + use<> {
        let (w, h) = (self.width, self.height);
        (0..h).flat_map(move |y| (0..w).map(move |x| Loc::new(x, y)))
    }

    /// Every grid strictly inside the outer ring, row by row
    pub fn interior_locs(&self) -> impl Iterator<Item = Loc> + use<> {
        let (w, h) = (self.width, self.height);
        (1..h - 1).flat_map(move |y| (1..w - 1).map(move |x| Loc::new(x, y)))
    }

    /// Row-major index of a grid
    pub fn grid_to_i(&self, grid: Loc) -> usize {
        (grid.y * self.width + grid.x) as usize
    }

    pub fn i_to_grid(&self, i: usize) -> Loc {
        Loc::new(i as i32 % self.width, i as i32 / self.width)
    }

    /// ASCII rendering, one line per row
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.area() + self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cell(Loc::new(x, y));
                if cell.has(SquareFlags::TRAP) && cell.feat.is_floor() {
                    out.push('^');
                } else {
                    out.push(cell.feat.symbol());
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chunk_counts() {
        let chunk = Chunk::new(10, 20);
        assert_eq!(chunk.feat_count(Feature::Granite), 200);
        assert_eq!(chunk.feat_count(Feature::Floor), 0);
    }

    #[test]
    fn test_bounds_predicates() {
        let chunk = Chunk::new(10, 20);
        assert!(chunk.in_bounds(Loc::new(0, 0)));
        assert!(!chunk.in_bounds_fully(Loc::new(0, 0)));
        assert!(chunk.in_bounds(Loc::new(19, 9)));
        assert!(!chunk.in_bounds_fully(Loc::new(19, 9)));
        assert!(chunk.in_bounds_fully(Loc::new(18, 8)));
        assert!(!chunk.in_bounds(Loc::new(20, 5)));
        assert!(!chunk.in_bounds(Loc::new(-1, 5)));
    }

    #[test]
    fn test_fill_rectangle_updates_counts() {
        let mut chunk = Chunk::new(10, 20);
        chunk.fill_rectangle(Loc::new(2, 2), Loc::new(5, 4), Feature::Floor, SquareFlags::ROOM);
        assert_eq!(chunk.feat_count(Feature::Floor), 12);
        assert_eq!(chunk.feat_count(Feature::Granite), 188);
        assert!(chunk.is_room(Loc::new(5, 4)));
        assert!(!chunk.is_room(Loc::new(6, 4)));
    }

    #[test]
    fn test_draw_rectangle_border_only() {
        let mut chunk = Chunk::new(10, 20);
        chunk.fill_rectangle(Loc::new(0, 0), Loc::new(19, 9), Feature::Floor, SquareFlags::empty());
        chunk.draw_rectangle(Loc::new(2, 2), Loc::new(6, 5), Feature::Granite, SquareFlags::WALL_OUTER);
        // perimeter of a 5x4 rectangle
        assert_eq!(chunk.feat_count(Feature::Granite), 14);
        assert!(chunk.cell(Loc::new(2, 3)).is_granite_with(SquareFlags::WALL_OUTER));
        assert!(chunk.is_floor(Loc::new(3, 3)));
    }

    #[test]
    fn test_seal_boundary() {
        let mut chunk = Chunk::new(6, 8);
        chunk.seal_boundary();
        assert_eq!(chunk.feat_count(Feature::Permanent), 2 * 8 + 2 * 4);
        for grid in chunk.locs() {
            let on_ring = !chunk.in_bounds_fully(grid);
            assert_eq!(chunk.feat(grid) == Feature::Permanent, on_ring);
        }
    }

    #[test]
    fn test_set_marked_granite_replaces_wall_flags() {
        let mut chunk = Chunk::new(5, 5);
        let grid = Loc::new(2, 2);
        chunk.add_info(grid, SquareFlags::WALL_OUTER | SquareFlags::ROOM);
        chunk.set_marked_granite(grid, SquareFlags::WALL_SOLID);
        let cell = chunk.cell(grid);
        assert!(cell.has(SquareFlags::WALL_SOLID));
        assert!(!cell.has(SquareFlags::WALL_OUTER));
        assert!(cell.has(SquareFlags::ROOM));
    }

    #[test]
    fn test_index_roundtrip() {
        let chunk = Chunk::new(7, 13);
        let grid = Loc::new(11, 5);
        assert_eq!(chunk.i_to_grid(chunk.grid_to_i(grid)), grid);
    }

    #[test]
    fn test_lateral() {
        let here = Loc::new(5, 5);
        assert_eq!(here.lateral(DIR_E, 1), Loc::new(5, 6));
        assert_eq!(here.lateral(DIR_E, -1), Loc::new(5, 4));
        assert_eq!(here.lateral(DIR_N, 1), Loc::new(4, 5));
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_access_panics() {
        let chunk = Chunk::new(5, 5);
        let _ = chunk.cell(Loc::new(5, 0));
    }
}
