//! Region coloring and joining
//!
//! Every connected group of passable grids gets a color. Regions are then
//! joined one at a time: a breadth-first search grows out of every grid of
//! one region at once, through rock if need be, until it touches another
//! region, and the path it found is dug out as a two-wide corridor.
//!
//! This runs at the end of every paradigm, so carving elsewhere is free to be
//! imperfect.

use std::collections::VecDeque;

use hashbrown::HashSet;
use tracing::{debug, warn};

use super::{Chunk, DDGRID_DDD, Feature, Loc, SquareFlags};

/// Color of grids that belong to no region
const NO_COLOR: u32 = 0;

/// Connected-component labelling of a chunk's passable grids
#[derive(Debug, Clone)]
pub struct Regions {
    /// Color per grid, row-major
    colors: Vec<u32>,
    /// Population per color; index 0 is unused
    counts: Vec<u32>,
}

impl Regions {
    /// Color every passable region, optionally joining diagonal neighbours
    pub fn build(chunk: &Chunk, diagonal: bool) -> Self {
        let mut regions = Self {
            colors: vec![NO_COLOR; chunk.area() as usize],
            counts: vec![0],
        };
        let neighbours = if diagonal { &DDGRID_DDD[..] } else { &DDGRID_DDD[..4] };

        let mut queue = VecDeque::new();
        for grid in chunk.locs() {
            if regions.ignore_point(chunk, grid) {
                continue;
            }

            let color = regions.counts.len() as u32;
            regions.counts.push(0);
            regions.colors[chunk.grid_to_i(grid)] = color;
            queue.push_back(grid);

            while let Some(here) = queue.pop_front() {
                regions.counts[color as usize] += 1;
                for &offset in neighbours {
                    let next = here + offset;
                    if regions.ignore_point(chunk, next) {
                        continue;
                    }
                    regions.colors[chunk.grid_to_i(next)] = color;
                    queue.push_back(next);
                }
            }
        }
        regions
    }

    /// Off the chunk, already colored, or not passable
    fn ignore_point(&self, chunk: &Chunk, grid: Loc) -> bool {
        !chunk.in_bounds(grid) || self.colors[chunk.grid_to_i(grid)] != NO_COLOR || !chunk.is_passable(grid)
    }

    pub fn color_at(&self, chunk: &Chunk, grid: Loc) -> u32 {
        self.colors[chunk.grid_to_i(grid)]
    }

    /// Population of a color
    pub fn count(&self, color: u32) -> u32 {
        self.counts.get(color as usize).copied().unwrap_or(0)
    }

    /// Colors that still have members
    pub fn num_regions(&self) -> usize {
        self.counts.iter().filter(|&&n| n > 0).count()
    }

    fn live_colors(&self) -> impl Iterator<Item = u32> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .map(|(color, _)| color as u32)
    }

    /// Fill every region smaller than `min_size` with solid granite
    ///
    /// Returns the number of regions removed.
    pub fn clear_small_regions(&mut self, chunk: &mut Chunk, min_size: u32) -> usize {
        let mut deleted = vec![false; self.counts.len()];
        let mut removed = 0;
        for (color, count) in self.counts.iter_mut().enumerate().skip(1) {
            if *count > 0 && *count < min_size {
                deleted[color] = true;
                *count = 0;
                removed += 1;
            }
        }
        if removed == 0 {
            return 0;
        }

        for grid in chunk.interior_locs() {
            let i = chunk.grid_to_i(grid);
            if !deleted[self.colors[i] as usize] {
                continue;
            }
            self.colors[i] = NO_COLOR;
            if !chunk.feat(grid).is_permanent() {
                chunk.set_marked_granite(grid, SquareFlags::WALL_SOLID);
            }
        }
        removed
    }

    /// Repaint every grid of `from` as `to`
    fn fix_colors(&mut self, from: u32, to: u32) {
        for color in self.colors.iter_mut().filter(|c| **c == from) {
            *color = to;
        }
        self.counts[to as usize] += self.counts[from as usize];
        self.counts[from as usize] = 0;
    }

    /// Dig from region `color` to the nearest grid of `target` (or of any
    /// other region when `target` is `None`) and merge the two
    ///
    /// The search may cross any interior grid that is neither permanent nor
    /// part of a vault. Returns false when no other region is reachable.
    pub fn join_region(&mut self, chunk: &mut Chunk, color: u32, target: Option<u32>) -> bool {
        let size = self.colors.len();
        let mut previous = vec![usize::MAX; size];
        let mut queue = VecDeque::new();

        for (i, &c) in self.colors.iter().enumerate() {
            if c == color {
                previous[i] = i;
                queue.push_back(i);
            }
        }

        while let Some(n1) = queue.pop_front() {
            let color2 = self.colors[n1];
            let reached = match target {
                Some(t) => color2 == t,
                None => color2 != NO_COLOR && color2 != color,
            };

            if reached {
                let mut n = n1;
                while self.colors[n] != color {
                    let grid = chunk.i_to_grid(n);
                    let old = self.colors[n];
                    if old == NO_COLOR {
                        self.counts[color as usize] += 1;
                    } else if old != color2 {
                        // path crossed a third region
                        self.counts[old as usize] -= 1;
                        self.counts[color as usize] += 1;
                    }
                    self.colors[n] = color;
                    dig_connector(chunk, grid);
                    n = previous[n];

                    // broaden the corridor sideways to the step
                    let gridp = chunk.i_to_grid(n);
                    let beside = if gridp.y != grid.y {
                        Loc::new(grid.x + 1, grid.y)
                    } else {
                        Loc::new(grid.x, grid.y + 1)
                    };
                    dig_connector(chunk, beside);
                }
                self.fix_colors(color2, color);
                return true;
            }

            let here = chunk.i_to_grid(n1);
            for &offset in &DDGRID_DDD[..4] {
                let next = here + offset;
                if !chunk.in_bounds(next) {
                    continue;
                }
                let n2 = chunk.grid_to_i(next);
                if previous[n2] != usize::MAX {
                    continue;
                }
                if self.colors[n2] == NO_COLOR && !can_tunnel(chunk, next) {
                    continue;
                }
                previous[n2] = n1;
                queue.push_back(n2);
            }
        }
        false
    }

    /// Join regions until one remains or the rest cannot be reached
    ///
    /// Returns the number of joins made.
    pub fn join_regions(&mut self, chunk: &mut Chunk) -> usize {
        let initial = self.num_regions();
        let mut stuck: HashSet<u32> = HashSet::new();
        let mut joined = 0;

        for _ in 0..initial {
            if self.num_regions() <= 1 {
                break;
            }
            let Some(color) = self.live_colors().find(|c| !stuck.contains(c)) else {
                break;
            };
            if self.join_region(chunk, color, None) {
                joined += 1;
            } else {
                warn!(color, size = self.count(color), "region cannot reach any other region");
                stuck.insert(color);
            }
        }
        joined
    }
}

/// Interior grid the join search may dig through
fn can_tunnel(chunk: &Chunk, grid: Loc) -> bool {
    chunk.in_bounds_fully(grid) && !chunk.feat(grid).is_permanent() && !chunk.is_vault(grid)
}

fn dig_connector(chunk: &mut Chunk, grid: Loc) {
    if can_tunnel(chunk, grid) && !chunk.is_passable(grid) {
        chunk.set_feat(grid, Feature::Floor);
    }
}

/// Join every passable region of the chunk, treating diagonal neighbours as
/// connected
///
/// Returns the number of joins made.
pub fn ensure_connectedness(chunk: &mut Chunk) -> usize {
    let mut regions = Regions::build(chunk, true);
    let before = regions.num_regions();
    let joined = regions.join_regions(chunk);
    debug!(regions = before, joined, "connectivity enforced");
    joined
}

/// Join regions after coloring them `diagonal`ly or not
pub fn join_regions(chunk: &mut Chunk, diagonal: bool) -> usize {
    Regions::build(chunk, diagonal).join_regions(chunk)
}

/// Every passable grid reaches every other by king moves
pub fn is_fully_connected(chunk: &Chunk) -> bool {
    Regions::build(chunk, true).num_regions() <= 1
}
