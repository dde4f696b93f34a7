//! Labyrinth levels
//!
//! Maze cells sit on even coordinates of an `h` by `w` area (both odd),
//! separated by walls on the odd coordinates. The maze is a randomized
//! Kruskal spanning tree: walls are visited in shuffled order and a wall is
//! knocked out whenever the two cells it divides are not yet connected.

use tracing::debug;

use crate::rng::GameRng;

use super::{Chunk, DIR_E, DIR_N, DIR_S, DIR_W, Feature, Loc, SquareFlags, place_closed_door};

/// Maze cells per door
const CELLS_PER_DOOR: usize = 100;

/// Appearance switches of a labyrinth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MazeStyle {
    /// Every floor grid glows
    pub lit: bool,
    /// Walls are diggable granite rather than permanent rock
    pub soft: bool,
    /// Every grid is stretched into a 2x2 block
    pub wide: bool,
}

/// A finished labyrinth
#[derive(Debug, Clone)]
pub struct Labyrinth {
    pub chunk: Chunk,
    /// Maze cells before stretching
    pub cells: usize,
    /// Dividing walls knocked out
    pub carved: usize,
    /// Door placements (a wide pair counts once)
    pub doors: usize,
}

/// Equivalence classes of maze cells
///
/// Merging relabels every member of one class, which is linear per merge.
/// Fine at labyrinth sizes; a union-find would be the upgrade for much
/// larger mazes.
struct MazeSets {
    class: Vec<Option<usize>>,
}

impl MazeSets {
    fn new(n: usize) -> Self {
        Self { class: vec![None; n] }
    }

    fn add_cell(&mut self, i: usize) {
        self.class[i] = Some(i);
    }

    fn are_connected(&self, a: usize, b: usize) -> bool {
        self.class[a] == self.class[b]
    }

    /// Move every member of `b`'s class into `a`'s
    fn merge(&mut self, a: usize, b: usize) {
        let old_class = self.class[b];
        let new_class = self.class[a];
        for class in &mut self.class {
            if *class == old_class {
                *class = new_class;
            }
        }
    }
}

/// Cells divided by the wall at maze index `i`
fn lab_get_adjoin(i: usize, w: i32) -> (usize, usize) {
    let grid = Loc::new(i as i32 % w, i as i32 / w);
    let (a, b) = if grid.x % 2 == 0 {
        (grid + DIR_N, grid + DIR_S)
    } else {
        (grid + DIR_W, grid + DIR_E)
    };
    ((a.y * w + a.x) as usize, (b.y * w + b.x) as usize)
}

/// Whether maze index `i` is a wall dividing two cells
fn is_adjoining_wall(i: usize, h: i32, w: i32) -> bool {
    let (x, y) = (i as i32 % w, i as i32 / w);
    if (x < 1 && y < 1) || (x > w - 2 && y > h - 2) {
        return false;
    }
    x % 2 != y % 2
}

fn is_open(chunk: &Chunk, grid: Loc) -> bool {
    chunk.cell(grid).is_empty()
}

/// Part of a straight corridor rather than an intersection
///
/// Open on both sides of one axis and closed on both sides of the other.
pub fn lab_is_tunnel(chunk: &Chunk, grid: Loc) -> bool {
    let west = is_open(chunk, grid + DIR_W);
    let east = is_open(chunk, grid + DIR_E);
    let north = is_open(chunk, grid + DIR_N);
    let south = is_open(chunk, grid + DIR_S);
    north == south && west == east && north != west
}

/// Offset away from the only closed side, when exactly one side is closed
fn wide_tunnel_side(chunk: &Chunk, grid: Loc) -> Option<Loc> {
    let west = is_open(chunk, grid + DIR_W);
    let east = is_open(chunk, grid + DIR_E);
    let north = is_open(chunk, grid + DIR_N);
    let south = is_open(chunk, grid + DIR_S);
    match (west, east, north, south) {
        (true, true, true, false) => Some(DIR_N),
        (true, true, false, true) => Some(DIR_S),
        (true, false, true, true) => Some(DIR_W),
        (false, true, true, true) => Some(DIR_E),
        _ => None,
    }
}

/// Whether `grid` is one half of a two-wide straight corridor
///
/// Returns the offset to the other half, which must itself look like half
/// of a wide corridor.
pub fn lab_is_wide_tunnel(chunk: &Chunk, grid: Loc) -> Option<Loc> {
    let choice = wide_tunnel_side(chunk, grid)?;
    wide_tunnel_side(chunk, grid + choice).map(|_| choice)
}

/// Random empty floor grid
fn find_empty(chunk: &Chunk, rng: &mut GameRng) -> Option<Loc> {
    for _ in 0..chunk.area() {
        let grid = Loc::new(rng.randint0(chunk.width()), rng.randint0(chunk.height()));
        if chunk.cell(grid).is_empty() {
            return Some(grid);
        }
    }
    None
}

/// Build a labyrinth whose maze area is `h` by `w` (both odd, at least 3)
///
/// The chunk is the maze area, doubled in each direction when wide, plus a
/// permanent outer ring. `door_attempts` bounds the search for each door.
pub fn labyrinth_chunk(rng: &mut GameRng, h: i32, w: i32, style: MazeStyle, door_attempts: u32) -> Labyrinth {
    assert!(h >= 3 && w >= 3 && h % 2 == 1 && w % 2 == 1, "maze area {h}x{w} must be odd");

    let n = (h * w) as usize;
    let scale = if style.wide { 2 } else { 1 };
    let mut chunk = Chunk::new(h * scale + 2, w * scale + 2);
    let glow = if style.lit {
        SquareFlags::GLOW
    } else {
        SquareFlags::empty()
    };

    chunk.seal_boundary();
    if style.soft {
        chunk.fill_rectangle(Loc::new(1, 1), Loc::new(w, h), Feature::Granite, SquareFlags::WALL_SOLID);
    } else {
        chunk.fill_rectangle(Loc::new(1, 1), Loc::new(w, h), Feature::Permanent, SquareFlags::empty());
    }

    // maze index (x, y) lives at chunk grid (x + 1, y + 1)
    let mut sets = MazeSets::new(n);
    let mut cells = 0;
    for y in (0..h).step_by(2) {
        for x in (0..w).step_by(2) {
            sets.add_cell((y * w + x) as usize);
            let grid = Loc::new(x + 1, y + 1);
            chunk.set_feat(grid, Feature::Floor);
            chunk.add_info(grid, glow);
            cells += 1;
        }
    }

    let mut walls: Vec<usize> = (0..n).collect();
    rng.shuffle(&mut walls);

    let mut carved = 0;
    for &wall in &walls {
        if !is_adjoining_wall(wall, h, w) {
            continue;
        }
        let (a, b) = lab_get_adjoin(wall, w);
        if sets.are_connected(a, b) {
            continue;
        }
        let grid = Loc::new(wall as i32 % w + 1, wall as i32 / w + 1);
        chunk.set_feat(grid, Feature::Floor);
        chunk.add_info(grid, glow);
        sets.merge(a, b);
        carved += 1;
    }

    if style.wide {
        stretch(&mut chunk, h, w);
    }

    let mut doors = 0;
    for _ in 0..n / CELLS_PER_DOOR {
        for _ in 0..door_attempts {
            let Some(grid) = find_empty(&chunk, rng) else {
                break;
            };
            if style.wide {
                if let Some(choice) = lab_is_wide_tunnel(&chunk, grid) {
                    place_closed_door(&mut chunk, rng, grid);
                    place_closed_door(&mut chunk, rng, grid + choice);
                    doors += 1;
                    break;
                }
            } else if lab_is_tunnel(&chunk, grid) {
                place_closed_door(&mut chunk, rng, grid);
                doors += 1;
                break;
            }
        }
    }

    debug!(h, w, cells, carved, doors, wide = style.wide, "labyrinth built");
    Labyrinth {
        chunk,
        cells,
        carved,
        doors,
    }
}

/// Blow every maze grid up into a 2x2 block, in place
///
/// Walking from the far corner back keeps every source grid intact until
/// it has been copied.
fn stretch(chunk: &mut Chunk, h: i32, w: i32) {
    for y in (1..=h).rev() {
        for x in (1..=w).rev() {
            let source = *chunk.cell(Loc::new(x, y));
            for target in [
                Loc::new(2 * x, 2 * y),
                Loc::new(2 * x - 1, 2 * y),
                Loc::new(2 * x, 2 * y - 1),
                Loc::new(2 * x - 1, 2 * y - 1),
            ] {
                chunk.set_feat(target, source.feat);
                chunk.set_info(target, source.info);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::is_fully_connected;

    fn narrow() -> MazeStyle {
        MazeStyle {
            lit: false,
            soft: true,
            wide: false,
        }
    }

    fn passable(chunk: &Chunk) -> u32 {
        chunk.locs().filter(|&g| chunk.is_passable(g)).count() as u32
    }

    #[test]
    fn test_adjoining_walls() {
        // 7 by 7 cells on a 13 by 13 area
        let walls = (0..169).filter(|&i| is_adjoining_wall(i, 13, 13)).count();
        assert_eq!(walls, 84);
        assert_eq!(lab_get_adjoin(1, 13), (0, 2));
        assert_eq!(lab_get_adjoin(13, 13), (0, 26));
    }

    #[test]
    fn test_spanning_tree() {
        for seed in 0..10 {
            let mut rng = GameRng::new(seed);
            let maze = labyrinth_chunk(&mut rng, 13, 13, narrow(), 10);
            assert_eq!(maze.cells, 49);
            assert_eq!(maze.carved, 48);
            assert_eq!(passable(&maze.chunk), 97);
            assert!(is_fully_connected(&maze.chunk));
        }
    }

    #[test]
    fn test_same_seed_same_maze() {
        let a = labyrinth_chunk(&mut GameRng::new(42), 15, 51, narrow(), 10);
        let b = labyrinth_chunk(&mut GameRng::new(42), 15, 51, narrow(), 10);
        assert_eq!(a.chunk.to_ascii(), b.chunk.to_ascii());
        let c = labyrinth_chunk(&mut GameRng::new(43), 15, 51, narrow(), 10);
        assert_ne!(a.chunk.to_ascii(), c.chunk.to_ascii());
    }

    #[test]
    fn test_hard_walls_are_permanent() {
        let style = MazeStyle {
            soft: false,
            ..narrow()
        };
        let maze = labyrinth_chunk(&mut GameRng::new(5), 13, 13, style, 10);
        assert_eq!(maze.chunk.feat_count(Feature::Granite), 0);
        let soft = labyrinth_chunk(&mut GameRng::new(5), 13, 13, narrow(), 10);
        assert!(soft.chunk.cell(Loc::new(2, 2)).is_granite_with(SquareFlags::WALL_SOLID));
    }

    #[test]
    fn test_wide_maze_is_stretched() {
        let style = MazeStyle {
            lit: true,
            soft: true,
            wide: true,
        };
        let maze = labyrinth_chunk(&mut GameRng::new(9), 15, 51, style, 10);
        assert_eq!(maze.chunk.height(), 32);
        assert_eq!(maze.chunk.width(), 104);
        assert_eq!(passable(&maze.chunk) as usize, 4 * (maze.cells + maze.carved));
        assert!(is_fully_connected(&maze.chunk));
        assert!(maze.chunk.info(Loc::new(1, 1)).contains(SquareFlags::GLOW));
        // the ring survives stretching
        for grid in maze.chunk.locs().filter(|&g| !maze.chunk.in_bounds_fully(g)) {
            assert_eq!(maze.chunk.feat(grid), Feature::Permanent);
        }
    }

    #[test]
    fn test_doors_in_corridors() {
        let mut rng = GameRng::new(3);
        let maze = labyrinth_chunk(&mut rng, 21, 51, narrow(), 50);
        let doors = maze.chunk.locs().filter(|&g| maze.chunk.feat(g).is_door()).count();
        assert_eq!(doors, maze.doors);
        assert!(maze.doors <= 10);
    }

    #[test]
    fn test_wide_doors_face_each_other() {
        let style = MazeStyle {
            lit: false,
            soft: true,
            wide: true,
        };
        let maze = labyrinth_chunk(&mut GameRng::new(8), 21, 51, style, 50);
        let chunk = &maze.chunk;
        let doors: Vec<Loc> = chunk.locs().filter(|&g| chunk.feat(g).is_door()).collect();
        assert!(maze.doors > 0);
        assert_eq!(doors.len(), 2 * maze.doors);

        for &door in &doors {
            // the partner sits across the corridor, both backed by a wall and
            // open along the corridor on both sides
            let paired = [DIR_N, DIR_S, DIR_W, DIR_E].into_iter().any(|dir| {
                let partner = door + dir;
                chunk.feat(partner).is_door()
                    && !chunk.is_floor(door - dir)
                    && !chunk.is_floor(partner + dir)
                    && [door, partner]
                        .iter()
                        .all(|&g| chunk.is_passable(g.lateral(dir, 1)) && chunk.is_passable(g.lateral(dir, -1)))
            });
            assert!(paired, "door at {door:?} has no partner across a wide corridor");
        }
    }

    #[test]
    fn test_tunnel_shapes() {
        let mut chunk = Chunk::new(7, 7);
        chunk.fill_rectangle(Loc::new(1, 3), Loc::new(5, 3), Feature::Floor, SquareFlags::empty());
        assert!(lab_is_tunnel(&chunk, Loc::new(3, 3)));
        chunk.set_feat(Loc::new(3, 2), Feature::Floor);
        assert!(!lab_is_tunnel(&chunk, Loc::new(3, 3)));

        let mut wide = Chunk::new(8, 9);
        wide.fill_rectangle(Loc::new(1, 3), Loc::new(7, 4), Feature::Floor, SquareFlags::empty());
        assert_eq!(lab_is_wide_tunnel(&wide, Loc::new(4, 3)), Some(DIR_S));
        assert_eq!(lab_is_wide_tunnel(&wide, Loc::new(4, 4)), Some(DIR_N));
        assert!(!lab_is_tunnel(&wide, Loc::new(4, 3)));
    }
}
