//! Door and trap placement at tunnel junctions

use crate::rng::GameRng;

use super::{Chunk, DDGRID_DDD, DIR_E, DIR_N, DIR_S, DIR_W, Feature, Loc, SquareFlags};

/// Closed door, locked one time in four
pub fn place_closed_door(chunk: &mut Chunk, rng: &mut GameRng, grid: Loc) {
    let feat = if rng.one_in(4) {
        Feature::LockedDoor
    } else {
        Feature::ClosedDoor
    };
    chunk.set_feat(grid, feat);
}

/// 30% open, 10% broken, otherwise closed
pub fn place_random_door(chunk: &mut Chunk, rng: &mut GameRng, grid: Loc) {
    let roll = rng.randint0(100);
    if roll < 30 {
        chunk.set_feat(grid, Feature::OpenDoor);
    } else if roll < 40 {
        chunk.set_feat(grid, Feature::BrokenDoor);
    } else {
        place_closed_door(chunk, rng, grid);
    }
}

/// Orthogonal neighbours that are corridor floor (floor outside rooms)
pub fn next_to_corr(chunk: &Chunk, grid: Loc) -> usize {
    assert!(chunk.in_bounds(grid));
    DDGRID_DDD[..4]
        .iter()
        .map(|&offset| grid + offset)
        .filter(|&next| chunk.is_floor(next) && !chunk.is_room(next))
        .count()
}

fn is_strong_wall(chunk: &Chunk, grid: Loc) -> bool {
    chunk.feat(grid).is_strong_wall()
}

/// At least two corridor neighbours and walls on both sides of one axis
pub fn possible_doorway(chunk: &Chunk, grid: Loc) -> bool {
    if next_to_corr(chunk, grid) < 2 {
        return false;
    }
    (is_strong_wall(chunk, grid + DIR_N) && is_strong_wall(chunk, grid + DIR_S))
        || (is_strong_wall(chunk, grid + DIR_W) && is_strong_wall(chunk, grid + DIR_E))
}

/// Three corridor neighbours and one wall
///
/// Returns the grid opposite the wall, where the other half of a wide
/// doorway would be.
pub fn possible_wide_doorway(chunk: &Chunk, grid: Loc) -> Option<Loc> {
    if next_to_corr(chunk, grid) != 3 {
        return None;
    }
    [(DIR_N, DIR_S), (DIR_S, DIR_N), (DIR_W, DIR_E), (DIR_E, DIR_W)]
        .into_iter()
        .find(|&(wall, _)| is_strong_wall(chunk, grid + wall))
        .map(|(_, across)| grid + across)
}

/// Both halves of a wide doorway, if they face each other
fn wide_doorway_pair(chunk: &Chunk, grid: Loc) -> Option<Loc> {
    let other = possible_wide_doorway(chunk, grid)?;
    (possible_wide_doorway(chunk, other) == Some(grid)).then_some(other)
}

/// Maybe put a door or a trap at `grid`
///
/// With `jct`% a door is placed, otherwise with `jct`/500 a trap. Wide mode
/// also accepts two facing grids of a two-wide corridor and treats them as
/// one doorway. Returns whether anything was placed.
pub fn try_door(chunk: &mut Chunk, rng: &mut GameRng, grid: Loc, jct: i32, wide: bool) -> bool {
    assert!(chunk.in_bounds(grid));
    let cell = *chunk.cell(grid);
    if cell.feat.is_strong_wall() || cell.is_room() || cell.has(SquareFlags::TRAP) || cell.feat.is_door() {
        return false;
    }

    if rng.percent(jct) {
        if possible_doorway(chunk, grid) {
            place_random_door(chunk, rng, grid);
            return true;
        }
        if wide && let Some(other) = wide_doorway_pair(chunk, grid) {
            place_random_door(chunk, rng, grid);
            chunk.set_feat(other, chunk.feat(grid));
            return true;
        }
    } else if rng.chance(jct, 500) {
        if possible_doorway(chunk, grid) {
            chunk.add_info(grid, SquareFlags::TRAP);
            return true;
        }
        if wide && let Some(other) = wide_doorway_pair(chunk, grid) {
            chunk.add_info(grid, SquareFlags::TRAP);
            chunk.add_info(other, SquareFlags::TRAP);
            return true;
        }
    }
    false
}

/// Try the four orthogonal neighbours of every door candidate
///
/// Returns how many doors or traps were placed.
pub fn place_junction_doors(chunk: &mut Chunk, rng: &mut GameRng, candidates: &[Loc], jct: i32, wide: bool) -> usize {
    let mut placed = 0;
    for &candidate in candidates {
        for offset in [DIR_W, DIR_E, DIR_N, DIR_S] {
            if try_door(chunk, rng, candidate + offset, jct, wide) {
                placed += 1;
            }
        }
    }
    placed
}
