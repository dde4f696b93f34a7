//! Tunnel carving between two grids
//!
//! A tunnel walks from one grid toward another, bending at random. Plain rock
//! is carved, room outer walls are pierced, rooms are crossed without
//! carving, and existing corridors are recorded as door candidates.
//!
//! Piercing an outer wall turns every outer wall next to it into solid wall,
//! so no two openings are ever adjacent and a corridor cannot chop the corner
//! off a room.
//!
//! Carving and piercing are deferred until the walk ends. The recorded grids
//! are kept in capped buffers and anything past a cap is dropped and counted.

use tracing::trace;

use crate::config::{Limits, TunnelParams};
use crate::rng::GameRng;

use super::{Chunk, DDGRID_DDD, Feature, Loc, SquareFlags, place_random_door};

/// Run length after which wide tunnels may leave a stair hole
const HOLE_RUN_LENGTH: i32 = 10;

/// Distance from the start past which a tunnel may stop at a junction
const EARLY_STOP_DISTANCE: i32 = 10;

/// Unit step toward `to`, never diagonal
///
/// When both axes differ, one of them is dropped at random.
pub fn correct_dir(rng: &mut GameRng, from: Loc, to: Loc) -> Loc {
    let mut offset = Loc::new((to.x - from.x).signum(), (to.y - from.y).signum());
    if offset.x != 0 && offset.y != 0 {
        if rng.percent(50) {
            offset.y = 0;
        } else {
            offset.x = 0;
        }
    }
    offset
}

/// A random cardinal step
pub fn rand_dir(rng: &mut GameRng) -> Loc {
    DDGRID_DDD[rng.randint0(4) as usize]
}

/// An opening made in a room's outer wall
///
/// Wide openings have a `partner` grid beside `at`; the two together count
/// as one opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piercing {
    pub at: Loc,
    pub partner: Option<Loc>,
}

impl Piercing {
    pub fn grids(&self) -> impl Iterator<Item = Loc> + use<> {
        core::iter::once(self.at).chain(self.partner)
    }
}

/// What a single tunnel did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TunnelOutcome {
    /// Grids turned into corridor floor
    pub carved: Vec<Loc>,
    /// Carved grids flagged as stair holes
    pub holes: Vec<Loc>,
    /// Openings made in room walls
    pub piercings: Vec<Piercing>,
    /// Door candidates this tunnel added
    pub doors_recorded: usize,
    /// Iterations used
    pub steps: u32,
    /// Whether the target was reached
    pub reached: bool,
    /// Stopped at a junction before reaching the target
    pub stopped_early: bool,
    /// Hit the iteration cap
    pub gave_up: bool,
    pub dropped_grids: usize,
    pub dropped_piercings: usize,
    pub dropped_doors: usize,
}

/// Digs tunnels for one level
///
/// Door candidates accumulate across every tunnel of the level and are
/// handed to door placement afterwards.
#[derive(Debug, Clone)]
pub struct TunnelCarver {
    params: TunnelParams,
    limits: Limits,
    wide: bool,
    doors: Vec<Loc>,
}

impl TunnelCarver {
    /// `turn_based` selects single-width tunnels and openings
    pub fn new(params: TunnelParams, limits: Limits, turn_based: bool) -> Self {
        Self {
            params,
            limits,
            wide: !turn_based,
            doors: Vec::new(),
        }
    }

    pub fn is_wide(&self) -> bool {
        self.wide
    }

    /// Door candidates recorded so far
    pub fn door_candidates(&self) -> &[Loc] {
        &self.doors
    }

    pub fn into_door_candidates(self) -> Vec<Loc> {
        self.doors
    }

    fn record_door(&mut self, grid: Loc, out: &mut TunnelOutcome) {
        if self.doors.len() < self.limits.door_max {
            self.doors.push(grid);
            out.doors_recorded += 1;
        } else {
            out.dropped_doors += 1;
        }
    }

    /// Dig a tunnel from `first` toward `second`
    pub fn build_tunnel(&mut self, chunk: &mut Chunk, rng: &mut GameRng, first: Loc, second: Loc) -> TunnelOutcome {
        assert!(
            chunk.in_bounds(first) && chunk.in_bounds(second),
            "tunnel endpoints {first:?} -> {second:?} out of bounds"
        );

        let mut out = TunnelOutcome::default();
        let mut tunnel: Vec<(Loc, bool)> = Vec::new();
        let mut wall_entries = 0;
        let entries_per_piercing = if self.wide { 2 } else { 1 };

        let start = first;
        let mut grid1 = first;
        let mut offset = correct_dir(rng, grid1, second);
        let mut cur_offset = offset;
        let mut sign = 1;
        let mut length = 0;
        let mut door_flag = false;

        'dig: while grid1 != second {
            if out.steps >= self.limits.tunnel_step_max {
                out.gave_up = true;
                break;
            }
            out.steps += 1;

            if rng.percent(self.params.chg) {
                offset = correct_dir(rng, grid1, second);
                if rng.percent(self.params.rnd) {
                    offset = rand_dir(rng);
                }
            }

            let mut tmp = grid1 + offset;
            while !chunk.in_bounds(tmp) {
                if out.steps >= self.limits.tunnel_step_max {
                    out.gave_up = true;
                    break 'dig;
                }
                out.steps += 1;
                offset = correct_dir(rng, grid1, second);
                if rng.percent(self.params.rnd) {
                    offset = rand_dir(rng);
                }
                tmp = grid1 + offset;
            }

            if offset == cur_offset {
                length += 1;
            } else {
                cur_offset = offset;
                length = 0;
            }

            let cell = *chunk.cell(tmp);
            if cell.is_perm_outer() || cell.is_granite_with(SquareFlags::WALL_SOLID) {
                continue;
            }

            if cell.is_granite_with(SquareFlags::WALL_OUTER) {
                if !pierce_outer_locate(chunk, tmp, offset) {
                    continue;
                }
                grid1 = tmp;

                let mut partner = None;
                if self.wide {
                    if pierce_outer_wide(chunk, grid1, offset, sign) {
                        partner = Some(grid1.lateral(offset, sign));
                    } else if pierce_outer_wide(chunk, grid1, offset, -sign) {
                        sign = -sign;
                        partner = Some(grid1.lateral(offset, sign));
                    }
                }

                forbid_adjacent_piercings(chunk, grid1);
                if let Some(partner) = partner {
                    forbid_adjacent_piercings(chunk, partner);
                }

                if wall_entries + entries_per_piercing <= self.limits.wall_pierce_max {
                    wall_entries += entries_per_piercing;
                    out.piercings.push(Piercing { at: grid1, partner });
                } else {
                    out.dropped_piercings += 1;
                }
            } else if cell.is_room() {
                grid1 = tmp;
            } else if cell.feat.is_rock() {
                grid1 = tmp;
                let max = self.limits.tunnel_grid_max;

                if tunnel.len() < max {
                    tunnel.push((grid1, false));
                } else {
                    out.dropped_grids += 1;
                }

                if self.wide && possible_wide_tunnel(chunk, grid1, offset, sign) {
                    let next = grid1.lateral(offset, sign);
                    if tunnel.len() < max {
                        tunnel.push((next, false));
                    } else {
                        out.dropped_grids += 1;
                    }

                    if length >= HOLE_RUN_LENGTH && rng.one_in(20) && possible_wide_tunnel(chunk, next, offset, sign) {
                        if tunnel.len() < max {
                            tunnel.push((next.lateral(offset, sign), true));
                            length = 0;
                        } else {
                            out.dropped_grids += 1;
                        }
                    }
                }

                door_flag = false;
            } else {
                grid1 = tmp;

                if !door_flag {
                    self.record_door(grid1, &mut out);
                    if self.wide {
                        let next = grid1.lateral(offset, sign);
                        if chunk.in_bounds_fully(next) {
                            self.record_door(next, &mut out);
                        }
                    }
                    door_flag = true;
                }

                if !rng.percent(self.params.con) {
                    let travelled = grid1 - start;
                    if travelled.x.abs() > EARLY_STOP_DISTANCE || travelled.y.abs() > EARLY_STOP_DISTANCE {
                        out.stopped_early = true;
                        break;
                    }
                }
            }
        }

        out.reached = grid1 == second;

        for &(grid, hole) in &tunnel {
            chunk.set_feat(grid, Feature::Floor);
            if hole {
                chunk.add_info(grid, SquareFlags::STAIRS);
                out.holes.push(grid);
            }
            out.carved.push(grid);
        }

        for piercing in &out.piercings {
            for grid in piercing.grids() {
                chunk.set_feat(grid, Feature::Floor);
            }
            if rng.percent(self.params.pen) {
                place_random_door(chunk, rng, piercing.at);
                if let Some(partner) = piercing.partner {
                    chunk.set_feat(partner, chunk.feat(piercing.at));
                }
            }
        }

        trace!(
            ?first,
            ?second,
            steps = out.steps,
            carved = out.carved.len(),
            piercings = out.piercings.len(),
            reached = out.reached,
            "tunnel dug"
        );
        out
    }
}

/// The grid beyond an outer wall in the direction of travel must be enterable
fn pierce_outer_locate(chunk: &Chunk, wall: Loc, offset: Loc) -> bool {
    let grid = wall + offset;
    if !chunk.in_bounds(grid) {
        return false;
    }
    let cell = chunk.cell(grid);
    !(cell.is_perm_outer()
        || cell.is_granite_with(SquareFlags::WALL_OUTER)
        || cell.is_granite_with(SquareFlags::WALL_SOLID))
}

/// Turn every outer wall around a piercing into solid wall
fn forbid_adjacent_piercings(chunk: &mut Chunk, grid: Loc) {
    for y in grid.y - 1..=grid.y + 1 {
        for x in grid.x - 1..=grid.x + 1 {
            let near = Loc::new(x, y);
            if chunk.in_bounds_fully(near) && chunk.cell(near).is_granite_with(SquareFlags::WALL_OUTER) {
                chunk.set_marked_granite(near, SquareFlags::WALL_SOLID);
            }
        }
    }
}

/// Whether the outer wall beside a piercing can be opened too
///
/// The lateral grid must be outer wall, the grid past it must still belong
/// to the room (so corners are never cut), and it must be enterable from the
/// direction of travel.
fn pierce_outer_wide(chunk: &Chunk, grid1: Loc, offset: Loc, sign: i32) -> bool {
    let grid = grid1.lateral(offset, sign);
    if !chunk.in_bounds_fully(grid) {
        return false;
    }
    let cell = chunk.cell(grid);
    if cell.is_granite_with(SquareFlags::WALL_SOLID) || !cell.is_granite_with(SquareFlags::WALL_OUTER) {
        return false;
    }

    let next = grid.lateral(offset, sign);
    if !chunk.in_bounds_fully(next) || !chunk.is_room(next) {
        return false;
    }

    pierce_outer_locate(chunk, grid, offset)
}

/// Whether the rock beside a carved grid can be carved to widen the tunnel
fn possible_wide_tunnel(chunk: &Chunk, grid1: Loc, offset: Loc, sign: i32) -> bool {
    let grid = grid1.lateral(offset, sign);
    if !chunk.in_bounds_fully(grid) {
        return false;
    }
    let cell = chunk.cell(grid);
    cell.feat.is_rock()
        && !cell.is_granite_with(SquareFlags::WALL_OUTER)
        && !cell.is_granite_with(SquareFlags::WALL_SOLID)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed(height: i32, width: i32) -> Chunk {
        let mut chunk = Chunk::new(height, width);
        chunk.seal_boundary();
        chunk
    }

    /// Floor surrounded by an outer wall, like a built room
    fn add_room(chunk: &mut Chunk, top_left: Loc, bottom_right: Loc) {
        let wall_tl = Loc::new(top_left.x - 1, top_left.y - 1);
        let wall_br = Loc::new(bottom_right.x + 1, bottom_right.y + 1);
        chunk.generate_room(wall_tl, wall_br, false);
        chunk.draw_rectangle(wall_tl, wall_br, Feature::Granite, SquareFlags::WALL_OUTER);
        chunk.fill_rectangle(top_left, bottom_right, Feature::Floor, SquareFlags::empty());
    }

    fn straight() -> TunnelParams {
        TunnelParams {
            rnd: 0,
            chg: 0,
            con: 100,
            pen: 0,
            jct: 50,
        }
    }

    #[test]
    fn test_correct_dir_never_diagonal() {
        let mut rng = GameRng::new(1);
        for _ in 0..200 {
            let dir = correct_dir(&mut rng, Loc::new(5, 5), Loc::new(9, 1));
            assert!(dir == Loc::new(1, 0) || dir == Loc::new(0, -1), "{dir:?}");
        }
        assert_eq!(correct_dir(&mut rng, Loc::new(5, 5), Loc::new(5, 9)), Loc::new(0, 1));
        assert_eq!(correct_dir(&mut rng, Loc::new(5, 5), Loc::new(2, 5)), Loc::new(-1, 0));
    }

    #[test]
    fn test_rand_dir_cardinal() {
        let mut rng = GameRng::new(2);
        for _ in 0..200 {
            let dir = rand_dir(&mut rng);
            assert_eq!(dir.x.abs() + dir.y.abs(), 1);
        }
    }

    #[test]
    fn test_straight_wide_tunnel() {
        let mut chunk = sealed(30, 60);
        let mut rng = GameRng::new(3);
        let mut carver = TunnelCarver::new(straight(), Limits::default(), false);
        let out = carver.build_tunnel(&mut chunk, &mut rng, Loc::new(5, 15), Loc::new(40, 15));

        assert!(out.reached);
        for x in 6..=40 {
            assert!(chunk.is_floor(Loc::new(x, 15)), "gap at x={x}");
            assert!(chunk.is_floor(Loc::new(x, 16)), "no widening at x={x}");
        }
        assert!(!chunk.is_floor(Loc::new(5, 15)));
        assert!(out.piercings.is_empty());
    }

    #[test]
    fn test_turn_based_tunnel_is_single_width() {
        let mut chunk = sealed(30, 60);
        let mut rng = GameRng::new(3);
        let mut carver = TunnelCarver::new(straight(), Limits::default(), true);
        assert!(!carver.is_wide());
        let out = carver.build_tunnel(&mut chunk, &mut rng, Loc::new(5, 15), Loc::new(40, 15));

        assert!(out.reached);
        assert_eq!(out.carved.len(), 35);
        assert_eq!(chunk.feat_count(Feature::Floor), 35);
    }

    #[test]
    fn test_early_stop_at_junction() {
        let mut chunk = sealed(30, 60);
        chunk.fill_rectangle(Loc::new(20, 1), Loc::new(20, 28), Feature::Floor, SquareFlags::empty());
        let mut rng = GameRng::new(4);
        let params = TunnelParams { con: 0, ..straight() };
        let mut carver = TunnelCarver::new(params, Limits::default(), false);
        let out = carver.build_tunnel(&mut chunk, &mut rng, Loc::new(5, 15), Loc::new(50, 15));

        assert!(out.stopped_early);
        assert!(!out.reached);
        assert_eq!(carver.door_candidates(), &[Loc::new(20, 15), Loc::new(20, 16)]);
        assert!(!chunk.is_floor(Loc::new(21, 15)));
    }

    #[test]
    fn test_step_cap() {
        let mut chunk = sealed(30, 60);
        let mut rng = GameRng::new(5);
        let limits = Limits {
            tunnel_step_max: 5,
            ..Limits::default()
        };
        let mut carver = TunnelCarver::new(TunnelParams::default(), limits, false);
        let out = carver.build_tunnel(&mut chunk, &mut rng, Loc::new(2, 2), Loc::new(57, 27));
        assert!(out.gave_up);
        assert!(out.steps <= 5);
        assert!(!out.reached);
    }

    #[test]
    fn test_grid_buffer_truncates() {
        let mut chunk = sealed(30, 60);
        let mut rng = GameRng::new(6);
        let limits = Limits {
            tunnel_grid_max: 3,
            ..Limits::default()
        };
        let mut carver = TunnelCarver::new(straight(), limits, true);
        let out = carver.build_tunnel(&mut chunk, &mut rng, Loc::new(5, 15), Loc::new(40, 15));
        assert_eq!(out.carved.len(), 3);
        assert_eq!(out.dropped_grids, 32);
        assert_eq!(chunk.feat_count(Feature::Floor), 3);
    }

    #[test]
    fn test_wide_grid_buffer_counts_every_drop() {
        let mut chunk = sealed(30, 60);
        let mut rng = GameRng::new(6);
        let limits = Limits {
            tunnel_grid_max: 4,
            ..Limits::default()
        };
        let mut carver = TunnelCarver::new(straight(), limits, false);
        // seven steps: too short a run for stair holes
        let out = carver.build_tunnel(&mut chunk, &mut rng, Loc::new(5, 15), Loc::new(12, 15));
        assert!(out.reached);
        assert_eq!(out.carved.len(), 4);
        assert_eq!(out.dropped_grids, 10);
        assert_eq!(chunk.feat_count(Feature::Floor), 4);
    }

    #[test]
    fn test_tunnel_never_touches_boundary() {
        for seed in 0..20 {
            let mut chunk = sealed(25, 50);
            let mut rng = GameRng::new(seed);
            let mut carver = TunnelCarver::new(TunnelParams::default(), Limits::default(), false);
            carver.build_tunnel(&mut chunk, &mut rng, Loc::new(1, 1), Loc::new(48, 23));
            assert_eq!(chunk.feat_count(Feature::Permanent), 2 * 50 + 2 * 23);
        }
    }

    #[test]
    fn test_pierces_rooms_with_spaced_openings() {
        for seed in 0..30 {
            let mut chunk = sealed(40, 80);
            add_room(&mut chunk, Loc::new(5, 5), Loc::new(15, 10));
            add_room(&mut chunk, Loc::new(55, 25), Loc::new(70, 32));
            let mut rng = GameRng::new(seed);
            let mut carver = TunnelCarver::new(TunnelParams::default(), Limits::default(), false);
            let out = carver.build_tunnel(&mut chunk, &mut rng, Loc::new(10, 7), Loc::new(62, 28));

            for (i, a) in out.piercings.iter().enumerate() {
                for b in &out.piercings[i + 1..] {
                    for ga in a.grids() {
                        for gb in b.grids() {
                            assert!(ga.chebyshev(gb) >= 2, "seed {seed}: {ga:?} next to {gb:?}");
                        }
                    }
                }
                for grid in a.grids() {
                    assert!(chunk.feat(grid).is_passable(), "seed {seed}: closed piercing {grid:?}");
                }
                if let Some(partner) = a.partner {
                    assert_eq!(a.at.chebyshev(partner), 1);
                    assert_eq!(chunk.feat(a.at), chunk.feat(partner));
                }
            }
        }
    }

    #[test]
    fn test_holes_flagged_beside_long_runs() {
        let mut found = false;
        for seed in 0..20 {
            let mut chunk = sealed(30, 80);
            let mut rng = GameRng::new(seed);
            let mut carver = TunnelCarver::new(straight(), Limits::default(), false);
            let out = carver.build_tunnel(&mut chunk, &mut rng, Loc::new(2, 10), Loc::new(77, 10));
            for hole in &out.holes {
                found = true;
                assert_eq!(hole.y, 12);
                assert!(chunk.info(*hole).contains(SquareFlags::STAIRS));
                assert!(chunk.is_floor(*hole));
            }
        }
        assert!(found, "no stair hole in twenty long tunnels");
    }

    #[test]
    fn test_door_buffer_is_shared_and_capped() {
        let mut chunk = sealed(30, 60);
        chunk.fill_rectangle(Loc::new(20, 1), Loc::new(20, 28), Feature::Floor, SquareFlags::empty());
        chunk.fill_rectangle(Loc::new(30, 1), Loc::new(30, 28), Feature::Floor, SquareFlags::empty());
        let limits = Limits {
            door_max: 3,
            ..Limits::default()
        };
        let mut rng = GameRng::new(9);
        let mut carver = TunnelCarver::new(straight(), limits, false);
        let out = carver.build_tunnel(&mut chunk, &mut rng, Loc::new(5, 15), Loc::new(50, 15));
        assert_eq!(out.doors_recorded, 3);
        assert_eq!(out.dropped_doors, 1);
        assert_eq!(carver.into_door_candidates().len(), 3);
    }
}
