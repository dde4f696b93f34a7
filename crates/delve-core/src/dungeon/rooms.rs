//! Room shapes and the builder registry
//!
//! A room builder asks its `RoomSite` for space, then carves its own
//! footprint. Every built-in shape marks the whole footprint ROOM, may light
//! it, and surrounds the floor with WALL_OUTER granite so tunnels know where
//! they may pierce.

use hashbrown::HashMap;

use super::{Feature, Loc, RoomSite, SquareFlags};

/// A pluggable room shape
pub trait RoomBuilder: Send + Sync {
    /// Carve the room; returns false when it could not be placed
    fn build(&self, site: &mut RoomSite<'_>) -> bool;
}

/// Room builders by name
pub struct RoomRegistry {
    builders: HashMap<String, Box<dyn RoomBuilder>>,
}

impl RoomRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registry holding `simple`, `overlap`, `circular` and `moria`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("simple", Box::new(SimpleRoom));
        registry.register("overlap", Box::new(OverlapRoom));
        registry.register("circular", Box::new(CircularRoom));
        registry.register("moria", Box::new(MoriaRoom));
        registry
    }

    /// Add or replace a builder
    pub fn register(&mut self, name: &str, builder: Box<dyn RoomBuilder>) {
        self.builders.insert(name.to_string(), builder);
    }

    pub fn get(&self, name: &str) -> Option<&dyn RoomBuilder> {
        self.builders.get(name).map(|b| b.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RoomRegistry").field("builders", &names).finish()
    }
}

fn room_flags(light: bool) -> SquareFlags {
    if light {
        SquareFlags::ROOM | SquareFlags::GLOW
    } else {
        SquareFlags::ROOM
    }
}

/// Carve a walled rectangle with floor `top_left..=bottom_right`
fn carve_box(site: &mut RoomSite<'_>, top_left: Loc, bottom_right: Loc, light: bool) {
    let wall_tl = Loc::new(top_left.x - 1, top_left.y - 1);
    let wall_br = Loc::new(bottom_right.x + 1, bottom_right.y + 1);
    site.chunk.generate_room(wall_tl, wall_br, light);
    site.chunk.draw_rectangle(wall_tl, wall_br, Feature::Granite, SquareFlags::WALL_OUTER);
    site.chunk.fill_rectangle(top_left, bottom_right, Feature::Floor, SquareFlags::empty());
}

/// Plain rectangle, occasionally pillared or with a ragged inner edge
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleRoom;

impl RoomBuilder for SimpleRoom {
    fn build(&self, site: &mut RoomSite<'_>) -> bool {
        let height = 1 + site.rng.randint1(4) + site.rng.randint1(3);
        let width = 1 + site.rng.randint1(11) + site.rng.randint1(11);

        let Some(centre) = site.find_space(height + 2, width + 2) else {
            return false;
        };
        let light = site.light();

        let y1 = centre.y - height / 2;
        let x1 = centre.x - width / 2;
        let y2 = y1 + height - 1;
        let x2 = x1 + width - 1;
        carve_box(site, Loc::new(x1, y1), Loc::new(x2, y2), light);

        if site.rng.one_in(20) {
            for y in (y1..=y2).step_by(2) {
                for x in (x1..=x2).step_by(2) {
                    site.chunk.set_marked_granite(Loc::new(x, y), SquareFlags::WALL_INNER);
                }
            }
        } else if site.rng.one_in(50) {
            for y in (y1 + 2..=y2 - 2).step_by(2) {
                site.chunk.set_marked_granite(Loc::new(x1, y), SquareFlags::WALL_INNER);
                site.chunk.set_marked_granite(Loc::new(x2, y), SquareFlags::WALL_INNER);
            }
            for x in (x1 + 2..=x2 - 2).step_by(2) {
                site.chunk.set_marked_granite(Loc::new(x, y1), SquareFlags::WALL_INNER);
                site.chunk.set_marked_granite(Loc::new(x, y2), SquareFlags::WALL_INNER);
            }
        }
        true
    }
}

/// Two overlapping rectangles sharing a centre
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapRoom;

impl RoomBuilder for OverlapRoom {
    fn build(&self, site: &mut RoomSite<'_>) -> bool {
        // extents from the centre: up, left, down, right
        let a = [
            site.rng.randint1(4),
            site.rng.randint1(11),
            site.rng.randint1(3),
            site.rng.randint1(10),
        ];
        let b = [
            site.rng.randint1(3),
            site.rng.randint1(10),
            site.rng.randint1(4),
            site.rng.randint1(11),
        ];
        let height = 2 * a[0].max(a[2]).max(b[0]).max(b[2]) + 1;
        let width = 2 * a[1].max(a[3]).max(b[1]).max(b[3]) + 1;

        let Some(centre) = site.find_space(height + 2, width + 2) else {
            return false;
        };
        let light = site.light();

        let rects = [a, b].map(|[up, left, down, right]| {
            (
                Loc::new(centre.x - left, centre.y - up),
                Loc::new(centre.x + right, centre.y + down),
            )
        });

        // both walls before either floor, so the floors cut through the walls
        for (tl, br) in rects {
            let wall_tl = Loc::new(tl.x - 1, tl.y - 1);
            let wall_br = Loc::new(br.x + 1, br.y + 1);
            site.chunk.generate_room(wall_tl, wall_br, light);
            site.chunk.draw_rectangle(wall_tl, wall_br, Feature::Granite, SquareFlags::WALL_OUTER);
        }
        for (tl, br) in rects {
            site.chunk.fill_rectangle(tl, br, Feature::Floor, SquareFlags::empty());
        }
        true
    }
}

/// Approximate Euclidean distance used for round rooms
fn distance(a: Loc, b: Loc) -> i32 {
    let dy = (a.y - b.y).abs();
    let dx = (a.x - b.x).abs();
    if dy > dx { dy + (dx >> 1) } else { dx + (dy >> 1) }
}

/// A disc of floor with a one-grid wall
#[derive(Debug, Clone, Copy, Default)]
pub struct CircularRoom;

impl RoomBuilder for CircularRoom {
    fn build(&self, site: &mut RoomSite<'_>) -> bool {
        let radius = 2 + site.rng.randint1(2) + site.rng.randint1(3);
        let extent = 2 * radius + 3;

        let Some(centre) = site.find_space(extent, extent) else {
            return false;
        };
        let flags = room_flags(site.light());

        let mut floors = Vec::new();
        for y in centre.y - radius..=centre.y + radius {
            for x in centre.x - radius..=centre.x + radius {
                let grid = Loc::new(x, y);
                if distance(centre, grid) <= radius {
                    site.chunk.set_feat(grid, Feature::Floor);
                    site.chunk.add_info(grid, flags);
                    floors.push(grid);
                }
            }
        }
        wall_in(site, &floors, flags);
        true
    }
}

/// Surround an irregular floor with outer wall
fn wall_in(site: &mut RoomSite<'_>, floors: &[Loc], flags: SquareFlags) {
    for &grid in floors {
        for offset in super::DDGRID_DDD {
            let wall = grid + offset;
            if site.chunk.is_floor(wall) {
                continue;
            }
            site.chunk.set_marked_granite(wall, SquareFlags::WALL_OUTER);
            site.chunk.add_info(wall, flags);
        }
    }
}

/// Half the width of an oval with radii `rx`, `ry` at `dy` rows from its centre
fn oval_half_width(rx: i32, ry: i32, dy: i32) -> i32 {
    let t = f64::from(dy) / f64::from(ry);
    (f64::from(rx) * (1.0 - t * t).max(0.0).sqrt()).round() as i32
}

/// A large oval whose rows are each cut a little short or long on either end
///
/// Every row keeps the centre column, so the floor is always one piece.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoriaRoom;

impl RoomBuilder for MoriaRoom {
    fn build(&self, site: &mut RoomSite<'_>) -> bool {
        let ry = 3 + site.rng.randint1(3);
        let rx = 2 * ry + site.rng.randint1(6);

        // a row may overhang the oval by one grid, then the wall
        let Some(centre) = site.find_space(2 * ry + 3, 2 * rx + 5) else {
            return false;
        };
        let flags = room_flags(site.light());

        let mut floors = Vec::new();
        for dy in -ry..=ry {
            let half = oval_half_width(rx, ry, dy);
            let west = (half + site.rng.randint0(3) - 1).max(1);
            let east = (half + site.rng.randint0(3) - 1).max(1);
            let y = centre.y + dy;
            for x in centre.x - west..=centre.x + east {
                let grid = Loc::new(x, y);
                site.chunk.set_feat(grid, Feature::Floor);
                site.chunk.add_info(grid, flags);
                floors.push(grid);
            }
        }
        wall_in(site, &floors, flags);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::{BlockGrid, Chunk, is_fully_connected};
    use crate::rng::GameRng;

    struct Refuse;

    impl RoomBuilder for Refuse {
        fn build(&self, _site: &mut RoomSite<'_>) -> bool {
            false
        }
    }

    /// Build one room on an empty chunk, returning its centre
    fn build_one(builder: &dyn RoomBuilder, seed: u64) -> (Chunk, Option<Loc>) {
        let mut chunk = Chunk::new(40, 80);
        let mut rng = GameRng::new(seed);
        let mut blocks = BlockGrid::new(&chunk, 1);
        let mut centres = Vec::new();
        let mut site = RoomSite::new(&mut chunk, &mut rng, &mut blocks, &mut centres, 10, None);
        let built = builder.build(&mut site);
        assert_eq!(built, !centres.is_empty());
        let centre = centres.first().copied();
        (chunk, centre)
    }

    /// Every floor grid of a room is surrounded by floor, room wall, or
    /// inner pillars
    fn assert_enclosed(chunk: &Chunk) {
        for grid in chunk.interior_locs() {
            if !chunk.is_floor(grid) {
                continue;
            }
            assert!(chunk.is_room(grid), "floor {grid:?} outside the room");
            for offset in crate::dungeon::DDGRID_DDD {
                let next = grid + offset;
                let cell = chunk.cell(next);
                assert!(
                    cell.feat.is_floor() || cell.has(SquareFlags::WALL_OUTER) || cell.has(SquareFlags::WALL_INNER),
                    "floor {grid:?} leaks into {next:?}"
                );
            }
        }
    }

    #[test]
    fn test_default_registry() {
        let registry = RoomRegistry::with_defaults();
        assert_eq!(registry.len(), 4);
        for name in ["simple", "overlap", "circular", "moria"] {
            assert!(registry.contains(name));
        }
        assert!(registry.get("vault").is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = RoomRegistry::with_defaults();
        registry.register("simple", Box::new(Refuse));
        assert_eq!(registry.len(), 4);
        let (chunk, centre) = build_one(registry.get("simple").unwrap(), 1);
        assert!(centre.is_none());
        assert_eq!(chunk.feat_count(Feature::Floor), 0);
    }

    #[test]
    fn test_simple_room_shape() {
        for seed in 0..20 {
            let (chunk, centre) = build_one(&SimpleRoom, seed);
            let centre = centre.expect("empty chunk has space");
            assert!(chunk.is_room(centre));
            assert!(chunk.feat_count(Feature::Floor) >= 4);
            assert_enclosed(&chunk);
        }
    }

    #[test]
    fn test_overlap_room_shape() {
        for seed in 0..20 {
            let (chunk, centre) = build_one(&OverlapRoom, seed);
            let centre = centre.expect("empty chunk has space");
            assert!(chunk.is_floor(centre));
            assert_enclosed(&chunk);
        }
    }

    #[test]
    fn test_circular_room_shape() {
        for seed in 0..20 {
            let (chunk, centre) = build_one(&CircularRoom, seed);
            let centre = centre.expect("empty chunk has space");
            assert!(chunk.is_floor(centre));
            assert_enclosed(&chunk);
        }
    }

    #[test]
    fn test_moria_room_shape() {
        for seed in 0..20 {
            let (chunk, centre) = build_one(&MoriaRoom, seed);
            let centre = centre.expect("empty chunk has space");
            assert!(chunk.is_floor(centre));
            assert_enclosed(&chunk);
            // at least nine rows of at least three grids
            assert!(chunk.feat_count(Feature::Floor) >= 27);
            for grid in chunk.locs().filter(|&g| chunk.cell(g).has(SquareFlags::WALL_OUTER)) {
                assert!(chunk.is_room(grid), "wall {grid:?} outside the room");
            }
            let floors: Vec<Loc> = chunk.locs().filter(|&g| chunk.is_floor(g)).collect();
            assert!(floors.iter().all(|g| (g.y - centre.y).abs() <= 6));
            assert!(is_fully_connected(&chunk));
        }
    }

    #[test]
    fn test_oval_half_width() {
        assert_eq!(oval_half_width(10, 5, 0), 10);
        assert_eq!(oval_half_width(10, 5, 5), 0);
        assert_eq!(oval_half_width(10, 5, 3), 8);
        assert_eq!(oval_half_width(10, 5, -3), 8);
    }

    #[test]
    fn test_distance_approximation() {
        let origin = Loc::new(0, 0);
        assert_eq!(distance(origin, Loc::new(4, 0)), 4);
        assert_eq!(distance(origin, Loc::new(4, 3)), 5);
        assert_eq!(distance(origin, Loc::new(1, 5)), 5);
    }
}
