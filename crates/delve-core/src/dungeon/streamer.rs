//! Mineral veins and rivers
//!
//! Streamers are injected after connectivity is settled. They only ever
//! convert rock, so open space and the boundary ring are left alone.

use tracing::trace;

use crate::config::{RiverParams, StreamerParams};
use crate::rng::GameRng;

use super::{Chunk, DDGRID_DDD, Feature, Loc};

/// Picks made by `find_nearby_grid` before it gives up
const NEARBY_ATTEMPTS: u32 = 100;

/// A random grid within `yd` rows and `xd` columns of `centre`, strictly
/// inside the chunk
pub fn find_nearby_grid(chunk: &Chunk, rng: &mut GameRng, centre: Loc, yd: i32, xd: i32) -> Option<Loc> {
    for _ in 0..NEARBY_ATTEMPTS {
        let grid = Loc::new(rng.spread(centre.x, xd), rng.spread(centre.y, yd));
        if chunk.in_bounds_fully(grid) {
            return Some(grid);
        }
    }
    None
}

/// Carve one vein of `feat` across the chunk
///
/// The vein starts near the centre and walks in one of the eight compass
/// directions until it leaves the chunk. Each step converts up to
/// `params.den` rock grids within `params.rng` of the frontier. One in
/// `chance` converted grids is upgraded to its treasure variant when the
/// feature has one; a `chance` of zero disables treasure.
///
/// Returns the number of grids converted.
pub fn build_streamer(
    chunk: &mut Chunk,
    rng: &mut GameRng,
    feat: Feature,
    params: &StreamerParams,
    chance: i32,
) -> usize {
    let mut grid = Loc::new(
        rng.spread(chunk.width() / 2, 15),
        rng.spread(chunk.height() / 2, 10),
    );
    let dir = DDGRID_DDD[rng.randint0(8) as usize];
    let mut converted = 0;

    while chunk.in_bounds(grid) {
        for _ in 0..params.den {
            let Some(change) = find_nearby_grid(chunk, rng, grid, params.rng, params.rng) else {
                continue;
            };
            if !chunk.is_rock(change) {
                continue;
            }
            let mut vein = feat;
            if chance > 0 && rng.one_in(chance) {
                vein = feat.with_treasure().unwrap_or(feat);
            }
            chunk.set_feat(change, vein);
            converted += 1;
        }
        grid = grid + dir;
    }

    trace!(?feat, converted, "streamer placed");
    converted
}

/// Lava, water and sand veins allowed by `rivers`
///
/// Nothing is placed on the surface level. Each enabled kind gets three to
/// five candidate veins, each built with a one in three chance.
pub fn add_river_streamers(
    chunk: &mut Chunk,
    rng: &mut GameRng,
    rivers: &RiverParams,
    params: &StreamerParams,
) -> usize {
    if chunk.depth() == 0 {
        return 0;
    }

    let kinds = [
        (rivers.lava, Feature::Lava),
        (rivers.water, Feature::Water),
        (rivers.sand, Feature::Sandwall),
    ];
    let mut converted = 0;
    for (enabled, feat) in kinds {
        if !enabled {
            continue;
        }
        let max = 3 + rng.randint0(3);
        for _ in 0..max {
            if rng.one_in(3) {
                converted += build_streamer(chunk, rng, feat, params, 0);
            }
        }
    }
    converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::SquareFlags;

    fn sealed(height: i32, width: i32) -> Chunk {
        let mut chunk = Chunk::new(height, width);
        chunk.seal_boundary();
        chunk
    }

    #[test]
    fn test_nearby_grid_stays_inside() {
        let chunk = Chunk::new(10, 10);
        let mut rng = GameRng::new(5);
        for _ in 0..500 {
            let grid = find_nearby_grid(&chunk, &mut rng, Loc::new(0, 0), 2, 2)
                .expect("corner has interior neighbours");
            assert!(chunk.in_bounds_fully(grid));
            assert!(grid.x <= 2 && grid.y <= 2);
        }
    }

    #[test]
    fn test_streamer_only_converts_rock() {
        let mut chunk = sealed(40, 80);
        chunk.fill_rectangle(Loc::new(10, 10), Loc::new(69, 29), Feature::Floor, SquareFlags::ROOM);
        let floors = chunk.feat_count(Feature::Floor);
        let perms = chunk.feat_count(Feature::Permanent);

        let mut rng = GameRng::new(11);
        let params = StreamerParams::default();
        for _ in 0..5 {
            build_streamer(&mut chunk, &mut rng, Feature::Magma, &params, params.mc);
        }

        assert_eq!(chunk.feat_count(Feature::Floor), floors);
        assert_eq!(chunk.feat_count(Feature::Permanent), perms);
        let veins = chunk.feat_count(Feature::Magma) + chunk.feat_count(Feature::MagmaTreasure);
        assert!(veins > 0);
    }

    #[test]
    fn test_streamer_count_matches_chunk() {
        let mut chunk = sealed(30, 60);
        let mut rng = GameRng::new(3);
        let params = StreamerParams::default();
        let converted = build_streamer(&mut chunk, &mut rng, Feature::Quartz, &params, 0);
        // converted grids may be hit twice, so the census can only be smaller
        let quartz = chunk.feat_count(Feature::Quartz) as usize;
        assert!(quartz <= converted);
        assert_eq!(chunk.feat_count(Feature::QuartzTreasure), 0);
    }

    #[test]
    fn test_rivers_skip_surface() {
        let mut chunk = sealed(30, 60);
        let mut rng = GameRng::new(1);
        let rivers = RiverParams { lava: true, water: true, sand: true };
        let converted = add_river_streamers(&mut chunk, &mut rng, &rivers, &StreamerParams::default());
        assert_eq!(converted, 0);
        assert_eq!(chunk.feat_count(Feature::Lava), 0);
    }

    #[test]
    fn test_rivers_follow_switches() {
        let mut chunk = sealed(40, 100);
        chunk.wpos.depth = 20;
        let rivers = RiverParams { lava: false, water: true, sand: false };
        let params = StreamerParams::default();
        for seed in 0..10 {
            let mut rng = GameRng::new(seed);
            add_river_streamers(&mut chunk, &mut rng, &rivers, &params);
        }
        assert_eq!(chunk.feat_count(Feature::Lava), 0);
        assert_eq!(chunk.feat_count(Feature::Sandwall), 0);
        assert!(chunk.feat_count(Feature::Water) > 0);
    }
}
