//! Cellular-automaton caverns

use tracing::{debug, warn};

use crate::config::CavernParams;
use crate::error::GenError;
use crate::rng::GameRng;

use super::{Chunk, DDGRID_DDD, Feature, Loc, Regions, SquareFlags};

/// A cavern that met its floor minimum
#[derive(Debug, Clone)]
pub struct CavernOutcome {
    pub chunk: Chunk,
    /// Attempts used, counting the successful one
    pub tries: u32,
    pub density: i32,
    pub passes: i32,
    /// Regions filled in for being too small
    pub pruned: usize,
    /// Regions joined to the rest
    pub joined: usize,
}

/// Fill the chunk with solid granite, then open `density`% of it at random
/// interior grids
pub fn init_cavern(chunk: &mut Chunk, rng: &mut GameRng, density: i32) {
    let (h, w) = (chunk.height(), chunk.width());
    let interior = ((h - 2) * (w - 2)).max(0);
    let mut count = (chunk.area() * density / 100).min(interior);

    chunk.fill_rectangle(Loc::new(0, 0), Loc::new(w - 1, h - 1), Feature::Granite, SquareFlags::WALL_SOLID);

    while count > 0 {
        let grid = Loc::new(rng.randint1(w - 2), rng.randint1(h - 2));
        if chunk.is_rock(grid) {
            chunk.set_feat(grid, Feature::Floor);
            count -= 1;
        }
    }
}

/// Non-floor grids among the eight neighbours
pub fn count_adj_walls(chunk: &Chunk, grid: Loc) -> usize {
    DDGRID_DDD
        .iter()
        .filter(|&&offset| !chunk.is_floor(grid + offset))
        .count()
}

/// One smoothing pass over the interior
///
/// More than five walls around a grid make it wall, fewer than four make it
/// floor. Every grid is judged on the previous generation.
pub fn mutate_cavern(chunk: &mut Chunk) {
    let current: &Chunk = chunk;
    let next: Vec<(Loc, Option<Feature>)> = current
        .interior_locs()
        .map(|grid| {
            let walls = count_adj_walls(current, grid);
            let feat = if walls > 5 {
                Some(Feature::Granite)
            } else if walls < 4 {
                Some(Feature::Floor)
            } else {
                None
            };
            (grid, feat)
        })
        .collect();

    for (grid, feat) in next {
        match feat {
            Some(Feature::Granite) => chunk.set_marked_granite(grid, SquareFlags::WALL_SOLID),
            Some(feat) => chunk.set_feat(grid, feat),
            None => {}
        }
    }
}

/// Grow a cavern of `h` by `w`
///
/// Density and pass count are rolled once and reused for every try. A try
/// is kept when the floor still covers `area / floor_divisor` after small
/// regions are filled in and the rest are joined.
pub fn cavern_chunk(rng: &mut GameRng, h: i32, w: i32, params: &CavernParams) -> Result<CavernOutcome, GenError> {
    if h < 3 || w < 3 {
        return Err(GenError::ChunkTooSmall { height: h, width: w });
    }

    let limit = (h * w / params.floor_divisor.max(1)) as u32;
    let density = rng.range(params.density_min, params.density_max);
    let passes = rng.range(params.passes_min, params.passes_max);
    let mut chunk = Chunk::new(h, w);

    for tries in 1..=params.max_tries {
        init_cavern(&mut chunk, rng, density);
        for _ in 0..passes {
            mutate_cavern(&mut chunk);
        }
        let floors = chunk.feat_count(Feature::Floor);
        if floors < limit {
            debug!(tries, floors, limit, "cavern too sparse, reseeding");
            continue;
        }

        let mut regions = Regions::build(&chunk, false);
        let pruned = regions.clear_small_regions(&mut chunk, params.min_region);
        let joined = regions.join_regions(&mut chunk);
        let floors = chunk.feat_count(Feature::Floor);
        if floors < limit {
            debug!(tries, floors, limit, "cavern too sparse after pruning, reseeding");
            continue;
        }

        debug!(h, w, tries, density, passes, floors, pruned, joined, "cavern built");
        return Ok(CavernOutcome {
            chunk,
            tries,
            density,
            passes,
            pruned,
            joined,
        });
    }

    warn!(h, w, tries = params.max_tries, density, passes, "cavern generation gave up");
    Err(GenError::CavernTooSparse { tries: params.max_tries })
}
