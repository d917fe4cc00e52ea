//! Benchmark profiles for the Cellua engine.
//!
//! - [`life_soup`]: 2D Life on a 128×128 torus seeded at 35% density
//! - [`soup_3d`]: 3D `B5/S45` soup in an unbounded universe
//! - [`seeded`]: any configuration plus a deterministic soup

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use cellua_engine::{EngineConfig, Universe, UniverseConfig};
use cellua_rule::TotalisticRule;
use cellua_space::{BoundaryPolicy, NeighborhoodShape};
use cellua_test_utils::soup;

/// Build `config` and fill the cube `[0, side)^d` with a soup.
pub fn seeded(config: UniverseConfig, side: i64, density_percent: u64, seed: u64) -> Universe {
    let dims = config.dimensions;
    let mut universe = Universe::new(config).unwrap();
    for coord in soup(dims, side, density_percent, seed) {
        universe.set_cell(&coord, 1).unwrap();
    }
    universe
}

/// 2D Life on a 128×128 torus.
pub fn life_soup(seed: u64, engine: EngineConfig) -> Universe {
    let config = UniverseConfig::new(2, Arc::new(TotalisticRule::life()))
        .with_boundaries(vec![BoundaryPolicy::looped(0, 127); 2])
        .with_engine(engine);
    seeded(config, 128, 35, seed)
}

/// 3D `B5/S45` soup in a 24³ cube.
pub fn soup_3d(seed: u64, engine: EngineConfig) -> Universe {
    let rule = TotalisticRule::new(vec![5], vec![4, 5], NeighborhoodShape::moore(1)).unwrap();
    let config = UniverseConfig::new(3, Arc::new(rule)).with_engine(engine);
    seeded(config, 24, 30, seed)
}
