//! Deterministic cell layouts for tests and benchmarks.

use cellua_core::Coord;

/// A horizontal three-cell blinker centred on `(x, y)`.
pub fn blinker(x: i64, y: i64) -> Vec<Coord> {
    (-1..=1).map(|dx| Coord::from_slice(&[x + dx, y])).collect()
}

/// A glider with its top-left corner at `(x, y)`, heading towards +x, +y.
pub fn glider(x: i64, y: i64) -> Vec<Coord> {
    [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]
        .iter()
        .map(|&(dx, dy)| Coord::from_slice(&[x + dx, y + dy]))
        .collect()
}

/// Pseudo-random live cells in the cube `[0, side)^dimensions`.
///
/// Each cell is live with probability `density_percent / 100`, drawn from
/// a 64-bit LCG seeded with `seed`, so the same arguments always give the
/// same layout.
pub fn soup(dimensions: usize, side: i64, density_percent: u64, seed: u64) -> Vec<Coord> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    let mut out = Vec::new();
    let mut coord: Coord = std::iter::repeat(0).take(dimensions).collect();
    if side <= 0 || dimensions == 0 {
        return out;
    }
    loop {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        if (state >> 33) % 100 < density_percent {
            out.push(coord.clone());
        }
        // Odometer increment over the cube.
        let mut axis = 0;
        loop {
            if axis == dimensions {
                return out;
            }
            coord[axis] += 1;
            if coord[axis] < side {
                break;
            }
            coord[axis] = 0;
            axis += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soup_is_deterministic_and_in_bounds() {
        let a = soup(3, 6, 30, 7);
        assert_eq!(a, soup(3, 6, 30, 7));
        assert!(!a.is_empty());
        assert!(a.iter().all(|c| c.iter().all(|&v| (0..6).contains(&v))));
    }

    #[test]
    fn glider_has_five_cells() {
        assert_eq!(glider(0, 0).len(), 5);
    }
}
