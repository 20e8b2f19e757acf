use std::f64::consts::SQRT_2;

use adpath_core::Transition;

/// Length of the shortest 8-connected path on an empty grid, with diagonal moves costing √2.
pub fn octile_distance(from: (i32, i32), to: (i32, i32)) -> f64 {
    let dx = (from.0 - to.0).abs();
    let dy = (from.1 - to.1).abs();
    let diagonals = dx.min(dy);
    let orthos = dx.max(dy) - diagonals;
    orthos as f64 + diagonals as f64 * SQRT_2
}

pub fn euclidean_distance(from: (i32, i32), to: (i32, i32)) -> f64 {
    let dx = (from.0 - to.0) as f64;
    let dy = (from.1 - to.1) as f64;
    dx.hypot(dy)
}

/// Length of the shortest 4-connected path on an empty grid.
pub fn manhattan_distance(from: (i32, i32), to: (i32, i32)) -> f64 {
    ((from.0 - to.0).abs() + (from.1 - to.1).abs()) as f64
}

/// Number of moves of the shortest 8-connected path on an empty grid.
pub fn chebyshev_distance(from: (i32, i32), to: (i32, i32)) -> f64 {
    (from.0 - to.0).abs().max((from.1 - to.1).abs()) as f64
}

/// Every move costs 1.
pub fn unit_cost(_: &Transition<(i32, i32)>) -> f64 {
    1.0
}

/// Moves cost their Euclidean length: 1 orthogonally, √2 diagonally.
pub fn euclidean_cost(transition: &Transition<(i32, i32)>) -> f64 {
    euclidean_distance(transition.from(), transition.to())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn known_distances() {
        assert_eq!(octile_distance((0, 0), (3, 1)), 2.0 + SQRT_2);
        assert_eq!(manhattan_distance((0, 0), (3, -1)), 4.0);
        assert_eq!(chebyshev_distance((0, 0), (3, -1)), 3.0);
        assert_eq!(euclidean_distance((1, 1), (4, 5)), 5.0);
        assert_eq!(euclidean_cost(&Transition::new((0, 0), (1, 1))), SQRT_2);
        assert_eq!(unit_cost(&Transition::new((0, 0), (1, 1))), 1.0);
    }

    proptest! {
        #[test]
        fn distances_are_ordered(a in (-50i32..50, -50i32..50), b in (-50i32..50, -50i32..50)) {
            let chebyshev = chebyshev_distance(a, b);
            let euclidean = euclidean_distance(a, b);
            let octile = octile_distance(a, b);
            let manhattan = manhattan_distance(a, b);
            prop_assert!(chebyshev <= euclidean + 1e-9);
            prop_assert!(euclidean <= octile + 1e-9);
            prop_assert!(octile <= manhattan + 1e-9);
            prop_assert_eq!(octile_distance(a, b), octile_distance(b, a));
        }
    }
}
