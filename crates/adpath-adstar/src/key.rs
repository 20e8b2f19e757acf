use std::cmp::Ordering;

/// Priority of a node in the OPEN list.
///
/// Keys compare lexicographically: first by the inflated estimate of the total path cost, then
/// by the raw cost-to-come. An unreached node has the key `(+∞, +∞)`, which orders after every
/// finite key.
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug)]
pub struct Key {
    pub primary: f64,
    pub secondary: f64,
}

impl Key {
    pub const UNREACHED: Key = Key {
        primary: f64::INFINITY,
        secondary: f64::INFINITY,
    };

    /// Key of a node with cost-to-come `g`, settled estimate `v` and heuristic estimate `h`,
    /// inflated by `epsilon`.
    ///
    /// The node's authoritative cost is `min(g, v)`, giving `(min(g, v) + epsilon * h, min(g, v))`.
    #[inline]
    pub fn compute(g: f64, v: f64, h: f64, epsilon: f64) -> Key {
        debug_assert!(
            !(g.is_nan() || v.is_nan() || h.is_nan() || epsilon.is_nan()),
            "NaN in key computation"
        );
        let cost = g.min(v);
        Key {
            primary: cost + epsilon * h,
            secondary: cost,
        }
    }

    /// Total order over keys. Agrees with `PartialOrd` for NaN-free keys.
    pub fn total_cmp(&self, other: &Key) -> Ordering {
        self.primary
            .total_cmp(&other.primary)
            .then_with(|| self.secondary.total_cmp(&other.secondary))
    }
}
