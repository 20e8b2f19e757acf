use std::collections::VecDeque;
use std::hash::Hash;

use adpath_core::traits::Expander;
use adpath_core::Transition;
use ahash::AHashMap;

/// Breadth-first search treating every transition as weight 1.
///
/// Returns the states of a path with the fewest transitions from `start` to `goal`, start first,
/// or `None` if `goal` is unreachable.
pub fn unweighted_shortest_path<S, E>(expander: &mut E, start: S, goal: S) -> Option<Vec<S>>
where
    S: Copy + Eq + Hash,
    E: Expander<S> + ?Sized,
{
    let mut parents = AHashMap::new();
    parents.insert(start, start);
    let mut queue = VecDeque::from([start]);
    let mut edges: Vec<Transition<S>> = vec![];

    while let Some(state) = queue.pop_front() {
        if state == goal {
            let mut path = vec![goal];
            let mut current = goal;
            while current != start {
                current = parents[&current];
                path.push(current);
            }
            path.reverse();
            return Some(path);
        }
        edges.clear();
        expander.expand(state, &mut edges);
        for edge in &edges {
            parents.entry(edge.to()).or_insert_with(|| {
                queue.push_back(edge.to());
                state
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BitGrid, Connectivity, GridGraph};

    #[test]
    fn finds_fewest_moves() {
        let map = BitGrid::from_ascii("S.@.\n..@.\n...G").unwrap();
        let mut four = GridGraph::new(map.clone(), Connectivity::Four);
        let path = unweighted_shortest_path(&mut four, (0, 0), (3, 2)).unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(path.first(), Some(&(0, 0)));
        assert_eq!(path.last(), Some(&(3, 2)));

        // The diagonal (1, 1) -> (2, 2) would cut the corner of (2, 1).
        let mut eight = GridGraph::new(map, Connectivity::Eight);
        let path = unweighted_shortest_path(&mut eight, (0, 0), (3, 2)).unwrap();
        assert_eq!(path.len(), 5);
        let path = unweighted_shortest_path(&mut eight, (0, 0), (3, 0)).unwrap();
        assert_eq!(path.len(), 7);
        assert_eq!(unweighted_shortest_path(&mut eight, (0, 0), (2, 0)), None);
        assert_eq!(unweighted_shortest_path(&mut eight, (0, 0), (0, 0)), Some(vec![(0, 0)]));
    }
}
