use std::collections::VecDeque;

use adpath_core::traits::{Expander, Predecessors};
use adpath_core::Transition;
use ahash::AHashSet;
use enumset::EnumSet;

use crate::{BitGrid, Direction};

/// Moves allowed between adjacent traversable cells.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Connectivity {
    /// Orthogonal moves only.
    Four,
    /// Orthogonal and diagonal moves. A diagonal move requires both orthogonal cells it passes
    /// between to be traversable.
    #[default]
    Eight,
}

impl Connectivity {
    pub fn directions(self) -> EnumSet<Direction> {
        match self {
            Connectivity::Four => Direction::ORTHOGONAL,
            Connectivity::Eight => EnumSet::all(),
        }
    }
}

/// A [`BitGrid`] seen as a graph over its traversable cells.
///
/// Moves are symmetric: whenever `a -> b` is a transition, so is `b -> a`.
#[derive(Clone, Debug)]
pub struct GridGraph {
    map: BitGrid,
    connectivity: Connectivity,
}

impl GridGraph {
    pub fn new(map: BitGrid, connectivity: Connectivity) -> Self {
        GridGraph { map, connectivity }
    }

    pub fn map(&self) -> &BitGrid {
        &self.map
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Directions in which a move from `cell` is allowed. Empty for obstacles and cells outside
    /// the map.
    pub fn moves(&self, (x, y): (i32, i32)) -> EnumSet<Direction> {
        if !self.map.is_traversable((x, y)) {
            return EnumSet::empty();
        }
        let nbhood = self.map.get_neighborhood(x, y);
        self.connectivity
            .directions()
            .iter()
            .filter(|dir| nbhood.is_superset(dir.components() | *dir))
            .collect()
    }

    /// Cells reachable from `cell` in one move, with the move's direction.
    pub fn neighbors(&self, cell: (i32, i32)) -> impl Iterator<Item = (Direction, (i32, i32))> {
        self.moves(cell).into_iter().map(move |dir| (dir, dir.step(cell)))
    }

    pub fn traversable_states(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.map.traversable_cells()
    }

    /// Every cell reachable from `start`, including `start` itself if it is traversable.
    pub fn reachable_states(&self, start: (i32, i32)) -> AHashSet<(i32, i32)> {
        let mut seen = AHashSet::new();
        if !self.map.is_traversable(start) {
            return seen;
        }
        let mut queue = VecDeque::from([start]);
        seen.insert(start);
        while let Some(cell) = queue.pop_front() {
            for (_, next) in self.neighbors(cell) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// States whose incoming transitions may change when the traversability of `cell` changes:
    /// the cell itself and the in-bounds cells around it. With eight-connectivity this includes
    /// the diagonal neighbors, since `cell` can be the corner a diagonal move passes.
    pub fn affected_states(&self, cell: (i32, i32)) -> Vec<(i32, i32)> {
        let mut states = vec![cell];
        states.extend(
            self.connectivity
                .directions()
                .iter()
                .map(|dir| dir.step(cell))
                .filter(|&(x, y)| self.map.in_bounds(x, y)),
        );
        states
    }

    /// Changes the traversability of `cell` and returns the states to invalidate in a running
    /// search. Returns nothing if the cell already had that traversability.
    #[track_caller]
    pub fn set_traversable(&mut self, (x, y): (i32, i32), traversable: bool) -> Vec<(i32, i32)> {
        if self.map.get(x, y) == traversable {
            return vec![];
        }
        self.map.set(x, y, traversable);
        self.affected_states((x, y))
    }
}

impl Expander<(i32, i32)> for GridGraph {
    fn expand(&mut self, state: (i32, i32), edges: &mut Vec<Transition<(i32, i32)>>) {
        edges.extend(
            self.neighbors(state)
                .map(|(_, next)| Transition::new(state, next)),
        );
    }
}

impl Predecessors<(i32, i32)> for GridGraph {
    fn predecessors(&mut self, state: (i32, i32), edges: &mut Vec<Transition<(i32, i32)>>) {
        edges.extend(
            self.neighbors(state)
                .map(|(_, prev)| Transition::new(prev, state)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(connectivity: Connectivity) -> GridGraph {
        let map = BitGrid::from_ascii("....\n.@..\n...@").unwrap();
        GridGraph::new(map, connectivity)
    }

    #[test]
    fn diagonal_moves_do_not_cut_corners() {
        let graph = graph(Connectivity::Eight);
        assert_eq!(
            graph.moves((0, 0)),
            Direction::East | Direction::South
        );
        // (1, 0) is traversable, but the move would cut the corner of (1, 1).
        assert_eq!(
            graph.moves((2, 1)),
            Direction::North | Direction::South | Direction::East | Direction::NorthEast
        );
        assert_eq!(graph.moves((1, 1)), EnumSet::empty());
        assert_eq!(graph.moves((5, 5)), EnumSet::empty());

        let four = self::graph(Connectivity::Four);
        assert_eq!(
            four.moves((2, 1)),
            Direction::North | Direction::South | Direction::East
        );
    }

    #[test]
    fn transitions_are_symmetric() {
        for connectivity in [Connectivity::Four, Connectivity::Eight] {
            let mut graph = graph(connectivity);
            let cells: Vec<_> = graph.traversable_states().collect();
            for cell in cells {
                let mut out = vec![];
                let mut inc = vec![];
                graph.expand(cell, &mut out);
                graph.predecessors(cell, &mut inc);
                let mut reversed: Vec<_> = inc.iter().map(Transition::reversed).collect();
                out.sort();
                reversed.sort();
                assert_eq!(out, reversed);
            }
        }
    }

    #[test]
    fn reachability_and_affected_states() {
        let mut graph = graph(Connectivity::Eight);
        assert_eq!(graph.reachable_states((0, 0)).len(), 10);
        assert!(graph.reachable_states((1, 1)).is_empty());

        assert_eq!(graph.affected_states((0, 0)).len(), 4);
        assert_eq!(graph.affected_states((1, 1)).len(), 9);

        assert!(graph.set_traversable((0, 0), true).is_empty());
        let affected = graph.set_traversable((0, 1), false);
        assert_eq!(affected.len(), 6);
        assert!(affected.contains(&(0, 1)));
        assert_eq!(graph.reachable_states((0, 0)).len(), 9);
        assert!(graph.reachable_states((0, 1)).is_empty());
    }
}
