//! Anytime Dynamic A* path planning.
//!
//! The building blocks live in [`adstar`] (the search) and [`grid`] (grid maps); the node arena
//! and priority queue are re-exported at the top level. [`GridPlanner`] wires them together for
//! grid maps.

use adpath_core::traits::{HeuristicFunction, NodePool};
pub use adpath_core::*;
pub use adpath_adstar as adstar;
pub use adpath_grid as grid;

use crate::adstar::{AdStar, AdStarConfig, AdStarFields, NodeUpdater, Solution};
use crate::grid::{
    euclidean_cost, manhattan_distance, octile_distance, unit_cost, Connectivity, GridGraph,
    GridPool,
};

/// Heuristic estimating the distance to a fixed goal cell.
#[derive(Clone, Copy)]
pub struct GoalDistance {
    goal: (i32, i32),
    distance: fn((i32, i32), (i32, i32)) -> f64,
}

impl GoalDistance {
    /// Distance matching the move costs [`GridPlanner`] uses: octile for eight-connected grids,
    /// Manhattan for four-connected ones.
    pub fn new(goal: (i32, i32), connectivity: Connectivity) -> Self {
        let distance = match connectivity {
            Connectivity::Four => manhattan_distance,
            Connectivity::Eight => octile_distance,
        };
        GoalDistance { goal, distance }
    }
}

impl HeuristicFunction<(i32, i32)> for GoalDistance {
    fn estimate(&self, state: &(i32, i32)) -> f64 {
        (self.distance)(*state, self.goal)
    }
}

pub type GridCost = fn(&Transition<(i32, i32)>) -> f64;

/// AD* search over a grid map, as created by [`GridPlanner::search`].
pub type GridSearch<'a> = AdStar<'a, GridPool, GridGraph, GridCost, GoalDistance>;

/// Reusable node storage for AD* searches on grid maps up to a fixed size.
pub struct GridPlanner {
    fields: AdStarFields<(i32, i32)>,
    queue_factory: PriorityQueueFactory,
    pool: GridPool,
}

impl GridPlanner {
    pub fn new(width: i32, height: i32) -> Self {
        let mut builder = NodeBuilder::new();
        let state = builder.add_field((-1, -1));
        let fields = AdStarFields::new(&mut builder, state);
        let queue_factory = PriorityQueueFactory::new(&mut builder);
        GridPlanner {
            fields,
            queue_factory,
            pool: GridPool::new(builder.build(), state, width, height),
        }
    }

    /// Starts a new search from `start` to `goal`, discarding the nodes of the previous one.
    ///
    /// Moves cost their Euclidean length on eight-connected grids and 1 on four-connected ones.
    #[track_caller]
    pub fn search(
        &mut self,
        graph: GridGraph,
        start: (i32, i32),
        goal: (i32, i32),
        config: AdStarConfig,
    ) -> adstar::Result<GridSearch<'_>> {
        assert!(
            graph.map().width() <= self.pool.width() && graph.map().height() <= self.pool.height(),
            "map does not fit the planner"
        );
        self.pool.reset();
        let cost: GridCost = match graph.connectivity() {
            Connectivity::Four => unit_cost,
            Connectivity::Eight => euclidean_cost,
        };
        let heuristic = GoalDistance::new(goal, graph.connectivity());
        let updater = NodeUpdater::new(self.fields, cost, heuristic, config.initial_epsilon)?;
        AdStar::new(
            &self.pool,
            &mut self.queue_factory,
            graph,
            updater,
            config,
            start,
            goal,
        )
    }
}

/// Runs the full anytime schedule of `config` on `graph` and returns the final solution.
///
/// `on_solution` sees every published solution, from the first ε-suboptimal one to the last.
pub fn plan_anytime(
    graph: GridGraph,
    start: (i32, i32),
    goal: (i32, i32),
    config: AdStarConfig,
    on_solution: impl FnMut(&Solution<(i32, i32)>),
) -> adstar::Result<Option<Solution<(i32, i32)>>> {
    let mut planner = GridPlanner::new(graph.map().width(), graph.map().height());
    let mut search = planner.search(graph, start, goal, config)?;
    let best = search.run_anytime(on_solution)?;
    Ok(best)
}
