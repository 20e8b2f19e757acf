use adpath::adstar::{AdStarConfig, Outcome};
use adpath::grid::{
    euclidean_cost, unweighted_shortest_path, BitGrid, Connectivity, GridGraph, GridPool,
};
use adpath::traits::{Expander, NodePool, OpenList};
use adpath::{plan_anytime, GridPlanner, NodeBuilder, PriorityQueueFactory, Transition};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const EPSILON: f64 = 1e-9;

fn random_map(rng: &mut impl Rng, width: i32, height: i32, density: f64) -> BitGrid {
    let mut map = BitGrid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            map.set(x, y, !rng.gen_bool(density));
        }
    }
    map
}

fn random_cell(rng: &mut impl Rng, map: &BitGrid) -> (i32, i32) {
    let cells: Vec<_> = map.traversable_cells().collect();
    cells[rng.gen_range(0..cells.len())]
}

/// Plain Dijkstra with Euclidean move costs.
fn dijkstra(graph: &GridGraph, start: (i32, i32), goal: (i32, i32)) -> f64 {
    let mut builder = NodeBuilder::new();
    let state = builder.add_field((-1, -1));
    let g = builder.add_field(f64::INFINITY);
    let mut factory = PriorityQueueFactory::new(&mut builder);
    let pool = GridPool::new(builder.build(), state, graph.map().width(), graph.map().height());
    let mut open = factory.new_queue(g);
    let mut graph = graph.clone();
    let mut edges = vec![];

    let start = pool.generate(start);
    start.set(g, 0.0);
    open.relaxed(start);
    while let Some(node) = open.next() {
        if node.get(state) == goal {
            return node.get(g);
        }
        edges.clear();
        graph.expand(node.get(state), &mut edges);
        for edge in &edges {
            let successor = pool.generate(edge.to());
            let new_g = node.get(g) + euclidean_cost(edge);
            if new_g < successor.get(g) {
                successor.set(g, new_g);
                open.relaxed(successor);
            }
        }
    }
    f64::INFINITY
}

fn same_cost(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() < EPSILON
}

#[test]
fn optimal_search_matches_dijkstra() {
    let mut rng = Pcg64::seed_from_u64(7);
    let mut planner = GridPlanner::new(32, 32);
    for _ in 0..40 {
        let map = random_map(&mut rng, 32, 32, 0.3);
        let start = random_cell(&mut rng, &map);
        let goal = random_cell(&mut rng, &map);
        let graph = GridGraph::new(map, Connectivity::Eight);
        let expected = dijkstra(&graph, start, goal);

        let mut search = planner
            .search(graph, start, goal, AdStarConfig::optimal())
            .unwrap();
        match search.compute_path().unwrap() {
            Outcome::Solved(solution) => {
                assert!(same_cost(solution.cost, expected), "{} != {expected}", solution.cost);
                assert_eq!(solution.states.first(), Some(&start));
                assert_eq!(solution.states.last(), Some(&goal));
                for pair in solution.states.windows(2) {
                    assert!(search.graph().neighbors(pair[0]).any(|(_, n)| n == pair[1]));
                }
            }
            Outcome::Unreachable => assert_eq!(expected, f64::INFINITY),
            Outcome::Interrupted => unreachable!(),
        }
    }
}

#[test]
fn inflated_solutions_stay_within_bound() {
    let mut rng = Pcg64::seed_from_u64(11);
    for _ in 0..20 {
        let map = random_map(&mut rng, 40, 40, 0.25);
        let start = random_cell(&mut rng, &map);
        let goal = random_cell(&mut rng, &map);
        let graph = GridGraph::new(map, Connectivity::Eight);
        let optimum = dijkstra(&graph, start, goal);

        let mut published = vec![];
        let best = plan_anytime(graph, start, goal, AdStarConfig::default(), |solution| {
            published.push(solution.clone())
        })
        .unwrap();

        if optimum == f64::INFINITY {
            assert!(best.is_none());
            assert!(published.is_empty());
            continue;
        }
        let best = best.unwrap();
        assert!(same_cost(best.cost, optimum));
        assert_eq!(best.epsilon, 1.0);
        assert_eq!(published.len(), 4);
        for solution in &published {
            assert!(solution.cost <= solution.epsilon * optimum + EPSILON);
        }
        for pair in published.windows(2) {
            assert!(pair[1].epsilon < pair[0].epsilon);
            assert!(pair[1].cost <= pair[0].cost + EPSILON);
        }
    }
}

#[test]
fn replanning_after_obstacle_changes_matches_fresh_search() {
    let mut rng = Pcg64::seed_from_u64(23);
    let mut planner = GridPlanner::new(24, 24);
    for _ in 0..15 {
        let map = random_map(&mut rng, 24, 24, 0.2);
        let start = random_cell(&mut rng, &map);
        let goal = random_cell(&mut rng, &map);
        let config = AdStarConfig {
            initial_epsilon: 2.0,
            ..AdStarConfig::default()
        };
        let mut search = planner
            .search(GridGraph::new(map, Connectivity::Eight), start, goal, config)
            .unwrap();
        search.run_anytime(|_| {}).unwrap();

        for _ in 0..5 {
            // Toggle a handful of cells, keeping the endpoints free.
            let mut affected = vec![];
            for _ in 0..6 {
                let cell = (rng.gen_range(0..24), rng.gen_range(0..24));
                if cell == start || cell == goal {
                    continue;
                }
                let traversable = !search.graph().map().get(cell.0, cell.1);
                affected.extend(search.graph_mut().set_traversable(cell, traversable));
            }
            search.invalidate(affected).unwrap();
            let mut outcome = search.improve().unwrap();
            while search.epsilon() > 1.0 {
                outcome = search.improve().unwrap();
            }

            let expected = dijkstra(search.graph(), start, goal);
            match outcome {
                Outcome::Solved(solution) => {
                    assert!(same_cost(solution.cost, expected), "{} != {expected}", solution.cost);
                    for pair in solution.states.windows(2) {
                        assert!(search.graph().neighbors(pair[0]).any(|(_, n)| n == pair[1]));
                    }
                }
                Outcome::Unreachable => assert_eq!(expected, f64::INFINITY),
                Outcome::Interrupted => unreachable!(),
            }
        }
    }
}

#[test]
fn unit_costs_match_breadth_first_search() {
    let mut rng = Pcg64::seed_from_u64(5);
    let mut planner = GridPlanner::new(30, 20);
    for _ in 0..30 {
        let map = random_map(&mut rng, 30, 20, 0.3);
        let start = random_cell(&mut rng, &map);
        let goal = random_cell(&mut rng, &map);
        let mut graph = GridGraph::new(map, Connectivity::Four);
        let baseline = unweighted_shortest_path(&mut graph, start, goal);

        let mut search = planner
            .search(graph, start, goal, AdStarConfig::optimal())
            .unwrap();
        let solution = search.compute_path().unwrap().into_solution();
        assert_eq!(
            solution.as_ref().map(|s| s.states.len()),
            baseline.as_ref().map(Vec::len)
        );
        if let Some(solution) = solution {
            assert_eq!(solution.cost, (solution.states.len() - 1) as f64);
        }
    }
}

#[test]
fn blocked_start_is_unreachable() {
    let map = BitGrid::from_ascii("@..\n...").unwrap();
    let mut planner = GridPlanner::new(3, 2);
    let mut search = planner
        .search(
            GridGraph::new(map, Connectivity::Eight),
            (0, 0),
            (2, 1),
            AdStarConfig::default(),
        )
        .unwrap();
    assert_eq!(search.compute_path().unwrap(), Outcome::Unreachable);
}

fn path_cost(states: &[(i32, i32)]) -> f64 {
    states
        .windows(2)
        .map(|pair| euclidean_cost(&Transition::new(pair[0], pair[1])))
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn inflated_replanning_reports_path_cost(seed in any::<u64>(), toggles in 1usize..12) {
        let mut rng = Pcg64::seed_from_u64(seed);
        let map = random_map(&mut rng, 24, 24, 0.2);
        let start = random_cell(&mut rng, &map);
        let goal = random_cell(&mut rng, &map);
        let config = AdStarConfig {
            significant_change_threshold: 0,
            ..AdStarConfig::default()
        };
        let mut planner = GridPlanner::new(24, 24);
        let mut search = planner
            .search(GridGraph::new(map, Connectivity::Eight), start, goal, config)
            .unwrap();
        search.run_anytime(|_| {}).unwrap();

        let mut affected = vec![];
        for _ in 0..toggles {
            let cell = (rng.gen_range(0..24), rng.gen_range(0..24));
            if cell == start || cell == goal {
                continue;
            }
            let traversable = !search.graph().map().get(cell.0, cell.1);
            affected.extend(search.graph_mut().set_traversable(cell, traversable));
        }
        prop_assume!(!affected.is_empty());
        search.invalidate(affected).unwrap();

        // Any invalidation is significant here, so the replan runs at the initial inflation.
        if let Outcome::Solved(solution) = search.improve().unwrap() {
            prop_assert_eq!(solution.epsilon, 2.5);
            prop_assert_eq!(solution.states.first(), Some(&start));
            prop_assert_eq!(solution.states.last(), Some(&goal));
            for pair in solution.states.windows(2) {
                prop_assert!(search.graph().neighbors(pair[0]).any(|(_, n)| n == pair[1]));
            }
            prop_assert_eq!(solution.cost, path_cost(&solution.states));
        }
    }
}
