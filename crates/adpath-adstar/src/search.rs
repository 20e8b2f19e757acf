use std::fmt::Debug;

use adpath_core::traits::{
    CostFunction, Expander, HeuristicFunction, NodePool, OpenList, Predecessors,
};
use adpath_core::{NodeMemberPointer, NodeRef, PriorityQueue, PriorityQueueFactory, Transition};
use tracing::{debug, instrument, trace, warn};

use crate::{AdStarConfig, Key, NodeUpdater, Result};

type OpenOrdering = (NodeMemberPointer<Key>, NodeMemberPointer<u64>);

/// A published path from start to goal.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution<S> {
    /// States along the path, start first.
    pub states: Vec<S>,
    pub cost: f64,
    /// Inflation the path was computed with; `cost` is at most `epsilon` times the optimum.
    pub epsilon: f64,
}

/// Result of a single path computation.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<S> {
    Solved(Solution<S>),
    /// OPEN ran dry without reaching the goal.
    Unreachable,
    /// The computation was stopped before it finished; calling it again resumes.
    Interrupted,
}

impl<S> Outcome<S> {
    pub fn solution(&self) -> Option<&Solution<S>> {
        match self {
            Outcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn into_solution(self) -> Option<Solution<S>> {
        match self {
            Outcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct SearchStats {
    /// Path computations started, including the first.
    pub episodes: u64,
    pub expansions: u64,
    /// Expansions of the current path computation.
    pub episode_expansions: u64,
    /// Applications of the predecessor repair rule.
    pub repairs: u64,
}

/// Anytime Dynamic A* search between a fixed start and goal.
///
/// Nodes live in the pool passed to [`AdStar::new`], which must have been built from the same
/// layout as the updater's fields. The search keeps three sets: OPEN (inconsistent nodes waiting
/// for expansion, ordered by key), CLOSED (nodes expanded as overconsistent during the current
/// episode) and INCONS (inconsistent nodes found after they were closed, deferred to the next
/// episode).
pub struct AdStar<'a, P: NodePool, G, C, H> {
    pool: &'a P,
    graph: G,
    updater: NodeUpdater<P::State, C, H>,
    config: AdStarConfig,
    open: PriorityQueue<'a, OpenOrdering>,
    incons: Vec<NodeRef<'a>>,
    start: NodeRef<'a>,
    goal: NodeRef<'a>,
    epoch: u64,
    next_seq: u64,
    pending_changes: usize,
    stats: SearchStats,
    edges: Vec<Transition<P::State>>,
    predecessors: Vec<Transition<P::State>>,
}

impl<'a, P, G, C, H> AdStar<'a, P, G, C, H>
where
    P: NodePool,
    P::State: PartialEq + Debug,
    G: Expander<P::State> + Predecessors<P::State>,
    C: CostFunction<P::State>,
    H: HeuristicFunction<P::State>,
{
    /// Sets up a search from `start` to `goal` and queues the start node.
    ///
    /// The updater's ε is replaced by `config.initial_epsilon`.
    #[track_caller]
    pub fn new(
        pool: &'a P,
        queue_factory: &mut PriorityQueueFactory,
        graph: G,
        mut updater: NodeUpdater<P::State, C, H>,
        config: AdStarConfig,
        start: P::State,
        goal: P::State,
    ) -> Result<Self> {
        config.validate()?;
        updater.set_epsilon(config.initial_epsilon)?;
        let fields = updater.fields();
        assert!(
            fields.state().same_layout(pool.state_member()),
            "search fields and node pool use different layouts"
        );

        let start = pool.generate(start);
        let goal = pool.generate(goal);
        let mut search = AdStar {
            pool,
            graph,
            open: queue_factory.new_queue(fields.ordering()),
            updater,
            config,
            incons: vec![],
            start,
            goal,
            epoch: 1,
            next_seq: 0,
            pending_changes: 0,
            stats: SearchStats {
                episodes: 1,
                ..SearchStats::default()
            },
            edges: vec![],
            predecessors: vec![],
        };
        search.updater.make_start(start)?;
        search.update_membership(start);
        Ok(search)
    }

    /// Runs the path computation at the current ε until it finishes.
    pub fn compute_path(&mut self) -> Result<Outcome<P::State>> {
        self.compute_path_until(|_| false)
    }

    /// Runs the path computation at the current ε.
    ///
    /// `interrupt` is polled before every expansion; returning `true` stops the computation with
    /// [`Outcome::Interrupted`], as does exhausting `max_expansions`. Interrupted computations
    /// resume where they left off on the next call.
    #[instrument(level = "debug", skip_all, fields(epsilon = self.updater.epsilon()))]
    pub fn compute_path_until(
        &mut self,
        mut interrupt: impl FnMut(&SearchStats) -> bool,
    ) -> Result<Outcome<P::State>> {
        let fields = self.updater.fields();
        let mut expanded = 0;
        while let Some(top) = self.open.peek() {
            let goal_key = self.updater.key_of(self.goal)?;
            let goal_consistent = self.goal.get(fields.g()) == self.goal.get(fields.v());
            if goal_consistent && top.get(fields.key()) >= goal_key {
                break;
            }
            let exhausted = self.config.max_expansions.is_some_and(|max| expanded >= max);
            if interrupt(&self.stats) || exhausted {
                debug!(expanded, open = self.open.len(), "path computation interrupted");
                return Ok(Outcome::Interrupted);
            }
            let Some(node) = self.open.next() else {
                break;
            };
            expanded += 1;
            self.stats.expansions += 1;
            self.stats.episode_expansions += 1;
            self.expand(node)?;
        }

        match self.solution() {
            Some(solution) => {
                debug!(
                    cost = solution.cost,
                    expansions = self.stats.episode_expansions,
                    "published solution"
                );
                Ok(Outcome::Solved(solution))
            }
            None => {
                debug!(expansions = self.stats.episode_expansions, "goal unreachable");
                Ok(Outcome::Unreachable)
            }
        }
    }

    /// Starts the next episode and computes its path.
    ///
    /// ε is lowered by `epsilon_step` (not below `final_epsilon`), or reset to
    /// `initial_epsilon` if more than `significant_change_threshold` states were invalidated
    /// since the previous episode. INCONS is merged into OPEN, OPEN is re-keyed for the new ε and
    /// CLOSED is emptied. This is also how the search replans after [`AdStar::invalidate`].
    #[instrument(level = "debug", skip_all)]
    pub fn improve(&mut self) -> Result<Outcome<P::State>> {
        let epsilon = if self.pending_changes > self.config.significant_change_threshold {
            self.config.initial_epsilon
        } else {
            (self.updater.epsilon() - self.config.epsilon_step).max(self.config.final_epsilon)
        };
        self.pending_changes = 0;
        self.updater.set_epsilon(epsilon)?;
        self.begin_episode()?;
        self.compute_path()
    }

    /// Computes a first solution, then improves it until ε reaches `final_epsilon`.
    ///
    /// `on_solution` sees every published solution. Returns the last one, or `None` if the goal
    /// is unreachable or a computation was interrupted before any solution was found.
    pub fn run_anytime(
        &mut self,
        mut on_solution: impl FnMut(&Solution<P::State>),
    ) -> Result<Option<Solution<P::State>>> {
        let mut outcome = self.compute_path()?;
        let mut best = None;
        loop {
            match outcome {
                Outcome::Solved(solution) => {
                    on_solution(&solution);
                    best = Some(solution);
                }
                Outcome::Unreachable => return Ok(None),
                Outcome::Interrupted => return Ok(best),
            }
            if self.updater.epsilon() <= self.config.final_epsilon {
                return Ok(best);
            }
            outcome = self.improve()?;
        }
    }

    /// Notifies the search that the incoming transitions of `states` changed: costs went up or
    /// down, or transitions appeared or disappeared.
    ///
    /// Each affected state recomputes its cost from its current predecessors and moves to OPEN
    /// or INCONS if it became inconsistent. States the search has not discovered yet are added.
    /// Call [`AdStar::improve`] afterwards to replan.
    pub fn invalidate(&mut self, states: impl IntoIterator<Item = P::State>) -> Result<()> {
        let mut count = 0;
        for state in states {
            count += 1;
            // Nodes are generated so that states which just gained a predecessor are discovered.
            let node = self.pool.generate(state);
            self.repair(node)?;
        }
        self.pending_changes += count;
        debug!(count, pending = self.pending_changes, "invalidated states");
        Ok(())
    }

    /// Current path from start to goal, following back-pointers.
    pub fn path(&self) -> Option<Vec<P::State>> {
        let fields = self.updater.fields();
        if self.goal.get(fields.g()) == f64::INFINITY {
            return None;
        }
        // Every node on the path except the goal has been expanded at least once.
        let limit = self.stats.expansions + 2;
        let mut states = vec![self.goal.get(fields.state())];
        let mut node = self.goal;
        while !node.ptr_eq(self.start) {
            node = node.get_parent()?;
            states.push(node.get(fields.state()));
            if states.len() as u64 > limit {
                warn!("back-pointer chain from the goal does not reach the start");
                return None;
            }
        }
        states.reverse();
        Some(states)
    }

    /// Current solution, if the goal has been reached.
    ///
    /// The cost is summed along the published path. After an invalidation the goal's `g` can
    /// still rest on a stale estimate while ε > 1, so it is not reported directly.
    pub fn solution(&self) -> Option<Solution<P::State>> {
        let states = self.path()?;
        let cost_function = self.updater.cost_function();
        let cost: f64 = states
            .windows(2)
            .map(|pair| cost_function.evaluate(&Transition::new(pair[0], pair[1])))
            .sum();
        Some(Solution {
            states,
            cost,
            epsilon: self.updater.epsilon(),
        })
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Mutable access to the graph. Report changed states through [`AdStar::invalidate`].
    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    /// Mutable access to the cost strategy. Report changed states through
    /// [`AdStar::invalidate`].
    pub fn cost_function_mut(&mut self) -> &mut C {
        self.updater.cost_function_mut()
    }

    pub fn updater(&self) -> &NodeUpdater<P::State, C, H> {
        &self.updater
    }

    pub fn config(&self) -> &AdStarConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f64 {
        self.updater.epsilon()
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Node for `state`, if the search has discovered it.
    pub fn node(&self, state: P::State) -> Option<NodeRef<'a>> {
        self.pool.get(state)
    }

    pub fn start(&self) -> NodeRef<'a> {
        self.start
    }

    pub fn goal(&self) -> NodeRef<'a> {
        self.goal
    }

    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    pub fn incons_len(&self) -> usize {
        let fields = self.updater.fields();
        self.incons
            .iter()
            .filter(|node| node.get(fields.g()) != node.get(fields.v()))
            .count()
    }

    fn expand(&mut self, node: NodeRef<'a>) -> Result<()> {
        let fields = self.updater.fields();
        let state = node.get(fields.state());
        let mut edges = std::mem::take(&mut self.edges);
        edges.clear();
        self.graph.expand(state, &mut edges);
        let result = self.expand_with(node, &edges);
        self.edges = edges;
        result
    }

    fn expand_with(&mut self, node: NodeRef<'a>, edges: &[Transition<P::State>]) -> Result<()> {
        let fields = self.updater.fields();
        if node.get(fields.v()) > node.get(fields.g()) {
            trace!(
                state = ?node.get(fields.state()),
                g = node.get(fields.g()),
                "expand overconsistent"
            );
            self.updater.settle(node)?;
            node.set(fields.closed_epoch, self.epoch);
            for &transition in edges {
                let successor = self.pool.generate(transition.to());
                if self.updater.update_consistent(successor, node, transition)? {
                    self.update_membership(successor);
                }
            }
        } else {
            trace!(
                state = ?node.get(fields.state()),
                v = node.get(fields.v()),
                "expand underconsistent"
            );
            self.updater.set_max_v(node)?;
            self.update_membership(node);
            for &transition in edges {
                let Some(successor) = self.pool.get(transition.to()) else {
                    continue;
                };
                if successor
                    .get_parent()
                    .is_some_and(|parent| parent.ptr_eq(node))
                {
                    self.repair(successor)?;
                }
            }
        }
        Ok(())
    }

    fn repair(&mut self, node: NodeRef<'a>) -> Result<()> {
        if node.ptr_eq(self.start) {
            return Ok(());
        }
        let state = node.get(self.updater.fields().state());
        let mut predecessors = std::mem::take(&mut self.predecessors);
        predecessors.clear();
        self.graph.predecessors(state, &mut predecessors);
        let pool = self.pool;
        let result = self.updater.update_inconsistent(
            node,
            predecessors
                .iter()
                .filter_map(|&transition| pool.get(transition.from()).map(|p| (transition, p))),
        );
        self.predecessors = predecessors;
        result?;
        self.stats.repairs += 1;
        self.update_membership(node);
        Ok(())
    }

    fn update_membership(&mut self, node: NodeRef<'a>) {
        let fields = self.updater.fields();
        if node.get(fields.g()) != node.get(fields.v()) {
            if node.get(fields.closed_epoch) != self.epoch {
                self.enqueue(node);
            } else if !node.get(fields.in_incons) {
                node.set(fields.in_incons, true);
                self.incons.push(node);
            }
        } else {
            // Consistent nodes left in the INCONS list are skipped when it is merged.
            self.open.remove(node);
        }
    }

    fn enqueue(&mut self, node: NodeRef<'a>) {
        if !self.open.contains(node) {
            node.set(self.updater.fields().seq, self.next_seq);
            self.next_seq += 1;
        }
        self.open.update(node);
    }

    fn begin_episode(&mut self) -> Result<()> {
        self.epoch += 1;
        self.stats.episodes += 1;
        self.stats.episode_expansions = 0;

        let fields = self.updater.fields();
        let incons = std::mem::take(&mut self.incons);
        for &node in &incons {
            node.set(fields.in_incons, false);
            if node.get(fields.g()) != node.get(fields.v()) {
                self.enqueue(node);
            }
        }
        self.incons = incons;
        self.incons.clear();

        let updater = &self.updater;
        let mut failure = None;
        self.open.rebuild(|node| {
            if let Err(error) = updater.refresh_key(node) {
                failure.get_or_insert(error);
            }
        });
        debug!(
            epsilon = self.updater.epsilon(),
            open = self.open.len(),
            "episode started"
        );
        failure.map_or(Ok(()), Err)
    }
}
