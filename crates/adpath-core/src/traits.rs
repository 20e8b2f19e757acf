//! Interfaces between searches, graphs, node tables and strategies.

use crate::{NodeMemberPointer, NodeRef, Transition};

/// Enumerates the outgoing transitions of a state.
///
/// Implementations push only traversable transitions; a search never inspects the underlying
/// graph representation.
pub trait Expander<S> {
    /// Appends every transition leaving `state` to `edges`.
    fn expand(&mut self, state: S, edges: &mut Vec<Transition<S>>);
}

/// Enumerates the incoming transitions of a state.
pub trait Predecessors<S> {
    /// Appends every transition entering `state` to `edges`.
    fn predecessors(&mut self, state: S, edges: &mut Vec<Transition<S>>);
}

/// Maps a transition to the cost of taking it.
pub trait CostFunction<S> {
    /// Cost of `transition`. Should be finite and non-negative.
    fn evaluate(&self, transition: &Transition<S>) -> f64;
}

impl<S, F: Fn(&Transition<S>) -> f64> CostFunction<S> for F {
    #[inline(always)]
    fn evaluate(&self, transition: &Transition<S>) -> f64 {
        self(transition)
    }
}

/// Estimates the remaining cost from a state to the goal.
pub trait HeuristicFunction<S> {
    /// Estimated distance from `state` to the goal. Should be finite and non-negative.
    fn estimate(&self, state: &S) -> f64;
}

impl<S, F: Fn(&S) -> f64> HeuristicFunction<S> for F {
    #[inline(always)]
    fn estimate(&self, state: &S) -> f64 {
        self(state)
    }
}

/// Node table mapping states to nodes, creating them on first encounter.
pub trait NodePool {
    /// State type stored in the nodes.
    type State: Copy + 'static;

    /// Discards every node.
    fn reset(&mut self);

    /// Returns the node for `state`, creating it if it does not exist yet.
    fn generate(&self, state: Self::State) -> NodeRef<'_>;

    /// Returns the node for `state` if it has been generated.
    fn get(&self, state: Self::State) -> Option<NodeRef<'_>>;

    /// Field holding the state of each node.
    fn state_member(&self) -> NodeMemberPointer<Self::State>;
}

/// Frontier of a best-first search.
pub trait OpenList<'a> {
    /// Inserts `node`, or updates its position after its priority improved.
    fn relaxed(&mut self, node: NodeRef<'a>);

    /// Removes and returns the node with the best priority.
    fn next(&mut self) -> Option<NodeRef<'a>>;
}
