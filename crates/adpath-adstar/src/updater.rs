use adpath_core::traits::{CostFunction, HeuristicFunction};
use adpath_core::{NodeRef, Transition};

use crate::error::{check_epsilon, AdStarError, Result};
use crate::{AdStarFields, Key};

/// Consistency of a node, as seen by the search driver.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeStatus {
    /// Never reached: `g = v = +∞`.
    Unvisited,
    /// `g == v`.
    Consistent,
    /// `g != v`; the node needs to be expanded before its path can be trusted.
    Inconsistent,
}

/// Applies the AD* relaxation and repair rules to single nodes.
///
/// The updater holds no per-search state besides its strategies and the current inflation
/// factor ε, which is read on every key computation.
pub struct NodeUpdater<S: Copy + 'static, C, H> {
    fields: AdStarFields<S>,
    cost: C,
    heuristic: H,
    epsilon: f64,
}

impl<S, C, H> NodeUpdater<S, C, H>
where
    S: Copy + PartialEq + 'static,
    C: CostFunction<S>,
    H: HeuristicFunction<S>,
{
    pub fn new(fields: AdStarFields<S>, cost: C, heuristic: H, epsilon: f64) -> Result<Self> {
        Ok(NodeUpdater {
            fields,
            cost,
            heuristic,
            epsilon: check_epsilon(epsilon)?,
        })
    }

    pub fn fields(&self) -> AdStarFields<S> {
        self.fields
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Changes ε. Keys computed afterwards use the new value; existing keys are not touched.
    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<()> {
        self.epsilon = check_epsilon(epsilon)?;
        Ok(())
    }

    pub fn cost_function(&self) -> &C {
        &self.cost
    }

    /// Mutable access to the cost strategy, e.g. to change edge costs between episodes.
    pub fn cost_function_mut(&mut self) -> &mut C {
        &mut self.cost
    }

    /// A*-style relaxation of `node` through `parent`.
    ///
    /// If `parent.g + cost(transition)` improves on `node.g`, the node takes `parent` as its
    /// parent, the new cost, `transition` as its producing transition and a fresh key, and `true`
    /// is returned. Otherwise nothing changes and `false` is returned.
    ///
    /// Panics if `transition` does not lead from `parent`'s state to `node`'s state.
    #[track_caller]
    pub fn update_consistent<'a>(
        &self,
        node: NodeRef<'a>,
        parent: NodeRef<'a>,
        transition: Transition<S>,
    ) -> Result<bool> {
        self.check_endpoints(node, parent, &transition);
        let candidate = parent.get(self.fields.g) + self.cost(&transition)?;
        if candidate >= node.get(self.fields.g) {
            return Ok(false);
        }
        let h = self.heuristic(node)?;
        node.set_parent(Some(parent));
        node.set(self.fields.g, candidate);
        node.set(self.fields.transition, Some(transition));
        node.set(
            self.fields.key,
            Key::compute(candidate, node.get(self.fields.v), h, self.epsilon),
        );
        Ok(true)
    }

    /// Recomputes `node.g` from all of its predecessors.
    ///
    /// The new cost is the minimum over `(transition, predecessor)` of
    /// `predecessor.v + cost(transition)`, taken over the predecessors' settled estimates. The
    /// first predecessor reaching the minimum becomes the parent. Without any predecessor with a
    /// finite estimate the node is left unreached: `g = +∞`, no parent, no transition. The key
    /// is recomputed either way. Returns whether `g` changed.
    ///
    /// Panics if a transition does not lead from its predecessor's state to `node`'s state.
    #[track_caller]
    pub fn update_inconsistent<'a>(
        &self,
        node: NodeRef<'a>,
        predecessors: impl IntoIterator<Item = (Transition<S>, NodeRef<'a>)>,
    ) -> Result<bool> {
        let mut best_g = f64::INFINITY;
        let mut best = None;
        for (transition, predecessor) in predecessors {
            self.check_endpoints(node, predecessor, &transition);
            let settled = predecessor.get(self.fields.v);
            if settled == f64::INFINITY {
                continue;
            }
            let candidate = settled + self.cost(&transition)?;
            if candidate < best_g {
                best_g = candidate;
                best = Some((transition, predecessor));
            }
        }

        let h = self.heuristic(node)?;
        let old_g = node.get(self.fields.g);
        node.set_parent(best.map(|(_, predecessor)| predecessor));
        node.set(self.fields.transition, best.map(|(transition, _)| transition));
        node.set(self.fields.g, best_g);
        node.set(
            self.fields.key,
            Key::compute(best_g, node.get(self.fields.v), h, self.epsilon),
        );
        Ok(old_g != best_g)
    }

    /// Forces `node.v = +∞`, making any node with a finite `g` inconsistent.
    pub fn set_max_v(&self, node: NodeRef) -> Result<()> {
        node.set(self.fields.v, f64::INFINITY);
        self.refresh_key(node)?;
        Ok(())
    }

    /// Sets `node.v = node.g`, making the node consistent.
    pub fn settle(&self, node: NodeRef) -> Result<()> {
        node.set(self.fields.v, node.get(self.fields.g));
        self.refresh_key(node)?;
        Ok(())
    }

    /// Turns `node` into the root of the search tree: `g = 0`, no parent, no transition.
    pub fn make_start(&self, node: NodeRef) -> Result<()> {
        node.set_parent(None);
        node.set(self.fields.transition, None);
        node.set(self.fields.g, 0.0);
        self.refresh_key(node)?;
        Ok(())
    }

    /// Recomputes and stores the key of `node` with the current ε.
    pub fn refresh_key(&self, node: NodeRef) -> Result<Key> {
        let key = self.key_of(node)?;
        node.set(self.fields.key, key);
        Ok(key)
    }

    /// Key of `node` under the current ε, without storing it.
    pub fn key_of(&self, node: NodeRef) -> Result<Key> {
        let h = self.heuristic(node)?;
        Ok(Key::compute(
            node.get(self.fields.g),
            node.get(self.fields.v),
            h,
            self.epsilon,
        ))
    }

    pub fn status(&self, node: NodeRef) -> NodeStatus {
        let g = node.get(self.fields.g);
        let v = node.get(self.fields.v);
        if g == v {
            if g == f64::INFINITY {
                NodeStatus::Unvisited
            } else {
                NodeStatus::Consistent
            }
        } else {
            NodeStatus::Inconsistent
        }
    }

    pub fn g(&self, node: NodeRef) -> f64 {
        node.get(self.fields.g)
    }

    pub fn v(&self, node: NodeRef) -> f64 {
        node.get(self.fields.v)
    }

    pub fn key(&self, node: NodeRef) -> Key {
        node.get(self.fields.key)
    }

    pub fn transition(&self, node: NodeRef) -> Option<Transition<S>> {
        node.get(self.fields.transition)
    }

    pub fn state(&self, node: NodeRef) -> S {
        node.get(self.fields.state)
    }

    fn cost(&self, transition: &Transition<S>) -> Result<f64> {
        let cost = self.cost.evaluate(transition);
        if cost.is_finite() && cost >= 0.0 {
            Ok(cost)
        } else {
            Err(AdStarError::InvalidCost { cost })
        }
    }

    // The estimate is evaluated once per node and cached.
    fn heuristic(&self, node: NodeRef) -> Result<f64> {
        let cached = node.get(self.fields.h);
        if !cached.is_nan() {
            return Ok(cached);
        }
        let estimate = self.heuristic.estimate(&node.get(self.fields.state));
        if !(estimate.is_finite() && estimate >= 0.0) {
            return Err(AdStarError::InvalidHeuristic { estimate });
        }
        node.set(self.fields.h, estimate);
        Ok(estimate)
    }

    #[track_caller]
    fn check_endpoints(&self, node: NodeRef, parent: NodeRef, transition: &Transition<S>) {
        assert!(
            transition.to() == node.get(self.fields.state),
            "transition does not lead to the updated node"
        );
        assert!(
            transition.from() == parent.get(self.fields.state),
            "transition does not start at the given parent"
        );
    }
}
