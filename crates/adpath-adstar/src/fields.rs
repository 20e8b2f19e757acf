use adpath_core::{NodeBuilder, NodeMemberPointer, Transition};

use crate::Key;

/// Node fields used by AD*.
///
/// Besides these, every node carries its back-pointer in the node header (see
/// [`adpath_core::NodeRef::get_parent`]).
#[derive(Clone, Copy)]
pub struct AdStarFields<S: Copy + 'static> {
    pub(crate) state: NodeMemberPointer<S>,
    pub(crate) g: NodeMemberPointer<f64>,
    pub(crate) v: NodeMemberPointer<f64>,
    // NaN until the heuristic has been evaluated for the node.
    pub(crate) h: NodeMemberPointer<f64>,
    pub(crate) key: NodeMemberPointer<Key>,
    pub(crate) transition: NodeMemberPointer<Option<Transition<S>>>,
    pub(crate) seq: NodeMemberPointer<u64>,
    pub(crate) in_incons: NodeMemberPointer<bool>,
    pub(crate) closed_epoch: NodeMemberPointer<u64>,
}

impl<S: Copy + 'static> AdStarFields<S> {
    /// Adds the AD* fields to a layout that stores states in `state`.
    #[track_caller]
    pub fn new(builder: &mut NodeBuilder, state: NodeMemberPointer<S>) -> Self {
        assert!(
            state.layout_id() == builder.layout_id(),
            "state field belongs to a different layout"
        );
        AdStarFields {
            state,
            g: builder.add_field(f64::INFINITY),
            v: builder.add_field(f64::INFINITY),
            h: builder.add_field(f64::NAN),
            key: builder.add_field(Key::UNREACHED),
            transition: builder.add_field(None),
            seq: builder.add_field(0),
            in_incons: builder.add_field(false),
            closed_epoch: builder.add_field(0),
        }
    }

    pub fn state(&self) -> NodeMemberPointer<S> {
        self.state
    }

    pub fn g(&self) -> NodeMemberPointer<f64> {
        self.g
    }

    pub fn v(&self) -> NodeMemberPointer<f64> {
        self.v
    }

    pub fn key(&self) -> NodeMemberPointer<Key> {
        self.key
    }

    /// The transition that produced each node's current best path.
    pub fn transition(&self) -> NodeMemberPointer<Option<Transition<S>>> {
        self.transition
    }

    /// OPEN list ordering: key first, insertion order on ties.
    pub fn ordering(&self) -> (NodeMemberPointer<Key>, NodeMemberPointer<u64>) {
        (self.key, self.seq)
    }
}
