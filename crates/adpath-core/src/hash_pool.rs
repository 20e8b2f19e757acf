use std::cell::RefCell;
use std::hash::Hash;
use std::ptr::NonNull;

use ahash::AHashMap;

use crate::node::{Node, NodeAllocator, NodeMemberPointer, NodeRef};
use crate::traits::NodePool;

/// Node table for arbitrary hashable states.
pub struct HashPool<S: Copy> {
    state_field: NodeMemberPointer<S>,
    allocator: NodeAllocator,
    // We use RefCell instead of UnsafeCell since the Hash implementation for S could
    // theoretically reentrantly call HashPool::generate, which would cause UB.
    map: RefCell<AHashMap<S, NonNull<Node>>>,
}

impl<S: Copy + Hash + Eq + 'static> HashPool<S> {
    /// Creates an empty pool. `state_field` must belong to the allocator's layout.
    #[track_caller]
    pub fn new(allocator: NodeAllocator, state_field: NodeMemberPointer<S>) -> Self {
        assert!(
            allocator.layout_id() == state_field.layout_id(),
            "mismatched layouts"
        );
        HashPool {
            state_field,
            allocator,
            map: RefCell::new(AHashMap::new()),
        }
    }

    /// Number of nodes generated since the last reset.
    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    /// Whether no node has been generated since the last reset.
    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}

impl<S: Copy + Hash + Eq + 'static> NodePool for HashPool<S> {
    type State = S;

    fn reset(&mut self) {
        self.map.get_mut().clear();
        self.allocator.reset();
    }

    fn generate(&self, state: S) -> NodeRef<'_> {
        unsafe {
            // SAFETY: Every pointer in the map was produced by our allocator since its last reset.
            NodeRef::from_raw(*self.map.borrow_mut().entry(state).or_insert_with(|| {
                let node = self.allocator.new_node();
                node.set(self.state_field, state);
                node.into_raw()
            }))
        }
    }

    fn get(&self, state: S) -> Option<NodeRef<'_>> {
        self.map
            .borrow()
            .get(&state)
            // SAFETY: As in `generate`.
            .map(|&ptr| unsafe { NodeRef::from_raw(ptr) })
    }

    fn state_member(&self) -> NodeMemberPointer<S> {
        self.state_field
    }
}
