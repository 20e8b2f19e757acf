use std::cell::Cell;
use std::ptr::NonNull;

use adpath_core::traits::NodePool;
use adpath_core::{Node, NodeAllocator, NodeMemberPointer, NodeRef};

use crate::Grid;

/// Node table with one slot per cell of a `width` × `height` grid.
///
/// Slots are stamped with the search number that filled them, so [`NodePool::reset`] only bumps
/// the number instead of clearing every slot.
pub struct GridPool {
    state_map: Grid<Cell<(u64, *mut Node)>>,
    search_number: u64,
    state_field: NodeMemberPointer<(i32, i32)>,
    allocator: NodeAllocator,
}

impl GridPool {
    #[track_caller]
    pub fn new(
        allocator: NodeAllocator,
        state_field: NodeMemberPointer<(i32, i32)>,
        width: i32,
        height: i32,
    ) -> Self {
        assert!(
            allocator.layout_id() == state_field.layout_id(),
            "mismatched layouts"
        );

        GridPool {
            search_number: 1,
            state_map: Grid::new(width, height, |_, _| Cell::new((0, std::ptr::null_mut()))),
            state_field,
            allocator,
        }
    }

    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.state_map.width()
    }

    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.state_map.height()
    }

    /// Like [`NodePool::generate`], without bounds checking.
    ///
    /// # Safety
    /// The cell must be in-bounds of the pool.
    #[inline(always)]
    #[cfg_attr(debug_assertions, track_caller)]
    pub unsafe fn generate_unchecked(&self, (x, y): (i32, i32)) -> NodeRef<'_> {
        let slot = unsafe { self.state_map.get_unchecked(x, y) };
        let (num, ptr) = slot.get();
        if num == self.search_number {
            debug_assert!(!ptr.is_null());
            // SAFETY: The slot was filled by our allocator during the current search number.
            unsafe { NodeRef::from_raw(NonNull::new_unchecked(ptr)) }
        } else {
            let node = self.allocator.new_node();
            unsafe {
                node.set_unchecked(self.state_field, (x, y));
            }
            slot.set((self.search_number, node.into_raw().as_ptr()));
            node
        }
    }
}

impl NodePool for GridPool {
    type State = (i32, i32);

    fn reset(&mut self) {
        self.search_number = self.search_number.checked_add(1).unwrap_or_else(|| {
            self.state_map
                .storage_mut()
                .fill(Cell::new((0, std::ptr::null_mut())));
            1
        });
        self.allocator.reset();
    }

    /// Panics if the cell is outside the pool.
    #[track_caller]
    #[inline(always)]
    fn generate(&self, state: (i32, i32)) -> NodeRef<'_> {
        let _ = self.state_map[state];
        unsafe { self.generate_unchecked(state) }
    }

    fn get(&self, (x, y): (i32, i32)) -> Option<NodeRef<'_>> {
        let (num, ptr) = self.state_map.get(x, y)?.get();
        // SAFETY: As in `generate_unchecked`.
        (num == self.search_number)
            .then(|| unsafe { NodeRef::from_raw(NonNull::new_unchecked(ptr)) })
    }

    fn state_member(&self) -> NodeMemberPointer<(i32, i32)> {
        self.state_field
    }
}
