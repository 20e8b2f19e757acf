use std::alloc::Layout;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::process::abort;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

use bumpalo::Bump;

/// Identifies the field layout a node or member pointer belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LayoutId(u64);

/// Header at the start of every node allocation.
///
/// Nodes are only accessed through [`NodeRef`]. The fields declared with
/// [`NodeBuilder::add_field`] follow the header in memory.
pub struct Node {
    layout_id: LayoutId,
    parent: Cell<Option<NonNull<Node>>>,
}

/// Declares the fields of a node layout.
pub struct NodeBuilder {
    layout_id: LayoutId,
    layout: Layout,
    default: Vec<u8>,
}

/// Non-owning handle to a node living in a [`NodeAllocator`].
///
/// The handle is only valid for the lifetime of the borrow of the allocator that produced it.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    ptr: NonNull<Node>,
    _marker: PhantomData<Cell<&'a ()>>,
}

/// Typed offset of a field within a node layout.
pub struct NodeMemberPointer<T> {
    layout_id: LayoutId,
    offset: usize,
    _marker: PhantomData<T>,
}

/// Bump arena allocating nodes of a single layout.
pub struct NodeAllocator {
    layout_id: LayoutId,
    default: Box<[u8]>,
    layout: Layout,
    arena: Bump,
}

static LAYOUT_ID: AtomicU64 = AtomicU64::new(0);

impl NodeBuilder {
    /// Starts a new layout containing only the node header.
    pub fn new() -> NodeBuilder {
        let layout_id = LAYOUT_ID.fetch_add(1, Ordering::SeqCst);
        if layout_id == u64::MAX {
            // Layout ids must never be shared between layouts, and wrapping the counter would
            // share them. Panicking is not enough since the increment already happened.
            abort();
        }
        let layout_id = LayoutId(layout_id);
        let layout = Layout::new::<Node>();
        let mut default = vec![0; layout.size()];
        unsafe {
            // We use `write_unaligned` here because the vector holding the default value has no
            // alignment guarantees.
            // SAFETY: The buffer is sized appropriately to store a `Node` header.
            default.as_mut_ptr().cast::<Node>().write_unaligned(Node {
                layout_id,
                parent: Cell::new(None),
            });
        }
        NodeBuilder {
            layout_id,
            default,
            layout,
        }
    }

    /// Adds a field to the layout, initialized to `default` in every new node.
    pub fn add_field<T: Copy + 'static>(&mut self, default: T) -> NodeMemberPointer<T> {
        let (layout, offset) = self
            .layout
            .extend(Layout::new::<T>())
            .expect("node layout exceeds isize::MAX bytes");
        self.default.resize(layout.size(), 0);
        unsafe {
            // SAFETY: The buffer is sized according to `layout` and the offset refers to a field
            //         of the `layout`, and so this must be in-bounds of the buffer. We do not drop
            //         the old bytes, but `T: Copy` so there is nothing to drop.
            self.default
                .as_mut_ptr()
                .add(offset)
                .cast::<T>()
                .write_unaligned(default);
        }
        self.layout = layout;
        NodeMemberPointer {
            layout_id: self.layout_id,
            offset,
            _marker: PhantomData,
        }
    }

    /// Finishes the layout.
    pub fn build(self) -> NodeAllocator {
        self.build_with_capacity(0)
    }

    /// Finishes the layout, reserving arena space for `nodes` nodes up front.
    pub fn build_with_capacity(self, nodes: usize) -> NodeAllocator {
        let layout = self.layout.pad_to_align();
        let mut default = self.default;
        default.resize(layout.size(), 0);
        NodeAllocator {
            layout_id: self.layout_id,
            default: default.into_boxed_slice(),
            layout,
            arena: Bump::with_capacity(layout.size().saturating_mul(nodes)),
        }
    }

    /// Layout id shared by every member pointer and node of this layout.
    pub fn layout_id(&self) -> LayoutId {
        self.layout_id
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        NodeBuilder::new()
    }
}

impl NodeAllocator {
    /// Frees every node. Requires exclusive access, so no [`NodeRef`] can outlive this.
    pub fn reset(&mut self) {
        self.arena.reset();
    }

    /// Allocates a node with every field set to its default.
    pub fn new_node(&self) -> NodeRef<'_> {
        let ptr = self.arena.alloc_layout(self.layout);
        unsafe {
            // SAFETY: We have the invariant that `self.default` is valid bytes for initializing a
            //         node, which means it is sized appropriately.
            std::ptr::copy_nonoverlapping(self.default.as_ptr(), ptr.as_ptr(), self.layout.size());
        }
        NodeRef {
            ptr: ptr.cast(),
            _marker: PhantomData,
        }
    }

    /// Layout id of the nodes this allocator produces.
    #[inline(always)]
    pub fn layout_id(&self) -> LayoutId {
        self.layout_id
    }
}

impl<'a> NodeRef<'a> {
    /// Reads a field.
    ///
    /// Panics if the member pointer belongs to a different layout.
    #[track_caller]
    #[inline(always)]
    pub fn get<T: Copy + 'static>(self, f: NodeMemberPointer<T>) -> T {
        self.check_layout(f.layout_id);
        // SAFETY: We have checked that the member pointer is for the layout `self` has.
        unsafe { self.get_unchecked(f) }
    }

    /// Writes a field.
    ///
    /// Panics if the member pointer belongs to a different layout.
    #[track_caller]
    #[inline(always)]
    pub fn set<T: Copy + 'static>(self, f: NodeMemberPointer<T>, value: T) {
        self.check_layout(f.layout_id);
        // SAFETY: We have checked that the member pointer is for the layout `self` has.
        unsafe { self.set_unchecked(f, value) }
    }

    /// Whether the member pointer belongs to this node's layout.
    #[inline(always)]
    pub fn has_field<T: Copy + 'static>(self, f: NodeMemberPointer<T>) -> bool {
        self.layout_id() == f.layout_id
    }

    /// Parent in the search tree, if any.
    #[inline(always)]
    pub fn get_parent(self) -> Option<NodeRef<'a>> {
        self.header().parent.get().map(|ptr| NodeRef {
            ptr,
            _marker: PhantomData,
        })
    }

    /// Replaces the parent in the search tree.
    #[inline(always)]
    pub fn set_parent(self, parent: Option<NodeRef<'a>>) {
        self.header().parent.set(parent.map(|node| node.ptr));
    }

    /// Reads a field without checking the layout.
    ///
    /// # Safety
    /// `f` must belong to the layout of this node.
    #[cfg_attr(debug_assertions, track_caller)]
    #[inline(always)]
    pub unsafe fn get_unchecked<T: Copy + 'static>(self, f: NodeMemberPointer<T>) -> T {
        #[cfg(debug_assertions)]
        self.check_layout(f.layout_id);
        // SAFETY: Since `f` is for the layout of this node, there exists an object of type T at
        //         the specified offset from this node's pointer.
        unsafe { self.ptr.as_ptr().cast::<u8>().add(f.offset).cast::<T>().read() }
    }

    /// Writes a field without checking the layout.
    ///
    /// # Safety
    /// `f` must belong to the layout of this node.
    #[cfg_attr(debug_assertions, track_caller)]
    #[inline(always)]
    pub unsafe fn set_unchecked<T: Copy + 'static>(self, f: NodeMemberPointer<T>, value: T) {
        #[cfg(debug_assertions)]
        self.check_layout(f.layout_id);
        // We do not need to drop the existing object because `T: Copy`.
        // SAFETY: Since `f` is for the layout of this node, there exists an object of type T at
        //         the specified offset from this node's pointer.
        unsafe {
            self.ptr
                .as_ptr()
                .cast::<u8>()
                .add(f.offset)
                .cast::<T>()
                .write(value)
        }
    }

    /// Whether both nodes share a layout.
    #[inline(always)]
    pub fn same_layout(self, other: NodeRef) -> bool {
        self.layout_id() == other.layout_id()
    }

    /// Whether both handles refer to the same node.
    #[inline(always)]
    pub fn ptr_eq(self, other: NodeRef) -> bool {
        self.ptr == other.ptr
    }

    /// Converts the handle into a raw pointer, e.g. for storage in a state map.
    #[inline(always)]
    pub fn into_raw(self) -> NonNull<Node> {
        self.ptr
    }

    /// Recreates a handle from [`NodeRef::into_raw`].
    ///
    /// # Safety
    /// The pointer must come from `into_raw` on a node whose allocator is still borrowed for `'a`
    /// and has not been reset since.
    #[inline(always)]
    pub unsafe fn from_raw(ptr: NonNull<Node>) -> Self {
        NodeRef {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Layout id of this node.
    #[inline(always)]
    pub fn layout_id(self) -> LayoutId {
        self.header().layout_id
    }

    #[inline(always)]
    fn header(&self) -> &'a Node {
        // SAFETY: The pointer refers to a live node for `'a`, and the header is only ever
        //         mutated through the `Cell`.
        unsafe { &*self.ptr.as_ptr() }
    }

    #[track_caller]
    #[inline(always)]
    fn check_layout(&self, layout_id: LayoutId) {
        if self.layout_id() != layout_id {
            panic!("mismatched layout");
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.ptr).finish()
    }
}

impl<T> NodeMemberPointer<T> {
    /// Layout id this member belongs to.
    #[inline(always)]
    pub fn layout_id(&self) -> LayoutId {
        self.layout_id
    }

    /// Whether both member pointers belong to the same layout.
    #[inline(always)]
    pub fn same_layout<U>(&self, other: NodeMemberPointer<U>) -> bool {
        self.layout_id == other.layout_id
    }
}

impl<T> Clone for NodeMemberPointer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeMemberPointer<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_start_at_their_defaults() {
        let mut builder = NodeBuilder::new();
        let g = builder.add_field(f64::INFINITY);
        let flag = builder.add_field(true);
        let pair = builder.add_field((-1i32, 7i32));
        let alloc = builder.build();

        let node = alloc.new_node();
        assert_eq!(node.get(g), f64::INFINITY);
        assert!(node.get(flag));
        assert_eq!(node.get(pair), (-1, 7));
        assert!(node.get_parent().is_none());

        node.set(g, 2.5);
        node.set(pair, (3, 4));
        assert_eq!(node.get(g), 2.5);
        assert_eq!(node.get(pair), (3, 4));

        let other = alloc.new_node();
        assert_eq!(other.get(g), f64::INFINITY);
    }

    #[test]
    fn parent_pointers_link_nodes() {
        let alloc = NodeBuilder::new().build();
        let root = alloc.new_node();
        let child = alloc.new_node();
        child.set_parent(Some(root));
        assert!(child.get_parent().is_some_and(|p| p.ptr_eq(root)));
        assert!(!child.ptr_eq(root));
        child.set_parent(None);
        assert!(child.get_parent().is_none());
    }

    #[test]
    #[should_panic(expected = "mismatched layout")]
    fn foreign_member_pointer_is_rejected() {
        let mut a = NodeBuilder::new();
        let mut b = NodeBuilder::new();
        let _ = a.add_field(0u32);
        let foreign = b.add_field(0u32);
        let alloc = a.build();
        alloc.new_node().get(foreign);
    }

    #[test]
    fn layouts_are_distinct() {
        let mut a = NodeBuilder::new();
        let mut b = NodeBuilder::new();
        let fa = a.add_field(0u8);
        let fb = b.add_field(0u8);
        assert!(!fa.same_layout(fb));
        let alloc = a.build_with_capacity(16);
        assert!(alloc.new_node().has_field(fa));
        assert!(!alloc.new_node().has_field(fb));
    }
}
