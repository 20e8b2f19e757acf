#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
//! Core types and utilities for `adpath`.
//!
//! This crate provides the node arena the search algorithms store their per-state data in, the
//! node pools mapping states to nodes, the intrusive priority queue, and the interfaces through
//! which searches talk to graphs and to cost and heuristic strategies.

mod hash_pool;
mod node;
mod pqueue;
mod transition;
pub mod traits;

pub use crate::hash_pool::*;
pub use crate::node::*;
pub use crate::pqueue::*;
pub use crate::transition::*;
