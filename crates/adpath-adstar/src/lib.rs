#![deny(unsafe_op_in_unsafe_fn)]
//! Anytime Dynamic A* (AD*) for `adpath`.
//!
//! The search keeps, for every discovered state, a cost-to-come `g` and a settled estimate `v`.
//! A node is consistent when both agree. [`NodeUpdater`] implements the per-node relaxation and
//! repair rules, and [`AdStar`] drives them: it orders inconsistent nodes by [`Key`], publishes
//! solutions within a factor ε of optimal, lowers ε between episodes, and repairs the search tree
//! in place after the graph changes.

mod config;
mod error;
mod fields;
mod key;
mod search;
mod updater;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::fields::*;
pub use crate::key::*;
pub use crate::search::*;
pub use crate::updater::*;
