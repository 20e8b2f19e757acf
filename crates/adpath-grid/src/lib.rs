//! Grid maps for `adpath`.
//!
//! Cells are `(x, y)` pairs with `y` growing southwards. A [`GridGraph`] turns a [`BitGrid`] into
//! a 4- or 8-connected graph the searches can expand, and [`GridPool`] stores one node per cell.

mod baseline;
mod bitgrid;
mod direction;
mod distance;
mod graph;
mod grid;
mod grid_pool;

pub mod movingai;

pub use self::baseline::*;
pub use self::bitgrid::*;
pub use self::direction::*;
pub use self::distance::*;
pub use self::graph::*;
pub use self::grid::*;
pub use self::grid_pool::*;
