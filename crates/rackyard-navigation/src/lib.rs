//! Grid mapping, obstacle fields and A* routing for warehouse vehicles.
//!
//! The pathfinder and the obstacle field share one discretization,
//! [`GridConfig`], which is passed explicitly to every call.

pub mod astar;
pub mod error;
pub mod grid;
pub mod obstacle;

pub use astar::{PathFinder, PathResult};
pub use error::NavigationError;
pub use grid::{GridCell, GridConfig};
pub use obstacle::{Endpoint, ObstacleField};
