//! Scene graph
//!
//! Provides the entity tree with:
//! - Positioned, sized nodes with ordered children
//! - Tile grid maps addressed by column and row
//! - Lazy leaf and subtree traversals
//! - Change events for positions, sizes and children

mod graph;
mod grid;
mod iter;
mod node;

pub use graph::{Scene, SceneError, SceneEvent};
pub use grid::{GridCoord, GridMap, GridSize, Tile};
pub use iter::{Leaves, Tiles, Visit, Walk};
pub use node::{Children, Name, Node, Parent};
