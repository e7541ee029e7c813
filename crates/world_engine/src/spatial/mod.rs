//! Spatial partitioning for the broad phase

mod grid;

pub use grid::{Grid, GridBox, GridConfig};
