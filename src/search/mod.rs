// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Path search over node-id [Graphs](crate::Graph).

mod bfs;
mod dijkstra;
mod error;
mod finder;

pub use bfs::{bfs_any_path, AnyPath};
pub use dijkstra::{dijkstra, ShortestPaths};
pub use error::{SearchError, DEFAULT_STEP_LIMIT};
pub use finder::PathFinder;

use crate::Segment;

/// Non-negative cost of traversing an edge carrying this label.
pub trait Weight {
    fn weight(&self) -> f64;
}

impl Weight for Segment {
    fn weight(&self) -> f64 {
        self.known_length()
    }
}

impl Weight for f64 {
    fn weight(&self) -> f64 {
        *self
    }
}
