// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Navigability checks of [OpenStreetMap](https://www.openstreetmap.org/) roads.
//!
//! A road (usually a route relation, like a national road or a motorway) is loaded
//! from flat way-node rows into a directed graph. The graph is split into connected
//! components, and for every component the crate tries to find a "roundtrip" -
//! a forward and a backward path between its two extremities. A road whose every
//! component has a complete roundtrip is navigable end-to-end, and the roundtrip lengths
//! give the length of the road.
//!
//! One-way components with nearly equal lengths are treated as two carriageways of the
//! same road and merged into a single logical component.
//!
//! # Example
//!
//! ```no_run
//! let rows = roadaudit::rows::read_rows_from_file(
//!     "path/to/road.tsv.gz",
//!     roadaudit::rows::FileFormat::Unknown,
//! ).expect("failed to load rows");
//!
//! let mut road = roadaudit::Road::from_rows(rows, &roadaudit::DEFAULT_FILTER);
//! road.calculate(&roadaudit::Options::default()).expect("inconsistent road graph");
//!
//! println!("{}", road.summary());
//! ```

use std::collections::HashMap;

use geo_types::Point;

mod distance;
mod graph;
mod kd;
pub mod road;
pub mod rows;
pub mod search;

pub use distance::{earth_distance, parse_point, point_distance};
pub use graph::Graph;
pub use kd::KDTree;
pub use road::{
    LogicalComponent, Options, Relation, Road, RoadComponent, RoadComponentPath,
    RoadComponentRoundtrip, RoadError, RoadSuperComponent, RoundtripOptions, Summary, Way,
    WayFilter, WayRow, DEFAULT_FILTER, LEGACY_FILTER,
};
pub use search::{SearchError, DEFAULT_STEP_LIMIT};

/// Key-value tags of an OSM element.
pub type Tags = HashMap<String, String>;

/// Represents an [OSM node](https://wiki.openstreetmap.org/wiki/Node) referenced by a road.
///
/// Nodes are compared and hashed by their id only.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub id: i64,
    pub tags: Tags,

    /// Position of the node (x = longitude, y = latitude), if its geometry was known
    /// and understood.
    pub location: Option<Point<f64>>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A piece of a [Way] between two consecutive nodes.
///
/// `length` (in meters) comes straight from the input data and may be missing,
/// in which case the segment doesn't contribute to any lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub way_id: i64,
    pub from: i64,
    pub to: i64,
    pub length: Option<f64>,
}

impl Segment {
    /// Returns the length of the segment, treating unknown lengths as zero.
    pub fn known_length(&self) -> f64 {
        self.length.unwrap_or(0.0)
    }
}
