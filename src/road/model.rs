// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::filter;
use crate::{Segment, Tags};

/// Represents an [OSM way](https://wiki.openstreetmap.org/wiki/Way) belonging to a road.
///
/// Ways are compared and hashed by their id only.
#[derive(Debug, Clone, Default)]
pub struct Way {
    pub id: i64,

    /// Role of the way in its relation: `""`, `"member"`, `"route"`, `"forward"`, `"backward"`, ...
    pub role: String,
    pub tags: Tags,
    pub last_update: Option<String>,

    /// Segments between consecutive nodes of the way, in order.
    pub segments: Vec<Segment>,
    pub in_relation: bool,
    pub relation_id: Option<i64>,
}

impl Way {
    /// Checks if the way is one-way (`oneway=yes|true|1`, or a roundabout).
    pub fn is_oneway(&self) -> bool {
        filter::is_oneway(&self.tags)
    }

    /// Checks if the way is under construction (`highway=construction`).
    pub fn is_construction(&self) -> bool {
        filter::is_construction(&self.tags)
    }

    /// Checks if the way is a ferry route (`route=ferry`).
    pub fn is_ferry(&self) -> bool {
        filter::is_ferry(&self.tags)
    }

    /// Total length of all segments, in meters, skipping segments with unknown lengths.
    pub fn length(&self) -> f64 {
        self.segments.iter().map(|s| s.known_length()).sum()
    }

    /// Ids of the way's nodes, in order.
    pub fn node_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.segments.iter().map(|s| s.from).collect();
        if let Some(last) = self.segments.last() {
            ids.push(last.to);
        }
        ids
    }
}

impl PartialEq for Way {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Way {}

impl std::hash::Hash for Way {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Represents an [OSM relation](https://wiki.openstreetmap.org/wiki/Relation) describing a road.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relation {
    pub id: i64,
    pub tags: Tags,
}

/// A single way-node row of input data.
///
/// Rows must be grouped by way (and by relation membership), with the nodes of a way
/// in order. `node_dist_to_next` is the length (in meters) of the segment from this node
/// to the next node of the same way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WayRow {
    /// Sequence number of the relation membership, distinguishing subsequent
    /// occurrences of the same way.
    pub relation_sequence_id: i64,
    pub relation_id: Option<i64>,
    pub way_id: i64,
    pub member_role: String,
    pub way_tags: Tags,
    pub way_last_update: Option<String>,
    pub node_id: i64,
    pub node_tags: Tags,

    /// Geometry of the node as (E)WKT text.
    pub node_geom: Option<String>,
    pub node_dist_to_next: Option<f64>,
}
