// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::Segment;

/// A path through a [RoadComponent](super::RoadComponent) between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadComponentPath {
    pub from: i64,
    pub to: i64,

    /// Nodes visited by the path, starting at `from`.
    /// For incomplete paths, the last node is usually not `to`.
    pub nodes: Vec<i64>,

    /// Segments traversed by the path, `nodes.len() - 1` of them.
    pub segments: Vec<Segment>,

    /// True if the path actually reaches `to`. Incomplete paths only show how far
    /// it was possible to get from `from`.
    pub complete: bool,
}

impl RoadComponentPath {
    /// Total length of the path in meters, skipping segments with unknown lengths.
    pub fn length(&self) -> f64 {
        self.segments.iter().map(|s| s.known_length()).sum()
    }

    /// Ids of the ways traversed by the path, in order of traversal, without
    /// consecutive duplicates.
    pub fn way_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.segments.iter().map(|s| s.way_id).collect();
        ids.dedup();
        ids
    }
}

/// A pair of paths between the beginning and the end of a component:
/// `forward` goes from a beginning node to an end node, `backward` the other way round.
///
/// Roundtrips are ordered by "quality", see [RoadComponentRoundtrip::cmp].
#[derive(Debug, Clone)]
pub struct RoadComponentRoundtrip {
    pub oneway: bool,
    pub beginning: BTreeSet<i64>,
    pub ends: BTreeSet<i64>,
    pub forward: RoadComponentPath,
    pub backward: RoadComponentPath,

    /// Incomplete paths collected while searching, for diagnostics.
    pub failed_paths: Vec<RoadComponentPath>,
}

impl RoadComponentRoundtrip {
    pub fn new(
        oneway: bool,
        beginning: BTreeSet<i64>,
        ends: BTreeSet<i64>,
        forward: RoadComponentPath,
        backward: RoadComponentPath,
    ) -> Self {
        let failed_paths = [&forward, &backward]
            .into_iter()
            .filter(|p| !p.complete)
            .cloned()
            .collect();

        Self {
            oneway,
            beginning,
            ends,
            forward,
            backward,
            failed_paths,
        }
    }

    /// One-way roundtrips only need one complete direction, others need both.
    pub fn is_complete(&self) -> bool {
        if self.oneway {
            self.forward.complete || self.backward.complete
        } else {
            self.forward.complete && self.backward.complete
        }
    }

    /// Returns the complete path of a one-way roundtrip (preferring `forward`),
    /// or `forward` for a complete two-way roundtrip.
    pub fn complete_path(&self) -> Option<&RoadComponentPath> {
        if !self.is_complete() {
            None
        } else if self.forward.complete {
            Some(&self.forward)
        } else {
            Some(&self.backward)
        }
    }

    /// Length of the roundtrip, in meters; `None` if the roundtrip is incomplete.
    ///
    /// For one-way roundtrips, this is the length of the complete direction.
    /// Otherwise, this is the mean of both directions, which usually run over
    /// different carriageways.
    pub fn length(&self) -> Option<f64> {
        if !self.is_complete() {
            None
        } else if self.oneway {
            self.complete_path().map(|p| p.length())
        } else {
            Some((self.forward.length() + self.backward.length()) * 0.5)
        }
    }

    /// Combined length of both directions, regardless of their completeness.
    pub fn partial_length(&self) -> f64 {
        self.forward.length() + self.backward.length()
    }
}

impl PartialEq for RoadComponentRoundtrip {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RoadComponentRoundtrip {}

impl PartialOrd for RoadComponentRoundtrip {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoadComponentRoundtrip {
    /// Compares roundtrips by quality: a complete roundtrip is always better than
    /// an incomplete one; longer complete roundtrips are better than shorter ones.
    ///
    /// Incomplete roundtrips are compared by their [partial length](RoadComponentRoundtrip::partial_length).
    /// This is only a heuristic of which one is "closer" to being complete - the
    /// partial paths don't have to be related in any way.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_complete(), other.is_complete()) {
            (true, true) => self
                .length()
                .unwrap_or_default()
                .total_cmp(&other.length().unwrap_or_default()),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.partial_length().total_cmp(&other.partial_length()),
        }
    }
}
