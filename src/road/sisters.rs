// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;

use log::debug;

use super::{RoadComponent, RoadComponentRoundtrip};

/// Maximum difference (in meters) between the lengths of two one-way components
/// for them to be considered two carriageways of the same road.
///
/// Carriageways of the same road can differ significantly in length
/// (e.g. around junctions), hence the loose threshold.
pub const DEFAULT_SISTER_TOLERANCE: f64 = 2222.0;

/// Checks if two components are one-way carriageways of the same road:
/// both are one-way and their segment lengths differ by less than `tolerance`.
pub fn are_sisters(a: &RoadComponent, b: &RoadComponent, tolerance: f64) -> bool {
    a.is_oneway() && b.is_oneway() && (a.segment_length() - b.segment_length()).abs() < tolerance
}

/// Two sister [RoadComponents](RoadComponent), viewed together as a single two-way road.
#[derive(Debug, Clone)]
pub struct RoadSuperComponent {
    first: RoadComponent,
    second: RoadComponent,
    roundtrip: Option<RoadComponentRoundtrip>,
}

impl RoadSuperComponent {
    /// Creates a super component from two (already calculated) components.
    ///
    /// The roundtrip goes forward over the complete path of the first component,
    /// and backward over the complete path of the second one. It is only present
    /// if both components have roundtrips, and only complete if both of those are complete.
    pub fn new(first: RoadComponent, second: RoadComponent) -> Self {
        let roundtrip = match (first.roundtrip(), second.roundtrip()) {
            (Some(a), Some(b)) => {
                let forward = a.complete_path().unwrap_or(&a.forward).clone();
                let backward = b.complete_path().unwrap_or(&b.forward).clone();

                let mut r = RoadComponentRoundtrip::new(
                    false,
                    a.beginning.union(&b.ends).copied().collect(),
                    a.ends.union(&b.beginning).copied().collect(),
                    forward,
                    backward,
                );
                r.failed_paths = a
                    .failed_paths
                    .iter()
                    .chain(b.failed_paths.iter())
                    .cloned()
                    .collect();
                Some(r)
            }
            _ => None,
        };

        Self {
            first,
            second,
            roundtrip,
        }
    }

    pub fn first(&self) -> &RoadComponent {
        &self.first
    }

    pub fn second(&self) -> &RoadComponent {
        &self.second
    }

    pub fn roundtrip(&self) -> Option<&RoadComponentRoundtrip> {
        self.roundtrip.as_ref()
    }

    pub fn exit_nodes(&self) -> BTreeSet<i64> {
        self.first
            .exit_nodes()
            .union(self.second.exit_nodes())
            .copied()
            .collect()
    }

    pub fn way_ids(&self) -> BTreeSet<i64> {
        self.first.way_ids().chain(self.second.way_ids()).collect()
    }

    /// Mean segment length of both carriageways, in meters.
    pub fn segment_length(&self) -> f64 {
        (self.first.segment_length() + self.second.segment_length()) * 0.5
    }

    /// Mean length of both carriageways, in meters, if both have complete roundtrips.
    pub fn length(&self) -> Option<f64> {
        self.roundtrip.as_ref().and_then(|r| r.length())
    }
}

/// Part of a road as seen by validation: either a single component,
/// or a pair of one-way sister components.
#[derive(Debug, Clone)]
pub enum LogicalComponent {
    Single(RoadComponent),
    Sisters(RoadSuperComponent),
}

impl LogicalComponent {
    /// Number of graph components making up this logical component (1 or 2).
    pub fn num_comps(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Sisters(_) => 2,
        }
    }

    /// Checks if the logical component is one-way. Sisters make a two-way road.
    pub fn is_oneway(&self) -> bool {
        match self {
            Self::Single(c) => c.is_oneway(),
            Self::Sisters(_) => false,
        }
    }

    pub fn roundtrip(&self) -> Option<&RoadComponentRoundtrip> {
        match self {
            Self::Single(c) => c.roundtrip(),
            Self::Sisters(s) => s.roundtrip(),
        }
    }

    pub fn found_beginning_and_end(&self) -> bool {
        self.roundtrip().is_some()
    }

    pub fn has_complete_roundtrip(&self) -> bool {
        self.roundtrip().is_some_and(|r| r.is_complete())
    }

    /// Length of the complete roundtrip, in meters.
    pub fn length(&self) -> Option<f64> {
        match self {
            Self::Single(c) => c.length(),
            Self::Sisters(s) => s.length(),
        }
    }

    /// Length computed from segments only, regardless of roundtrips, in meters.
    pub fn approx_length(&self) -> f64 {
        match self {
            Self::Single(c) => c.segment_length(),
            Self::Sisters(s) => s.segment_length(),
        }
    }

    pub fn exit_nodes(&self) -> BTreeSet<i64> {
        match self {
            Self::Single(c) => c.exit_nodes().clone(),
            Self::Sisters(s) => s.exit_nodes(),
        }
    }

    pub fn way_ids(&self) -> BTreeSet<i64> {
        match self {
            Self::Single(c) => c.way_ids().collect(),
            Self::Sisters(s) => s.way_ids(),
        }
    }

    /// Returns the underlying graph components.
    pub fn components(&self) -> Vec<&RoadComponent> {
        match self {
            Self::Single(c) => vec![c],
            Self::Sisters(s) => vec![s.first(), s.second()],
        }
    }
}

/// Pairs up sister components. Every component is paired with the first
/// not-yet-paired sister that follows it; components without sisters are kept as they are.
pub fn merge_sisters(components: Vec<RoadComponent>, tolerance: f64) -> Vec<LogicalComponent> {
    let mut pending: Vec<Option<RoadComponent>> = components.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(pending.len());

    for idx in 0..pending.len() {
        let Some(c) = pending[idx].take() else {
            continue;
        };

        let sister_idx = (idx + 1..pending.len()).find(|&j| {
            pending[j]
                .as_ref()
                .is_some_and(|s| are_sisters(&c, s, tolerance))
        });

        match sister_idx.and_then(|j| pending[j].take()) {
            Some(sister) => {
                debug!(
                    "merging sister components of {:.0} m and {:.0} m",
                    c.segment_length(),
                    sister.segment_length(),
                );
                merged.push(LogicalComponent::Sisters(RoadSuperComponent::new(c, sister)));
            }
            None => merged.push(LogicalComponent::Single(c)),
        }
    }

    merged
}
