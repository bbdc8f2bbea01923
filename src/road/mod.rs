// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;

use log::{debug, info};

use crate::search::SearchError;
use crate::{Graph, Node, Segment};

mod builder;
mod component;
mod filter;
mod model;
mod roundtrip;
mod sisters;

#[cfg(test)]
mod fixtures;

pub use component::{RoadComponent, RoundtripOptions, ONEWAY_THRESHOLD};
pub use filter::{
    is_construction, is_ferry, is_oneway, SkipReason, WayFilter, DEFAULT_FILTER, LEGACY_FILTER,
};
pub use model::{Relation, Way, WayRow};
pub use roundtrip::{RoadComponentPath, RoadComponentRoundtrip};
pub use sisters::{
    are_sisters, merge_sisters, LogicalComponent, RoadSuperComponent, DEFAULT_SISTER_TOLERANCE,
};

/// Relation tag with the expected number of logical components of a road.
pub const COMPONENTS_TAG: &str = "_components";

/// Additional controls for [Road::calculate].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options {
    pub roundtrip: RoundtripOptions,

    /// Maximum difference between segment lengths of one-way components (in meters)
    /// for them to be merged as sisters, see [are_sisters].
    pub sister_tolerance: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            roundtrip: RoundtripOptions::default(),
            sister_tolerance: DEFAULT_SISTER_TOLERANCE,
        }
    }
}

/// Fatal error encountered when calculating a [Road].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RoadError {
    #[error("component {component}: {source}")]
    Search {
        component: usize,
        source: SearchError,
    },
}

/// A road: a directed graph of [Segments](Segment) made from the [Ways](Way)
/// of a relation, split into components by [Road::calculate].
#[derive(Debug, Default)]
pub struct Road {
    relation: Option<Relation>,
    other_relations: Vec<Relation>,
    nodes: BTreeMap<i64, Node>,
    ways: BTreeMap<i64, Way>,
    graph: Graph<i64, Segment>,
    components: Vec<LogicalComponent>,
    correct_num_comps: Option<u32>,
}

impl Road {
    /// Creates a road from way-node rows, see [Road::add_rows].
    pub fn from_rows<I: IntoIterator<Item = WayRow>>(rows: I, filter: &WayFilter) -> Self {
        let mut road = Self::default();
        road.add_rows(rows, filter);
        road
    }

    /// Adds ways from way-node rows into the road.
    ///
    /// Rows must be grouped by way, with nodes in order. Consecutive rows with
    /// the same way id and relation sequence id make up a single way.
    /// Ways rejected by the `filter` and ways which were already added are skipped.
    ///
    /// The first relation id seen becomes the [relation](Road::relation) of the road,
    /// unless one was set beforehand.
    pub fn add_rows<I: IntoIterator<Item = WayRow>>(&mut self, rows: I, filter: &WayFilter) {
        self.try_add_rows(rows.into_iter().map(Ok::<_, Infallible>), filter)
            .unwrap_or_else(|e| match e {})
    }

    /// Like [Road::add_rows], but stops on the first row error.
    /// Ways fully read before the error are kept.
    pub fn try_add_rows<I, E>(&mut self, rows: I, filter: &WayFilter) -> Result<(), E>
    where
        I: IntoIterator<Item = Result<WayRow, E>>,
    {
        builder::RoadBuilder::new(self, filter).add_rows(rows)
    }

    pub fn relation(&self) -> Option<&Relation> {
        self.relation.as_ref()
    }

    pub fn set_relation(&mut self, relation: Relation) {
        self.relation = Some(relation);
    }

    /// Other relations the ways of this road belong to.
    pub fn other_relations(&self) -> &[Relation] {
        &self.other_relations
    }

    pub fn add_other_relation(&mut self, relation: Relation) {
        if self.relation.as_ref().is_some_and(|r| r.id == relation.id)
            || self.other_relations.iter().any(|r| r.id == relation.id)
        {
            return;
        }
        self.other_relations.push(relation);
    }

    pub fn node(&self, id: i64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn way(&self, id: i64) -> Option<&Way> {
        self.ways.get(&id)
    }

    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.ways.values()
    }

    pub fn graph(&self) -> &Graph<i64, Segment> {
        &self.graph
    }

    /// Checks if the road has no ways.
    pub fn is_empty(&self) -> bool {
        self.ways.is_empty()
    }

    /// Splits the graph of the road into components and searches for their roundtrips.
    ///
    /// Components without any segments (made only of single-node ways) and components
    /// made only of ways under construction are not kept. One-way sister components
    /// are merged into [RoadSuperComponents](RoadSuperComponent).
    ///
    /// Replaces results of any previous call; on error, no components are left.
    /// The index in [RoadError::Search] is the position of the failed component
    /// in [Graph::connected_components].
    pub fn calculate(&mut self, options: &Options) -> Result<(), RoadError> {
        self.components.clear();
        let mut components = Vec::default();

        for (idx, vertices) in self.graph.connected_components().into_iter().enumerate() {
            let subgraph = self.graph.induced_subgraph(&vertices);
            if subgraph.edge_count() == 0 {
                debug!("skipping component without segments: {:?}", vertices);
                continue;
            }

            let mut component = RoadComponent::new(subgraph, &self.ways, &self.nodes);
            if component.is_construction_only() {
                debug!(
                    "skipping component of ways under construction: {:?}",
                    component.way_ids().collect::<Vec<_>>(),
                );
                continue;
            }

            component
                .calculate(&options.roundtrip)
                .map_err(|source| RoadError::Search {
                    component: idx,
                    source,
                })?;
            components.push(component);
        }

        self.components = merge_sisters(components, options.sister_tolerance);
        info!(
            "road {}: {} components ({} logical), navigable: {}",
            self.relation.as_ref().map(|r| r.id).unwrap_or_default(),
            self.num_comps(),
            self.num_logical_comps(),
            self.all_components_have_roundtrip(),
        );
        Ok(())
    }

    /// Returns the logical components found by [Road::calculate].
    pub fn components(&self) -> &[LogicalComponent] {
        &self.components
    }

    /// Number of graph components, counting both carriageways of sister components.
    pub fn num_comps(&self) -> usize {
        self.components.iter().map(|c| c.num_comps()).sum()
    }

    /// Number of logical components, counting sister components once.
    pub fn num_logical_comps(&self) -> usize {
        self.components.len()
    }

    /// Expected number of logical components: set with [Road::set_correct_num_comps],
    /// taken from the [COMPONENTS_TAG] of the relation, or 1.
    pub fn correct_num_comps(&self) -> u32 {
        self.correct_num_comps
            .or_else(|| {
                self.relation
                    .as_ref()
                    .and_then(|r| r.tags.get(COMPONENTS_TAG))
                    .and_then(|v| v.trim().parse().ok())
            })
            .unwrap_or(1)
    }

    pub fn set_correct_num_comps(&mut self, n: u32) {
        self.correct_num_comps = Some(n);
    }

    /// Checks if every component has a complete roundtrip.
    pub fn all_components_have_roundtrip(&self) -> bool {
        self.components.iter().all(|c| c.has_complete_roundtrip())
    }

    /// Length of the road in kilometers: the sum of roundtrip lengths of all components.
    /// `None` if there are no components, or some component has no complete roundtrip.
    pub fn length(&self) -> Option<f64> {
        if self.components.is_empty() {
            return None;
        }

        self.components
            .iter()
            .map(|c| c.length())
            .sum::<Option<f64>>()
            .map(|meters| meters / 1000.0)
    }

    /// Length of the road in kilometers computed from the segments only,
    /// regardless of roundtrips. `None` if there are no components.
    pub fn approx_length(&self) -> Option<f64> {
        if self.components.is_empty() {
            return None;
        }

        let meters: f64 = self.components.iter().map(|c| c.approx_length()).sum();
        Some(meters / 1000.0)
    }

    /// Returns all incomplete paths of all roundtrips.
    pub fn failed_paths(&self) -> impl Iterator<Item = &RoadComponentPath> {
        self.components
            .iter()
            .filter_map(|c| c.roundtrip())
            .flat_map(|r| r.failed_paths.iter())
    }

    pub fn summary(&self) -> Summary {
        Summary {
            relation_id: self.relation.as_ref().map(|r| r.id),
            num_comps: self.num_comps(),
            num_logical_comps: self.num_logical_comps(),
            correct_num_comps: self.correct_num_comps(),
            complete: self
                .components
                .iter()
                .filter(|c| c.has_complete_roundtrip())
                .count(),
            length: self.length(),
            approx_length: self.approx_length(),
            failed_paths: self.failed_paths().count(),
        }
    }
}

/// Overview of a calculated [Road].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub relation_id: Option<i64>,
    pub num_comps: usize,
    pub num_logical_comps: usize,
    pub correct_num_comps: u32,

    /// Number of logical components with complete roundtrips.
    pub complete: usize,

    /// Length in kilometers, see [Road::length].
    pub length: Option<f64>,

    /// Approximate length in kilometers, see [Road::approx_length].
    pub approx_length: Option<f64>,
    pub failed_paths: usize,
}

impl Summary {
    /// Checks if the road is in one piece (as expected) and every piece is navigable.
    pub fn is_navigable(&self) -> bool {
        self.num_logical_comps > 0
            && self.complete == self.num_logical_comps
            && self.num_logical_comps == self.correct_num_comps as usize
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.relation_id {
            Some(id) => write!(f, "relation {}: ", id)?,
            None => write!(f, "road: ")?,
        }

        write!(
            f,
            "{} components ({} logical, {} expected), {}/{} navigable",
            self.num_comps,
            self.num_logical_comps,
            self.correct_num_comps,
            self.complete,
            self.num_logical_comps,
        )?;

        match (self.length, self.approx_length) {
            (Some(l), _) => write!(f, ", length {:.3} km", l)?,
            (None, Some(l)) => write!(f, ", length ~{:.3} km", l)?,
            (None, None) => {}
        }

        if self.failed_paths > 0 {
            write!(f, ", {} failed paths", self.failed_paths)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{tags, way_rows};
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-6),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    fn calculated(rows: Vec<WayRow>) -> Road {
        let mut road = Road::from_rows(rows, &DEFAULT_FILTER);
        road.calculate(&Options::default()).unwrap();
        road
    }

    #[test]
    fn straight_road() {
        // 1 ─ 2 ─ 3 ─ 4 ─ 5
        let road = calculated(way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2, 3, 4, 5], 100.0));

        assert!(!road.is_empty());
        assert_eq!(road.num_comps(), 1);
        assert_eq!(road.num_logical_comps(), 1);

        let c = &road.components()[0];
        assert!(!c.is_oneway());
        assert!(c.found_beginning_and_end());
        assert_eq!(c.exit_nodes(), std::collections::BTreeSet::from([1, 5]));

        assert!(road.all_components_have_roundtrip());
        assert_almost_eq!(road.length().unwrap(), 0.4);
        assert_almost_eq!(road.approx_length().unwrap(), 0.4);
        assert_eq!(road.failed_paths().count(), 0);
        assert!(road.summary().is_navigable());
    }

    #[test]
    fn oneway_road() {
        // 1 → 2 → 3 → 4 → 5
        let road = calculated(way_rows(
            1,
            0,
            tags(&[("highway", "primary"), ("oneway", "yes")]),
            &[1, 2, 3, 4, 5],
            100.0,
        ));

        assert_eq!(road.graph().edge_count(), 4);
        assert_eq!(road.num_comps(), 1);
        assert!(road.components()[0].is_oneway());
        assert!(road.all_components_have_roundtrip());
        assert_almost_eq!(road.length().unwrap(), 0.4);
        assert_eq!(road.failed_paths().count(), 1);
    }

    #[test]
    fn disconnected_road() {
        // 1 ─ 2   3 ─ 4
        let mut rows = way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2], 100.0);
        rows.extend(way_rows(2, 0, tags(&[("highway", "primary")]), &[3, 4], 150.0));
        let road = calculated(rows);

        assert_eq!(road.num_comps(), 2);
        assert_eq!(road.num_logical_comps(), 2);
        assert_almost_eq!(road.length().unwrap(), 0.25);
        assert!(!road.summary().is_navigable());
    }

    #[test]
    fn proposed_way() {
        let mut rows = way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2, 3], 100.0);
        rows.extend(way_rows(2, 0, tags(&[("highway", "proposed")]), &[3, 4, 5], 100.0));
        let road = calculated(rows);

        assert!(road.way(2).is_none());
        assert!(road.node(4).is_none());
        assert_eq!(road.graph().len(), 3);
        assert_eq!(road.num_comps(), 1);
        assert_almost_eq!(road.length().unwrap(), 0.2);
    }

    #[test]
    fn sister_carriageways() {
        // 1 → 2 → 3
        // 13 → 12 → 11
        let mut rows = way_rows(
            1,
            0,
            tags(&[("highway", "motorway"), ("oneway", "yes")]),
            &[1, 2, 3],
            2500.0,
        );
        rows.extend(way_rows(
            2,
            0,
            tags(&[("highway", "motorway"), ("oneway", "yes")]),
            &[13, 12, 11],
            2550.0,
        ));
        let road = calculated(rows);

        assert_eq!(road.num_comps(), 2);
        assert_eq!(road.num_logical_comps(), 1);
        assert!(matches!(road.components()[0], LogicalComponent::Sisters(_)));
        assert!(road.all_components_have_roundtrip());
        assert_almost_eq!(road.length().unwrap(), 5.05);
        assert_almost_eq!(road.approx_length().unwrap(), 5.05);
        assert!(road.summary().is_navigable());
    }

    #[test]
    fn construction_component() {
        // 1 ─ 2 ─ 3   4 ┄ 5
        let mut rows = way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2, 3], 100.0);
        rows.extend(way_rows(2, 0, tags(&[("highway", "construction")]), &[4, 5], 100.0));
        let road = calculated(rows);

        assert!(road.way(2).is_some());
        assert_eq!(road.num_comps(), 1);
        assert_almost_eq!(road.length().unwrap(), 0.2);
    }

    #[test]
    fn single_node_component() {
        let mut rows = way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2], 100.0);
        rows.extend(way_rows(2, 0, tags(&[("highway", "primary")]), &[7], 100.0));
        let road = calculated(rows);

        assert_eq!(road.graph().len(), 3);
        assert_eq!(road.num_comps(), 1);
    }

    #[test]
    fn incomplete_road() {
        // 1 ─ 2 ─ 3 → 4 → 5
        let mut rows = way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2, 3], 100.0);
        rows.extend(way_rows(
            2,
            0,
            tags(&[("highway", "primary"), ("oneway", "yes")]),
            &[3, 4, 5],
            100.0,
        ));
        let road = calculated(rows);

        assert!(!road.all_components_have_roundtrip());
        assert_eq!(road.length(), None);
        assert_almost_eq!(road.approx_length().unwrap(), 0.4);
        assert_eq!(road.failed_paths().count(), 1);

        let summary = road.summary();
        assert_eq!(summary.complete, 0);
        assert!(!summary.is_navigable());
        assert_eq!(
            summary.to_string(),
            "relation 100: 1 components (1 logical, 1 expected), 0/1 navigable, length ~0.400 km, 1 failed paths",
        );
    }

    #[test]
    fn empty_road() {
        let mut road = Road::default();
        road.calculate(&Options::default()).unwrap();

        assert!(road.is_empty());
        assert_eq!(road.num_comps(), 0);
        assert_eq!(road.length(), None);
        assert_eq!(road.approx_length(), None);
        assert!(!road.summary().is_navigable());
        assert_eq!(
            road.summary().to_string(),
            "road: 0 components (0 logical, 1 expected), 0/0 navigable",
        );
    }

    #[test]
    fn relations() {
        let mut rows = way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2], 100.0);
        let mut other = way_rows(2, 0, tags(&[("highway", "primary")]), &[2, 3], 100.0);
        other.iter_mut().for_each(|r| r.relation_id = Some(200));
        rows.extend(other);

        let road = Road::from_rows(rows, &DEFAULT_FILTER);
        assert_eq!(road.relation().map(|r| r.id), Some(100));
        assert_eq!(
            road.other_relations().iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![200],
        );
    }

    #[test]
    fn correct_num_comps() {
        let mut road = Road::default();
        assert_eq!(road.correct_num_comps(), 1);

        road.set_relation(Relation {
            id: 1,
            tags: tags(&[("ref", "7"), (COMPONENTS_TAG, "2")]),
        });
        assert_eq!(road.correct_num_comps(), 2);

        road.set_correct_num_comps(3);
        assert_eq!(road.correct_num_comps(), 3);
    }

    #[test]
    fn missing_label_after_skipped_components() {
        // 1   2 ┄ 3   4 ─ 5 ─ 6
        let mut rows = way_rows(1, 0, tags(&[("highway", "primary")]), &[1], 100.0);
        rows.extend(way_rows(2, 0, tags(&[("highway", "construction")]), &[2, 3], 100.0));
        rows.extend(way_rows(3, 0, tags(&[("highway", "primary")]), &[4, 5, 6], 100.0));
        let mut road = Road::from_rows(rows, &DEFAULT_FILTER);

        road.calculate(&Options::default()).unwrap();
        assert_eq!(road.num_comps(), 1);

        road.graph.take_label(5, 6);
        assert_eq!(
            road.calculate(&Options::default()),
            Err(RoadError::Search {
                component: 2,
                source: SearchError::MissingLabel(5, 6),
            }),
        );
        assert!(road.components().is_empty());
        assert_eq!(road.num_comps(), 0);
    }

    #[test]
    fn missing_label() {
        let mut road = Road::from_rows(
            way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2, 3], 100.0),
            &DEFAULT_FILTER,
        );
        road.graph.take_label(2, 3);

        assert_eq!(
            road.calculate(&Options::default()),
            Err(RoadError::Search {
                component: 0,
                source: SearchError::MissingLabel(2, 3),
            }),
        );
    }
}
