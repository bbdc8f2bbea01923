// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet};

use geo_types::Point;
use log::{debug, warn};

use super::{RoadComponentPath, RoadComponentRoundtrip, Way};
use crate::search::{bfs_any_path, PathFinder, SearchError, Weight, DEFAULT_STEP_LIMIT};
use crate::{point_distance, Graph, KDTree, Node, Segment};

/// Minimal fraction of the length of a component covered by one-way ways,
/// for the component to be considered one-way.
pub const ONEWAY_THRESHOLD: f64 = 0.9;

/// Tunables of the roundtrip search, see [RoadComponent::calculate].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundtripOptions {
    /// Radius (in meters) around exit nodes in which other nodes are
    /// considered additional beginning/end candidates.
    pub close_node_radius: f64,

    /// Maximum number of additional candidates per exit node.
    pub close_node_limit: usize,

    /// Candidates closer (crow-flies) than this fraction of the component's length
    /// are joined by synthetic edges, and treated as a single beginning or end.
    pub proximity_fraction: f64,

    /// Upper limit (in meters) for the `proximity_fraction` threshold.
    pub proximity_cap: f64,

    /// Proximity threshold (in meters) used when looking for the most distant nodes
    /// reachable from the candidates.
    pub expansion_proximity_cap: f64,

    /// Step limit for the breadth-first search of partial paths.
    pub step_limit: usize,
}

impl Default for RoundtripOptions {
    fn default() -> Self {
        Self {
            close_node_radius: 650.0,
            close_node_limit: 6,
            proximity_fraction: 0.1,
            proximity_cap: 2000.0,
            expansion_proximity_cap: 300.0,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }
}

/// A connected part of the graph of a [Road](super::Road).
#[derive(Debug, Clone)]
pub struct RoadComponent {
    graph: Graph<i64, Segment>,
    ways: BTreeMap<i64, Way>,
    locations: BTreeMap<i64, Point<f64>>,
    oneway: bool,
    exit_nodes: BTreeSet<i64>,
    segment_length: f64,
    roundtrip: Option<RoadComponentRoundtrip>,
}

impl RoadComponent {
    /// Wraps a connected subgraph of a road. `ways` and `nodes` may contain
    /// elements outside of the component - only the ones used by `graph` are kept.
    pub fn new(
        graph: Graph<i64, Segment>,
        ways: &BTreeMap<i64, Way>,
        nodes: &BTreeMap<i64, Node>,
    ) -> Self {
        let way_ids: BTreeSet<i64> = graph
            .edges()
            .filter_map(|(_, _, label)| label.map(|s| s.way_id))
            .collect();

        let ways: BTreeMap<i64, Way> = way_ids
            .iter()
            .filter_map(|id| ways.get(id).map(|w| (*id, w.clone())))
            .collect();

        let locations = graph
            .vertices()
            .filter_map(|id| nodes.get(&id).and_then(|n| n.location).map(|p| (id, p)))
            .collect();

        let undirected = graph.to_undirected();
        let exit_nodes = graph
            .vertices()
            .filter(|&v| undirected.out_degree(v) <= 1)
            .collect();

        let segment_length = ways.values().map(|w| w.length()).sum();
        let oneway = !graph.is_cyclic() && oneway_fraction(&ways) >= ONEWAY_THRESHOLD;

        let component = Self {
            graph,
            ways,
            locations,
            oneway,
            exit_nodes,
            segment_length,
            roundtrip: None,
        };

        debug!(
            "component of {} nodes and {} ways: oneway={} exit nodes={:?}",
            component.graph.len(),
            component.ways.len(),
            component.oneway,
            component.exit_nodes,
        );

        component
    }

    pub fn graph(&self) -> &Graph<i64, Segment> {
        &self.graph
    }

    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.ways.values()
    }

    pub fn way_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.ways.keys().copied()
    }

    /// Checks if the component is one-way: its directed graph has no cycles and at least
    /// [ONEWAY_THRESHOLD] of its length is made up of one-way ways.
    pub fn is_oneway(&self) -> bool {
        self.oneway
    }

    /// Nodes with at most one neighbor - dead ends and tips of branches.
    pub fn exit_nodes(&self) -> &BTreeSet<i64> {
        &self.exit_nodes
    }

    /// Total length of all segments of the component, in meters.
    pub fn segment_length(&self) -> f64 {
        self.segment_length
    }

    /// Checks if every way of the component is under construction.
    pub fn is_construction_only(&self) -> bool {
        !self.ways.is_empty() && self.ways.values().all(|w| w.is_construction())
    }

    /// Returns the best roundtrip found by [RoadComponent::calculate].
    pub fn roundtrip(&self) -> Option<&RoadComponentRoundtrip> {
        self.roundtrip.as_ref()
    }

    /// Checks if [RoadComponent::calculate] managed to pick the beginning and the end
    /// of the component (regardless of whether paths between them exist).
    pub fn found_beginning_and_end(&self) -> bool {
        self.roundtrip.is_some()
    }

    pub fn has_complete_roundtrip(&self) -> bool {
        self.roundtrip.as_ref().is_some_and(|r| r.is_complete())
    }

    /// Length of the component's complete roundtrip, in meters.
    pub fn length(&self) -> Option<f64> {
        self.roundtrip.as_ref().and_then(|r| r.length())
    }

    /// Searches for the best roundtrip between the extremities of the component.
    ///
    /// Up to 4 sets of beginning/end candidates are tried: just the exit nodes,
    /// exit nodes with their closest nodes, and both of these extended by nodes most
    /// distant from each candidate. For every set, the two candidates furthest apart
    /// (with candidates close to each other merged by synthetic edges) become the
    /// beginning and the end, and paths in both directions are searched for.
    /// The best roundtrip (as ordered by [RoadComponentRoundtrip]) is kept.
    ///
    /// Components without exit nodes (pure loops) don't get a roundtrip.
    ///
    /// Returns an error only if the graph of the component is inconsistent.
    pub fn calculate(&mut self, options: &RoundtripOptions) -> Result<(), SearchError> {
        self.roundtrip = self.search_roundtrip(options)?;

        match &self.roundtrip {
            Some(r) => debug!(
                "roundtrip {:?} <-> {:?}: complete={} length={:?}",
                r.beginning,
                r.ends,
                r.is_complete(),
                r.length(),
            ),
            None => warn!(
                "component of {} nodes has no beginning or end",
                self.graph.len()
            ),
        }

        Ok(())
    }

    fn search_roundtrip(
        &self,
        options: &RoundtripOptions,
    ) -> Result<Option<RoadComponentRoundtrip>, SearchError> {
        if self.exit_nodes.is_empty() {
            return Ok(None);
        }

        let base = self.undirected_weights()?;
        let tree = KDTree::from_iter(self.locations.iter().map(|(&id, &p)| (id, p)));
        let mut finder = PathFinder::new(&self.graph);
        let mut tried: Vec<BTreeSet<i64>> = Vec::default();
        let mut best: Option<RoadComponentRoundtrip> = None;

        for &(with_close_nodes, expand) in &[(false, false), (true, false), (false, true), (true, true)] {
            let candidates =
                self.candidates(&base, tree.as_ref(), options, with_close_nodes, expand)?;
            if tried.contains(&candidates) {
                continue;
            }

            if let Some(r) = self.try_roundtrip(&base, &mut finder, &candidates, options)? {
                if best.as_ref().map(|b| r > *b).unwrap_or(true) {
                    best = Some(r);
                }
            }
            tried.push(candidates);
        }

        Ok(best)
    }

    /// Returns the undirected version of the component's graph, with segment lengths as weights.
    fn undirected_weights(&self) -> Result<Graph<i64, f64>, SearchError> {
        let mut g = Graph::new();
        for v in self.graph.vertices() {
            g.add_vertex(v);
        }
        for (from, to, label) in self.graph.edges() {
            let segment = label.ok_or(SearchError::MissingLabel(from, to))?;
            g.add_edge(from, to, segment.weight());
        }
        Ok(g.to_undirected())
    }

    /// Returns `base` extended by zero-weight edges between all `candidates`
    /// no further than `threshold` meters (crow-flies) from each other.
    fn distance_graph(
        &self,
        base: &Graph<i64, f64>,
        candidates: &BTreeSet<i64>,
        threshold: f64,
    ) -> Graph<i64, f64> {
        let mut g = base.clone();
        let located: Vec<(i64, Point<f64>)> = candidates
            .iter()
            .filter_map(|id| self.locations.get(id).map(|&p| (*id, p)))
            .collect();

        for (idx, &(a, a_pt)) in located.iter().enumerate() {
            for &(b, b_pt) in &located[idx + 1..] {
                if !g.has_edge(a, b) && point_distance(a_pt, b_pt) <= threshold {
                    g.add_edge(a, b, 0.0);
                    g.add_edge(b, a, 0.0);
                }
            }
        }

        g
    }

    fn candidates(
        &self,
        base: &Graph<i64, f64>,
        tree: Option<&KDTree>,
        options: &RoundtripOptions,
        with_close_nodes: bool,
        expand: bool,
    ) -> Result<BTreeSet<i64>, SearchError> {
        let mut candidates = self.exit_nodes.clone();

        if let (true, Some(tree)) = (with_close_nodes, tree) {
            for exit in &self.exit_nodes {
                if let Some(&at) = self.locations.get(exit) {
                    // +1, as the exit node itself is always the closest one
                    let close = tree.nearest_within(
                        at,
                        options.close_node_radius,
                        options.close_node_limit + 1,
                    );
                    candidates.extend(close.into_iter().map(|(id, _)| id));
                }
            }
        }

        if expand {
            let g = self.distance_graph(base, &candidates, options.expansion_proximity_cap);
            let mut finder = PathFinder::new(&g);
            let mut expanded = candidates.clone();
            for &c in &candidates {
                if let Some((furthest, _)) = finder.shortest_paths(c)?.furthest() {
                    expanded.insert(furthest);
                }
            }
            candidates = expanded;
        }

        Ok(candidates)
    }

    fn try_roundtrip(
        &self,
        base: &Graph<i64, f64>,
        finder: &mut PathFinder<'_, Segment>,
        candidates: &BTreeSet<i64>,
        options: &RoundtripOptions,
    ) -> Result<Option<RoadComponentRoundtrip>, SearchError> {
        let threshold = (self.segment_length * options.proximity_fraction).min(options.proximity_cap);
        let g = self.distance_graph(base, candidates, threshold);
        let mut distances = PathFinder::new(&g);
        let candidates: Vec<i64> = candidates.iter().copied().collect();

        let (first, second) = match distances.furthest_pair_of_nodes(&candidates)? {
            Some((a, b, _)) => (a, b),
            None => {
                // Single candidate - pair it up with the most distant node
                let Some(&a) = candidates.first() else {
                    return Ok(None);
                };
                match distances.shortest_paths(a)?.furthest() {
                    Some((b, _)) if b != a => (a, b),
                    _ => return Ok(None),
                }
            }
        };

        let mut beginning = BTreeSet::from([first]);
        let mut ends = BTreeSet::from([second]);
        for &c in &candidates {
            if distances.distance(first, c)?.is_some_and(|d| d <= threshold) {
                beginning.insert(c);
            }
            if distances.distance(second, c)?.is_some_and(|d| d <= threshold) {
                ends.insert(c);
            }
        }
        beginning.remove(&second);
        ends.retain(|c| !beginning.contains(c));

        let forward = self.find_path(finder, &beginning, &ends, options.step_limit)?;
        let backward = self.find_path(finder, &ends, &beginning, options.step_limit)?;
        Ok(Some(RoadComponentRoundtrip::new(
            self.oneway,
            beginning,
            ends,
            forward,
            backward,
        )))
    }

    /// Finds the first shortest path from any of `from` to any of `to`. If there's no such path,
    /// returns the longest partial path from any of `from` towards the first of `to`.
    fn find_path(
        &self,
        finder: &mut PathFinder<'_, Segment>,
        from: &BTreeSet<i64>,
        to: &BTreeSet<i64>,
        step_limit: usize,
    ) -> Result<RoadComponentPath, SearchError> {
        for &a in from {
            for &b in to {
                if let Some(nodes) = finder.path(a, b)? {
                    return self.path_over(a, b, nodes, true);
                }
            }
        }

        let first_to = to.iter().next().copied().unwrap_or_default();
        let mut best: Option<RoadComponentPath> = None;
        for &a in from {
            let partial = bfs_any_path(&self.graph, a, first_to, step_limit)?;
            let path = self.path_over(a, first_to, partial.vertices, partial.complete)?;
            if best.as_ref().map(|b| path.length() > b.length()).unwrap_or(true) {
                best = Some(path);
            }
        }

        Ok(best.unwrap_or_else(|| RoadComponentPath {
            from: from.iter().next().copied().unwrap_or_default(),
            to: first_to,
            nodes: Vec::default(),
            segments: Vec::default(),
            complete: false,
        }))
    }

    fn path_over(
        &self,
        from: i64,
        to: i64,
        nodes: Vec<i64>,
        complete: bool,
    ) -> Result<RoadComponentPath, SearchError> {
        let segments = nodes
            .windows(2)
            .map(|pair| {
                self.graph
                    .label(pair[0], pair[1])
                    .copied()
                    .ok_or(SearchError::MissingLabel(pair[0], pair[1]))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RoadComponentPath {
            from,
            to,
            nodes,
            segments,
            complete,
        })
    }
}

/// Fraction of the length of `ways` covered by one-way ways.
/// If no lengths are known, the fraction of segments is used instead.
fn oneway_fraction(ways: &BTreeMap<i64, Way>) -> f64 {
    let (mut total, mut oneway) = (0.0, 0.0);
    let (mut total_count, mut oneway_count) = (0usize, 0usize);

    for way in ways.values() {
        let length = way.length();
        total += length;
        total_count += way.segments.len();
        if way.is_oneway() {
            oneway += length;
            oneway_count += way.segments.len();
        }
    }

    if total > 0.0 {
        oneway / total
    } else if total_count > 0 {
        oneway_count as f64 / total_count as f64
    } else {
        0.0
    }
}
