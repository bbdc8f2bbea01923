// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::hash_map::{Entry, HashMap};

use super::{dijkstra, SearchError, ShortestPaths, Weight};
use crate::Graph;

/// Caches full [dijkstra] runs over a single graph, keyed by the source vertex.
///
/// The cache lives as long as the finder, so a finder should be scoped to a single
/// batch of related queries (like the roundtrip search of one component).
#[derive(Debug)]
pub struct PathFinder<'a, L> {
    g: &'a Graph<i64, L>,
    cache: HashMap<i64, ShortestPaths>,
}

impl<'a, L: Weight> PathFinder<'a, L> {
    pub fn new(g: &'a Graph<i64, L>) -> Self {
        Self {
            g,
            cache: HashMap::default(),
        }
    }

    /// Returns the number of cached dijkstra runs.
    #[cfg(test)]
    pub(crate) fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Returns the shortest paths from `source`, running dijkstra if necessary.
    pub fn shortest_paths(&mut self, source: i64) -> Result<&ShortestPaths, SearchError> {
        match self.cache.entry(source) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => Ok(e.insert(dijkstra(self.g, source, None, None)?)),
        }
    }

    /// Returns the length of the shortest path from `a` to `b`, or `None` if there's no such path.
    pub fn distance(&mut self, a: i64, b: i64) -> Result<Option<f64>, SearchError> {
        Ok(self.shortest_paths(a)?.distance(b))
    }

    /// Returns the shortest path (as a sequence of vertices) from `a` to `b`,
    /// or `None` if there's no such path.
    pub fn path(&mut self, a: i64, b: i64) -> Result<Option<Vec<i64>>, SearchError> {
        Ok(self.shortest_paths(a)?.path(b))
    }

    /// Finds the pair of distinct `candidates` with the greatest finite distance between them.
    ///
    /// Candidates are examined in order, and the first pair wins ties.
    /// Returns `None` if no candidate can reach another one.
    pub fn furthest_pair_of_nodes(
        &mut self,
        candidates: &[i64],
    ) -> Result<Option<(i64, i64, f64)>, SearchError> {
        let mut best: Option<(i64, i64, f64)> = None;

        for &a in candidates {
            let paths = self.shortest_paths(a)?;
            for &b in candidates {
                if a == b {
                    continue;
                }
                if let Some(d) = paths.distance(b) {
                    if best.map(|(_, _, best_d)| d > best_d).unwrap_or(true) {
                        best = Some((a, b, d));
                    }
                }
            }
        }

        Ok(best)
    }
}
