// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use super::{SearchError, Weight};
use crate::Graph;

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    at: i64,
    cost: f64,
    seq: u64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // NOTE: We revert the order of comparison,
        // as lower costs (and earlier insertions) are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Result of a single-source [dijkstra] run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortestPaths {
    distances: HashMap<i64, f64>,
    came_from: HashMap<i64, i64>,
}

impl ShortestPaths {
    /// Returns the distance from the source to `to`, or `None` if `to` was not reached.
    pub fn distance(&self, to: i64) -> Option<f64> {
        self.distances.get(&to).copied()
    }

    /// Returns the number of reached vertices (including the source).
    #[cfg(test)]
    pub(crate) fn reached(&self) -> usize {
        self.distances.len()
    }

    /// Returns the sequence of vertices from the source to `to`,
    /// or `None` if `to` was not reached.
    pub fn path(&self, to: i64) -> Option<Vec<i64>> {
        if !self.distances.contains_key(&to) {
            return None;
        }

        let mut last = to;
        let mut path = vec![last];
        while let Some(&nd) = self.came_from.get(&last) {
            path.push(nd);
            last = nd;
        }

        path.reverse();
        Some(path)
    }

    /// Returns the reached vertex with the greatest distance from the source.
    /// Ties are resolved in favor of the smallest vertex.
    pub fn furthest(&self) -> Option<(i64, f64)> {
        self.distances
            .iter()
            .map(|(&v, &d)| (v, d))
            .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
    }
}

/// Uses [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
/// to compute shortest distances from `source` to all vertices reachable from it.
///
/// If `within` is provided, only vertices from that set are visited.
/// If `stop_at` is provided, the search ends as soon as that vertex is settled -
/// distances to vertices which weren't settled by then may be overestimated.
///
/// A `source` which is not in the graph (or not in `within`) produces an empty result.
/// Equal-cost ties are resolved by queue insertion order, making the result deterministic.
pub fn dijkstra<L: Weight>(
    g: &Graph<i64, L>,
    source: i64,
    within: Option<&BTreeSet<i64>>,
    stop_at: Option<i64>,
) -> Result<ShortestPaths, SearchError> {
    let mut result = ShortestPaths::default();

    let allowed = |v: i64| within.map(|w| w.contains(&v)).unwrap_or(true);
    if !g.contains_vertex(source) || !allowed(source) {
        return Ok(result);
    }

    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::default();
    let mut seq: u64 = 0;
    result.distances.insert(source, 0.0);
    queue.push(QueueItem {
        at: source,
        cost: 0.0,
        seq,
    });

    while let Some(item) = queue.pop() {
        // We might keep multiple items in the queue for the same vertex.
        if item.cost > result.distance(item.at).unwrap_or(f64::INFINITY) {
            continue;
        }

        if stop_at == Some(item.at) {
            break;
        }

        for &neighbor in g.adjacent(item.at) {
            if !allowed(neighbor) {
                continue;
            }

            let edge_cost = g
                .label(item.at, neighbor)
                .ok_or(SearchError::MissingLabel(item.at, neighbor))?
                .weight();

            let neighbor_cost = item.cost + edge_cost;
            if neighbor_cost >= result.distance(neighbor).unwrap_or(f64::INFINITY) {
                continue;
            }

            seq += 1;
            result.came_from.insert(neighbor, item.at);
            result.distances.insert(neighbor, neighbor_cost);
            queue.push(QueueItem {
                at: neighbor,
                cost: neighbor_cost,
                seq,
            });
        }
    }

    Ok(result)
}
