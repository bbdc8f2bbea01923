// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, VecDeque};

use super::{SearchError, Weight};
use crate::Graph;

/// Result of [bfs_any_path].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnyPath {
    /// Sequence of vertices, starting at the source.
    pub vertices: Vec<i64>,

    /// True if `vertices` ends at the requested target.
    pub complete: bool,
}

fn reconstruct(came_from: &HashMap<i64, i64>, mut last: i64) -> Vec<i64> {
    let mut path = vec![last];

    while let Some(&nd) = came_from.get(&last) {
        path.push(nd);
        last = nd;
    }

    path.reverse();
    path
}

/// Explores the graph breadth-first from `from`, looking for any path to `to`.
///
/// The search ends when `to` is reached, when there is nothing more to explore,
/// or after `step_limit` vertices were expanded. If `to` wasn't reached,
/// returns an incomplete path: the branch of the traversal tree with the greatest
/// total weight (ties in favor of the earlier explored vertex), showing how far
/// it's possible to get from `from`.
///
/// A `from` vertex which is not in the graph produces an empty, incomplete path.
pub fn bfs_any_path<L: Weight>(
    g: &Graph<i64, L>,
    from: i64,
    to: i64,
    step_limit: usize,
) -> Result<AnyPath, SearchError> {
    if !g.contains_vertex(from) {
        return Ok(AnyPath::default());
    }

    let mut queue = VecDeque::from([from]);
    let mut came_from: HashMap<i64, i64> = HashMap::default();
    let mut depth: HashMap<i64, f64> = HashMap::from([(from, 0.0)]);
    let mut deepest = (from, 0.0);
    let mut steps: usize = 0;

    while let Some(at) = queue.pop_front() {
        if at == to {
            return Ok(AnyPath {
                vertices: reconstruct(&came_from, to),
                complete: true,
            });
        }

        steps += 1;
        if steps > step_limit {
            break;
        }

        let at_depth = depth.get(&at).copied().unwrap_or_default();
        for &neighbor in g.adjacent(at) {
            if depth.contains_key(&neighbor) {
                continue;
            }

            let edge_cost = g
                .label(at, neighbor)
                .ok_or(SearchError::MissingLabel(at, neighbor))?
                .weight();
            let neighbor_depth = at_depth + edge_cost;

            came_from.insert(neighbor, at);
            depth.insert(neighbor, neighbor_depth);
            queue.push_back(neighbor);

            if neighbor_depth > deepest.1 {
                deepest = (neighbor, neighbor_depth);
            }
        }
    }

    Ok(AnyPath {
        vertices: reconstruct(&came_from, deepest.0),
        complete: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::DEFAULT_STEP_LIMIT;

    fn oneway_fork() -> Graph<i64, f64> {
        // 1 → 2 → 3 → 4
        //      ↘
        //       5 → 6 → 7
        let mut g = Graph::new();
        g.add_edge(1, 2, 10.0);
        g.add_edge(2, 3, 10.0);
        g.add_edge(3, 4, 10.0);
        g.add_edge(2, 5, 10.0);
        g.add_edge(5, 6, 10.0);
        g.add_edge(6, 7, 10.0);
        g
    }

    #[test]
    fn complete() {
        let g = oneway_fork();
        let p = bfs_any_path(&g, 1, 6, DEFAULT_STEP_LIMIT).unwrap();
        assert!(p.complete);
        assert_eq!(p.vertices, vec![1, 2, 5, 6]);

        let p = bfs_any_path(&g, 3, 3, DEFAULT_STEP_LIMIT).unwrap();
        assert!(p.complete);
        assert_eq!(p.vertices, vec![3]);
    }

    #[test]
    fn partial() {
        let g = oneway_fork();
        let p = bfs_any_path(&g, 2, 1, DEFAULT_STEP_LIMIT).unwrap();
        assert!(!p.complete);
        assert_eq!(p.vertices, vec![2, 5, 6, 7]);

        let p = bfs_any_path(&g, 7, 1, DEFAULT_STEP_LIMIT).unwrap();
        assert!(!p.complete);
        assert_eq!(p.vertices, vec![7]);
    }

    #[test]
    fn step_limit() {
        let g = oneway_fork();
        let p = bfs_any_path(&g, 1, 7, 2).unwrap();
        assert!(!p.complete);
        assert_eq!(p.vertices, vec![1, 2, 3]);
    }

    #[test]
    fn absent_source() {
        let g = oneway_fork();
        assert_eq!(
            bfs_any_path(&g, 42, 1, DEFAULT_STEP_LIMIT).unwrap(),
            AnyPath::default()
        );
    }

    #[test]
    fn missing_label() {
        let mut g = oneway_fork();
        g.take_label(1, 2);
        assert_eq!(
            bfs_any_path(&g, 1, 7, DEFAULT_STEP_LIMIT),
            Err(SearchError::MissingLabel(1, 2)),
        );
    }
}
