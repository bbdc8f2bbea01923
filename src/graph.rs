// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::btree_map::{BTreeMap, Entry};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::hash::Hash;

/// Directed graph over vertices identified by value (`V`), with an optional
/// label attached to every ordered pair of vertices.
///
/// Structure (adjacency) and labels are stored separately. There is at most one
/// edge per ordered pair - adding an edge again replaces its label.
///
/// Every query about a vertex which is not in the graph returns an empty result
/// instead of panicking.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph<V: Ord + Hash, L> {
    adjacency: BTreeMap<V, Vec<V>>,
    labels: HashMap<(V, V), L>,
}

impl<V: Ord + Hash, L> Default for Graph<V, L> {
    fn default() -> Self {
        Self {
            adjacency: BTreeMap::default(),
            labels: HashMap::default(),
        }
    }
}

impl<V: Copy + Ord + Hash, L> Graph<V, L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of vertices in the graph.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Returns the number of directed edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|a| a.len()).sum()
    }

    /// Returns an iterator over all vertices, in ascending order.
    pub fn vertices(&self) -> impl Iterator<Item = V> + '_ {
        self.adjacency.keys().copied()
    }

    /// Returns an iterator over all directed edges, together with their labels.
    pub fn edges(&self) -> impl Iterator<Item = (V, V, Option<&L>)> + '_ {
        self.adjacency.iter().flat_map(move |(&from, to)| {
            to.iter()
                .map(move |&to| (from, to, self.labels.get(&(from, to))))
        })
    }

    pub fn contains_vertex(&self, v: V) -> bool {
        self.adjacency.contains_key(&v)
    }

    /// Adds a vertex to the graph. Adding an existing vertex is a no-op.
    pub fn add_vertex(&mut self, v: V) {
        self.adjacency.entry(v).or_default();
    }

    /// Adds a labelled edge from `from` to `to`, creating both vertices if necessary.
    /// If the edge already exists, only its label is replaced.
    pub fn add_edge(&mut self, from: V, to: V, label: L) {
        self.add_bare_edge(from, to);
        self.labels.insert((from, to), label);
    }

    /// Adds an edge without touching its label, creating both vertices if necessary.
    pub fn add_bare_edge(&mut self, from: V, to: V) {
        self.add_vertex(to);
        let neighbors = self.adjacency.entry(from).or_default();
        if !neighbors.contains(&to) {
            neighbors.push(to);
        }
    }

    /// Sets the label of an existing edge. Returns false (and does nothing)
    /// if there is no edge between the two vertices.
    #[cfg(test)]
    pub(crate) fn set_label(&mut self, from: V, to: V, label: L) -> bool {
        if self.has_edge(from, to) {
            self.labels.insert((from, to), label);
            true
        } else {
            false
        }
    }

    /// Removes and returns the label of an edge, leaving the edge itself in place.
    #[cfg(test)]
    pub(crate) fn take_label(&mut self, from: V, to: V) -> Option<L> {
        self.labels.remove(&(from, to))
    }

    /// Gets the label of the edge from one vertex to another.
    pub fn label(&self, from: V, to: V) -> Option<&L> {
        self.labels.get(&(from, to))
    }

    pub fn has_edge(&self, from: V, to: V) -> bool {
        self.adjacent(from).contains(&to)
    }

    /// Gets all vertices directly reachable from `v`, in insertion order.
    pub fn adjacent(&self, v: V) -> &[V] {
        self.adjacency
            .get(&v)
            .map(|a| a.as_slice())
            .unwrap_or_default()
    }

    pub fn out_degree(&self, v: V) -> usize {
        self.adjacent(v).len()
    }

    /// Returns, for every vertex, the set of vertices connected to it by an edge
    /// in either direction.
    fn undirected_neighbors(&self) -> BTreeMap<V, BTreeSet<V>> {
        let mut neighbors: BTreeMap<V, BTreeSet<V>> = self
            .adjacency
            .keys()
            .map(|&v| (v, BTreeSet::default()))
            .collect();

        for (&from, to) in &self.adjacency {
            for &to in to {
                if let Some(n) = neighbors.get_mut(&from) {
                    n.insert(to);
                }
                if let Some(n) = neighbors.get_mut(&to) {
                    n.insert(from);
                }
            }
        }

        neighbors
    }

    /// Returns the connected components of the undirected projection of the graph.
    ///
    /// Components are ordered by their smallest vertex.
    pub fn connected_components(&self) -> Vec<BTreeSet<V>> {
        let neighbors = self.undirected_neighbors();
        let mut seen: BTreeSet<V> = BTreeSet::default();
        let mut components = Vec::default();

        for &start in neighbors.keys() {
            if !seen.insert(start) {
                continue;
            }

            let mut component = BTreeSet::from([start]);
            let mut queue = VecDeque::from([start]);

            while let Some(v) = queue.pop_front() {
                for &n in neighbors.get(&v).into_iter().flatten() {
                    if seen.insert(n) {
                        component.insert(n);
                        queue.push_back(n);
                    }
                }
            }

            components.push(component);
        }

        components
    }

    /// Checks whether the directed graph has a cycle (including self-loops),
    /// using Kahn's topological sort.
    pub fn is_cyclic(&self) -> bool {
        let mut in_degree: BTreeMap<V, usize> = self.adjacency.keys().map(|&v| (v, 0)).collect();
        for to in self.adjacency.values().flatten() {
            if let Some(d) = in_degree.get_mut(to) {
                *d += 1;
            }
        }

        let mut queue: VecDeque<V> = in_degree
            .iter()
            .filter_map(|(&v, &d)| if d == 0 { Some(v) } else { None })
            .collect();
        let mut sorted = 0;

        while let Some(v) = queue.pop_front() {
            sorted += 1;
            for to in self.adjacent(v) {
                if let Some(d) = in_degree.get_mut(to) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(*to);
                    }
                }
            }
        }

        sorted != self.len()
    }
}

impl<V: Copy + Ord + Hash, L: Clone> Graph<V, L> {
    /// Returns a copy of the graph where every edge is also present in the opposite
    /// direction. Reversed edges reuse the label of the original edge, unless
    /// the opposite edge already existed with its own label.
    pub fn to_undirected(&self) -> Self {
        let mut g = self.clone();
        for (from, to, label) in self.edges() {
            match g.adjacency.entry(to) {
                Entry::Occupied(mut e) => {
                    if !e.get().contains(&from) {
                        e.get_mut().push(from);
                    }
                }
                Entry::Vacant(e) => {
                    e.insert(vec![from]);
                }
            }
            if let Some(label) = label {
                g.labels.entry((to, from)).or_insert_with(|| label.clone());
            }
        }
        g
    }

    /// Returns a new graph with exactly the provided vertices (those present in this graph)
    /// and the edges between them.
    pub fn induced_subgraph(&self, vertices: &BTreeSet<V>) -> Self {
        let mut g = Self::default();
        for &v in vertices {
            if let Some(to) = self.adjacency.get(&v) {
                g.add_vertex(v);
                for &to in to.iter().filter(|to| vertices.contains(to)) {
                    g.add_bare_edge(v, to);
                    if let Some(label) = self.labels.get(&(v, to)) {
                        g.labels.insert((v, to), label.clone());
                    }
                }
            }
        }
        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_graph() -> Graph<i64, &'static str> {
        // 1 ⇄ 2 → 3    4 ⇄ 5    6
        let mut g = Graph::new();
        g.add_edge(1, 2, "a");
        g.add_edge(2, 1, "a'");
        g.add_edge(2, 3, "b");
        g.add_edge(4, 5, "c");
        g.add_edge(5, 4, "c'");
        g.add_vertex(6);
        g
    }

    #[test]
    fn basic_queries() {
        let g = simple_graph();
        assert_eq!(g.len(), 6);
        assert_eq!(g.edge_count(), 5);
        assert_eq!(g.adjacent(2), &[1, 3]);
        assert_eq!(g.out_degree(3), 0);
        assert_eq!(g.label(2, 3), Some(&"b"));
        assert_eq!(g.label(3, 2), None);
        assert!(g.has_edge(1, 2));
        assert!(!g.has_edge(3, 2));
    }

    #[test]
    fn absent_vertices() {
        let g = simple_graph();
        assert_eq!(g.adjacent(42), &[] as &[i64]);
        assert_eq!(g.out_degree(42), 0);
        assert_eq!(g.label(42, 1), None);
        assert!(!g.contains_vertex(42));
    }

    #[test]
    fn repeated_insertion() {
        let mut g = simple_graph();
        g.add_vertex(1);
        g.add_edge(2, 3, "b2");
        assert_eq!(g.len(), 6);
        assert_eq!(g.adjacent(2), &[1, 3]);
        assert_eq!(g.label(2, 3), Some(&"b2"));
    }

    #[test]
    fn labels() {
        let mut g = simple_graph();
        assert!(!g.set_label(3, 2, "x"));
        assert_eq!(g.take_label(2, 3), Some("b"));
        assert!(g.has_edge(2, 3));
        assert_eq!(g.label(2, 3), None);
        assert!(g.set_label(2, 3, "y"));
        assert_eq!(g.label(2, 3), Some(&"y"));
    }

    #[test]
    fn to_undirected() {
        let g = simple_graph().to_undirected();
        assert_eq!(g.adjacent(3), &[2]);
        assert_eq!(g.label(3, 2), Some(&"b"));
        assert_eq!(g.label(2, 1), Some(&"a'"));
        assert_eq!(g.edge_count(), 6);
    }

    #[test]
    fn connected_components() {
        let g = simple_graph();
        let components = g.connected_components();
        assert_eq!(
            components,
            vec![
                BTreeSet::from([1, 2, 3]),
                BTreeSet::from([4, 5]),
                BTreeSet::from([6]),
            ]
        );

        let total: usize = components.iter().map(|c| c.len()).sum();
        assert_eq!(total, g.len());
    }

    #[test]
    fn connected_components_of_long_chain() {
        let mut g: Graph<i64, ()> = Graph::new();
        for i in 1..50_000 {
            g.add_edge(i, i + 1, ());
        }
        let components = g.connected_components();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 50_000);
    }

    #[test]
    fn induced_subgraph() {
        let g = simple_graph();
        let sub = g.induced_subgraph(&BTreeSet::from([2, 3, 4, 42]));
        assert_eq!(sub.vertices().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(sub.edge_count(), 1);
        assert_eq!(sub.label(2, 3), Some(&"b"));
        assert!(!sub.has_edge(2, 1));
    }

    #[test]
    fn is_cyclic() {
        let mut g: Graph<i64, ()> = Graph::new();
        g.add_edge(1, 2, ());
        g.add_edge(2, 3, ());
        assert!(!g.is_cyclic());

        g.add_edge(3, 1, ());
        assert!(g.is_cyclic());

        let mut g: Graph<i64, ()> = Graph::new();
        g.add_edge(1, 2, ());
        g.add_edge(2, 1, ());
        assert!(g.is_cyclic());

        let mut g: Graph<i64, ()> = Graph::new();
        g.add_edge(1, 1, ());
        assert!(g.is_cyclic());
    }
}
