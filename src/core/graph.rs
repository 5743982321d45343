//Cvsp
//Copyright (C) 2022-2024 A. Dubray
//
//This program is free software: you can redistribute it and/or modify
//it under the terms of the GNU Affero General Public License as published by
//the Free Software Foundation, either version 3 of the License, or
//(at your option) any later version.
//
//This program is distributed in the hope that it will be useful,
//but WITHOUT ANY WARRANTY; without even the implied warranty of
//MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//GNU Affero General Public License for more details.
//
//You should have received a copy of the GNU Affero General Public License
//along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! This module provides the undirected graph on which the separators are computed.
//! The vertices are stored in a contiguous vector and identified by a `VertexIndex`; each vertex
//! keeps the name it had in the input (the token of the file, or its index for graphs built
//! programmatically).
//! Besides the usual adjacency queries, the graph offers the structural enumerations needed by
//! the formulations:
//!     1. The connected components of the sub-graph induced by a subset of the vertices
//!     2. The maximal cliques (Bron-Kerbosch with pivoting)
//!     3. The connected vertex sets of a given size (ESU enumeration)

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::CvspError;

/// Abstraction used as a typesafe way of retrieving a vertex in the `Graph` structure
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VertexIndex(pub usize);

/// Data structure representing an undirected graph without self-loops nor parallel edges.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Name of each vertex
    names: Vec<String>,
    /// Maps the names back to the vertices
    index: FxHashMap<String, VertexIndex>,
    /// Adjacency lists
    neighbors: Vec<Vec<VertexIndex>>,
    /// Edges, in insertion order
    edges: Vec<(VertexIndex, VertexIndex)>,
    /// Edges as ordered pairs, for constant-time adjacency checks
    edge_set: FxHashSet<(usize, usize)>,
}

impl Graph {

    // --- GRAPH CREATION --- //

    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph with `n` isolated vertices named after their index
    pub fn with_vertices(n: usize) -> Self {
        let mut graph = Self::new();
        for v in 0..n {
            graph.add_vertex(&v.to_string());
        }
        graph
    }

    /// Creates a graph with `n` vertices and the given edges
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self, CvspError> {
        let mut graph = Self::with_vertices(n);
        for (u, v) in edges.iter().copied() {
            graph.add_edge(VertexIndex(u), VertexIndex(v))?;
        }
        Ok(graph)
    }

    /// Creates a G(n, p) random graph. The same seed always produces the same graph.
    pub fn random(n: usize, probability: f64, seed: u64) -> Self {
        let probability = probability.clamp(0.0, 1.0);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut graph = Self::with_vertices(n);
        for u in 0..n {
            for v in (u + 1)..n {
                if rng.gen_bool(probability) {
                    graph.insert_edge(u, v);
                }
            }
        }
        graph
    }

    /// Adds a vertex with the given name and returns its index. If a vertex with that name
    /// already exists, its index is returned.
    pub fn add_vertex(&mut self, name: &str) -> VertexIndex {
        if let Some(v) = self.index.get(name) {
            return *v;
        }
        let v = VertexIndex(self.names.len());
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), v);
        self.neighbors.push(vec![]);
        v
    }

    /// Adds the undirected edge u-v. Self-loops, parallel edges and unknown vertices are rejected.
    pub fn add_edge(&mut self, u: VertexIndex, v: VertexIndex) -> Result<(), CvspError> {
        if u.0 >= self.number_vertices() || v.0 >= self.number_vertices() {
            return Err(CvspError::InvalidGraph(format!("edge {}-{} refers to an unknown vertex", u.0, v.0)));
        }
        if u == v {
            return Err(CvspError::InvalidGraph(format!("self-loop on vertex {}", self.name(u))));
        }
        if self.adjacent(u.0, v.0) {
            return Err(CvspError::InvalidGraph(format!("duplicate edge {}-{}", self.name(u), self.name(v))));
        }
        self.insert_edge(u.0, v.0);
        Ok(())
    }

    fn insert_edge(&mut self, u: usize, v: usize) {
        self.edge_set.insert((u.min(v), u.max(v)));
        self.neighbors[u].push(VertexIndex(v));
        self.neighbors[v].push(VertexIndex(u));
        self.edges.push((VertexIndex(u), VertexIndex(v)));
    }

    // --- QUERIES --- //

    pub fn number_vertices(&self) -> usize {
        self.names.len()
    }

    pub fn number_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn name(&self, vertex: VertexIndex) -> &str {
        &self.names[vertex.0]
    }

    /// Returns the vertex with the given name, if any
    pub fn vertex(&self, name: &str) -> Option<VertexIndex> {
        self.index.get(name).copied()
    }

    pub fn degree(&self, vertex: VertexIndex) -> usize {
        self.neighbors[vertex.0].len()
    }

    pub fn are_adjacent(&self, u: VertexIndex, v: VertexIndex) -> bool {
        self.adjacent(u.0, v.0)
    }

    fn adjacent(&self, u: usize, v: usize) -> bool {
        self.edge_set.contains(&(u.min(v), u.max(v)))
    }

    // --- ITERATORS --- //

    pub fn vertices_iter(&self) -> impl Iterator<Item = VertexIndex> {
        (0..self.number_vertices()).map(VertexIndex)
    }

    pub fn edges_iter(&self) -> impl Iterator<Item = (VertexIndex, VertexIndex)> + '_ {
        self.edges.iter().copied()
    }

    pub fn neighbors_iter(&self, vertex: VertexIndex) -> impl Iterator<Item = VertexIndex> + '_ {
        self.neighbors[vertex.0].iter().copied()
    }

    // --- STRUCTURE --- //

    /// Returns the connected components of the sub-graph induced by the active vertices. The
    /// vertices of each component are sorted and the components are ordered by their smallest
    /// vertex.
    pub fn components(&self, active: &[bool]) -> Vec<Vec<VertexIndex>> {
        debug_assert_eq!(active.len(), self.number_vertices());
        let mut seen = vec![false; self.number_vertices()];
        let mut components = vec![];
        let mut stack: Vec<usize> = vec![];
        for start in 0..self.number_vertices() {
            if !active[start] || seen[start] {
                continue;
            }
            let mut component = vec![];
            seen[start] = true;
            stack.push(start);
            while let Some(u) = stack.pop() {
                component.push(VertexIndex(u));
                for w in self.neighbors[u].iter().copied() {
                    if active[w.0] && !seen[w.0] {
                        seen[w.0] = true;
                        stack.push(w.0);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }

    /// Returns all the maximal cliques of the graph. Isolated vertices are cliques of size one.
    pub fn maximal_cliques(&self) -> Vec<Vec<VertexIndex>> {
        let mut cliques = vec![];
        let mut current = vec![];
        let candidates = (0..self.number_vertices()).collect::<Vec<usize>>();
        self.bron_kerbosch(&mut current, candidates, vec![], &mut cliques);
        cliques
    }

    fn bron_kerbosch(&self, current: &mut Vec<usize>, mut candidates: Vec<usize>, mut excluded: Vec<usize>, cliques: &mut Vec<Vec<VertexIndex>>) {
        if candidates.is_empty() && excluded.is_empty() {
            let mut clique = current.iter().copied().map(VertexIndex).collect::<Vec<VertexIndex>>();
            clique.sort();
            cliques.push(clique);
            return;
        }
        // The pivot is the vertex covering the largest number of candidates. Only the candidates
        // not adjacent to it need to be branched on.
        let pivot = candidates.iter().chain(excluded.iter()).copied().max_by_key(|u| {
            candidates.iter().filter(|w| self.adjacent(*u, **w)).count()
        });
        let branching = match pivot {
            Some(p) => candidates.iter().copied().filter(|v| !self.adjacent(p, *v)).collect::<Vec<usize>>(),
            None => candidates.clone(),
        };
        for v in branching {
            let next_candidates = candidates.iter().copied().filter(|w| self.adjacent(v, *w)).collect();
            let next_excluded = excluded.iter().copied().filter(|w| self.adjacent(v, *w)).collect();
            current.push(v);
            self.bron_kerbosch(current, next_candidates, next_excluded, cliques);
            current.pop();
            candidates.retain(|w| *w != v);
            excluded.push(v);
        }
    }

    /// Returns every set of `size` vertices inducing a connected sub-graph. Each set is reported
    /// once, sorted.
    pub fn connected_sets(&self, size: usize) -> Vec<Vec<VertexIndex>> {
        self.connected_sets_before(size, None).unwrap_or_default()
    }

    /// Same as `connected_sets`, but gives up and returns `None` once the deadline is reached
    pub fn connected_sets_before(&self, size: usize, deadline: Option<Instant>) -> Option<Vec<Vec<VertexIndex>>> {
        let mut sets = vec![];
        if size == 0 {
            return Some(sets);
        }
        for root in 0..self.number_vertices() {
            let extension = self.neighbors[root].iter().map(|w| w.0).filter(|w| *w > root).collect::<Vec<usize>>();
            let mut subgraph = vec![root];
            if !self.extend_subgraph(&mut subgraph, extension, root, size, deadline, &mut sets) {
                return None;
            }
        }
        Some(sets)
    }

    /// ESU step: the sub-graph is extended with one vertex of the extension at a time. The new
    /// extension only receives the exclusive neighbors of the added vertex, which guarantees
    /// that each connected set is produced from a single branch. Returns false if the deadline
    /// is reached.
    fn extend_subgraph(&self, subgraph: &mut Vec<usize>, mut extension: Vec<usize>, root: usize, size: usize, deadline: Option<Instant>, sets: &mut Vec<Vec<VertexIndex>>) -> bool {
        if deadline.map(|d| Instant::now() >= d).unwrap_or(false) {
            return false;
        }
        if subgraph.len() == size {
            let mut set = subgraph.iter().copied().map(VertexIndex).collect::<Vec<VertexIndex>>();
            set.sort();
            sets.push(set);
            return true;
        }
        while let Some(w) = extension.pop() {
            let mut next_extension = extension.clone();
            for u in self.neighbors[w].iter().map(|u| u.0) {
                if u > root
                    && !subgraph.contains(&u)
                    && !next_extension.contains(&u)
                    && !subgraph.iter().any(|s| self.adjacent(*s, u))
                {
                    next_extension.push(u);
                }
            }
            subgraph.push(w);
            let completed = self.extend_subgraph(subgraph, next_extension, root, size, deadline, sets);
            subgraph.pop();
            if !completed {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod test_graph {

    use super::*;
    use std::time::{Duration, Instant};

    fn path(n: usize) -> Graph {
        let edges = (0..n - 1).map(|i| (i, i + 1)).collect::<Vec<(usize, usize)>>();
        Graph::from_edges(n, &edges).unwrap()
    }

    fn complete(n: usize) -> Graph {
        let mut edges = vec![];
        for u in 0..n {
            for v in (u + 1)..n {
                edges.push((u, v));
            }
        }
        Graph::from_edges(n, &edges).unwrap()
    }

    #[test]
    pub fn creation() {
        let g = path(5);
        assert_eq!(5, g.number_vertices());
        assert_eq!(4, g.number_edges());
        assert!(g.are_adjacent(VertexIndex(1), VertexIndex(2)));
        assert!(g.are_adjacent(VertexIndex(2), VertexIndex(1)));
        assert!(!g.are_adjacent(VertexIndex(0), VertexIndex(2)));
        assert_eq!(2, g.degree(VertexIndex(3)));
        assert_eq!("3", g.name(VertexIndex(3)));
        assert_eq!(Some(VertexIndex(4)), g.vertex("4"));
    }

    #[test]
    pub fn named_vertices_are_unique() {
        let mut g = Graph::new();
        let a = g.add_vertex("a");
        let b = g.add_vertex("b");
        assert_eq!(a, g.add_vertex("a"));
        g.add_edge(a, b).unwrap();
        assert_eq!(2, g.number_vertices());
        assert_eq!("b", g.name(b));
    }

    #[test]
    pub fn rejects_self_loops_and_duplicates() {
        assert!(matches!(Graph::from_edges(3, &[(1, 1)]), Err(CvspError::InvalidGraph(_))));
        assert!(matches!(Graph::from_edges(3, &[(0, 1), (1, 0)]), Err(CvspError::InvalidGraph(_))));
        assert!(matches!(Graph::from_edges(3, &[(0, 3)]), Err(CvspError::InvalidGraph(_))));
    }

    #[test]
    pub fn components_of_induced_subgraph() {
        let g = path(5);
        let mut active = vec![true; 5];
        assert_eq!(1, g.components(&active).len());
        active[2] = false;
        let components = g.components(&active);
        assert_eq!(vec![vec![VertexIndex(0), VertexIndex(1)], vec![VertexIndex(3), VertexIndex(4)]], components);
        let none = g.components(&[false; 5]);
        assert!(none.is_empty());
    }

    #[test]
    pub fn maximal_cliques() {
        let mut cliques = path(4).maximal_cliques();
        cliques.sort();
        assert_eq!(vec![
            vec![VertexIndex(0), VertexIndex(1)],
            vec![VertexIndex(1), VertexIndex(2)],
            vec![VertexIndex(2), VertexIndex(3)],
        ], cliques);
        assert_eq!(vec![vec![VertexIndex(0), VertexIndex(1), VertexIndex(2), VertexIndex(3)]], complete(4).maximal_cliques());
        // Two triangles sharing an edge and an isolated vertex
        let g = Graph::from_edges(5, &[(0, 1), (1, 2), (0, 2), (1, 3), (2, 3)]).unwrap();
        let mut cliques = g.maximal_cliques();
        cliques.sort();
        assert_eq!(vec![
            vec![VertexIndex(0), VertexIndex(1), VertexIndex(2)],
            vec![VertexIndex(1), VertexIndex(2), VertexIndex(3)],
            vec![VertexIndex(4)],
        ], cliques);
    }

    #[test]
    pub fn connected_sets() {
        let g = path(5);
        assert_eq!(5, g.connected_sets(1).len());
        assert_eq!(4, g.connected_sets(2).len());
        let mut triples = g.connected_sets(3);
        triples.sort();
        assert_eq!(vec![
            vec![VertexIndex(0), VertexIndex(1), VertexIndex(2)],
            vec![VertexIndex(1), VertexIndex(2), VertexIndex(3)],
            vec![VertexIndex(2), VertexIndex(3), VertexIndex(4)],
        ], triples);
        assert!(g.connected_sets(6).is_empty());
        assert_eq!(6, complete(4).connected_sets(2).len());
        assert_eq!(4, complete(4).connected_sets(3).len());
        // Star with center 0: any set containing the center is connected
        let star = Graph::from_edges(4, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        assert_eq!(3, star.connected_sets(3).len());
    }

    #[test]
    pub fn connected_sets_with_deadline() {
        let g = Graph::random(30, 0.3, 7);
        assert!(g.connected_sets_before(4, Some(Instant::now())).is_none());
        let far = Instant::now() + Duration::from_secs(3600);
        assert_eq!(Some(path(5).connected_sets(3)), path(5).connected_sets_before(3, Some(far)));
    }

    #[test]
    pub fn random_graphs_are_reproducible() {
        let g1 = Graph::random(12, 0.4, 42);
        let g2 = Graph::random(12, 0.4, 42);
        assert_eq!(g1.edges_iter().collect::<Vec<_>>(), g2.edges_iter().collect::<Vec<_>>());
        assert_eq!(0, Graph::random(6, 0.0, 1).number_edges());
        assert_eq!(15, Graph::random(6, 1.0, 1).number_edges());
    }
}
