//! Device coupling graphs.

use petgraph::algo::floyd_warshall;
use petgraph::graph::UnGraph;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Undirected coupling graph on physical qubit indices.
///
/// An edge means the two qubits can participate in a two-qubit gate.
///
/// ## Performance
///
/// On construction an all-pairs distance matrix is computed with
/// Floyd–Warshall and cached, giving O(1) `distance()` lookups during
/// routing.
///
/// ## Deserialization
///
/// The adjacency list and distance matrix are skipped during serialization.
/// Call [`rebuild_caches()`](Self::rebuild_caches) after deserializing;
/// until then `distance()` falls back to per-query BFS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    /// Number of physical qubits.
    num_qubits: usize,
    /// Connected qubit pairs (bidirectional).
    edges: Vec<(usize, usize)>,
    /// Adjacency list for fast neighbor lookup.
    #[serde(skip)]
    adjacency: Vec<Vec<usize>>,
    /// Cached all-pairs distances; `u32::MAX` marks unreachable pairs.
    #[serde(skip)]
    dist: Vec<Vec<u32>>,
}

impl Topology {
    /// Create a topology with the given number of qubits and no edges.
    pub fn new(num_qubits: usize) -> Self {
        let mut topology = Self {
            num_qubits,
            edges: vec![],
            adjacency: vec![vec![]; num_qubits],
            dist: vec![],
        };
        topology.recompute_distances();
        topology
    }

    /// Create a topology from an explicit edge list.
    ///
    /// Out-of-range, self-loop, and duplicate edges are ignored.
    pub fn from_edges(num_qubits: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut topology = Self {
            num_qubits,
            edges: vec![],
            adjacency: vec![vec![]; num_qubits],
            dist: vec![],
        };
        for (a, b) in edges {
            topology.add_edge_unchecked(a, b);
        }
        topology.recompute_distances();
        topology
    }

    fn add_edge_unchecked(&mut self, a: usize, b: usize) {
        if a == b || a >= self.num_qubits || b >= self.num_qubits {
            return;
        }
        if self
            .edges
            .iter()
            .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
        {
            return;
        }
        self.edges.push((a, b));
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
    }

    /// Create a linear chain 0-1-2-….
    pub fn linear(n: usize) -> Self {
        Self::from_edges(n, (0..n.saturating_sub(1)).map(|i| (i, i + 1)))
    }

    /// Create a ring 0-1-…-(n-1)-0.
    pub fn ring(n: usize) -> Self {
        let mut edges: Vec<_> = (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        if n > 2 {
            edges.push((n - 1, 0));
        }
        Self::from_edges(n, edges)
    }

    /// Create a star topology (qubit 0 connected to all others).
    pub fn star(n: usize) -> Self {
        Self::from_edges(n, (1..n).map(|i| (0, i)))
    }

    /// Create a fully connected topology.
    pub fn full(n: usize) -> Self {
        let mut edges = vec![];
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j));
            }
        }
        Self::from_edges(n, edges)
    }

    /// Create a 2D grid topology with row-major indexing.
    pub fn grid(rows: usize, cols: usize) -> Self {
        let mut edges = vec![];
        for r in 0..rows {
            for c in 0..cols {
                let idx = r * cols + c;
                if c + 1 < cols {
                    edges.push((idx, idx + 1));
                }
                if r + 1 < rows {
                    edges.push((idx, idx + cols));
                }
            }
        }
        Self::from_edges(rows * cols, edges)
    }

    /// Recompute the Floyd–Warshall distance matrix from the edge list.
    fn recompute_distances(&mut self) {
        let graph: UnGraph<(), ()> = UnGraph::from_edges(
            self.edges
                .iter()
                .map(|&(a, b)| (a as u32, b as u32))
                // A dummy self-edge on the last qubit forces the graph to
                // allocate nodes for isolated trailing qubits.
                .chain(if self.num_qubits > 0 {
                    Some((self.num_qubits as u32 - 1, self.num_qubits as u32 - 1))
                } else {
                    None
                }),
        );

        let pairwise: FxHashMap<_, _> = floyd_warshall(&graph, |_| 1u32)
            .expect("unit edge weights cannot form a negative cycle")
            .into_iter()
            .collect();

        let n = self.num_qubits;
        self.dist = vec![vec![u32::MAX; n]; n];
        for i in 0..n {
            self.dist[i][i] = 0;
        }
        for ((a, b), d) in pairwise {
            let (a, b) = (a.index(), b.index());
            if a < n && b < n && d < u32::MAX {
                self.dist[a][b] = d;
                self.dist[b][a] = d;
            }
        }
        for i in 0..n {
            self.dist[i][i] = 0;
        }
    }

    /// Rebuild the adjacency list and distance matrix from the edge list.
    /// Must be called after deserialization.
    pub fn rebuild_caches(&mut self) {
        self.adjacency = vec![vec![]; self.num_qubits];
        for &(a, b) in &self.edges.clone() {
            if a < self.num_qubits && b < self.num_qubits {
                self.adjacency[a].push(b);
                self.adjacency[b].push(a);
            }
        }
        self.recompute_distances();
    }

    /// Number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The coupling edges.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Neighbors of a qubit.
    pub fn neighbors(&self, qubit: usize) -> &[usize] {
        self.adjacency.get(qubit).map_or(&[], Vec::as_slice)
    }

    /// Check if two qubits are directly connected.
    #[inline]
    pub fn is_connected(&self, q1: usize, q2: usize) -> bool {
        self.adjacency
            .get(q1)
            .is_some_and(|neighbors| neighbors.contains(&q2))
    }

    /// Cached shortest-path distance, or `None` if unreachable.
    pub fn distance(&self, from: usize, to: usize) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        if from < self.dist.len() && to < self.dist[from].len() {
            let d = self.dist[from][to];
            return if d == u32::MAX { None } else { Some(d) };
        }
        // Fallback BFS for maps deserialized without rebuild_caches().
        self.shortest_path(from, to).map(|p| (p.len() - 1) as u32)
    }

    /// Shortest path between two qubits via BFS, endpoints inclusive.
    pub fn shortest_path(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        if from >= self.num_qubits || to >= self.num_qubits {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }

        // Works from the raw edge list so it also serves as the fallback
        // before rebuild_caches() restores the adjacency list.
        let neighbor_list = |q: usize| -> Vec<usize> {
            if self.adjacency.len() == self.num_qubits {
                self.adjacency[q].clone()
            } else {
                self.edges
                    .iter()
                    .filter_map(|&(a, b)| {
                        if a == q {
                            Some(b)
                        } else if b == q {
                            Some(a)
                        } else {
                            None
                        }
                    })
                    .collect()
            }
        };

        let mut predecessor: FxHashMap<usize, usize> = FxHashMap::default();
        let mut queue = VecDeque::new();
        predecessor.insert(from, from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for neighbor in neighbor_list(current) {
                if predecessor.contains_key(&neighbor) {
                    continue;
                }
                predecessor.insert(neighbor, current);
                if neighbor == to {
                    let mut path = vec![to];
                    let mut node = to;
                    while node != from {
                        node = predecessor[&node];
                        path.push(node);
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(neighbor);
            }
        }

        None
    }
}
