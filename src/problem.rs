// Problem graph (component C2): a published max-clique instance.
//
// Random generation follows the Gnm model (fixed vertex count, fixed edge
// count, uniformly sampled edge set) the way `problemgraph.go`'s
// `graph.GnmUndirected(nodes, edges, nil)` does; clique search is a plain
// Bron-Kerbosch (no degree pivoting — the original leans on
// `github.com/soniakeys/graph`'s pivoted variant, not available here, so a
// textbook recursive version stands in, see DESIGN.md).

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::crypto::hash::sha256;
use crate::error::{ChainError, Result};

#[derive(Debug, Clone)]
pub struct ProblemGraph {
    n: usize,
    /// Ascending-sorted neighbor lists, one per vertex.
    adjacency: Vec<Vec<usize>>,
    hash: [u8; 32],
}

#[derive(Serialize)]
struct CanonicalForm<'a> {
    hash: &'a str,
    adjacency: &'a Vec<Vec<usize>>,
}

impl ProblemGraph {
    /// Builds a uniform-random simple undirected graph over `n` vertices with
    /// exactly `edges` edges, using `seed` to drive a deterministic PRNG.
    pub fn new(n: usize, edges: usize, seed: u64) -> Result<Self> {
        let max_edges = n * n.saturating_sub(1) / 2;
        if edges > max_edges {
            return Err(ChainError::Invalid("edge count exceeds n(n-1)/2"));
        }

        let mut all_pairs = Vec::with_capacity(max_edges);
        for u in 0..n {
            for v in (u + 1)..n {
                all_pairs.push((u, v));
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        all_pairs.shuffle(&mut rng);

        let mut adjacency = vec![Vec::new(); n];
        for &(u, v) in all_pairs.iter().take(edges) {
            adjacency[u].push(v);
            adjacency[v].push(u);
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }

        let mut pg = ProblemGraph { n, adjacency, hash: [0u8; 32] };
        pg.hash = pg.compute_hash();
        Ok(pg)
    }

    /// Reconstructs a graph from its stored adjacency — used by the
    /// persistence layer; the hash is recomputed rather than trusted.
    pub fn from_adjacency(adjacency: Vec<Vec<usize>>) -> Self {
        let n = adjacency.len();
        let mut pg = ProblemGraph { n, adjacency, hash: [0u8; 32] };
        pg.hash = pg.compute_hash();
        pg
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn adjacency(&self) -> &[Vec<usize>] {
        &self.adjacency
    }

    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    fn compute_hash(&self) -> [u8; 32] {
        let form = CanonicalForm { hash: "", adjacency: &self.adjacency };
        let bytes = serde_json::to_vec(&form).expect("canonical form is always serializable");
        sha256(&bytes)
    }

    fn has_edge(&self, u: usize, v: usize) -> bool {
        if u >= self.n || v >= self.n {
            return false;
        }
        self.adjacency[u].binary_search(&v).is_ok()
    }

    /// Returns some clique of size >= `k`, or `None` if none exists.
    pub fn find_k_clique(&self, k: usize) -> Option<Vec<usize>> {
        if k == 0 {
            return Some(Vec::new());
        }
        let mut found = None;
        let mut r = Vec::new();
        let p: BTreeSet<usize> = (0..self.n).collect();
        let x = BTreeSet::new();
        self.bron_kerbosch(&mut r, p, x, k, &mut found);
        found
    }

    fn bron_kerbosch(
        &self,
        r: &mut Vec<usize>,
        p: BTreeSet<usize>,
        mut x: BTreeSet<usize>,
        k: usize,
        found: &mut Option<Vec<usize>>,
    ) {
        if found.is_some() {
            return;
        }
        if p.is_empty() && x.is_empty() {
            if r.len() >= k {
                *found = Some(r.clone());
            }
            return;
        }
        let mut remaining = p.clone();
        for &v in &p {
            if found.is_some() {
                return;
            }
            if !remaining.contains(&v) {
                continue;
            }
            remaining.remove(&v);

            let neighbors: BTreeSet<usize> = self.adjacency[v].iter().copied().collect();
            let next_p: BTreeSet<usize> = remaining.intersection(&neighbors).copied().collect();
            let next_x: BTreeSet<usize> = x.intersection(&neighbors).copied().collect();

            r.push(v);
            self.bron_kerbosch(r, next_p, next_x, k, found);
            r.pop();

            x.insert(v);
        }
    }

    /// A solution is valid iff it has at least two vertices, all are in
    /// range, no vertex repeats, and every distinct pair is an edge.
    pub fn validate_clique(&self, solution: &[usize]) -> bool {
        if solution.len() < 2 {
            return false;
        }
        if solution.iter().any(|&v| v >= self.n) {
            return false;
        }
        let unique: BTreeSet<usize> = solution.iter().copied().collect();
        if unique.len() != solution.len() {
            return false;
        }
        for i in 0..solution.len() {
            for j in 0..solution.len() {
                if i == j {
                    continue;
                }
                if !self.has_edge(solution[i], solution[j]) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_too_many_edges() {
        assert!(ProblemGraph::new(3, 10, 1).is_err());
    }

    #[test]
    fn test_new_deterministic_with_seed() {
        let a = ProblemGraph::new(20, 85, 42).unwrap();
        let b = ProblemGraph::new(20, 85, 42).unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.adjacency(), b.adjacency());
    }

    #[test]
    fn test_new_different_seed_usually_differs() {
        let a = ProblemGraph::new(20, 85, 1).unwrap();
        let b = ProblemGraph::new(20, 85, 2).unwrap();
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_hash_excludes_hash_field_but_is_stable() {
        let pg = ProblemGraph::new(10, 20, 7).unwrap();
        let rebuilt = ProblemGraph::from_adjacency(pg.adjacency().to_vec());
        assert_eq!(pg.hash(), rebuilt.hash());
    }

    #[test]
    fn test_validate_clique_soundness() {
        // Triangle 0-1-2, isolated vertex 3.
        let pg = ProblemGraph::from_adjacency(vec![
            vec![1, 2],
            vec![0, 2],
            vec![0, 1],
            vec![],
        ]);
        assert!(pg.validate_clique(&[0, 1, 2]));
        assert!(!pg.validate_clique(&[0, 1, 3]));
        assert!(!pg.validate_clique(&[0]));
        assert!(!pg.validate_clique(&[0, 1, 1]));
        assert!(!pg.validate_clique(&[0, 99]));
    }

    #[test]
    fn test_find_k_clique_finds_triangle() {
        let pg = ProblemGraph::from_adjacency(vec![
            vec![1, 2],
            vec![0, 2],
            vec![0, 1],
            vec![],
        ]);
        let clique = pg.find_k_clique(3).unwrap();
        assert_eq!(clique.len(), 3);
        assert!(pg.validate_clique(&clique));
    }

    #[test]
    fn test_find_k_clique_none_when_absent() {
        let pg = ProblemGraph::from_adjacency(vec![vec![1], vec![0], vec![]]);
        assert!(pg.find_k_clique(3).is_none());
    }

    #[test]
    fn test_clique_soundness_property_randomized() {
        let pg = ProblemGraph::new(15, 50, 99).unwrap();
        if let Some(clique) = pg.find_k_clique(3) {
            assert!(pg.validate_clique(&clique));
            let unique: BTreeSet<usize> = clique.iter().copied().collect();
            assert_eq!(unique.len(), clique.len());
        }
    }
}
