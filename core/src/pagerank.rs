//! PageRank by power iteration over a small 0/1 link matrix.

use crate::config::PageRankConfig;
use crate::{LabError, Result};
use serde::{Deserialize, Serialize};

/// Directed link graph. `links[i][j]` is true when page `i` links to page `j`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkGraph {
    links: Vec<Vec<bool>>,
    out_degree: Vec<usize>,
}

impl LinkGraph {
    /// Validate a square matrix of 0/1 entries.
    pub fn from_adjacency(matrix: &[Vec<u8>]) -> Result<Self> {
        let n = matrix.len();
        let mut links = Vec::with_capacity(n);
        for (row, entries) in matrix.iter().enumerate() {
            if entries.len() != n {
                return Err(LabError::NonSquareMatrix { row, len: entries.len(), expected: n });
            }
            let mut out = Vec::with_capacity(n);
            for (col, &value) in entries.iter().enumerate() {
                match value {
                    0 => out.push(false),
                    1 => out.push(true),
                    _ => return Err(LabError::InvalidAdjacencyEntry { row, col, value }),
                }
            }
            links.push(out);
        }
        Ok(Self::from_links(links))
    }

    pub fn from_edges(pages: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let mut links = vec![vec![false; pages]; pages];
        for &(from, to) in edges {
            if from >= pages || to >= pages {
                return Err(LabError::EdgeOutOfRange { from, to, pages });
            }
            links[from][to] = true;
        }
        Ok(Self::from_links(links))
    }

    fn from_links(links: Vec<Vec<bool>>) -> Self {
        let out_degree = links.iter().map(|row| row.iter().filter(|&&l| l).count()).collect();
        Self { links, out_degree }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links_to(&self, from: usize, to: usize) -> bool {
        self.links[from][to]
    }

    pub fn out_degree(&self, page: usize) -> usize {
        self.out_degree[page]
    }

    pub fn to_adjacency(&self) -> Vec<Vec<u8>> {
        self.links
            .iter()
            .map(|row| row.iter().map(|&l| u8::from(l)).collect())
            .collect()
    }
}

pub fn uniform_ranks(pages: usize) -> Vec<f64> {
    if pages == 0 {
        return Vec::new();
    }
    vec![1.0 / pages as f64; pages]
}

/// One synchronous update, writing into `next`. Pages without outlinks are
/// treated as having out-degree one, so their rank is not redistributed.
fn step_into(graph: &LinkGraph, ranks: &[f64], damping: f64, next: &mut [f64]) {
    let n = graph.len();
    debug_assert_eq!(ranks.len(), n);
    debug_assert_eq!(next.len(), n);
    let teleport = (1.0 - damping) / n as f64;
    for (i, slot) in next.iter_mut().enumerate() {
        let inflow: f64 = (0..n)
            .filter(|&j| graph.links_to(j, i))
            .map(|j| ranks[j] / graph.out_degree(j).max(1) as f64)
            .sum();
        *slot = teleport + damping * inflow;
    }
}

/// One synchronous update from `ranks`, which must hold one entry per page.
pub fn step(graph: &LinkGraph, ranks: &[f64], damping: f64) -> Result<Vec<f64>> {
    if ranks.len() != graph.len() {
        return Err(LabError::RankLengthMismatch { got: ranks.len(), expected: graph.len() });
    }
    let mut next = vec![0.0; graph.len()];
    step_into(graph, ranks, damping, &mut next);
    Ok(next)
}

/// Sum of absolute per-page differences.
pub fn l1_change(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    pub iterations: usize,
    pub converged: bool,
    pub last_change: f64,
}

/// Iteration driver that owns the rank vector and advances it one step at a time.
#[derive(Debug, Clone)]
pub struct PageRank<'g> {
    graph: &'g LinkGraph,
    config: PageRankConfig,
    ranks: Vec<f64>,
    scratch: Vec<f64>,
    iteration: usize,
}

impl<'g> PageRank<'g> {
    /// Start from the uniform distribution.
    pub fn new(graph: &'g LinkGraph, config: PageRankConfig) -> Result<Self> {
        Self::with_ranks(graph, config, uniform_ranks(graph.len()))
    }

    pub fn with_ranks(graph: &'g LinkGraph, config: PageRankConfig, ranks: Vec<f64>) -> Result<Self> {
        config.validate()?;
        if ranks.len() != graph.len() {
            return Err(LabError::RankLengthMismatch { got: ranks.len(), expected: graph.len() });
        }
        let scratch = vec![0.0; ranks.len()];
        Ok(Self { graph, config, ranks, scratch, iteration: 0 })
    }

    /// Advance one iteration in place and return the L1 change.
    pub fn step(&mut self) -> f64 {
        step_into(self.graph, &self.ranks, self.config.damping, &mut self.scratch);
        std::mem::swap(&mut self.ranks, &mut self.scratch);
        self.iteration += 1;
        let change = l1_change(&self.ranks, &self.scratch);
        tracing::trace!(iteration = self.iteration, change, "pagerank step");
        change
    }

    /// Step until the change drops below the tolerance or the iteration budget runs out.
    pub fn run(&mut self) -> Convergence {
        let mut last_change = f64::INFINITY;
        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            last_change = self.step();
            iterations += 1;
            if last_change < self.config.tolerance {
                break;
            }
        }
        let converged = last_change < self.config.tolerance;
        tracing::debug!(iterations, converged, last_change, "pagerank finished");
        Convergence { iterations, converged, last_change }
    }

    pub fn ranks(&self) -> &[f64] {
        &self.ranks
    }

    pub fn into_ranks(self) -> Vec<f64> {
        self.ranks
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn total(&self) -> f64 {
        self.ranks.iter().sum()
    }
}
