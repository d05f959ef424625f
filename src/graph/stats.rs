use crate::graph::InterferenceGraph;
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphStats {
    pub groups: usize,
    pub demands: usize,
    /// Edges between two resource groups
    pub clique_edges: usize,
    /// Edges between a demand and a group it can't be colored with
    pub candidate_edges: usize,
    /// Edges between two demands
    pub interference_edges: usize,
    pub max_demand_degree: usize,
}

impl GraphStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edges(&self) -> usize {
        self.clique_edges + self.candidate_edges + self.interference_edges
    }
}

impl Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} groups, {} demands, {} edges ({} clique, {} candidate, {} interference), \
             max demand degree {}",
            self.groups,
            self.demands,
            self.edges(),
            self.clique_edges,
            self.candidate_edges,
            self.interference_edges,
            self.max_demand_degree,
        )
    }
}

impl InterferenceGraph {
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats::new();

        for node in self.nodes() {
            if self.is_group(node) {
                stats.groups += 1;
            } else {
                stats.demands += 1;
                stats.max_demand_degree = stats
                    .max_demand_degree
                    .max(self.edge_count(node).unwrap_or(0));
            }

            // Only count each undirected edge from its lower endpoint
            for neighbor in self.neighbors(node).filter(|&neighbor| neighbor > node) {
                match (self.is_group(node), self.is_group(neighbor)) {
                    (true, true) => stats.clique_edges += 1,
                    (false, false) => stats.interference_edges += 1,
                    _ => stats.candidate_edges += 1,
                }
            }
        }

        stats
    }
}
