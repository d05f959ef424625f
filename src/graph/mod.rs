//! The interference graph handed from [`Registers`] to the solvers
//!
//! Nodes live in a fixed, compact id space: resource groups occupy `[0, P)` and
//! demand ordinals occupy `[P, P + V)`. Every node owns a bitmap of its neighbors
//! and demand attributes are stored in flat arrays indexed by `ordinal - P`, so
//! the solvers' inner loops are plain bitmap operations over integer indices.
//!
//! [`Registers`]: crate::registers::Registers

mod ids;
mod priority;
mod stats;

pub use ids::{Color, NodeId};
pub use priority::spill_order;
pub use stats::GraphStats;

use crate::utils::write_set;
use roaring::RoaringBitmap;
use std::{
    fmt::{self, Display},
    mem::take,
    ops::Range,
};

#[derive(Debug, Clone, PartialEq)]
pub struct InterferenceGraph {
    group_count: u32,
    demand_count: u32,
    /// The number of demand nodes currently present
    present_demands: u32,
    present: RoaringBitmap,
    adjacency: Vec<RoaringBitmap>,
    weights: Vec<f64>,
    spillable: Vec<bool>,
}

impl InterferenceGraph {
    /// Creates an empty graph over `group_count` group ids and `demand_count` demand
    /// ids, nodes still need to be added before they can carry edges
    pub fn new(group_count: u32, demand_count: u32) -> Self {
        let total = group_count as usize + demand_count as usize;

        Self {
            group_count,
            demand_count,
            present_demands: 0,
            present: RoaringBitmap::new(),
            adjacency: vec![RoaringBitmap::new(); total],
            weights: vec![0.0; demand_count as usize],
            spillable: vec![true; demand_count as usize],
        }
    }

    /// The number of resource groups, `P`. This is also the number of colors
    pub const fn group_count(&self) -> u32 {
        self.group_count
    }

    /// The size of the demand range, `V`, regardless of how many demands are present
    pub const fn full_demand_count(&self) -> u32 {
        self.demand_count
    }

    /// The number of demand nodes currently in the graph
    pub const fn demand_count(&self) -> u32 {
        self.present_demands
    }

    /// The number of nodes currently in the graph
    pub fn len(&self) -> usize {
        self.present.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    pub fn group_ids(&self) -> impl Iterator<Item = NodeId> {
        self.group_range().map(NodeId::new)
    }

    pub fn demand_ids(&self) -> impl Iterator<Item = NodeId> {
        self.demand_range().map(NodeId::new)
    }

    fn group_range(&self) -> Range<u32> {
        0..self.group_count
    }

    fn demand_range(&self) -> Range<u32> {
        self.group_count..self.group_count + self.demand_count
    }

    #[inline]
    pub fn is_group(&self, node: NodeId) -> bool {
        node.0 < self.group_count
    }

    #[inline]
    pub fn is_demand(&self, node: NodeId) -> bool {
        self.demand_range().contains(&node.0)
    }

    #[inline]
    fn demand_index(&self, node: NodeId) -> Option<usize> {
        self.is_demand(node)
            .then(|| (node.0 - self.group_count) as usize)
    }

    /// Adds the resource group node `group`, returning `false` if `group` isn't a group id
    pub fn add_group(&mut self, group: NodeId) -> bool {
        if !self.is_group(group) {
            tracing::trace!("refusing to add {} as a group, it's out of range", group);
            return false;
        }

        self.present.insert(group.0);
        true
    }

    /// Adds the demand node `demand` with the given spill weight and spillability,
    /// returning `false` if `demand` isn't a demand id
    pub fn add_demand(&mut self, demand: NodeId, weight: f64, spillable: bool) -> bool {
        let idx = match self.demand_index(demand) {
            Some(idx) => idx,
            None => {
                tracing::trace!("refusing to add {} as a demand, it's out of range", demand);
                return false;
            }
        };

        self.weights[idx] = weight;
        self.spillable[idx] = spillable;
        self.insert_present(demand);

        true
    }

    /// Re-adds a node without touching its stored attributes, used when a working
    /// copy gets rebuilt from a stack of previously removed nodes
    pub fn add_node(&mut self, node: NodeId) -> bool {
        if self.is_group(node) || self.is_demand(node) {
            self.insert_present(node);
            true
        } else {
            false
        }
    }

    fn insert_present(&mut self, node: NodeId) {
        if self.present.insert(node.0) && self.is_demand(node) {
            self.present_demands += 1;
        }
    }

    pub fn set_weight(&mut self, demand: NodeId, weight: f64) -> bool {
        if let Some(idx) = self.demand_index(demand) {
            self.weights[idx] = weight;
            true
        } else {
            false
        }
    }

    pub fn set_spillable(&mut self, demand: NodeId, spillable: bool) -> bool {
        if let Some(idx) = self.demand_index(demand) {
            self.spillable[idx] = spillable;
            true
        } else {
            false
        }
    }

    /// Returns the spill weight of `node`, groups always weigh [`f64::INFINITY`]
    pub fn weight(&self, node: NodeId) -> Option<f64> {
        if self.is_group(node) {
            Some(f64::INFINITY)
        } else {
            self.demand_index(node).map(|idx| self.weights[idx])
        }
    }

    /// Returns whether `node` may be spilled, groups never are
    pub fn spillable(&self, node: NodeId) -> Option<bool> {
        if self.is_group(node) {
            Some(false)
        } else {
            self.demand_index(node).map(|idx| self.spillable[idx])
        }
    }

    #[inline]
    pub fn has_node(&self, node: NodeId) -> bool {
        self.present.contains(node.0)
    }

    pub fn has_edge(&self, lhs: NodeId, rhs: NodeId) -> bool {
        self.has_node(lhs) && self.adjacency[lhs.index()].contains(rhs.0)
    }

    /// Adds an undirected edge between `lhs` and `rhs`
    ///
    /// Returns `false` without touching the graph if either node is absent or
    /// if both ends are the same node
    pub fn add_edge(&mut self, lhs: NodeId, rhs: NodeId) -> bool {
        if lhs == rhs || !self.has_node(lhs) || !self.has_node(rhs) {
            return false;
        }

        self.adjacency[lhs.index()].insert(rhs.0);
        self.adjacency[rhs.index()].insert(lhs.0);
        tracing::trace!("added edge {} -- {}", lhs, rhs);

        true
    }

    /// Removes the edge between `lhs` and `rhs` if there is one, returns `false`
    /// when either node is absent
    pub fn remove_edge(&mut self, lhs: NodeId, rhs: NodeId) -> bool {
        if !self.has_node(lhs) || !self.has_node(rhs) {
            return false;
        }

        self.adjacency[lhs.index()].remove(rhs.0);
        self.adjacency[rhs.index()].remove(lhs.0);
        tracing::trace!("removed edge {} -- {}", lhs, rhs);

        true
    }

    /// Removes `node` along with every edge touching it
    pub fn remove_node(&mut self, node: NodeId) -> bool {
        if !self.present.remove(node.0) {
            tracing::trace!("could not find {} to remove it", node);
            return false;
        }

        let neighbors = take(&mut self.adjacency[node.index()]);
        for neighbor in &neighbors {
            self.adjacency[neighbor as usize].remove(node.0);
        }

        if self.is_demand(node) {
            self.present_demands -= 1;
        }
        tracing::trace!("removed {} and {} edges", node, neighbors.len());

        true
    }

    /// The degree of `node`, counting edges to groups and demands alike
    pub fn edge_count(&self, node: NodeId) -> Option<usize> {
        self.has_node(node)
            .then(|| self.adjacency[node.index()].len() as usize)
    }

    /// Iterates over every node present in the graph in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.present.iter().map(NodeId::new)
    }

    pub fn group_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes().take_while(move |&node| self.is_group(node))
    }

    pub fn demand_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes().filter(move |&node| self.is_demand(node))
    }

    /// Iterates over the neighbors of `node`, yielding nothing when `node` is absent
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency
            .get(node.index())
            .into_iter()
            .flat_map(|edges| edges.iter())
            .map(NodeId::new)
    }

    /// Iterates over the neighbors of `node` that are demands, skipping the group clique
    pub fn demand_neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors(node)
            .filter(move |&neighbor| self.is_demand(neighbor))
    }
}

impl Display for InterferenceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, node) in self.nodes().enumerate() {
            if idx != 0 {
                f.write_str(", ")?;
            }

            write!(f, "{}: ", node)?;
            write_set(f, self.neighbors(node))?;
        }
        f.write_str("]")
    }
}
