mod chaitin;
mod greedy;

pub use chaitin::Chaitin;
pub use greedy::Greedy;

use crate::graph::{Color, InterferenceGraph, NodeId};
use std::{
    collections::{btree_map, BTreeMap},
    fmt::{self, Display},
    str::FromStr,
};

pub trait Solver {
    /// The name of the current solver
    fn solver_name(&self) -> &'static str;

    /// Colors `graph`, every group is colored with itself and demands that get no
    /// entry are left for the translator to spill
    fn solve(&self, graph: &InterferenceGraph) -> Coloring;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Greedy,
    Chaitin,
}

impl SolverKind {
    pub const ALL: [Self; 2] = [Self::Greedy, Self::Chaitin];

    pub fn solver(self) -> Box<dyn Solver> {
        match self {
            Self::Greedy => Box::new(Greedy::new()),
            Self::Chaitin => Box::new(Chaitin::new()),
        }
    }
}

impl Default for SolverKind {
    fn default() -> Self {
        Self::Chaitin
    }
}

impl FromStr for SolverKind {
    type Err = String;

    fn from_str(solver: &str) -> Result<Self, Self::Err> {
        match solver {
            "greedy" => Ok(Self::Greedy),
            "chaitin" => Ok(Self::Chaitin),
            unknown => Err(format!(
                "unknown solver `{}`, expected `greedy` or `chaitin`",
                unknown,
            )),
        }
    }
}

impl Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Greedy => "greedy",
            Self::Chaitin => "chaitin",
        })
    }
}

/// A solver's output, mapping graph nodes to the color they were given
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Coloring {
    colors: BTreeMap<NodeId, Color>,
}

impl Coloring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a coloring where each of `graph`'s resource groups is colored with itself
    pub fn with_groups(graph: &InterferenceGraph) -> Self {
        graph
            .group_ids()
            .map(|group| (group, Color::of_group(group)))
            .collect()
    }

    pub fn insert(&mut self, node: NodeId, color: Color) -> Option<Color> {
        self.colors.insert(node, color)
    }

    pub fn remove(&mut self, node: NodeId) -> Option<Color> {
        self.colors.remove(&node)
    }

    pub fn get(&self, node: NodeId) -> Option<Color> {
        self.colors.get(&node).copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.colors.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Iterates over every colored node in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Color)> + '_ {
        self.colors.iter().map(|(&node, &color)| (node, color))
    }

    /// The number of `graph`'s demand nodes that received a color
    pub fn colored_demands(&self, graph: &InterferenceGraph) -> usize {
        self.colors
            .keys()
            .filter(|&&node| graph.is_demand(node))
            .count()
    }

    /// Collects every edge of `graph` whose endpoints were given the same color
    pub fn conflicts(&self, graph: &InterferenceGraph) -> Vec<(NodeId, NodeId)> {
        let mut conflicts = Vec::new();

        for (node, color) in self.iter().filter(|&(node, _)| graph.has_node(node)) {
            for neighbor in graph.neighbors(node).filter(|&neighbor| neighbor > node) {
                if self.get(neighbor) == Some(color) {
                    conflicts.push((node, neighbor));
                }
            }
        }

        conflicts
    }
}

impl FromIterator<(NodeId, Color)> for Coloring {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, Color)>,
    {
        Self {
            colors: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Coloring {
    type Item = (&'a NodeId, &'a Color);
    type IntoIter = btree_map::Iter<'a, NodeId, Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.iter()
    }
}

impl Display for Coloring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (node, color)) in self.iter().enumerate() {
            if idx != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", node, color)?;
        }
        f.write_str("}")
    }
}

/// Finds the lowest color in `[0, P)` that none of `node`'s colored neighbors use
pub fn find_unused_color(
    graph: &InterferenceGraph,
    coloring: &Coloring,
    node: NodeId,
) -> Option<Color> {
    let mut used = vec![false; graph.group_count() as usize];
    for color in graph
        .neighbors(node)
        .filter_map(|neighbor| coloring.get(neighbor))
    {
        if let Some(used) = used.get_mut(color.index()) {
            *used = true;
        }
    }

    used.iter()
        .position(|&used| !used)
        .map(|color| Color::new(color as u32))
}
