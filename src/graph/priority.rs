use crate::graph::{InterferenceGraph, NodeId};
use std::cmp::Ordering;

/// Orders two nodes by how willing we are to spill them, the [`Ordering::Less`]
/// side is the one that should be spilled first
///
/// Spillable nodes order by ascending weight and always come before non-spillable
/// nodes. Two non-spillable nodes are tied, neither of them may ever be picked
pub fn spill_order(
    lhs_weight: f64,
    lhs_spillable: bool,
    rhs_weight: f64,
    rhs_spillable: bool,
) -> Ordering {
    match (lhs_spillable, rhs_spillable) {
        (true, true) => lhs_weight.total_cmp(&rhs_weight),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

impl InterferenceGraph {
    /// Compares the spill priority of two nodes using [`spill_order`], returns `None`
    /// if either id is outside of the graph's id space
    pub fn compare_spill_priority(&self, lhs: NodeId, rhs: NodeId) -> Option<Ordering> {
        let (lhs_weight, lhs_spillable) = (self.weight(lhs)?, self.spillable(lhs)?);
        let (rhs_weight, rhs_spillable) = (self.weight(rhs)?, self.spillable(rhs)?);

        Some(spill_order(
            lhs_weight,
            lhs_spillable,
            rhs_weight,
            rhs_spillable,
        ))
    }

    /// Returns `true` if `lhs` should be spilled strictly before `rhs`
    pub fn is_higher_spill_priority(&self, lhs: NodeId, rhs: NodeId) -> Option<bool> {
        self.compare_spill_priority(lhs, rhs)
            .map(|ordering| ordering == Ordering::Less)
    }
}
