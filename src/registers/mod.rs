//! Builds one allocation round's compact id space out of raw resource and demand ids
//!
//! Physical resources that alias each other are folded into resource groups, the
//! groups become the colors. Demands get an ordinal in registration order and end up
//! as node `group_count + ordinal` of the interference graph.

mod ids;

pub use ids::{PhysReg, VirtReg};

use crate::{
    graph::{InterferenceGraph, NodeId},
    utils::{write_set, DisplayWeight, ExpectRegistered, HashMap},
};
use std::{
    collections::BTreeSet,
    fmt::{self, Display},
};

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualRegister {
    weight: f64,
    spillable: bool,
    candidates: BTreeSet<PhysReg>,
    interferences: BTreeSet<VirtReg>,
}

impl VirtualRegister {
    fn new(weight: f64, spillable: bool, candidates: BTreeSet<PhysReg>) -> Self {
        Self {
            weight,
            spillable,
            candidates,
            interferences: BTreeSet::new(),
        }
    }

    pub const fn weight(&self) -> f64 {
        self.weight
    }

    pub const fn spillable(&self) -> bool {
        self.spillable
    }

    /// The raw resources this demand may legally be bound to
    pub const fn candidates(&self) -> &BTreeSet<PhysReg> {
        &self.candidates
    }

    pub const fn interferences(&self) -> &BTreeSet<VirtReg> {
        &self.interferences
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registers {
    virt_regs: HashMap<VirtReg, VirtualRegister>,
    virt_ordinals: HashMap<VirtReg, u32>,
    ordinal_virts: Vec<VirtReg>,
    phys_groups: HashMap<PhysReg, u32>,
    groups: Vec<BTreeSet<PhysReg>>,
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the physical resource `phys` and the resources aliasing it, returning
    /// the resource group they belong to
    ///
    /// If `phys` or any of `aliases` is already grouped the first such group is reused,
    /// otherwise a fresh group is created. Two groups that already exist are never
    /// merged, even when `aliases` spans both of them; the leftover aliases stay in
    /// whichever group claimed them first
    pub fn add_phys(&mut self, phys: PhysReg, aliases: &[PhysReg]) -> NodeId {
        if let Some(&group) = self.phys_groups.get(&phys) {
            return NodeId::new(group);
        }

        let group = aliases
            .iter()
            .find_map(|alias| self.phys_groups.get(alias).copied())
            .unwrap_or_else(|| {
                let group = self.groups.len() as u32;
                self.groups.push(BTreeSet::new());
                tracing::trace!("created resource group {} for {}", NodeId::new(group), phys);

                group
            });

        for &member in std::iter::once(&phys).chain(aliases) {
            if !self.phys_groups.contains_key(&member) {
                self.phys_groups.insert(member, group);
                self.groups[group as usize].insert(member);
            }
        }

        NodeId::new(group)
    }

    /// Registers a demand with its legal candidate resources, spill weight and
    /// spillability, assigning it the next ordinal
    ///
    /// Returns `false` and leaves the registers untouched if `virt` was already
    /// registered this round
    pub fn add_virt<C>(&mut self, virt: VirtReg, candidates: C, weight: f64, spillable: bool) -> bool
    where
        C: IntoIterator<Item = PhysReg>,
    {
        debug_assert!(
            !weight.is_nan(),
            "{} was registered with a NaN spill weight",
            virt,
        );

        if self.virt_regs.contains_key(&virt) {
            tracing::warn!("{} was registered twice in the same round", virt);
            return false;
        }

        let candidates: BTreeSet<_> = candidates.into_iter().collect();
        tracing::trace!(
            "registered {} (weight: {}, spillable: {}, candidates: {:?})",
            virt,
            weight,
            spillable,
            candidates,
        );

        self.virt_regs
            .insert(virt, VirtualRegister::new(weight, spillable, candidates));
        self.virt_ordinals
            .insert(virt, self.ordinal_virts.len() as u32);
        self.ordinal_virts.push(virt);

        true
    }

    /// Records that `lhs` and `rhs` are live at the same time, returns `false` if
    /// either of them wasn't registered or if they're the same demand
    pub fn add_virt_interference(&mut self, lhs: VirtReg, rhs: VirtReg) -> bool {
        if lhs == rhs || !self.virt_regs.contains_key(&lhs) || !self.virt_regs.contains_key(&rhs)
        {
            return false;
        }

        if let Some(reg) = self.virt_regs.get_mut(&lhs) {
            reg.interferences.insert(rhs);
        }
        if let Some(reg) = self.virt_regs.get_mut(&rhs) {
            reg.interferences.insert(lhs);
        }

        true
    }

    pub fn group_count(&self) -> u32 {
        self.groups.len() as u32
    }

    pub fn virt_count(&self) -> u32 {
        self.ordinal_virts.len() as u32
    }

    pub fn group_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.group_count()).map(NodeId::new)
    }

    /// Iterates over every registered demand in ordinal order
    pub fn virt_ids(&self) -> impl Iterator<Item = VirtReg> + '_ {
        self.ordinal_virts.iter().copied()
    }

    pub fn virt(&self, virt: VirtReg) -> Option<&VirtualRegister> {
        self.virt_regs.get(&virt)
    }

    /// The graph node of `virt`, its ordinal offset past the group range
    pub fn virt_ordinal(&self, virt: VirtReg) -> Option<NodeId> {
        self.virt_ordinals
            .get(&virt)
            .map(|&ordinal| NodeId::new(ordinal + self.group_count()))
    }

    /// The demand living at graph node `node`, if `node` is within the demand range
    pub fn virt_at(&self, node: NodeId) -> Option<VirtReg> {
        let ordinal = node.raw().checked_sub(self.group_count())?;
        self.ordinal_virts.get(ordinal as usize).copied()
    }

    pub fn phys_group(&self, phys: PhysReg) -> Option<NodeId> {
        self.phys_groups.get(&phys).copied().map(NodeId::new)
    }

    pub fn group_members(&self, group: NodeId) -> Option<&BTreeSet<PhysReg>> {
        self.groups.get(group.index())
    }

    /// Picks one of `virt`'s candidate resources that lives within `group`, the
    /// lowest raw id wins when there's more than one
    ///
    /// Returns `None` when `virt` is unknown or when none of its candidates belong to
    /// `group`, which means coloring `virt` with `group` isn't legal
    pub fn virt_cand_phys_in_group(&self, virt: VirtReg, group: NodeId) -> Option<PhysReg> {
        self.virt(virt)?
            .candidates
            .iter()
            .copied()
            .find(|&phys| self.phys_group(phys) == Some(group))
    }

    /// Builds the interference graph for this round
    ///
    /// Groups form a clique, each demand is connected to every group none of its
    /// candidates belong to and declared interferences connect demand ordinals
    #[tracing::instrument(skip_all)]
    pub fn create_interference_graph(&self) -> InterferenceGraph {
        let (group_count, virt_count) = (self.group_count(), self.virt_count());
        let mut graph = InterferenceGraph::new(group_count, virt_count);

        for group in self.group_ids() {
            graph.add_group(group);
            for other in (0..group.raw()).map(NodeId::new) {
                graph.add_edge(group, other);
            }
        }

        let mut legal_groups = vec![false; group_count as usize];
        for (ordinal, &virt) in self.ordinal_virts.iter().enumerate() {
            let node = NodeId::new(group_count + ordinal as u32);
            let reg = self.virt(virt).expect_registered(&virt);
            graph.add_demand(node, reg.weight, reg.spillable);

            legal_groups.fill(false);
            for &candidate in &reg.candidates {
                match self.phys_groups.get(&candidate) {
                    Some(&group) => legal_groups[group as usize] = true,
                    None => tracing::warn!(
                        "ignoring candidate {} of {}, it was never registered as a resource",
                        candidate,
                        virt,
                    ),
                }
            }

            for (group, _) in legal_groups
                .iter()
                .enumerate()
                .filter(|&(_, &legal)| !legal)
            {
                graph.add_edge(node, NodeId::new(group as u32));
            }
        }

        for (ordinal, &virt) in self.ordinal_virts.iter().enumerate() {
            let node = NodeId::new(group_count + ordinal as u32);
            let reg = self.virt(virt).expect_registered(&virt);

            for &other in &reg.interferences {
                let other = self.virt_ordinal(other).expect_registered(&other);
                graph.add_edge(node, other);
            }
        }

        tracing::debug!("built interference graph: {}", graph.stats());
        graph
    }
}

impl Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for virt in self.virt_ids() {
            let reg = self.virt(virt).expect_registered(&virt);

            write!(
                f,
                "{}: weight {}, {}, cand ",
                virt,
                DisplayWeight(reg.weight),
                if reg.spillable { "spillable" } else { "fixed" },
            )?;
            write_set(f, &reg.candidates)?;
            f.write_str(", interferes ")?;
            write_set(f, &reg.interferences)?;
            f.write_str("\n")?;
        }

        f.write_str("ordinals: ")?;
        write_set(
            f,
            self.virt_ids().map(|virt| {
                let node = self.virt_ordinal(virt).expect_registered(&virt);
                format!("{} -> {}", node, virt)
            }),
        )?;

        f.write_str("\ngroups: [")?;
        for (idx, members) in self.groups.iter().enumerate() {
            if idx != 0 {
                f.write_str(", ")?;
            }

            write!(f, "{}: ", NodeId::new(idx as u32))?;
            write_set(f, members)?;
        }
        f.write_str("]")
    }
}
