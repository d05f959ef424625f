//! Turns a solver's [`Coloring`] back into raw resource assignments and spills

use crate::{
    graph::{Color, NodeId},
    registers::{PhysReg, Registers, VirtReg},
    solve::Coloring,
    utils::{DisplayWeight, HashMap, HashSet},
};
use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{self, Display},
};

type Result<T> = std::result::Result<T, TranslateError>;

/// The coloring contradicts itself and can't be mapped back onto the registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateError {
    /// A resource group was left out of the coloring
    MissingGroup { group: NodeId },
    /// Two distinct groups were given the same color
    DuplicateColor {
        color: Color,
        first: NodeId,
        second: NodeId,
    },
    /// More distinct colors are in use than there are groups to back them
    TooManyColors { used: usize, groups: u32 },
    /// A demand was colored with a color none of the groups claimed
    UnknownColor { demand: VirtReg, color: Color },
}

impl Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MissingGroup { group } => {
                write!(f, "resource group {} has no color", group)
            }
            Self::DuplicateColor {
                color,
                first,
                second,
            } => write!(
                f,
                "resource groups {} and {} were both colored {}",
                first, second, color,
            ),
            Self::TooManyColors { used, groups } => write!(
                f,
                "{} distinct colors are in use but there are only {} resource groups",
                used, groups,
            ),
            Self::UnknownColor { demand, color } => write!(
                f,
                "{} was colored {} which doesn't belong to any resource group",
                demand, color,
            ),
        }
    }
}

impl Error for TranslateError {}

/// The outcome of one round, every registered demand is either assigned or spilled
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Allocation {
    assignments: BTreeMap<VirtReg, PhysReg>,
    spills: Vec<VirtReg>,
}

impl Allocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, virt: VirtReg, phys: PhysReg) {
        self.assignments.insert(virt, phys);
    }

    pub fn spill(&mut self, virt: VirtReg) {
        self.spills.push(virt);
    }

    pub const fn assignments(&self) -> &BTreeMap<VirtReg, PhysReg> {
        &self.assignments
    }

    /// Spilled demands in ordinal order
    pub fn spills(&self) -> &[VirtReg] {
        &self.spills
    }

    pub fn assignment(&self, virt: VirtReg) -> Option<PhysReg> {
        self.assignments.get(&virt).copied()
    }

    pub fn is_spilled(&self, virt: VirtReg) -> bool {
        self.spills.contains(&virt)
    }

    /// The summed weight of every spilled demand, a spilled demand that wasn't
    /// allowed to spill makes the cost infinite
    pub fn spill_cost(&self, registers: &Registers) -> f64 {
        self.spills
            .iter()
            .filter_map(|&virt| registers.virt(virt))
            .map(|reg| {
                if reg.spillable() {
                    reg.weight()
                } else {
                    f64::INFINITY
                }
            })
            .sum()
    }
}

impl Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (virt, phys) in &self.assignments {
            writeln!(f, "{} -> {}", virt, phys)?;
        }
        for virt in &self.spills {
            writeln!(f, "{} -> spill", virt)?;
        }

        Ok(())
    }
}

/// Maps `coloring` onto the registers it was solved for
///
/// Each registered demand is assigned the concrete resource its color stands for,
/// or spilled if it has no color or if its color's group holds none of its
/// candidates. Fails when the coloring of the groups themselves is inconsistent
#[tracing::instrument(skip_all)]
pub fn translate(registers: &Registers, coloring: &Coloring) -> Result<Allocation> {
    let color_groups = color_groups(registers, coloring)?;

    let mut allocation = Allocation::new();
    for virt in registers.virt_ids() {
        let color = registers
            .virt_ordinal(virt)
            .and_then(|node| coloring.get(node));

        let color = match color {
            Some(color) => color,
            None => {
                tracing::debug!("spilling {}, it wasn't colored", virt);
                allocation.spill(virt);
                continue;
            }
        };

        let group = *color_groups
            .get(&color)
            .ok_or(TranslateError::UnknownColor {
                demand: virt,
                color,
            })?;

        match registers.virt_cand_phys_in_group(virt, group) {
            Some(phys) => {
                tracing::trace!("assigning {} to {} (color {})", virt, phys, color);
                allocation.assign(virt, phys);
            }

            None => {
                tracing::debug!(
                    "spilling {}, its color {} maps to group {} which holds none of its candidates",
                    virt,
                    color,
                    group,
                );
                allocation.spill(virt);
            }
        }
    }

    // Nodes past the registered demands are never translated, but their colors
    // still have to be backed by a group
    let used_colors: HashSet<Color> = coloring.iter().map(|(_, color)| color).collect();
    if used_colors.len() > registers.group_count() as usize {
        return Err(TranslateError::TooManyColors {
            used: used_colors.len(),
            groups: registers.group_count(),
        });
    }

    tracing::debug!(
        "assigned {} demands and spilled {} (spill cost {})",
        allocation.assignments.len(),
        allocation.spills.len(),
        DisplayWeight(allocation.spill_cost(registers)),
    );

    Ok(allocation)
}

/// Inverts the groups' part of the coloring
fn color_groups(registers: &Registers, coloring: &Coloring) -> Result<HashMap<Color, NodeId>> {
    let mut color_groups = HashMap::default();

    for group in registers.group_ids() {
        let color = coloring
            .get(group)
            .ok_or(TranslateError::MissingGroup { group })?;

        if let Some(&first) = color_groups.get(&color) {
            return Err(TranslateError::DuplicateColor {
                color,
                first,
                second: group,
            });
        }
        color_groups.insert(color, group);
    }

    Ok(color_groups)
}
