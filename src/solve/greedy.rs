use crate::{
    graph::{InterferenceGraph, NodeId},
    solve::{find_unused_color, Coloring, Solver},
    utils::ExpectRegistered,
};

/// Colors demands one at a time, costliest first, handing each the lowest color its
/// already colored neighbors leave free
///
/// Demands that find no free color are left out of the coloring entirely, so this
/// solver never produces a false coloring, only omissions
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl Greedy {
    pub const fn new() -> Self {
        Self
    }
}

impl Solver for Greedy {
    fn solver_name(&self) -> &'static str {
        "greedy"
    }

    #[tracing::instrument(name = "greedy", skip_all, fields(demands = graph.demand_count()))]
    fn solve(&self, graph: &InterferenceGraph) -> Coloring {
        // Visit in reverse spill order so the demands we'd least like to spill pick
        // their colors first and the cheap ones absorb the leftovers
        let mut demands: Vec<NodeId> = graph.demand_nodes().collect();
        demands.sort_by(|&lhs, &rhs| {
            graph
                .compare_spill_priority(rhs, lhs)
                .expect_registered(&(lhs, rhs))
        });

        let mut coloring = Coloring::with_groups(graph);
        let mut uncolored = 0;
        for demand in demands {
            match find_unused_color(graph, &coloring, demand) {
                Some(color) => {
                    tracing::trace!("colored {} with {}", demand, color);
                    coloring.insert(demand, color);
                }

                None => {
                    tracing::debug!("no free color left for {}", demand);
                    uncolored += 1;
                }
            }
        }

        tracing::debug!(
            "colored {} of {} demands ({} uncolored)",
            coloring.colored_demands(graph),
            graph.demand_count(),
            uncolored,
        );

        coloring
    }
}
