use crate::{
    graph::{InterferenceGraph, NodeId},
    solve::{find_unused_color, Coloring, Solver},
    utils::ExpectRegistered,
};

/// Chaitin-style simplify/select coloring with optimistic spill candidates
///
/// Simplify strips every demand with fewer edges than there are colors off of a
/// working copy of the graph, sweep after sweep. When a sweep finds nothing to strip
/// the cheapest spillable demand is pulled off anyway as an optimistic candidate.
/// Select then rebuilds the graph in reverse removal order, coloring each node with
/// the lowest color its re-added neighbors leave free
#[derive(Debug, Clone, Copy, Default)]
pub struct Chaitin;

impl Chaitin {
    pub const fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    /// Had fewer edges than colors when it was removed, a free color is guaranteed
    Simplified,
    /// Forced off the graph, it may or may not find a free color
    Optimistic,
}

impl Solver for Chaitin {
    fn solver_name(&self) -> &'static str {
        "chaitin"
    }

    #[tracing::instrument(name = "chaitin", skip_all, fields(demands = graph.demand_count()))]
    fn solve(&self, graph: &InterferenceGraph) -> Coloring {
        let mut working = graph.clone();
        let stack = simplify(&mut working);

        // `working` is now down to the group nodes, select rebuilds it from the stack
        select(graph, &mut working, stack)
    }
}

fn simplify(working: &mut InterferenceGraph) -> Vec<(NodeId, Removal)> {
    let colors = working.group_count() as usize;
    let mut stack = Vec::with_capacity(working.demand_count() as usize);

    let (mut sweeps, mut trivial) = (0usize, Vec::new());
    while working.demand_count() > 0 {
        sweeps += 1;

        trivial.clear();
        trivial.extend(working.demand_nodes().filter(|&demand| {
            working.edge_count(demand).expect_registered(&demand) < colors
        }));

        // Removing nodes only ever lowers degrees, so everything collected by this
        // sweep stays trivially colorable until the whole sweep has been removed
        for &demand in &trivial {
            working.remove_node(demand);
            stack.push((demand, Removal::Simplified));
        }

        if trivial.is_empty() {
            let candidate = working
                .demand_nodes()
                .min_by(|&lhs, &rhs| {
                    working
                        .compare_spill_priority(lhs, rhs)
                        .expect_registered(&(lhs, rhs))
                })
                .expect_registered(&"a remaining demand");

            tracing::debug!(
                "no trivially colorable demands left, pushing {} as an optimistic spill \
                 candidate (weight: {:?}, edges: {:?})",
                candidate,
                working.weight(candidate),
                working.edge_count(candidate),
            );

            working.remove_node(candidate);
            stack.push((candidate, Removal::Optimistic));
        } else {
            tracing::trace!("simplified {} demands", trivial.len());
        }
    }

    tracing::debug!(
        "simplified {} demands in {} sweeps ({} optimistic)",
        stack.len(),
        sweeps,
        stack
            .iter()
            .filter(|&&(_, removal)| removal == Removal::Optimistic)
            .count(),
    );

    stack
}

fn select(
    graph: &InterferenceGraph,
    working: &mut InterferenceGraph,
    mut stack: Vec<(NodeId, Removal)>,
) -> Coloring {
    let mut coloring = Coloring::with_groups(graph);

    while let Some((demand, removal)) = stack.pop() {
        working.add_node(demand);
        for neighbor in graph.neighbors(demand) {
            if working.has_node(neighbor) {
                working.add_edge(demand, neighbor);
            }
        }

        match (find_unused_color(working, &coloring, demand), removal) {
            (Some(color), _) => {
                tracing::trace!("colored {} with {}", demand, color);
                coloring.insert(demand, color);
            }

            // Every color is taken by a neighbor, leaving it uncolored is the only sound
            // option and the translator will spill it
            (None, Removal::Optimistic) => {
                tracing::debug!("optimistic candidate {} found no free color", demand);
            }

            (None, Removal::Simplified) => panic!(
                "{} was simplified with fewer edges than colors but found no free color \
                 during select, the working graph diverged from {:?}",
                demand,
                graph.neighbors(demand).collect::<Vec<_>>(),
            ),
        }
    }

    coloring
}
