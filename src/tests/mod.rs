#![cfg(test)]

use crate::{
    driver,
    graph::{Color, InterferenceGraph, NodeId},
    problem,
    registers::{PhysReg, Registers, VirtReg},
    solve::{Chaitin, Coloring, Greedy, Solver, SolverKind},
    translate::{translate, Allocation},
};
use expect_test::expect;

fn set_logger() {
    use tracing_subscriber::{
        fmt::{self, time},
        prelude::__tracing_subscriber_SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(time::uptime())
        .with_test_writer();
    let filter_layer = EnvFilter::try_from_env("REGCOLOR_LOG")
        .or_else(|_| EnvFilter::try_new("debug"))
        .unwrap();

    // Every test tries to install it, only the first one wins
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}

macro_rules! test_corpus {
    ($name:ident, $file:literal, $expected:expr $(,)?) => {
        #[test]
        fn $name() {
            set_logger();

            let registers = problem::parse(include_str!(concat!("corpus/", $file))).unwrap();
            let expected = $expected;

            for kind in SolverKind::ALL {
                let allocation = driver::run_round(&registers, &*kind.solver()).unwrap();
                check_allocation(&registers, &allocation);

                let output = format!(
                    "{}spill cost {}",
                    allocation,
                    allocation.spill_cost(&registers),
                );
                expected.assert_eq(&output);
            }
        }
    };
}

test_corpus! {
    diamond,
    "diamond.regs",
    expect![[r#"
        v10 -> p0
        v11 -> p2
        v12 -> p2
        v13 -> spill
        spill cost 1"#]],
}

test_corpus! {
    pressure,
    "pressure.regs",
    expect![[r#"
        v1 -> p2
        v2 -> p0
        v4 -> p1
        v5 -> p1
        v3 -> spill
        spill cost 2"#]],
}

#[test]
fn diamond_graph() {
    let registers = problem::parse(include_str!("corpus/diamond.regs")).unwrap();
    let graph = registers.create_interference_graph();

    expect![[r#"[n0: {n1, n5}, n1: {n0}, n2: {n3, n4}, n3: {n2, n5}, n4: {n2, n5}, n5: {n0, n3, n4}]"#]]
        .assert_eq(&graph.to_string());
    expect![[r#"2 groups, 4 demands, 6 edges (1 clique, 1 candidate, 4 interference), max demand degree 3"#]]
        .assert_eq(&graph.stats().to_string());
}

/// Checks the translation partition law along with the soundness of the assignment
fn check_allocation(registers: &Registers, allocation: &Allocation) {
    for virt in registers.virt_ids() {
        let reg = registers.virt(virt).unwrap();

        match allocation.assignment(virt) {
            Some(phys) => {
                assert!(!allocation.is_spilled(virt), "{} is both assigned and spilled", virt);
                assert!(
                    reg.candidates().contains(&phys),
                    "{} was assigned {} which isn't one of its candidates",
                    virt,
                    phys,
                );

                for &other in reg.interferences() {
                    if let Some(other_phys) = allocation.assignment(other) {
                        assert_ne!(
                            registers.phys_group(phys),
                            registers.phys_group(other_phys),
                            "interfering {} and {} were assigned the same group",
                            virt,
                            other,
                        );
                    }
                }
            }

            None => assert!(allocation.is_spilled(virt), "{} was dropped", virt),
        }
    }

    assert_eq!(
        allocation.assignments().len() + allocation.spills().len(),
        registers.virt_count() as usize,
    );
}

#[test]
fn scenario_grouping() {
    let mut registers = Registers::new();

    let group = registers.add_phys(PhysReg(5), &[PhysReg(6), PhysReg(7)]);
    assert_eq!(registers.add_phys(PhysReg(6), &[]), group);
    assert_eq!(registers.phys_group(PhysReg(5)), registers.phys_group(PhysReg(6)));
    assert_eq!(registers.group_count(), 1);
}

#[test]
fn scenario_two_coloring() {
    set_logger();

    let mut registers = Registers::new();
    registers.add_phys(PhysReg(0), &[]);
    registers.add_phys(PhysReg(1), &[]);
    registers.add_virt(VirtReg(1), [PhysReg(0), PhysReg(1)], 1.0, true);
    registers.add_virt(VirtReg(2), [PhysReg(0), PhysReg(1)], 1.0, true);
    assert!(registers.add_virt_interference(VirtReg(1), VirtReg(2)));

    let graph = registers.create_interference_graph();
    let coloring = Chaitin::new().solve(&graph);

    let colors: Vec<_> = [VirtReg(1), VirtReg(2)]
        .into_iter()
        .map(|virt| coloring.get(registers.virt_ordinal(virt).unwrap()).unwrap())
        .collect();
    assert!(colors == [Color(0), Color(1)] || colors == [Color(1), Color(0)]);

    let allocation = translate(&registers, &coloring).unwrap();
    assert!(allocation.spills().is_empty());
    assert_ne!(
        allocation.assignment(VirtReg(1)),
        allocation.assignment(VirtReg(2)),
    );
}

#[test]
fn scenario_forced_spill() {
    set_logger();

    let mut registers = Registers::new();
    registers.add_phys(PhysReg(0), &[]);
    registers.add_virt(VirtReg(1), [PhysReg(0)], 1.0, true);
    registers.add_virt(VirtReg(2), [PhysReg(0)], 1.0, true);
    registers.add_virt_interference(VirtReg(1), VirtReg(2));

    for kind in SolverKind::ALL {
        let allocation = driver::run_round(&registers, &*kind.solver()).unwrap();

        assert_eq!(allocation.assignments().len(), 1, "{}", kind);
        assert_eq!(allocation.spills().len(), 1, "{}", kind);
        assert_eq!(
            allocation.assignments().values().copied().collect::<Vec<_>>(),
            [PhysReg(0)],
        );
    }
}

#[test]
fn scenario_independent_demands_share() {
    set_logger();

    let mut registers = Registers::new();
    registers.add_phys(PhysReg(0), &[]);
    registers.add_virt(VirtReg(1), [PhysReg(0)], 1.0, true);
    registers.add_virt(VirtReg(2), [PhysReg(0)], 1.0, true);

    for kind in SolverKind::ALL {
        let graph = registers.create_interference_graph();
        let coloring = kind.solver().solve(&graph);
        for virt in [VirtReg(1), VirtReg(2)] {
            assert_eq!(
                coloring.get(registers.virt_ordinal(virt).unwrap()),
                Some(Color(0)),
            );
        }

        let allocation = translate(&registers, &coloring).unwrap();
        assert!(allocation.spills().is_empty());
        assert_eq!(allocation.assignment(VirtReg(1)), Some(PhysReg(0)));
        assert_eq!(allocation.assignment(VirtReg(2)), Some(PhysReg(0)));
    }
}

#[test]
fn cheap_demand_loses_a_contested_color() {
    // One color, two interfering demands: both solvers leave the cheap one
    // uncolored and hand the color to the costly one
    let mut graph = InterferenceGraph::new(1, 2);
    graph.add_group(NodeId(0));
    graph.add_demand(NodeId(1), 1.0, true);
    graph.add_demand(NodeId(2), 10.0, true);
    graph.add_edge(NodeId(1), NodeId(2));

    for kind in SolverKind::ALL {
        let coloring = kind.solver().solve(&graph);
        assert_eq!(coloring.get(NodeId(1)), None, "{}", kind);
        assert_eq!(coloring.get(NodeId(2)), Some(Color(0)), "{}", kind);
    }
}

#[test]
fn greedy_visits_costliest_first() {
    // Two colors, three mutually interfering demands: whichever demand is visited
    // last goes without, and that has to be the cheapest one
    let mut graph = InterferenceGraph::new(2, 3);
    graph.add_group(NodeId(0));
    graph.add_group(NodeId(1));
    graph.add_edge(NodeId(0), NodeId(1));
    graph.add_demand(NodeId(2), 1.0, true);
    graph.add_demand(NodeId(3), 5.0, true);
    graph.add_demand(NodeId(4), 9.0, true);
    graph.add_edge(NodeId(2), NodeId(3));
    graph.add_edge(NodeId(2), NodeId(4));
    graph.add_edge(NodeId(3), NodeId(4));

    let coloring = Greedy::new().solve(&graph);
    assert_eq!(coloring.get(NodeId(4)), Some(Color(0)));
    assert_eq!(coloring.get(NodeId(3)), Some(Color(1)));
    assert_eq!(coloring.get(NodeId(2)), None);
}

/// Xorshift, good enough for shaking out random graphs with reproducible seeds
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, bound: u32) -> u32 {
        (self.next() % bound as u64) as u32
    }

    fn chance(&mut self, percent: u32) -> bool {
        self.below(100) < percent
    }
}

fn random_registers(rng: &mut Rng) -> Registers {
    let mut registers = Registers::new();

    let resources = 1 + rng.below(8);
    let mut raw = 0;
    for _ in 0..resources {
        let aliases: Vec<_> = (0..rng.below(3)).map(|alias| PhysReg(raw + 1 + alias)).collect();
        registers.add_phys(PhysReg(raw), &aliases);
        raw += 1 + aliases.len() as u32;
    }

    let demands = rng.below(24);
    for virt in 0..demands {
        let mut candidates: Vec<_> = (0..raw)
            .filter(|_| rng.chance(60))
            .map(PhysReg)
            .collect();
        if candidates.is_empty() {
            candidates.push(PhysReg(rng.below(raw)));
        }

        let weight = if rng.chance(5) {
            f64::INFINITY
        } else {
            rng.below(1000) as f64 / 10.0
        };
        registers.add_virt(VirtReg(100 + virt), candidates, weight, !rng.chance(10));
    }

    let density = rng.below(60);
    for lhs in 0..demands {
        for rhs in lhs + 1..demands {
            if rng.chance(density) {
                registers.add_virt_interference(VirtReg(100 + lhs), VirtReg(100 + rhs));
            }
        }
    }

    registers
}

fn check_symmetry(graph: &InterferenceGraph) {
    for node in graph.nodes() {
        for neighbor in graph.neighbors(node) {
            assert!(graph.has_node(neighbor), "{} has dangling edge to {}", node, neighbor);
            assert!(
                graph.has_edge(neighbor, node),
                "edge {} -> {} isn't symmetric",
                node,
                neighbor,
            );
        }
    }
}

/// Uncolored demands must have had every color taken by their neighbors
fn check_maximal(graph: &InterferenceGraph, coloring: &Coloring) {
    for demand in graph.demand_nodes().filter(|&demand| !coloring.contains(demand)) {
        let mut used = vec![false; graph.group_count() as usize];
        for color in graph.neighbors(demand).filter_map(|neighbor| coloring.get(neighbor)) {
            used[color.index()] = true;
        }

        assert!(
            used.iter().all(|&used| used),
            "{} was left uncolored while a color was free",
            demand,
        );
    }
}

#[test]
fn random_rounds_are_sound() {
    set_logger();
    let mut rng = Rng(0x2545_f491_4f6c_dd1d);

    for _ in 0..200 {
        let registers = random_registers(&mut rng);
        let graph = registers.create_interference_graph();
        check_symmetry(&graph);

        for solver in [&Greedy::new() as &dyn Solver, &Chaitin::new()] {
            let coloring = solver.solve(&graph);

            assert!(coloring.conflicts(&graph).is_empty(), "{}", solver.solver_name());
            for group in graph.group_ids() {
                assert_eq!(coloring.get(group), Some(Color::of_group(group)));
            }
            check_maximal(&graph, &coloring);

            let allocation = translate(&registers, &coloring).unwrap();
            check_allocation(&registers, &allocation);

            // Anything colored by a solver is legal for its group, so nothing it
            // colored gets spilled
            assert_eq!(
                allocation.assignments().len(),
                coloring.colored_demands(&graph),
                "{}",
                solver.solver_name(),
            );
        }
    }
}

#[test]
fn unspillable_demands_win_contested_colors() {
    let mut rng = Rng(0x9e37_79b9_7f4a_7c15);

    for _ in 0..100 {
        // Every demand interferes with every other and only one of them is fixed,
        // so the fixed one must always keep a color
        let mut registers = Registers::new();
        registers.add_phys(PhysReg(0), &[]);

        let demands = 2 + rng.below(6);
        let fixed = rng.below(demands);
        for virt in 0..demands {
            registers.add_virt(
                VirtReg(virt),
                [PhysReg(0)],
                rng.below(100) as f64,
                virt != fixed,
            );
            for other in 0..virt {
                registers.add_virt_interference(VirtReg(virt), VirtReg(other));
            }
        }

        for kind in SolverKind::ALL {
            let allocation = driver::run_round(&registers, &*kind.solver()).unwrap();
            assert_eq!(allocation.assignment(VirtReg(fixed)), Some(PhysReg(0)), "{}", kind);
            assert_eq!(allocation.spills().len(), demands as usize - 1);
        }
    }
}

#[test]
fn removing_nodes_leaves_no_dangling_edges() {
    let mut rng = Rng(0xdead_beef_cafe_f00d);

    for _ in 0..50 {
        let registers = random_registers(&mut rng);
        let mut graph = registers.create_interference_graph();

        let demands: Vec<NodeId> = graph.demand_nodes().collect();
        for demand in demands {
            if !rng.chance(50) {
                continue;
            }

            let neighbors: Vec<_> = graph.neighbors(demand).collect();
            assert!(graph.remove_node(demand));

            assert!(!graph.has_node(demand));
            for neighbor in neighbors {
                assert!(!graph.has_edge(neighbor, demand));
            }
            check_symmetry(&graph);
        }
    }
}
