use crate::{
    problem,
    registers::Registers,
    solve::{Solver, SolverKind},
    translate::{self, Allocation, TranslateError},
    utils::DisplayWeight,
};
use anyhow::{Context, Result};
use std::{fs, path::Path, time::Instant};

/// Reads and parses the problem file at `file`
#[tracing::instrument]
pub fn load_problem(file: &Path) -> Result<Registers> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("failed to read problem file '{}'", file.display()))?;

    tracing::info!(source_len = source.len(), "started parsing '{}'", file.display());
    let parsing_start = Instant::now();

    let registers = problem::parse(&source)
        .with_context(|| format!("failed to parse problem file '{}'", file.display()))?;

    let elapsed = parsing_start.elapsed();
    tracing::info!(
        groups = registers.group_count(),
        demands = registers.virt_count(),
        "finished parsing '{}' in {:#?}",
        file.display(),
        elapsed,
    );

    Ok(registers)
}

/// Runs a single allocation round: builds the interference graph from `registers`,
/// colors it with `solver` and translates the coloring back into an [`Allocation`]
#[tracing::instrument(skip_all, fields(solver = solver.solver_name()))]
pub fn run_round(
    registers: &Registers,
    solver: &dyn Solver,
) -> std::result::Result<Allocation, TranslateError> {
    let span = tracing::info_span!("graph-building");
    let graph = span.in_scope(|| {
        tracing::info!("started building interference graph");
        let building_start = Instant::now();

        let graph = registers.create_interference_graph();

        let elapsed = building_start.elapsed();
        tracing::info!("finished building interference graph in {:#?}", elapsed);

        graph
    });

    let span = tracing::info_span!("coloring", solver = solver.solver_name());
    let coloring = span.in_scope(|| {
        tracing::info!("started coloring with {}", solver.solver_name());
        let coloring_start = Instant::now();

        let coloring = solver.solve(&graph);

        let elapsed = coloring_start.elapsed();
        tracing::info!(
            "finished coloring {} of {} demands in {:#?}",
            coloring.colored_demands(&graph),
            graph.demand_count(),
            elapsed,
        );

        coloring
    });

    let conflicts = coloring.conflicts(&graph);
    if !conflicts.is_empty() {
        tracing::error!(
            "{} produced {} conflicting edges: {:?}",
            solver.solver_name(),
            conflicts.len(),
            conflicts,
        );
    }
    debug_assert!(
        conflicts.is_empty(),
        "{} colored interfering nodes alike",
        solver.solver_name(),
    );

    let span = tracing::info_span!("translation");
    let allocation = span.in_scope(|| {
        let translation_start = Instant::now();
        let allocation = translate::translate(registers, &coloring);

        let elapsed = translation_start.elapsed();
        match &allocation {
            Ok(allocation) => tracing::info!(
                "finished translation in {:#?}, {} assigned and {} spilled",
                elapsed,
                allocation.assignments().len(),
                allocation.spills().len(),
            ),
            Err(error) => tracing::error!("translation failed after {:#?}: {}", elapsed, error),
        }

        allocation
    })?;

    Ok(allocation)
}

/// The outcome of one solver's round within [`compare`]
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub solver: SolverKind,
    pub allocation: Allocation,
    pub spill_cost: f64,
}

/// Runs a round with every available solver over the same registers
#[tracing::instrument(skip_all)]
pub fn compare(registers: &Registers) -> std::result::Result<Vec<RoundSummary>, TranslateError> {
    let mut summaries = Vec::with_capacity(SolverKind::ALL.len());

    for solver in SolverKind::ALL {
        let allocation = run_round(registers, &*solver.solver())?;
        let spill_cost = allocation.spill_cost(registers);

        tracing::info!(
            "{} spilled {} demands with a total cost of {}",
            solver,
            allocation.spills().len(),
            DisplayWeight(spill_cost),
        );

        summaries.push(RoundSummary {
            solver,
            allocation,
            spill_cost,
        });
    }

    Ok(summaries)
}
