mod args;

use crate::args::{Args, Command};
use anyhow::Result;
use clap::Parser;
use regcolor::{driver, utils::DisplayWeight};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();
    set_logger(args.log_tree);

    let start_time = Instant::now();
    match &args.command {
        Command::Solve { file } => {
            let registers = driver::load_problem(file)?;
            let allocation = driver::run_round(&registers, &*args.solver.solver())?;

            print!("{}", allocation);
            println!(
                "{} assigned, {} spilled, spill cost {}",
                allocation.assignments().len(),
                allocation.spills().len(),
                DisplayWeight(allocation.spill_cost(&registers)),
            );
        }

        Command::Graph { file } => {
            let registers = driver::load_problem(file)?;
            let graph = registers.create_interference_graph();

            println!("{}", registers);
            println!("{}", graph);
            println!("{}", graph.stats());
        }

        Command::Compare { file } => {
            let registers = driver::load_problem(file)?;

            for summary in driver::compare(&registers)? {
                println!(
                    "{:<8} {} assigned, {} spilled, spill cost {}",
                    summary.solver.to_string(),
                    summary.allocation.assignments().len(),
                    summary.allocation.spills().len(),
                    DisplayWeight(summary.spill_cost),
                );
            }
        }
    }

    tracing::info!("finished in {:#?}", start_time.elapsed());

    Ok(())
}

fn set_logger(log_tree: bool) {
    use tracing_subscriber::{
        fmt::{self, time},
        prelude::__tracing_subscriber_SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };
    use tracing_tree::HierarchicalLayer;

    let filter_layer = EnvFilter::try_from_env("REGCOLOR_LOG")
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    let registry = tracing_subscriber::registry().with(filter_layer);

    if log_tree {
        let tree_layer = HierarchicalLayer::new(2)
            .with_ansi(atty::is(atty::Stream::Stderr))
            .with_indent_lines(true);

        registry.with(tree_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_timer(time::uptime())
            .with_writer(std::io::stderr);

        registry.with(fmt_layer).init();
    }
}
