use clap::Parser;
use regcolor::solve::SolverKind;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(rename_all = "kebab-case")]
pub struct Args {
    /// The command to run
    #[clap(subcommand)]
    pub command: Command,

    /// The coloring algorithm to use, either `greedy` or `chaitin`
    #[clap(long, default_value = "chaitin")]
    pub solver: SolverKind,

    /// Renders logs as an indented tree of spans
    #[clap(long)]
    pub log_tree: bool,
}

#[derive(Debug, Parser)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Run one allocation round and print the assignments and spills
    Solve {
        /// The problem file to solve
        file: PathBuf,
    },

    /// Print the registers and the interference graph built from them
    Graph {
        /// The problem file to inspect
        file: PathBuf,
    },

    /// Run every solver over the same problem and compare their spills
    Compare {
        /// The problem file to solve
        file: PathBuf,
    },
}
