//! Graph-coloring register allocation
//!
//! [`Registers`](registers::Registers) collects the physical resources and the
//! virtual demands of one allocation round and builds an
//! [`InterferenceGraph`](graph::InterferenceGraph) from them. A
//! [`Solver`](solve::Solver) colors the graph and [`translate`](translate::translate)
//! maps the coloring back onto concrete resources, spilling whatever didn't fit.

pub mod driver;
pub mod graph;
pub mod problem;
pub mod registers;
pub mod solve;
pub mod translate;
pub mod utils;

#[cfg(test)]
mod tests;
