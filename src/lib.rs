//! Genetic programming for symbolic regression: evolves expression trees to
//! fit a numeric dataset, minimizing root-mean-square error.
//!
//! The core is the expression-tree engine: an arena-backed [`Tree`] of
//! function/terminal nodes, randomized construction
//! ([`engines::generation::generate`]), in-place point mutation and subtree
//! crossover, and a stack-based batch evaluator
//! ([`engines::evaluation::predict`]). [`EvolutionEngine`] wires these into a
//! tournament-selection generation loop.

pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod types;

pub use config::EvolutionConfig;
pub use data::Dataset;
pub use engines::evaluation::{evaluate, predict, rmse};
pub use engines::generation::{
    generate, point_crossover, point_mutation, tournament_selection, ConsoleProgress,
    EvolutionEngine, GrowMethod, MutationOutcome, Node, NodeId, NodeKind, Population,
    ProgressCallback, SilentProgress, Tree,
};
pub use error::{Result, SymregError};
pub use types::{FunctionSpec, FunctionSymbol, Terminal, TerminalSpec};
