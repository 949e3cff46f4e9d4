pub mod generator;
pub mod operators;
pub mod population;
pub mod progress;
pub mod tree;

pub use generator::{generate, GrowMethod};
pub use operators::{point_crossover, point_mutation, tournament_selection, MutationOutcome};
pub use population::{EvolutionEngine, Population, ProgressCallback};
pub use progress::{ConsoleProgress, SilentProgress};
pub use tree::{Node, NodeId, NodeKind, Tree};
