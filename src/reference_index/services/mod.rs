/// Services that compute and maintain the reference index
pub mod graph_builder;
pub mod mutation_tracker;

pub use graph_builder::{GraphBuilder, ProgressCallback, RebuildOutcome};
pub use mutation_tracker::{DrainReport, MutationTracker};
