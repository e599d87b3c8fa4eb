/// Policies deciding how the index reacts to change
pub mod staleness_policy;

pub use staleness_policy::{RebuildTicket, StalenessPolicy};
