/// Shared utilities used across all layers
pub mod error;
pub mod logging;
pub mod result;
pub mod security;

pub use error::{ExitCode, IndexError};
pub use result::Result;
