/// Console adapters for user-facing progress and query output
mod progress_reporter;
mod text_renderer;

pub use progress_reporter::{SilentProgressReporter, StderrProgressReporter};
pub use text_renderer::TextRenderer;
