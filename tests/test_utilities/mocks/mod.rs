/// Mock implementations for testing
mod mock_asset_store;
mod mock_progress_reporter;

pub use mock_asset_store::{FailingAssetStore, GatedAssetStore, HiddenAssetStore};
pub use mock_progress_reporter::MockProgressReporter;
