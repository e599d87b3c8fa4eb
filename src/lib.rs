//! asset-ref-index - reverse-dependency index for asset trees
//!
//! This library answers "what does this asset use, and what uses it?" for
//! large content trees. It inverts the forward dependencies reported by a
//! host asset store into a persisted reverse index, rebuilds it concurrently
//! when it is stale, and keeps it fresh with localized edits driven by
//! asset lifecycle events.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`reference_index`): the index store, rebuild and
//!   incremental-update services, and the staleness policy
//! - **Application Layer** (`application`): the `ReferenceIndex` service,
//!   use cases and DTOs
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Errors, logging and file-safety helpers
//!
//! # Example
//!
//! ```no_run
//! use asset_ref_index::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let assets = Arc::new(
//!     InMemoryAssetStore::new()
//!         .with_asset("Assets/Door.prefab", &["Assets/Wood.mat"])
//!         .with_asset("Assets/Wood.mat", &[]),
//! );
//! let index = ReferenceIndex::open(
//!     assets,
//!     JsonSnapshotRepository::new(".refindex/index.json"),
//!     Arc::new(StderrProgressReporter::new()),
//!     IndexOptions::default(),
//! );
//!
//! let wood = AssetId::new("Assets/Wood.mat")?;
//! let referencers = index.referencers_of(&wood).await?;
//! println!("{:?}", referencers);
//!
//! index.close().await;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod ports;
pub mod reference_index;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::{SilentProgressReporter, StderrProgressReporter};
    pub use crate::adapters::outbound::filesystem::{JsonSnapshotRepository, ManifestAssetStore};
    pub use crate::adapters::outbound::memory::{InMemoryAssetStore, InMemorySnapshotRepository};
    pub use crate::application::dto::{
        AssetReferences, IndexOptions, IndexStats, NeighbourView, RebuildSummary,
    };
    pub use crate::application::index_service::ReferenceIndex;
    pub use crate::application::use_cases::RebuildIndexUseCase;
    pub use crate::ports::inbound::ReferenceIndexPort;
    pub use crate::ports::outbound::{
        AssetStore, ProgressReporter, ResolvedAsset, SnapshotRepository,
    };
    pub use crate::reference_index::domain::{
        AssetId, AssetRecord, BuildStatus, HostResponse, IndexSnapshot, IndexStore,
        LifecycleEvent, TrackerAck,
    };
    pub use crate::reference_index::policies::StalenessPolicy;
    pub use crate::reference_index::services::{GraphBuilder, MutationTracker};
    pub use crate::shared::error::IndexError;
    pub use crate::shared::Result;
}
