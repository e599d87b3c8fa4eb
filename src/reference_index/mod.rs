//! Reference index core
//!
//! The domain model (`AssetRecord`, `IndexStore`), the services that build
//! and maintain it (`GraphBuilder`, `MutationTracker`) and the policy that
//! decides when a full rebuild is required (`StalenessPolicy`).
pub mod domain;
pub mod policies;
pub mod services;
