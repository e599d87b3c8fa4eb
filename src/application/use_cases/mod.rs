/// Use cases module containing application business logic orchestration
mod rebuild_index;

pub use rebuild_index::RebuildIndexUseCase;
