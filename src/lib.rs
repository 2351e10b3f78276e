//! Likesync Library
//!
//! Reconciles the liked-tracks collections of two music catalogs. This
//! library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod config;
pub mod notifier;
pub mod server;
pub mod similarity;
pub mod suppression;
pub mod sync;

// Re-export commonly used types for convenience
pub use catalog::{CatalogAdapter, CatalogId, TrackDescriptor, TrackRef};
pub use notifier::{NoOpNotifier, Notifier};
pub use suppression::SuppressionStore;
pub use sync::{
    CycleCoordinator, CycleRequest, CycleStats, Direction, MatchKey, SyncEngine, SyncSettings,
};
