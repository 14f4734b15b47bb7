//! Shared building blocks for the Kestrel search coordinator:
//! id newtypes, the error taxonomy, and configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CoordinatorConfig, MergeConfig, PlacementConfig, SearchConfig};
pub use error::{ErrorKind, SearchError, SearchResult};
pub use types::{CollectionId, NodeId, ReplicaId, ShardId};
