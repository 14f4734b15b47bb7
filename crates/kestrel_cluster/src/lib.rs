//! Cluster topology for the Kestrel search coordinator — node directory,
//! shard-group maps, replica routing, and shard-placement selection.
//!
//! The registry owns the authoritative node/shard tables; the search path
//! only ever reads them. Placement (`select_nodes`) is a pure function over
//! a snapshot of the node set taken at call time.

pub mod cluster;
pub mod selector;
pub mod topology;

pub use cluster::IndexNode;
pub use selector::select_nodes;
pub use topology::{ShardGroup, TopologyRegistry};
