use serde::{Deserialize, Serialize};
use std::fmt;

use kestrel_common::types::NodeId;

/// One index-serving node as seen by the coordinator.
///
/// `shard_count` is the number of shard replicas currently hosted on the
/// node and drives placement ordering; `reachable` gates routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexNode {
    pub id: NodeId,
    /// Network address of the node's reader endpoint.
    pub address: String,
    pub shard_count: u32,
    pub reachable: bool,
}

impl IndexNode {
    pub fn new(id: NodeId, address: impl Into<String>) -> Self {
        Self {
            id,
            address: address.into(),
            shard_count: 0,
            reachable: true,
        }
    }

    pub fn with_shard_count(mut self, shard_count: u32) -> Self {
        self.shard_count = shard_count;
        self
    }
}

impl fmt::Display for IndexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} shards={} reachable={}",
            self.id, self.address, self.shard_count, self.reachable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_reachable_and_empty() {
        let node = IndexNode::new(NodeId(1), "10.0.0.1:4444");
        assert!(node.reachable);
        assert_eq!(node.shard_count, 0);
    }

    #[test]
    fn test_with_shard_count() {
        let node = IndexNode::new(NodeId(1), "n1").with_shard_count(30);
        assert_eq!(node.shard_count, 30);
    }
}
