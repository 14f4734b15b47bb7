//! Process-wide topology registry: the node directory and the
//! collection → shard-group map.
//!
//! The registry is the only writer of these tables; the dispatch path holds
//! read-only views. Concurrent client requests read freely, mutation happens
//! through the explicit registration/teardown methods below.

use std::collections::HashMap;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use kestrel_common::error::{SearchError, SearchResult};
use kestrel_common::types::{CollectionId, NodeId, ReplicaId, ShardId};

use crate::cluster::IndexNode;

/// The replica placements of one logical shard.
///
/// Invariant: at most one replica per node, enforced on registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardGroup {
    pub shard: ShardId,
    /// Ordered (node, replica) pairs hosting this shard.
    pub replicas: Vec<(NodeId, ReplicaId)>,
}

impl ShardGroup {
    pub fn new(shard: ShardId, replicas: Vec<(NodeId, ReplicaId)>) -> Self {
        Self { shard, replicas }
    }
}

/// Authoritative node and shard tables, with a narrow read-only query
/// surface used by the dispatch path.
#[derive(Default)]
pub struct TopologyRegistry {
    nodes: DashMap<NodeId, IndexNode>,
    shards: RwLock<HashMap<CollectionId, Vec<ShardGroup>>>,
}

impl TopologyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration / teardown (registry-internal mutation) ──────────────

    pub fn register_node(&self, node: IndexNode) {
        self.nodes.insert(node.id, node);
    }

    pub fn remove_node(&self, id: NodeId) {
        self.nodes.remove(&id);
    }

    /// Flip a node's reachability flag. Unknown ids are ignored.
    pub fn set_reachable(&self, id: NodeId, reachable: bool) {
        if let Some(mut node) = self.nodes.get_mut(&id) {
            node.reachable = reachable;
        }
    }

    /// Register the shard groups of a collection.
    ///
    /// Rejects groups placing two replicas of the same shard on one node,
    /// and bumps the hosting nodes' shard counts.
    pub fn register_shard_groups(
        &self,
        collection: CollectionId,
        groups: Vec<ShardGroup>,
    ) -> SearchResult<()> {
        for group in &groups {
            let mut seen = std::collections::HashSet::new();
            for (node, _) in &group.replicas {
                if !seen.insert(*node) {
                    return Err(SearchError::Internal(format!(
                        "{} places more than one replica of {} on {}",
                        collection, group.shard, node
                    )));
                }
            }
        }
        for group in &groups {
            for (node_id, _) in &group.replicas {
                if let Some(mut node) = self.nodes.get_mut(node_id) {
                    node.shard_count += 1;
                }
            }
        }
        self.shards.write().insert(collection, groups);
        Ok(())
    }

    /// Drop all node and shard state.
    pub fn shutdown(&self) {
        self.nodes.clear();
        self.shards.write().clear();
    }

    // ── Read-only queries (dispatch path) ──────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<IndexNode> {
        self.nodes.get(&id).map(|n| n.clone())
    }

    /// Snapshot of every registered node, for placement decisions.
    pub fn all_nodes(&self) -> Vec<IndexNode> {
        self.nodes.iter().map(|n| n.clone()).collect()
    }

    /// Snapshot of the reachable node set.
    pub fn live_nodes(&self) -> Vec<IndexNode> {
        self.nodes
            .iter()
            .filter(|n| n.reachable)
            .map(|n| n.clone())
            .collect()
    }

    /// The shard groups of a collection.
    ///
    /// Fails with `ShardsNotFound` when the collection has no resolvable
    /// shard configuration.
    pub fn shard_groups_for(&self, collection: &CollectionId) -> SearchResult<Vec<ShardGroup>> {
        self.shards
            .read()
            .get(collection)
            .cloned()
            .ok_or_else(|| SearchError::ShardsNotFound(collection.clone()))
    }

    /// Resolve one reachable (node, replica) pair for a shard group.
    ///
    /// Walks the group's replicas in order and returns the first whose node
    /// is registered and reachable; `None` when the whole group is down.
    pub fn route(&self, group: &ShardGroup) -> Option<(IndexNode, ReplicaId)> {
        for (node_id, replica) in &group.replicas {
            match self.nodes.get(node_id) {
                Some(node) if node.reachable => return Some((node.clone(), *replica)),
                Some(_) => {
                    tracing::debug!(node = %node_id, shard = %group.shard, "replica host unreachable");
                }
                None => {
                    tracing::debug!(node = %node_id, shard = %group.shard, "replica host unknown");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_nodes(n: u64) -> TopologyRegistry {
        let registry = TopologyRegistry::new();
        for i in 0..n {
            registry.register_node(IndexNode::new(NodeId(i), format!("node-{i}:4444")));
        }
        registry
    }

    fn group(shard: u64, nodes: &[u64]) -> ShardGroup {
        ShardGroup::new(
            ShardId(shard),
            nodes.iter().map(|&n| (NodeId(n), ReplicaId(n))).collect(),
        )
    }

    #[test]
    fn test_shard_groups_for_unknown_collection() {
        let registry = registry_with_nodes(2);
        let err = registry
            .shard_groups_for(&CollectionId::new("missing"))
            .unwrap_err();
        assert!(matches!(err, SearchError::ShardsNotFound(_)));
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn test_register_and_lookup_shard_groups() {
        let registry = registry_with_nodes(3);
        let kb = CollectionId::new("kb1");
        registry
            .register_shard_groups(kb.clone(), vec![group(0, &[0, 1]), group(1, &[1, 2])])
            .unwrap();
        let groups = registry.shard_groups_for(&kb).unwrap();
        assert_eq!(groups.len(), 2);
        // Registration bumped the hosting nodes' counts.
        assert_eq!(registry.node(NodeId(1)).unwrap().shard_count, 2);
        assert_eq!(registry.node(NodeId(0)).unwrap().shard_count, 1);
    }

    #[test]
    fn test_register_rejects_double_placement_on_one_node() {
        let registry = registry_with_nodes(2);
        let bad = ShardGroup::new(ShardId(0), vec![(NodeId(1), ReplicaId(0)), (NodeId(1), ReplicaId(1))]);
        let err = registry
            .register_shard_groups(CollectionId::new("kb1"), vec![bad])
            .unwrap_err();
        assert!(matches!(err, SearchError::Internal(_)));
    }

    #[test]
    fn test_route_prefers_first_reachable_replica() {
        let registry = registry_with_nodes(3);
        let g = group(0, &[0, 1, 2]);
        let (node, replica) = registry.route(&g).unwrap();
        assert_eq!(node.id, NodeId(0));
        assert_eq!(replica, ReplicaId(0));

        registry.set_reachable(NodeId(0), false);
        let (node, replica) = registry.route(&g).unwrap();
        assert_eq!(node.id, NodeId(1));
        assert_eq!(replica, ReplicaId(1));
    }

    #[test]
    fn test_route_none_when_all_replicas_down() {
        let registry = registry_with_nodes(2);
        registry.set_reachable(NodeId(0), false);
        registry.remove_node(NodeId(1));
        assert!(registry.route(&group(0, &[0, 1])).is_none());
    }

    #[test]
    fn test_live_nodes_excludes_unreachable() {
        let registry = registry_with_nodes(3);
        registry.set_reachable(NodeId(2), false);
        let mut live: Vec<_> = registry.live_nodes().into_iter().map(|n| n.id).collect();
        live.sort();
        assert_eq!(live, vec![NodeId(0), NodeId(1)]);
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let registry = registry_with_nodes(2);
        registry
            .register_shard_groups(CollectionId::new("kb1"), vec![group(0, &[0])])
            .unwrap();
        registry.shutdown();
        assert!(registry.all_nodes().is_empty());
        assert!(registry.shard_groups_for(&CollectionId::new("kb1")).is_err());
    }
}
