//! Shard-placement selection: pick the nodes that will host a new shard's
//! replicas, fewest-loaded first.

use std::collections::HashSet;

use kestrel_common::error::{SearchError, SearchResult};
use kestrel_common::types::NodeId;

use crate::cluster::IndexNode;

/// Select `replica_count` nodes to host a new shard's replicas.
///
/// The pool is every candidate not in `exclude`, sorted ascending by
/// `(shard_count, node id)` so placement is reproducible. Exclusions are a
/// soft preference: when honoring them would leave fewer than
/// `replica_count` nodes, they are ignored entirely rather than making
/// placement impossible.
///
/// `hard_cap` bounds the shards a node may host; nodes at or above the cap
/// are ineligible. A negative cap disables the check.
///
/// Pure function of the node snapshot supplied by the registry at call time.
pub fn select_nodes(
    candidates: &[IndexNode],
    replica_count: usize,
    exclude: &HashSet<NodeId>,
    hard_cap: i64,
) -> SearchResult<Vec<NodeId>> {
    let mut pool: Vec<&IndexNode> = candidates
        .iter()
        .filter(|n| !exclude.contains(&n.id))
        .collect();
    if pool.len() < replica_count {
        // Exclusions would starve placement; fall back to the full set.
        pool = candidates.iter().collect();
    }

    if hard_cap >= 0 {
        pool.retain(|n| i64::from(n.shard_count) < hard_cap);
    }

    if pool.len() < replica_count {
        return Err(SearchError::ClusterTooSmall {
            needed: replica_count,
            available: pool.len(),
        });
    }

    pool.sort_by_key(|n| (n.shard_count, n.id));
    Ok(pool.iter().take(replica_count).map(|n| n.id).collect())
}
