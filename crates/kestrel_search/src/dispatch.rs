//! Scatter phase: resolve one reachable replica per shard group, issue all
//! shard RPCs concurrently, and collect them under a single joint timeout.
//!
//! Failure policy, in decreasing leniency:
//! - a shard group with no reachable replica is skipped and the response is
//!   flagged partial;
//! - zero resolvable groups fails the request (`NoShardsAvailable`);
//! - an RPC that fails *in flight* fails the whole request — a query that
//!   started but did not finish invalidates ranking guarantees, so no
//!   partial ranking is ever returned;
//! - exceeding the joint timeout abandons the whole batch (`QueryTimeout`).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future;

use kestrel_common::error::{SearchError, SearchResult};
use kestrel_common::types::{CollectionId, ReplicaId};
use kestrel_cluster::{IndexNode, TopologyRegistry};

use crate::response::QueriedShard;
use crate::shards::RpcError;
use crate::txn::SnapshotSource;

/// Outcome of one scatter round.
#[derive(Debug)]
pub struct Dispatch<R> {
    /// Raw per-shard responses; ordering is irrelevant, the merge engine
    /// re-establishes a total order.
    pub responses: Vec<R>,
    /// One or more shard groups had no reachable replica.
    pub partial: bool,
    /// The (node, shard, replica) tuples actually queried.
    pub queried: Vec<QueriedShard>,
}

/// Fans one query out to every shard group of a collection.
pub struct QueryDispatcher {
    registry: Arc<TopologyRegistry>,
    snapshots: Arc<dyn SnapshotSource>,
    timeout: Duration,
}

impl QueryDispatcher {
    pub fn new(
        registry: Arc<TopologyRegistry>,
        snapshots: Arc<dyn SnapshotSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            snapshots,
            timeout,
        }
    }

    /// Resolve the collection's shard groups and run `call` once per
    /// resolved (node, replica) pair, all concurrently, under the joint
    /// timeout.
    ///
    /// A read snapshot is held for the duration of the scatter and released
    /// exactly once on every exit path.
    pub async fn scatter<R, F, Fut>(
        &self,
        collection: &CollectionId,
        call: F,
    ) -> SearchResult<Dispatch<R>>
    where
        F: Fn(IndexNode, ReplicaId) -> Fut,
        Fut: Future<Output = Result<R, RpcError>>,
    {
        let groups = self.registry.shard_groups_for(collection)?;
        let _snapshot = self.snapshots.begin();

        let mut partial = false;
        let mut queried = Vec::with_capacity(groups.len());
        let mut ops = Vec::with_capacity(groups.len());
        for group in &groups {
            match self.registry.route(group) {
                Some((node, replica)) => {
                    queried.push(QueriedShard {
                        node: node.id,
                        address: node.address.clone(),
                        shard: group.shard,
                        replica,
                    });
                    let shard = group.shard;
                    let fut = call(node, replica);
                    ops.push(async move { (shard, fut.await) });
                }
                None => {
                    tracing::warn!(
                        collection = %collection,
                        shard = %group.shard,
                        "no reachable replica for shard group, degrading to partial results"
                    );
                    partial = true;
                }
            }
        }

        if ops.is_empty() {
            return Err(SearchError::NoShardsAvailable(collection.clone()));
        }

        let waited_ms = self.timeout.as_millis() as u64;
        let settled = tokio::time::timeout(self.timeout, future::join_all(ops))
            .await
            .map_err(|_| {
                tracing::error!(collection = %collection, waited_ms, "shard scatter timed out");
                SearchError::QueryTimeout { waited_ms }
            })?;

        let mut responses = Vec::with_capacity(settled.len());
        for (shard, result) in settled {
            match result {
                Ok(response) => responses.push(response),
                Err(RpcError::Unavailable(reason)) => {
                    tracing::error!(collection = %collection, %shard, reason, "shard backend unavailable");
                    return Err(SearchError::BackendUnavailable { shard, reason });
                }
                Err(RpcError::Failed(reason)) => {
                    tracing::error!(collection = %collection, %shard, reason, "shard query failed in flight");
                    return Err(SearchError::ShardQueryFailed { shard, reason });
                }
            }
        }

        Ok(Dispatch {
            responses,
            partial,
            queried,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txn::SnapshotGuard;
    use kestrel_common::types::{NodeId, ShardId};
    use kestrel_cluster::ShardGroup;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSnapshots {
        begun: AtomicUsize,
        released: Arc<AtomicUsize>,
    }

    impl CountingSnapshots {
        fn new() -> (Arc<Self>, Arc<AtomicUsize>) {
            let released = Arc::new(AtomicUsize::new(0));
            let source = Arc::new(Self {
                begun: AtomicUsize::new(0),
                released: Arc::clone(&released),
            });
            (source, released)
        }
    }

    impl SnapshotSource for CountingSnapshots {
        fn begin(&self) -> SnapshotGuard {
            self.begun.fetch_add(1, Ordering::SeqCst);
            let released = Arc::clone(&self.released);
            SnapshotGuard::new(move || {
                released.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    fn registry(shards: u64, nodes: u64) -> Arc<TopologyRegistry> {
        let registry = TopologyRegistry::new();
        for n in 0..nodes {
            registry.register_node(IndexNode::new(NodeId(n), format!("node-{n}:4444")));
        }
        let groups = (0..shards)
            .map(|s| {
                // Replicas on two consecutive nodes, wrapping around; the
                // registry rejects two replicas on one node, so drop the
                // second replica when the wrap lands on the same node.
                let mut replicas = vec![(NodeId(s % nodes), ReplicaId(s))];
                if (s + 1) % nodes != s % nodes {
                    replicas.push((NodeId((s + 1) % nodes), ReplicaId(s + 100)));
                }
                ShardGroup::new(ShardId(s), replicas)
            })
            .collect();
        registry
            .register_shard_groups(CollectionId::new("kb1"), groups)
            .unwrap();
        Arc::new(registry)
    }

    fn dispatcher(
        registry: Arc<TopologyRegistry>,
        timeout_ms: u64,
    ) -> (QueryDispatcher, Arc<AtomicUsize>) {
        let (snapshots, released) = CountingSnapshots::new();
        (
            QueryDispatcher::new(registry, snapshots, Duration::from_millis(timeout_ms)),
            released,
        )
    }

    fn kb() -> CollectionId {
        CollectionId::new("kb1")
    }

    #[tokio::test]
    async fn test_scatter_queries_every_shard_group() {
        let (dispatcher, released) = dispatcher(registry(3, 3), 1_000);
        let dispatch = dispatcher
            .scatter(&kb(), |node, replica| async move {
                Ok::<_, RpcError>(format!("{}:{}", node.id, replica))
            })
            .await
            .unwrap();
        assert_eq!(dispatch.responses.len(), 3);
        assert!(!dispatch.partial);
        assert_eq!(dispatch.queried.len(), 3);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_shards_not_found() {
        let (dispatcher, released) = dispatcher(registry(1, 1), 1_000);
        let err = dispatcher
            .scatter(&CollectionId::new("missing"), |_, _| async move {
                Ok::<_, RpcError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::ShardsNotFound(_)));
        // Failed before the snapshot was acquired.
        assert_eq!(released.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreachable_shard_sets_partial() {
        let registry = registry(3, 3);
        // Shard 1 lives on nodes 1 and 2; take both down.
        registry.set_reachable(NodeId(1), false);
        registry.set_reachable(NodeId(2), false);
        let (dispatcher, released) = dispatcher(registry, 1_000);
        let dispatch = dispatcher
            .scatter(&kb(), |_, _| async move { Ok::<_, RpcError>(()) })
            .await
            .unwrap();
        // Shards 0 and 2 still have a reachable replica on node 0.
        assert_eq!(dispatch.responses.len(), 2);
        assert!(dispatch.partial);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_shards_unreachable_is_no_shards_available() {
        let registry = registry(2, 2);
        registry.set_reachable(NodeId(0), false);
        registry.set_reachable(NodeId(1), false);
        let (dispatcher, released) = dispatcher(registry, 1_000);
        let err = dispatcher
            .scatter(&kb(), |_, _| async move { Ok::<_, RpcError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::NoShardsAvailable(_)));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_in_flight_failure_aborts_whole_request() {
        let (dispatcher, released) = dispatcher(registry(10, 5), 1_000);
        let err = dispatcher
            .scatter(&kb(), |_, replica| async move {
                // Nine of ten succeed; one failure still aborts everything.
                if replica == ReplicaId(4) {
                    Err(RpcError::Failed("index corrupted".into()))
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::ShardQueryFailed { .. }));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unavailable_backend_is_distinguished() {
        let (dispatcher, _released) = dispatcher(registry(2, 2), 1_000);
        let err = dispatcher
            .scatter(&kb(), |_, _| async move {
                Err::<(), _>(RpcError::Unavailable("connection refused".into()))
            })
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, SearchError::BackendUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_joint_timeout_aborts_batch_and_releases_snapshot() {
        let (dispatcher, released) = dispatcher(registry(2, 2), 20);
        let err = dispatcher
            .scatter(&kb(), |_, _| async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, RpcError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::QueryTimeout { .. }));
        assert_eq!(err.http_status(), 503);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_queried_shards_report_routed_replicas() {
        let registry = registry(2, 2);
        let (dispatcher, _released) = dispatcher(registry, 1_000);
        let dispatch = dispatcher
            .scatter(&kb(), |_, _| async move { Ok::<_, RpcError>(()) })
            .await
            .unwrap();
        let shards: Vec<_> = dispatch.queried.iter().map(|q| q.shard).collect();
        assert_eq!(shards, vec![ShardId(0), ShardId(1)]);
        // First replica of each group is reachable, so routing picks it.
        assert_eq!(dispatch.queried[0].node, NodeId(0));
        assert_eq!(dispatch.queried[1].node, NodeId(1));
    }
}
