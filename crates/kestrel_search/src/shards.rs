//! The RPC seam to the index-serving nodes.
//!
//! The transport itself (connection management, wire codec) lives outside
//! this crate; the coordinator only needs one request/response call per
//! resolved (node, replica) pair, with a distinguishable transient-outage
//! failure so callers can decide whether to retry.

use async_trait::async_trait;
use thiserror::Error;

use kestrel_common::types::ReplicaId;
use kestrel_cluster::IndexNode;

use crate::request::ShardQuery;
use crate::response::{ParagraphShardResponse, ShardSearchResponse, SuggestShardResponse};

/// Failure of a single shard RPC while in flight.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The backend explicitly reported a transient outage.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Any other in-flight failure.
    #[error("{0}")]
    Failed(String),
}

/// Read-side RPC surface of one index node.
#[async_trait]
pub trait ShardReader: Send + Sync {
    /// Execute a full multi-modality search on one shard replica.
    async fn search(
        &self,
        node: &IndexNode,
        replica: ReplicaId,
        query: &ShardQuery,
    ) -> Result<ShardSearchResponse, RpcError>;

    /// Execute a paragraph-only search on one shard replica.
    async fn paragraph_search(
        &self,
        node: &IndexNode,
        replica: ReplicaId,
        query: &ShardQuery,
    ) -> Result<ParagraphShardResponse, RpcError>;

    /// Execute a suggest (autocomplete) query on one shard replica.
    async fn suggest(
        &self,
        node: &IndexNode,
        replica: ReplicaId,
        query: &ShardQuery,
    ) -> Result<SuggestShardResponse, RpcError>;
}
