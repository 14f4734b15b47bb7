//! Scatter-gather query coordination for Kestrel.
//!
//! A client search request flows: resolve the collection's shard groups →
//! route one reachable replica per group → concurrent RPC fan-out under a
//! joint timeout → per-modality merge (rank, paginate, facet, dedup) →
//! resource hydration → response assembly.
//!
//! Failure policy: a shard that cannot be *routed* degrades the response
//! (partial flag); a shard that fails *in flight* or a joint timeout aborts
//! the whole request — ranking guarantees require every started query to
//! finish.

pub mod coordinator;
pub mod dispatch;
pub mod fetch;
pub mod key;
pub mod merge;
pub mod request;
pub mod response;
pub mod shards;
pub mod txn;

pub use coordinator::SearchCoordinator;
pub use dispatch::{Dispatch, QueryDispatcher};
pub use fetch::{HydrateOptions, Hydrator, ResourceCache};
pub use key::{FieldPath, VectorKey};
pub use merge::{
    merge_paragraphs_results, merge_results, merge_suggest_results, FacetAccumulator,
    ResourceCollector,
};
pub use request::{Modality, SearchRequest, ShardQuery, SortField, TimeRange};
pub use response::{
    DocumentHit, DocumentResult, DocumentShardResponse, Documents, FacetCount, Paragraph,
    ParagraphHit, ParagraphShardResponse, Paragraphs, QueriedShard, ResourceSearchResults,
    ResourceSummary, SearchResults, Sentence, Sentences, ShardSearchResponse,
    SuggestResults, SuggestShardResponse, VectorHit, VectorShardResponse,
};
pub use shards::{RpcError, ShardReader};
pub use txn::{NoopSnapshots, SnapshotGuard, SnapshotSource};
