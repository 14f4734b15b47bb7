//! Per-shard response shapes (what the index nodes return) and merged
//! response shapes (what the coordinator assembles for the transport layer).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use kestrel_common::types::{NodeId, ReplicaId, ShardId};

// ── Per-shard responses ─────────────────────────────────────────────────────

/// Aggregated count for one facet tag, as reported by a single shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub tag: String,
    pub total: u64,
}

/// A full-text match local to one shard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHit {
    pub rid: String,
    /// Field path, e.g. `/t/title`.
    pub field: String,
    pub score: f32,
    /// Fallback used when `score` is exactly zero ("not computed").
    pub score_bm25: f32,
}

/// A paragraph match local to one shard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphHit {
    pub rid: String,
    pub field: String,
    pub score: f32,
    pub score_bm25: f32,
    /// Chunk index within the field.
    pub index: u32,
    /// Character span within the chunk.
    pub start: u32,
    pub end: u32,
    pub split: Option<String>,
}

/// A vector match local to one shard; `key` is the composite identifier
/// decomposed by [`crate::key::VectorKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub key: String,
    pub score: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentShardResponse {
    /// Echo of the resolved query, used to recover the effective query text.
    pub query: Option<String>,
    pub facets: HashMap<String, Vec<FacetCount>>,
    pub results: Vec<DocumentHit>,
    /// More results remain on this shard past its local window.
    pub next_page: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphShardResponse {
    pub query: Option<String>,
    /// Exact-match terms for highlighting.
    pub ematches: Option<Vec<String>>,
    pub facets: HashMap<String, Vec<FacetCount>>,
    pub results: Vec<ParagraphHit>,
    pub next_page: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorShardResponse {
    pub results: Vec<VectorHit>,
}

/// One shard's answer to a full search request, all modalities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardSearchResponse {
    pub document: DocumentShardResponse,
    pub paragraph: ParagraphShardResponse,
    pub vector: VectorShardResponse,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestShardResponse {
    pub query: Option<String>,
    pub ematches: Option<Vec<String>>,
    pub results: Vec<ParagraphHit>,
}

// ── Merged responses ────────────────────────────────────────────────────────

/// A full-text match after the cross-shard merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub score: f32,
    pub rid: String,
    pub field_type: String,
    pub field: String,
    pub labels: Vec<String>,
}

/// A paragraph match after the cross-shard merge, hydrated with text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub score: f32,
    pub rid: String,
    pub field_type: String,
    pub field: String,
    pub text: String,
    pub labels: Vec<String>,
    pub start_seconds: Option<f32>,
    pub end_seconds: Option<f32>,
}

/// A vector/semantic match after the cross-shard merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub score: f32,
    pub rid: String,
    pub field_type: String,
    pub field: String,
    pub text: String,
    pub labels: Vec<String>,
}

/// The merged, paginated full-text window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Documents {
    pub results: Vec<DocumentResult>,
    pub facets: HashMap<String, Vec<FacetCount>>,
    pub query: Option<String>,
    /// Match count on this merged window.
    pub total: usize,
    pub page_number: usize,
    pub page_size: usize,
    pub next_page: bool,
}

/// The merged, paginated paragraph window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraphs {
    pub results: Vec<Paragraph>,
    pub facets: HashMap<String, Vec<FacetCount>>,
    pub query: Option<String>,
    pub total: usize,
    pub page_number: usize,
    pub page_size: usize,
    pub next_page: bool,
}

/// The merged, paginated vector window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentences {
    pub results: Vec<Sentence>,
    pub facets: HashMap<String, Vec<FacetCount>>,
    pub total: usize,
    pub page_number: usize,
    pub page_size: usize,
    pub next_page: bool,
}

/// Hydrated summary of a resource referenced by merged matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub id: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub labels: Vec<String>,
}

/// One (node, shard, replica) tuple actually queried; surfaced for debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueriedShard {
    pub node: NodeId,
    pub address: String,
    pub shard: ShardId,
    pub replica: ReplicaId,
}

/// The aggregate answer to a collection-wide search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub fulltext: Documents,
    pub paragraphs: Paragraphs,
    pub sentences: Sentences,
    /// Deduplicated, hydrated resources in first-seen order across the
    /// document → paragraph → vector merges.
    pub resources: Vec<ResourceSummary>,
    /// One or more shards were unreachable at routing time; results are
    /// complete for the shards that answered.
    pub partial: bool,
    pub shards: Option<Vec<QueriedShard>>,
}

/// The answer to a resource-scoped (paragraph-only) search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSearchResults {
    pub paragraphs: Paragraphs,
    pub partial: bool,
    pub shards: Option<Vec<QueriedShard>>,
}

/// The answer to a suggest (autocomplete) request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestResults {
    pub paragraphs: Paragraphs,
    pub partial: bool,
}
