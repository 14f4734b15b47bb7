use serde::{Deserialize, Serialize};

use crate::fetch::HydrateOptions;

/// One of the three retrieval modalities a request may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    Document,
    Paragraph,
    Vector,
}

/// Sort key for shard-side execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    Created,
    Modified,
}

/// Half-open time range filter, milliseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
}

/// A validated client search request. Immutable once dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub fields: Vec<String>,
    pub filters: Vec<String>,
    pub faceted: Vec<String>,
    pub sort: SortField,
    pub page_number: usize,
    pub page_size: usize,
    pub range_creation: TimeRange,
    pub range_modification: TimeRange,
    pub modalities: Vec<Modality>,
    pub highlight: bool,
    /// Overrides the configured minimum vector similarity when set.
    pub min_score: Option<f32>,
    pub hydrate: HydrateOptions,
    /// When set, the response carries the exact (node, shard, replica)
    /// tuples that were queried.
    pub debug: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            fields: Vec::new(),
            filters: Vec::new(),
            faceted: Vec::new(),
            sort: SortField::default(),
            page_number: 0,
            page_size: 20,
            range_creation: TimeRange::default(),
            range_modification: TimeRange::default(),
            modalities: vec![Modality::Document, Modality::Paragraph, Modality::Vector],
            highlight: false,
            min_score: None,
            hydrate: HydrateOptions::default(),
            debug: false,
        }
    }
}

/// The structured query shipped to every queried shard replica.
///
/// Query-to-wire translation proper lives outside this crate; this type is
/// the resolved form the dispatcher hands to the `ShardReader`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardQuery {
    pub body: String,
    pub fields: Vec<String>,
    pub filters: Vec<String>,
    pub faceted: Vec<String>,
    pub sort: SortField,
    pub page_number: usize,
    pub page_size: usize,
    pub range_creation: TimeRange,
    pub range_modification: TimeRange,
    pub modalities: Vec<Modality>,
    /// Restricts matching to one resource (resource-scoped endpoints).
    pub resource_filter: Option<String>,
}

impl ShardQuery {
    pub fn from_request(request: &SearchRequest) -> Self {
        Self {
            body: request.query.clone(),
            fields: request.fields.clone(),
            filters: request.filters.clone(),
            faceted: request.faceted.clone(),
            sort: request.sort,
            page_number: request.page_number,
            page_size: request.page_size,
            range_creation: request.range_creation,
            range_modification: request.range_modification,
            modalities: request.modalities.clone(),
            resource_filter: None,
        }
    }

    /// Paragraph-only query scoped to a single resource.
    pub fn for_resource(rid: impl Into<String>, request: &SearchRequest) -> Self {
        let mut query = Self::from_request(request);
        query.modalities = vec![Modality::Paragraph];
        query.resource_filter = Some(rid.into());
        query
    }

    /// Minimal paragraph query for the suggest (autocomplete) path.
    pub fn suggest(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            fields: Vec::new(),
            filters: Vec::new(),
            faceted: Vec::new(),
            sort: SortField::default(),
            page_number: 0,
            page_size: 0,
            range_creation: TimeRange::default(),
            range_modification: TimeRange::default(),
            modalities: vec![Modality::Paragraph],
            resource_filter: None,
        }
    }
}
