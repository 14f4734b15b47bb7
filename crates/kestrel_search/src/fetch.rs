//! The hydration seam: per-match label/text/metadata lookups and the bulk
//! resource fetch that fills the final response.
//!
//! Implementations typically cache resource lookups per request; the merge
//! engine calls `clear_cache` once, before any per-match enrichment, so the
//! cache never leaks state across requests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use kestrel_common::error::SearchResult;

use crate::key::{FieldPath, VectorKey};
use crate::response::{ParagraphHit, ResourceSummary};

/// What the bulk resource fetch should include.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydrateOptions {
    /// Resource property groups to serialize.
    pub show: Vec<String>,
    /// Restrict hydrated fields to these field types.
    pub field_type_filter: Vec<String>,
    /// Extracted-data kinds to include.
    pub extracted: Vec<String>,
}

/// Per-match enrichment and bulk resource hydration.
#[async_trait]
pub trait Hydrator: Send + Sync {
    async fn document_labels(&self, rid: &str, path: &FieldPath) -> SearchResult<Vec<String>>;

    async fn paragraph_text(
        &self,
        rid: &str,
        path: &FieldPath,
        hit: &ParagraphHit,
        highlight: bool,
        ematches: Option<&[String]>,
    ) -> SearchResult<String>;

    async fn paragraph_labels(
        &self,
        rid: &str,
        path: &FieldPath,
        hit: &ParagraphHit,
    ) -> SearchResult<Vec<String>>;

    /// Time-range offsets for paragraphs extracted from audio/video fields.
    async fn paragraph_seconds(
        &self,
        rid: &str,
        path: &FieldPath,
        hit: &ParagraphHit,
    ) -> SearchResult<Option<(f32, f32)>>;

    async fn sentence_text(&self, key: &VectorKey) -> SearchResult<String>;

    async fn sentence_labels(&self, key: &VectorKey) -> SearchResult<Vec<String>>;

    /// Bulk-hydrate the deduplicated resource id list, preserving order.
    async fn fetch_resources(
        &self,
        ids: &[String],
        options: &HydrateOptions,
    ) -> SearchResult<Vec<ResourceSummary>>;

    /// Drop any state cached from a previous request.
    fn clear_cache(&self);
}

/// Request-scoped resource cache for `Hydrator` implementations.
#[derive(Default)]
pub struct ResourceCache {
    entries: Mutex<HashMap<String, ResourceSummary>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<ResourceSummary> {
        self.entries.lock().get(id).cloned()
    }

    pub fn insert(&self, summary: ResourceSummary) {
        self.entries.lock().insert(summary.id.clone(), summary);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str) -> ResourceSummary {
        ResourceSummary {
            id: id.to_owned(),
            title: Some(format!("title-{id}")),
            summary: None,
            labels: Vec::new(),
        }
    }

    #[test]
    fn test_cache_insert_get_clear() {
        let cache = ResourceCache::new();
        assert!(cache.is_empty());
        cache.insert(summary("r1"));
        cache.insert(summary("r2"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("r1").unwrap().title.as_deref(), Some("title-r1"));
        cache.clear();
        assert!(cache.get("r1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_overwrites_same_id() {
        let cache = ResourceCache::new();
        cache.insert(summary("r1"));
        cache.insert(ResourceSummary {
            id: "r1".into(),
            title: Some("updated".into()),
            summary: None,
            labels: Vec::new(),
        });
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("r1").unwrap().title.as_deref(), Some("updated"));
    }
}
