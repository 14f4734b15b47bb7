//! Gather phase: combine per-shard response lists into ranked, paginated,
//! faceted windows, one merge per retrieval modality.
//!
//! All three merges share the same skeleton: flatten every shard's match
//! list, order it by effective score (stable, ascending — the order the
//! index nodes produce), cut the requested page out of the global list, and
//! enrich only the matches inside that window. Resource ids referenced by
//! merged matches accumulate into one deduplicated, first-seen-order list
//! shared across the document → paragraph → vector merges.

use std::collections::{HashMap, HashSet};

use kestrel_common::error::SearchResult;

use crate::fetch::{HydrateOptions, Hydrator};
use crate::key::{FieldPath, VectorKey};
use crate::response::{
    DocumentHit, DocumentResult, DocumentShardResponse, Documents, FacetCount, Paragraph,
    ParagraphHit, ParagraphShardResponse, Paragraphs, ResourceSearchResults, SearchResults,
    Sentence, Sentences, ShardSearchResponse, SuggestResults, SuggestShardResponse,
    VectorShardResponse,
};

// ── Shared merge machinery ──────────────────────────────────────────────────

/// Cross-shard facet accumulator with insert-or-add semantics per
/// (facet key, tag) pair.
#[derive(Debug, Default)]
pub struct FacetAccumulator {
    counts: HashMap<String, HashMap<String, u64>>,
}

impl FacetAccumulator {
    pub fn add(&mut self, key: &str, tag: &str, total: u64) {
        *self
            .counts
            .entry(key.to_owned())
            .or_default()
            .entry(tag.to_owned())
            .or_insert(0) += total;
    }

    pub fn extend(&mut self, facets: &HashMap<String, Vec<FacetCount>>) {
        for (key, tags) in facets {
            for facet in tags {
                self.add(key, &facet.tag, facet.total);
            }
        }
    }

    /// Consume the accumulator; tags are emitted sorted for determinism.
    pub fn into_facets(self) -> HashMap<String, Vec<FacetCount>> {
        self.counts
            .into_iter()
            .map(|(key, tags)| {
                let mut tags: Vec<FacetCount> = tags
                    .into_iter()
                    .map(|(tag, total)| FacetCount { tag, total })
                    .collect();
                tags.sort_by(|a, b| a.tag.cmp(&b.tag));
                (key, tags)
            })
            .collect()
    }
}

/// Order-preserving deduplicated resource id list shared across merges.
#[derive(Debug, Default)]
pub struct ResourceCollector {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl ResourceCollector {
    pub fn push(&mut self, rid: &str) {
        if self.seen.insert(rid.to_owned()) {
            self.ordered.push(rid.to_owned());
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// The page cut out of the globally sorted match list.
#[derive(Debug, Clone, Copy)]
struct Window {
    skip: usize,
    end: usize,
    /// The unclamped window end fell short of the full list.
    more: bool,
}

impl Window {
    fn of(len: usize, page_number: usize, page_size: usize) -> Self {
        let skip = page_number.saturating_mul(page_size);
        let end = skip.saturating_add(page_size);
        Self {
            skip: skip.min(len),
            end: end.min(len),
            more: end < len,
        }
    }

    fn range(self) -> std::ops::Range<usize> {
        self.skip..self.end
    }
}

/// Zero means "score not computed", not "worst possible score".
fn effective_score(score: f32, fallback: f32) -> f32 {
    if score == 0.0 {
        fallback
    } else {
        score
    }
}

// ── Per-modality merges ─────────────────────────────────────────────────────

pub async fn merge_documents_results(
    responses: &[DocumentShardResponse],
    resources: &mut ResourceCollector,
    page_number: usize,
    page_size: usize,
    hydrator: &dyn Hydrator,
) -> SearchResult<Documents> {
    let mut query = None;
    let mut facets = FacetAccumulator::default();
    let mut shard_has_more = false;
    let mut raw: Vec<(f32, &DocumentHit)> = Vec::new();
    for response in responses {
        if query.is_none() {
            query.clone_from(&response.query);
        }
        facets.extend(&response.facets);
        if response.next_page {
            shard_has_more = true;
        }
        for hit in &response.results {
            raw.push((effective_score(hit.score, hit.score_bm25), hit));
        }
    }

    raw.sort_by(|a, b| a.0.total_cmp(&b.0));
    let window = Window::of(raw.len(), page_number, page_size);

    let mut results = Vec::with_capacity(window.end - window.skip);
    for (score, hit) in &raw[window.range()] {
        let path = FieldPath::parse(&hit.field)?;
        let labels = hydrator.document_labels(&hit.rid, &path).await?;
        resources.push(&hit.rid);
        results.push(DocumentResult {
            score: *score,
            rid: hit.rid.clone(),
            field_type: path.field_type,
            field: path.field,
            labels,
        });
    }

    let total = results.len();
    Ok(Documents {
        results,
        facets: facets.into_facets(),
        query,
        total,
        page_number,
        page_size,
        next_page: shard_has_more || window.more,
    })
}

pub async fn merge_paragraph_results(
    responses: &[ParagraphShardResponse],
    resources: &mut ResourceCollector,
    page_number: usize,
    page_size: usize,
    highlight: bool,
    hydrator: &dyn Hydrator,
) -> SearchResult<Paragraphs> {
    let mut query = None;
    let mut ematches: Option<Vec<String>> = None;
    let mut facets = FacetAccumulator::default();
    let mut shard_has_more = false;
    let mut raw: Vec<(f32, &ParagraphHit)> = Vec::new();
    for response in responses {
        if query.is_none() {
            query.clone_from(&response.query);
        }
        if ematches.is_none() {
            ematches.clone_from(&response.ematches);
        }
        facets.extend(&response.facets);
        if response.next_page {
            shard_has_more = true;
        }
        for hit in &response.results {
            raw.push((effective_score(hit.score, hit.score_bm25), hit));
        }
    }

    raw.sort_by(|a, b| a.0.total_cmp(&b.0));
    let window = Window::of(raw.len(), page_number, page_size);

    let mut results = Vec::with_capacity(window.end - window.skip);
    for (score, hit) in &raw[window.range()] {
        let path = FieldPath::parse(&hit.field)?;
        let text = hydrator
            .paragraph_text(&hit.rid, &path, hit, highlight, ematches.as_deref())
            .await?;
        let labels = hydrator.paragraph_labels(&hit.rid, &path, hit).await?;
        let seconds = hydrator.paragraph_seconds(&hit.rid, &path, hit).await?;
        resources.push(&hit.rid);
        results.push(Paragraph {
            score: *score,
            rid: hit.rid.clone(),
            field_type: path.field_type,
            field: path.field,
            text,
            labels,
            start_seconds: seconds.map(|(start, _)| start),
            end_seconds: seconds.map(|(_, end)| end),
        });
    }

    let total = results.len();
    Ok(Paragraphs {
        results,
        facets: facets.into_facets(),
        query,
        total,
        page_number,
        page_size,
        next_page: shard_has_more || window.more,
    })
}

pub async fn merge_vectors_results(
    responses: &[VectorShardResponse],
    resources: &mut ResourceCollector,
    page_number: usize,
    page_size: usize,
    min_score: f32,
    hydrator: &dyn Hydrator,
) -> SearchResult<Sentences> {
    let mut raw: Vec<&crate::response::VectorHit> = Vec::new();
    for response in responses {
        for hit in &response.results {
            if hit.score.is_nan() || hit.score < min_score {
                continue;
            }
            raw.push(hit);
        }
    }

    raw.sort_by(|a, b| a.score.total_cmp(&b.score));
    let window = Window::of(raw.len(), page_number, page_size);

    let mut results = Vec::with_capacity(window.end - window.skip);
    for hit in &raw[window.range()] {
        let key = VectorKey::parse(&hit.key)?;
        let text = hydrator.sentence_text(&key).await?;
        let labels = hydrator.sentence_labels(&key).await?;
        resources.push(&key.rid);
        results.push(Sentence {
            score: hit.score,
            rid: key.rid,
            field_type: key.field_type,
            field: key.field,
            text,
            labels,
        });
    }

    let total = results.len();
    Ok(Sentences {
        results,
        facets: HashMap::new(),
        total,
        page_number,
        page_size,
        next_page: window.more,
    })
}

/// Capped paragraph-only merge for the suggest (autocomplete) path: no
/// pagination, no score fallback, first `limit` matches of the global order.
pub async fn merge_suggest_paragraph_results(
    responses: &[SuggestShardResponse],
    limit: usize,
    highlight: bool,
    hydrator: &dyn Hydrator,
) -> SearchResult<Paragraphs> {
    let mut query = None;
    let mut ematches: Option<Vec<String>> = None;
    let mut raw: Vec<&ParagraphHit> = Vec::new();
    for response in responses {
        if query.is_none() {
            query.clone_from(&response.query);
        }
        if ematches.is_none() {
            ematches.clone_from(&response.ematches);
        }
        raw.extend(&response.results);
    }

    raw.sort_by(|a, b| a.score.total_cmp(&b.score));
    raw.truncate(limit);

    let mut results = Vec::with_capacity(raw.len());
    for hit in raw {
        let path = FieldPath::parse(&hit.field)?;
        let text = hydrator
            .paragraph_text(&hit.rid, &path, hit, highlight, ematches.as_deref())
            .await?;
        let labels = hydrator.paragraph_labels(&hit.rid, &path, hit).await?;
        let seconds = hydrator.paragraph_seconds(&hit.rid, &path, hit).await?;
        results.push(Paragraph {
            score: hit.score,
            rid: hit.rid.clone(),
            field_type: path.field_type,
            field: path.field,
            text,
            labels,
            start_seconds: seconds.map(|(start, _)| start),
            end_seconds: seconds.map(|(_, end)| end),
        });
    }

    let total = results.len();
    Ok(Paragraphs {
        results,
        facets: HashMap::new(),
        query,
        total,
        page_number: 0,
        page_size: limit,
        next_page: false,
    })
}

// ── Top-level orchestration ─────────────────────────────────────────────────

/// Merge a full scatter round: all three modalities, shared resource
/// dedup, bulk hydration. The hydration cache is cleared up front so no
/// state leaks between requests.
#[allow(clippy::too_many_arguments)]
pub async fn merge_results(
    responses: Vec<ShardSearchResponse>,
    page_number: usize,
    page_size: usize,
    min_vector_score: f32,
    highlight: bool,
    options: &HydrateOptions,
    hydrator: &dyn Hydrator,
) -> SearchResult<SearchResults> {
    let mut documents = Vec::with_capacity(responses.len());
    let mut paragraphs = Vec::with_capacity(responses.len());
    let mut vectors = Vec::with_capacity(responses.len());
    for response in responses {
        documents.push(response.document);
        paragraphs.push(response.paragraph);
        vectors.push(response.vector);
    }

    hydrator.clear_cache();

    let mut resources = ResourceCollector::default();
    let fulltext =
        merge_documents_results(&documents, &mut resources, page_number, page_size, hydrator)
            .await?;
    let paragraphs = merge_paragraph_results(
        &paragraphs,
        &mut resources,
        page_number,
        page_size,
        highlight,
        hydrator,
    )
    .await?;
    let sentences = merge_vectors_results(
        &vectors,
        &mut resources,
        page_number,
        page_size,
        min_vector_score,
        hydrator,
    )
    .await?;

    let hydrated = hydrator.fetch_resources(resources.ids(), options).await?;

    Ok(SearchResults {
        fulltext,
        paragraphs,
        sentences,
        resources: hydrated,
        partial: false,
        shards: None,
    })
}

/// Paragraph-only merge for endpoints scoped to a single resource.
pub async fn merge_paragraphs_results(
    responses: &[ParagraphShardResponse],
    page_number: usize,
    page_size: usize,
    highlight: bool,
    hydrator: &dyn Hydrator,
) -> SearchResult<ResourceSearchResults> {
    let mut resources = ResourceCollector::default();
    let paragraphs = merge_paragraph_results(
        responses,
        &mut resources,
        page_number,
        page_size,
        highlight,
        hydrator,
    )
    .await?;
    Ok(ResourceSearchResults {
        paragraphs,
        partial: false,
        shards: None,
    })
}

/// Suggest merge: capped paragraph merge, no pagination, no hydrated
/// resource list.
pub async fn merge_suggest_results(
    responses: &[SuggestShardResponse],
    limit: usize,
    highlight: bool,
    hydrator: &dyn Hydrator,
) -> SearchResult<SuggestResults> {
    let paragraphs = merge_suggest_paragraph_results(responses, limit, highlight, hydrator).await?;
    Ok(SuggestResults {
        paragraphs,
        partial: false,
    })
}
