//! Entry point tying the pipeline together: one coordinator per process,
//! shared across requests, each request flowing scatter → merge → hydrate.

use std::sync::Arc;
use std::time::Duration;

use kestrel_common::config::CoordinatorConfig;
use kestrel_common::error::SearchResult;
use kestrel_common::types::CollectionId;
use kestrel_cluster::TopologyRegistry;

use crate::dispatch::QueryDispatcher;
use crate::fetch::Hydrator;
use crate::merge::{merge_paragraphs_results, merge_results, merge_suggest_results};
use crate::request::{SearchRequest, ShardQuery};
use crate::response::{ResourceSearchResults, SearchResults, SuggestResults};
use crate::shards::ShardReader;
use crate::txn::SnapshotSource;

/// Coordinates collection-wide queries over the shard topology.
pub struct SearchCoordinator {
    reader: Arc<dyn ShardReader>,
    hydrator: Arc<dyn Hydrator>,
    dispatcher: QueryDispatcher,
    config: CoordinatorConfig,
}

impl SearchCoordinator {
    pub fn new(
        registry: Arc<TopologyRegistry>,
        reader: Arc<dyn ShardReader>,
        hydrator: Arc<dyn Hydrator>,
        snapshots: Arc<dyn SnapshotSource>,
        config: CoordinatorConfig,
    ) -> Self {
        let dispatcher = QueryDispatcher::new(
            registry,
            snapshots,
            Duration::from_millis(config.search.timeout_ms),
        );
        Self {
            reader,
            hydrator,
            dispatcher,
            config,
        }
    }

    /// Collection-wide search across all requested modalities.
    pub async fn search(
        &self,
        collection: &CollectionId,
        request: &SearchRequest,
    ) -> SearchResult<SearchResults> {
        let query = ShardQuery::from_request(request);
        let dispatch = self
            .dispatcher
            .scatter(collection, |node, replica| {
                let reader = Arc::clone(&self.reader);
                let query = query.clone();
                async move { reader.search(&node, replica, &query).await }
            })
            .await?;

        let min_score = request
            .min_score
            .unwrap_or(self.config.merge.min_vector_score);
        let mut results = merge_results(
            dispatch.responses,
            request.page_number,
            request.page_size,
            min_score,
            request.highlight,
            &request.hydrate,
            self.hydrator.as_ref(),
        )
        .await?;
        results.partial = dispatch.partial;
        if request.debug {
            results.shards = Some(dispatch.queried);
        }
        Ok(results)
    }

    /// Paragraph search scoped to a single resource.
    pub async fn resource_search(
        &self,
        collection: &CollectionId,
        rid: &str,
        request: &SearchRequest,
    ) -> SearchResult<ResourceSearchResults> {
        let query = ShardQuery::for_resource(rid, request);
        let dispatch = self
            .dispatcher
            .scatter(collection, |node, replica| {
                let reader = Arc::clone(&self.reader);
                let query = query.clone();
                async move { reader.paragraph_search(&node, replica, &query).await }
            })
            .await?;

        let mut results = merge_paragraphs_results(
            &dispatch.responses,
            request.page_number,
            request.page_size,
            request.highlight,
            self.hydrator.as_ref(),
        )
        .await?;
        results.partial = dispatch.partial;
        if request.debug {
            results.shards = Some(dispatch.queried);
        }
        Ok(results)
    }

    /// Autocomplete: capped paragraph matches for a query prefix.
    pub async fn suggest(
        &self,
        collection: &CollectionId,
        body: &str,
    ) -> SearchResult<SuggestResults> {
        let query = ShardQuery::suggest(body);
        let dispatch = self
            .dispatcher
            .scatter(collection, |node, replica| {
                let reader = Arc::clone(&self.reader);
                let query = query.clone();
                async move { reader.suggest(&node, replica, &query).await }
            })
            .await?;

        let mut results = merge_suggest_results(
            &dispatch.responses,
            self.config.merge.suggest_limit,
            false,
            self.hydrator.as_ref(),
        )
        .await?;
        results.partial = dispatch.partial;
        Ok(results)
    }
}
