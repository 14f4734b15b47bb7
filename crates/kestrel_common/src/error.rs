use thiserror::Error;

use crate::types::{CollectionId, ShardId};

/// Convenience alias for `Result<T, SearchError>`.
pub type SearchResult<T> = Result<T, SearchError>;

/// Error classification for retry/escalation decisions.
///
/// - `UserError` — the request cannot be answered as asked (4xx equivalent)
/// - `Retryable` — the backend reported a transient outage; client SHOULD retry
/// - `Transient` — timeout or capacity shortfall; client MAY retry after back-off
/// - `Internal`  — coordination failed mid-flight; retrying may or may not help
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserError,
    Retryable,
    Transient,
    Internal,
}

/// Top-level error type for the search coordination layer.
///
/// Routing errors local to a single shard are *not* represented here: an
/// unreachable shard degrades the response (partial flag) instead of failing
/// it. Everything below aborts the whole request.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Placement cannot satisfy the replica/cap constraints.
    #[error("Cluster too small: {needed} replicas needed, {available} eligible nodes")]
    ClusterTooSmall { needed: usize, available: usize },

    /// The collection has no resolvable shard configuration.
    #[error("No shard configuration found for {0}")]
    ShardsNotFound(CollectionId),

    /// Every shard group of the collection was unreachable at routing time.
    #[error("No reachable shard for any shard group of {0}")]
    NoShardsAvailable(CollectionId),

    /// The joint wait over all shard queries exceeded the global timeout.
    #[error("Shard queries timed out after {waited_ms}ms")]
    QueryTimeout { waited_ms: u64 },

    /// A resolved shard's query failed while in flight.
    #[error("Query failed on {shard}: {reason}")]
    ShardQueryFailed { shard: ShardId, reason: String },

    /// The backend explicitly reported a transient outage for a shard query.
    #[error("Search backend unavailable on {shard}: {reason}")]
    BackendUnavailable { shard: ShardId, reason: String },

    /// A composite result key did not decompose into the expected segments.
    #[error("Malformed result key: {0}")]
    InvalidKey(String),

    /// The hydration collaborator failed to resolve labels/text/resources.
    #[error("Hydration error: {0}")]
    Hydration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SearchError {
    /// Classify this error for retry/escalation decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::ShardsNotFound(_) => ErrorKind::UserError,
            SearchError::BackendUnavailable { .. } => ErrorKind::Retryable,
            SearchError::ClusterTooSmall { .. } => ErrorKind::Transient,
            SearchError::QueryTimeout { .. } => ErrorKind::Transient,
            SearchError::NoShardsAvailable(_) => ErrorKind::Internal,
            SearchError::ShardQueryFailed { .. } => ErrorKind::Internal,
            SearchError::InvalidKey(_) => ErrorKind::Internal,
            SearchError::Hydration(_) => ErrorKind::Internal,
            SearchError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if the client should retry this request as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Retryable)
    }

    /// HTTP status the transport layer must surface for this error.
    ///
    /// Missing shard configuration maps to not-found; an outright timeout or
    /// an explicit backend outage map to service-unavailable; everything else
    /// is a server error.
    pub fn http_status(&self) -> u16 {
        match self {
            SearchError::ShardsNotFound(_) => 404,
            SearchError::QueryTimeout { .. } => 503,
            SearchError::BackendUnavailable { .. } => 503,
            SearchError::NoShardsAvailable(_) => 500,
            SearchError::ShardQueryFailed { .. } => 500,
            SearchError::ClusterTooSmall { .. } => 500,
            SearchError::InvalidKey(_) => 500,
            SearchError::Hydration(_) => 500,
            SearchError::Internal(_) => 500,
        }
    }

    /// Add context to the error message, preserving the variant where the
    /// classification matters.
    pub fn with_context(self, ctx: impl Into<String>) -> Self {
        let ctx = ctx.into();
        match self {
            SearchError::ShardQueryFailed { shard, reason } => SearchError::ShardQueryFailed {
                shard,
                reason: format!("{ctx}: {reason}"),
            },
            SearchError::BackendUnavailable { shard, reason } => SearchError::BackendUnavailable {
                shard,
                reason: format!("{ctx}: {reason}"),
            },
            SearchError::Hydration(msg) => SearchError::Hydration(format!("{ctx}: {msg}")),
            SearchError::Internal(msg) => SearchError::Internal(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shards_not_found_is_user_error_404() {
        let e = SearchError::ShardsNotFound(CollectionId::new("kb1"));
        assert_eq!(e.kind(), ErrorKind::UserError);
        assert_eq!(e.http_status(), 404);
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_timeout_is_transient_503() {
        let e = SearchError::QueryTimeout { waited_ms: 10_000 };
        assert_eq!(e.kind(), ErrorKind::Transient);
        assert_eq!(e.http_status(), 503);
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_backend_unavailable_is_retryable_503() {
        let e = SearchError::BackendUnavailable {
            shard: ShardId(3),
            reason: "connection refused".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Retryable);
        assert_eq!(e.http_status(), 503);
        assert!(e.is_retryable());
    }

    #[test]
    fn test_shard_query_failed_is_internal_500() {
        let e = SearchError::ShardQueryFailed {
            shard: ShardId(1),
            reason: "index corrupted".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Internal);
        assert_eq!(e.http_status(), 500);
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_no_shards_available_is_500() {
        let e = SearchError::NoShardsAvailable(CollectionId::new("kb1"));
        assert_eq!(e.http_status(), 500);
    }

    #[test]
    fn test_cluster_too_small_message() {
        let e = SearchError::ClusterTooSmall {
            needed: 2,
            available: 1,
        };
        assert!(e.to_string().contains("2 replicas needed"));
        assert_eq!(e.kind(), ErrorKind::Transient);
    }

    #[test]
    fn test_with_context_preserves_variant() {
        let e = SearchError::BackendUnavailable {
            shard: ShardId(2),
            reason: "refused".into(),
        };
        let e2 = e.with_context("stage=dispatch");
        assert!(e2.is_retryable());
        assert!(e2.to_string().contains("stage=dispatch"));
        assert!(e2.to_string().contains("refused"));
    }
}
