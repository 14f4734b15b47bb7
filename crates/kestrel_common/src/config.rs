use serde::{Deserialize, Serialize};

/// Top-level coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoordinatorConfig {
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub merge: MergeConfig,
}

/// Shard-placement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Replicas created per shard group (default: 2).
    pub node_replicas: usize,
    /// Hard cap on shards hosted per node. Negative disables the cap.
    pub max_node_shards: i64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            node_replicas: 2,
            max_node_shards: -1,
        }
    }
}

/// Query fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Joint timeout for all shard queries of one request, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

/// Result-merging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Minimum similarity for a vector match to survive the merge.
    pub min_vector_score: f32,
    /// Result cap for the suggest (autocomplete) merge.
    pub suggest_limit: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            min_vector_score: 0.70,
            suggest_limit: 10,
        }
    }
}
