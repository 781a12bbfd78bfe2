use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::shared::AppError;

/// Surface over the external recommendation generator.
///
/// Generation (model calls, prompt assembly) happens elsewhere; this core
/// only fetches the latest result for a room to relay it to subscribers.
#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    async fn latest_for_room(&self, room_id: Uuid) -> Result<Option<Value>, AppError>;
}

/// In-memory implementation of RecommendationProvider for development and
/// testing: results are set explicitly.
pub struct StaticRecommendationProvider {
    results: RwLock<HashMap<Uuid, Value>>,
}

impl Default for StaticRecommendationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticRecommendationProvider {
    pub fn new() -> Self {
        Self {
            results: RwLock::new(HashMap::new()),
        }
    }

    pub async fn set_recommendation(&self, room_id: Uuid, payload: Value) {
        let mut results = self.results.write().await;
        results.insert(room_id, payload);
    }
}

#[async_trait]
impl RecommendationProvider for StaticRecommendationProvider {
    async fn latest_for_room(&self, room_id: Uuid) -> Result<Option<Value>, AppError> {
        let results = self.results.read().await;
        Ok(results.get(&room_id).cloned())
    }
}
