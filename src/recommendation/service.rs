use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::provider::RecommendationProvider;
use crate::{
    broadcast::{BroadcastHub, RoomEvent},
    room::repository::RoomRepository,
    shared::AppError,
};

/// Relays the latest externally generated recommendation to a room's
/// subscribers.
pub struct RecommendationService {
    room_repository: Arc<dyn RoomRepository + Send + Sync>,
    provider: Arc<dyn RecommendationProvider>,
    hub: BroadcastHub,
}

impl RecommendationService {
    pub fn new(
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        provider: Arc<dyn RecommendationProvider>,
        hub: BroadcastHub,
    ) -> Self {
        Self {
            room_repository,
            provider,
            hub,
        }
    }

    /// Fetches the room's latest recommendation and publishes it as a
    /// `recommendation` event.
    #[instrument(skip(self))]
    pub async fn broadcast_latest(&self, room_id: Uuid) -> Result<(), AppError> {
        let room = self
            .room_repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;
        let payload = self
            .provider
            .latest_for_room(room.id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("No recommendation available for this room yet".to_string())
            })?;

        info!(room_id = %room.id, "Relaying latest recommendation");
        self.hub
            .publish(&room.invite_code, RoomEvent::Recommendation { payload })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::StaticRecommendationProvider;
    use crate::room::models::{generate_invite_code, RoomModel};
    use crate::room::repository::InMemoryRoomRepository;
    use serde_json::json;

    #[tokio::test]
    async fn relays_latest_result_to_subscribers() {
        let room_repository = Arc::new(InMemoryRoomRepository::new());
        let provider = Arc::new(StaticRecommendationProvider::new());
        let hub = BroadcastHub::new();

        let room = RoomModel::new(generate_invite_code(), Uuid::new_v4(), 37.5, 127.0, None);
        room_repository.create_room(&room).await.unwrap();
        provider
            .set_recommendation(room.id, json!({"menu": "pho"}))
            .await;

        let service =
            RecommendationService::new(room_repository, provider, hub.clone());
        let mut rx = hub.subscribe(&room.invite_code).await;

        service.broadcast_latest(room.id).await.unwrap();

        match rx.recv().await.unwrap() {
            RoomEvent::Recommendation { payload } => {
                assert_eq!(payload, json!({"menu": "pho"}));
            }
            other => panic!("expected recommendation event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_recommendation_is_not_found() {
        let room_repository = Arc::new(InMemoryRoomRepository::new());
        let provider = Arc::new(StaticRecommendationProvider::new());
        let hub = BroadcastHub::new();

        let room = RoomModel::new(generate_invite_code(), Uuid::new_v4(), 37.5, 127.0, None);
        room_repository.create_room(&room).await.unwrap();

        let service = RecommendationService::new(room_repository, provider, hub);
        let result = service.broadcast_latest(room.id).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }
}
