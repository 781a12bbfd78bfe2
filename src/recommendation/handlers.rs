use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::service::RecommendationService;
use crate::shared::{AppError, AppState};

/// POST /api/v1/rooms/:room_id/recommendation/broadcast
///
/// Pushes the latest externally generated recommendation to every
/// subscriber of the room.
#[instrument(name = "broadcast_recommendation", skip(state))]
pub async fn broadcast_recommendation(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = RecommendationService::new(
        Arc::clone(&state.room_repository),
        Arc::clone(&state.recommendation_provider),
        state.hub.clone(),
    );
    service.broadcast_latest(room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
