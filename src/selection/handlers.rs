use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{
    service::SelectionService,
    types::{
        RoulettePickResponse, SelectionSummaryResponse, SubmitSelectionsRequest, SummaryQuery,
    },
};
use crate::shared::{AppError, AppState};
use crate::user::CallerIdentity;

fn service(state: &AppState) -> SelectionService {
    SelectionService::new(
        Arc::clone(&state.room_repository),
        Arc::clone(&state.selection_repository),
        state.hub.clone(),
    )
}

/// POST /api/v1/rooms/:room_id/selections
#[instrument(name = "submit_selections", skip(state, request))]
pub async fn submit_selections(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Path(room_id): Path<Uuid>,
    Json(request): Json<SubmitSelectionsRequest>,
) -> Result<Json<SelectionSummaryResponse>, AppError> {
    let summary = service(&state)
        .submit_selections(room_id, identity, request)
        .await?;
    Ok(Json(summary))
}

/// GET /api/v1/rooms/:room_id/selections/summary?participant_id=...
#[instrument(name = "get_selection_summary", skip(state))]
pub async fn get_selection_summary(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Path(room_id): Path<Uuid>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SelectionSummaryResponse>, AppError> {
    let summary = service(&state)
        .summary(room_id, identity, query.participant_id)
        .await?;
    Ok(Json(summary))
}

/// POST /api/v1/rooms/:room_id/roulette/spin (host only)
#[instrument(name = "spin_roulette", skip(state))]
pub async fn spin_roulette(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoulettePickResponse>, AppError> {
    let result = service(&state).spin_roulette(room_id, identity).await?;
    Ok(Json(result))
}
