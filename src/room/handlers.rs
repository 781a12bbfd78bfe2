use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    service::RoomService,
    types::{
        CreateRoomRequest, CreateRoomResponse, InviteCodeQuery, JoinRoomRequest,
        JoinRoomResponse, LeaveRoomRequest, ParticipantPreferenceResponse,
        RoomParticipantResponse, SubmitPreferenceRequest,
    },
};
use crate::shared::{AppError, AppState};
use crate::user::CallerIdentity;

fn service(state: &AppState) -> RoomService {
    RoomService::new(
        Arc::clone(&state.room_repository),
        Arc::clone(&state.selection_repository),
        Arc::clone(&state.user_directory),
        state.hub.clone(),
    )
}

/// HTTP handler for creating a new room
///
/// POST /api/v1/rooms (authenticated)
#[instrument(name = "create_room", skip(state, request))]
pub async fn create_room(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, AppError> {
    let user_id = identity
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
    let response = service(&state).create_room(user_id, request).await?;
    info!(room_id = %response.room_id, invite_code = %response.invite_code, "Room created");
    Ok(Json(response))
}

/// HTTP handler for joining a room by invite code
///
/// POST /api/v1/rooms/join (no authentication)
#[instrument(name = "join_room", skip(state, request))]
pub async fn join_room(
    State(state): State<AppState>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, AppError> {
    let response = service(&state).join_room(request).await?;
    Ok(Json(response))
}

/// GET /api/v1/rooms/:room_id/participants
#[instrument(name = "get_participants", skip(state))]
pub async fn get_participants(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<RoomParticipantResponse>>, AppError> {
    let roster = service(&state).list_participants(room_id).await?;
    Ok(Json(roster))
}

/// GET /api/v1/rooms/participants?invite_code=XXXXXX
#[instrument(name = "get_participants_by_invite_code", skip(state))]
pub async fn get_participants_by_invite_code(
    State(state): State<AppState>,
    Query(query): Query<InviteCodeQuery>,
) -> Result<Json<Vec<RoomParticipantResponse>>, AppError> {
    let roster = service(&state)
        .list_participants_by_invite_code(&query.invite_code)
        .await?;
    Ok(Json(roster))
}

/// POST /api/v1/rooms/:room_id/participants/host (authenticated)
#[instrument(name = "join_as_host", skip(state))]
pub async fn join_as_host(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomParticipantResponse>, AppError> {
    let user_id = identity
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
    let response = service(&state)
        .ensure_host_participant(user_id, room_id)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/rooms/:room_id/preferences/submit
#[instrument(name = "submit_preference", skip(state, request))]
pub async fn submit_preference(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Path(room_id): Path<Uuid>,
    Json(request): Json<SubmitPreferenceRequest>,
) -> Result<Json<RoomParticipantResponse>, AppError> {
    let response = service(&state)
        .submit_preference(room_id, identity, request)
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/rooms/:room_id/preferences/:participant_id
#[instrument(name = "get_participant_preference", skip(state))]
pub async fn get_participant_preference(
    State(state): State<AppState>,
    Path((room_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ParticipantPreferenceResponse>, AppError> {
    let response = service(&state)
        .get_participant_preference(room_id, participant_id)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/rooms/leave
///
/// Hosts (identified callers) delete the whole room; guests remove only
/// themselves.
#[instrument(name = "leave_room", skip(state, request))]
pub async fn leave_room(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Json(request): Json<LeaveRoomRequest>,
) -> Result<StatusCode, AppError> {
    let service = service(&state);
    if let Some(user_id) = identity {
        let room_id = request.room_id.ok_or_else(|| {
            AppError::InvalidArgument("room_id is required for a host leave".to_string())
        })?;
        service.leave_as_host(user_id, room_id).await?;
        return Ok(StatusCode::NO_CONTENT);
    }

    let participant_id = request.participant_id.ok_or_else(|| {
        AppError::InvalidArgument("participant_id is required for a guest leave".to_string())
    })?;
    service.leave_as_guest(participant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::user::InMemoryUserDirectory;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/rooms", post(create_room))
            .route("/rooms/join", post(join_room))
            .route("/rooms/:room_id/participants", get(get_participants))
            .route("/rooms/leave", post(leave_room))
            .with_state(state)
    }

    async fn state_with_user(user_id: Uuid) -> AppState {
        let directory = Arc::new(InMemoryUserDirectory::new());
        directory.register_user(user_id, "jack".to_string()).await;
        AppStateBuilder::new().with_user_directory(directory).build()
    }

    async fn parse_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn create_room_handler_requires_identity() {
        let state = state_with_user(Uuid::new_v4()).await;
        let app = router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/rooms")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"center_lat": 37.5, "center_lng": 127.0}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_and_join_over_http() {
        let user_id = Uuid::new_v4();
        let state = state_with_user(user_id).await;
        let app = router(state);

        let create = Request::builder()
            .method("POST")
            .uri("/rooms")
            .header("content-type", "application/json")
            .header("x-user-id", user_id.to_string())
            .body(Body::from(r#"{"center_lat": 37.5, "center_lng": 127.0}"#))
            .unwrap();
        let response = app.clone().oneshot(create).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created: CreateRoomResponse = parse_body(response).await;

        let join_body = serde_json::json!({
            "invite_code": created.invite_code,
            "display_name": "Alice"
        });
        let join = Request::builder()
            .method("POST")
            .uri("/rooms/join")
            .header("content-type", "application/json")
            .body(Body::from(join_body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(join).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let joined: JoinRoomResponse = parse_body(response).await;
        assert_eq!(joined.room_id, created.room_id);

        let roster = Request::builder()
            .method("GET")
            .uri(format!("/rooms/{}/participants", created.room_id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(roster).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let roster: Vec<RoomParticipantResponse> = parse_body(response).await;
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].display_name, "Alice");
    }

    #[tokio::test]
    async fn duplicate_join_maps_to_conflict_status() {
        let user_id = Uuid::new_v4();
        let state = state_with_user(user_id).await;
        let app = router(state);

        let create = Request::builder()
            .method("POST")
            .uri("/rooms")
            .header("content-type", "application/json")
            .header("x-user-id", user_id.to_string())
            .body(Body::from(r#"{"center_lat": 37.5, "center_lng": 127.0}"#))
            .unwrap();
        let created: CreateRoomResponse =
            parse_body(app.clone().oneshot(create).await.unwrap()).await;

        let join_body = serde_json::json!({
            "invite_code": created.invite_code,
            "display_name": "Alice"
        })
        .to_string();
        let make_join = || {
            Request::builder()
                .method("POST")
                .uri("/rooms/join")
                .header("content-type", "application/json")
                .body(Body::from(join_body.clone()))
                .unwrap()
        };
        assert_eq!(
            app.clone().oneshot(make_join()).await.unwrap().status(),
            StatusCode::OK
        );
        assert_eq!(
            app.oneshot(make_join()).await.unwrap().status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn guest_leave_without_participant_id_is_bad_request() {
        let state = state_with_user(Uuid::new_v4()).await;
        let app = router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/rooms/leave")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
