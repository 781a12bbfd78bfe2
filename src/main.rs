mod broadcast;
mod recommendation;
mod room;
mod selection;
mod shared;
mod user;

use axum::{
    routing::{get, post},
    Router,
};
use broadcast::BroadcastHub;
use recommendation::StaticRecommendationProvider;
use room::repository::InMemoryRoomRepository;
use selection::repository::InMemorySelectionRepository;
use shared::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user::InMemoryUserDirectory;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lunchpick=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting lunchpick decision-room server");

    // In-memory wiring; a deployment backed by a real store swaps the
    // repository implementations here.
    let room_repository = Arc::new(InMemoryRoomRepository::new());
    let selection_repository = Arc::new(InMemorySelectionRepository::new());
    let user_directory = Arc::new(InMemoryUserDirectory::new());
    let recommendation_provider = Arc::new(StaticRecommendationProvider::new());
    let hub = BroadcastHub::new();

    let app_state = AppState::new(
        room_repository,
        selection_repository,
        user_directory,
        recommendation_provider,
        hub.clone(),
    );

    let app = Router::new()
        .route("/api/v1/rooms", post(room::create_room))
        .route("/api/v1/rooms/join", post(room::join_room))
        .route("/api/v1/rooms/leave", post(room::leave_room))
        .route(
            "/api/v1/rooms/participants",
            get(room::get_participants_by_invite_code),
        )
        .route(
            "/api/v1/rooms/participants/stream",
            get(broadcast::stream_room),
        )
        .route(
            "/api/v1/rooms/:room_id/participants",
            get(room::get_participants),
        )
        .route(
            "/api/v1/rooms/:room_id/participants/host",
            post(room::join_as_host),
        )
        .route(
            "/api/v1/rooms/:room_id/preferences/submit",
            post(room::submit_preference),
        )
        .route(
            "/api/v1/rooms/:room_id/preferences/:participant_id",
            get(room::get_participant_preference),
        )
        .route(
            "/api/v1/rooms/:room_id/selections",
            post(selection::submit_selections),
        )
        .route(
            "/api/v1/rooms/:room_id/selections/summary",
            get(selection::get_selection_summary),
        )
        .route(
            "/api/v1/rooms/:room_id/roulette/spin",
            post(selection::spin_roulette),
        )
        .route(
            "/api/v1/rooms/:room_id/recommendation/broadcast",
            post(recommendation::broadcast_recommendation),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    info!("Server running on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .unwrap();

    // Complete every open subscription before the process exits
    hub.shutdown().await;
    info!("Broadcast hub shut down, exiting");
}
