use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::instrument;

use super::events::RoomEvent;
use crate::room::{types::InviteCodeQuery, RoomService};
use crate::shared::{AppError, AppState};

fn sse_event(event: &RoomEvent) -> Event {
    Event::default()
        .event(event.event_name())
        .data(event.payload_json().to_string())
}

/// GET /api/v1/rooms/participants/stream?invite_code=XXXXXX
///
/// Long-lived push stream of room updates. The subscriber immediately
/// receives a `participants` snapshot, then every event published for the
/// room until disconnect or `room_closed`.
#[instrument(name = "stream_room", skip(state))]
pub async fn stream_room(
    State(state): State<AppState>,
    Query(query): Query<InviteCodeQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let code = query.invite_code.trim().to_uppercase();

    let room_service = RoomService::new(
        Arc::clone(&state.room_repository),
        Arc::clone(&state.selection_repository),
        Arc::clone(&state.user_directory),
        state.hub.clone(),
    );
    // Register before taking the snapshot so no update published after
    // the snapshot can be missed; a duplicate roster event is harmless
    // because every event is a full snapshot.
    let receiver = state.hub.subscribe(&code).await;
    let participants = room_service.list_participants_by_invite_code(&code).await?;
    let snapshot = RoomEvent::Participants { participants };

    let live = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => return Some((Ok(sse_event(&event)), receiver)),
                // Skipped ahead after falling behind; keep reading
                Err(RecvError::Lagged(_)) => continue,
                // Sender dropped: room closed or hub shut down
                Err(RecvError::Closed) => return None,
            }
        }
    });
    let stream = stream::once(async move { Ok(sse_event(&snapshot)) }).chain(live);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
