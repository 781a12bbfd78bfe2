use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    models::PlaceSelectionModel,
    repository::SelectionRepository,
    types::{
        RoulettePickResponse, SelectionItemRequest, SelectionParticipantStatus,
        SelectionSummaryResponse, SubmitSelectionsRequest,
    },
};
use crate::{
    broadcast::{BroadcastHub, RoomEvent},
    room::{
        models::{ParticipantModel, RoomModel, RoomStatus},
        repository::RoomRepository,
        types::RoomParticipantResponse,
    },
    shared::AppError,
};

/// Service for place-selection aggregation and the roulette draw
pub struct SelectionService {
    room_repository: Arc<dyn RoomRepository + Send + Sync>,
    repository: Arc<dyn SelectionRepository + Send + Sync>,
    hub: BroadcastHub,
}

impl SelectionService {
    pub fn new(
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        repository: Arc<dyn SelectionRepository + Send + Sync>,
        hub: BroadcastHub,
    ) -> Self {
        Self {
            room_repository,
            repository,
            hub,
        }
    }

    /// Replaces the actor's ticket set with the submitted places.
    ///
    /// The replacement is atomic: no prior ticket of the actor survives.
    #[instrument(skip(self, request))]
    pub async fn submit_selections(
        &self,
        room_id: Uuid,
        identity: Option<Uuid>,
        request: SubmitSelectionsRequest,
    ) -> Result<SelectionSummaryResponse, AppError> {
        let room = self.get_room_or_not_found(room_id).await?;
        let mut room = self.reject_if_expired(room).await?;
        let actor = self
            .resolve_actor(&room, identity, request.participant_id)
            .await?;

        let normalized = normalize_items(&request.places);
        if normalized.is_empty() {
            return Err(AppError::InvalidArgument(
                "Select at least one place".to_string(),
            ));
        }

        let rows: Vec<PlaceSelectionModel> = normalized
            .into_iter()
            .map(|(name, provider_id)| {
                PlaceSelectionModel::new(room.id, actor.id, name, provider_id)
            })
            .collect();
        self.repository
            .replace_for_participant(room.id, actor.id, rows)
            .await?;

        info!(room_id = %room.id, participant_id = %actor.id, "Selections submitted");

        let summary = self.build_summary(&room, actor.id).await?;
        if summary.all_completed && room.status == RoomStatus::Collecting {
            room.update_status(RoomStatus::Ready);
            self.room_repository.update_room(&room).await?;
            debug!(room_id = %room.id, "All participants completed, room is READY");
        }
        self.broadcast_participants(&room).await;
        Ok(summary)
    }

    /// Read-only aggregate projection for the resolved actor
    #[instrument(skip(self))]
    pub async fn summary(
        &self,
        room_id: Uuid,
        identity: Option<Uuid>,
        participant_id: Option<Uuid>,
    ) -> Result<SelectionSummaryResponse, AppError> {
        let room = self.get_room_or_not_found(room_id).await?;
        let actor = self.resolve_actor(&room, identity, participant_id).await?;
        self.build_summary(&room, actor.id).await
    }

    /// Draws the winning place, weighted by raw ticket count.
    ///
    /// Every (participant, selection) pair is one ticket, so a place picked
    /// by more people (or picked repeatedly) wins proportionally more often.
    #[instrument(skip(self))]
    pub async fn spin_roulette(
        &self,
        room_id: Uuid,
        requester: Option<Uuid>,
    ) -> Result<RoulettePickResponse, AppError> {
        let room = self.get_room_or_not_found(room_id).await?;
        match requester {
            Some(user_id) if user_id == room.host_user_id => {}
            _ => {
                return Err(AppError::Unauthorized(
                    "Only the host can spin the roulette".to_string(),
                ))
            }
        }
        let mut room = self.reject_if_expired(room).await?;

        let participants = self.room_repository.list_participants(room.id).await?;
        if participants.is_empty() {
            return Err(AppError::InvalidArgument(
                "The room has no participants".to_string(),
            ));
        }

        let by_participant = self.selections_by_participant(room.id).await?;
        let incomplete: Vec<String> = participants
            .iter()
            .filter(|p| by_participant.get(&p.id).map_or(true, Vec::is_empty))
            .map(|p| p.display_name.clone())
            .collect();
        if !incomplete.is_empty() {
            return Err(AppError::InvalidArgument(format!(
                "Participants have not completed their selection: {}",
                incomplete.join(", ")
            )));
        }

        // Flat ticket pool in participant-then-selection order
        let tickets = flatten_tickets(&participants, &by_participant);
        if tickets.is_empty() {
            return Err(AppError::InvalidArgument(
                "There are no roulette candidates".to_string(),
            ));
        }

        // The draw has real stakes, so the index comes from the
        // thread-local CSPRNG rather than a seedable generator.
        let picked_index = rand::rng().random_range(0..tickets.len());
        let selected_place_name = tickets[picked_index].clone();

        room.update_status(RoomStatus::Decided);
        self.room_repository.update_room(&room).await?;

        info!(
            room_id = %room.id,
            winner = %selected_place_name,
            ticket_count = tickets.len(),
            "Roulette decided"
        );

        Ok(RoulettePickResponse {
            selected_place_name,
            total_ticket_count: tickets.len(),
            candidate_names: unique_candidate_names(&tickets),
        })
    }

    async fn build_summary(
        &self,
        room: &RoomModel,
        actor_participant_id: Uuid,
    ) -> Result<SelectionSummaryResponse, AppError> {
        let participants = self.room_repository.list_participants(room.id).await?;
        let by_participant = self.selections_by_participant(room.id).await?;

        let statuses: Vec<SelectionParticipantStatus> = participants
            .iter()
            .map(|p| SelectionParticipantStatus {
                participant_id: p.id,
                display_name: p.display_name.clone(),
                completed: by_participant.get(&p.id).is_some_and(|s| !s.is_empty()),
            })
            .collect();
        let all_completed = !statuses.is_empty() && statuses.iter().all(|s| s.completed);

        let tickets = flatten_tickets(&participants, &by_participant);
        let my_completed = by_participant
            .get(&actor_participant_id)
            .is_some_and(|s| !s.is_empty());

        Ok(SelectionSummaryResponse {
            all_completed,
            my_completed,
            total_selected_count: tickets.len(),
            candidate_names: unique_candidate_names(&tickets),
            participants: statuses,
        })
    }

    async fn selections_by_participant(
        &self,
        room_id: Uuid,
    ) -> Result<HashMap<Uuid, Vec<String>>, AppError> {
        let mut by_participant: HashMap<Uuid, Vec<String>> = HashMap::new();
        for row in self.repository.list_by_room(room_id).await? {
            by_participant
                .entry(row.participant_id)
                .or_default()
                .push(row.place_name);
        }
        Ok(by_participant)
    }

    /// Same resolution rule as preference submission: a host identity must
    /// match, otherwise an explicit participant id is required. The host
    /// must already be a participant here; selection paths never create
    /// the host row.
    async fn resolve_actor(
        &self,
        room: &RoomModel,
        identity: Option<Uuid>,
        participant_id: Option<Uuid>,
    ) -> Result<ParticipantModel, AppError> {
        if let Some(user_id) = identity {
            if room.host_user_id != user_id {
                return Err(AppError::Unauthorized(
                    "Host identity does not match this room".to_string(),
                ));
            }
            return self
                .room_repository
                .find_participant_by_user(room.id, user_id)
                .await?
                .ok_or_else(|| {
                    AppError::InvalidArgument(
                        "The host has not joined the room as a participant".to_string(),
                    )
                });
        }

        let participant_id = participant_id.ok_or_else(|| {
            AppError::InvalidArgument(
                "participant_id is required when no identity is supplied".to_string(),
            )
        })?;
        let participant = self
            .room_repository
            .get_participant(participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;
        if participant.room_id != room.id {
            return Err(AppError::InvalidArgument(
                "Participant does not belong to this room".to_string(),
            ));
        }
        Ok(participant)
    }

    async fn get_room_or_not_found(&self, room_id: Uuid) -> Result<RoomModel, AppError> {
        self.room_repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".to_string()))
    }

    async fn reject_if_expired(&self, mut room: RoomModel) -> Result<RoomModel, AppError> {
        if room.is_expired() {
            if room.status != RoomStatus::Expired {
                room.update_status(RoomStatus::Expired);
                self.room_repository.update_room(&room).await?;
            }
            return Err(AppError::InvalidState("Room has expired".to_string()));
        }
        Ok(room)
    }

    /// Fire-and-forget roster snapshot after a selection mutation
    async fn broadcast_participants(&self, room: &RoomModel) {
        match self.room_repository.list_participants(room.id).await {
            Ok(participants) => {
                let participants: Vec<RoomParticipantResponse> =
                    participants.iter().map(RoomParticipantResponse::from).collect();
                self.hub
                    .publish(&room.invite_code, RoomEvent::Participants { participants })
                    .await;
            }
            Err(error) => {
                debug!(
                    invite_code = %room.invite_code,
                    error = %error,
                    "Skipping participants broadcast"
                );
            }
        }
    }
}

/// Normalizes a submission: trims names, drops blanks, de-duplicates by
/// name keeping first-seen order, and discards empty provider ids.
fn normalize_items(items: &[SelectionItemRequest]) -> Vec<(String, Option<String>)> {
    let mut normalized: Vec<(String, Option<String>)> = Vec::new();
    for item in items {
        let name = item.place_name.trim();
        if name.is_empty() || normalized.iter().any(|(n, _)| n == name) {
            continue;
        }
        let provider_id = item
            .provider_place_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from);
        normalized.push((name.to_string(), provider_id));
    }
    normalized
}

fn flatten_tickets(
    participants: &[ParticipantModel],
    by_participant: &HashMap<Uuid, Vec<String>>,
) -> Vec<String> {
    let mut tickets = Vec::new();
    for participant in participants {
        if let Some(selected) = by_participant.get(&participant.id) {
            tickets.extend(selected.iter().cloned());
        }
    }
    tickets
}

fn unique_candidate_names(tickets: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for ticket in tickets {
        if !names.iter().any(|n| n == ticket) {
            names.push(ticket.clone());
        }
    }
    names
}
