use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    models::{generate_invite_code, ParticipantModel, ParticipantRole, RoomModel, RoomStatus},
    repository::RoomRepository,
    types::{
        CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse,
        ParticipantPreferenceResponse, RoomParticipantResponse, SubmitPreferenceRequest,
    },
};
use crate::{
    broadcast::{BroadcastHub, RoomEvent},
    selection::repository::SelectionRepository,
    shared::AppError,
    user::UserDirectory,
};

/// Service for room and participant lifecycle
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
    selection_repository: Arc<dyn SelectionRepository + Send + Sync>,
    user_directory: Arc<dyn UserDirectory>,
    hub: BroadcastHub,
}

impl RoomService {
    pub fn new(
        repository: Arc<dyn RoomRepository + Send + Sync>,
        selection_repository: Arc<dyn SelectionRepository + Send + Sync>,
        user_directory: Arc<dyn UserDirectory>,
        hub: BroadcastHub,
    ) -> Self {
        Self {
            repository,
            selection_repository,
            user_directory,
            hub,
        }
    }

    /// Creates a room for an already-authenticated host
    #[instrument(skip(self, request))]
    pub async fn create_room(
        &self,
        host_user_id: Uuid,
        request: CreateRoomRequest,
    ) -> Result<CreateRoomResponse, AppError> {
        self.user_directory
            .find_user(host_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let (center_lat, center_lng) = match (request.center_lat, request.center_lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                return Err(AppError::InvalidArgument(
                    "Center coordinates are required to create a room".to_string(),
                ))
            }
        };

        // Collision chance at 36^6 codes is negligible, but the retry loop
        // makes the contract hold regardless.
        let room = loop {
            let code = generate_invite_code();
            if self.repository.invite_code_exists(&code).await? {
                debug!(invite_code = %code, "Invite code collision, regenerating");
                continue;
            }
            let candidate =
                RoomModel::new(code, host_user_id, center_lat, center_lng, request.radius_meters);
            match self.repository.create_room(&candidate).await {
                Ok(()) => break candidate,
                // Lost the uniqueness race to a concurrent creator
                Err(AppError::Conflict(_)) => continue,
                Err(other) => return Err(other),
            }
        };

        info!(room_id = %room.id, invite_code = %room.invite_code, "Room created");
        Ok(CreateRoomResponse {
            room_id: room.id,
            invite_code: room.invite_code,
            status: room.status,
        })
    }

    /// Joins a room as a guest by invite code
    #[instrument(skip(self, request))]
    pub async fn join_room(&self, request: JoinRoomRequest) -> Result<JoinRoomResponse, AppError> {
        let code = request.invite_code.trim().to_uppercase();
        let display_name = request.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(AppError::InvalidArgument(
                "Display name must not be empty".to_string(),
            ));
        }

        let room = self
            .repository
            .find_room_by_invite_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite code not found".to_string()))?;
        let room = self.reject_if_expired(room).await?;

        let guest = ParticipantModel::guest(room.id, display_name);
        if !self.repository.add_participant_if_name_free(&guest).await? {
            return Err(AppError::Conflict(
                "Display name already in use in this room".to_string(),
            ));
        }

        info!(
            room_id = %room.id,
            participant_id = %guest.id,
            display_name = %guest.display_name,
            "Guest joined room"
        );

        let response = JoinRoomResponse {
            room_id: room.id,
            invite_code: room.invite_code.clone(),
            participant_id: guest.id,
            display_name: guest.display_name,
            status: room.status,
        };
        self.broadcast_participants(&room).await;
        Ok(response)
    }

    /// Registers the host as a participant of their own room (idempotent)
    #[instrument(skip(self))]
    pub async fn ensure_host_participant(
        &self,
        user_id: Uuid,
        room_id: Uuid,
    ) -> Result<RoomParticipantResponse, AppError> {
        let room = self.get_room_or_not_found(room_id).await?;
        if room.host_user_id != user_id {
            return Err(AppError::Unauthorized(
                "Only the host can register as host participant".to_string(),
            ));
        }
        let room = self.reject_if_expired(room).await?;

        let host = self.ensure_host_row(&room).await?;
        let response = RoomParticipantResponse::from(&host);
        self.broadcast_participants(&room).await;
        Ok(response)
    }

    /// Roster in join order
    #[instrument(skip(self))]
    pub async fn list_participants(
        &self,
        room_id: Uuid,
    ) -> Result<Vec<RoomParticipantResponse>, AppError> {
        let room = self.get_room_or_not_found(room_id).await?;
        self.roster(&room).await
    }

    /// Roster lookup for callers that only hold the invite code
    #[instrument(skip(self))]
    pub async fn list_participants_by_invite_code(
        &self,
        invite_code: &str,
    ) -> Result<Vec<RoomParticipantResponse>, AppError> {
        let code = invite_code.trim().to_uppercase();
        let room = self
            .repository
            .find_room_by_invite_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite code not found".to_string()))?;
        self.roster(&room).await
    }

    /// Records a participant's preference submission.
    ///
    /// Hosts authenticate with their identity; guests pass a participant
    /// id. The two paths are mutually exclusive.
    #[instrument(skip(self, request))]
    pub async fn submit_preference(
        &self,
        room_id: Uuid,
        identity: Option<Uuid>,
        request: SubmitPreferenceRequest,
    ) -> Result<RoomParticipantResponse, AppError> {
        let room = self.get_room_or_not_found(room_id).await?;
        let room = self.reject_if_expired(room).await?;
        let mut participant = self
            .resolve_actor(&room, identity, request.participant_id)
            .await?;

        let summary = build_preference_text(&request.chips, &request.free_text);
        participant.submit_preference(summary);
        participant.update_last_seen();
        self.repository.update_participant(&participant).await?;

        info!(
            room_id = %room.id,
            participant_id = %participant.id,
            "Preference submitted"
        );

        let response = RoomParticipantResponse::from(&participant);
        self.broadcast_participants(&room).await;
        Ok(response)
    }

    /// Reads back a participant's stored preference text
    #[instrument(skip(self))]
    pub async fn get_participant_preference(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
    ) -> Result<ParticipantPreferenceResponse, AppError> {
        let room = self.get_room_or_not_found(room_id).await?;
        let participant = self
            .repository
            .get_participant(participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;
        if participant.room_id != room.id {
            return Err(AppError::InvalidArgument(
                "Participant does not belong to this room".to_string(),
            ));
        }

        Ok(ParticipantPreferenceResponse {
            participant_id: participant.id,
            display_name: participant.display_name,
            has_submitted: participant.has_submitted,
            preference_text: participant.preference_text.unwrap_or_default(),
        })
    }

    /// Host leave: deletes the room with all participants and selections,
    /// then closes the room's broadcast channel.
    #[instrument(skip(self))]
    pub async fn leave_as_host(&self, user_id: Uuid, room_id: Uuid) -> Result<(), AppError> {
        let room = self.get_room_or_not_found(room_id).await?;
        if room.host_user_id != user_id {
            return Err(AppError::Unauthorized(
                "Only the host can delete the room".to_string(),
            ));
        }

        self.selection_repository.delete_by_room(room.id).await?;
        self.repository.delete_room(room.id).await?;
        info!(room_id = %room.id, invite_code = %room.invite_code, "Room deleted by host");
        self.hub.close_room(&room.invite_code).await;
        Ok(())
    }

    /// Guest leave. A no-op when the participant is already gone, since a
    /// host leaving may have cascaded the deletion first.
    #[instrument(skip(self))]
    pub async fn leave_as_guest(&self, participant_id: Uuid) -> Result<(), AppError> {
        let Some(participant) = self.repository.get_participant(participant_id).await? else {
            debug!(participant_id = %participant_id, "Guest already removed, leave is a no-op");
            return Ok(());
        };
        if participant.role == ParticipantRole::Host {
            return Err(AppError::InvalidArgument(
                "The host cannot leave through the guest path".to_string(),
            ));
        }

        let room = self.get_room_or_not_found(participant.room_id).await?;
        self.repository.delete_participant(participant.id).await?;
        self.selection_repository
            .delete_by_participant(room.id, participant.id)
            .await?;
        info!(
            room_id = %room.id,
            participant_id = %participant.id,
            "Guest left room"
        );
        self.broadcast_participants(&room).await;
        Ok(())
    }

    /// Resolves the acting participant: a host identity must match the
    /// room's host, otherwise an explicit participant id is required.
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
            return self.ensure_host_row(room).await;
        }

        let participant_id = participant_id.ok_or_else(|| {
            AppError::InvalidArgument(
                "participant_id is required when no identity is supplied".to_string(),
            )
        })?;
        let participant = self
            .repository
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
        self.repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".to_string()))
    }

    /// Lazy expiry: flips and persists EXPIRED on first access past the
    /// deadline, then rejects the mutation.
    async fn reject_if_expired(&self, mut room: RoomModel) -> Result<RoomModel, AppError> {
        if room.is_expired() {
            if room.status != RoomStatus::Expired {
                room.update_status(RoomStatus::Expired);
                self.repository.update_room(&room).await?;
            }
            return Err(AppError::InvalidState("Room has expired".to_string()));
        }
        Ok(room)
    }

    async fn ensure_host_row(&self, room: &RoomModel) -> Result<ParticipantModel, AppError> {
        let nickname = self
            .user_directory
            .find_user(room.host_user_id)
            .await?
            .map(|profile| profile.nickname)
            .unwrap_or_else(|| room.host_user_id.to_string());
        self.repository
            .ensure_host_participant(room.id, room.host_user_id, &nickname)
            .await
    }

    // The host row is never materialized on read paths; it exists only
    // once the host explicitly registered or submitted.
    async fn roster(&self, room: &RoomModel) -> Result<Vec<RoomParticipantResponse>, AppError> {
        let participants = self.repository.list_participants(room.id).await?;
        Ok(participants.iter().map(RoomParticipantResponse::from).collect())
    }

    /// Fire-and-forget roster snapshot. A broadcast failure must never
    /// fail the state change that triggered it.
    async fn broadcast_participants(&self, room: &RoomModel) {
        match self.roster(room).await {
            Ok(participants) => {
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

/// Composes the canonical preference summary from normalized chips and
/// trimmed free text.
pub fn build_preference_text(chips: &[String], free_text: &str) -> String {
    let normalized = normalize_chips(chips);
    let chip_part = if normalized.is_empty() {
        "none".to_string()
    } else {
        normalized.join(", ")
    };
    let trimmed = free_text.trim();
    let free_part = if trimmed.is_empty() { "none" } else { trimmed };
    format!(
        "[Preference summary]\n- Tags: {}\n- Note: {}",
        chip_part, free_part
    )
}

/// Trims, drops blanks, and de-duplicates preserving first-seen order
fn normalize_chips(chips: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for chip in chips {
        let trimmed = chip.trim();
        if trimmed.is_empty() || seen.iter().any(|s| s == trimmed) {
            continue;
        }
        seen.push(trimmed.to_string());
    }
    seen
}
