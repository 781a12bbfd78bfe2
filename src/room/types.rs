use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{ParticipantModel, ParticipantRole, RoomStatus};

/// Request payload for creating a new room.
///
/// Center coordinates are mandatory at the contract level but optional in
/// the payload so the service can report a useful error instead of a 422.
#[derive(Debug, Default, Deserialize)]
pub struct CreateRoomRequest {
    pub center_lat: Option<f64>,
    pub center_lng: Option<f64>,
    pub radius_meters: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: Uuid,
    pub invite_code: String,
    pub status: RoomStatus,
}

/// Request payload for joining a room by invite code
#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub invite_code: String,
    pub display_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub room_id: Uuid,
    pub invite_code: String,
    pub participant_id: Uuid,
    pub display_name: String,
    pub status: RoomStatus,
}

/// One roster entry, also the payload of `participants` broadcasts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomParticipantResponse {
    pub participant_id: Uuid,
    pub display_name: String,
    pub role: ParticipantRole,
    pub has_submitted: bool,
}

impl From<&ParticipantModel> for RoomParticipantResponse {
    fn from(participant: &ParticipantModel) -> Self {
        Self {
            participant_id: participant.id,
            display_name: participant.display_name.clone(),
            role: participant.role,
            has_submitted: participant.has_submitted,
        }
    }
}

/// Preference submission: host authenticates via identity, guests pass
/// their participant id. Exactly one of the two paths applies.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitPreferenceRequest {
    pub participant_id: Option<Uuid>,
    #[serde(default)]
    pub chips: Vec<String>,
    #[serde(default)]
    pub free_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParticipantPreferenceResponse {
    pub participant_id: Uuid,
    pub display_name: String,
    pub has_submitted: bool,
    pub preference_text: String,
}

/// Leave request: hosts send `room_id` (with identity), guests send
/// `participant_id`.
#[derive(Debug, Default, Deserialize)]
pub struct LeaveRoomRequest {
    pub room_id: Option<Uuid>,
    pub participant_id: Option<Uuid>,
}

/// Query string for invite-code based lookups and subscriptions
#[derive(Debug, Deserialize)]
pub struct InviteCodeQuery {
    pub invite_code: String,
}
