use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

pub const INVITE_CODE_LENGTH: usize = 6;
pub const INVITE_CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const DEFAULT_RADIUS_METERS: i32 = 1500;
pub const DEFAULT_EXPIRES_HOURS: i64 = 6;

/// Room lifecycle. Legal transitions: COLLECTING -> READY | EXPIRED,
/// READY -> DECIDED | EXPIRED. EXPIRED rooms accept no mutation except
/// deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Collecting,
    Ready,
    Decided,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    Host,
    Guest,
}

/// Storage model for a decision room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomModel {
    pub id: Uuid,
    pub invite_code: String,
    pub host_user_id: Uuid,
    pub status: RoomStatus,
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius_meters: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomModel {
    /// Creates a new collecting room with default expiry
    pub fn new(
        invite_code: String,
        host_user_id: Uuid,
        center_lat: f64,
        center_lng: f64,
        radius_meters: Option<i32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            invite_code,
            host_user_id,
            status: RoomStatus::Collecting,
            center_lat,
            center_lng,
            radius_meters: radius_meters.unwrap_or(DEFAULT_RADIUS_METERS),
            expires_at: now + Duration::hours(DEFAULT_EXPIRES_HOURS),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the expiry deadline has passed (regardless of stored status)
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at || self.status == RoomStatus::Expired
    }

    pub fn update_status(&mut self, status: RoomStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Storage model for a room participant.
///
/// `user_id` is set only for the host; guests carry no identity beyond
/// their display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantModel {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub role: ParticipantRole,
    pub has_submitted: bool,
    pub preference_text: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl ParticipantModel {
    pub fn guest(room_id: Uuid, display_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            user_id: None,
            display_name,
            role: ParticipantRole::Guest,
            has_submitted: false,
            preference_text: None,
            joined_at: Utc::now(),
            last_seen_at: None,
        }
    }

    pub fn host(room_id: Uuid, user_id: Uuid, display_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            user_id: Some(user_id),
            display_name,
            role: ParticipantRole::Host,
            has_submitted: false,
            preference_text: None,
            joined_at: Utc::now(),
            last_seen_at: None,
        }
    }

    pub fn submit_preference(&mut self, preference_text: String) {
        self.has_submitted = true;
        self.preference_text = Some(preference_text);
    }

    pub fn update_last_seen(&mut self) {
        self.last_seen_at = Some(Utc::now());
    }
}

/// Draws a 6-character candidate invite code from `[A-Z0-9]`.
///
/// Uniqueness is the caller's concern: the registry retries on collision.
/// The thread-local rng is a CSPRNG, so codes are not guessable.
pub fn generate_invite_code() -> String {
    let mut rng = rand::rng();
    (0..INVITE_CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..INVITE_CODE_CHARS.len());
            INVITE_CODE_CHARS[idx] as char
        })
        .collect()
}
