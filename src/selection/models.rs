use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One venue ticket: a participant's single selected place.
///
/// Multiple participants may hold tickets for the same place name; each
/// row counts individually in the roulette draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSelectionModel {
    pub id: Uuid,
    pub room_id: Uuid,
    pub participant_id: Uuid,
    pub place_name: String,
    pub provider_place_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PlaceSelectionModel {
    pub fn new(
        room_id: Uuid,
        participant_id: Uuid,
        place_name: String,
        provider_place_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            participant_id,
            place_name,
            provider_place_id,
            created_at: Utc::now(),
        }
    }
}
