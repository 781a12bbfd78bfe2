use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One submitted place in a selection request
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionItemRequest {
    pub place_name: String,
    pub provider_place_id: Option<String>,
}

/// Selection submission: host authenticates via identity, guests pass
/// their participant id (same actor resolution as preferences).
#[derive(Debug, Default, Deserialize)]
pub struct SubmitSelectionsRequest {
    pub participant_id: Option<Uuid>,
    #[serde(default)]
    pub places: Vec<SelectionItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionParticipantStatus {
    pub participant_id: Uuid,
    pub display_name: String,
    pub completed: bool,
}

/// Aggregate view of a room's selection progress
#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionSummaryResponse {
    pub all_completed: bool,
    pub my_completed: bool,
    pub total_selected_count: usize,
    /// De-duplicated place names in first-seen order
    pub candidate_names: Vec<String>,
    pub participants: Vec<SelectionParticipantStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoulettePickResponse {
    pub selected_place_name: String,
    pub total_ticket_count: usize,
    pub candidate_names: Vec<String>,
}

/// Query string for the summary endpoint (guests pass their id here)
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub participant_id: Option<Uuid>,
}
