use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::room::types::RoomParticipantResponse;

/// Events pushed to room subscribers.
///
/// Each event is a full snapshot, not a delta, so two racing publishers on
/// the same room cannot leave a subscriber with partial state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoomEvent {
    /// Current roster of the room
    Participants {
        participants: Vec<RoomParticipantResponse>,
    },

    /// Latest recommendation produced by the external collaborator
    Recommendation { payload: Value },

    /// Terminal event: the room is gone, subscribers should disconnect
    RoomClosed,
}

impl RoomEvent {
    /// Wire name of the event as seen by stream subscribers
    pub fn event_name(&self) -> &'static str {
        match self {
            RoomEvent::Participants { .. } => "participants",
            RoomEvent::Recommendation { .. } => "recommendation",
            RoomEvent::RoomClosed => "room_closed",
        }
    }

    /// Payload serialized for the wire
    pub fn payload_json(&self) -> Value {
        match self {
            RoomEvent::Participants { participants } => json!(participants),
            RoomEvent::Recommendation { payload } => payload.clone(),
            RoomEvent::RoomClosed => json!([]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_wire_vocabulary() {
        let participants = RoomEvent::Participants {
            participants: vec![],
        };
        assert_eq!(participants.event_name(), "participants");
        assert_eq!(
            RoomEvent::Recommendation { payload: json!({}) }.event_name(),
            "recommendation"
        );
        assert_eq!(RoomEvent::RoomClosed.event_name(), "room_closed");
    }

    #[test]
    fn recommendation_payload_passes_through() {
        let event = RoomEvent::Recommendation {
            payload: json!({"menu": "pho"}),
        };
        assert_eq!(event.payload_json(), json!({"menu": "pho"}));
    }
}
