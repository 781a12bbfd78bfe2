use async_trait::async_trait;
use std::sync::Mutex;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::models::PlaceSelectionModel;
use crate::shared::AppError;

/// Trait for place-selection storage.
///
/// The store must offer a transactional replace: `replace_for_participant`
/// removes every prior row of that participant in the room and inserts the
/// new set as one atomic step.
#[async_trait]
pub trait SelectionRepository {
    async fn replace_for_participant(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        rows: Vec<PlaceSelectionModel>,
    ) -> Result<(), AppError>;

    /// All selections of a room in insertion order
    async fn list_by_room(&self, room_id: Uuid)
        -> Result<Vec<PlaceSelectionModel>, AppError>;

    async fn delete_by_participant(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
    ) -> Result<(), AppError>;

    async fn delete_by_room(&self, room_id: Uuid) -> Result<(), AppError>;
}

/// In-memory implementation of SelectionRepository for development and testing
pub struct InMemorySelectionRepository {
    rows: Mutex<Vec<PlaceSelectionModel>>,
}

impl Default for InMemorySelectionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySelectionRepository {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SelectionRepository for InMemorySelectionRepository {
    #[instrument(skip(self, rows))]
    async fn replace_for_participant(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        rows: Vec<PlaceSelectionModel>,
    ) -> Result<(), AppError> {
        // Delete-then-insert under one lock, so no reader sees a mix of
        // old and new tickets.
        let mut stored = self.rows.lock().unwrap();
        stored.retain(|row| !(row.room_id == room_id && row.participant_id == participant_id));
        debug!(
            room_id = %room_id,
            participant_id = %participant_id,
            count = rows.len(),
            "Replaced participant selections"
        );
        stored.extend(rows);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_by_room(
        &self,
        room_id: Uuid,
    ) -> Result<Vec<PlaceSelectionModel>, AppError> {
        let stored = self.rows.lock().unwrap();
        Ok(stored
            .iter()
            .filter(|row| row.room_id == room_id)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn delete_by_participant(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
    ) -> Result<(), AppError> {
        let mut stored = self.rows.lock().unwrap();
        stored.retain(|row| !(row.room_id == room_id && row.participant_id == participant_id));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_by_room(&self, room_id: Uuid) -> Result<(), AppError> {
        let mut stored = self.rows.lock().unwrap();
        stored.retain(|row| row.room_id != room_id);
        Ok(())
    }
}
