use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::models::{ParticipantModel, RoomModel};
use crate::shared::AppError;

/// Trait for room and participant storage operations.
///
/// The durable store behind this trait must guarantee that
/// `ensure_host_participant` is atomic: two concurrent callers must end up
/// observing the same single host row.
#[async_trait]
pub trait RoomRepository {
    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError>;
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError>;
    async fn find_room_by_invite_code(&self, code: &str)
        -> Result<Option<RoomModel>, AppError>;
    async fn invite_code_exists(&self, code: &str) -> Result<bool, AppError>;
    async fn update_room(&self, room: &RoomModel) -> Result<(), AppError>;

    /// Deletes a room and all of its participants (explicit cascade)
    async fn delete_room(&self, room_id: Uuid) -> Result<(), AppError>;

    /// Atomic insert that fails when the display name is already taken in
    /// the room. Returns whether the participant was added.
    async fn add_participant_if_name_free(
        &self,
        participant: &ParticipantModel,
    ) -> Result<bool, AppError>;

    /// Atomic find-or-create of the room's host participant row
    async fn ensure_host_participant(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        display_name: &str,
    ) -> Result<ParticipantModel, AppError>;

    async fn get_participant(
        &self,
        participant_id: Uuid,
    ) -> Result<Option<ParticipantModel>, AppError>;

    /// Participants of a room in join order
    async fn list_participants(&self, room_id: Uuid)
        -> Result<Vec<ParticipantModel>, AppError>;

    async fn find_participant_by_user(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ParticipantModel>, AppError>;

    async fn update_participant(&self, participant: &ParticipantModel) -> Result<(), AppError>;

    /// Returns false when the participant was already gone (idempotent)
    async fn delete_participant(&self, participant_id: Uuid) -> Result<bool, AppError>;
}

#[derive(Default)]
struct RoomStore {
    rooms: HashMap<Uuid, RoomModel>,
    // Vec keeps join order; rooms are small so scans are fine
    participants: Vec<ParticipantModel>,
}

/// In-memory implementation of RoomRepository for development and testing
pub struct InMemoryRoomRepository {
    store: Mutex<RoomStore>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(RoomStore::default()),
        }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, room))]
    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError> {
        let mut store = self.store.lock().unwrap();
        if store.rooms.contains_key(&room.id) {
            return Err(AppError::Storage("Room already exists".to_string()));
        }
        if store
            .rooms
            .values()
            .any(|r| r.invite_code == room.invite_code)
        {
            return Err(AppError::Conflict("Invite code already in use".to_string()));
        }
        debug!(room_id = %room.id, invite_code = %room.invite_code, "Creating room in memory");
        store.rooms.insert(room.id, room.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store.rooms.get(&room_id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_room_by_invite_code(
        &self,
        code: &str,
    ) -> Result<Option<RoomModel>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .rooms
            .values()
            .find(|r| r.invite_code == code)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn invite_code_exists(&self, code: &str) -> Result<bool, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store.rooms.values().any(|r| r.invite_code == code))
    }

    #[instrument(skip(self, room))]
    async fn update_room(&self, room: &RoomModel) -> Result<(), AppError> {
        let mut store = self.store.lock().unwrap();
        match store.rooms.get_mut(&room.id) {
            Some(existing) => {
                *existing = room.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Room not found".to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn delete_room(&self, room_id: Uuid) -> Result<(), AppError> {
        let mut store = self.store.lock().unwrap();
        store.rooms.remove(&room_id);
        store.participants.retain(|p| p.room_id != room_id);
        debug!(room_id = %room_id, "Room and participants deleted");
        Ok(())
    }

    #[instrument(skip(self, participant))]
    async fn add_participant_if_name_free(
        &self,
        participant: &ParticipantModel,
    ) -> Result<bool, AppError> {
        // Name check and insert under one lock, so two racing joins with
        // the same name cannot both succeed.
        let mut store = self.store.lock().unwrap();
        let taken = store
            .participants
            .iter()
            .any(|p| p.room_id == participant.room_id && p.display_name == participant.display_name);
        if taken {
            return Ok(false);
        }
        store.participants.push(participant.clone());
        debug!(
            participant_id = %participant.id,
            room_id = %participant.room_id,
            "Participant added"
        );
        Ok(true)
    }

    #[instrument(skip(self, display_name))]
    async fn ensure_host_participant(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        display_name: &str,
    ) -> Result<ParticipantModel, AppError> {
        // Find-or-create under the store lock, so a concurrent caller can
        // never observe a half-created host or create a duplicate row.
        let mut store = self.store.lock().unwrap();
        if let Some(existing) = store
            .participants
            .iter()
            .find(|p| p.room_id == room_id && p.user_id == Some(user_id))
        {
            return Ok(existing.clone());
        }
        let host = ParticipantModel::host(room_id, user_id, display_name.to_string());
        store.participants.push(host.clone());
        debug!(room_id = %room_id, participant_id = %host.id, "Host participant created");
        Ok(host)
    }

    #[instrument(skip(self))]
    async fn get_participant(
        &self,
        participant_id: Uuid,
    ) -> Result<Option<ParticipantModel>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn list_participants(
        &self,
        room_id: Uuid,
    ) -> Result<Vec<ParticipantModel>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .participants
            .iter()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_participant_by_user(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ParticipantModel>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .participants
            .iter()
            .find(|p| p.room_id == room_id && p.user_id == Some(user_id))
            .cloned())
    }

    #[instrument(skip(self, participant))]
    async fn update_participant(&self, participant: &ParticipantModel) -> Result<(), AppError> {
        let mut store = self.store.lock().unwrap();
        match store
            .participants
            .iter_mut()
            .find(|p| p.id == participant.id)
        {
            Some(existing) => {
                *existing = participant.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Participant not found".to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn delete_participant(&self, participant_id: Uuid) -> Result<bool, AppError> {
        let mut store = self.store.lock().unwrap();
        let before = store.participants.len();
        store.participants.retain(|p| p.id != participant_id);
        Ok(store.participants.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::models::generate_invite_code;

    fn test_room(host_user_id: Uuid) -> RoomModel {
        RoomModel::new(generate_invite_code(), host_user_id, 37.5, 127.0, None)
    }

    #[tokio::test]
    async fn create_and_find_by_invite_code() {
        let repo = InMemoryRoomRepository::new();
        let room = test_room(Uuid::new_v4());
        repo.create_room(&room).await.unwrap();

        let found = repo
            .find_room_by_invite_code(&room.invite_code)
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, room.id);
        assert!(repo.invite_code_exists(&room.invite_code).await.unwrap());
        assert!(!repo.invite_code_exists("ZZZZZZ").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_invite_code_rejected() {
        let repo = InMemoryRoomRepository::new();
        let room = test_room(Uuid::new_v4());
        repo.create_room(&room).await.unwrap();

        let mut clash = test_room(Uuid::new_v4());
        clash.invite_code = room.invite_code.clone();
        let result = repo.create_room(&clash).await;
        assert!(matches!(result.unwrap_err(), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn participants_listed_in_join_order() {
        let repo = InMemoryRoomRepository::new();
        let room = test_room(Uuid::new_v4());
        repo.create_room(&room).await.unwrap();

        for name in ["alice", "bob", "carol"] {
            let guest = ParticipantModel::guest(room.id, name.to_string());
            assert!(repo.add_participant_if_name_free(&guest).await.unwrap());
        }

        let listed = repo.list_participants(room.id).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn ensure_host_participant_is_idempotent() {
        let repo = InMemoryRoomRepository::new();
        let host_user = Uuid::new_v4();
        let room = test_room(host_user);
        repo.create_room(&room).await.unwrap();

        let first = repo
            .ensure_host_participant(room.id, host_user, "jack")
            .await
            .unwrap();
        let second = repo
            .ensure_host_participant(room.id, host_user, "jack")
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let listed = repo.list_participants(room.id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn ensure_host_participant_under_concurrency() {
        let repo = std::sync::Arc::new(InMemoryRoomRepository::new());
        let host_user = Uuid::new_v4();
        let room = test_room(host_user);
        repo.create_room(&room).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = std::sync::Arc::clone(&repo);
                let room_id = room.id;
                tokio::spawn(async move {
                    repo.ensure_host_participant(room_id, host_user, "jack").await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Exactly one host row survives the race
        let listed = repo.list_participants(room.id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_same_name_joins_admit_exactly_one() {
        let repo = std::sync::Arc::new(InMemoryRoomRepository::new());
        let room = test_room(Uuid::new_v4());
        repo.create_room(&room).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = std::sync::Arc::clone(&repo);
                let room_id = room.id;
                tokio::spawn(async move {
                    let guest = ParticipantModel::guest(room_id, "alice".to_string());
                    repo.add_participant_if_name_free(&guest).await
                })
            })
            .collect();
        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
        let listed = repo.list_participants(room.id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn delete_room_cascades_participants() {
        let repo = InMemoryRoomRepository::new();
        let room = test_room(Uuid::new_v4());
        repo.create_room(&room).await.unwrap();
        let guest = ParticipantModel::guest(room.id, "alice".to_string());
        assert!(repo.add_participant_if_name_free(&guest).await.unwrap());

        repo.delete_room(room.id).await.unwrap();
        assert!(repo.get_room(room.id).await.unwrap().is_none());
        assert!(repo.get_participant(guest.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_participant_is_idempotent() {
        let repo = InMemoryRoomRepository::new();
        let room = test_room(Uuid::new_v4());
        repo.create_room(&room).await.unwrap();
        let guest = ParticipantModel::guest(room.id, "alice".to_string());
        assert!(repo.add_participant_if_name_free(&guest).await.unwrap());

        assert!(repo.delete_participant(guest.id).await.unwrap());
        assert!(!repo.delete_participant(guest.id).await.unwrap());
    }
}
