use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::shared::AppError;

/// A known user as reported by the identity collaborator
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: Uuid,
    pub nickname: String,
}

/// Lookup surface over the external identity system.
///
/// Credentials are parsed and verified upstream; this trait only resolves
/// an already-validated user id to a profile.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError>;
}

/// In-memory implementation of UserDirectory for development and testing
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, String>>,
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register_user(&self, user_id: Uuid, nickname: String) {
        let mut users = self.users.write().await;
        users.insert(user_id, nickname);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).map(|nickname| UserProfile {
            id: user_id,
            nickname: nickname.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_user_is_found() {
        let directory = InMemoryUserDirectory::new();
        let user_id = Uuid::new_v4();
        directory.register_user(user_id, "jack".to_string()).await;

        let profile = directory.find_user(user_id).await.unwrap().unwrap();
        assert_eq!(profile.nickname, "jack");
        assert!(directory.find_user(Uuid::new_v4()).await.unwrap().is_none());
    }
}
