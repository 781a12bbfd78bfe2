use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::broadcast::BroadcastHub;
use crate::recommendation::RecommendationProvider;
use crate::room::repository::RoomRepository;
use crate::selection::repository::SelectionRepository;
use crate::user::UserDirectory;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_repository: Arc<dyn RoomRepository + Send + Sync>,
    pub selection_repository: Arc<dyn SelectionRepository + Send + Sync>,
    pub user_directory: Arc<dyn UserDirectory>,
    pub recommendation_provider: Arc<dyn RecommendationProvider>,
    pub hub: BroadcastHub,
}

impl AppState {
    pub fn new(
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        selection_repository: Arc<dyn SelectionRepository + Send + Sync>,
        user_directory: Arc<dyn UserDirectory>,
        recommendation_provider: Arc<dyn RecommendationProvider>,
        hub: BroadcastHub,
    ) -> Self {
        Self {
            room_repository,
            selection_repository,
            user_directory,
            recommendation_provider,
            hub,
        }
    }
}

/// Error taxonomy shared by every operation.
///
/// Callers must be able to distinguish kinds to choose a status mapping;
/// the message is the human-readable part of the contract.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidState(msg) => (StatusCode::GONE, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Storage error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::recommendation::StaticRecommendationProvider;
    use crate::room::repository::InMemoryRoomRepository;
    use crate::selection::repository::InMemorySelectionRepository;
    use crate::user::InMemoryUserDirectory;

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        room_repository: Option<Arc<dyn RoomRepository + Send + Sync>>,
        selection_repository: Option<Arc<dyn SelectionRepository + Send + Sync>>,
        user_directory: Option<Arc<dyn UserDirectory>>,
        recommendation_provider: Option<Arc<dyn RecommendationProvider>>,
        hub: Option<BroadcastHub>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                room_repository: None,
                selection_repository: None,
                user_directory: None,
                recommendation_provider: None,
                hub: None,
            }
        }

        pub fn with_room_repository(
            mut self,
            repo: Arc<dyn RoomRepository + Send + Sync>,
        ) -> Self {
            self.room_repository = Some(repo);
            self
        }

        pub fn with_selection_repository(
            mut self,
            repo: Arc<dyn SelectionRepository + Send + Sync>,
        ) -> Self {
            self.selection_repository = Some(repo);
            self
        }

        pub fn with_user_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
            self.user_directory = Some(directory);
            self
        }

        pub fn with_recommendation_provider(
            mut self,
            provider: Arc<dyn RecommendationProvider>,
        ) -> Self {
            self.recommendation_provider = Some(provider);
            self
        }

        pub fn with_hub(mut self, hub: BroadcastHub) -> Self {
            self.hub = Some(hub);
            self
        }

        pub fn build(self) -> AppState {
            AppState {
                room_repository: self
                    .room_repository
                    .unwrap_or_else(|| Arc::new(InMemoryRoomRepository::new())),
                selection_repository: self
                    .selection_repository
                    .unwrap_or_else(|| Arc::new(InMemorySelectionRepository::new())),
                user_directory: self
                    .user_directory
                    .unwrap_or_else(|| Arc::new(InMemoryUserDirectory::new())),
                recommendation_provider: self
                    .recommendation_provider
                    .unwrap_or_else(|| Arc::new(StaticRecommendationProvider::new())),
                hub: self.hub.unwrap_or_else(BroadcastHub::new),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
