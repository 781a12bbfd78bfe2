// Library crate for the lunchpick decision-room server
// This file exposes the public API for integration tests

pub mod broadcast;
pub mod recommendation;
pub mod room;
pub mod selection;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use broadcast::{BroadcastHub, RoomEvent};
pub use recommendation::{
    RecommendationProvider, RecommendationService, StaticRecommendationProvider,
};
pub use room::{
    models::{ParticipantModel, ParticipantRole, RoomModel, RoomStatus},
    repository::{InMemoryRoomRepository, RoomRepository},
    RoomService,
};
pub use selection::{
    repository::{InMemorySelectionRepository, SelectionRepository},
    SelectionService,
};
pub use shared::{AppError, AppState};
pub use user::{InMemoryUserDirectory, UserDirectory};
