// Public API - what other modules can use
pub use handlers::{
    create_room, get_participant_preference, get_participants,
    get_participants_by_invite_code, join_as_host, join_room, leave_room, submit_preference,
};
pub use service::RoomService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
