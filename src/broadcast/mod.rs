// Per-room fan-out of live updates to stream subscribers.
//
// State-changing operations publish full snapshots here after each
// mutation; publishing is best-effort and never part of the transactional
// contract of the triggering call.

// Public API - what other modules can use
pub use events::RoomEvent;
pub use handlers::stream_room;
pub use hub::{BroadcastHub, RoomSubscription};

// Internal modules
mod events;
mod handlers;
mod hub;
