// Public API - what other modules can use
pub use handlers::{get_selection_summary, spin_roulette, submit_selections};
pub use service::SelectionService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
