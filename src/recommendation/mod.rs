// Public API - what other modules can use
pub use handlers::broadcast_recommendation;
pub use provider::{RecommendationProvider, StaticRecommendationProvider};
pub use service::RecommendationService;

// Internal modules
mod handlers;
mod provider;
mod service;
