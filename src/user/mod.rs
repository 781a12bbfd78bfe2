// Public API - what other modules can use
pub use directory::{InMemoryUserDirectory, UserDirectory, UserProfile};
pub use identity::CallerIdentity;

// Internal modules
mod directory;
mod identity;
