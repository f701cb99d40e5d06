//! API layer - HTTP endpoints

pub mod admin;
pub mod health;
pub mod router;
pub mod search;
pub mod state;
pub mod types;

pub use router::create_router;
pub use state::AppState;
