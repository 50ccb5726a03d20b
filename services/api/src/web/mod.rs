pub mod auth;
pub mod chats;
pub mod dashboard;
pub mod dto;
pub mod middleware;
pub mod protocol;
pub mod requests;
pub mod rest;
pub mod router;
pub mod schedule;
pub mod state;
pub mod tutors;
pub mod ws_handler;

// Re-export the router builder and state to make them easily accessible
// to the binary and the integration tests.
pub use router::build_router;
pub use state::AppState;
