// State management module
// Shared, immutable wiring of the remote collaborators

pub mod app_state;

pub use app_state::AppState;
