//! Errors for the Supabase-backed services

use thiserror::Error;

/// Errors from resolving an access token to a user
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// `SUPABASE_URL` is not set
    #[error("User directory is not configured")]
    NotConfigured,

    /// The token was rejected or resolved to no user
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// Network fault or unreadable response
    #[error("User lookup failed: {0}")]
    Transport(String),
}

/// Errors from persisting a generated plan
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// `SUPABASE_URL` is not set
    #[error("Plan storage is not configured")]
    NotConfigured,

    /// The insert was refused
    #[error("Failed to create plan ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Message from the response body
        message: String,
    },

    /// The insert succeeded but returned no row id
    #[error("Failed to create plan: no row returned")]
    EmptyResponse,

    /// Network fault or unreadable response
    #[error("Failed to create plan: {0}")]
    Transport(String),
}
