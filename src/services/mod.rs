//! Service layer for the Supabase-backed collaborators
//!
//! User lookup and plan persistence sit behind traits so handlers can be
//! tested without a Supabase project.

pub mod error;
pub mod plans;
pub mod users;

pub use error::{DirectoryError, PersistenceError};
pub use plans::{PlanRepository, SupabasePlanRepository};
pub use users::{AuthenticatedUser, SupabaseUserDirectory, UserDirectory};

/// Error text from a Supabase error body
///
/// PostgREST reports `message`; the auth service uses `msg` or
/// `error_description`.
pub(crate) fn supabase_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .filter_map(|field| value.get(*field).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(str::to_string)
}
