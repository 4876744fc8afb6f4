//! Travel Planner Backend Library
//!
//! Orchestrates the remote services behind the travel planner: object
//! storage, the completion endpoint, asynchronous speech recognition and
//! plan persistence. The main binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod dashscope;
pub mod error;
pub mod orchestrator;
pub mod services;
/// Application state management
///
/// Immutable wiring of configuration and remote collaborators.
pub mod state;
pub mod storage;
