//! JSON REST API for BranchOut.
//!
//! Exposes an axum [`Router`] backed by any
//! [`branchout_core::store::DirectoryStore`]. Sessions, OAuth, and transport
//! concerns are the caller's responsibility; a caller that authenticates
//! requests passes the logged-in student in as an [`actor::SessionStudent`]
//! request extension.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", branchout_api::api_router(store.clone()))
//! ```

pub mod actor;
pub mod error;
pub mod matches;
pub mod messages;
pub mod prompts;
pub mod students;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use branchout_core::store::DirectoryStore;

pub use actor::SessionStudent;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: DirectoryStore + 'static,
{
  Router::new()
    // Directory
    .route("/students", get(students::list::<S>))
    .route("/students/{id}", get(students::get_one::<S>))
    .route("/filter", post(students::filter::<S>))
    .route("/validate-name", post(students::validate_name::<S>))
    .route("/faculties", get(students::faculties::<S>))
    .route("/tags/{kind}", get(students::tags::<S>))
    // Prompts
    .route("/prompts", get(prompts::list::<S>).post(prompts::create::<S>))
    .route("/candidates", post(prompts::candidates::<S>))
    // Matches
    .route("/matches", get(matches::list::<S>).post(matches::create::<S>))
    // Messages
    .route("/messages", get(messages::fetch::<S>).post(messages::send::<S>))
    .route("/unread", get(messages::unread::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
