//! Core types and trait definitions for the BranchOut student directory.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The prompt eligibility rules live here as pure functions so every
//! storage backend applies them identically.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod eligibility;
pub mod error;
pub mod message;
pub mod prompt;
pub mod store;
pub mod student;
pub mod tag;

pub use error::{Error, ErrorKind, Result};
