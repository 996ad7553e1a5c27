//! # agora-store
//!
//! SQLite persistence for the Agora forum backend.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every
//! domain model.  Counter columns (`categories.post_count`,
//! `posts.comment_count`) are only ever mutated by single arithmetic
//! `UPDATE` statements, so concurrent writers cannot lose updates, and
//! multi-row invariants (create post + bump its category, hard delete +
//! drop it) run inside SQLite transactions.

pub mod categories;
pub mod comments;
pub mod database;
pub mod migrations;
pub mod models;
pub mod posts;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
