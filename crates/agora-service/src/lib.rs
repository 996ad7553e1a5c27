//! # agora-service
//!
//! The Agora forum engine: post lifecycle and moderation, visibility
//! enforcement, category management with its counter invariant, comments,
//! user administration, and the login-failure lockout.
//!
//! Services are thin stateful handles over a shared [`Database`]; every
//! operation takes the caller as an explicit [`agora_core::Viewer`] and
//! returns a typed [`ServiceError`] on failure.  The HTTP layer maps
//! those errors to status codes; nothing here knows about HTTP.
//!
//! [`Database`]: agora_store::Database

pub mod categories;
pub mod comments;
pub mod error;
pub mod login_limiter;
pub mod posts;
pub mod users;
pub mod views;

use std::sync::{Arc, Mutex, MutexGuard};

use agora_store::Database;

pub use error::{Result, ServiceError};
pub use login_limiter::LoginLimiter;

/// Shared handle to the store, cloned into every service.
pub type SharedDb = Arc<Mutex<Database>>;

/// Wrap a freshly opened database for use by the services.
pub fn shared(db: Database) -> SharedDb {
    Arc::new(Mutex::new(db))
}

/// Lock the shared database, surfacing poisoning as a typed error
/// instead of panicking in a request path.
pub(crate) fn lock(db: &SharedDb) -> Result<MutexGuard<'_, Database>> {
    db.lock().map_err(|_| ServiceError::LockPoisoned)
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    pub fn test_db() -> SharedDb {
        shared(Database::open_in_memory().expect("in-memory db"))
    }
}
