//! Typed errors for every engine operation.
//!
//! `PostNotFound` is deliberately a bare unit variant: an id that never
//! existed and a post the caller is not allowed to see produce the very
//! same value, so nothing downstream can tell the two apart (existence
//! camouflage).  Ownership violations on *mutations* are the exception --
//! hiding existence buys nothing once the caller already references the
//! resource, so those surface as the distinct `NotAuthor` family.

use agora_store::StoreError;
use thiserror::Error;

/// Errors produced by the service layer.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Post absent, or present but hidden from this caller.
    #[error("Post not found")]
    PostNotFound,

    /// Mutation attempted by someone who is neither the author nor an
    /// admin.
    #[error("Caller is not the author of this post")]
    NotAuthor,

    /// Category absent or disabled (for caller-facing lookups the two
    /// are equivalent: a disabled category accepts no posts).
    #[error("Category not found")]
    CategoryNotFound,

    /// Category names are unique.
    #[error("Category name {0:?} already exists")]
    CategoryNameExists(String),

    /// Deletion refused: the category still has posts.
    #[error("Category still has {0} posts")]
    CategoryHasPosts(i64),

    /// Deletion refused: the cached counter and the actual row count
    /// disagree.  Surfaced distinctly so operators can see drift.
    #[error("Category post count mismatch: cached {cached}, actual {actual}")]
    CountMismatch { cached: i64, actual: i64 },

    #[error("User not found")]
    UserNotFound,

    /// The target (or calling) user is banned.
    #[error("User is banned")]
    UserBanned,

    #[error("Username {0:?} already exists")]
    UsernameExists(String),

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Caller is not the author of this comment")]
    CommentNotAuthor,

    /// Operation requires a logged-in caller.
    #[error("Login required")]
    Unauthorized,

    /// Operation requires an admin.
    #[error("Admin role required")]
    PermissionDenied,

    /// A patch with no fields set is a no-op and gets rejected instead
    /// of silently succeeding.
    #[error("Nothing to update")]
    EmptyPatch,

    /// Status code outside the lifecycle range `0..=4`.
    #[error("Invalid post status code {0}")]
    InvalidStatus(i64),

    /// Input failed a bound or format check.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Shared state lock was poisoned by a panicking writer.
    #[error("State lock poisoned")]
    LockPoisoned,

    /// Anything the store itself failed on.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Stable machine-readable code carried in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::PostNotFound => "40001",
            ServiceError::NotAuthor => "40002",
            ServiceError::CategoryNotFound => "40201",
            ServiceError::CategoryNameExists(_) => "40202",
            ServiceError::CategoryHasPosts(_) => "40203",
            ServiceError::CountMismatch { .. } => "40204",
            ServiceError::UserNotFound => "10001",
            ServiceError::UserBanned => "10004",
            ServiceError::UsernameExists(_) => "10101",
            ServiceError::CommentNotFound => "40101",
            ServiceError::CommentNotAuthor => "40102",
            ServiceError::Unauthorized => "20001",
            ServiceError::PermissionDenied => "20203",
            ServiceError::EmptyPatch => "10205",
            ServiceError::InvalidStatus(_) => "30005",
            ServiceError::Validation(_) => "30001",
            ServiceError::LockPoisoned | ServiceError::Store(_) => "A0005",
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camouflaged_not_found_has_no_payload() {
        // The same value for "never existed" and "hidden": format and
        // code must carry nothing distinguishing.
        let a = ServiceError::PostNotFound;
        let b = ServiceError::PostNotFound;
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.code(), b.code());
    }
}
