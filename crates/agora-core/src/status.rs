//! Post lifecycle status.
//!
//! A post moves `Draft -> PendingReview -> Published`, with `Rejected`
//! reachable from review and `Deleted` (soft delete) reachable from any
//! non-terminal state.  The status is persisted and serialized as its
//! integer code, so the codes are part of the wire contract and must
//! never be renumbered.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostStatus {
    /// Private working copy, visible to the author only.
    Draft,
    /// Submitted and waiting for a moderation decision.
    PendingReview,
    /// Publicly visible.
    Published,
    /// Rejected by moderation; the author can still read it.
    Rejected,
    /// Soft-deleted.  Terminal for ordinary users; only an admin can
    /// remove the row itself.
    Deleted,
}

impl PostStatus {
    /// All states, in code order.
    pub const ALL: [PostStatus; 5] = [
        PostStatus::Draft,
        PostStatus::PendingReview,
        PostStatus::Published,
        PostStatus::Rejected,
        PostStatus::Deleted,
    ];

    /// The persisted / wire integer code.
    pub fn code(self) -> i64 {
        match self {
            PostStatus::Draft => 0,
            PostStatus::PendingReview => 1,
            PostStatus::Published => 2,
            PostStatus::Rejected => 3,
            PostStatus::Deleted => 4,
        }
    }

    /// Parse an integer code.  Returns `None` for anything outside `0..=4`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(PostStatus::Draft),
            1 => Some(PostStatus::PendingReview),
            2 => Some(PostStatus::Published),
            3 => Some(PostStatus::Rejected),
            4 => Some(PostStatus::Deleted),
            _ => None,
        }
    }

    /// Whether ordinary users can move the post out of this state.
    /// `Deleted` is terminal; everything else can still transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, PostStatus::Deleted)
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PostStatus::Draft => "draft",
            PostStatus::PendingReview => "pending_review",
            PostStatus::Published => "published",
            PostStatus::Rejected => "rejected",
            PostStatus::Deleted => "deleted",
        };
        write!(f, "{name}")
    }
}

// Wire form is the bare integer code.
impl Serialize for PostStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for PostStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        PostStatus::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid post status code {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for status in PostStatus::ALL {
            assert_eq!(PostStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn out_of_range_codes_rejected() {
        assert_eq!(PostStatus::from_code(-1), None);
        assert_eq!(PostStatus::from_code(5), None);
        assert_eq!(PostStatus::from_code(114514), None);
    }

    #[test]
    fn only_deleted_is_terminal() {
        for status in PostStatus::ALL {
            assert_eq!(status.is_terminal(), status == PostStatus::Deleted);
        }
    }

    #[test]
    fn serializes_as_integer() {
        let json = serde_json::to_string(&PostStatus::Published).unwrap();
        assert_eq!(json, "2");
        let back: PostStatus = serde_json::from_str("3").unwrap();
        assert_eq!(back, PostStatus::Rejected);
        assert!(serde_json::from_str::<PostStatus>("9").is_err());
    }
}
