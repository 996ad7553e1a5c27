//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` so it can be handed to the view
//! layer; timestamps are stored as RFC-3339 text and surfaced as
//! `DateTime<Utc>`.

use agora_core::{PostStatus, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user.  Owned by the identity/auth stack; this core reads
/// it for roles, ban state, and the author fields joined into post
/// summaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    /// Informational; clearing a ban is an explicit admin operation.
    pub ban_until: Option<DateTime<Utc>>,
    pub create_time: DateTime<Utc>,
}

/// Fields needed to insert a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A forum category.
///
/// `post_count` is a derived cache of the number of posts referencing
/// this category.  It is maintained incrementally by arithmetic UPDATEs
/// and re-verified against the actual count before deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub post_count: i64,
    /// Higher sorts first.
    pub sort_order: i64,
    pub is_active: bool,
    pub create_time: DateTime<Utc>,
}

/// Fields needed to insert a new category row.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub sort_order: i64,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A forum post.
///
/// `category_name` is a denormalized snapshot refreshed whenever the
/// post's category changes, so reads never join `categories`.
/// `update_time` tracks *content* edits only; status transitions leave
/// it untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category_id: i64,
    pub category_name: String,
    pub cover_image: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub collect_count: i64,
    pub comment_count: i64,
    pub is_pinned: bool,
    pub is_essence: bool,
    pub status: PostStatus,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Fields needed to insert a new post row.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category_id: i64,
    pub category_name: String,
    pub cover_image: Option<String>,
    pub status: PostStatus,
}

/// A post row joined with its author's public fields, as returned by the
/// listing queries.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// New values for a post's content columns, produced by the service
/// layer after overlaying a patch onto the stored row.  `update_time`
/// is bumped by the store when this is applied.
#[derive(Debug, Clone)]
pub struct PostContentUpdate {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub cover_image: Option<String>,
    pub category_id: i64,
    pub category_name: String,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A comment on a post.  No lifecycle machine; deletion is a hard delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    pub create_time: DateTime<Utc>,
}
