//! Response view structs.
//!
//! Views are what leaves the engine: the detail view for a single post
//! page, the summary view for listings (with the author's public fields
//! joined in), and the two category views: the public one hides the
//! admin-only columns.

use agora_core::PostStatus;
use agora_store::{Category, Comment, Post, PostWithAuthor, User};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Full post view for the single-post page.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
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

impl From<Post> for PostDetail {
    fn from(p: Post) -> Self {
        PostDetail {
            id: p.id,
            author_id: p.author_id,
            title: p.title,
            content: p.content,
            summary: p.summary,
            category_id: p.category_id,
            category_name: p.category_name,
            cover_image: p.cover_image,
            view_count: p.view_count,
            like_count: p.like_count,
            collect_count: p.collect_count,
            comment_count: p.comment_count,
            is_pinned: p.is_pinned,
            is_essence: p.is_essence,
            status: p.status,
            create_time: p.create_time,
            update_time: p.update_time,
        }
    }
}

/// Listing view: no content body, but the author's public fields so the
/// feed renders without extra lookups.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub summary: String,
    pub category_name: String,
    pub cover_image: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
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

impl From<PostWithAuthor> for PostSummary {
    fn from(row: PostWithAuthor) -> Self {
        let p = row.post;
        PostSummary {
            id: p.id,
            author_id: p.author_id,
            title: p.title,
            summary: p.summary,
            category_name: p.category_name,
            cover_image: p.cover_image,
            username: row.username,
            avatar_url: row.avatar_url,
            view_count: p.view_count,
            like_count: p.like_count,
            collect_count: p.collect_count,
            comment_count: p.comment_count,
            is_pinned: p.is_pinned,
            is_essence: p.is_essence,
            status: p.status,
            create_time: p.create_time,
            update_time: p.update_time,
        }
    }
}

/// Public category view.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub sort_order: i64,
}

impl From<Category> for CategoryView {
    fn from(c: Category) -> Self {
        CategoryView {
            id: c.id,
            name: c.name,
            description: c.description,
            icon: c.icon,
            sort_order: c.sort_order,
        }
    }
}

/// Admin category view: adds the counter cache and lifecycle columns.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryAdminView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub post_count: i64,
    pub sort_order: i64,
    pub is_active: bool,
    pub create_time: DateTime<Utc>,
}

impl From<Category> for CategoryAdminView {
    fn from(c: Category) -> Self {
        CategoryAdminView {
            id: c.id,
            name: c.name,
            description: c.description,
            icon: c.icon,
            post_count: c.post_count,
            sort_order: c.sort_order,
            is_active: c.is_active,
            create_time: c.create_time,
        }
    }
}

/// Comment view; identical to the row today but keeps the wire shape
/// independent of the schema.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    pub create_time: DateTime<Utc>,
}

impl From<Comment> for CommentView {
    fn from(c: Comment) -> Self {
        CommentView {
            id: c.id,
            post_id: c.post_id,
            author_id: c.author_id,
            content: c.content,
            create_time: c.create_time,
        }
    }
}

/// Public user view.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub role: agora_core::Role,
    pub avatar_url: Option<String>,
    pub is_banned: bool,
    pub create_time: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        UserView {
            id: u.id,
            username: u.username,
            role: u.role,
            avatar_url: u.avatar_url,
            is_banned: u.is_banned,
            create_time: u.create_time,
        }
    }
}
