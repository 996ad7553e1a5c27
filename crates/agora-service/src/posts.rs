//! The post lifecycle engine.
//!
//! Owns creation, content edits, the two-tier delete (soft for authors,
//! hard for admins), moderation status changes, and every read path.
//! Reads enforce the visibility table from `agora_core`; a post the
//! caller may not see is reported with the exact same
//! [`ServiceError::PostNotFound`] as an id that never existed.

use agora_core::{
    can_view, listing_filter, CursorRequest, PageRequest, PageResult, PostStatus, Viewer,
    DEFAULT_FEED_PAGE_SIZE,
};
use agora_store::{NewPost, Post, PostContentUpdate, StoreError};
use tracing::info;

use crate::error::{Result, ServiceError};
use crate::users::require_admin;
use crate::views::{PostDetail, PostSummary};
use crate::{lock, SharedDb};

/// Bounds inherited from the wire contract.
pub const MAX_TITLE_LEN: usize = 50;
pub const MAX_CONTENT_LEN: usize = 50_000;
pub const MAX_SUMMARY_LEN: usize = 300;
pub const MAX_COVER_IMAGE_LEN: usize = 255;

/// Input for creating a post.  The status is not part of the input: the
/// engine assigns the policy-configured initial status.
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category_id: i64,
    pub cover_image: Option<String>,
}

/// Partial update for a post's content fields; `None` leaves the field
/// unchanged.  Status is deliberately absent: content edits never move
/// the lifecycle.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Option<i64>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.summary.is_none()
            && self.cover_image.is_none()
            && self.category_id.is_none()
    }
}

#[derive(Clone)]
pub struct PostService {
    db: SharedDb,
    /// Status assigned to new posts: `PendingReview` when moderation is
    /// on, `Published` otherwise.
    initial_status: PostStatus,
}

impl PostService {
    pub fn new(db: SharedDb, initial_status: PostStatus) -> Self {
        Self { db, initial_status }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a post in an active category.
    pub fn create(&self, viewer: &Viewer, input: CreatePost) -> Result<PostDetail> {
        let author_id = require_active_user(viewer)?;
        validate_title(&input.title)?;
        validate_content(&input.content)?;
        validate_summary(&input.summary)?;
        validate_cover(input.cover_image.as_deref())?;

        let mut db = lock(&self.db)?;
        // Disabled categories accept no posts, admin or not.
        let category = db
            .get_active_category(input.category_id)
            .map_err(category_not_found)?;

        let post = db.create_post(&NewPost {
            author_id,
            title: input.title,
            content: input.content,
            summary: input.summary,
            category_id: category.id,
            category_name: category.name,
            cover_image: input.cover_image,
            status: self.initial_status,
        })?;

        info!(
            post_id = post.id,
            author_id,
            category_id = post.category_id,
            status = %post.status,
            "post created"
        );
        Ok(post.into())
    }

    /// Edit a post's content.  Author or admin; the patch must carry at
    /// least one field; a supplied category must be active.  Bumps
    /// `update_time`, never touches `status`.
    pub fn update(&self, viewer: &Viewer, post_id: i64, patch: PostPatch) -> Result<PostDetail> {
        require_active_user(viewer)?;

        let mut db = lock(&self.db)?;
        let post = db.get_post(post_id).map_err(post_not_found)?;
        require_author_or_admin(viewer, &post)?;

        if patch.is_empty() {
            return Err(ServiceError::EmptyPatch);
        }

        if let Some(ref title) = patch.title {
            validate_title(title)?;
        }
        if let Some(ref content) = patch.content {
            validate_content(content)?;
        }
        if let Some(ref summary) = patch.summary {
            validate_summary(summary)?;
        }
        validate_cover(patch.cover_image.as_deref())?;

        // Resolve the target category; a change must point at an active
        // category and refreshes the denormalized name snapshot.
        let (category_id, category_name) = match patch.category_id {
            Some(category_id) => {
                let category = db
                    .get_active_category(category_id)
                    .map_err(category_not_found)?;
                (category.id, category.name)
            }
            None => (post.category_id, post.category_name.clone()),
        };

        let update = PostContentUpdate {
            title: patch.title.unwrap_or(post.title),
            content: patch.content.unwrap_or(post.content),
            summary: patch.summary.unwrap_or(post.summary),
            cover_image: patch.cover_image.or(post.cover_image),
            category_id,
            category_name,
        };

        let updated = db.update_post_content(post_id, post.category_id, &update)?;
        info!(post_id, "post content updated");
        Ok(updated.into())
    }

    /// Author-tier delete: the row stays, the status becomes `Deleted`,
    /// the category counter is untouched.  `update_time` is not bumped --
    /// this is a status transition, not an edit.
    pub fn soft_delete(&self, viewer: &Viewer, post_id: i64) -> Result<()> {
        require_active_user(viewer)?;

        let db = lock(&self.db)?;
        let post = db.get_post(post_id).map_err(post_not_found)?;
        // A terminal post is invisible to its author; admitting it still
        // exists would defeat the camouflage.
        if post.status.is_terminal() && !viewer.is_admin() {
            return Err(ServiceError::PostNotFound);
        }
        require_author_or_admin(viewer, &post)?;

        db.update_post_status(post_id, PostStatus::Deleted)?;
        info!(post_id, "post soft-deleted");
        Ok(())
    }

    /// Admin-tier delete: the row is removed and the category counter
    /// decremented.  Works on any status, including already-soft-deleted
    /// posts.
    pub fn hard_delete(&self, viewer: &Viewer, post_id: i64) -> Result<()> {
        require_admin(viewer)?;

        let mut db = lock(&self.db)?;
        if !db.hard_delete_post(post_id)? {
            return Err(ServiceError::PostNotFound);
        }
        info!(post_id, "post hard-deleted");
        Ok(())
    }

    /// Moderation decision: set any lifecycle status by code.  Admin
    /// only.  Leaves `update_time` alone so "last edited" keeps meaning
    /// authorship.
    pub fn set_status(&self, viewer: &Viewer, post_id: i64, code: i64) -> Result<()> {
        require_admin(viewer)?;
        let status = PostStatus::from_code(code).ok_or(ServiceError::InvalidStatus(code))?;

        let db = lock(&self.db)?;
        if !db.update_post_status(post_id, status)? {
            return Err(ServiceError::PostNotFound);
        }
        info!(post_id, status = %status, "post status set");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Fetch a single post, applying the visibility table.  Hidden and
    /// nonexistent are indistinguishable to the caller.
    pub fn get(&self, viewer: &Viewer, post_id: i64) -> Result<PostDetail> {
        let db = lock(&self.db)?;
        let post = db.get_post(post_id).map_err(post_not_found)?;

        if !can_view(post.status, post.author_id, viewer) {
            return Err(ServiceError::PostNotFound);
        }
        Ok(post.into())
    }

    /// Offset page over the published set, newest edits first.
    pub fn page_published(&self, page: PageRequest) -> Result<PageResult<PostSummary>> {
        let query = page.normalize(DEFAULT_FEED_PAGE_SIZE);
        let db = lock(&self.db)?;
        let (total, items) =
            db.page_posts_by_status(PostStatus::Published, query.limit(), query.offset())?;
        Ok(PageResult {
            total,
            items: items.into_iter().map(Into::into).collect(),
        })
    }

    /// Offset page over one user's posts.  The status filter depends on
    /// who is asking: strangers see published only, the author sees
    /// everything but deleted, admins see all.  A banned target blocks
    /// the listing entirely.
    pub fn page_by_user(
        &self,
        viewer: &Viewer,
        target_user_id: i64,
        page: PageRequest,
    ) -> Result<PageResult<PostSummary>> {
        let query = page.normalize(DEFAULT_FEED_PAGE_SIZE);

        let db = lock(&self.db)?;
        let target = db.get_user(target_user_id).map_err(|e| match e {
            StoreError::NotFound => ServiceError::UserNotFound,
            other => ServiceError::Store(other),
        })?;
        if target.is_banned {
            return Err(ServiceError::UserBanned);
        }

        let filter = listing_filter(viewer, target_user_id);
        let (total, items) =
            db.page_posts_by_author(target_user_id, filter, query.limit(), query.offset())?;
        Ok(PageResult {
            total,
            items: items.into_iter().map(Into::into).collect(),
        })
    }

    /// Cursor page over the published feed: the next `size` posts
    /// strictly after the last-seen id, newest first.  No total; a page
    /// shorter than `size` means end-of-feed.
    pub fn feed(&self, cursor: CursorRequest) -> Result<Vec<PostSummary>> {
        let query = cursor.normalize();
        let db = lock(&self.db)?;
        let items = db.feed_after_cursor(query.cursor, query.size)?;
        Ok(items.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// Guards and validation
// ---------------------------------------------------------------------------

/// A logged-in, non-banned caller; returns the user id.
fn require_active_user(viewer: &Viewer) -> Result<i64> {
    let id = viewer.user_id().ok_or(ServiceError::Unauthorized)?;
    if viewer.is_banned() {
        return Err(ServiceError::UserBanned);
    }
    Ok(id)
}

fn require_author_or_admin(viewer: &Viewer, post: &Post) -> Result<()> {
    if viewer.is_author_of(post.author_id) || viewer.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::NotAuthor)
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ServiceError::Validation(format!(
            "title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(ServiceError::Validation("content must not be empty".into()));
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(ServiceError::Validation(format!(
            "content exceeds {MAX_CONTENT_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_summary(summary: &str) -> Result<()> {
    if summary.trim().is_empty() {
        return Err(ServiceError::Validation("summary must not be empty".into()));
    }
    if summary.chars().count() > MAX_SUMMARY_LEN {
        return Err(ServiceError::Validation(format!(
            "summary exceeds {MAX_SUMMARY_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_cover(cover: Option<&str>) -> Result<()> {
    if let Some(url) = cover {
        if url.chars().count() > MAX_COVER_IMAGE_LEN {
            return Err(ServiceError::Validation(format!(
                "cover image URL exceeds {MAX_COVER_IMAGE_LEN} characters"
            )));
        }
    }
    Ok(())
}

fn post_not_found(e: StoreError) -> ServiceError {
    match e {
        StoreError::NotFound => ServiceError::PostNotFound,
        other => ServiceError::Store(other),
    }
}

fn category_not_found(e: StoreError) -> ServiceError {
    match e {
        StoreError::NotFound => ServiceError::CategoryNotFound,
        other => ServiceError::Store(other),
    }
}
