//! CRUD and listing operations for [`Post`] records.
//!
//! Operations that span rows (creating a post and bumping its
//! category's counter, hard-deleting and dropping it, moving a post
//! between categories) run inside a single SQLite transaction.
//!
//! `update_time` tracks content authorship only: the status UPDATE
//! deliberately leaves it alone so "last edited" never reflects a
//! moderation decision.

use agora_core::{PostStatus, StatusFilter};
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewPost, Post, PostContentUpdate, PostWithAuthor};

const POST_COLUMNS: &str = "id, author_id, title, content, summary, category_id, category_name, \
     cover_image, view_count, like_count, collect_count, comment_count, \
     is_pinned, is_essence, status, create_time, update_time";

/// Same columns prefixed for the author join.
const POST_JOIN_COLUMNS: &str =
    "p.id, p.author_id, p.title, p.content, p.summary, p.category_id, p.category_name, \
     p.cover_image, p.view_count, p.like_count, p.collect_count, p.comment_count, \
     p.is_pinned, p.is_essence, p.status, p.create_time, p.update_time, \
     u.username, u.avatar_url";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new post and increment its category's post counter, in
    /// one transaction.  Returns the stored row.
    pub fn create_post(&mut self, new: &NewPost) -> Result<Post> {
        let now = Utc::now().to_rfc3339();

        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "INSERT INTO posts (author_id, title, content, summary, category_id, category_name,
                                cover_image, status, create_time, update_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                new.author_id,
                new.title,
                new.content,
                new.summary,
                new.category_id,
                new.category_name,
                new.cover_image,
                new.status.code(),
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE categories SET post_count = post_count + 1 WHERE id = ?1",
            params![new.category_id],
        )?;
        tx.commit()?;

        self.get_post(id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single post by id, regardless of status.  Status-based
    /// filtering is the service layer's job.
    pub fn get_post(&self, id: i64) -> Result<Post> {
        self.conn()
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                row_to_post,
            )
            .map_err(not_found)
    }

    /// Does a row with this id exist (any status)?
    pub fn post_exists(&self, id: i64) -> Result<bool> {
        let exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Actual number of posts referencing a category, counted from the
    /// posts table (the consistency-check side of the cached counter).
    pub fn count_posts_in_category(&self, category_id: i64) -> Result<i64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM posts WHERE category_id = ?1",
            params![category_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------

    /// One offset page of posts in `status`, newest edits first, joined
    /// with the author's public fields.  Returns `(total, items)`.
    pub fn page_posts_by_status(
        &self,
        status: PostStatus,
        limit: u32,
        offset: u32,
    ) -> Result<(u64, Vec<PostWithAuthor>)> {
        let total: u64 = self.conn().query_row(
            "SELECT COUNT(*) FROM posts WHERE status = ?1",
            params![status.code()],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {POST_JOIN_COLUMNS}
             FROM posts p
             LEFT JOIN users u ON p.author_id = u.id
             WHERE p.status = ?1
             ORDER BY p.update_time DESC, p.id DESC
             LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(params![status.code(), limit, offset], row_to_post_with_author)?;
        let items = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;
        Ok((total, items))
    }

    /// One offset page of a single author's posts under a status filter.
    pub fn page_posts_by_author(
        &self,
        author_id: i64,
        filter: StatusFilter,
        limit: u32,
        offset: u32,
    ) -> Result<(u64, Vec<PostWithAuthor>)> {
        let status_predicate = match filter {
            StatusFilter::PublishedOnly => "AND p.status = 2",
            StatusFilter::AllExceptDeleted => "AND p.status != 4",
            StatusFilter::All => "",
        };
        // Predicate over the bare table for the COUNT.
        let count_predicate = status_predicate.replace("p.status", "status");

        let total: u64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM posts WHERE author_id = ?1 {count_predicate}"),
            params![author_id],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {POST_JOIN_COLUMNS}
             FROM posts p
             LEFT JOIN users u ON p.author_id = u.id
             WHERE p.author_id = ?1 {status_predicate}
             ORDER BY p.update_time DESC, p.id DESC
             LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(params![author_id, limit, offset], row_to_post_with_author)?;
        let items = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;
        Ok((total, items))
    }

    /// Keyset page of published posts: up to `limit` rows with
    /// `id < cursor`, newest id first.  `cursor = None` starts from the
    /// top.  No total is computed.
    pub fn feed_after_cursor(
        &self,
        cursor: Option<i64>,
        limit: u32,
    ) -> Result<Vec<PostWithAuthor>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {POST_JOIN_COLUMNS}
             FROM posts p
             LEFT JOIN users u ON p.author_id = u.id
             WHERE p.status = 2 AND (?1 IS NULL OR p.id < ?1)
             ORDER BY p.id DESC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![cursor, limit], row_to_post_with_author)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Rewrite a post's content columns and bump `update_time`.
    ///
    /// When the update moves the post to a different category the two
    /// counters move with it (`old - 1`, `new + 1`) inside the same
    /// transaction.
    pub fn update_post_content(
        &mut self,
        id: i64,
        old_category_id: i64,
        update: &PostContentUpdate,
    ) -> Result<Post> {
        let now = Utc::now().to_rfc3339();

        let tx = self.conn_mut().transaction()?;
        let affected = tx.execute(
            "UPDATE posts
             SET title = ?2, content = ?3, summary = ?4, cover_image = ?5,
                 category_id = ?6, category_name = ?7, update_time = ?8
             WHERE id = ?1",
            params![
                id,
                update.title,
                update.content,
                update.summary,
                update.cover_image,
                update.category_id,
                update.category_name,
                now,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        if update.category_id != old_category_id {
            tx.execute(
                "UPDATE categories SET post_count = post_count - 1 WHERE id = ?1",
                params![old_category_id],
            )?;
            tx.execute(
                "UPDATE categories SET post_count = post_count + 1 WHERE id = ?1",
                params![update.category_id],
            )?;
        }
        tx.commit()?;

        self.get_post(id)
    }

    /// Set a post's lifecycle status without touching `update_time`.
    /// Returns `true` if a row was updated.
    pub fn update_post_status(&self, id: i64, status: PostStatus) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE posts SET status = ?2 WHERE id = ?1",
            params![id, status.code()],
        )?;
        Ok(affected > 0)
    }

    /// `comment_count = comment_count + 1`, atomically.
    pub fn increment_comment_count(&self, post_id: i64) -> Result<()> {
        self.conn().execute(
            "UPDATE posts SET comment_count = comment_count + 1 WHERE id = ?1",
            params![post_id],
        )?;
        Ok(())
    }

    /// `comment_count = comment_count - 1`, atomically.
    pub fn decrement_comment_count(&self, post_id: i64) -> Result<()> {
        self.conn().execute(
            "UPDATE posts SET comment_count = comment_count - 1 WHERE id = ?1",
            params![post_id],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Remove a post row entirely and decrement its category's counter,
    /// in one transaction.  Returns `true` if a row was deleted.
    pub fn hard_delete_post(&mut self, id: i64) -> Result<bool> {
        let tx = self.conn_mut().transaction()?;
        let category_id: Option<i64> = match tx.query_row(
            "SELECT category_id FROM posts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        ) {
            Ok(cid) => Some(cid),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(StoreError::Sqlite(e)),
        };

        let Some(category_id) = category_id else {
            return Ok(false);
        };

        tx.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        tx.execute(
            "UPDATE categories SET post_count = post_count - 1 WHERE id = ?1",
            params![category_id],
        )?;
        tx.commit()?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Map a `rusqlite::Row` to a [`Post`].
fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let status_code: i64 = row.get(14)?;
    let status = PostStatus::from_code(status_code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            14,
            rusqlite::types::Type::Integer,
            format!("invalid status code {status_code}").into(),
        )
    })?;

    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        summary: row.get(4)?,
        category_id: row.get(5)?,
        category_name: row.get(6)?,
        cover_image: row.get(7)?,
        view_count: row.get(8)?,
        like_count: row.get(9)?,
        collect_count: row.get(10)?,
        comment_count: row.get(11)?,
        is_pinned: row.get(12)?,
        is_essence: row.get(13)?,
        status,
        create_time: parse_ts(15, &row.get::<_, String>(15)?)?,
        update_time: parse_ts(16, &row.get::<_, String>(16)?)?,
    })
}

/// Map a joined row (post columns + username + avatar_url).
fn row_to_post_with_author(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostWithAuthor> {
    Ok(PostWithAuthor {
        post: row_to_post(row)?,
        username: row.get(17)?,
        avatar_url: row.get(18)?,
    })
}

// Keep the test fixtures usable from sibling modules' tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::{NewCategory, NewUser};
    use agora_core::Role;

    pub fn seed_user(db: &Database, name: &str) -> i64 {
        db.create_user(&NewUser {
            username: name.into(),
            role: Role::Member,
            avatar_url: None,
        })
        .unwrap()
        .id
    }

    pub fn seed_category(db: &Database, name: &str) -> i64 {
        db.create_category(&NewCategory {
            name: name.into(),
            description: String::new(),
            icon: None,
            sort_order: 0,
        })
        .unwrap()
        .id
    }

    pub fn new_post(author_id: i64, category_id: i64, title: &str, status: PostStatus) -> NewPost {
        NewPost {
            author_id,
            title: title.into(),
            content: format!("{title} body"),
            summary: format!("{title} summary"),
            category_id,
            category_name: "general".into(),
            cover_image: None,
            status,
        }
    }
}
