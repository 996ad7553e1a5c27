//! CRUD operations for [`Comment`] records.
//!
//! Creating or deleting a comment maintains the parent post's
//! `comment_count` in the same transaction.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Comment;

impl Database {
    /// Insert a comment and bump the post's comment counter, in one
    /// transaction.  Returns the stored row.
    pub fn create_comment(&mut self, post_id: i64, author_id: i64, content: &str) -> Result<Comment> {
        let now = Utc::now().to_rfc3339();

        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "INSERT INTO comments (post_id, author_id, content, create_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![post_id, author_id, content, now],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE posts SET comment_count = comment_count + 1 WHERE id = ?1",
            params![post_id],
        )?;
        tx.commit()?;

        self.get_comment(id)
    }

    /// Fetch a single comment by id.
    pub fn get_comment(&self, id: i64) -> Result<Comment> {
        self.conn()
            .query_row(
                "SELECT id, post_id, author_id, content, create_time
                 FROM comments WHERE id = ?1",
                params![id],
                row_to_comment,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// One offset page of a post's comments in conversation order.
    /// Returns `(total, items)`.
    pub fn page_comments_for_post(
        &self,
        post_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<(u64, Vec<Comment>)> {
        let total: u64 = self.conn().query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn().prepare(
            "SELECT id, post_id, author_id, content, create_time
             FROM comments
             WHERE post_id = ?1
             ORDER BY create_time ASC, id ASC
             LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![post_id, limit, offset], row_to_comment)?;
        let items = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;
        Ok((total, items))
    }

    /// Delete a comment and drop the post's comment counter, in one
    /// transaction.  Returns `true` if a row was deleted.
    pub fn delete_comment(&mut self, id: i64) -> Result<bool> {
        let tx = self.conn_mut().transaction()?;
        let post_id: Option<i64> = match tx.query_row(
            "SELECT post_id FROM comments WHERE id = ?1",
            params![id],
            |row| row.get(0),
        ) {
            Ok(pid) => Some(pid),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(StoreError::Sqlite(e)),
        };

        let Some(post_id) = post_id else {
            return Ok(false);
        };

        tx.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        tx.execute(
            "UPDATE posts SET comment_count = comment_count - 1 WHERE id = ?1",
            params![post_id],
        )?;
        tx.commit()?;
        Ok(true)
    }
}

/// Map a `rusqlite::Row` to a [`Comment`].
fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let created_str: String = row.get(4)?;
    let create_time: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        create_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::fixtures::{new_post, seed_category, seed_user};
    use agora_core::PostStatus;

    #[test]
    fn comment_lifecycle_maintains_post_counter() {
        let mut db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "alice");
        let cat = seed_category(&db, "general");
        let post = db
            .create_post(&new_post(author, cat, "hello", PostStatus::Published))
            .unwrap();

        let c1 = db.create_comment(post.id, author, "first").unwrap();
        let c2 = db.create_comment(post.id, author, "second").unwrap();
        assert_eq!(db.get_post(post.id).unwrap().comment_count, 2);

        let (total, items) = db.page_comments_for_post(post.id, 10, 0).unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].id, c1.id); // conversation order
        assert_eq!(items[1].id, c2.id);

        assert!(db.delete_comment(c1.id).unwrap());
        assert_eq!(db.get_post(post.id).unwrap().comment_count, 1);

        assert!(!db.delete_comment(c1.id).unwrap());
        assert_eq!(db.get_post(post.id).unwrap().comment_count, 1);
    }

    #[test]
    fn deleting_post_cascades_comments() {
        let mut db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "alice");
        let cat = seed_category(&db, "general");
        let post = db
            .create_post(&new_post(author, cat, "hello", PostStatus::Published))
            .unwrap();
        let comment = db.create_comment(post.id, author, "orphan-to-be").unwrap();

        assert!(db.hard_delete_post(post.id).unwrap());
        assert!(matches!(
            db.get_comment(comment.id),
            Err(StoreError::NotFound)
        ));
    }
}
