//! CRUD operations for [`Category`] records, including the post-count
//! cache.
//!
//! The counter is only ever touched through single arithmetic UPDATE
//! statements (`post_count = post_count + 1`), never read-modify-write
//! in application code, so concurrent post creation cannot lose updates.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Category, NewCategory};

const CATEGORY_COLUMNS: &str =
    "id, name, description, icon, post_count, sort_order, is_active, create_time";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new category (active, zero posts) and return the stored
    /// row.
    pub fn create_category(&self, new: &NewCategory) -> Result<Category> {
        let now = Utc::now();
        self.conn().execute(
            "INSERT INTO categories (name, description, icon, sort_order, create_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.name,
                new.description,
                new.icon,
                new.sort_order,
                now.to_rfc3339(),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        self.get_category(id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single category by id, active or not.
    pub fn get_category(&self, id: i64) -> Result<Category> {
        self.conn()
            .query_row(
                &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
                params![id],
                row_to_category,
            )
            .map_err(not_found)
    }

    /// Fetch a single category by id, only if it is active.
    pub fn get_active_category(&self, id: i64) -> Result<Category> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1 AND is_active = 1"
                ),
                params![id],
                row_to_category,
            )
            .map_err(not_found)
    }

    /// Fetch a category by its unique name (used for duplicate checks).
    pub fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        match self.conn().query_row(
            &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?1"),
            params![name],
            row_to_category,
        ) {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// List active categories, highest sort weight first.
    pub fn list_active_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE is_active = 1
             ORDER BY sort_order DESC, id ASC"
        ))?;
        let rows = stmt.query_map([], row_to_category)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// List all categories including disabled ones (admin view).
    pub fn list_all_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY sort_order DESC, id ASC"
        ))?;
        let rows = stmt.query_map([], row_to_category)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// One offset page over all categories (admin view).  Returns the
    /// page plus the total row count.
    pub fn page_categories(&self, limit: u32, offset: u32) -> Result<(u64, Vec<Category>)> {
        let total: u64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             ORDER BY sort_order DESC, id ASC
             LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![limit, offset], row_to_category)?;
        let items = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;
        Ok((total, items))
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Update name/description/icon.  Returns `true` if a row was
    /// updated.
    pub fn update_category_info(
        &self,
        id: i64,
        name: &str,
        description: &str,
        icon: Option<&str>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE categories SET name = ?2, description = ?3, icon = ?4 WHERE id = ?1",
            params![id, name, description, icon],
        )?;
        Ok(affected > 0)
    }

    /// Update the sort weight.
    pub fn set_category_sort_order(&self, id: i64, sort_order: i64) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE categories SET sort_order = ?2 WHERE id = ?1",
            params![id, sort_order],
        )?;
        Ok(affected > 0)
    }

    /// Enable or disable a category.
    pub fn set_category_active(&self, id: i64, active: bool) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE categories SET is_active = ?2 WHERE id = ?1",
            params![id, active],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Post counter cache
    // ------------------------------------------------------------------

    /// `post_count = post_count + 1`, atomically.
    pub fn increment_post_count(&self, category_id: i64) -> Result<()> {
        self.conn().execute(
            "UPDATE categories SET post_count = post_count + 1 WHERE id = ?1",
            params![category_id],
        )?;
        Ok(())
    }

    /// `post_count = post_count - 1`, atomically.
    pub fn decrement_post_count(&self, category_id: i64) -> Result<()> {
        self.conn().execute(
            "UPDATE categories SET post_count = post_count - 1 WHERE id = ?1",
            params![category_id],
        )?;
        Ok(())
    }

    /// Overwrite the cached count (operator repair tool).
    pub fn set_post_count(&self, category_id: i64, count: i64) -> Result<()> {
        self.conn().execute(
            "UPDATE categories SET post_count = ?2 WHERE id = ?1",
            params![category_id, count],
        )?;
        Ok(())
    }

    /// The cached `post_count` column.
    pub fn cached_post_count(&self, category_id: i64) -> Result<i64> {
        self.conn()
            .query_row(
                "SELECT post_count FROM categories WHERE id = ?1",
                params![category_id],
                |row| row.get(0),
            )
            .map_err(not_found)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a category row.  Callers are responsible for the
    /// emptiness/consistency gate.  Returns `true` if a row was deleted.
    pub fn delete_category(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(affected > 0)
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

/// Map a `rusqlite::Row` to a [`Category`].
fn row_to_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    let created_str: String = row.get(7)?;
    let create_time: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        post_count: row.get(4)?,
        sort_order: row.get(5)?,
        is_active: row.get(6)?,
        create_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_cat(name: &str, sort_order: i64) -> NewCategory {
        NewCategory {
            name: name.into(),
            description: format!("{name} talk"),
            icon: None,
            sort_order,
        }
    }

    #[test]
    fn create_defaults_to_active_and_empty() {
        let db = Database::open_in_memory().unwrap();
        let cat = db.create_category(&new_cat("general", 0)).unwrap();
        assert!(cat.is_active);
        assert_eq!(cat.post_count, 0);
    }

    #[test]
    fn active_listing_sorts_by_weight_then_id() {
        let db = Database::open_in_memory().unwrap();
        db.create_category(&new_cat("low", 1)).unwrap();
        let high = db.create_category(&new_cat("high", 9)).unwrap();
        let tied = db.create_category(&new_cat("tied", 9)).unwrap();
        let off = db.create_category(&new_cat("off", 99)).unwrap();
        db.set_category_active(off.id, false).unwrap();

        let names: Vec<String> = db
            .list_active_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["high", "tied", "low"]);
        // equal weights fall back to insertion order
        assert!(high.id < tied.id);

        // Admin listing still shows the disabled one.
        assert_eq!(db.list_all_categories().unwrap().len(), 4);
    }

    #[test]
    fn counter_arithmetic() {
        let db = Database::open_in_memory().unwrap();
        let cat = db.create_category(&new_cat("general", 0)).unwrap();

        db.increment_post_count(cat.id).unwrap();
        db.increment_post_count(cat.id).unwrap();
        assert_eq!(db.cached_post_count(cat.id).unwrap(), 2);

        db.decrement_post_count(cat.id).unwrap();
        assert_eq!(db.cached_post_count(cat.id).unwrap(), 1);

        db.set_post_count(cat.id, 7).unwrap();
        assert_eq!(db.cached_post_count(cat.id).unwrap(), 7);
    }

    #[test]
    fn name_lookup_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let cat = db.create_category(&new_cat("general", 0)).unwrap();

        assert!(db.find_category_by_name("general").unwrap().is_some());
        assert!(db.find_category_by_name("nope").unwrap().is_none());

        assert!(db.delete_category(cat.id).unwrap());
        assert!(!db.delete_category(cat.id).unwrap());
        assert!(matches!(
            db.get_category(cat.id),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn page_categories_reports_total() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..5 {
            db.create_category(&new_cat(&format!("c{i}"), i)).unwrap();
        }
        let (total, items) = db.page_categories(2, 2).unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.len(), 2);
    }
}
