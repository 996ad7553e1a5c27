//! Category management and the post-count invariant.
//!
//! The cached `post_count` is maintained incrementally by the post
//! operations; this service owns the one moment the cache is checked
//! against reality: the deletion gate.  The check is best-effort by
//! design: a post created concurrently after the check slips through,
//! and the foreign key on `posts.category_id` is the backstop.

use agora_core::{PageRequest, PageResult, Viewer, DEFAULT_PAGE_SIZE};
use agora_store::{NewCategory, StoreError};
use tracing::{info, warn};

use crate::error::{Result, ServiceError};
use crate::users::require_admin;
use crate::views::{CategoryAdminView, CategoryView};
use crate::{lock, SharedDb};

/// Patch for category mutations; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub sort_order: Option<i64>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.icon.is_none()
            && self.sort_order.is_none()
    }
}

#[derive(Clone)]
pub struct CategoryService {
    db: SharedDb,
}

impl CategoryService {
    pub fn new(db: SharedDb) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // Admin mutations
    // ------------------------------------------------------------------

    /// Create a category.  Admin only; names are unique.
    pub fn create(&self, viewer: &Viewer, new: NewCategory) -> Result<CategoryAdminView> {
        require_admin(viewer)?;

        let db = lock(&self.db)?;
        if db.find_category_by_name(&new.name)?.is_some() {
            return Err(ServiceError::CategoryNameExists(new.name));
        }

        let category = db.create_category(&new)?;
        info!(category_id = category.id, name = %category.name, "category created");
        Ok(category.into())
    }

    /// Patch name/description/icon/sort weight.  Admin only.  The name
    /// collision check only runs when the name actually changes.
    pub fn update(
        &self,
        viewer: &Viewer,
        id: i64,
        patch: CategoryPatch,
    ) -> Result<CategoryAdminView> {
        require_admin(viewer)?;
        if patch.is_empty() {
            return Err(ServiceError::EmptyPatch);
        }

        let db = lock(&self.db)?;
        let current = db.get_category(id).map_err(category_not_found)?;

        if let Some(ref new_name) = patch.name {
            if *new_name != current.name && db.find_category_by_name(new_name)?.is_some() {
                return Err(ServiceError::CategoryNameExists(new_name.clone()));
            }
        }

        let name = patch.name.unwrap_or(current.name);
        let description = patch.description.unwrap_or(current.description);
        let icon = patch.icon.or(current.icon);
        db.update_category_info(id, &name, &description, icon.as_deref())?;

        if let Some(sort_order) = patch.sort_order {
            db.set_category_sort_order(id, sort_order)?;
        }

        let category = db.get_category(id).map_err(category_not_found)?;
        Ok(category.into())
    }

    /// Re-open a category for new posts.  Admin only.
    pub fn enable(&self, viewer: &Viewer, id: i64) -> Result<CategoryAdminView> {
        require_admin(viewer)?;
        let db = lock(&self.db)?;
        if !db.set_category_active(id, true)? {
            return Err(ServiceError::CategoryNotFound);
        }
        info!(category_id = id, "category enabled");
        Ok(db.get_category(id).map_err(category_not_found)?.into())
    }

    /// Hide a category from listings and refuse new posts.  Admin only.
    pub fn disable(&self, viewer: &Viewer, id: i64) -> Result<CategoryAdminView> {
        require_admin(viewer)?;
        let db = lock(&self.db)?;
        if !db.set_category_active(id, false)? {
            return Err(ServiceError::CategoryNotFound);
        }
        info!(category_id = id, "category disabled");
        Ok(db.get_category(id).map_err(category_not_found)?.into())
    }

    /// Delete a category.  Admin only, and only when the cached counter
    /// and the actual post count agree *and* are both zero.
    pub fn delete(&self, viewer: &Viewer, id: i64) -> Result<()> {
        require_admin(viewer)?;

        let db = lock(&self.db)?;
        // Existence first, so an unknown id is not reported as a count
        // problem.
        db.get_category(id).map_err(category_not_found)?;

        let cached = db.cached_post_count(id)?;
        let actual = db.count_posts_in_category(id)?;

        if cached != actual {
            warn!(
                category_id = id,
                cached, actual, "post count cache disagrees with row count"
            );
            return Err(ServiceError::CountMismatch { cached, actual });
        }
        if actual > 0 {
            return Err(ServiceError::CategoryHasPosts(actual));
        }

        if !db.delete_category(id)? {
            return Err(ServiceError::CategoryNotFound);
        }
        info!(category_id = id, "category deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// `(cached, actual)` post counts for a category.  Admin tooling.
    pub fn verify_consistency(&self, viewer: &Viewer, id: i64) -> Result<(i64, i64)> {
        require_admin(viewer)?;
        let db = lock(&self.db)?;
        db.get_category(id).map_err(category_not_found)?;
        Ok((db.cached_post_count(id)?, db.count_posts_in_category(id)?))
    }

    /// Public lookup: active categories only.
    pub fn get(&self, id: i64) -> Result<CategoryView> {
        let db = lock(&self.db)?;
        let category = db.get_active_category(id).map_err(category_not_found)?;
        Ok(category.into())
    }

    /// Admin lookup: disabled categories included.
    pub fn get_for_admin(&self, viewer: &Viewer, id: i64) -> Result<CategoryAdminView> {
        require_admin(viewer)?;
        let db = lock(&self.db)?;
        let category = db.get_category(id).map_err(category_not_found)?;
        Ok(category.into())
    }

    /// Public listing: active categories, highest sort weight first.
    pub fn list(&self) -> Result<Vec<CategoryView>> {
        let db = lock(&self.db)?;
        let categories = db.list_active_categories()?;
        Ok(categories.into_iter().map(Into::into).collect())
    }

    /// Admin listing: everything, same order.
    pub fn list_for_admin(&self, viewer: &Viewer) -> Result<Vec<CategoryAdminView>> {
        require_admin(viewer)?;
        let db = lock(&self.db)?;
        let categories = db.list_all_categories()?;
        Ok(categories.into_iter().map(Into::into).collect())
    }

    /// Paged admin listing.
    pub fn page_for_admin(
        &self,
        viewer: &Viewer,
        page: PageRequest,
    ) -> Result<PageResult<CategoryAdminView>> {
        require_admin(viewer)?;
        let query = page.normalize(DEFAULT_PAGE_SIZE);
        let db = lock(&self.db)?;
        let (total, items) = db.page_categories(query.limit(), query.offset())?;
        Ok(PageResult {
            total,
            items: items.into_iter().map(Into::into).collect(),
        })
    }
}

fn category_not_found(e: StoreError) -> ServiceError {
    match e {
        StoreError::NotFound => ServiceError::CategoryNotFound,
        other => ServiceError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_db;
    use crate::SharedDb;

    fn new_cat(name: &str) -> NewCategory {
        NewCategory {
            name: name.into(),
            description: format!("{name} talk"),
            icon: None,
            sort_order: 0,
        }
    }

    fn service() -> (CategoryService, SharedDb) {
        let db = test_db();
        (CategoryService::new(db.clone()), db)
    }

    #[test]
    fn create_is_admin_gated_and_unique() {
        let (svc, _db) = service();
        let admin = Viewer::admin(1);

        assert!(matches!(
            svc.create(&Viewer::member(2), new_cat("general")),
            Err(ServiceError::PermissionDenied)
        ));

        svc.create(&admin, new_cat("general")).unwrap();
        assert!(matches!(
            svc.create(&admin, new_cat("general")),
            Err(ServiceError::CategoryNameExists(_))
        ));
    }

    #[test]
    fn update_checks_name_collision_only_on_change() {
        let (svc, _db) = service();
        let admin = Viewer::admin(1);
        let cat = svc.create(&admin, new_cat("general")).unwrap();
        svc.create(&admin, new_cat("taken")).unwrap();

        // Re-sending the current name is not a collision.
        let same = svc
            .update(
                &admin,
                cat.id,
                CategoryPatch {
                    name: Some("general".into()),
                    description: Some("updated".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(same.description, "updated");

        assert!(matches!(
            svc.update(
                &admin,
                cat.id,
                CategoryPatch {
                    name: Some("taken".into()),
                    ..Default::default()
                }
            ),
            Err(ServiceError::CategoryNameExists(_))
        ));

        assert!(matches!(
            svc.update(&admin, cat.id, CategoryPatch::default()),
            Err(ServiceError::EmptyPatch)
        ));
    }

    #[test]
    fn disabled_categories_hidden_from_public_reads() {
        let (svc, _db) = service();
        let admin = Viewer::admin(1);
        let cat = svc.create(&admin, new_cat("general")).unwrap();

        svc.disable(&admin, cat.id).unwrap();
        assert!(matches!(svc.get(cat.id), Err(ServiceError::CategoryNotFound)));
        assert!(svc.list().unwrap().is_empty());
        // Still reachable for admins.
        assert!(!svc.get_for_admin(&admin, cat.id).unwrap().is_active);

        svc.enable(&admin, cat.id).unwrap();
        assert!(svc.get(cat.id).is_ok());
    }

    #[test]
    fn delete_empty_category_succeeds() {
        let (svc, _db) = service();
        let admin = Viewer::admin(1);
        let cat = svc.create(&admin, new_cat("general")).unwrap();

        assert_eq!(svc.verify_consistency(&admin, cat.id).unwrap(), (0, 0));
        svc.delete(&admin, cat.id).unwrap();
        assert!(matches!(
            svc.delete(&admin, cat.id),
            Err(ServiceError::CategoryNotFound)
        ));
    }

    #[test]
    fn delete_reports_drift_distinctly_from_has_posts() {
        let (svc, db) = service();
        let admin = Viewer::admin(1);
        let cat = svc.create(&admin, new_cat("general")).unwrap();

        // Drift the cache without touching the posts table.
        lock(&db).unwrap().set_post_count(cat.id, 3).unwrap();
        assert!(matches!(
            svc.delete(&admin, cat.id),
            Err(ServiceError::CountMismatch {
                cached: 3,
                actual: 0
            })
        ));

        // Repair the cache; the category is genuinely empty again.
        lock(&db).unwrap().set_post_count(cat.id, 0).unwrap();
        svc.delete(&admin, cat.id).unwrap();
    }
}
