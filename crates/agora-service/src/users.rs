//! User administration.
//!
//! Accounts, credentials, and sessions belong to the auth stack; the
//! engine only provisions rows and flips ban state, because roles and
//! bans feed the visibility policy and the listing gates.

use agora_core::Viewer;
use agora_store::{NewUser, StoreError};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{Result, ServiceError};
use crate::views::UserView;
use crate::{lock, SharedDb};

#[derive(Clone)]
pub struct UserService {
    db: SharedDb,
}

impl UserService {
    pub fn new(db: SharedDb) -> Self {
        Self { db }
    }

    /// Provision a user.  Admin only; usernames are unique.
    pub fn create(&self, viewer: &Viewer, new: NewUser) -> Result<UserView> {
        require_admin(viewer)?;

        let db = lock(&self.db)?;
        if db.find_user_by_username(&new.username)?.is_some() {
            return Err(ServiceError::UsernameExists(new.username));
        }

        let user = db.create_user(&new)?;
        info!(user_id = user.id, username = %user.username, "user provisioned");
        Ok(user.into())
    }

    /// Fetch a user's public profile.
    pub fn get(&self, user_id: i64) -> Result<UserView> {
        let db = lock(&self.db)?;
        let user = db.get_user(user_id).map_err(user_not_found)?;
        Ok(user.into())
    }

    /// Ban a user.  Admin only.
    pub fn ban(
        &self,
        viewer: &Viewer,
        user_id: i64,
        reason: Option<String>,
        until: Option<DateTime<Utc>>,
    ) -> Result<()> {
        require_admin(viewer)?;

        let db = lock(&self.db)?;
        if !db.set_user_banned(user_id, true, reason.as_deref(), until)? {
            return Err(ServiceError::UserNotFound);
        }
        info!(user_id, "user banned");
        Ok(())
    }

    /// Lift a ban.  Admin only.
    pub fn unban(&self, viewer: &Viewer, user_id: i64) -> Result<()> {
        require_admin(viewer)?;

        let db = lock(&self.db)?;
        if !db.set_user_banned(user_id, false, None, None)? {
            return Err(ServiceError::UserNotFound);
        }
        info!(user_id, "user unbanned");
        Ok(())
    }
}

pub(crate) fn require_admin(viewer: &Viewer) -> Result<()> {
    match viewer {
        Viewer::Guest => Err(ServiceError::Unauthorized),
        _ if viewer.is_admin() => Ok(()),
        _ => Err(ServiceError::PermissionDenied),
    }
}

fn user_not_found(e: StoreError) -> ServiceError {
    match e {
        StoreError::NotFound => ServiceError::UserNotFound,
        other => ServiceError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_db;
    use agora_core::Role;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.into(),
            role: Role::Member,
            avatar_url: None,
        }
    }

    #[test]
    fn create_requires_admin() {
        let svc = UserService::new(test_db());
        assert!(matches!(
            svc.create(&Viewer::Guest, new_user("a")),
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            svc.create(&Viewer::member(1), new_user("a")),
            Err(ServiceError::PermissionDenied)
        ));
        assert!(svc.create(&Viewer::admin(1), new_user("a")).is_ok());
    }

    #[test]
    fn duplicate_username_rejected() {
        let svc = UserService::new(test_db());
        let admin = Viewer::admin(1);
        svc.create(&admin, new_user("alice")).unwrap();
        assert!(matches!(
            svc.create(&admin, new_user("alice")),
            Err(ServiceError::UsernameExists(_))
        ));
    }

    #[test]
    fn ban_and_unban() {
        let svc = UserService::new(test_db());
        let admin = Viewer::admin(1);
        let user = svc.create(&admin, new_user("bob")).unwrap();

        svc.ban(&admin, user.id, Some("spam".into()), None).unwrap();
        assert!(svc.get(user.id).unwrap().is_banned);

        svc.unban(&admin, user.id).unwrap();
        assert!(!svc.get(user.id).unwrap().is_banned);

        assert!(matches!(
            svc.ban(&admin, 999, None, None),
            Err(ServiceError::UserNotFound)
        ));
    }
}
