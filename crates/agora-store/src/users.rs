//! CRUD operations for [`User`] records.
//!
//! Users are owned by the auth stack; the forum core only provisions
//! rows, reads roles/ban state, and flips the ban flag.

use agora_core::Role;
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewUser, User};

impl Database {
    /// Insert a new user and return the stored row.
    pub fn create_user(&self, new: &NewUser) -> Result<User> {
        let now = Utc::now();
        self.conn().execute(
            "INSERT INTO users (username, role, avatar_url, create_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                new.username,
                new.role.as_str(),
                new.avatar_url,
                now.to_rfc3339(),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        self.get_user(id)
    }

    /// Fetch a single user by id.
    pub fn get_user(&self, id: i64) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, username, role, avatar_url, is_banned, ban_reason, ban_until, create_time
                 FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Fetch a single user by unique username.
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.conn().query_row(
            "SELECT id, username, role, avatar_url, is_banned, ban_reason, ban_until, create_time
             FROM users WHERE username = ?1",
            params![username],
            row_to_user,
        ) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Set or clear a user's ban.  Returns `true` if a row was updated.
    pub fn set_user_banned(
        &self,
        id: i64,
        banned: bool,
        reason: Option<&str>,
        until: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET is_banned = ?2, ban_reason = ?3, ban_until = ?4 WHERE id = ?1",
            params![id, banned, reason, until.map(|t| t.to_rfc3339())],
        )?;
        Ok(affected > 0)
    }
}

fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role_str: String = row.get(2)?;
    let role = Role::parse(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown role {role_str:?}").into(),
        )
    })?;

    let ban_until: Option<String> = row.get(6)?;
    let ban_until = ban_until
        .map(|s| parse_ts(6, &s))
        .transpose()?;

    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        role,
        avatar_url: row.get(3)?,
        is_banned: row.get(4)?,
        ban_reason: row.get(5)?,
        ban_until,
        create_time: parse_ts(7, &row.get::<_, String>(7)?)?,
    })
}

fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_fetch_user() {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .create_user(&NewUser {
                username: "alice".into(),
                role: Role::Member,
                avatar_url: None,
            })
            .unwrap();

        assert_eq!(db.get_user(user.id).unwrap(), user);
        assert_eq!(
            db.find_user_by_username("alice").unwrap().as_ref(),
            Some(&user)
        );
        assert!(db.find_user_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn ban_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .create_user(&NewUser {
                username: "mallory".into(),
                role: Role::Member,
                avatar_url: None,
            })
            .unwrap();

        assert!(db.set_user_banned(user.id, true, Some("spam"), None).unwrap());
        let banned = db.get_user(user.id).unwrap();
        assert!(banned.is_banned);
        assert_eq!(banned.ban_reason.as_deref(), Some("spam"));

        assert!(db.set_user_banned(user.id, false, None, None).unwrap());
        assert!(!db.get_user(user.id).unwrap().is_banned);

        assert!(!db.set_user_banned(999, true, None, None).unwrap());
    }
}
