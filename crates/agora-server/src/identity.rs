//! Per-request identity resolution.
//!
//! Authentication (credentials, sessions, tokens) happens upstream; the
//! deployment puts an authenticating reverse proxy in front of this
//! server, and the proxy asserts the caller by injecting `x-user-id`.
//! This module turns that header into a [`Viewer`]: the role and ban
//! state always come from the store, never from the client, so a forged
//! role claim is impossible and a ban takes effect on the next request.
//!
//! Absent, malformed, or unknown ids resolve to [`Viewer::Guest`]: an
//! unknown caller is just a guest, not an error.

use agora_core::Viewer;
use agora_service::SharedDb;
use axum::http::HeaderMap;
use tracing::debug;

/// Header installed by the authenticating proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolve the caller of the current request.
pub fn resolve_viewer(headers: &HeaderMap, db: &SharedDb) -> Viewer {
    let Some(raw) = headers.get(USER_ID_HEADER).and_then(|v| v.to_str().ok()) else {
        return Viewer::Guest;
    };

    let Ok(user_id) = raw.trim().parse::<i64>() else {
        debug!(value = %raw, "unparseable user id header, treating as guest");
        return Viewer::Guest;
    };

    let Ok(guard) = db.lock() else {
        return Viewer::Guest;
    };

    match guard.get_user(user_id) {
        Ok(user) => Viewer::User {
            id: user.id,
            role: user.role,
            banned: user.is_banned,
        },
        Err(_) => {
            debug!(user_id, "unknown user id header, treating as guest");
            Viewer::Guest
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::Role;
    use agora_store::{Database, NewUser};

    fn db_with_user() -> (SharedDb, i64) {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .create_user(&NewUser {
                username: "alice".into(),
                role: Role::Admin,
                avatar_url: None,
            })
            .unwrap();
        (agora_service::shared(db), user.id)
    }

    #[test]
    fn absent_header_is_guest() {
        let (db, _) = db_with_user();
        assert_eq!(resolve_viewer(&HeaderMap::new(), &db), Viewer::Guest);
    }

    #[test]
    fn malformed_and_unknown_ids_are_guests() {
        let (db, _) = db_with_user();

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, "not-a-number".parse().unwrap());
        assert_eq!(resolve_viewer(&headers, &db), Viewer::Guest);

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, "424242".parse().unwrap());
        assert_eq!(resolve_viewer(&headers, &db), Viewer::Guest);
    }

    #[test]
    fn role_and_ban_come_from_the_store() {
        let (db, user_id) = db_with_user();

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, user_id.to_string().parse().unwrap());

        let viewer = resolve_viewer(&headers, &db);
        assert!(viewer.is_admin());
        assert!(!viewer.is_banned());

        db.lock()
            .unwrap()
            .set_user_banned(user_id, true, None, None)
            .unwrap();
        let viewer = resolve_viewer(&headers, &db);
        assert!(viewer.is_banned());
    }
}
