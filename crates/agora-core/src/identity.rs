//! Caller identity.
//!
//! Every core operation takes the caller as an explicit [`Viewer`]
//! parameter.  There is no ambient "current user": resolving a request
//! into a `Viewer` is the job of the HTTP layer (or a test), and from
//! that point on the policy code is a pure function of its arguments.

use serde::{Deserialize, Serialize};

/// Role of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    /// May moderate any post and manage categories and users.
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    /// Parse the persisted role string.  Unknown strings are `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Role::Member),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolved caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// No authenticated caller.
    Guest,
    /// An authenticated user.  `banned` is the target's current ban flag
    /// as resolved by the identity layer; services refuse mutations from
    /// banned callers.
    User { id: i64, role: Role, banned: bool },
}

impl Viewer {
    /// Convenience constructor for an ordinary member in good standing.
    pub fn member(id: i64) -> Self {
        Viewer::User {
            id,
            role: Role::Member,
            banned: false,
        }
    }

    /// Convenience constructor for an admin.
    pub fn admin(id: i64) -> Self {
        Viewer::User {
            id,
            role: Role::Admin,
            banned: false,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Viewer::Guest => None,
            Viewer::User { id, .. } => Some(*id),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Viewer::User {
                role: Role::Admin,
                ..
            }
        )
    }

    pub fn is_banned(&self) -> bool {
        matches!(self, Viewer::User { banned: true, .. })
    }

    pub fn is_author_of(&self, author_id: i64) -> bool {
        self.user_id() == Some(author_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        assert_eq!(Role::parse("member"), Some(Role::Member));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse(Role::Admin.as_str()), Some(Role::Admin));
    }

    #[test]
    fn viewer_helpers() {
        let guest = Viewer::Guest;
        assert_eq!(guest.user_id(), None);
        assert!(!guest.is_admin());
        assert!(!guest.is_author_of(1));

        let author = Viewer::member(7);
        assert!(author.is_author_of(7));
        assert!(!author.is_author_of(8));
        assert!(!author.is_banned());

        let admin = Viewer::admin(1);
        assert!(admin.is_admin());
    }
}
