//! Who may see a post, given its lifecycle status and the caller.
//!
//! The whole policy lives in one lookup table instead of being scattered
//! across call sites.  Single-post reads consult [`can_view`]; listings
//! translate the caller into a [`StatusFilter`] *before* querying, so a
//! hidden post never leaves the store in the first place.
//!
//! A caller who fails `can_view` must receive the same not-found outcome
//! as for an id that never existed; the distinction is deliberately not
//! observable from outside (existence probing).

use crate::identity::Viewer;
use crate::status::PostStatus;

/// One row of the visibility table: which audiences may see a post in
/// the given status.
#[derive(Debug, Clone, Copy)]
struct StatusVisibility {
    status: PostStatus,
    guest: bool,
    /// An authenticated member who is not the author.
    member: bool,
    author: bool,
    admin: bool,
}

/// The visibility table.  Drafts are private to their author: admins
/// moderate the submitted queue, not working copies.
const VISIBILITY: [StatusVisibility; 5] = [
    StatusVisibility {
        status: PostStatus::Draft,
        guest: false,
        member: false,
        author: true,
        admin: false,
    },
    StatusVisibility {
        status: PostStatus::PendingReview,
        guest: false,
        member: false,
        author: true,
        admin: true,
    },
    StatusVisibility {
        status: PostStatus::Published,
        guest: true,
        member: true,
        author: true,
        admin: true,
    },
    StatusVisibility {
        status: PostStatus::Rejected,
        guest: false,
        member: false,
        author: true,
        admin: true,
    },
    StatusVisibility {
        status: PostStatus::Deleted,
        guest: false,
        member: false,
        author: false,
        admin: true,
    },
];

/// May `viewer` see a post in `status` written by `author_id`?
///
/// A user holds the union of the columns that apply to them: an admin
/// who wrote the post gets both the author and the admin column.
pub fn can_view(status: PostStatus, author_id: i64, viewer: &Viewer) -> bool {
    let row = &VISIBILITY[status.code() as usize];
    debug_assert_eq!(row.status, status);

    match viewer {
        Viewer::Guest => row.guest,
        Viewer::User { .. } => {
            let is_author = viewer.is_author_of(author_id);
            let is_admin = viewer.is_admin();
            (is_author && row.author)
                || (is_admin && row.admin)
                || (!is_author && !is_admin && row.member)
        }
    }
}

/// Status predicate a listing applies before querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Public feeds and strangers' profiles.
    PublishedOnly,
    /// A user browsing their own posts: everything but the soft-deleted.
    AllExceptDeleted,
    /// Admin listings: no status filter at all.
    All,
}

/// Which [`StatusFilter`] applies when `viewer` lists the posts of
/// `target_author_id`.
pub fn listing_filter(viewer: &Viewer, target_author_id: i64) -> StatusFilter {
    if viewer.is_admin() {
        StatusFilter::All
    } else if viewer.is_author_of(target_author_id) {
        StatusFilter::AllExceptDeleted
    } else {
        StatusFilter::PublishedOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHOR: i64 = 1;

    fn member() -> Viewer {
        Viewer::member(2)
    }

    fn admin() -> Viewer {
        Viewer::admin(3)
    }

    #[test]
    fn published_is_visible_to_everyone() {
        for viewer in [Viewer::Guest, member(), Viewer::member(AUTHOR), admin()] {
            assert!(can_view(PostStatus::Published, AUTHOR, &viewer));
        }
    }

    #[test]
    fn non_published_hidden_from_guests_and_strangers() {
        for status in PostStatus::ALL {
            if status == PostStatus::Published {
                continue;
            }
            assert!(!can_view(status, AUTHOR, &Viewer::Guest), "{status}");
            assert!(!can_view(status, AUTHOR, &member()), "{status}");
        }
    }

    #[test]
    fn author_sees_everything_except_deleted() {
        let author = Viewer::member(AUTHOR);
        assert!(can_view(PostStatus::Draft, AUTHOR, &author));
        assert!(can_view(PostStatus::PendingReview, AUTHOR, &author));
        assert!(can_view(PostStatus::Rejected, AUTHOR, &author));
        assert!(!can_view(PostStatus::Deleted, AUTHOR, &author));
    }

    #[test]
    fn admin_sees_moderation_queue_and_deleted_but_not_drafts() {
        assert!(!can_view(PostStatus::Draft, AUTHOR, &admin()));
        assert!(can_view(PostStatus::PendingReview, AUTHOR, &admin()));
        assert!(can_view(PostStatus::Rejected, AUTHOR, &admin()));
        assert!(can_view(PostStatus::Deleted, AUTHOR, &admin()));
    }

    #[test]
    fn admin_author_holds_both_permissions() {
        let admin_author = Viewer::admin(AUTHOR);
        // Author column grants the draft...
        assert!(can_view(PostStatus::Draft, AUTHOR, &admin_author));
        // ...admin column grants the deleted post.
        assert!(can_view(PostStatus::Deleted, AUTHOR, &admin_author));
    }

    #[test]
    fn listing_filters_by_relationship() {
        assert_eq!(
            listing_filter(&Viewer::Guest, AUTHOR),
            StatusFilter::PublishedOnly
        );
        assert_eq!(listing_filter(&member(), AUTHOR), StatusFilter::PublishedOnly);
        assert_eq!(
            listing_filter(&Viewer::member(AUTHOR), AUTHOR),
            StatusFilter::AllExceptDeleted
        );
        assert_eq!(listing_filter(&admin(), AUTHOR), StatusFilter::All);
    }
}
