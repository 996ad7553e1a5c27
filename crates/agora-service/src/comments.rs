//! Comments.
//!
//! No lifecycle machine here: comments are created against an existing
//! post and hard-deleted by their author or an admin.  The parent
//! post's `comment_count` moves with them.

use agora_core::{PageRequest, PageResult, Viewer, DEFAULT_PAGE_SIZE};
use agora_store::StoreError;
use tracing::info;

use crate::error::{Result, ServiceError};
use crate::views::CommentView;
use crate::{lock, SharedDb};

/// Bound inherited from the wire contract.
pub const MAX_COMMENT_LEN: usize = 1_000;

#[derive(Clone)]
pub struct CommentService {
    db: SharedDb,
}

impl CommentService {
    pub fn new(db: SharedDb) -> Self {
        Self { db }
    }

    /// Comment on an existing post.  Requires a logged-in, non-banned
    /// caller and a non-empty, bounded body.
    pub fn create(&self, viewer: &Viewer, post_id: i64, content: &str) -> Result<CommentView> {
        let author_id = viewer.user_id().ok_or(ServiceError::Unauthorized)?;
        if viewer.is_banned() {
            return Err(ServiceError::UserBanned);
        }

        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::Validation("comment must not be empty".into()));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(ServiceError::Validation(format!(
                "comment exceeds {MAX_COMMENT_LEN} characters"
            )));
        }

        let mut db = lock(&self.db)?;
        if !db.post_exists(post_id)? {
            return Err(ServiceError::PostNotFound);
        }

        let comment = db.create_comment(post_id, author_id, content)?;
        info!(comment_id = comment.id, post_id, author_id, "comment created");
        Ok(comment.into())
    }

    /// One offset page of a post's comments, oldest first.
    pub fn page_for_post(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> Result<PageResult<CommentView>> {
        let query = page.normalize(DEFAULT_PAGE_SIZE);

        let db = lock(&self.db)?;
        if !db.post_exists(post_id)? {
            return Err(ServiceError::PostNotFound);
        }

        let (total, items) = db.page_comments_for_post(post_id, query.limit(), query.offset())?;
        Ok(PageResult {
            total,
            items: items.into_iter().map(Into::into).collect(),
        })
    }

    /// Delete a comment.  Author or admin; hard delete.
    pub fn delete(&self, viewer: &Viewer, comment_id: i64) -> Result<()> {
        let caller_id = viewer.user_id().ok_or(ServiceError::Unauthorized)?;
        if viewer.is_banned() {
            return Err(ServiceError::UserBanned);
        }

        let mut db = lock(&self.db)?;
        let comment = db.get_comment(comment_id).map_err(|e| match e {
            StoreError::NotFound => ServiceError::CommentNotFound,
            other => ServiceError::Store(other),
        })?;

        if comment.author_id != caller_id && !viewer.is_admin() {
            return Err(ServiceError::CommentNotAuthor);
        }

        db.delete_comment(comment_id)?;
        info!(comment_id, "comment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::{CreatePost, PostService};
    use crate::testutil::test_db;
    use agora_core::{PostStatus, Role};
    use agora_store::{Database, NewCategory, NewUser};

    fn seed(db: &Database) -> (i64, i64) {
        let user = db
            .create_user(&NewUser {
                username: "alice".into(),
                role: Role::Member,
                avatar_url: None,
            })
            .unwrap();
        let cat = db
            .create_category(&NewCategory {
                name: "general".into(),
                description: String::new(),
                icon: None,
                sort_order: 0,
            })
            .unwrap();
        (user.id, cat.id)
    }

    fn setup() -> (CommentService, Viewer, i64) {
        let shared = test_db();
        let (user_id, cat_id) = seed(&crate::lock(&shared).unwrap());
        let posts = PostService::new(shared.clone(), PostStatus::Published);
        let author = Viewer::member(user_id);
        let post = posts
            .create(
                &author,
                CreatePost {
                    title: "hello".into(),
                    content: "body".into(),
                    summary: "sum".into(),
                    category_id: cat_id,
                    cover_image: None,
                },
            )
            .unwrap();
        (CommentService::new(shared), author, post.id)
    }

    #[test]
    fn create_requires_login_post_and_content() {
        let (svc, author, post_id) = setup();

        assert!(matches!(
            svc.create(&Viewer::Guest, post_id, "hi"),
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            svc.create(&author, 99_999, "hi"),
            Err(ServiceError::PostNotFound)
        ));
        assert!(matches!(
            svc.create(&author, post_id, "   "),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            svc.create(&author, post_id, &"x".repeat(MAX_COMMENT_LEN + 1)),
            Err(ServiceError::Validation(_))
        ));

        assert!(svc.create(&author, post_id, "hi").is_ok());
    }

    #[test]
    fn paging_walks_conversation_order() {
        let (svc, author, post_id) = setup();
        for i in 0..5 {
            svc.create(&author, post_id, &format!("comment {i}")).unwrap();
        }

        let page = svc
            .page_for_post(
                post_id,
                PageRequest {
                    page: Some(2),
                    size: Some(2),
                },
            )
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].content, "comment 2");

        assert!(matches!(
            svc.page_for_post(99_999, PageRequest::default()),
            Err(ServiceError::PostNotFound)
        ));
    }

    #[test]
    fn delete_is_author_or_admin_gated() {
        let (svc, author, post_id) = setup();
        let comment = svc.create(&author, post_id, "mine").unwrap();

        let stranger = Viewer::member(author.user_id().unwrap() + 1);
        assert!(matches!(
            svc.delete(&stranger, comment.id),
            Err(ServiceError::CommentNotAuthor)
        ));

        svc.delete(&author, comment.id).unwrap();
        assert!(matches!(
            svc.delete(&author, comment.id),
            Err(ServiceError::CommentNotFound)
        ));

        // Admin can remove anyone's comment.
        let other = svc.create(&author, post_id, "again").unwrap();
        svc.delete(&Viewer::admin(999), other.id).unwrap();
    }
}
