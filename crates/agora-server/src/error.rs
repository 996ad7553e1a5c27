//! HTTP mapping for service errors.
//!
//! Every error leaves as JSON `{ "code": "...", "error": "..." }`, where
//! `code` is the stable machine code from [`ServiceError::code`].
//! Internal failures are reported without detail.

use agora_service::ServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Newtype so axum handlers can `?` service results straight through.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ServiceError::PostNotFound
            | ServiceError::CategoryNotFound
            | ServiceError::UserNotFound
            | ServiceError::CommentNotFound => StatusCode::NOT_FOUND,

            ServiceError::NotAuthor
            | ServiceError::CommentNotAuthor
            | ServiceError::PermissionDenied
            | ServiceError::UserBanned => StatusCode::FORBIDDEN,

            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,

            ServiceError::CategoryNameExists(_)
            | ServiceError::CategoryHasPosts(_)
            | ServiceError::UsernameExists(_) => StatusCode::CONFLICT,

            ServiceError::EmptyPatch
            | ServiceError::InvalidStatus(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            // Drift is an operator problem, not a client one.
            ServiceError::CountMismatch { .. }
            | ServiceError::LockPoisoned
            | ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self.0 {
            ServiceError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                "Internal server error".to_string()
            }
            ServiceError::LockPoisoned => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "code": self.0.code(),
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ServiceError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn hidden_and_missing_posts_share_a_response() {
        // Camouflage must hold at the HTTP boundary too.
        assert_eq!(status_of(ServiceError::PostNotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn mutation_ownership_is_a_distinct_forbidden() {
        assert_eq!(status_of(ServiceError::NotAuthor), StatusCode::FORBIDDEN);
    }

    #[test]
    fn drift_is_not_conflated_with_has_posts() {
        assert_eq!(
            status_of(ServiceError::CategoryHasPosts(2)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ServiceError::CountMismatch {
                cached: 2,
                actual: 1
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
