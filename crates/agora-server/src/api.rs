//! REST API (axum): route table, request DTOs, and handlers.
//!
//! Handlers are deliberately thin: resolve the caller, hand off to the
//! service layer, let [`ApiError`] translate failures.  Anything under
//! `/api/admin` is still re-checked in the services: the route prefix
//! is organization, not enforcement.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use agora_core::{CursorRequest, PageRequest, PageResult, Role};
use agora_service::categories::{CategoryPatch, CategoryService};
use agora_service::comments::CommentService;
use agora_service::posts::{CreatePost, PostPatch, PostService};
use agora_service::users::UserService;
use agora_service::views::{
    CategoryAdminView, CategoryView, CommentView, PostDetail, PostSummary, UserView,
};
use agora_service::SharedDb;
use agora_store::{NewCategory, NewUser};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::identity::resolve_viewer;

#[derive(Clone)]
pub struct AppState {
    pub db: SharedDb,
    pub posts: PostService,
    pub categories: CategoryService,
    pub comments: CommentService,
    pub users: UserService,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        // Posts
        .route("/api/posts", post(create_post).get(page_published))
        .route("/api/posts/feed", get(feed))
        .route(
            "/api/posts/:id",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route(
            "/api/posts/:id/comments",
            post(create_comment).get(page_comments),
        )
        .route("/api/posts/user/:user_id", get(page_posts_by_user))
        .route("/api/comments/:id", delete(delete_comment))
        // Categories (public)
        .route("/api/categories", get(list_categories))
        .route("/api/categories/:id", get(get_category))
        // Moderation & administration
        .route("/api/admin/posts/:id/status", put(set_post_status))
        .route(
            "/api/admin/categories",
            post(create_category).get(page_categories_admin),
        )
        .route(
            "/api/admin/categories/:id",
            get(get_category_admin)
                .patch(update_category)
                .delete(delete_category),
        )
        .route("/api/admin/categories/:id/enable", put(enable_category))
        .route("/api/admin/categories/:id/disable", put(disable_category))
        .route(
            "/api/admin/categories/:id/consistency",
            get(category_consistency),
        )
        .route("/api/admin/users", post(create_user))
        .route("/api/admin/users/:id/ban", put(ban_user))
        .route("/api/admin/users/:id/unban", put(unban_user))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Meta
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    moderation_required: bool,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        moderation_required: state.config.moderation_required,
    })
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CreatePostRequest {
    title: String,
    content: String,
    summary: String,
    category_id: i64,
    cover_image: Option<String>,
}

async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePostRequest>,
) -> Result<Json<PostDetail>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    let detail = state.posts.create(
        &viewer,
        CreatePost {
            title: req.title,
            content: req.content,
            summary: req.summary,
            category_id: req.category_id,
            cover_image: req.cover_image,
        },
    )?;
    Ok(Json(detail))
}

#[derive(Deserialize)]
struct UpdatePostRequest {
    title: Option<String>,
    content: Option<String>,
    summary: Option<String>,
    cover_image: Option<String>,
    category_id: Option<i64>,
}

async fn update_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<PostDetail>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    let detail = state.posts.update(
        &viewer,
        id,
        PostPatch {
            title: req.title,
            content: req.content,
            summary: req.summary,
            cover_image: req.cover_image,
            category_id: req.category_id,
        },
    )?;
    Ok(Json(detail))
}

/// Two-tier delete: admins remove the row, authors soft-delete.
async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    if viewer.is_admin() {
        state.posts.hard_delete(&viewer, id)?;
    } else {
        state.posts.soft_delete(&viewer, id)?;
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<PostDetail>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    Ok(Json(state.posts.get(&viewer, id)?))
}

async fn page_published(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResult<PostSummary>>, ApiError> {
    Ok(Json(state.posts.page_published(page)?))
}

async fn page_posts_by_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResult<PostSummary>>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    Ok(Json(state.posts.page_by_user(&viewer, user_id, page)?))
}

async fn feed(
    State(state): State<AppState>,
    Query(cursor): Query<CursorRequest>,
) -> Result<Json<Vec<PostSummary>>, ApiError> {
    Ok(Json(state.posts.feed(cursor)?))
}

#[derive(Deserialize)]
struct SetStatusRequest {
    status: i64,
}

async fn set_post_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    state.posts.set_status(&viewer, id, req.status)?;
    Ok(Json(serde_json::json!({ "status": req.status })))
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CreateCommentRequest {
    content: String,
}

async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<i64>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<Json<CommentView>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    Ok(Json(state.comments.create(&viewer, post_id, &req.content)?))
}

async fn page_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResult<CommentView>>, ApiError> {
    Ok(Json(state.comments.page_for_post(post_id, page)?))
}

async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    state.comments.delete(&viewer, id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryView>>, ApiError> {
    Ok(Json(state.categories.list()?))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryView>, ApiError> {
    Ok(Json(state.categories.get(id)?))
}

#[derive(Deserialize)]
struct CreateCategoryRequest {
    name: String,
    #[serde(default)]
    description: String,
    icon: Option<String>,
    #[serde(default)]
    sort_order: i64,
}

async fn create_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Json<CategoryAdminView>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    let view = state.categories.create(
        &viewer,
        NewCategory {
            name: req.name,
            description: req.description,
            icon: req.icon,
            sort_order: req.sort_order,
        },
    )?;
    Ok(Json(view))
}

#[derive(Deserialize)]
struct UpdateCategoryRequest {
    name: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    sort_order: Option<i64>,
}

async fn update_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryAdminView>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    let view = state.categories.update(
        &viewer,
        id,
        CategoryPatch {
            name: req.name,
            description: req.description,
            icon: req.icon,
            sort_order: req.sort_order,
        },
    )?;
    Ok(Json(view))
}

async fn delete_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    state.categories.delete(&viewer, id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn enable_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<CategoryAdminView>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    Ok(Json(state.categories.enable(&viewer, id)?))
}

async fn disable_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<CategoryAdminView>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    Ok(Json(state.categories.disable(&viewer, id)?))
}

async fn get_category_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<CategoryAdminView>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    Ok(Json(state.categories.get_for_admin(&viewer, id)?))
}

async fn page_categories_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResult<CategoryAdminView>>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    Ok(Json(state.categories.page_for_admin(&viewer, page)?))
}

#[derive(Serialize)]
struct ConsistencyResponse {
    cached: i64,
    actual: i64,
    consistent: bool,
}

async fn category_consistency(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ConsistencyResponse>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    let (cached, actual) = state.categories.verify_consistency(&viewer, id)?;
    Ok(Json(ConsistencyResponse {
        cached,
        actual,
        consistent: cached == actual,
    }))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CreateUserRequest {
    username: String,
    #[serde(default = "default_role")]
    role: Role,
    avatar_url: Option<String>,
}

fn default_role() -> Role {
    Role::Member
}

async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<UserView>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    let view = state.users.create(
        &viewer,
        NewUser {
            username: req.username,
            role: req.role,
            avatar_url: req.avatar_url,
        },
    )?;
    Ok(Json(view))
}

#[derive(Deserialize, Default)]
struct BanRequest {
    reason: Option<String>,
    until: Option<DateTime<Utc>>,
}

async fn ban_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<BanRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    state.users.ban(&viewer, id, req.reason, req.until)?;
    Ok(Json(serde_json::json!({ "banned": true })))
}

async fn unban_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let viewer = resolve_viewer(&headers, &state.db);
    state.users.unban(&viewer, id)?;
    Ok(Json(serde_json::json!({ "banned": false })))
}

// ---------------------------------------------------------------------------
// Serve
// ---------------------------------------------------------------------------

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
