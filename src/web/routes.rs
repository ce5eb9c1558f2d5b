use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::constants::POSTS_PAGE_SIZE;
use crate::db::{list_posts_page, ping, Comment, Post, PostCursor};
use crate::relay::relay_comment;
use crate::sync::{sync_account_exclusive, SyncOptions};

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health/", get(health))
        .route("/api/sync/", post(sync_posts))
        .route("/api/posts/", get(list_posts))
        .route("/api/posts/:id/comment/", post(create_comment))
}

// ========== Health ==========

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health(State(state): State<AppState>) -> Response {
    match ping(state.db.pool()).await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {e:#}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse { status: "error" }),
            )
                .into_response()
        }
    }
}

// ========== Sync ==========

#[derive(Debug, Serialize)]
struct SyncResponse {
    processed: usize,
}

async fn sync_posts(State(state): State<AppState>) -> Result<Json<SyncResponse>, ApiError> {
    let options = SyncOptions {
        max_pages: state.config.sync_max_pages,
    };

    let processed = sync_account_exclusive(
        &state.sync_locks,
        state.gateway.as_ref(),
        &state.db,
        &state.config.account_id,
        options,
    )
    .await?;

    Ok(Json(SyncResponse { processed }))
}

// ========== Posts ==========

#[derive(Debug, Deserialize)]
pub struct ListPostsParams {
    cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct PostListResponse {
    next: Option<String>,
    results: Vec<Post>,
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<PostListResponse>, ApiError> {
    let after = params
        .cursor
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(PostCursor::decode)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let page = list_posts_page(state.db.pool(), after.as_ref(), POSTS_PAGE_SIZE).await?;

    Ok(Json(PostListResponse {
        next: page.next.map(|c| c.encode()),
        results: page.posts,
    }))
}

// ========== Comments ==========

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    text: Option<String>,
}

async fn create_comment(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let Ok(Path(post_id)) = path else {
        return Err(ApiError::NotFound("post not found".to_string()));
    };
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let text = validate_comment_text(request.text.as_deref(), state.config.comment_max_chars)?;

    let comment = relay_comment(state.gateway.as_ref(), &state.db, post_id, text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Trim surrounding whitespace, then require non-empty text within `max_chars`.
fn validate_comment_text(text: Option<&str>, max_chars: usize) -> Result<&str, ApiError> {
    let Some(text) = text else {
        return Err(ApiError::BadRequest("text is required".to_string()));
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("text may not be blank".to_string()));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ApiError::BadRequest(format!(
            "text may not be longer than {max_chars} characters"
        )));
    }

    Ok(trimmed)
}
