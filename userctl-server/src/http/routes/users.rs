//! User endpoints
//!
//! Each handler validates first, then runs its statements in order. The
//! list and the two writes are two-step: count then fetch, and email
//! check then write. Neither pair runs inside a transaction.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::db::User;
use crate::http::error::ApiError;
use crate::http::extractors::{ListQuery, ValidUserDraft, ValidUserId};
use crate::http::server::AppState;
use crate::models::{PageInfo, Paginated};

/// List response
#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub pagination: PageInfo,
}

/// Create/update response
#[derive(Serialize)]
pub struct UserMessageResponse {
    pub message: String,
    pub user: User,
}

/// Delete response
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /users - paginated list with optional search
async fn list_users(
    State(state): State<Arc<AppState>>,
    query: ListQuery,
) -> Result<Json<UserListResponse>, ApiError> {
    let search = query.search.as_deref();
    let total = state.store.count(search).await?;
    let users = state.store.list(search, query.pagination).await?;

    let page = Paginated {
        items: users,
        total,
        page: query.pagination.page,
        limit: query.pagination.limit,
    };
    let pagination = page.info();

    Ok(Json(UserListResponse {
        users: page.items,
        pagination,
    }))
}

/// GET /users/{id} - get a single user
async fn get_user(
    State(state): State<Arc<AppState>>,
    ValidUserId(id): ValidUserId,
) -> Result<Json<User>, ApiError> {
    let user = state.store.get(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

/// POST /users - create a user with a unique email
async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidUserDraft(draft): ValidUserDraft,
) -> Result<(StatusCode, Json<UserMessageResponse>), ApiError> {
    if state.store.email_taken(draft.email(), None).await? {
        return Err(ApiError::Conflict);
    }

    let user = state.store.insert(&draft).await?;
    tracing::info!(id = user.id, "user created");

    Ok((
        StatusCode::CREATED,
        Json(UserMessageResponse {
            message: format!("User added with ID: {}", user.id),
            user,
        }),
    ))
}

/// PUT /users/{id} - replace name and email
async fn update_user(
    State(state): State<Arc<AppState>>,
    ValidUserId(id): ValidUserId,
    ValidUserDraft(draft): ValidUserDraft,
) -> Result<Json<UserMessageResponse>, ApiError> {
    if state.store.email_taken(draft.email(), Some(id)).await? {
        return Err(ApiError::Conflict);
    }

    // Existence is only known after the UPDATE
    let user = state
        .store
        .update(id, &draft)
        .await?
        .ok_or(ApiError::NotFound)?;
    tracing::info!(%id, "user updated");

    Ok(Json(UserMessageResponse {
        message: format!("User modified with ID: {}", id),
        user,
    }))
}

/// DELETE /users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    ValidUserId(id): ValidUserId,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.store.delete(id).await? == 0 {
        return Err(ApiError::NotFound);
    }
    tracing::info!(%id, "user deleted");

    Ok(Json(MessageResponse {
        message: format!("User deleted with ID: {}", id),
    }))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}
