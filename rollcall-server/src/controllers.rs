use axum::{extract::Extension, http::StatusCode, Json};
use rollcall_core::ListUsersResponse;
use std::sync::Arc;
use tracing::debug;

use crate::{error::AppError, health_with_store, AppState};

/// Handler per GET /api/users
pub async fn list_users(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ListUsersResponse>, AppError> {
    debug!("getting users");
    // un errore del database diventa 5xx tramite AppError, mai un 200 vuoto
    let users = state.users.get_all_users().await?;
    debug!(count = users.len(), "users fetched");
    Ok(Json(users))
}

/// Handler per GET /health
pub async fn health(Extension(state): Extension<Arc<AppState>>) -> StatusCode {
    health_with_store(state.users.as_ref()).await
}
