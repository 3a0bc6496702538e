use axum::{routing::get, Extension, Router};
use rollcall_core::{HEALTH_PATH, USERS_PATH};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::AssetsConfig;
use crate::controllers;
use crate::AppState;

/// Rotte JSON più i file statici: tutto ciò che non è una rotta API viene cercato
/// prima nella build del front-end, poi negli asset pubblici, altrimenti 404.
pub fn router(state: Arc<AppState>, assets: &AssetsConfig) -> Router {
    let static_files =
        ServeDir::new(&assets.static_dir).fallback(ServeDir::new(&assets.public_dir));

    Router::new()
        .route(HEALTH_PATH, get(controllers::health))
        .route(USERS_PATH, get(controllers::list_users))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
