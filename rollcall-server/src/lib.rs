use axum::http::StatusCode;
use tracing::warn;

pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod routes;

use db::UserStore;

/// Stato condiviso tra gli handler: solo l'handle verso gli utenti.
pub struct AppState {
    pub users: Box<dyn UserStore>,
}

impl AppState {
    pub fn new(users: impl UserStore + 'static) -> Self {
        Self {
            users: Box::new(users),
        }
    }
}

/// Controlla lo stato di salute del database chiedendo allo store una connessione.
pub async fn health_with_store(store: &dyn UserStore) -> StatusCode {
    match store.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
