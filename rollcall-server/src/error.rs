use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rollcall_core::error::{codes, Error as ErrorBody};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::DbError;

/// Errori degli handler HTTP. Ogni variante diventa una risposta 5xx con body JSON:
/// la richiesta riceve sempre una risposta.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Db(#[from] DbError),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Db(DbError::Timeout(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, codes::DATABASE_TIMEOUT)
            }
            AppError::Db(DbError::Query(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, codes::QUERY_FAILED)
            }
            AppError::Db(
                DbError::Unavailable(_) | DbError::Connection(_) | DbError::UnsupportedUrl(_),
            ) => (StatusCode::SERVICE_UNAVAILABLE, codes::DATABASE_UNAVAILABLE),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        error!(%status, error = %self, "request failed");

        let mut body = ErrorBody::new(code, self.to_string());
        if let AppError::Db(DbError::Timeout(limit)) = &self {
            body = body.with_details(json!({ "timeoutSecs": limit.as_secs() }));
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn every_db_error_maps_to_5xx() {
        let cases = [
            AppError::from(DbError::Query(sqlx::Error::RowNotFound)),
            AppError::from(DbError::Unavailable(sqlx::Error::PoolClosed)),
            AppError::from(DbError::Connection(sqlx::Error::PoolTimedOut)),
            AppError::from(DbError::Timeout(Duration::from_secs(10))),
        ];
        for err in cases {
            let (status, _) = err.status_and_code();
            assert!(status.is_server_error(), "{err} mapped to {status}");
        }
    }

    #[test]
    fn query_failure_is_500() {
        let resp = AppError::from(DbError::Query(sqlx::Error::RowNotFound)).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
