// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::storage::RepositoryError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// Failure envelope shared by every JSON endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub ok: bool,
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InvalidPayload(_)
            | RepositoryError::Validation(_)
            | RepositoryError::Unsupported { .. } => ApiError::bad_request(err.to_string()),
            RepositoryError::NotConfigured
            | RepositoryError::CorruptDocument { .. }
            | RepositoryError::Store(_)
            | RepositoryError::Serialize { .. } => {
                error!(error = %err, "Repository operation failed");
                // Backend detail (keys, statuses, parse positions) stays in the log.
                let message = match err {
                    RepositoryError::NotConfigured => "storage is not configured",
                    RepositoryError::CorruptDocument { .. } => "stored data is corrupt",
                    _ => "storage error",
                };
                ApiError::internal(message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecError, CollectionKind};
    use crate::storage::BlobError;
    use axum::body::to_bytes;

    #[test]
    fn repository_errors_map_to_status() {
        let validation = ApiError::from(RepositoryError::Validation(vec![
            "email is required".to_string(),
        ]));
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.message, "invalid submission: email is required");

        let unsupported = ApiError::from(RepositoryError::Unsupported {
            operation: "delete",
            collection: CollectionKind::News,
        });
        assert_eq!(unsupported.status, StatusCode::BAD_REQUEST);
        assert_eq!(unsupported.message, "delete is not supported for news");

        let unconfigured = ApiError::from(RepositoryError::NotConfigured);
        assert_eq!(unconfigured.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(unconfigured.message, "storage is not configured");
    }

    #[tokio::test]
    async fn server_errors_keep_backend_detail_out_of_the_body() {
        let store = ApiError::from(RepositoryError::Store(BlobError::Status {
            key: "content/news.json".to_string(),
            status: 403,
        }));
        let response = store.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"ok":false,"error":"storage error"}"#);

        let parse_error = serde_json::from_slice::<serde_json::Value>(b"{ broken").unwrap_err();
        let corrupt = ApiError::from(RepositoryError::CorruptDocument {
            collection: CollectionKind::News,
            source: CodecError::InvalidJson(parse_error),
        });
        assert_eq!(corrupt.message, "stored data is corrupt");
    }

    #[tokio::test]
    async fn into_response_returns_envelope() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"ok":false,"error":"bad data"}"#);
    }
}
