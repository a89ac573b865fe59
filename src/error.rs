use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    ai::{extract::ExtractionFailed, summarize::ModelUnavailable},
    auth::password::PasswordError,
    parser::ParseError,
    store::StoreError,
};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ConstraintViolation(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: crate::store::EntityKind, id: &str) -> Self {
        AppError::NotFound(format!("{} {} not found", kind.label(), id))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Text sent to the client. Infrastructure details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::ExternalService(_) => "Upstream service unavailable".into(),
            AppError::Storage(_) | AppError::Internal(_) => "Internal server error".into(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation(m) => AppError::ConstraintViolation(m),
            StoreError::Validation(m) => AppError::Validation(m),
            StoreError::UnsupportedEntityType(tag) => {
                AppError::Validation(format!("unsupported entity type `{tag}`"))
            }
            StoreError::Storage(m) => AppError::Storage(m),
        }
    }
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ExtractionFailed> for AppError {
    fn from(err: ExtractionFailed) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        if err.is_policy() {
            AppError::Validation(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

impl From<ModelUnavailable> for AppError {
    fn from(err: ModelUnavailable) -> Self {
        AppError::ExternalService(err.0)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            error!(error = %self, %status, code, "request failed");
        } else {
            warn!(error = %self, %status, code, "request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.public_message(),
                "status": status.as_u16()
            }
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn store_errors_map_to_statuses() {
        let (status, body) =
            body_of(StoreError::ConstraintViolation("duplicate email".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONSTRAINT_VIOLATION");
        assert_eq!(body["error"]["message"], "duplicate email");

        let (status, _) = body_of(StoreError::Validation("bad".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn password_policy_is_a_client_error_and_bad_hash_is_not() {
        let (status, body) = body_of(PasswordError::TooShort(8).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Password must be at least 8 characters");

        let (status, body) = body_of(PasswordError::CorruptHash("bad salt".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Internal server error");
    }

    #[tokio::test]
    async fn infrastructure_details_are_not_leaked() {
        let (status, body) =
            body_of(AppError::Storage("connection refused to 10.0.0.3".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Internal server error");

        let (status, body) = body_of(AppError::ExternalService("401 from provider".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body["error"]["message"].as_str().unwrap().contains("401"));
    }

    #[tokio::test]
    async fn not_found_names_the_entity() {
        let (status, body) =
            body_of(AppError::not_found(crate::store::EntityKind::Record, "r-1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Record r-1 not found");
    }
}
