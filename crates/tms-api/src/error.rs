//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from tms-workflow to HTTP status codes and JSON
//! error bodies with a machine-readable code. Never exposes internal
//! error details in responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use tms_workflow::WorkflowError;

/// Structured JSON error response body.
///
/// All error responses use this format across the API surface. The
/// `details` field carries additional context for validation errors and
/// is omitted otherwise.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// The error payload.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "EXPIRED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found, or not visible to the calling tenant (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed — malformed fields, ineligible actor,
    /// or shipment in the wrong state (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure — missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure — insufficient role (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state — duplicate active offer or
    /// illegal transition (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The offer's response window has elapsed (410).
    #[error("expired: {0}")]
    Expired(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The HTTP status code and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Expired(_) => (StatusCode::GONE, "EXPIRED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Domain-primitive validation failures surface as 422s.
impl From<tms_core::ValidationError> for AppError {
    fn from(err: tms_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Map workflow errors onto the HTTP surface.
///
/// `Ambiguous` never reaches an HTTP error: the webhook path resolves it
/// to a 200 body with a failure reason. The `Conflict` fallback here
/// covers only misuse of the direct API.
impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match &err {
            WorkflowError::NotFound { .. } => Self::NotFound(err.to_string()),
            WorkflowError::DuplicateOffer { .. } => Self::Conflict(err.to_string()),
            WorkflowError::Ineligible { .. } => Self::Validation(err.to_string()),
            WorkflowError::WrongShipmentState { .. } => Self::Validation(err.to_string()),
            WorkflowError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
            WorkflowError::Expired { .. } => Self::Expired(err.to_string()),
            WorkflowError::Ambiguous { .. } => Self::Conflict(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tms_core::OfferId;
    use tms_workflow::{OfferKind, OfferState};

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                AppError::Validation("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
            ),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (AppError::Expired("x".into()), StatusCode::GONE, "EXPIRED"),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            let (s, c) = err.status_and_code();
            assert_eq!(s, status);
            assert_eq!(c, code);
        }
    }

    #[test]
    fn test_workflow_error_mapping() {
        let err = AppError::from(WorkflowError::NotFound {
            resource: "offer",
            id: "x".to_string(),
        });
        assert!(matches!(err, AppError::NotFound(_)));

        let err = AppError::from(WorkflowError::Ineligible {
            actor: "d".to_string(),
            reason: "license expired".to_string(),
        });
        assert!(matches!(err, AppError::Validation(_)));

        let err = AppError::from(WorkflowError::InvalidTransition {
            offer_id: OfferId::new(),
            from: OfferState::Accepted,
            to: OfferState::Rejected,
        });
        assert!(matches!(err, AppError::Conflict(_)));

        let err = AppError::from(WorkflowError::Expired {
            offer_id: OfferId::new(),
            expired_at: Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
        });
        assert!(matches!(err, AppError::Expired(_)));

        let err = AppError::from(WorkflowError::DuplicateOffer {
            kind: OfferKind::Tender,
            actor: "c".to_string(),
            shipment: "s".to_string(),
        });
        assert!(matches!(err, AppError::Conflict(_)));
    }

    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_into_response_expired() {
        let (status, body) = response_parts(AppError::Expired("offer o1 expired".into())).await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body.error.code, "EXPIRED");
        assert!(body.error.message.contains("o1"));
    }

    #[tokio::test]
    async fn test_into_response_internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("pool exhausted".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            !body.error.message.contains("pool"),
            "internal details must not leak: {}",
            body.error.message
        );
        assert_eq!(body.error.message, "An internal error occurred");
    }
}
