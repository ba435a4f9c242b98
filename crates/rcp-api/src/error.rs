use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rcp_domain::{DomainError, ErrorKind};
use rcp_operations::OperationsError;
use rcp_store::StoreError;
use serde::Serialize;
use serde_json::json;

/// `{error:{code,message,target?,details?}}` (§6).
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

pub struct ApiError {
    pub status: StatusCode,
    code: &'static str,
    message: String,
    target: Option<String>,
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::NOT_FOUND, code: "NotFound", message: msg.into(), target: None }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::BAD_REQUEST, code: "BadRequest", message: msg.into(), target: None }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::CONFLICT, code: "Conflict", message: msg.into(), target: None }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, code: "InternalServerError", message: msg.into(), target: None }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    fn from_kind(kind: ErrorKind, message: String) -> Self {
        let (status, code) = match kind {
            ErrorKind::BadInput => (StatusCode::BAD_REQUEST, "BadRequest"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NotFound"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "Conflict"),
            ErrorKind::Concurrency => (StatusCode::CONFLICT, "ConcurrentModification"),
            ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError"),
        };
        ApiError { status, code, message, target: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": ErrorBody { code: self.code, message: self.message, target: self.target } }));
        (self.status, body).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::from_kind(e.kind(), e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::from_kind(e.kind(), e.to_string())
    }
}

impl From<OperationsError> for ApiError {
    fn from(e: OperationsError) -> Self {
        ApiError::from_kind(e.kind(), e.to_string())
    }
}
