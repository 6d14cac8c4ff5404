use alloctrack_services::auth::AuthError;
use alloctrack_services::dao::base::DaoError;
use alloctrack_services::workflow::WorkflowError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Internal(String),
    Validation(String),
    /// A workflow refusal with a machine-readable kind and optional detail.
    Workflow {
        status: StatusCode,
        kind: &'static str,
        message: String,
        detail: Option<serde_json::Value>,
    },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, detail) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg, None),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation", msg, None),
            ApiError::Workflow {
                status,
                kind,
                message,
                detail,
            } => (status, kind, message, detail),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            detail,
        };

        (status, Json(body)).into_response()
    }
}

impl From<DaoError> for ApiError {
    fn from(err: DaoError) -> Self {
        match err {
            DaoError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            DaoError::DuplicateKey(msg) => ApiError::Conflict(msg),
            DaoError::Forbidden(msg) => ApiError::Forbidden(msg),
            DaoError::Validation(msg) => ApiError::Validation(msg),
            DaoError::Mongo(e) => ApiError::Internal(e.to_string()),
            DaoError::BsonSer(e) => ApiError::Internal(e.to_string()),
            DaoError::BsonDe(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::TokenExpired => ApiError::Unauthorized("Token expired".to_string()),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
            AuthError::HashError(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::InvalidTransition { .. } => ApiError::Workflow {
                status: StatusCode::CONFLICT,
                kind: "invalid_transition",
                message,
                detail: None,
            },
            WorkflowError::QuotaExceeded {
                consortium,
                resource,
                requested,
                available,
            } => ApiError::Workflow {
                status: StatusCode::CONFLICT,
                kind: "quota_exceeded",
                message,
                detail: Some(serde_json::json!({
                    "consortium": consortium,
                    "resource": resource,
                    "requested": requested,
                    "available": available,
                })),
            },
            WorkflowError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            WorkflowError::Expired => ApiError::Workflow {
                status: StatusCode::BAD_REQUEST,
                kind: "invitation_expired",
                message,
                detail: None,
            },
            WorkflowError::AlreadyCollaborator => ApiError::Workflow {
                status: StatusCode::CONFLICT,
                kind: "already_collaborator",
                message,
                detail: None,
            },
            WorkflowError::Conflict => ApiError::Conflict(message),
            WorkflowError::Forbidden(msg) => ApiError::Forbidden(msg),
            WorkflowError::Validation(msg) => ApiError::Validation(msg),
            WorkflowError::Dao(e) => e.into(),
            WorkflowError::Mongo(e) => ApiError::Internal(e.to_string()),
        }
    }
}
