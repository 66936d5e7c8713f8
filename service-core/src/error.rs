use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Message returned in place of any server-side failure detail.
pub const GENERIC_SERVER_ERROR: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    /// Non-2xx answer from an upstream API. The status code is passed through
    /// to the caller; `details` is only exposed for client errors.
    #[error("Upstream error ({status}): {context}")]
    Upstream {
        status: StatusCode,
        context: String,
        details: Option<serde_json::Value>,
    },

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl ErrorResponse {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            errors: Vec::new(),
        }
    }
}

fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut list: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| FieldError {
                field: field.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();
    // HashMap iteration order is unstable; keep responses deterministic.
    list.sort_by(|a, b| a.field.cmp(&b.field).then(a.message.cmp(&b.message)));
    list
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body, retry_after) = match self {
            AppError::ValidationError(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Validation error".to_string(),
                    details: None,
                    errors: field_errors(&err),
                },
                None,
            ),
            AppError::BadRequest(err) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::message(err.to_string()), None)
            }
            AppError::NotFound(err) => {
                (StatusCode::NOT_FOUND, ErrorResponse::message(err.to_string()), None)
            }
            AppError::TooManyRequests(msg, retry) => {
                (StatusCode::TOO_MANY_REQUESTS, ErrorResponse::message(msg), retry)
            }
            AppError::Upstream {
                status,
                context,
                details,
            } => {
                if status.is_server_error() {
                    (status, ErrorResponse::message(GENERIC_SERVER_ERROR), None)
                } else {
                    (
                        status,
                        ErrorResponse {
                            error: context,
                            details,
                            errors: Vec::new(),
                        },
                        None,
                    )
                }
            }
            AppError::BadGateway(_) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::message(GENERIC_SERVER_ERROR),
                None,
            ),
            AppError::InternalError(_) | AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::message(GENERIC_SERVER_ERROR),
                None,
            ),
        };

        let mut res = (status, Json(body)).into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}
