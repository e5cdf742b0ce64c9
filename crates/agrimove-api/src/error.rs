use agrimove_auth::unauthorized_response;
use agrimove_core::{Error, FieldError, ValidationErrors};
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

pub const LOGIN_FAILED_DETAIL: &str = "Incorrect username or password";
pub const NOT_FOUND_DETAIL: &str = "Request not found";
pub const INVALID_FIELDS_DETAIL: &str = "Invalid request fields";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            fields: None,
        }
    }
}

/// Maps domain errors onto HTTP responses. Token failures all collapse into
/// the same unauthorized response; only the log line tells them apart.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add("body", rejection.body_text());
        Self(Error::Validation(errors))
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add("body", rejection.body_text());
        Self(Error::Validation(errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            err if err.is_token_rejection() => {
                debug!(reason = %err, "bearer token rejected");
                unauthorized_response()
            }
            Error::InvalidCredentials => {
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new(LOGIN_FAILED_DETAIL)),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            Error::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    detail: INVALID_FIELDS_DETAIL.to_string(),
                    fields: Some(errors.errors().to_vec()),
                }),
            )
                .into_response(),
            Error::RequestNotFound(id) => {
                debug!(request_id = %id, "transport request not found");
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new(NOT_FOUND_DETAIL))).into_response()
            }
            Error::UsernameTaken(_) => (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("Username already exists")),
            )
                .into_response(),
            other => {
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Internal server error")),
                )
                    .into_response()
            }
        }
    }
}
