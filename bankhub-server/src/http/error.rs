//! HTTP error responses
//!
//! Conflict, unauthorized and validation failures carry a JSON message.
//! Internal failures are logged and answered with an empty 500.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use bankhub_core::{Error, FieldErrors};

#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidationBody {
    message: String,
    errors: FieldErrors,
}

/// Error returned by handlers
#[derive(Debug)]
pub enum ApiError {
    /// Failure reported by the core services
    Core(Error),
    /// The request body could not be read as the expected JSON
    Body(JsonRejection),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Core(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Core(Error::Conflict(message)) => {
                (StatusCode::CONFLICT, Json(MessageBody { message })).into_response()
            }
            ApiError::Core(Error::Unauthorized(message)) => {
                (StatusCode::UNAUTHORIZED, Json(MessageBody { message })).into_response()
            }
            ApiError::Core(Error::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationBody {
                    message: "Validation failed".into(),
                    errors,
                }),
            )
                .into_response(),
            ApiError::Core(e) => {
                tracing::error!(error = %e, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            ApiError::Body(rejection) => {
                // Payload-too-large and wrong content type keep their status;
                // syntax and shape errors are plain bad requests
                let status = match rejection.status() {
                    StatusCode::PAYLOAD_TOO_LARGE | StatusCode::UNSUPPORTED_MEDIA_TYPE => {
                        rejection.status()
                    }
                    _ => StatusCode::BAD_REQUEST,
                };
                let mut errors = FieldErrors::new();
                errors.insert("body".into(), rejection.body_text());
                (
                    status,
                    Json(ValidationBody {
                        message: "Malformed request body".into(),
                        errors,
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Short category for the event log; never includes request data
pub fn category(e: &Error) -> &'static str {
    match e {
        Error::Conflict(_) => "conflict",
        Error::Unauthorized(_) => "unauthorized",
        Error::Validation(_) => "validation",
        Error::Database(_) => "database",
        Error::Config(_) => "config",
        Error::Token(_) => "token",
        Error::Hashing(_) => "hashing",
        Error::Io(_) => "io",
        Error::Json(_) => "json",
        Error::Other(_) => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (Error::conflict("Username is already in use"), StatusCode::CONFLICT),
            (Error::bad_credentials(), StatusCode::UNAUTHORIZED),
            (
                Error::validation_field("email", "must not be blank"),
                StatusCode::BAD_REQUEST,
            ),
            (Error::database("disk full"), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Hashing("oom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_error_has_empty_body() {
        use http_body_util::BodyExt;

        let response = ApiError::from(Error::database("users: a@x.com")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_category_has_no_detail() {
        assert_eq!(category(&Error::database("users table: a@x.com")), "database");
    }
}
