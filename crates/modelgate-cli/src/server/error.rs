use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use modelgate_runtime::Error;
use modelgate_types::ErrorResponse;
use serde_json::json;

/// Everything a handler can fail with, rendered as an [`ErrorResponse`].
#[derive(Debug)]
pub enum ApiError {
    Runtime(Error),
    /// Body missing, not JSON, or not matching the request schema.
    MalformedBody(String),
    Forbidden(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Runtime(err) => match err {
                Error::InvalidInput(_) | Error::InputTooLarge { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                Error::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
                Error::Orchestration { .. } => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::MalformedBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Runtime(err) => {
                let body = ErrorResponse::new(err.kind(), err.public_message());
                match err {
                    Error::QuotaExceeded {
                        operation,
                        used,
                        limit,
                    } => body.with_detail(json!({
                        "operation": operation,
                        "used": used,
                        "limit": limit,
                    })),
                    Error::InputTooLarge {
                        operation,
                        length,
                        limit,
                    } => body.with_detail(json!({
                        "operation": operation,
                        "length": length,
                        "limit": limit,
                    })),
                    Error::Orchestration { operation, .. } => {
                        body.with_detail(json!({ "operation": operation }))
                    }
                    _ => body,
                }
            }
            ApiError::MalformedBody(reason) => ErrorResponse::new("invalid_input", reason.clone()),
            ApiError::Forbidden(reason) => ErrorResponse::new("forbidden", *reason),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Runtime(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Runtime(Error::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error()
            && let ApiError::Runtime(err) = &self
        {
            tracing::error!(kind = err.kind(), error = %err, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelgate_runtime::{InferenceError, OrchestrationCause};
    use modelgate_types::Operation;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::Runtime(Error::InvalidInput("x".into())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::Runtime(Error::QuotaExceeded {
                    operation: Operation::Classify,
                    used: 2,
                    limit: 2,
                }),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                ApiError::Runtime(Error::Configuration("no model".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Runtime(Error::Internal("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Forbidden("Invalid API key"), StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn test_orchestration_body_hides_cause() {
        let err = ApiError::Runtime(Error::Orchestration {
            operation: Operation::Summarize,
            cause: OrchestrationCause::Inference(InferenceError::Backend(
                "CUDA out of memory at 0xdeadbeef".into(),
            )),
        });
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = err.body();
        assert_eq!(body.error, "orchestration_error");
        assert!(!body.message.contains("CUDA"));
        assert_eq!(body.detail, Some(json!({ "operation": "summarize" })));
    }
}
