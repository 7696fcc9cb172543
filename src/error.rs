use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("malformed upstream response: {0}")]
    UpstreamMalformedResponse(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::UpstreamUnavailable(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::UpstreamMalformedResponse(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<AppError> for tonic::Status {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => tonic::Status::invalid_argument(msg),
            AppError::UpstreamUnavailable(msg) => tonic::Status::unavailable(msg),
            AppError::UpstreamMalformedResponse(msg) => tonic::Status::unavailable(msg),
            AppError::Internal(msg) => tonic::Status::internal(msg),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;

    use super::AppError;

    #[test]
    fn variants_map_to_grpc_codes() {
        let cases = [
            (AppError::Validation("bad".into()), tonic::Code::InvalidArgument),
            (AppError::UpstreamUnavailable("down".into()), tonic::Code::Unavailable),
            (AppError::UpstreamMalformedResponse("html".into()), tonic::Code::Unavailable),
            (AppError::Internal("boom".into()), tonic::Code::Internal),
        ];

        for (err, code) in cases {
            assert_eq!(tonic::Status::from(err).code(), code);
        }
    }

    #[test]
    fn validation_is_a_bad_request() {
        let response = AppError::Validation("radius must be greater than 0".into()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
