use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::json::{JsonObject, JsonValue, ParseError};
use crate::registry::ConfigError;
use crate::routes::JsonResponse;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] ParseError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Failed to save configuration: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidJson(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(ConfigError::Invalid(_)) => StatusCode::BAD_REQUEST,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Internal error: {:?}", self);
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        let body = JsonObject::new().with("error", self.to_string());
        JsonResponse(status, JsonValue::Object(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::InvalidJson(ParseError::UnexpectedEnd).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::BadRequest("missing".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Config(ConfigError::Invalid("no url".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            AppError::Config(ConfigError::Io(io)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
