//! Error responses for the direct endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use voice_relay_core::error::ProviderError;

/// Failure reported by status code with a `{"detail": ...}` body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Provider(ProviderError),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(e: impl std::fmt::Display) -> Self {
        Self::BadRequest(e.to_string())
    }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        Self::Internal(e.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Provider(e) if e.is_credential_missing() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match &self {
            Self::BadRequest(msg) | Self::Internal(msg) => msg.clone(),
            Self::Provider(e) => e.to_string(),
        };
        (self.status(), Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::bad_request("no file").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ProviderError::CredentialMissing { provider: "Murf" }).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(ProviderError::Synthesis("500".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::internal("disk full").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
