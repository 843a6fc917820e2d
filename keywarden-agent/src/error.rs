//! Agent error handling module
//!
//! Every failure leaves the agent as `{"success": false, "error": message}`
//! with a status code that reflects the error kind. "No match" and "none
//! enrolled" are results, not errors, and never pass through here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keywarden_core::{AuthenticatorError, FlowError, StoreError};
use thiserror::Error;

/// API error wrapping the core failure taxonomy
#[derive(Debug, Error)]
pub enum ApiError {
    /// Flow failure (authenticator refusal or store failure during a flow)
    #[error("{0}")]
    Flow(#[from] FlowError),

    /// Direct store failure outside a flow
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Flow(FlowError::Registration(reason))
            | Self::Flow(FlowError::Authentication(reason)) => match reason {
                AuthenticatorError::Timeout => StatusCode::REQUEST_TIMEOUT,
                AuthenticatorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthenticatorError::Cancelled
                | AuthenticatorError::SelectionMismatch(_)
                | AuthenticatorError::NoCredentials => StatusCode::BAD_REQUEST,
            },
            Self::Flow(FlowError::Store(inner)) => store_status(inner),
            Self::Store(inner) => store_status(inner),
        }
    }

    /// Message rendered into the error envelope
    fn client_message(&self) -> String {
        match self {
            Self::Flow(FlowError::Store(StoreError::Open(_)))
            | Self::Store(StoreError::Open(_)) => "storage unavailable".to_string(),
            _ => self.to_string(),
        }
    }
}

fn store_status(error: &StoreError) -> StatusCode {
    match error {
        StoreError::NotInitialized | StoreError::Closed | StoreError::Open(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        StoreError::Write(_) | StoreError::Read(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.client_message();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "request refused");
        }

        let body = serde_json::json!({
            "success": false,
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticator_refusals_are_client_errors() {
        let err = ApiError::Flow(FlowError::Authentication(AuthenticatorError::Cancelled));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::Flow(FlowError::Registration(AuthenticatorError::Timeout));
        assert_eq!(err.status_code(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_open_failure_reads_as_storage_unavailable() {
        let err = ApiError::Store(StoreError::Open("disk says no".to_string()));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.client_message(), "storage unavailable");
    }

    #[test]
    fn test_write_failure_is_server_error() {
        let err = ApiError::Store(StoreError::Write("quota exceeded".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.client_message().contains("quota exceeded"));
    }
}
