use axum::http::StatusCode;
use axum::response::IntoResponse;
use extensions_bridge::BridgeError;
use harness_remote_control::ClientError;
use serde::Serialize;

use crate::errors::HarnessError;

/// A failed RPC call, rendered as `{success: false, error, code}`.
#[derive(Debug)]
pub struct RpcError(pub HarnessError);

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

impl From<HarnessError> for RpcError {
    fn from(err: HarnessError) -> Self {
        RpcError(err)
    }
}

impl RpcError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            HarnessError::Client(ClientError::NotReady { .. }) => StatusCode::CONFLICT,
            HarnessError::Client(ClientError::Remote { .. })
            | HarnessError::Client(ClientError::Decode { .. }) => StatusCode::BAD_GATEWAY,
            HarnessError::Client(ClientError::Transport(_)) => StatusCode::SERVICE_UNAVAILABLE,
            HarnessError::Bridge(BridgeError::PolicyDenied(_)) => StatusCode::FORBIDDEN,
            HarnessError::Bridge(BridgeError::Disabled) => StatusCode::SERVICE_UNAVAILABLE,
            HarnessError::Bridge(BridgeError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            HarnessError::Bridge(BridgeError::Delivery(_)) => StatusCode::BAD_GATEWAY,
            HarnessError::Bridge(BridgeError::Internal(_)) | HarnessError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            HarnessError::InvalidArgument(_) | HarnessError::UnknownMethod(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            success: false,
            error: self.0.to_string(),
            code: self.0.code(),
        };
        (status, axum::Json(body)).into_response()
    }
}
