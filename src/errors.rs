use extensions_bridge::BridgeError;
use harness_remote_control::{ClientError, TransportError};
use thiserror::Error;

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors surfaced by the harness facade.
///
/// Messages from the relay and from target extensions are carried through
/// unchanged so callers can match on the browser's own wording.
#[derive(Clone, Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<TransportError> for HarnessError {
    fn from(err: TransportError) -> Self {
        HarnessError::Client(ClientError::Transport(err))
    }
}

impl HarnessError {
    pub fn invalid(message: impl Into<String>) -> Self {
        HarnessError::InvalidArgument(message.into())
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, HarnessError::Client(err) if err.is_not_ready())
    }

    /// Stable machine-readable code for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            HarnessError::Client(ClientError::NotReady { .. }) => "not_ready",
            HarnessError::Client(ClientError::Remote { .. }) => "remote_error",
            HarnessError::Client(ClientError::Transport(_)) => "transport_error",
            HarnessError::Client(ClientError::Decode { .. }) => "decode_error",
            HarnessError::Bridge(BridgeError::Disabled) => "bridge_disabled",
            HarnessError::Bridge(BridgeError::PolicyDenied(_)) => "policy_denied",
            HarnessError::Bridge(BridgeError::Timeout(_)) => "extension_timeout",
            HarnessError::Bridge(BridgeError::Delivery(_)) => "delivery_failed",
            HarnessError::Bridge(BridgeError::Internal(_)) => "bridge_internal",
            HarnessError::InvalidArgument(_) => "invalid_argument",
            HarnessError::UnknownMethod(_) => "unknown_method",
            HarnessError::Config(_) => "config_error",
        }
    }
}
