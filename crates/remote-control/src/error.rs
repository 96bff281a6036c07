use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// High-level failure categories of the WebDriver transport.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransportErrorKind {
    #[error("webdriver unreachable")]
    Unavailable,
    #[error("webdriver i/o failure")]
    Io,
    #[error("webdriver protocol error")]
    Protocol,
    #[error("script execution failed")]
    Script,
}

/// Transport error enriched with a hint for the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    pub fn new(kind: TransportErrorKind) -> Self {
        Self {
            kind,
            hint: None,
            retriable: false,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            TransportError::new(TransportErrorKind::Unavailable)
                .with_hint(err.to_string())
                .retriable(true)
        } else {
            TransportError::new(TransportErrorKind::Io).with_hint(err.to_string())
        }
    }
}

/// Errors surfaced by [`crate::BridgeClient`] and the command forwarder.
#[derive(Clone, Debug, Error)]
pub enum ClientError {
    /// The control channel sits on a page that cannot host the relay.
    #[error(
        "current location {url} is not an HTTP(S) content page; call reset() to re-establish the relay"
    )]
    NotReady { url: String },
    /// The relay answered with `success: false`.
    #[error("{command} failed: {message}")]
    Remote { command: String, message: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected {command} response: {reason}")]
    Decode { command: String, reason: String },
}

impl ClientError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, ClientError::NotReady { .. })
    }
}
