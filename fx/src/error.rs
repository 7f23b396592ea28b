//! FX engine error types.

use fxdesk_common::Currency;
use thiserror::Error;

/// Errors that can occur while obtaining or deriving rates.
///
/// Every variant is an upstream fetch failure from the dialogue's point of
/// view: recoverable, the user may retry the same step.
#[derive(Debug, Clone, Error)]
pub enum FxError {
    /// The request never produced a response.
    #[error("Rate source transport error: {0}")]
    Transport(String),

    /// The rate source answered with a non-success status.
    #[error("Rate source returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The fetch did not finish within the configured bound.
    #[error("Rate fetch timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The payload could not be decoded or lacks the `rates` field.
    #[error("Malformed rate payload: {0}")]
    MalformedPayload(String),

    /// A currency the desk needs is absent from the snapshot.
    #[error("Rate not available for {0}")]
    MissingRate(Currency),

    /// A rate is zero, negative or not finite.
    #[error("Invalid rate {rate} for {currency}")]
    InvalidRate { currency: Currency, rate: f64 },
}

impl FxError {
    /// Check if retrying the same request can help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FxError::Transport(_) | FxError::Timeout(_) | FxError::HttpStatus { .. }
        )
    }

    /// Get error code for render instructions.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::Transport(_) => "TRANSPORT_ERROR",
            FxError::HttpStatus { .. } => "HTTP_STATUS",
            FxError::Timeout(_) => "TIMEOUT",
            FxError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            FxError::MissingRate(_) => "MISSING_RATE",
            FxError::InvalidRate { .. } => "INVALID_RATE",
        }
    }
}

impl From<reqwest::Error> for FxError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::MalformedPayload(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
