//! Error types shared across FXDesk crates.

use thiserror::Error;

/// Rejection of a user-entered amount.
///
/// Always recoverable: the dialogue re-prompts without losing context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing but whitespace was entered.
    #[error("Amount is empty")]
    Empty,

    /// Input is not a finite decimal number.
    #[error("Not a number: {0}")]
    NotANumber(String),

    /// Input is zero or negative.
    #[error("Amount must be positive, got {0}")]
    NotPositive(String),
}

impl ValidationError {
    /// Get error code for render instructions.
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::Empty => "AMOUNT_EMPTY",
            ValidationError::NotANumber(_) => "AMOUNT_NOT_A_NUMBER",
            ValidationError::NotPositive(_) => "AMOUNT_NOT_POSITIVE",
        }
    }
}
