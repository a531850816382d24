//! Error taxonomy for journal operations.
//!
//! Three failure classes: bad user input on create/update (`Validation`),
//! rejected risk-calculator inputs (`InvalidInput`), and row-store failures
//! (`DataSource`). Arithmetic guards (zero denominators) degrade to sentinel
//! zero values and never become errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// User input rejected before any state mutation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Risk calculator input rejected before any computation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Row-store call failed. Retry is manual via re-invocation.
    #[error("data source error: {0}")]
    DataSource(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
