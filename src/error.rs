//! Error types for the shell and gateway
//!
//! Denials are not errors: a request that fails authorization produces a
//! [`crate::auth::DenialReason`] value. `GateError` covers failures the
//! caller must handle: malformed input to the signer, a dead entropy source,
//! and a panel host that cannot create or initialize a context.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    /// Malformed, missing or wrong-typed input, detected before any crypto
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The OS random source failed; fatal at startup
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// The panel host could not create, ready or initialize a context
    #[error("panel host: {0}")]
    Host(String),

    #[error("payload encoding: {0}")]
    Encoding(#[from] postcard::Error),

    #[error("ipc encoding: {0}")]
    Ipc(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GateError>;
