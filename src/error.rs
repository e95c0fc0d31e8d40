//! Error types for tower-oauth2-guard
//!
//! Authorization denials are not errors here -- they are ordinary
//! [`Decision::Denied`](crate::Decision::Denied) values carrying the
//! verifier's response. [`Error`] covers only construction-time
//! configuration failures.

/// Boxed error type for tower service bounds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// tower-oauth2-guard error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A verification key could not be loaded (e.g. malformed PEM data).
    #[error("invalid verification key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

/// Result type alias for tower-oauth2-guard
pub type Result<T> = std::result::Result<T, Error>;
