use thiserror::Error;

/// Core error type shared across Zodforge crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The snapshot violates internal invariants.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Convenience alias for results returned by Zodforge crates.
pub type Result<T> = std::result::Result<T, Error>;
