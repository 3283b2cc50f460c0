//! Error taxonomy of the engine.

use thiserror::Error;

/// Everything that can go wrong while driving or executing a job.
#[derive(Debug, Error)]
pub enum Error {
    /// Local filesystem failure.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Container engine failure.
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    /// HTTP fetch or RPC transport failure.
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// A request violated an invariant, e.g. fewer pairs than map tasks.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Error returned by a user map or reduce function.
    #[error("user function failed: {0}")]
    User(String),

    /// The master has closed its channels; no more work will be handed out.
    #[error("master unavailable")]
    Unavailable,
}

pub type Result<T> = std::result::Result<T, Error>;
