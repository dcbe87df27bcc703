//! Transition error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransitionError {
    #[error("Failed to parse transition collection: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
