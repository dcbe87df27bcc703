//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Scene error: {0}")]
    Scene(#[from] folio_scene::SceneError),

    #[error("Transition error: {0}")]
    Transition(#[from] folio_transitions::TransitionError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] folio_navigation::NavigationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
