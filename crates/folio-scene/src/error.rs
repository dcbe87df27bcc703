//! Scene error types

use thiserror::Error;

use crate::page::PageId;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Node not found: {0}")]
    NotFound(PageId),

    #[error("Node is not attached: {0}")]
    Detached(PageId),

    #[error("Node already has a parent: {0}")]
    AlreadyAttached(PageId),

    #[error("Attaching {child} under {parent} would create a cycle")]
    Cycle { child: PageId, parent: PageId },

    #[error("Invalid transition state change: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}
