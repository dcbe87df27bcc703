//! Navigation error types

use thiserror::Error;

use folio_scene::PageId;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Invalid navigation target: {0}")]
    InvalidTarget(PageId),

    #[error("Page {target} is not reachable from host {host}")]
    Unreachable { target: PageId, host: PageId },

    #[error("Page is not managed by any host: {0}")]
    NoHost(PageId),

    #[error("Node is not a page host: {0}")]
    NotAHost(PageId),

    #[error("Page has no parent page: {0}")]
    NoParentPage(PageId),

    #[error("Scene error: {0}")]
    Scene(#[from] folio_scene::SceneError),
}
