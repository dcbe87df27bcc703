//! Folio Scene
//!
//! The node tree that pages live in. Nodes are owned by the [`SceneTree`] arena
//! and addressed through generational [`PageId`] handles, so anything holding
//! an id only observes a node while it is still alive and attached.
//!
//! Three node kinds exist:
//! - `Page`: a navigable container that is either active or inactive
//! - `Host`: a page that also owns navigation for the pages below it
//! - `Content`: plain layout nodes that pages may be nested inside

mod error;
mod page;
mod state;
mod tree;

pub use error::SceneError;
pub use page::{NodeKind, PageBehavior, PageId, PageNode, PageProperty};
pub use state::TransitionState;
pub use tree::SceneTree;

pub type Result<T> = std::result::Result<T, SceneError>;
