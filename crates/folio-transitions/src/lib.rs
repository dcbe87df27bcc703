//! Folio Transitions
//!
//! The animation side of page navigation:
//! - [`TransitionCollection`] describes which transition plays between two pages
//! - [`TransitionPlayer`] is what the navigation engine drives
//! - [`Timeline`] is the stock player, advanced once per frame

mod collection;
mod error;
mod player;
mod timeline;

pub use collection::{Direction, Transition, TransitionCollection, TransitionMatch};
pub use error::TransitionError;
pub use player::{PlaybackFinished, PlaybackId, TransitionPlayer};
pub use timeline::Timeline;

pub type Result<T> = std::result::Result<T, TransitionError>;
