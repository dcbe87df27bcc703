//! Playback interface consumed by the navigation engine

use serde::{Deserialize, Serialize};
use std::time::Duration;

use folio_scene::PageId;

use crate::collection::Transition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackId(pub(crate) u64);

impl std::fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "playback-{}", self.0)
    }
}

/// Completion notice produced by [`TransitionPlayer::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackFinished {
    pub playback: PlaybackId,
    pub page: PageId,
}

/// Plays transition animations for pages.
///
/// Completion is reported from `advance`, which the owner calls once per frame
/// on the same thread that runs navigation.
pub trait TransitionPlayer: Send {
    /// Begin playing `transition` on `page`.
    ///
    /// Returns None when there is nothing to animate, in which case the caller
    /// switches the page instantly.
    fn start(
        &mut self,
        page: PageId,
        transition: &Transition,
        activating: bool,
        reversed: bool,
    ) -> Option<PlaybackId>;

    /// Stop a playback without reporting completion
    fn stop(&mut self, playback: PlaybackId) -> bool;

    fn is_playing(&self, playback: PlaybackId) -> bool;

    /// Advance all playbacks and return the ones that finished
    fn advance(&mut self, delta: Duration) -> Vec<PlaybackFinished>;

    /// Progress of the transition playing on `page`, from 0 to 1
    fn phase(&self, _page: PageId) -> Option<f32> {
        None
    }
}
