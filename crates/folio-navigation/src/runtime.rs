//! Per-page runtime data kept by the host that manages the page

use folio_scene::PageId;
use folio_transitions::{PlaybackId, Transition, TransitionMatch, TransitionPlayer};

/// A transition bound to one page for the duration of one route entry
#[derive(Debug, Clone)]
pub struct TransitionRuntime {
    transition: Transition,
    reversed: bool,
    playback: Option<PlaybackId>,
}

impl TransitionRuntime {
    pub fn new(found: TransitionMatch) -> Self {
        Self {
            transition: found.transition,
            reversed: found.reversed,
            playback: None,
        }
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }
}

#[derive(Debug, Clone)]
pub struct PageRuntimeData {
    page: PageId,
    /// Cached auto-activate flag of the page
    auto_activate: bool,
    runtime: Option<TransitionRuntime>,
}

impl PageRuntimeData {
    pub fn new(page: PageId, auto_activate: bool) -> Self {
        Self {
            page,
            auto_activate,
            runtime: None,
        }
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn is_auto_activate(&self) -> bool {
        self.auto_activate
    }

    pub fn runtime(&self) -> Option<&TransitionRuntime> {
        self.runtime.as_ref()
    }

    /// Playback started by the bound runtime, if any
    pub fn playback(&self) -> Option<PlaybackId> {
        self.runtime.as_ref().and_then(|r| r.playback)
    }

    /// Bind a runtime, replacing any previous binding
    pub fn attach_transition_runtime(&mut self, runtime: TransitionRuntime) {
        self.runtime = Some(runtime);
    }

    /// Release the bound runtime, stopping its playback if it is still running.
    ///
    /// Returns true if a playback had to be stopped.
    pub fn detach_transition_runtime(&mut self, player: &mut dyn TransitionPlayer) -> bool {
        match self.runtime.take().and_then(|r| r.playback) {
            Some(playback) if player.is_playing(playback) => player.stop(playback),
            _ => false,
        }
    }

    /// Start the bound runtime.
    ///
    /// Returns false when nothing was started: no runtime is bound, the page
    /// state does not change, or the player has nothing to animate.
    pub fn start_transition(
        &mut self,
        player: &mut dyn TransitionPlayer,
        activating: bool,
        was_active: bool,
    ) -> bool {
        let Some(runtime) = self.runtime.as_mut() else {
            return false;
        };
        if activating == was_active {
            return false;
        }

        runtime.playback = player.start(
            self.page,
            &runtime.transition,
            activating,
            runtime.reversed,
        );
        runtime.playback.is_some()
    }

    /// Track a change of the page's auto-activate flag, returning whether it changed
    pub fn on_property_changed(&mut self, auto_activate: bool) -> bool {
        let changed = self.auto_activate != auto_activate;
        self.auto_activate = auto_activate;
        changed
    }
}
