//! Frame-driven transition player

use std::time::Duration;

use folio_scene::PageId;

use crate::collection::Transition;
use crate::player::{PlaybackFinished, PlaybackId, TransitionPlayer};

#[derive(Debug, Clone)]
struct Playback {
    id: PlaybackId,
    page: PageId,
    duration: Duration,
    elapsed: Duration,
    activating: bool,
    reversed: bool,
}

impl Playback {
    fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }
}

#[derive(Debug, Default)]
pub struct Timeline {
    next_id: u64,
    playbacks: Vec<Playback>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of playbacks that have not finished yet
    pub fn active_count(&self) -> usize {
        self.playbacks.len()
    }

    /// Direction of the playback on `page`: true when it activates the page,
    /// None when nothing plays on it
    pub fn playback_direction(&self, page: PageId) -> Option<bool> {
        self.playbacks
            .iter()
            .find(|p| p.page == page)
            .map(|p| p.activating)
    }
}

impl TransitionPlayer for Timeline {
    fn start(
        &mut self,
        page: PageId,
        transition: &Transition,
        activating: bool,
        reversed: bool,
    ) -> Option<PlaybackId> {
        let duration = transition.duration();
        if duration.is_zero() {
            return None;
        }

        self.next_id += 1;
        let id = PlaybackId(self.next_id);
        self.playbacks.push(Playback {
            id,
            page,
            duration,
            elapsed: Duration::ZERO,
            activating,
            reversed,
        });

        tracing::debug!(
            playback = %id,
            page = %page,
            duration_ms = transition.duration_ms,
            activating,
            reversed,
            "Started transition"
        );

        Some(id)
    }

    fn stop(&mut self, playback: PlaybackId) -> bool {
        let before = self.playbacks.len();
        self.playbacks.retain(|p| p.id != playback);
        self.playbacks.len() != before
    }

    fn is_playing(&self, playback: PlaybackId) -> bool {
        self.playbacks.iter().any(|p| p.id == playback)
    }

    fn advance(&mut self, delta: Duration) -> Vec<PlaybackFinished> {
        let mut finished = Vec::new();

        for playback in &mut self.playbacks {
            playback.elapsed += delta;
            if playback.elapsed >= playback.duration {
                finished.push(PlaybackFinished {
                    playback: playback.id,
                    page: playback.page,
                });
            }
        }

        self.playbacks.retain(|p| p.elapsed < p.duration);
        finished
    }

    fn phase(&self, page: PageId) -> Option<f32> {
        self.playbacks.iter().find(|p| p.page == page).map(|p| {
            if p.reversed {
                1.0 - p.progress()
            } else {
                p.progress()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_scene::SceneTree;

    fn page() -> PageId {
        SceneTree::new().create_page("page")
    }

    #[test]
    fn test_playback_finishes_after_duration() {
        let mut timeline = Timeline::new();
        let page = page();
        let transition = Transition::fallback(Duration::from_millis(100));

        let id = timeline.start(page, &transition, true, false).unwrap();
        assert!(timeline.advance(Duration::from_millis(40)).is_empty());
        assert!(timeline.is_playing(id));

        let phase = timeline.phase(page).unwrap();
        assert!((phase - 0.4).abs() < 1e-3);

        let finished = timeline.advance(Duration::from_millis(60));
        assert_eq!(finished, vec![PlaybackFinished { playback: id, page }]);
        assert_eq!(timeline.active_count(), 0);
        assert!(timeline.phase(page).is_none());
    }

    #[test]
    fn test_zero_duration_does_not_start() {
        let mut timeline = Timeline::new();
        let transition = Transition::fallback(Duration::ZERO);
        assert!(timeline.start(page(), &transition, true, false).is_none());
    }

    #[test]
    fn test_stop_suppresses_completion() {
        let mut timeline = Timeline::new();
        let page = page();
        let transition = Transition::fallback(Duration::from_millis(100));

        let id = timeline.start(page, &transition, false, true).unwrap();
        assert_eq!(timeline.playback_direction(page), Some(false));
        assert!((timeline.phase(page).unwrap() - 1.0).abs() < 1e-3);

        assert!(timeline.stop(id));
        assert!(!timeline.stop(id));
        assert!(timeline.advance(Duration::from_secs(1)).is_empty());
    }
}
