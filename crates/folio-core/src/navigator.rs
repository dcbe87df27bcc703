//! Shared navigator handle
//!
//! All navigation state lives in one [`PageDomain`]; the navigator hands out
//! cheap clones of a handle to it so that the frame loop, input handling and
//! UI glue can drive the same page tree.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use folio_navigation::{
    ListenerId, NavigationCommand, NavigationListener, NavigationOutcome, PageDomain,
};
use folio_scene::{PageBehavior, PageId, TransitionState};
use folio_transitions::{TransitionCollection, TransitionPlayer};

use crate::config::Config;
use crate::Result;

#[derive(Clone)]
pub struct Navigator {
    config: Arc<Config>,
    domain: Arc<Mutex<PageDomain>>,
}

impl Navigator {
    /// Create a navigator driving transitions with the built-in timeline
    pub fn new(config: Config) -> Result<Self> {
        let settings = config.to_engine()?;
        Ok(Self::from_domain(config, PageDomain::with_settings(settings)))
    }

    /// Create a navigator with a custom transition player
    pub fn with_player(config: Config, player: Box<dyn TransitionPlayer>) -> Result<Self> {
        let settings = config.to_engine()?;
        Ok(Self::from_domain(
            config,
            PageDomain::with_player(settings, player),
        ))
    }

    fn from_domain(config: Config, domain: PageDomain) -> Self {
        tracing::info!(
            policy = ?config.in_flight_policy,
            loop_subpages = config.loop_subpages,
            transitions = config.transitions.is_some(),
            "Navigator initialized"
        );

        Self {
            config: Arc::new(config),
            domain: Arc::new(Mutex::new(domain)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `f` with exclusive access to the page domain
    pub fn with_domain<R>(&self, f: impl FnOnce(&mut PageDomain) -> R) -> R {
        f(&mut self.domain.lock())
    }

    // === Tree operations ===

    pub fn create_page(&self, name: impl Into<String>) -> PageId {
        self.domain.lock().create_page(name)
    }

    pub fn create_host(&self, name: impl Into<String>) -> PageId {
        self.domain.lock().create_host(name)
    }

    pub fn create_content(&self, name: impl Into<String>) -> PageId {
        self.domain.lock().create_content(name)
    }

    pub fn set_behavior(&self, page: PageId, behavior: Box<dyn PageBehavior>) -> Result<()> {
        Ok(self.domain.lock().set_behavior(page, behavior)?)
    }

    pub fn attach(&self, child: PageId, parent: Option<PageId>) -> Result<()> {
        Ok(self.domain.lock().attach(child, parent)?)
    }

    pub fn detach(&self, id: PageId) -> Result<()> {
        Ok(self.domain.lock().detach(id)?)
    }

    pub fn remove(&self, id: PageId) -> Result<()> {
        Ok(self.domain.lock().remove(id)?)
    }

    pub fn set_auto_activate(&self, page: PageId, auto_activate: bool) -> Result<()> {
        Ok(self.domain.lock().set_auto_activate(page, auto_activate)?)
    }

    // === Navigation ===

    pub fn execute(&self, command: NavigationCommand) -> Result<NavigationOutcome> {
        Ok(self.domain.lock().execute(command)?)
    }

    /// Execute a command given as JSON, e.g.
    /// `{"type": "navigate_next", "host": {...}, "immediate": true}`
    pub fn execute_json(&self, json: &str) -> Result<NavigationOutcome> {
        let command: NavigationCommand = serde_json::from_str(json)?;
        self.execute(command)
    }

    /// Navigate with the configured immediacy
    pub fn navigate_to(&self, target: PageId) -> Result<NavigationOutcome> {
        self.execute(NavigationCommand::navigate_to(
            target,
            self.config.default_immediate,
        ))
    }

    pub fn navigate_next(&self, host: PageId) -> Result<NavigationOutcome> {
        self.execute(NavigationCommand::navigate_next(
            host,
            self.config.default_immediate,
        ))
    }

    pub fn navigate_previous(&self, host: PageId) -> Result<NavigationOutcome> {
        self.execute(NavigationCommand::navigate_previous(
            host,
            self.config.default_immediate,
        ))
    }

    pub fn navigate_parent(&self, page: PageId) -> Result<NavigationOutcome> {
        self.execute(NavigationCommand::navigate_parent(
            page,
            self.config.default_immediate,
        ))
    }

    /// Advance transitions by one frame
    pub fn update(&self, delta: Duration) {
        self.domain.lock().update(delta);
    }

    pub fn subscribe(&self, listener: NavigationListener) -> ListenerId {
        self.domain.lock().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.domain.lock().unsubscribe(id)
    }

    // === Host settings ===

    pub fn set_default_subpage(&self, host: PageId, page: Option<PageId>) -> Result<()> {
        Ok(self.domain.lock().set_default_subpage(host, page)?)
    }

    pub fn set_loop_subpages(&self, host: PageId, looping: bool) -> Result<()> {
        Ok(self.domain.lock().set_loop_subpages(host, looping)?)
    }

    pub fn set_transition_collection(
        &self,
        host: PageId,
        collection: Option<Arc<TransitionCollection>>,
    ) -> Result<()> {
        Ok(self
            .domain
            .lock()
            .set_transition_collection(host, collection)?)
    }

    /// Load a transition collection from a JSON file and give it to `host`
    pub fn load_transitions(&self, host: PageId, path: &Path) -> Result<()> {
        let collection = TransitionCollection::load(path)?;
        self.set_transition_collection(host, Some(Arc::new(collection)))
    }

    // === Queries ===

    pub fn is_active(&self, page: PageId) -> bool {
        self.domain.lock().is_active(page)
    }

    pub fn active_path(&self, host: PageId) -> Vec<PageId> {
        self.domain.lock().active_path(host)
    }

    pub fn active_pages(&self, host: PageId) -> Vec<PageId> {
        self.domain.lock().active_pages(host)
    }

    pub fn default_subpage(&self, host: PageId) -> Option<PageId> {
        self.domain.lock().default_subpage(host)
    }

    pub fn is_transition_in_progress(&self, host: PageId) -> bool {
        self.domain.lock().is_transition_in_progress(host)
    }

    pub fn transition_state(&self, page: PageId) -> Option<TransitionState> {
        self.domain.lock().transition_state(page)
    }

    pub fn transition_phase(&self, page: PageId) -> Option<f32> {
        self.domain.lock().transition_phase(page)
    }

    pub fn find(&self, name: &str) -> Option<PageId> {
        self.domain.lock().tree().find(name)
    }

    pub fn subpages(&self, page: PageId) -> Vec<PageId> {
        self.domain.lock().tree().subpages(page)
    }

    pub fn parent_page(&self, page: PageId) -> Option<PageId> {
        self.domain.lock().tree().parent_page(page)
    }

    pub fn is_tree_root(&self, page: PageId) -> bool {
        self.domain.lock().tree().is_tree_root(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use folio_navigation::NavigationError;
    use folio_transitions::Transition;

    fn navigator(config: Config) -> (Navigator, PageId, Vec<PageId>) {
        let navigator = Navigator::new(config).unwrap();
        let host = navigator.create_host("host");
        navigator.attach(host, None).unwrap();
        let pages = ["a", "b", "c"]
            .iter()
            .map(|name| {
                let page = navigator.create_page(*name);
                navigator.attach(page, Some(host)).unwrap();
                page
            })
            .collect();
        (navigator, host, pages)
    }

    #[test]
    fn test_clones_share_state() {
        let (navigator, host, pages) = navigator(Config {
            default_immediate: true,
            ..Config::default()
        });
        let other = navigator.clone();

        other.navigate_to(pages[1]).unwrap();
        assert!(navigator.is_active(pages[1]));
        assert_eq!(navigator.active_path(host), vec![pages[1]]);
        assert_eq!(navigator.find("b"), Some(pages[1]));
        assert_eq!(navigator.parent_page(pages[1]), Some(host));
        assert!(navigator.is_tree_root(host));
        assert_eq!(navigator.subpages(host).len(), 3);
        assert_eq!(other.with_domain(|domain| domain.tree().len()), 4);
    }

    #[test]
    fn test_execute_json_command() {
        let (navigator, host, pages) = navigator(Config::default());

        let json = serde_json::json!({
            "type": "navigate_previous",
            "host": host,
            "immediate": true
        })
        .to_string();
        let outcome = navigator.execute_json(&json).unwrap();
        assert_eq!(outcome, NavigationOutcome::Completed);
        assert_eq!(navigator.active_path(host), vec![pages[2]]);

        assert!(matches!(
            navigator.execute_json(r#"{"type": "jump"}"#),
            Err(CoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_navigation_errors_surface() {
        let (navigator, _, _) = navigator(Config::default());
        let loose = navigator.create_page("loose");

        assert!(matches!(
            navigator.navigate_to(loose),
            Err(CoreError::Navigation(NavigationError::InvalidTarget(_)))
        ));
    }

    #[test]
    fn test_frames_drive_transitions() {
        let (navigator, host, pages) = navigator(Config::default());
        let collection = TransitionCollection::new("fade")
            .with_transition(Transition::fallback(Duration::from_millis(40)));
        navigator
            .set_transition_collection(host, Some(Arc::new(collection)))
            .unwrap();

        let outcome = navigator.navigate_to(pages[0]).unwrap();
        assert_eq!(outcome, NavigationOutcome::Started);
        assert!(navigator.is_transition_in_progress(host));

        for _ in 0..4 {
            navigator.update(Duration::from_millis(10));
        }
        assert!(!navigator.is_transition_in_progress(host));
        assert_eq!(navigator.transition_state(pages[0]), Some(TransitionState::Idle));
        assert_eq!(navigator.default_subpage(host), Some(pages[0]));
    }
}
