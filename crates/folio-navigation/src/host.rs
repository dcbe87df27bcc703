//! Navigation state owned by each page host

use std::collections::HashMap;
use std::sync::Arc;

use folio_scene::PageId;
use folio_transitions::TransitionCollection;

use crate::entry::NavigationRoute;
use crate::runtime::PageRuntimeData;
use crate::settings::EngineSettings;

/// A request held back until the host can take it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingRequest {
    pub target: PageId,
    pub immediate: bool,
}

#[derive(Debug)]
pub struct HostNavigation {
    host: PageId,
    /// Route in flight, if any
    pub(crate) route: Option<NavigationRoute>,
    /// Set while the host resolves and starts a route or processes a completion
    pub(crate) performing_request: bool,
    /// Request received while `performing_request` was set
    pub(crate) pending: Option<PendingRequest>,
    /// Request waiting for the route in flight to finish
    pub(crate) queued: Option<PendingRequest>,
    /// Auto-activate state changed while a route was in flight
    pub(crate) needs_reconcile: bool,
    /// Target of the last route the host resolved
    pub(crate) current_target: Option<PageId>,
    /// Page restored when the host becomes active
    pub(crate) default_child: Option<PageId>,
    pub(crate) runtimes: HashMap<PageId, PageRuntimeData>,
    pub(crate) transitions: Option<Arc<TransitionCollection>>,
    pub(crate) loop_subpages: bool,
}

impl HostNavigation {
    pub fn new(host: PageId, settings: &EngineSettings) -> Self {
        Self {
            host,
            route: None,
            performing_request: false,
            pending: None,
            queued: None,
            needs_reconcile: false,
            current_target: None,
            default_child: None,
            runtimes: HashMap::new(),
            transitions: settings.transitions.clone(),
            loop_subpages: settings.loop_subpages,
        }
    }

    pub fn host(&self) -> PageId {
        self.host
    }

    pub fn route(&self) -> Option<&NavigationRoute> {
        self.route.as_ref()
    }

    pub fn is_transition_in_progress(&self) -> bool {
        self.route.is_some()
    }

    pub fn is_performing_request(&self) -> bool {
        self.performing_request
    }

    pub fn current_target(&self) -> Option<PageId> {
        self.current_target
    }

    pub fn default_child(&self) -> Option<PageId> {
        self.default_child
    }

    pub fn loop_subpages(&self) -> bool {
        self.loop_subpages
    }

    pub fn transition_collection(&self) -> Option<&Arc<TransitionCollection>> {
        self.transitions.as_ref()
    }

    pub fn runtime_data(&self, page: PageId) -> Option<&PageRuntimeData> {
        self.runtimes.get(&page)
    }

    pub fn registered_pages(&self) -> impl Iterator<Item = PageId> + '_ {
        self.runtimes.keys().copied()
    }

    /// Returns true if the page was not registered yet
    pub(crate) fn register(&mut self, page: PageId, auto_activate: bool) -> bool {
        if self.runtimes.contains_key(&page) {
            return false;
        }
        self.runtimes
            .insert(page, PageRuntimeData::new(page, auto_activate));
        true
    }

    pub(crate) fn unregister(&mut self, page: PageId) -> Option<PageRuntimeData> {
        if self.default_child == Some(page) {
            self.default_child = None;
        }
        if self.current_target == Some(page) {
            self.current_target = None;
        }
        self.runtimes.remove(&page)
    }

    /// Hold a request; a later request replaces an earlier one
    pub(crate) fn defer(&mut self, request: PendingRequest) {
        if let Some(previous) = self.pending.replace(request) {
            tracing::debug!(
                host = %self.host,
                discarded = %previous.target,
                target = %request.target,
                "Replaced pending navigation request"
            );
        }
    }
}
