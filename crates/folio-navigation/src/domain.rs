//! Page domain
//!
//! Owns the page tree, one [`HostNavigation`] per attached host and the
//! transition player. Every public entry point runs to completion before it
//! returns; commands issued by listeners are either held in the pending slot
//! of a busy host or run once the current call is done.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use folio_scene::{PageBehavior, PageId, SceneError, SceneTree, TransitionState};
use folio_transitions::{Timeline, TransitionCollection, TransitionPlayer};

use crate::command::{NavigationCommand, NavigationOutcome};
use crate::error::NavigationError;
use crate::event::{ListenerId, NavigationEvent, NavigationListener, RequestQueue};
use crate::host::{HostNavigation, PendingRequest};
use crate::resolver;
use crate::settings::{EngineSettings, InFlightPolicy};
use crate::Result;

pub struct PageDomain {
    pub(crate) tree: SceneTree,
    pub(crate) hosts: HashMap<PageId, HostNavigation>,
    pub(crate) player: Box<dyn TransitionPlayer>,
    pub(crate) settings: EngineSettings,
    listeners: Vec<(ListenerId, NavigationListener)>,
    next_listener: u64,
    /// Listener commands that run after the current call
    backlog: VecDeque<NavigationCommand>,
}

impl Default for PageDomain {
    fn default() -> Self {
        Self::new()
    }
}

impl PageDomain {
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self::with_player(settings, Box::new(Timeline::new()))
    }

    pub fn with_player(settings: EngineSettings, player: Box<dyn TransitionPlayer>) -> Self {
        Self {
            tree: SceneTree::new(),
            hosts: HashMap::new(),
            player,
            settings,
            listeners: Vec::new(),
            next_listener: 0,
            backlog: VecDeque::new(),
        }
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn player(&self) -> &dyn TransitionPlayer {
        self.player.as_ref()
    }

    // ==================== Tree ====================

    pub fn create_page(&mut self, name: impl Into<String>) -> PageId {
        self.tree.create_page(name)
    }

    pub fn create_host(&mut self, name: impl Into<String>) -> PageId {
        self.tree.create_host(name)
    }

    pub fn create_content(&mut self, name: impl Into<String>) -> PageId {
        self.tree.create_content(name)
    }

    pub fn set_behavior(&mut self, page: PageId, behavior: Box<dyn PageBehavior>) -> Result<()> {
        self.tree.set_behavior(page, behavior)?;
        Ok(())
    }

    /// Attach `child` under `parent`, or as a tree root.
    ///
    /// Newly attached hosts get their navigation state and pages are
    /// registered with the host whose scope they joined. Root hosts become
    /// active right away and restore their default subpage.
    pub fn attach(&mut self, child: PageId, parent: Option<PageId>) -> Result<()> {
        let attached = self.tree.attach(child, parent)?;
        if attached.is_empty() {
            return Ok(());
        }

        for page in &attached {
            if self.tree.is_page(*page) {
                self.reset_page(*page);
            }
        }

        let hosts: Vec<PageId> = attached
            .iter()
            .copied()
            .filter(|page| self.tree.is_host(*page))
            .collect();
        for page in hosts.iter().copied() {
            self.hosts
                .entry(page)
                .or_insert_with(|| HostNavigation::new(page, &self.settings));
            tracing::info!(host = %page, name = ?self.tree.name(page), "Registered page host");
        }

        for page in attached.iter().copied() {
            if !self.tree.is_page(page) {
                continue;
            }
            let Some(host) = self.tree.nearest_host(page) else {
                continue;
            };
            let auto_activate = self.tree.is_auto_activate(page);
            let registered = self
                .hosts
                .get_mut(&host)
                .map(|nav| nav.register(page, auto_activate))
                .unwrap_or(false);
            if registered {
                self.emit(NavigationEvent::Registered { page, host });
            }
        }

        for page in hosts {
            if self.tree.nearest_host(page).is_none() {
                self.set_page_active(page, true);
                self.emit(NavigationEvent::Activated { page });
                self.restore_host(page, true);
            }
        }

        // Auto-activate pages that joined an active scope
        if let Some(host) = self.tree.nearest_host(child) {
            self.reconcile_host(host);
        }

        self.drain_backlog();
        Ok(())
    }

    /// Detach a node from the tree.
    ///
    /// Route sides waiting on detached pages complete at once, so every route
    /// still reaches its end. The nodes stay alive and can be attached again.
    pub fn detach(&mut self, id: PageId) -> Result<()> {
        let owners: Vec<(PageId, Option<PageId>)> = if self.tree.lock(id).is_some() {
            self.tree
                .descendants(id)
                .into_iter()
                .filter(|page| self.tree.is_page(*page))
                .map(|page| (page, self.tree.nearest_host(page)))
                .collect()
        } else {
            Vec::new()
        };

        self.tree.detach(id)?;

        for (page, _) in owners.iter().rev() {
            self.force_complete(*page);
        }

        for (page, host) in owners.iter().rev() {
            let (page, host) = (*page, *host);

            if let Some(nav) = self.hosts.get(&page) {
                if nav.route.is_some() {
                    self.abort_route(page, false);
                }
            }
            if let Some(mut nav) = self.hosts.remove(&page) {
                for data in nav.runtimes.values_mut() {
                    data.detach_transition_runtime(self.player.as_mut());
                }
                tracing::info!(host = %page, "Removed page host");
            }

            if let Some(host) = host {
                let removed = self.hosts.get_mut(&host).and_then(|nav| nav.unregister(page));
                if let Some(mut data) = removed {
                    data.detach_transition_runtime(self.player.as_mut());
                    self.emit(NavigationEvent::Unregistered { page, host });
                }
            }

            self.reset_page(page);
        }

        self.drain_backlog();
        Ok(())
    }

    /// Detach a node if needed and free it with its descendants.
    /// Handles to the removed nodes go stale.
    pub fn remove(&mut self, id: PageId) -> Result<()> {
        match self.detach(id) {
            Ok(()) | Err(NavigationError::Scene(SceneError::Detached(_))) => {}
            Err(e) => return Err(e),
        }
        self.tree.remove(id)?;
        Ok(())
    }

    /// Change the auto-activate flag of a page and bring its scope in line
    pub fn set_auto_activate(&mut self, page: PageId, auto_activate: bool) -> Result<()> {
        if !self.tree.set_auto_activate(page, auto_activate)? {
            return Ok(());
        }

        if let Some(host) = self.tree.nearest_host(page) {
            if let Some(data) = self
                .hosts
                .get_mut(&host)
                .and_then(|nav| nav.runtimes.get_mut(&page))
            {
                data.on_property_changed(auto_activate);
            }

            let parent_active = self
                .tree
                .parent_page(page)
                .map(|parent| self.tree.is_active(parent))
                .unwrap_or(false);
            if parent_active {
                self.reconcile_host(host);
            }
        }

        self.drain_backlog();
        Ok(())
    }

    // ==================== Commands ====================

    pub fn execute(&mut self, command: NavigationCommand) -> Result<NavigationOutcome> {
        tracing::debug!(
            command = command.name(),
            immediate = command.is_immediate(),
            "Executing navigation command"
        );

        let outcome = self.submit(command);
        self.drain_backlog();
        outcome
    }

    pub fn navigate_to(&mut self, target: PageId, immediate: bool) -> Result<NavigationOutcome> {
        self.execute(NavigationCommand::navigate_to(target, immediate))
    }

    pub fn navigate_next(&mut self, host: PageId, immediate: bool) -> Result<NavigationOutcome> {
        self.execute(NavigationCommand::navigate_next(host, immediate))
    }

    pub fn navigate_previous(
        &mut self,
        host: PageId,
        immediate: bool,
    ) -> Result<NavigationOutcome> {
        self.execute(NavigationCommand::navigate_previous(host, immediate))
    }

    pub fn navigate_parent(&mut self, page: PageId, immediate: bool) -> Result<NavigationOutcome> {
        self.execute(NavigationCommand::navigate_parent(page, immediate))
    }

    /// Advance transition playback and complete the route sides whose
    /// transitions finished
    pub fn update(&mut self, delta: Duration) {
        let finished = self.player.advance(delta);
        for done in finished {
            if !self.complete_transition(done.page, Some(done.playback)) {
                tracing::warn!(
                    page = %done.page,
                    playback = %done.playback,
                    "Transition finished for a page with no waiting navigation entry"
                );
            }
        }
        self.drain_backlog();
    }

    /// Report that the transition of `page` finished, for players driven
    /// outside of [`PageDomain::update`].
    ///
    /// Returns false if no route was waiting on the page.
    pub fn on_page_transition_completed(&mut self, page: PageId) -> bool {
        let completed = self.complete_transition(page, None);
        self.drain_backlog();
        completed
    }

    fn submit(&mut self, command: NavigationCommand) -> Result<NavigationOutcome> {
        match self.resolve_command(&command)? {
            Some((host, request)) => self.request(host, request.target, request.immediate),
            None => Ok(NavigationOutcome::Unchanged),
        }
    }

    /// Work out which host handles a command and where it goes.
    ///
    /// Returns None when there is no adjacent page to move to.
    fn resolve_command(
        &self,
        command: &NavigationCommand,
    ) -> Result<Option<(PageId, PendingRequest)>> {
        let (host, target, immediate) = match *command {
            NavigationCommand::NavigateTo { target, immediate } => {
                if !self.tree.lock(target).is_some_and(|node| node.kind().is_page()) {
                    return Err(NavigationError::InvalidTarget(target));
                }
                (self.handling_host(target)?, target, immediate)
            }
            NavigationCommand::NavigateNext {
                host,
                immediate,
                looping,
            } => match self.adjacent_subpage(host, true, looping)? {
                Some(target) => (host, target, immediate),
                None => return Ok(None),
            },
            NavigationCommand::NavigatePrevious {
                host,
                immediate,
                looping,
            } => match self.adjacent_subpage(host, false, looping)? {
                Some(target) => (host, target, immediate),
                None => return Ok(None),
            },
            NavigationCommand::NavigateParent { page, immediate } => {
                if self.tree.lock(page).is_none() {
                    return Err(NavigationError::InvalidTarget(page));
                }
                let target = self
                    .tree
                    .parent_page(page)
                    .ok_or(NavigationError::NoParentPage(page))?;
                (self.handling_host(target)?, target, immediate)
            }
        };

        Ok(Some((host, PendingRequest { target, immediate })))
    }

    /// Host that navigates to `target`: an active host handles requests for
    /// itself, every other page goes to its nearest host
    fn handling_host(&self, target: PageId) -> Result<PageId> {
        let enclosing = self.tree.nearest_host(target);
        if self.tree.is_host(target) && (self.tree.is_active(target) || enclosing.is_none()) {
            return Ok(target);
        }
        enclosing.ok_or(NavigationError::NoHost(target))
    }

    fn adjacent_subpage(
        &self,
        host: PageId,
        forward: bool,
        looping: Option<bool>,
    ) -> Result<Option<PageId>> {
        let nav = self.hosts.get(&host).ok_or(NavigationError::NotAHost(host))?;
        let subpages = self.tree.subpages(host);
        let Some(last) = subpages.len().checked_sub(1) else {
            return Ok(None);
        };
        let looping = looping.unwrap_or(nav.loop_subpages);

        let current = self
            .current_subpage(host)
            .and_then(|page| subpages.iter().position(|p| *p == page));
        let Some(current) = current else {
            return Ok(Some(if forward { subpages[0] } else { subpages[last] }));
        };

        let next = match (forward, current) {
            (true, i) if i < last => Some(i + 1),
            (true, _) if looping => Some(0),
            (false, 0) if looping => Some(last),
            (false, i) if i > 0 => Some(i - 1),
            _ => None,
        };

        Ok(next.filter(|i| *i != current).map(|i| subpages[i]))
    }

    /// Navigate `host` so that `target` becomes its active leaf.
    ///
    /// Scope is checked before anything changes. A busy host holds the
    /// request, an inactive nested host records it as its default subpage and
    /// asks its enclosing host to activate it.
    pub(crate) fn request(
        &mut self,
        host: PageId,
        target: PageId,
        immediate: bool,
    ) -> Result<NavigationOutcome> {
        self.admit_request(host, target, immediate, false)
    }

    /// Like [`Self::request`]. With `supersede` the request replaces the route
    /// in flight under every in-flight policy.
    fn admit_request(
        &mut self,
        host: PageId,
        target: PageId,
        immediate: bool,
        supersede: bool,
    ) -> Result<NavigationOutcome> {
        resolver::target_chain(&self.tree, host, target)?;
        let enclosing = self.tree.nearest_host(host);

        let Some(nav) = self.hosts.get_mut(&host) else {
            return Err(NavigationError::NotAHost(host));
        };

        if nav.performing_request {
            nav.defer(PendingRequest { target, immediate });
            return Ok(NavigationOutcome::Deferred);
        }

        if !self.tree.is_active(host) {
            if let Some(enclosing) = enclosing {
                if target != host {
                    nav.default_child = Some(target);
                }
                tracing::debug!(host = %host, target = %target, "Activating inactive host first");
                return self.admit_request(enclosing, host, immediate, supersede);
            }
        }

        if nav.route.is_some()
            && !immediate
            && !supersede
            && self.settings.in_flight_policy == InFlightPolicy::Queue
        {
            tracing::debug!(host = %host, target = %target, "Queued navigation request");
            nav.queued = Some(PendingRequest { target, immediate });
            return Ok(NavigationOutcome::Deferred);
        }

        let outcome = self.guarded(host, |domain| {
            domain.abort_route(host, true);
            domain.start_navigation(host, target, immediate)
        })?;

        // A request held during the guard window may have taken over
        Ok(match outcome {
            NavigationOutcome::Completed if self.is_transition_in_progress(host) => {
                NavigationOutcome::Started
            }
            outcome => outcome,
        })
    }

    /// Run `f` with the host's request guard set, then issue whatever request
    /// arrived in the meantime. That request supersedes the route `f` started.
    pub(crate) fn guarded<T>(&mut self, host: PageId, f: impl FnOnce(&mut Self) -> T) -> T {
        let outermost = self
            .hosts
            .get_mut(&host)
            .map(|nav| !std::mem::replace(&mut nav.performing_request, true))
            .unwrap_or(false);

        let result = f(self);

        if outermost {
            let pending = self.hosts.get_mut(&host).and_then(|nav| {
                nav.performing_request = false;
                nav.pending.take()
            });
            if let Some(pending) = pending {
                if let Err(e) =
                    self.admit_request(host, pending.target, pending.immediate, true)
                {
                    tracing::warn!(
                        host = %host,
                        target = %pending.target,
                        error = %e,
                        "Pending navigation request failed"
                    );
                }
            }
        }

        result
    }

    // ==================== Events ====================

    pub fn subscribe(&mut self, listener: NavigationListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    pub(crate) fn emit(&mut self, event: NavigationEvent) {
        let mut queue = RequestQueue::default();
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event, &mut queue);
        }
        for command in queue.take() {
            self.route_listener_command(command);
        }
    }

    fn route_listener_command(&mut self, command: NavigationCommand) {
        match self.resolve_command(&command) {
            Ok(Some((host, request))) => {
                if let Some(nav) = self.hosts.get_mut(&host).filter(|nav| nav.performing_request) {
                    nav.defer(request);
                } else {
                    self.backlog.push_back(command);
                }
            }
            Ok(None) => {
                tracing::debug!(command = command.name(), "No adjacent page for listener command");
            }
            Err(e) => {
                tracing::warn!(command = command.name(), error = %e, "Rejected listener command");
            }
        }
    }

    fn drain_backlog(&mut self) {
        while let Some(command) = self.backlog.pop_front() {
            if let Err(e) = self.submit(command) {
                tracing::warn!(command = command.name(), error = %e, "Listener command failed");
            }
        }
    }

    // ==================== Queries ====================

    pub fn host(&self, host: PageId) -> Option<&HostNavigation> {
        self.hosts.get(&host)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &HostNavigation> {
        self.hosts.values()
    }

    pub fn is_active(&self, page: PageId) -> bool {
        self.tree.is_active(page)
    }

    pub fn transition_state(&self, page: PageId) -> Option<TransitionState> {
        self.tree.transition_state(page)
    }

    /// Progress of the transition playing on `page`, from 0 to 1
    pub fn transition_phase(&self, page: PageId) -> Option<f32> {
        self.player.phase(page)
    }

    /// Active pages in the scope of `host`, parents before children
    pub fn active_pages(&self, host: PageId) -> Vec<PageId> {
        self.tree
            .scope_pages(host)
            .into_iter()
            .filter(|page| self.tree.is_active(*page))
            .collect()
    }

    /// Active chain below `host`, top first.
    ///
    /// At each level a page that is active on its own is preferred over an
    /// auto-activated one. The chain stops at nested hosts.
    pub fn active_path(&self, host: PageId) -> Vec<PageId> {
        let mut path = Vec::new();
        let mut current = host;
        loop {
            let active: Vec<PageId> = self
                .tree
                .subpages(current)
                .into_iter()
                .filter(|page| self.tree.is_active(*page))
                .collect();
            let next = active
                .iter()
                .copied()
                .find(|page| !self.tree.is_auto_activate(*page))
                .or_else(|| active.first().copied());
            match next {
                Some(page) => {
                    path.push(page);
                    if self.tree.is_host(page) {
                        break;
                    }
                    current = page;
                }
                None => break,
            }
        }
        path
    }

    /// Active subpage of `host`, or the subpage on the way to its default
    /// subpage while nothing is active
    pub fn current_subpage(&self, host: PageId) -> Option<PageId> {
        if let Some(page) = self.active_path(host).first() {
            return Some(*page);
        }
        let mut page = self.hosts.get(&host)?.default_child?;
        loop {
            let parent = self.tree.parent_page(page)?;
            if parent == host {
                return Some(page);
            }
            page = parent;
        }
    }

    pub fn default_subpage(&self, host: PageId) -> Option<PageId> {
        self.hosts.get(&host).and_then(|nav| nav.default_child)
    }

    /// Page restored the next time `host` becomes active
    pub fn set_default_subpage(&mut self, host: PageId, page: Option<PageId>) -> Result<()> {
        if let Some(page) = page {
            resolver::target_chain(&self.tree, host, page)?;
        }
        let nav = self
            .hosts
            .get_mut(&host)
            .ok_or(NavigationError::NotAHost(host))?;
        nav.default_child = page;
        Ok(())
    }

    pub fn transition_collection(&self, host: PageId) -> Option<Arc<TransitionCollection>> {
        self.hosts.get(&host).and_then(|nav| nav.transitions.clone())
    }

    pub fn set_transition_collection(
        &mut self,
        host: PageId,
        collection: Option<Arc<TransitionCollection>>,
    ) -> Result<()> {
        let nav = self
            .hosts
            .get_mut(&host)
            .ok_or(NavigationError::NotAHost(host))?;
        nav.transitions = collection;
        Ok(())
    }

    pub fn loop_subpages(&self, host: PageId) -> Option<bool> {
        self.hosts.get(&host).map(|nav| nav.loop_subpages)
    }

    pub fn set_loop_subpages(&mut self, host: PageId, looping: bool) -> Result<()> {
        let nav = self
            .hosts
            .get_mut(&host)
            .ok_or(NavigationError::NotAHost(host))?;
        nav.loop_subpages = looping;
        Ok(())
    }

    pub fn is_transition_in_progress(&self, host: PageId) -> bool {
        self.hosts
            .get(&host)
            .map(|nav| nav.is_transition_in_progress())
            .unwrap_or(false)
    }

    // ==================== Page state ====================

    pub(crate) fn set_page_active(&mut self, page: PageId, active: bool) {
        if let Err(e) = self.tree.set_active(page, active) {
            tracing::warn!(page = %page, error = %e, "Failed to set page state");
        }
    }

    /// Move the transition state to `state`, passing through Idle when the
    /// page reverses direction
    pub(crate) fn set_transition(&mut self, page: PageId, state: TransitionState) {
        let Some(current) = self.tree.transition_state(page) else {
            return;
        };
        if current == state {
            return;
        }
        if current.is_transitioning() && state.is_transitioning() {
            let _ = self.tree.set_transition_state(page, TransitionState::Idle);
        }
        if let Err(e) = self.tree.set_transition_state(page, state) {
            tracing::warn!(page = %page, error = %e, "Failed to set transition state");
        }
    }

    fn reset_page(&mut self, page: PageId) {
        self.set_page_active(page, false);
        self.set_transition(page, TransitionState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn domain() -> (PageDomain, PageId, Vec<PageId>) {
        let mut domain = PageDomain::new();
        let host = domain.create_host("host");
        domain.attach(host, None).unwrap();
        let pages: Vec<PageId> = ["a", "b", "c"]
            .iter()
            .map(|name| {
                let page = domain.create_page(*name);
                domain.attach(page, Some(host)).unwrap();
                page
            })
            .collect();
        (domain, host, pages)
    }

    #[test]
    fn test_root_host_activates_on_attach() {
        let (domain, host, pages) = domain();
        assert!(domain.is_active(host));
        assert!(domain.host(host).is_some());
        assert_eq!(domain.host(host).unwrap().registered_pages().count(), 3);
        assert!(domain.active_pages(host).is_empty());
        assert!(!domain.is_active(pages[0]));
    }

    #[test]
    fn test_navigate_to_is_immediate_without_transitions() {
        let (mut domain, host, pages) = domain();

        let outcome = domain.navigate_to(pages[1], false).unwrap();
        assert_eq!(outcome, NavigationOutcome::Completed);
        assert_eq!(domain.active_path(host), vec![pages[1]]);
        assert_eq!(domain.default_subpage(host), Some(pages[1]));
        assert!(!domain.is_transition_in_progress(host));
    }

    #[test]
    fn test_invalid_targets_rejected() {
        let (mut domain, host, _) = domain();
        let loose = domain.create_page("loose");
        let content = domain.create_content("content");
        domain.attach(content, Some(host)).unwrap();

        assert!(matches!(
            domain.navigate_to(loose, true),
            Err(NavigationError::InvalidTarget(_))
        ));
        assert!(matches!(
            domain.navigate_to(content, true),
            Err(NavigationError::InvalidTarget(_))
        ));
        assert!(matches!(
            domain.navigate_parent(host, true),
            Err(NavigationError::NoParentPage(_))
        ));
        assert!(domain.active_pages(host).is_empty());
    }

    #[test]
    fn test_next_and_previous_follow_loop_setting() {
        let (mut domain, host, pages) = domain();

        domain.navigate_next(host, true).unwrap();
        assert_eq!(domain.current_subpage(host), Some(pages[0]));

        domain.navigate_previous(host, true).unwrap();
        assert_eq!(domain.current_subpage(host), Some(pages[2]));

        domain.set_loop_subpages(host, false).unwrap();
        let outcome = domain.navigate_next(host, true).unwrap();
        assert_eq!(outcome, NavigationOutcome::Unchanged);
        assert_eq!(domain.current_subpage(host), Some(pages[2]));

        let outcome = domain
            .execute(NavigationCommand::NavigateNext {
                host,
                immediate: true,
                looping: Some(true),
            })
            .unwrap();
        assert_eq!(outcome, NavigationOutcome::Completed);
        assert_eq!(domain.current_subpage(host), Some(pages[0]));
    }

    #[test]
    fn test_navigate_parent_clears_chain() {
        let (mut domain, host, pages) = domain();
        let child = domain.create_page("child");
        domain.attach(child, Some(pages[0])).unwrap();

        domain.navigate_to(child, true).unwrap();
        assert_eq!(domain.active_path(host), vec![pages[0], child]);

        domain.navigate_parent(child, true).unwrap();
        assert_eq!(domain.active_path(host), vec![pages[0]]);

        domain.navigate_parent(pages[0], true).unwrap();
        assert!(domain.active_pages(host).is_empty());
    }

    #[test]
    fn test_nested_host_restores_default_subpage() {
        let (mut domain, host, _) = domain();
        let inner = domain.create_host("inner");
        let b1 = domain.create_page("b1");
        let b2 = domain.create_page("b2");
        domain.attach(inner, Some(host)).unwrap();
        domain.attach(b1, Some(inner)).unwrap();
        domain.attach(b2, Some(inner)).unwrap();

        assert!(matches!(
            domain.set_default_subpage(host, Some(b2)),
            Err(NavigationError::Unreachable { .. })
        ));
        domain.set_default_subpage(inner, Some(b2)).unwrap();
        assert!(!domain.is_active(inner));

        domain.navigate_to(inner, true).unwrap();
        assert_eq!(domain.active_path(host), vec![inner]);
        assert_eq!(domain.active_path(inner), vec![b2]);
    }

    #[test]
    fn test_auto_activate_change_reconciles() {
        let (mut domain, host, pages) = domain();
        domain.navigate_to(pages[0], true).unwrap();

        domain.set_auto_activate(pages[2], true).unwrap();
        assert!(domain.is_active(pages[2]));
        assert_eq!(domain.active_path(host), vec![pages[0]]);

        domain.set_auto_activate(pages[2], false).unwrap();
        assert!(!domain.is_active(pages[2]));
        assert!(domain.is_active(pages[0]));
    }

    #[test]
    fn test_reconcile_keeps_host_targeted_route() {
        let (mut domain, host, pages) = domain();
        domain.set_auto_activate(pages[1], true).unwrap();
        assert!(domain.is_active(pages[1]));

        domain.navigate_to(host, true).unwrap();
        assert_eq!(domain.active_pages(host), vec![pages[1]]);
        assert_eq!(domain.host(host).unwrap().current_target(), Some(host));

        domain.set_auto_activate(pages[1], false).unwrap();
        assert!(!domain.is_active(pages[1]));
        assert!(domain.active_pages(host).is_empty());
    }

    #[test]
    fn test_listener_receives_events() {
        let (mut domain, host, pages) = domain();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = domain.subscribe(Box::new(move |event, _| {
            sink.lock().unwrap().push(*event);
        }));

        domain.navigate_to(pages[0], true).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                NavigationEvent::NavigationStarted { host },
                NavigationEvent::Activated { page: pages[0] },
                NavigationEvent::NavigationFinished { host },
            ]
        );

        assert!(domain.unsubscribe(id));
        assert!(!domain.unsubscribe(id));
        domain.navigate_to(pages[1], true).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 3);
    }
}
