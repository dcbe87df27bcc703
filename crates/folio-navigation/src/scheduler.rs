//! Navigation scheduler
//!
//! Walks a host's route one group of entries at a time. Starting a side sets
//! the page's state and plays its transition; the group is done when every
//! side completed, either right away or when the player reports the end of
//! the transition. Then the runtimes of the group are released and the next
//! group starts, until the route is over.

use folio_scene::{PageId, TransitionState};
use folio_transitions::PlaybackId;

use crate::command::NavigationOutcome;
use crate::domain::PageDomain;
use crate::entry::{Operation, SideState};
use crate::error::NavigationError;
use crate::event::NavigationEvent;
use crate::host::PendingRequest;
use crate::resolver;
use crate::runtime::{PageRuntimeData, TransitionRuntime};
use crate::Result;

/// One side of a route entry about to start
struct Side {
    index: usize,
    page: PageId,
    activating: bool,
    /// Transition paths, `(from, to)`
    paths: (Option<PageId>, Option<PageId>),
}

impl PageDomain {
    /// Resolve and start a route. Must run under the host's request guard.
    pub(crate) fn start_navigation(
        &mut self,
        host: PageId,
        target: PageId,
        immediate: bool,
    ) -> Result<NavigationOutcome> {
        let mut route = resolver::resolve_route(&self.tree, host, target)?;
        let nav = self
            .hosts
            .get_mut(&host)
            .ok_or(NavigationError::NotAHost(host))?;
        nav.current_target = Some(target);
        if target != host {
            nav.default_child = Some(target);
        }

        if route.is_empty() {
            tracing::debug!(host = %host, target = %target, "Navigation route is empty");
            return Ok(NavigationOutcome::Completed);
        }

        tracing::info!(
            host = %host,
            target = %target,
            entries = route.len(),
            immediate,
            "Starting navigation"
        );
        for (index, entry) in route.entries().iter().enumerate() {
            tracing::debug!(
                host = %host,
                index,
                operation = ?entry.operation,
                from = ?entry.from,
                to = ?entry.to,
                joined = entry.joined,
                "Navigation route entry"
            );
        }

        route.begin(immediate);
        nav.route = Some(route);

        self.emit(NavigationEvent::NavigationStarted { host });
        if self.hosts.get(&host).is_some_and(|nav| nav.pending.is_some()) {
            tracing::debug!(host = %host, "Navigation superseded before its first entry");
            self.abort_route(host, true);
            return Ok(NavigationOutcome::Completed);
        }
        self.start_navigation_entry(host);
        self.progress_navigation(host);

        if self.is_transition_in_progress(host) {
            Ok(NavigationOutcome::Started)
        } else {
            Ok(NavigationOutcome::Completed)
        }
    }

    /// Start every side of the group at the cursor
    pub(crate) fn start_navigation_entry(&mut self, host: PageId) {
        let Some(route) = self.hosts.get(&host).and_then(|nav| nav.route.as_ref()) else {
            return;
        };

        let start = route.cursor();
        let mut sides = Vec::new();
        for (offset, entry) in route.current_group().iter().enumerate() {
            let cross = entry.operation == Operation::DeactivateAndActivate;
            if let Some(page) = entry.from.filter(|_| entry.from_state == SideState::Inactive) {
                let paths = if cross {
                    (entry.from, entry.to)
                } else {
                    (Some(page), self.tree.parent_page(page))
                };
                sides.push(Side {
                    index: start + offset,
                    page,
                    activating: false,
                    paths,
                });
            }
            if let Some(page) = entry.to.filter(|_| entry.to_state == SideState::Inactive) {
                let paths = if cross {
                    (entry.from, entry.to)
                } else {
                    (self.tree.parent_page(page), Some(page))
                };
                sides.push(Side {
                    index: start + offset,
                    page,
                    activating: true,
                    paths,
                });
            }
        }

        for side in sides {
            self.start_side(host, side);
        }
    }

    fn start_side(&mut self, host: PageId, side: Side) {
        let Side {
            index,
            page,
            activating,
            paths,
        } = side;

        let Some(node) = self.tree.lock(page) else {
            tracing::warn!(
                host = %host,
                page = %page,
                "Page detached before its navigation entry started"
            );
            self.mark_side(host, index, activating, SideState::Completed);
            return;
        };
        let was_active = node.is_active();

        // A deactivating host stops being active before its scope is torn down
        if !activating && self.tree.is_host(page) {
            self.set_page_active(page, false);
            self.suspend_host(page);
        }

        self.set_page_active(page, activating);
        self.set_transition(
            page,
            if activating {
                TransitionState::In
            } else {
                TransitionState::Out
            },
        );
        self.mark_side(host, index, activating, SideState::Active);

        let immediate = self
            .hosts
            .get(&host)
            .and_then(|nav| nav.route.as_ref())
            .map(|route| route.is_immediate())
            .unwrap_or(true);
        let animated =
            !immediate && self.start_page_transition(host, page, activating, was_active, paths);

        if !animated {
            self.complete_side(host, index, page, activating, true);
        }
    }

    /// Bind and start the transition for one side.
    ///
    /// Returns false when nothing plays, in which case the side completes at
    /// once.
    fn start_page_transition(
        &mut self,
        host: PageId,
        page: PageId,
        activating: bool,
        was_active: bool,
        paths: (Option<PageId>, Option<PageId>),
    ) -> bool {
        let path = |node: Option<PageId>| match node {
            Some(node) => self.tree.path(host, node),
            None => Some(String::new()),
        };
        let (Some(from), Some(to)) = (path(paths.0), path(paths.1)) else {
            return false;
        };
        let auto_activate = self.tree.is_auto_activate(page);

        let Some(nav) = self.hosts.get_mut(&host) else {
            return false;
        };
        let Some(found) = nav
            .transitions
            .as_ref()
            .and_then(|collection| collection.find_transition(&from, &to))
        else {
            return false;
        };

        tracing::debug!(
            host = %host,
            page = %page,
            from = %from,
            to = %to,
            reversed = found.reversed,
            "Binding transition"
        );

        let data = nav
            .runtimes
            .entry(page)
            .or_insert_with(|| PageRuntimeData::new(page, auto_activate));
        data.attach_transition_runtime(TransitionRuntime::new(found));
        data.start_transition(self.player.as_mut(), activating, was_active)
    }

    fn mark_side(&mut self, host: PageId, index: usize, activating: bool, state: SideState) {
        if let Some(entry) = self
            .hosts
            .get_mut(&host)
            .and_then(|nav| nav.route.as_mut())
            .and_then(|route| route.entry_mut(index))
        {
            *entry.side_mut(activating) = state;
        }
    }

    /// Mark a side completed. Without `notify` the page gets no
    /// activation events, which is how sides of detached pages end.
    fn complete_side(
        &mut self,
        host: PageId,
        index: usize,
        page: PageId,
        activating: bool,
        notify: bool,
    ) {
        self.mark_side(host, index, activating, SideState::Completed);
        self.set_transition(page, TransitionState::Idle);

        if !notify {
            return;
        }
        if activating {
            self.emit(NavigationEvent::Activated { page });
            if self.tree.lock(page).is_some() && self.hosts.contains_key(&page) {
                let immediate = self
                    .hosts
                    .get(&host)
                    .and_then(|nav| nav.route.as_ref())
                    .map(|route| route.is_immediate())
                    .unwrap_or(true);
                self.restore_host(page, immediate);
            }
        } else {
            self.emit(NavigationEvent::Deactivated { page });
        }
    }

    /// Release the runtimes of the finished group and move on
    fn finish_navigation_entry(&mut self, host: PageId) {
        let Some(nav) = self.hosts.get_mut(&host) else {
            return;
        };
        let Some(route) = nav.route.as_mut() else {
            return;
        };

        for page in route.current_group().iter().flat_map(|entry| entry.pages()) {
            if let Some(data) = nav.runtimes.get_mut(&page) {
                data.detach_transition_runtime(self.player.as_mut());
            }
        }

        route.advance();
        if route.is_past_end() {
            self.finish_navigation(host);
        } else {
            self.start_navigation_entry(host);
        }
    }

    pub(crate) fn progress_navigation(&mut self, host: PageId) {
        while self
            .hosts
            .get(&host)
            .and_then(|nav| nav.route.as_ref())
            .is_some_and(|route| route.is_group_completed())
        {
            self.finish_navigation_entry(host);
        }
    }

    fn finish_navigation(&mut self, host: PageId) {
        let reconcile_target = self.reconcile_target(host);
        let Some(nav) = self.hosts.get_mut(&host) else {
            return;
        };
        let Some(mut route) = nav.route.take() else {
            return;
        };
        route.finish();

        if nav.pending.is_none() {
            nav.pending = nav.queued.take();
        } else {
            nav.queued = None;
        }
        if std::mem::take(&mut nav.needs_reconcile) && nav.pending.is_none() {
            nav.pending = Some(PendingRequest {
                target: reconcile_target,
                immediate: true,
            });
        }

        tracing::info!(host = %host, target = %route.target(), "Navigation finished");
        self.emit(NavigationEvent::NavigationFinished { host });
    }

    /// Settle the started group of the route in flight and drop the rest.
    ///
    /// Sides waiting on transitions complete right away; entries that did not
    /// start yet never run.
    pub(crate) fn abort_route(&mut self, host: PageId, restore_nested: bool) {
        let Some(nav) = self.hosts.get_mut(&host) else {
            return;
        };
        let Some(route) = nav.route.as_ref() else {
            return;
        };

        let start = route.cursor();
        let mut waiting = Vec::new();
        for (offset, entry) in route.current_group().iter().enumerate() {
            if let Some(page) = entry.from.filter(|_| entry.from_state == SideState::Active) {
                waiting.push((start + offset, page, false));
            }
            if let Some(page) = entry.to.filter(|_| entry.to_state == SideState::Active) {
                waiting.push((start + offset, page, true));
            }
        }
        nav.queued = None;
        nav.needs_reconcile = false;

        tracing::info!(
            host = %host,
            target = %route.target(),
            waiting = waiting.len(),
            "Superseding navigation in flight"
        );

        for (index, page, activating) in waiting {
            if let Some(data) = self
                .hosts
                .get_mut(&host)
                .and_then(|nav| nav.runtimes.get_mut(&page))
            {
                data.detach_transition_runtime(self.player.as_mut());
            }
            self.mark_side(host, index, activating, SideState::Completed);
            self.set_transition(page, TransitionState::Idle);

            if self.tree.lock(page).is_none() {
                continue;
            }
            if activating {
                self.emit(NavigationEvent::Activated { page });
                if restore_nested
                    && self.tree.lock(page).is_some()
                    && self.hosts.contains_key(&page)
                {
                    self.restore_host(page, true);
                }
            } else {
                self.emit(NavigationEvent::Deactivated { page });
            }
        }

        if let Some(mut route) = self.hosts.get_mut(&host).and_then(|nav| nav.route.take()) {
            route.finish();
            self.emit(NavigationEvent::NavigationFinished { host });
        }
    }

    /// Deactivate the whole active scope of a host at once, deepest first.
    ///
    /// Requests that reach the host meanwhile are dropped. The default subpage
    /// is kept for the next activation.
    pub(crate) fn suspend_host(&mut self, host: PageId) {
        let Some(nav) = self.hosts.get_mut(&host) else {
            return;
        };
        let previous = std::mem::replace(&mut nav.performing_request, true);

        self.abort_route(host, false);

        let mut pages = self.active_pages(host);
        pages.sort_by_key(|page| std::cmp::Reverse(self.tree.page_depth(host, *page).unwrap_or(0)));

        for page in pages {
            if self.tree.is_host(page) {
                self.set_page_active(page, false);
                self.suspend_host(page);
            }
            self.set_page_active(page, false);
            self.set_transition(page, TransitionState::Idle);
            if let Some(data) = self
                .hosts
                .get_mut(&host)
                .and_then(|nav| nav.runtimes.get_mut(&page))
            {
                data.detach_transition_runtime(self.player.as_mut());
            }
            self.emit(NavigationEvent::Deactivated { page });
        }

        if let Some(nav) = self.hosts.get_mut(&host) {
            nav.performing_request = previous;
            if let Some(dropped) = nav.pending.take() {
                tracing::debug!(
                    host = %host,
                    target = %dropped.target,
                    "Dropped request to suspended host"
                );
            }
            nav.queued = None;
            nav.needs_reconcile = false;
        }

        tracing::debug!(host = %host, "Suspended page host");
    }

    /// Navigate a host that just became active to its default subpage
    pub(crate) fn restore_host(&mut self, host: PageId, immediate: bool) {
        let Some(nav) = self.hosts.get(&host) else {
            return;
        };
        let target = nav
            .default_child
            .filter(|page| resolver::target_chain(&self.tree, host, *page).is_ok())
            .unwrap_or(host);

        tracing::debug!(host = %host, target = %target, "Restoring page host");

        if let Err(e) = self.request(host, target, immediate) {
            tracing::warn!(
                host = %host,
                target = %target,
                error = %e,
                "Failed to restore page host"
            );
        }
    }

    /// Bring the active set of a host in line with its auto-activate flags.
    /// A host with a route in flight does it once the route finishes.
    pub(crate) fn reconcile_host(&mut self, host: PageId) {
        if !self.tree.is_active(host) {
            return;
        }
        let target = self.reconcile_target(host);
        let Some(nav) = self.hosts.get_mut(&host) else {
            return;
        };
        if nav.route.is_some() {
            nav.needs_reconcile = true;
            return;
        }

        if let Err(e) = self.request(host, target, true) {
            tracing::warn!(host = %host, error = %e, "Failed to reconcile page host");
        }
    }

    /// Target of the host's last route while it is still in scope, otherwise
    /// the deepest active page
    fn reconcile_target(&self, host: PageId) -> PageId {
        self.hosts
            .get(&host)
            .and_then(|nav| nav.current_target)
            .filter(|target| resolver::target_chain(&self.tree, host, *target).is_ok())
            .or_else(|| self.active_path(host).last().copied())
            .unwrap_or(host)
    }

    /// Complete the side waiting on `page`.
    ///
    /// With a playback id, the notice is ignored unless it belongs to the
    /// transition currently bound to the page.
    pub(crate) fn complete_transition(
        &mut self,
        page: PageId,
        playback: Option<PlaybackId>,
    ) -> bool {
        let found = self.hosts.iter().find_map(|(host, nav)| {
            let (index, activating) = nav.route.as_ref()?.waiting_side(page)?;
            let current = nav.runtimes.get(&page).and_then(|data| data.playback());
            match playback {
                Some(playback) if current != Some(playback) => None,
                _ => Some((*host, index, activating)),
            }
        });
        let Some((host, index, activating)) = found else {
            return false;
        };

        self.guarded(host, |domain| {
            domain.complete_side(host, index, page, activating, true);
            domain.progress_navigation(host);
        });
        true
    }

    /// Complete the side waiting on a page that left the tree
    pub(crate) fn force_complete(&mut self, page: PageId) {
        let found = self.hosts.iter().find_map(|(host, nav)| {
            let (index, activating) = nav.route.as_ref()?.waiting_side(page)?;
            Some((*host, index, activating))
        });
        let Some((host, index, activating)) = found else {
            return;
        };

        tracing::warn!(host = %host, page = %page, "Page detached mid-route, completing its side");

        self.guarded(host, |domain| {
            if let Some(data) = domain
                .hosts
                .get_mut(&host)
                .and_then(|nav| nav.runtimes.get_mut(&page))
            {
                data.detach_transition_runtime(domain.player.as_mut());
            }
            domain.complete_side(host, index, page, activating, false);
            domain.progress_navigation(host);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EngineSettings;
    use folio_transitions::{Transition, TransitionCollection};
    use std::sync::Arc;
    use std::time::Duration;

    fn animated_domain() -> (PageDomain, PageId, Vec<PageId>) {
        let collection = TransitionCollection::new("default")
            .with_transition(Transition::fallback(Duration::from_millis(100)));
        let settings = EngineSettings {
            transitions: Some(Arc::new(collection)),
            ..EngineSettings::default()
        };
        let mut domain = PageDomain::with_settings(settings);
        let host = domain.create_host("host");
        domain.attach(host, None).unwrap();
        let pages = ["a", "b"]
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
    fn test_animated_route_waits_for_player() {
        let (mut domain, host, pages) = animated_domain();

        let outcome = domain.navigate_to(pages[0], false).unwrap();
        assert_eq!(outcome, NavigationOutcome::Started);
        assert!(domain.is_active(pages[0]));
        assert_eq!(domain.transition_state(pages[0]), Some(TransitionState::In));
        assert!(domain.is_transition_in_progress(host));

        domain.update(Duration::from_millis(50));
        assert!(domain.is_transition_in_progress(host));
        assert!(domain.transition_phase(pages[0]).is_some());

        domain.update(Duration::from_millis(60));
        assert!(!domain.is_transition_in_progress(host));
        assert_eq!(domain.transition_state(pages[0]), Some(TransitionState::Idle));
        assert!(domain.host(host).unwrap().runtime_data(pages[0]).unwrap().runtime().is_none());
    }

    #[test]
    fn test_cross_entry_plays_both_sides() {
        let (mut domain, host, pages) = animated_domain();
        domain.navigate_to(pages[0], true).unwrap();

        domain.navigate_to(pages[1], false).unwrap();
        let route = domain.host(host).unwrap().route().unwrap();
        assert_eq!(route.len(), 1);
        assert_eq!(route.entries()[0].operation, Operation::DeactivateAndActivate);
        assert_eq!(domain.transition_state(pages[0]), Some(TransitionState::Out));
        assert_eq!(domain.transition_state(pages[1]), Some(TransitionState::In));

        domain.update(Duration::from_millis(100));
        assert!(!domain.is_transition_in_progress(host));
        assert!(!domain.is_active(pages[0]));
        assert!(domain.is_active(pages[1]));
    }

    #[test]
    fn test_immediate_request_supersedes() {
        let (mut domain, host, pages) = animated_domain();
        domain.navigate_to(pages[0], false).unwrap();

        let outcome = domain.navigate_to(pages[1], true).unwrap();
        assert_eq!(outcome, NavigationOutcome::Completed);
        assert_eq!(domain.active_pages(host), vec![pages[1]]);
        assert_eq!(domain.transition_state(pages[0]), Some(TransitionState::Idle));

        // The superseded playback no longer completes anything
        domain.update(Duration::from_millis(200));
        assert_eq!(domain.active_pages(host), vec![pages[1]]);
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let (mut domain, host, pages) = animated_domain();
        assert!(!domain.on_page_transition_completed(pages[0]));

        domain.navigate_to(pages[0], false).unwrap();
        let stale = domain.host(host).unwrap().runtime_data(pages[0]).unwrap().playback();
        assert!(stale.is_some());

        domain.navigate_to(host, true).unwrap();
        domain.navigate_to(pages[0], false).unwrap();
        assert!(!domain.complete_transition(pages[0], stale));
        assert!(domain.is_transition_in_progress(host));

        assert!(domain.on_page_transition_completed(pages[0]));
        assert!(!domain.is_transition_in_progress(host));
        assert_eq!(domain.transition_state(pages[0]), Some(TransitionState::Idle));
    }
}
