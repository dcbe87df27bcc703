//! Navigation entries and routes
//!
//! An entry is one step of a route. Each side of an entry moves through
//! ```text
//! Inactive → Active → Completed
//! ```
//! and a route moves through
//! ```text
//! NotStarted → InProgress → Finished
//! ```
//! Entries flagged `joined` start together with the entry before them; the
//! scheduler treats such a run of entries as one position of the route.

use serde::{Deserialize, Serialize};

use folio_scene::PageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Activate `to`
    Activate,
    /// Deactivate `from`
    Deactivate,
    /// Deactivate `from` and activate its sibling `to` at the same time
    DeactivateAndActivate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideState {
    /// Not processed yet
    Inactive,
    /// Started, waiting for its transition to finish
    Active,
    /// Done
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEntry {
    pub from: Option<PageId>,
    pub to: Option<PageId>,
    pub operation: Operation,
    pub from_state: SideState,
    pub to_state: SideState,
    /// Starts together with the previous entry
    pub joined: bool,
}

impl NavigationEntry {
    pub fn activate(page: PageId) -> Self {
        Self {
            from: None,
            to: Some(page),
            operation: Operation::Activate,
            from_state: SideState::Completed,
            to_state: SideState::Inactive,
            joined: false,
        }
    }

    pub fn deactivate(page: PageId) -> Self {
        Self {
            from: Some(page),
            to: None,
            operation: Operation::Deactivate,
            from_state: SideState::Inactive,
            to_state: SideState::Completed,
            joined: false,
        }
    }

    pub fn cross(from: PageId, to: PageId) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            operation: Operation::DeactivateAndActivate,
            from_state: SideState::Inactive,
            to_state: SideState::Inactive,
            joined: false,
        }
    }

    pub fn joined(mut self, joined: bool) -> Self {
        self.joined = joined;
        self
    }

    /// Returns true while either side is waiting on a transition
    pub fn is_active(&self) -> bool {
        self.from_state == SideState::Active || self.to_state == SideState::Active
    }

    pub fn is_completed(&self) -> bool {
        self.from_state == SideState::Completed && self.to_state == SideState::Completed
    }

    /// Returns true if `page` is a side of this entry that is still waiting
    pub fn is_waiting_on(&self, page: PageId) -> bool {
        (self.from == Some(page) && self.from_state == SideState::Active)
            || (self.to == Some(page) && self.to_state == SideState::Active)
    }

    pub fn pages(&self) -> impl Iterator<Item = PageId> {
        self.from.into_iter().chain(self.to)
    }

    pub(crate) fn side_mut(&mut self, activating: bool) -> &mut SideState {
        if activating {
            &mut self.to_state
        } else {
            &mut self.from_state
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteStatus {
    NotStarted,
    InProgress,
    Finished,
}

#[derive(Debug, Clone)]
pub struct NavigationRoute {
    entries: Vec<NavigationEntry>,
    target: PageId,
    cursor: usize,
    immediate: bool,
    status: RouteStatus,
}

impl NavigationRoute {
    pub fn new(target: PageId, entries: Vec<NavigationEntry>) -> Self {
        Self {
            entries,
            target,
            cursor: 0,
            immediate: false,
            status: RouteStatus::NotStarted,
        }
    }

    pub fn entries(&self) -> &[NavigationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Page the route was resolved for
    pub fn target(&self) -> PageId {
        self.target
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_immediate(&self) -> bool {
        self.immediate
    }

    pub fn status(&self) -> RouteStatus {
        self.status
    }

    pub(crate) fn begin(&mut self, immediate: bool) {
        self.immediate = immediate;
        self.status = RouteStatus::InProgress;
    }

    pub(crate) fn finish(&mut self) {
        self.status = RouteStatus::Finished;
    }

    /// One past the last entry that starts together with the cursor entry
    pub fn group_end(&self) -> usize {
        let mut end = (self.cursor + 1).min(self.entries.len());
        while end < self.entries.len() && self.entries[end].joined {
            end += 1;
        }
        end
    }

    pub fn current_group(&self) -> &[NavigationEntry] {
        let start = self.cursor.min(self.entries.len());
        &self.entries[start..self.group_end()]
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> Option<&mut NavigationEntry> {
        self.entries.get_mut(index)
    }

    pub fn is_past_end(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    pub fn is_group_completed(&self) -> bool {
        !self.is_past_end() && self.current_group().iter().all(|e| e.is_completed())
    }

    /// Index of the entry in the current group whose side for `page` is waiting
    pub(crate) fn waiting_side(&self, page: PageId) -> Option<(usize, bool)> {
        let start = self.cursor.min(self.entries.len());
        self.current_group()
            .iter()
            .enumerate()
            .find_map(|(offset, entry)| {
                if entry.to == Some(page) && entry.to_state == SideState::Active {
                    Some((start + offset, true))
                } else if entry.from == Some(page) && entry.from_state == SideState::Active {
                    Some((start + offset, false))
                } else {
                    None
                }
            })
    }

    pub(crate) fn advance(&mut self) {
        self.cursor = self.group_end();
    }
}
