//! Navigation events and listener plumbing

use serde::{Deserialize, Serialize};

use folio_scene::PageId;

use crate::command::NavigationCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationEvent {
    /// A host began a route, before any page of it changes state
    NavigationStarted { host: PageId },
    /// A host's route is over, after every page of it changed state
    NavigationFinished { host: PageId },
    Activated { page: PageId },
    Deactivated { page: PageId },
    /// A page joined the scope of a host
    Registered { page: PageId, host: PageId },
    Unregistered { page: PageId, host: PageId },
}

/// Commands issued by listeners while handling an event
#[derive(Debug, Default)]
pub struct RequestQueue {
    commands: Vec<NavigationCommand>,
}

impl RequestQueue {
    pub fn push(&mut self, command: NavigationCommand) {
        self.commands.push(command);
    }

    pub fn navigate_to(&mut self, target: PageId, immediate: bool) {
        self.push(NavigationCommand::navigate_to(target, immediate));
    }

    pub fn navigate_next(&mut self, host: PageId, immediate: bool) {
        self.push(NavigationCommand::navigate_next(host, immediate));
    }

    pub fn navigate_previous(&mut self, host: PageId, immediate: bool) {
        self.push(NavigationCommand::navigate_previous(host, immediate));
    }

    pub fn navigate_parent(&mut self, page: PageId, immediate: bool) {
        self.push(NavigationCommand::navigate_parent(page, immediate));
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<NavigationCommand> {
        std::mem::take(&mut self.commands)
    }
}

pub type NavigationListener = Box<dyn FnMut(&NavigationEvent, &mut RequestQueue) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
