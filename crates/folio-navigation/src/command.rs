//! Navigation commands
//!
//! - `NavigateTo`: make a page the active leaf of its host
//! - `NavigateNext` / `NavigatePrevious`: move to the adjacent subpage of a host
//! - `NavigateParent`: move to the parent page of a page

use serde::{Deserialize, Serialize};

use folio_scene::PageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationCommand {
    NavigateTo {
        target: PageId,
        immediate: bool,
    },
    NavigateNext {
        host: PageId,
        immediate: bool,
        /// Overrides the host's loop setting
        #[serde(default)]
        looping: Option<bool>,
    },
    NavigatePrevious {
        host: PageId,
        immediate: bool,
        #[serde(default)]
        looping: Option<bool>,
    },
    NavigateParent {
        page: PageId,
        immediate: bool,
    },
}

impl NavigationCommand {
    pub fn navigate_to(target: PageId, immediate: bool) -> Self {
        NavigationCommand::NavigateTo { target, immediate }
    }

    pub fn navigate_next(host: PageId, immediate: bool) -> Self {
        NavigationCommand::NavigateNext {
            host,
            immediate,
            looping: None,
        }
    }

    pub fn navigate_previous(host: PageId, immediate: bool) -> Self {
        NavigationCommand::NavigatePrevious {
            host,
            immediate,
            looping: None,
        }
    }

    pub fn navigate_parent(page: PageId, immediate: bool) -> Self {
        NavigationCommand::NavigateParent { page, immediate }
    }

    /// Skip transition animations
    pub fn is_immediate(&self) -> bool {
        match self {
            NavigationCommand::NavigateTo { immediate, .. }
            | NavigationCommand::NavigateNext { immediate, .. }
            | NavigationCommand::NavigatePrevious { immediate, .. }
            | NavigationCommand::NavigateParent { immediate, .. } => *immediate,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NavigationCommand::NavigateTo { .. } => "navigate_to",
            NavigationCommand::NavigateNext { .. } => "navigate_next",
            NavigationCommand::NavigatePrevious { .. } => "navigate_previous",
            NavigationCommand::NavigateParent { .. } => "navigate_parent",
        }
    }
}

/// What happened to an accepted command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationOutcome {
    /// A route was started and is waiting on transitions
    Started,
    /// The route finished within the call, or there was nothing to do
    Completed,
    /// The request was held back and will run later
    Deferred,
    /// No adjacent page to move to
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_scene::SceneTree;

    #[test]
    fn test_immediate_flag() {
        let page = SceneTree::new().create_page("page");

        assert!(NavigationCommand::navigate_to(page, true).is_immediate());
        assert!(!NavigationCommand::navigate_next(page, false).is_immediate());
        assert_eq!(
            NavigationCommand::navigate_parent(page, false).name(),
            "navigate_parent"
        );
    }

    #[test]
    fn test_parse_tagged_json() {
        let json = r#"{ "type": "navigate_previous", "host": { "index": 3, "generation": 1 }, "immediate": true }"#;
        let command: NavigationCommand = serde_json::from_str(json).unwrap();

        match command {
            NavigationCommand::NavigatePrevious {
                host,
                immediate,
                looping,
            } => {
                assert_eq!(host.index(), 3);
                assert_eq!(host.generation(), 1);
                assert!(immediate);
                assert!(looping.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
