//! Page node data structure

use serde::{Deserialize, Serialize};

use crate::state::TransitionState;

/// Weak handle to a node in a [`crate::SceneTree`].
///
/// The generation is bumped whenever a slot is reused, so a handle to a
/// removed node never resolves to whatever took its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl PageId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Layout node without navigation state
    Content,
    /// Navigable page
    Page,
    /// Page that manages navigation of the pages in its scope
    Host,
}

impl NodeKind {
    /// Returns true for nodes that take part in navigation
    pub fn is_page(&self) -> bool {
        matches!(self, NodeKind::Page | NodeKind::Host)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Content => "content",
            NodeKind::Page => "page",
            NodeKind::Host => "host",
        }
    }
}

/// Page properties whose changes are reported to behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageProperty {
    State,
    AutoActivate,
}

/// Lifecycle hooks for a concrete kind of page.
///
/// All methods default to doing nothing.
pub trait PageBehavior: Send {
    fn on_attached(&mut self, _page: PageId) {}

    fn on_detached(&mut self, _page: PageId) {}

    fn on_property_changed(&mut self, _page: PageId, _property: PageProperty) {}
}

pub struct PageNode {
    /// Node name, used to build transition paths
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<PageId>,
    pub(crate) children: Vec<PageId>,
    /// Whether the node is reachable from a tree root
    pub(crate) attached: bool,
    /// Logical activation state
    pub(crate) active: bool,
    /// Always activate when the parent page is active
    pub(crate) auto_activate: bool,
    pub(crate) transition: TransitionState,
    pub(crate) behavior: Option<Box<dyn PageBehavior>>,
}

impl PageNode {
    pub(crate) fn new(name: String, kind: NodeKind) -> Self {
        Self {
            name,
            kind,
            parent: None,
            children: Vec::new(),
            attached: false,
            active: false,
            auto_activate: false,
            transition: TransitionState::Idle,
            behavior: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<PageId> {
        self.parent
    }

    pub fn children(&self) -> &[PageId] {
        &self.children
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_auto_activate(&self) -> bool {
        self.auto_activate
    }

    pub fn is_host(&self) -> bool {
        self.kind == NodeKind::Host
    }

    pub fn transition_state(&self) -> TransitionState {
        self.transition
    }

    pub(crate) fn notify(&mut self, id: PageId, property: PageProperty) {
        if let Some(behavior) = self.behavior.as_mut() {
            behavior.on_property_changed(id, property);
        }
    }
}

impl std::fmt::Debug for PageNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageNode")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("attached", &self.attached)
            .field("active", &self.active)
            .field("auto_activate", &self.auto_activate)
            .field("transition", &self.transition)
            .finish()
    }
}
