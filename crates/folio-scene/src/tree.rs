//! Scene tree
//!
//! Arena that owns every node. Handles are weak: [`SceneTree::get`] resolves a
//! handle while the node exists, [`SceneTree::lock`] only while it is also
//! attached to a tree root.

use crate::error::SceneError;
use crate::page::{NodeKind, PageBehavior, PageId, PageNode, PageProperty};
use crate::state::TransitionState;
use crate::Result;

struct Slot {
    generation: u32,
    node: Option<PageNode>,
}

#[derive(Default)]
pub struct SceneTree {
    slots: Vec<Slot>,
    /// Indices of freed slots, reused by the next created node
    free: Vec<u32>,
    roots: Vec<PageId>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_page(&mut self, name: impl Into<String>) -> PageId {
        self.create(name.into(), NodeKind::Page)
    }

    pub fn create_host(&mut self, name: impl Into<String>) -> PageId {
        self.create(name.into(), NodeKind::Host)
    }

    pub fn create_content(&mut self, name: impl Into<String>) -> PageId {
        self.create(name.into(), NodeKind::Content)
    }

    fn create(&mut self, name: String, kind: NodeKind) -> PageId {
        let node = PageNode::new(name, kind);

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            PageId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            PageId {
                index,
                generation: 0,
            }
        }
    }

    /// Resolve a handle to a live node
    pub fn get(&self, id: PageId) -> Option<&PageNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Resolve a handle to a live node that is attached to the tree
    pub fn lock(&self, id: PageId) -> Option<&PageNode> {
        self.get(id).filter(|node| node.attached)
    }

    fn get_mut(&mut self, id: PageId) -> Option<&mut PageNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn node_mut(&mut self, id: PageId) -> Result<&mut PageNode> {
        self.get_mut(id).ok_or(SceneError::NotFound(id))
    }

    pub fn contains(&self, id: PageId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn roots(&self) -> &[PageId] {
        &self.roots
    }

    pub fn set_behavior(&mut self, id: PageId, behavior: Box<dyn PageBehavior>) -> Result<()> {
        self.node_mut(id)?.behavior = Some(behavior);
        Ok(())
    }

    /// Link `child` under `parent`, or make it a tree root when `parent` is None.
    ///
    /// Returns the nodes that became attached, parents before children. The
    /// list is empty when the new parent is itself detached.
    pub fn attach(&mut self, child: PageId, parent: Option<PageId>) -> Result<Vec<PageId>> {
        let node = self.get(child).ok_or(SceneError::NotFound(child))?;
        if node.parent.is_some() || self.roots.contains(&child) {
            return Err(SceneError::AlreadyAttached(child));
        }

        let attached = match parent {
            Some(parent_id) => {
                let parent_attached = self
                    .get(parent_id)
                    .ok_or(SceneError::NotFound(parent_id))?
                    .attached;
                if parent_id == child || self.is_ancestor(child, parent_id) {
                    return Err(SceneError::Cycle {
                        child,
                        parent: parent_id,
                    });
                }
                self.node_mut(parent_id)?.children.push(child);
                self.node_mut(child)?.parent = Some(parent_id);
                parent_attached
            }
            None => {
                self.roots.push(child);
                true
            }
        };

        if !attached {
            return Ok(Vec::new());
        }

        let subtree = self.descendants(child);
        for id in &subtree {
            if let Some(node) = self.get_mut(*id) {
                node.attached = true;
                if let Some(behavior) = node.behavior.as_mut() {
                    behavior.on_attached(*id);
                }
            }
        }

        tracing::debug!(node = %child, count = subtree.len(), "Attached subtree");

        Ok(subtree)
    }

    /// Unlink a node from its parent (or from the roots).
    ///
    /// Returns the nodes that were attached before the call, parents before
    /// children. The nodes stay alive and can be attached again.
    pub fn detach(&mut self, id: PageId) -> Result<Vec<PageId>> {
        let node = self.get(id).ok_or(SceneError::NotFound(id))?;
        let parent = node.parent;
        let was_attached = node.attached;

        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.get_mut(parent_id) {
                parent_node.children.retain(|c| *c != id);
            }
            self.node_mut(id)?.parent = None;
        } else if let Some(pos) = self.roots.iter().position(|r| *r == id) {
            self.roots.remove(pos);
        } else {
            return Err(SceneError::Detached(id));
        }

        if !was_attached {
            return Ok(Vec::new());
        }

        let subtree = self.descendants(id);
        for node_id in &subtree {
            if let Some(node) = self.get_mut(*node_id) {
                node.attached = false;
                if let Some(behavior) = node.behavior.as_mut() {
                    behavior.on_detached(*node_id);
                }
            }
        }

        tracing::debug!(node = %id, count = subtree.len(), "Detached subtree");

        Ok(subtree)
    }

    /// Detach a node and free it together with its descendants.
    ///
    /// Returns the nodes that were attached before the call.
    pub fn remove(&mut self, id: PageId) -> Result<Vec<PageId>> {
        let detached = match self.detach(id) {
            Ok(detached) => detached,
            Err(SceneError::Detached(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        for node_id in self.descendants(id) {
            let slot = &mut self.slots[node_id.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node_id.index);
        }

        Ok(detached)
    }

    /// All nodes below `id` including itself, parents before children
    pub fn descendants(&self, id: PageId) -> Vec<PageId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.get(current) {
                result.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        result
    }

    /// Returns true if `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor(&self, ancestor: PageId, node: PageId) -> bool {
        let mut current = self.get(node).and_then(|n| n.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    pub fn kind(&self, id: PageId) -> Option<NodeKind> {
        self.get(id).map(|n| n.kind)
    }

    pub fn is_host(&self, id: PageId) -> bool {
        self.kind(id) == Some(NodeKind::Host)
    }

    pub fn is_page(&self, id: PageId) -> bool {
        self.kind(id).map(|k| k.is_page()).unwrap_or(false)
    }

    pub fn name(&self, id: PageId) -> Option<&str> {
        self.get(id).map(|n| n.name.as_str())
    }

    /// First live node with the given name
    pub fn find(&self, name: &str) -> Option<PageId> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            slot.node
                .as_ref()
                .filter(|node| node.name == name)
                .map(|_| PageId {
                    index: index as u32,
                    generation: slot.generation,
                })
        })
    }

    /// Nearest ancestor that is a page or a host, skipping content nodes
    pub fn parent_page(&self, id: PageId) -> Option<PageId> {
        let mut current = self.get(id)?.parent;
        while let Some(parent) = current {
            let node = self.get(parent)?;
            if node.kind.is_page() {
                return Some(parent);
            }
            current = node.parent;
        }
        None
    }

    /// Returns true if the page has no parent page
    pub fn is_tree_root(&self, id: PageId) -> bool {
        self.parent_page(id).is_none()
    }

    /// Nearest ancestor host, excluding `id` itself
    pub fn nearest_host(&self, id: PageId) -> Option<PageId> {
        let mut current = self.parent_page(id);
        while let Some(page) = current {
            if self.is_host(page) {
                return Some(page);
            }
            current = self.parent_page(page);
        }
        None
    }

    /// Immediate subpages: the closest page descendants, looking through content nodes
    pub fn subpages(&self, id: PageId) -> Vec<PageId> {
        let mut result = Vec::new();
        if let Some(node) = self.get(id) {
            for child in &node.children {
                self.collect_subpages(*child, &mut result);
            }
        }
        result
    }

    fn collect_subpages(&self, id: PageId, result: &mut Vec<PageId>) {
        let Some(node) = self.get(id) else {
            return;
        };
        if node.kind.is_page() {
            result.push(id);
        } else {
            for child in &node.children {
                self.collect_subpages(*child, result);
            }
        }
    }

    /// Pages managed by `host`: every page below it whose nearest host is
    /// `host`. Nested hosts are included but not descended into.
    pub fn scope_pages(&self, host: PageId) -> Vec<PageId> {
        let mut result = Vec::new();
        let mut stack: Vec<PageId> = self.subpages(host).into_iter().rev().collect();
        while let Some(page) = stack.pop() {
            result.push(page);
            if !self.is_host(page) {
                stack.extend(self.subpages(page).into_iter().rev());
            }
        }
        result
    }

    /// Number of page steps from `host` down to `page`
    pub fn page_depth(&self, host: PageId, page: PageId) -> Option<usize> {
        let mut depth = 0;
        let mut current = page;
        while current != host {
            current = self.parent_page(current)?;
            depth += 1;
        }
        Some(depth)
    }

    /// Slash-separated page names from below `host` down to `page`
    pub fn path(&self, host: PageId, page: PageId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = page;
        while current != host {
            names.push(self.name(current)?.to_string());
            current = self.parent_page(current)?;
        }
        names.reverse();
        Some(names.join("/"))
    }

    pub fn is_active(&self, id: PageId) -> bool {
        self.get(id).map(|n| n.active).unwrap_or(false)
    }

    pub fn is_auto_activate(&self, id: PageId) -> bool {
        self.get(id).map(|n| n.auto_activate).unwrap_or(false)
    }

    pub fn transition_state(&self, id: PageId) -> Option<TransitionState> {
        self.get(id).map(|n| n.transition)
    }

    /// Set the logical activation state, returning whether it changed
    pub fn set_active(&mut self, id: PageId, active: bool) -> Result<bool> {
        let node = self.node_mut(id)?;
        if node.active == active {
            return Ok(false);
        }
        node.active = active;
        node.notify(id, PageProperty::State);
        Ok(true)
    }

    pub fn set_auto_activate(&mut self, id: PageId, auto_activate: bool) -> Result<bool> {
        let node = self.node_mut(id)?;
        if node.auto_activate == auto_activate {
            return Ok(false);
        }
        node.auto_activate = auto_activate;
        node.notify(id, PageProperty::AutoActivate);
        Ok(true)
    }

    pub fn set_transition_state(&mut self, id: PageId, state: TransitionState) -> Result<()> {
        let node = self.node_mut(id)?;
        if !node.transition.can_transition_to(state) {
            return Err(SceneError::InvalidTransition {
                from: node.transition.to_string(),
                to: state.to_string(),
            });
        }

        tracing::trace!(page = %id, from = %node.transition, to = %state, "Page transition state");

        node.transition = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl PageBehavior for Recorder {
        fn on_attached(&mut self, _page: PageId) {
            self.0.lock().unwrap().push("attached".to_string());
        }

        fn on_detached(&mut self, _page: PageId) {
            self.0.lock().unwrap().push("detached".to_string());
        }

        fn on_property_changed(&mut self, _page: PageId, property: PageProperty) {
            self.0.lock().unwrap().push(format!("{:?}", property));
        }
    }

    fn sample() -> (SceneTree, PageId, PageId, PageId, PageId) {
        let mut tree = SceneTree::new();
        let host = tree.create_host("host");
        let layout = tree.create_content("layout");
        let a = tree.create_page("a");
        let b = tree.create_page("b");
        tree.attach(host, None).unwrap();
        tree.attach(layout, Some(host)).unwrap();
        tree.attach(a, Some(layout)).unwrap();
        tree.attach(b, Some(a)).unwrap();
        (tree, host, layout, a, b)
    }

    #[test]
    fn test_attach_and_queries() {
        let (tree, host, layout, a, b) = sample();

        assert!(tree.lock(b).is_some());
        assert_eq!(tree.parent_page(a), Some(host));
        assert_eq!(tree.parent_page(b), Some(a));
        assert_eq!(tree.parent_page(layout), Some(host));
        assert_eq!(tree.subpages(host), vec![a]);
        assert_eq!(tree.nearest_host(b), Some(host));
        assert!(tree.is_tree_root(host));
        assert_eq!(tree.page_depth(host, b), Some(2));
        assert_eq!(tree.path(host, b).as_deref(), Some("a/b"));
    }

    #[test]
    fn test_detach_keeps_nodes_alive() {
        let (mut tree, _host, _layout, a, b) = sample();

        let detached = tree.detach(a).unwrap();
        assert_eq!(detached, vec![a, b]);
        assert!(tree.get(b).is_some());
        assert!(tree.lock(b).is_none());

        // Second detach has nothing to unlink
        assert!(matches!(tree.detach(a), Err(SceneError::Detached(_))));
    }

    #[test]
    fn test_removed_handles_go_stale() {
        let (mut tree, _host, _layout, a, b) = sample();

        tree.remove(a).unwrap();
        assert!(tree.get(a).is_none());
        assert!(tree.get(b).is_none());

        // Slot is reused with a new generation
        let c = tree.create_page("c");
        assert!(c != a && c != b);
        assert!(tree.get(a).is_none());
        assert_eq!(tree.find("c"), Some(c));
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut tree, _host, _layout, a, b) = sample();
        tree.detach(a).unwrap();

        let result = tree.attach(a, Some(b));
        assert!(matches!(result, Err(SceneError::Cycle { .. })));
    }

    #[test]
    fn test_scope_stops_at_nested_host() {
        let mut tree = SceneTree::new();
        let outer = tree.create_host("outer");
        let inner = tree.create_host("inner");
        let a = tree.create_page("a");
        let nested = tree.create_page("nested");
        tree.attach(outer, None).unwrap();
        tree.attach(a, Some(outer)).unwrap();
        tree.attach(inner, Some(outer)).unwrap();
        tree.attach(nested, Some(inner)).unwrap();

        assert_eq!(tree.scope_pages(outer), vec![a, inner]);
        assert_eq!(tree.scope_pages(inner), vec![nested]);
        assert_eq!(tree.nearest_host(nested), Some(inner));
        assert_eq!(tree.nearest_host(inner), Some(outer));
    }

    #[test]
    fn test_behavior_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tree = SceneTree::new();
        let page = tree.create_page("page");
        tree.set_behavior(page, Box::new(Recorder(Arc::clone(&log))))
            .unwrap();

        tree.attach(page, None).unwrap();
        tree.set_auto_activate(page, true).unwrap();
        tree.set_active(page, true).unwrap();
        // Unchanged values do not notify
        tree.set_active(page, true).unwrap();
        tree.detach(page).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["attached", "AutoActivate", "State", "detached"]
        );
    }

    #[test]
    fn test_transition_state_validation() {
        let (mut tree, _host, _layout, a, _b) = sample();

        tree.set_transition_state(a, TransitionState::In).unwrap();
        let result = tree.set_transition_state(a, TransitionState::Out);
        assert!(matches!(result, Err(SceneError::InvalidTransition { .. })));
        tree.set_transition_state(a, TransitionState::Idle).unwrap();
    }
}
