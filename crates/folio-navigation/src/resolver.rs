//! Route resolution
//!
//! Pure functions over the page tree. Given a host and a target page in its
//! scope, the resolver works out which pages have to change state:
//! - the desired active set is the chain from the host down to the target,
//!   plus every auto-activate page whose parent page ends up active
//! - pages active now but not desired are deactivated, deepest first
//! - pages desired but not active are activated, shallowest first
//!
//! Pages at the same depth of the same phase start together. Finally a
//! deactivation directly followed by the activation of a sibling is merged
//! into one cross-transition.

use std::collections::HashSet;

use folio_scene::{PageId, SceneTree};

use crate::entry::{NavigationEntry, NavigationRoute, Operation};
use crate::error::NavigationError;
use crate::Result;

/// Compute the route that makes `target` the active leaf of `host`.
///
/// `target` may be the host itself, which leaves only auto-activate pages
/// active. Fails without side effects when the target is outside the host's
/// scope.
pub fn resolve_route(tree: &SceneTree, host: PageId, target: PageId) -> Result<NavigationRoute> {
    let chain = target_chain(tree, host, target)?;
    let desired = desired_active_set(tree, host, &chain);

    let scope = tree.scope_pages(host);
    let depth = |page: PageId| tree.page_depth(host, page).unwrap_or(0);

    let mut to_deactivate: Vec<PageId> = scope
        .iter()
        .copied()
        .filter(|page| tree.is_active(*page) && !desired.contains(page))
        .collect();
    to_deactivate.sort_by_key(|page| std::cmp::Reverse(depth(*page)));

    let mut to_activate: Vec<PageId> = scope
        .iter()
        .copied()
        .filter(|page| !tree.is_active(*page) && desired.contains(page))
        .collect();
    to_activate.sort_by_key(|page| depth(*page));

    let mut entries = Vec::with_capacity(to_deactivate.len() + to_activate.len());

    let mut previous_depth = None;
    for page in to_deactivate {
        let level = depth(page);
        entries.push(NavigationEntry::deactivate(page).joined(previous_depth == Some(level)));
        previous_depth = Some(level);
    }

    let mut previous_depth = None;
    for page in to_activate {
        let level = depth(page);
        entries.push(NavigationEntry::activate(page).joined(previous_depth == Some(level)));
        previous_depth = Some(level);
    }

    let mut merged = Vec::with_capacity(entries.len());
    let mut iter = entries.into_iter().peekable();
    while let Some(mut current) = iter.next() {
        if let Some(next) = iter.peek() {
            if merge_navigation_entries(tree, &mut current, next) {
                iter.next();
            }
        }
        merged.push(current);
    }

    Ok(NavigationRoute::new(target, merged))
}

/// Merge `next` into `current` as one cross-transition.
///
/// Only a deactivation followed by the activation of a sibling page merges.
/// Returns true if `next` is no longer needed.
pub fn merge_navigation_entries(
    tree: &SceneTree,
    current: &mut NavigationEntry,
    next: &NavigationEntry,
) -> bool {
    if current.operation != Operation::Deactivate || next.operation != Operation::Activate {
        return false;
    }
    let (Some(from), Some(to)) = (current.from, next.to) else {
        return false;
    };

    match (tree.parent_page(from), tree.parent_page(to)) {
        (Some(a), Some(b)) if a == b => {
            current.to = Some(to);
            current.to_state = next.to_state;
            current.operation = Operation::DeactivateAndActivate;
            true
        }
        _ => false,
    }
}

/// Pages from just below `host` down to `target`, top first
pub(crate) fn target_chain(tree: &SceneTree, host: PageId, target: PageId) -> Result<Vec<PageId>> {
    if tree.lock(host).is_none() || !tree.is_host(host) {
        return Err(NavigationError::NotAHost(host));
    }
    if tree.lock(target).is_none() || !tree.is_page(target) {
        return Err(NavigationError::InvalidTarget(target));
    }

    let mut chain = Vec::new();
    let mut current = target;
    while current != host {
        chain.push(current);
        match tree.parent_page(current) {
            Some(parent) if parent == host => break,
            // Pages below a nested host belong to that host
            Some(parent) if !tree.is_host(parent) => current = parent,
            _ => return Err(NavigationError::Unreachable { target, host }),
        }
    }
    chain.reverse();
    Ok(chain)
}

fn desired_active_set(tree: &SceneTree, host: PageId, chain: &[PageId]) -> HashSet<PageId> {
    let mut desired: HashSet<PageId> = chain.iter().copied().collect();
    let mut work: Vec<PageId> = std::iter::once(host).chain(chain.iter().copied()).collect();

    while let Some(page) = work.pop() {
        if page != host && tree.is_host(page) {
            continue;
        }
        for subpage in tree.subpages(page) {
            if tree.is_auto_activate(subpage) && desired.insert(subpage) {
                work.push(subpage);
            }
        }
    }

    desired
}
