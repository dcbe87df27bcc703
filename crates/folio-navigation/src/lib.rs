//! Folio Navigation
//!
//! Moves the active page of a host from one page to another:
//! 1. The resolver computes the route: deactivations deepest first, then
//!    activations from the top down, with sibling swaps merged into
//!    cross-transitions
//! 2. The scheduler walks the route one group of entries at a time, waiting for
//!    transition playback to finish before starting the next group
//! 3. [`PageDomain`] ties it to the page tree, routes commands to the right
//!    host and dispatches events to listeners
//!
//! Each host navigates its own scope. A request that arrives while a host is
//! still processing a request is held in the host's pending slot; the most
//! recent one wins.

mod command;
mod domain;
mod entry;
mod error;
mod event;
mod host;
mod resolver;
mod runtime;
mod scheduler;
mod settings;

pub use command::{NavigationCommand, NavigationOutcome};
pub use domain::PageDomain;
pub use entry::{NavigationEntry, NavigationRoute, Operation, RouteStatus, SideState};
pub use error::NavigationError;
pub use event::{ListenerId, NavigationEvent, NavigationListener, RequestQueue};
pub use host::HostNavigation;
pub use resolver::{merge_navigation_entries, resolve_route};
pub use runtime::{PageRuntimeData, TransitionRuntime};
pub use settings::{EngineSettings, InFlightPolicy};

pub use folio_scene::{NodeKind, PageBehavior, PageId, PageProperty, SceneTree, TransitionState};
pub use folio_transitions::{Transition, TransitionCollection, TransitionPlayer};

pub type Result<T> = std::result::Result<T, NavigationError>;
