//! Folio Core
//!
//! Entry point for applications: loads the configuration, sets up logging
//! and hands out a [`Navigator`], a cloneable handle to one page domain.

mod config;
mod error;
mod navigator;

pub use config::Config;
pub use error::CoreError;
pub use navigator::Navigator;

// Re-export the engine
pub use folio_navigation::{
    EngineSettings, InFlightPolicy, ListenerId, NavigationCommand, NavigationError,
    NavigationEvent, NavigationListener, NavigationOutcome, NavigationRoute, PageDomain,
    RequestQueue,
};
pub use folio_scene::{NodeKind, PageBehavior, PageId, PageProperty, SceneError, TransitionState};
pub use folio_transitions::{
    Direction, Timeline, Transition, TransitionCollection, TransitionError, TransitionPlayer,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging.
///
/// `RUST_LOG` takes precedence over `default_filter`. Does nothing if a
/// global subscriber is already installed.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
