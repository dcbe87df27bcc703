//! Engine settings

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use folio_transitions::TransitionCollection;

/// What an animated request does when its host already has a route in flight.
/// Immediate requests always supersede.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InFlightPolicy {
    /// Settle the started part of the current route and navigate right away
    #[default]
    Supersede,
    /// Hold the request until the current route finishes
    Queue,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Initial loop setting of new hosts
    pub loop_subpages: bool,
    pub in_flight_policy: InFlightPolicy,
    /// Initial transition collection of new hosts
    pub transitions: Option<Arc<TransitionCollection>>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            loop_subpages: true,
            in_flight_policy: InFlightPolicy::Supersede,
            transitions: None,
        }
    }
}
