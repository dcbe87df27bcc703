//! Page transition state machine
//!
//! ```text
//! Idle
//!   ↓ activation starts        ↓ deactivation starts
//! In                          Out
//!   ↓ completes                ↓ completes
//! Idle                        Idle
//! ```
//!
//! A page is never moved directly between `In` and `Out`; a superseded
//! transition is completed back to `Idle` first.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionState {
    /// No transition is playing
    #[default]
    Idle,
    /// The page is transitioning to the active state
    In,
    /// The page is transitioning to the inactive state
    Out,
}

impl TransitionState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: TransitionState) -> bool {
        match (self, target) {
            (TransitionState::Idle, TransitionState::In) => true,
            (TransitionState::Idle, TransitionState::Out) => true,
            (TransitionState::In, TransitionState::Idle) => true,
            (TransitionState::Out, TransitionState::Idle) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    /// Returns true while an activation or deactivation is playing
    pub fn is_transitioning(&self) -> bool {
        !matches!(self, TransitionState::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionState::Idle => "idle",
            TransitionState::In => "in",
            TransitionState::Out => "out",
        }
    }
}

impl std::fmt::Display for TransitionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransitionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(TransitionState::Idle),
            "in" => Ok(TransitionState::In),
            "out" => Ok(TransitionState::Out),
            _ => Err(format!("Unknown transition state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(TransitionState::Idle.can_transition_to(TransitionState::In));
        assert!(TransitionState::Idle.can_transition_to(TransitionState::Out));
        assert!(TransitionState::In.can_transition_to(TransitionState::Idle));
        assert!(TransitionState::Out.can_transition_to(TransitionState::Idle));
        assert!(TransitionState::Out.can_transition_to(TransitionState::Out));
    }

    #[test]
    fn test_invalid_transitions() {
        // Must settle before reversing direction
        assert!(!TransitionState::In.can_transition_to(TransitionState::Out));
        assert!(!TransitionState::Out.can_transition_to(TransitionState::In));
    }

    #[test]
    fn test_parse() {
        assert_eq!("OUT".parse::<TransitionState>(), Ok(TransitionState::Out));
        assert!("sideways".parse::<TransitionState>().is_err());
    }
}
