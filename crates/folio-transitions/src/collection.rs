//! Transition collection resource
//!
//! A collection is a list of transition rules. Each rule names a source and a
//! target page by their path relative to the host (`"settings/audio"`); an
//! empty pattern or `"*"` matches any page. A bidirectional rule also applies
//! when navigating from its target back to its source, played in reverse.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Applies in both directions
    #[default]
    Bidirectional,
    /// Applies only from source to target
    Unidirectional,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transition {
    /// Source page path, relative to the host
    #[serde(default)]
    pub from: String,
    /// Target page path, relative to the host
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub direction: Direction,
    /// Zero means the pages switch instantly
    #[serde(default)]
    pub duration_ms: u64,
}

impl Transition {
    pub fn new(from: impl Into<String>, to: impl Into<String>, duration: Duration) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            direction: Direction::Bidirectional,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Transition that applies to every page pair
    pub fn fallback(duration: Duration) -> Self {
        Self::new("*", "*", duration)
    }

    pub fn unidirectional(mut self) -> Self {
        self.direction = Direction::Unidirectional;
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Returns true when both patterns are wildcards
    pub fn is_fallback(&self) -> bool {
        is_wildcard(&self.from) && is_wildcard(&self.to)
    }
}

/// Result of a collection lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionMatch {
    pub transition: Transition,
    /// The rule matched with source and target swapped
    pub reversed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionCollection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    transitions: Vec<Transition>,
}

impl TransitionCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transitions: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let collection = Self::from_json(&json)?;

        tracing::info!(
            path = %path.display(),
            transitions = collection.transitions.len(),
            "Loaded transition collection"
        );

        Ok(collection)
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.add_transition(transition);
        self
    }

    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// Remove every rule with the given source and target patterns
    pub fn remove_transition(&mut self, from: &str, to: &str) -> bool {
        let before = self.transitions.len();
        self.transitions.retain(|t| !(t.from == from && t.to == to));
        self.transitions.len() != before
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Find the rule that best matches a navigation from `from` to `to`.
    ///
    /// Exact pattern matches score higher than wildcards; on a tie the rule
    /// declared first wins, and a forward match wins over a reversed one.
    pub fn find_transition(&self, from: &str, to: &str) -> Option<TransitionMatch> {
        let mut best: Option<(u32, usize, bool)> = None;

        for (index, transition) in self.transitions.iter().enumerate() {
            if let Some(score) = match_score(transition, from, to) {
                if best.map(|(s, _, _)| score > s).unwrap_or(true) {
                    best = Some((score, index, false));
                }
            }

            if transition.direction == Direction::Bidirectional {
                if let Some(score) = match_score(transition, to, from) {
                    if best.map(|(s, _, _)| score > s).unwrap_or(true) {
                        best = Some((score, index, true));
                    }
                }
            }
        }

        best.map(|(_, index, reversed)| TransitionMatch {
            transition: self.transitions[index].clone(),
            reversed,
        })
    }
}

fn is_wildcard(pattern: &str) -> bool {
    pattern.is_empty() || pattern == "*"
}

fn pattern_score(pattern: &str, path: &str) -> Option<u32> {
    if is_wildcard(pattern) {
        Some(0)
    } else if pattern == path {
        Some(1)
    } else {
        None
    }
}

fn match_score(transition: &Transition, from: &str, to: &str) -> Option<u32> {
    Some(pattern_score(&transition.from, from)? + pattern_score(&transition.to, to)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> TransitionCollection {
        TransitionCollection::new("main")
            .with_transition(Transition::fallback(Duration::from_millis(100)))
            .with_transition(Transition::new("home", "*", Duration::from_millis(200)))
            .with_transition(Transition::new(
                "home",
                "settings",
                Duration::from_millis(300),
            ))
            .with_transition(
                Transition::new("media", "radio", Duration::from_millis(400)).unidirectional(),
            )
    }

    #[test]
    fn test_exact_match_beats_wildcards() {
        let found = collection().find_transition("home", "settings").unwrap();
        assert_eq!(found.transition.duration_ms, 300);
        assert!(!found.reversed);

        let found = collection().find_transition("home", "media").unwrap();
        assert_eq!(found.transition.duration_ms, 200);
    }

    #[test]
    fn test_bidirectional_reverse() {
        let found = collection().find_transition("settings", "home").unwrap();
        assert_eq!(found.transition.duration_ms, 300);
        assert!(found.reversed);
    }

    #[test]
    fn test_unidirectional_falls_back() {
        let found = collection().find_transition("media", "radio").unwrap();
        assert_eq!(found.transition.duration_ms, 400);

        let found = collection().find_transition("radio", "media").unwrap();
        assert!(found.transition.is_fallback());
    }

    #[test]
    fn test_no_match_without_fallback() {
        let collection = TransitionCollection::new("sparse")
            .with_transition(Transition::new("a", "b", Duration::from_millis(50)));
        assert!(collection.find_transition("a", "c").is_none());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "name": "main",
            "transitions": [
                { "from": "home", "to": "settings", "duration_ms": 250 },
                { "from": "*", "to": "*", "direction": "unidirectional" }
            ]
        }"#;

        let mut collection = TransitionCollection::from_json(json).unwrap();
        assert_eq!(collection.transitions().len(), 2);
        assert_eq!(
            collection.transitions()[1].direction,
            Direction::Unidirectional
        );

        assert!(collection.remove_transition("home", "settings"));
        assert!(!collection.remove_transition("home", "settings"));
        assert!(TransitionCollection::from_json("{ not json").is_err());
    }

    #[test]
    fn test_oversized_duration_saturates() {
        let transition = Transition::fallback(Duration::MAX);
        assert_eq!(transition.duration_ms, u64::MAX);
        assert_eq!(
            Transition::new("a", "b", Duration::from_millis(250)).duration_ms,
            250
        );
    }
}
