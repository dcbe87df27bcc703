//! Navigator configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_navigation::{EngineSettings, InFlightPolicy};
use folio_transitions::TransitionCollection;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,
    /// Loop setting of new hosts
    pub loop_subpages: bool,
    /// What an animated request does while its host is navigating
    pub in_flight_policy: InFlightPolicy,
    /// Immediacy of the navigator's convenience calls
    pub default_immediate: bool,
    /// Transition collection given to every new host
    pub transitions: Option<PathBuf>,
}

impl Config {
    /// Read a configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;

        tracing::info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_filter.trim().is_empty() {
            return Err(CoreError::Config("log_filter must not be empty".to_string()));
        }
        if let Some(path) = &self.transitions {
            if path.as_os_str().is_empty() {
                return Err(CoreError::Config(
                    "transitions path must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Engine settings for a new page domain, loading the transition
    /// collection if one is configured
    pub fn to_engine(&self) -> Result<EngineSettings> {
        let transitions = match &self.transitions {
            Some(path) => Some(Arc::new(TransitionCollection::load(path)?)),
            None => None,
        };

        Ok(EngineSettings {
            loop_subpages: self.loop_subpages,
            in_flight_policy: self.in_flight_policy,
            transitions,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            loop_subpages: true,
            in_flight_policy: InFlightPolicy::Supersede,
            default_immediate: false,
            transitions: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{ "in_flight_policy": "queue" }"#).unwrap();
        assert_eq!(config.in_flight_policy, InFlightPolicy::Queue);
        assert_eq!(config.log_filter, "info");
        assert!(config.loop_subpages);
        assert!(config.transitions.is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            Config::from_json(r#"{ "log_filter": " " }"#),
            Err(CoreError::Config(_))
        ));
        assert!(matches!(
            Config::from_json("{ not json"),
            Err(CoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_to_engine_loads_transitions() {
        let dir = std::env::temp_dir().join(format!("folio-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("transitions.json");
        std::fs::write(
            &path,
            r#"{ "name": "slides", "transitions": [ { "from": "a", "to": "b", "duration_ms": 250 } ] }"#,
        )
        .unwrap();

        let config = Config {
            loop_subpages: false,
            transitions: Some(path),
            ..Config::default()
        };
        let settings = config.to_engine().unwrap();
        assert!(!settings.loop_subpages);
        assert_eq!(settings.transitions.unwrap().transitions().len(), 1);

        let missing = Config {
            transitions: Some(dir.join("missing.json")),
            ..Config::default()
        };
        assert!(matches!(missing.to_engine(), Err(CoreError::Transition(_))));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
