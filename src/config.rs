//! Runtime configuration, passed by the shell to `init` as JSON.
//!
//! ```json
//! { "variant": "ritual", "collection": "users", "defaultHabitName": "Protocolo Reboot",
//!   "logLevel": "info", "historyLimit": 30 }
//! ```
//!
//! Every key is optional. Held in a `thread_local!` for the worker's lifetime.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::error::{AppError, Result};
use crate::tracker::rules::Variant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub variant: Variant,
    /// Store collection holding one document per identity.
    pub collection: String,
    pub default_habit_name: String,
    /// `EnvFilter` directive, e.g. `"info"` or `"reboot_hero=debug"`.
    pub log_level: String,
    /// Entries shown by the history view when no `limit` is given.
    pub history_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Classic,
            collection: "users".to_string(),
            default_habit_name: "Protocolo Reboot".to_string(),
            log_level: "info".to_string(),
            history_limit: 30,
        }
    }
}

impl AppConfig {
    /// Parse the JSON handed to `init`. An empty string yields the defaults.
    pub fn parse(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: AppConfig =
            serde_json::from_str(json).map_err(|e| AppError::InvalidConfig(e.to_string()))?;
        if config.collection.trim().is_empty() {
            return Err(AppError::InvalidConfig("collection must not be empty".into()));
        }
        if config.history_limit == 0 {
            return Err(AppError::InvalidConfig("historyLimit must be at least 1".into()));
        }
        Ok(config)
    }
}

thread_local! {
    static CONFIG: RefCell<AppConfig> = RefCell::new(AppConfig::default());
}

/// Snapshot of the active configuration.
pub fn current() -> AppConfig {
    CONFIG.with(|c| c.borrow().clone())
}

pub fn replace_config(config: AppConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_default() {
        assert_eq!(AppConfig::parse("").unwrap(), AppConfig::default());
        assert_eq!(AppConfig::parse("  ").unwrap().collection, "users");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let c = AppConfig::parse(r#"{"variant":"ritual","unknownKey":true}"#).unwrap();
        assert_eq!(c.variant, Variant::Ritual);
        assert_eq!(c.default_habit_name, "Protocolo Reboot");
        assert_eq!(c.history_limit, 30);
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(matches!(
            AppConfig::parse("{not json"),
            Err(AppError::InvalidConfig(_))
        ));
        assert!(AppConfig::parse(r#"{"collection":""}"#).is_err());
        assert!(AppConfig::parse(r#"{"historyLimit":0}"#).is_err());
        assert!(AppConfig::parse(r#"{"variant":"deluxe"}"#).is_err());
    }

    #[test]
    fn replace_and_read_back() {
        let mut c = AppConfig::default();
        c.variant = Variant::Ritual;
        replace_config(c.clone());
        assert_eq!(current(), c);
        replace_config(AppConfig::default());
    }
}
