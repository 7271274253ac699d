//! Configuration for the trace store connection
//!
//! The process-wide default sink is built from [`ThreadlineConfig::from_env`].
//! A TOML file can be loaded explicitly with [`ThreadlineConfig::load_from`];
//! `${VAR}` references in it are resolved, a missing API key or project id
//! falls back to the environment, and other missing keys take their defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const API_KEY_ENV: &str = "THREADLINE_API_KEY";
pub const PROJECT_ID_ENV: &str = "THREADLINE_PROJECT_ID";
pub const BASE_URL_ENV: &str = "THREADLINE_BASE_URL";
pub const DEBUG_LOG_ENV: &str = "THREADLINE_DEBUG_LOG";

pub const DEFAULT_BASE_URL: &str = "https://app.melodi.fyi";

/// Trace store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadlineConfig {
    /// API key for the trace store (can reference env var with ${VAR_NAME})
    pub api_key: Option<String>,

    /// Numeric project id, kept as text so it can reference an env var
    pub project_id: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Verbose diagnostic logging
    #[serde(default)]
    pub debug: bool,
}

impl Default for ThreadlineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            project_id: None,
            base_url: default_base_url(),
            debug: false,
        }
    }
}

impl ThreadlineConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            api_key: non_empty(API_KEY_ENV),
            project_id: non_empty(PROJECT_ID_ENV),
            base_url: non_empty(BASE_URL_ENV).unwrap_or_else(default_base_url),
            debug: lookup(DEBUG_LOG_ENV)
                .map(|value| parse_flag(&value))
                .unwrap_or(false),
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// A missing API key or project id falls back to the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading trace store configuration from: {:?}", path);

        let contents = fs::read_to_string(path)?;
        let mut config: ThreadlineConfig = toml::from_str(&contents).map_err(|e| {
            Error::config_error(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        config.resolve_env_vars();
        Ok(config)
    }

    fn resolve_env_vars(&mut self) {
        self.api_key = match self.api_key.as_deref() {
            Some(key) => Self::resolve_env_var(key),
            None => env::var(API_KEY_ENV).ok(),
        };

        self.project_id = match self.project_id.as_deref() {
            Some(id) => Self::resolve_env_var(id),
            None => env::var(PROJECT_ID_ENV).ok(),
        };

        if let Some(resolved) = Self::resolve_env_var(&self.base_url) {
            self.base_url = resolved;
        }
    }

    /// Resolve a single ${VAR_NAME} reference
    fn resolve_env_var(value: &str) -> Option<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let var_name = &value[2..value.len() - 1];
            env::var(var_name).ok()
        } else {
            Some(value.to_string())
        }
    }

    /// The API key, or a configuration error explaining how to set it.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::config_error(format!(
                    "{API_KEY_ENV} and {PROJECT_ID_ENV} environment variables must be set \
                     (API key is missing)"
                ))
            })
    }

    /// The numeric project id.
    pub fn project_id(&self) -> Result<u64> {
        let raw = self
            .project_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::config_error(format!(
                    "{API_KEY_ENV} and {PROJECT_ID_ENV} environment variables must be set \
                     (project id is missing)"
                ))
            })?;

        raw.trim().parse::<u64>().map_err(|_| {
            Error::config_error(format!("Project id must be numeric, got '{}'", raw))
        })
    }

    /// Debug logging is on when requested here or via `THREADLINE_DEBUG_LOG`.
    pub fn is_debug_enabled(&self) -> bool {
        self.debug || debug_env_enabled()
    }
}

/// Whether `THREADLINE_DEBUG_LOG` asks for verbose logging.
pub fn debug_env_enabled() -> bool {
    env::var(DEBUG_LOG_ENV)
        .map(|value| parse_flag(&value))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_reads_all_fields() {
        let config = ThreadlineConfig::from_lookup(lookup(&[
            (API_KEY_ENV, "key-123"),
            (PROJECT_ID_ENV, "42"),
            (BASE_URL_ENV, "http://localhost:3000"),
            (DEBUG_LOG_ENV, "Yes"),
        ]));

        assert_eq!(config.api_key().unwrap(), "key-123");
        assert_eq!(config.project_id().unwrap(), 42);
        assert_eq!(config.base_url, "http://localhost:3000");
        assert!(config.debug);
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ThreadlineConfig::from_lookup(lookup(&[]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(!config.debug);
        assert!(matches!(config.api_key(), Err(Error::Config(_))));
        assert!(matches!(config.project_id(), Err(Error::Config(_))));
    }

    #[test]
    fn test_non_numeric_project_id() {
        let config = ThreadlineConfig::from_lookup(lookup(&[
            (API_KEY_ENV, "key"),
            (PROJECT_ID_ENV, "abc"),
        ]));
        let err = config.project_id().unwrap_err();
        assert!(err.to_string().contains("numeric"));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("y"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
    }

    #[test]
    fn test_resolve_env_var() {
        unsafe {
            env::set_var("THREADLINE_TEST_RESOLVE_VAR", "resolved");
        }

        let resolved = ThreadlineConfig::resolve_env_var("${THREADLINE_TEST_RESOLVE_VAR}");
        assert_eq!(resolved, Some("resolved".to_string()));

        let plain = ThreadlineConfig::resolve_env_var("plain_value");
        assert_eq!(plain, Some("plain_value".to_string()));

        unsafe {
            env::remove_var("THREADLINE_TEST_RESOLVE_VAR");
        }
    }

    #[test]
    fn test_load_from_file() {
        unsafe {
            env::set_var("THREADLINE_TEST_FILE_KEY", "from-env");
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_key = "${{THREADLINE_TEST_FILE_KEY}}"
project_id = "7"
base_url = "http://trace.local"
debug = true
"#
        )
        .unwrap();

        let config = ThreadlineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.api_key().unwrap(), "from-env");
        assert_eq!(config.project_id().unwrap(), 7);
        assert_eq!(config.base_url, "http://trace.local");
        assert!(config.is_debug_enabled());

        unsafe {
            env::remove_var("THREADLINE_TEST_FILE_KEY");
        }
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = [not valid").unwrap();

        let err = ThreadlineConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ThreadlineConfig::load_from(&dir.path().join("threadline.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
