//! Client configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_SERVER_URL: &str = "https://api.parse.com";
pub const DEFAULT_API_VERSION: &str = "1";

const ENV_APPLICATION_ID: &str = "DOCSYNC_APPLICATION_ID";
const ENV_API_KEY: &str = "DOCSYNC_API_KEY";
const ENV_SERVER_URL: &str = "DOCSYNC_SERVER_URL";
const ENV_API_VERSION: &str = "DOCSYNC_API_VERSION";
const ENV_REVOCABLE_SESSIONS: &str = "DOCSYNC_REVOCABLE_SESSIONS";

/// Connection settings shared by every request a [`Client`](crate::Client) makes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Sent as the application id header.
    pub application_id: String,
    /// Sent as the REST api key header.
    pub api_key: String,
    /// Scheme and host, optionally with a mount path.
    pub server_url: String,
    pub api_version: String,
    /// Ask for revocable sessions on login and sign-up.
    pub revocable_sessions: bool,
    /// Transport timeout.
    pub timeout: Duration,
    /// `None` spawns one thread per background task; `Some(n)` feeds a pool of `n` workers.
    pub background_workers: Option<usize>,
}

impl ClientConfig {
    pub fn new(application_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Read settings from `DOCSYNC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let application_id = lookup(ENV_APPLICATION_ID)
            .ok_or_else(|| Error::config(format!("{} is not set", ENV_APPLICATION_ID)))?;
        let api_key = lookup(ENV_API_KEY)
            .ok_or_else(|| Error::config(format!("{} is not set", ENV_API_KEY)))?;

        let mut config = Self::new(application_id, api_key);
        if let Some(server_url) = lookup(ENV_SERVER_URL) {
            config.server_url = server_url;
        }
        if let Some(api_version) = lookup(ENV_API_VERSION) {
            config.api_version = api_version;
        }
        if let Some(flag) = lookup(ENV_REVOCABLE_SESSIONS) {
            config.revocable_sessions = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        Ok(config)
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_revocable_sessions(mut self, enabled: bool) -> Self {
        self.revocable_sessions = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_background_workers(mut self, workers: usize) -> Self {
        self.background_workers = Some(workers);
        self
    }

    /// Check the settings a client cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.application_id.is_empty() {
            return Err(Error::config("application id is empty"));
        }
        if self.api_key.is_empty() {
            return Err(Error::config("api key is empty"));
        }
        if self.background_workers == Some(0) {
            return Err(Error::config("background worker pool must not be empty"));
        }
        url::Url::parse(&self.server_url)?;
        Ok(())
    }

    /// Absolute URL of a resource path such as `classes/GameScore`.
    pub fn resource_url(&self, resource_path: &str) -> Result<String> {
        let url = format!(
            "{}/{}/{}",
            self.server_url.trim_end_matches('/'),
            self.api_version.trim_matches('/'),
            resource_path.trim_start_matches('/')
        );
        url::Url::parse(&url)?;
        Ok(url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            api_key: String::new(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            revocable_sessions: false,
            timeout: Duration::from_secs(30),
            background_workers: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("app", "key");
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.api_version, "1");
        assert!(!config.revocable_sessions);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_credentials() {
        assert!(ClientConfig::new("", "key").validate().is_err());
        assert!(ClientConfig::new("app", "").validate().is_err());
        assert!(ClientConfig::new("app", "key")
            .with_background_workers(0)
            .validate()
            .is_err());
        assert!(ClientConfig::new("app", "key")
            .with_server_url("not a url")
            .validate()
            .is_err());
    }

    #[test]
    fn resource_url_joins_segments() {
        let config = ClientConfig::new("app", "key").with_server_url("http://localhost:1337/parse/");
        assert_eq!(
            config.resource_url("classes/GameScore").unwrap(),
            "http://localhost:1337/parse/1/classes/GameScore"
        );
        assert_eq!(
            ClientConfig::new("a", "k").resource_url("users/me").unwrap(),
            "https://api.parse.com/1/users/me"
        );
    }

    #[test]
    fn from_lookup_reads_variables() {
        let vars: HashMap<&str, &str> = [
            (ENV_APPLICATION_ID, "app"),
            (ENV_API_KEY, "key"),
            (ENV_SERVER_URL, "http://localhost:1337"),
            (ENV_REVOCABLE_SESSIONS, "true"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.application_id, "app");
        assert_eq!(config.server_url, "http://localhost:1337");
        assert_eq!(config.api_version, "1");
        assert!(config.revocable_sessions);
    }

    #[test]
    fn from_lookup_requires_application_id() {
        let err = ClientConfig::from_lookup(|_| None).unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains(ENV_APPLICATION_ID));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"application_id": "app", "api_key": "key"}"#).unwrap();
        assert_eq!(config, ClientConfig::new("app", "key"));
    }
}
