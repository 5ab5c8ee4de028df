//! Application configuration management.
//!
//! Handles loading, saving, and merging configuration: the GitLab base URL,
//! credentials, retry policy, and logging preferences. Configuration is
//! persisted as TOML on disk (JSON is accepted when the file ends in `.json`)
//! and can be overridden key by key from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{GlError, GlResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// GitLab connection settings.
    #[serde(default)]
    pub gitlab: ClientConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// REST API version served under `/api/vN`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V3,
    #[default]
    V4,
}

impl ApiVersion {
    /// Path prefix segment, e.g. "v4".
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V3 => "v3",
            ApiVersion::V4 => "v4",
        }
    }
}

impl std::str::FromStr for ApiVersion {
    type Err = GlError;

    fn from_str(s: &str) -> GlResult<Self> {
        match s.trim().trim_start_matches(['v', 'V']) {
            "3" => Ok(ApiVersion::V3),
            "4" => Ok(ApiVersion::V4),
            _ => Err(GlError::Config(format!("unsupported API version: {s}"))),
        }
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single credential a client authenticates with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Anonymous access, no authentication header.
    None,
    /// OAuth2 / personal access token sent as `Authorization: Bearer`.
    AccessToken(String),
    /// Private token sent as `Private-Token`.
    PrivateToken(String),
}

/// GitLab client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// GitLab instance URL (e.g. "https://gitlab.com"). `/api/vN` is appended
    /// unless already present.
    #[serde(default)]
    pub url: String,

    /// REST API version.
    #[serde(default)]
    pub api_version: ApiVersion,

    /// Bearer token. Mutually exclusive with `private_token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Private token. Mutually exclusive with `access_token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_token: Option<String>,

    /// User to impersonate via the `Sudo` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sudo: Option<String>,

    /// Additional attempts after the first on 5xx or 429.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Wait between retried attempts in milliseconds.
    #[serde(default = "default_retry_wait")]
    pub retry_wait_ms: u64,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Path templates whose 403 on GET is reported as absent.
    #[serde(default = "default_absent_on_forbidden")]
    pub absent_on_forbidden: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. Empty disables file logging.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output for the log file.
    #[serde(default)]
    pub json_output: bool,
}

// Default value functions for serde

fn default_retries() -> u32 {
    constants::DEFAULT_RETRIES
}

fn default_retry_wait() -> u64 {
    constants::DEFAULT_RETRY_WAIT_MS
}

fn default_timeout() -> u64 {
    constants::DEFAULT_TIMEOUT_MS
}

fn default_absent_on_forbidden() -> Vec<String> {
    constants::DEFAULT_ABSENT_ON_FORBIDDEN
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_version: ApiVersion::default(),
            access_token: None,
            private_token: None,
            sudo: None,
            retries: default_retries(),
            retry_wait_ms: default_retry_wait(),
            timeout_ms: default_timeout(),
            absent_on_forbidden: default_absent_on_forbidden(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given instance URL with defaults elsewhere.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Resolve the configured credential.
    ///
    /// Fails when both an access token and a private token are set.
    pub fn credential(&self) -> GlResult<Credential> {
        let access = self.access_token.as_deref().filter(|t| !t.is_empty());
        let private = self.private_token.as_deref().filter(|t| !t.is_empty());
        match (access, private) {
            (Some(_), Some(_)) => Err(GlError::Config(
                "access_token and private_token are mutually exclusive".into(),
            )),
            (Some(t), None) => Ok(Credential::AccessToken(t.to_string())),
            (None, Some(t)) => Ok(Credential::PrivateToken(t.to_string())),
            (None, None) => Ok(Credential::None),
        }
    }

    /// Canonical API root: sanitized URL with a single `/api/vN` suffix and
    /// no trailing slash.
    ///
    /// A URL that already names a version must name `api_version`, since the
    /// endpoint table is chosen by `api_version`.
    pub fn base_url(&self) -> GlResult<String> {
        let sanitized = Self::sanitize_url(&self.url);
        if sanitized.is_empty() {
            return Err(GlError::Config("GitLab URL is not configured".into()));
        }
        match api_suffix(&sanitized) {
            Some(version) if version == self.api_version.as_str() => Ok(sanitized),
            Some(version) => Err(GlError::Config(format!(
                "URL targets /api/{version} but api_version is {}",
                self.api_version
            ))),
            None => Ok(format!("{sanitized}/api/{}", self.api_version)),
        }
    }

    /// Check every invariant a client relies on.
    pub fn validate(&self) -> GlResult<()> {
        self.credential()?;
        self.base_url()?;
        if self.timeout_ms == 0 {
            return Err(GlError::Config("timeout_ms must be greater than zero".into()));
        }
        Ok(())
    }

    /// Wait between retried attempts.
    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Sanitize and normalize an instance URL.
    ///
    /// Strips surrounding whitespace and quotes, adds `https://` when no
    /// scheme is present, and trims trailing slashes.
    pub fn sanitize_url(url: &str) -> String {
        let trimmed = url.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        with_scheme.trim_end_matches('/').to_string()
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> GlResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> GlResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("GITLAB_URL") {
            self.url = url;
        }
        if let Some(token) = get("GITLAB_TOKEN") {
            self.private_token = Some(token);
        }
        if let Some(token) = get("GITLAB_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(sudo) = get("GITLAB_SUDO") {
            self.sudo = Some(sudo);
        }
        if let Some(retries) = get("GITLAB_RETRIES") {
            self.retries = retries
                .trim()
                .parse()
                .map_err(|e| GlError::Config(format!("GITLAB_RETRIES: {e}")))?;
        }
        if let Some(wait) = get("GITLAB_RETRY_WAIT_MS") {
            self.retry_wait_ms = wait
                .trim()
                .parse()
                .map_err(|e| GlError::Config(format!("GITLAB_RETRY_WAIT_MS: {e}")))?;
        }
        if let Some(version) = get("GITLAB_API_VERSION") {
            self.api_version = version.parse()?;
        }
        Ok(())
    }
}

/// The `vN` of a URL ending in `/api/vN`.
fn api_suffix(url: &str) -> Option<&str> {
    let mut segments = url.rsplit('/');
    let version = segments.next()?;
    let digits = version.strip_prefix('v')?;
    let is_version = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    (is_version && segments.next() == Some("api")).then_some(version)
}

impl AppConfig {
    /// Load configuration from the default config file path, or defaults if
    /// no file exists there.
    pub fn load_default() -> GlResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> GlResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = if is_json(path) {
            serde_json::from_str(&contents)
                .map_err(|e| GlError::Config(format!("{}: {e}", path.display())))?
        } else {
            toml::from_str(&contents)?
        };
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> GlResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)
                .map_err(|e| GlError::Config(format!("failed to serialize config: {e}")))?
        };
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> GlResult<PathBuf> {
        let config_dir = Platform::config_dir()?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get the log directory if file logging is configured.
    pub fn log_dir(&self) -> Option<PathBuf> {
        if self.logging.directory.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.logging.directory))
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.gitlab.timeout_ms, 30_000);
        assert_eq!(config.gitlab.retries, 0);
        assert_eq!(config.gitlab.api_version, ApiVersion::V4);
        assert_eq!(
            config.gitlab.absent_on_forbidden,
            vec!["projects/:project_id/releases/:tag_name".to_string()]
        );
        assert_eq!(config.logging.level, "warn");
        assert!(config.log_dir().is_none());
    }

    #[test]
    fn test_sanitize_url() {
        assert_eq!(
            ClientConfig::sanitize_url("gitlab.example.com"),
            "https://gitlab.example.com"
        );
        assert_eq!(
            ClientConfig::sanitize_url("http://10.0.0.5:8080//"),
            "http://10.0.0.5:8080"
        );
        assert_eq!(
            ClientConfig::sanitize_url("  \"https://gitlab.com/\"  "),
            "https://gitlab.com"
        );
        assert_eq!(ClientConfig::sanitize_url("   "), "");
    }

    #[test]
    fn test_base_url_appends_api_version() {
        let mut config = ClientConfig::new("https://gitlab.com/");
        assert_eq!(config.base_url().unwrap(), "https://gitlab.com/api/v4");

        config.api_version = ApiVersion::V3;
        assert_eq!(config.base_url().unwrap(), "https://gitlab.com/api/v3");

        let config = ClientConfig::new("https://gitlab.com/api/v4/");
        assert_eq!(config.base_url().unwrap(), "https://gitlab.com/api/v4");
    }

    #[test]
    fn test_base_url_version_must_match_api_version() {
        let mut config = ClientConfig::new("https://gitlab.example.com/api/v3");
        let err = config.base_url().unwrap_err();
        match err {
            GlError::Config(message) => {
                assert!(message.contains("/api/v3"));
                assert!(message.contains("v4"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(config.validate().is_err());

        config.api_version = ApiVersion::V3;
        assert_eq!(config.base_url().unwrap(), "https://gitlab.example.com/api/v3");

        config.url = "https://gitlab.example.com/api/v9".into();
        assert!(matches!(config.base_url(), Err(GlError::Config(_))));

        config.url = "https://gitlab.example.com/mirror/v3".into();
        assert_eq!(
            config.base_url().unwrap(),
            "https://gitlab.example.com/mirror/v3/api/v3"
        );
    }

    #[test]
    fn test_base_url_requires_url() {
        let err = ClientConfig::default().base_url().unwrap_err();
        assert!(matches!(err, GlError::Config(_)));
    }

    #[test]
    fn test_credentials_are_mutually_exclusive() {
        let mut config = ClientConfig::new("https://gitlab.com");
        assert_eq!(config.credential().unwrap(), Credential::None);

        config.private_token = Some("priv".into());
        assert_eq!(
            config.credential().unwrap(),
            Credential::PrivateToken("priv".into())
        );

        config.access_token = Some("bearer".into());
        assert!(matches!(config.credential(), Err(GlError::Config(_))));
        assert!(config.validate().is_err());

        config.private_token = None;
        assert_eq!(
            config.credential().unwrap(),
            Credential::AccessToken("bearer".into())
        );
    }

    #[test]
    fn test_apply_env_overrides_by_key() {
        let vars: HashMap<&str, &str> = [
            ("GITLAB_URL", "https://env.example.com"),
            ("GITLAB_RETRIES", "3"),
            ("GITLAB_SUDO", ""),
            ("GITLAB_API_VERSION", "v3"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::new("https://file.example.com");
        config.sudo = Some("from-file".into());
        config
            .apply_env_from(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.url, "https://env.example.com");
        assert_eq!(config.retries, 3);
        assert_eq!(config.sudo.as_deref(), Some("from-file"));
        assert_eq!(config.api_version, ApiVersion::V3);
    }

    #[test]
    fn test_apply_env_rejects_bad_number() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_env_from(|k| (k == "GITLAB_RETRIES").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, GlError::Config(_)));
    }

    #[test]
    fn test_roundtrip_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.gitlab.url = "https://gitlab.com".into();
        config.gitlab.private_token = Some("secret".into());
        config.gitlab.retries = 2;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.gitlab, config.gitlab);
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"gitlab": {"url": "https://gitlab.com", "access_token": "abc", "retries": 4}}"#,
        )
        .unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.gitlab.access_token.as_deref(), Some("abc"));
        assert_eq!(loaded.gitlab.retries, 4);
        assert_eq!(loaded.gitlab.retry_wait_ms, 1_000);
    }
}
