//! Application-wide constants.

/// Application name, used for the config directory and log files.
pub const APP_NAME: &str = "gitlab-rest";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("gitlab-rest/", env!("CARGO_PKG_VERSION"));

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Connect timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 15;

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 0;

/// Default wait between retried attempts in milliseconds.
pub const DEFAULT_RETRY_WAIT_MS: u64 = 1_000;

/// Page size used by the paginator when the caller does not set `per_page`.
pub const DEFAULT_PER_PAGE: u64 = 20;

/// Multipart field name used when an upload does not name one.
pub const DEFAULT_UPLOAD_FIELD: &str = "file";

/// Maximum number of body characters kept in an API error.
pub const ERROR_GLIMPSE_CHARS: usize = 50;

/// Templates whose 403 on GET means "absent" rather than "forbidden".
///
/// GitLab answers 403 instead of 404 for a missing release tag.
pub const DEFAULT_ABSENT_ON_FORBIDDEN: &[&str] = &["projects/:project_id/releases/:tag_name"];

/// GitLab access level names accepted on the command line.
pub mod access_levels {
    pub const GUEST: u64 = 10;
    pub const REPORTER: u64 = 20;
    pub const DEVELOPER: u64 = 30;
    pub const MAINTAINER: u64 = 40;
    pub const OWNER: u64 = 50;

    /// Map a level name to its numeric code.
    pub fn from_name(name: &str) -> Option<u64> {
        match name.to_ascii_lowercase().as_str() {
            "guest" => Some(GUEST),
            "reporter" => Some(REPORTER),
            "developer" => Some(DEVELOPER),
            "maintainer" | "master" => Some(MAINTAINER),
            "owner" => Some(OWNER),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_level_aliases() {
        assert_eq!(access_levels::from_name("Developer"), Some(30));
        assert_eq!(access_levels::from_name("master"), Some(40));
        assert_eq!(access_levels::from_name("maintainer"), Some(40));
        assert_eq!(access_levels::from_name("admin"), None);
    }

    #[test]
    fn test_user_agent_has_version() {
        assert!(USER_AGENT.starts_with("gitlab-rest/"));
        assert!(USER_AGENT.ends_with(APP_VERSION));
    }
}
