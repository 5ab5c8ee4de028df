//! OS-specific directories.

use std::path::PathBuf;

use crate::constants::APP_NAME;
use crate::error::{GlError, GlResult};

/// Per-user directory lookup for the current platform.
pub struct Platform;

impl Platform {
    /// Get the platform-specific configuration directory.
    ///
    /// - Windows: `%APPDATA%/gitlab-rest`
    /// - macOS: `~/Library/Application Support/gitlab-rest`
    /// - Linux: `~/.config/gitlab-rest`
    pub fn config_dir() -> GlResult<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| GlError::Config("could not determine config directory".into()))?;
        Ok(base.join(APP_NAME))
    }
}
