//! CLI command implementations.

pub mod args;
pub mod call;
pub mod endpoints;

use std::path::Path;

use gl_api::{Client, EndpointTable};
use gl_core::config::AppConfig;
use gl_core::error::GlResult;

use crate::GlobalArgs;

/// Resolve configuration: flags override the environment, which overrides
/// the config file.
pub fn load_config(global: &GlobalArgs) -> GlResult<AppConfig> {
    let mut config = match global.config.as_deref() {
        Some(path) => AppConfig::load_from_file(Path::new(path))?,
        None => AppConfig::load_default()?,
    };
    config.gitlab.apply_env()?;
    apply_flags(&mut config, global)?;
    Ok(config)
}

/// Overlay command-line flags onto `config`.
pub fn apply_flags(config: &mut AppConfig, global: &GlobalArgs) -> GlResult<()> {
    let gitlab = &mut config.gitlab;
    if let Some(ref url) = global.url {
        gitlab.url = url.clone();
    }
    // A token given on the command line replaces whatever the environment
    // or file supplied, including a token of the other kind.
    if let Some(ref token) = global.token {
        gitlab.private_token = Some(token.clone());
        gitlab.access_token = None;
    }
    if let Some(ref token) = global.access_token {
        gitlab.access_token = Some(token.clone());
        if global.token.is_none() {
            gitlab.private_token = None;
        }
    }
    if let Some(ref user) = global.sudo {
        gitlab.sudo = Some(user.clone());
    }
    if let Some(retries) = global.retries {
        gitlab.retries = retries;
    }
    if let Some(wait) = global.retry_wait_ms {
        gitlab.retry_wait_ms = wait;
    }
    if let Some(ref version) = global.api_version {
        gitlab.api_version = version.parse()?;
    }
    Ok(())
}

/// The endpoint table named by `--endpoint-table`, or the bundled one for
/// the configured API version.
pub fn load_endpoints(config: &AppConfig, global: &GlobalArgs) -> GlResult<EndpointTable> {
    match global.endpoint_table.as_deref() {
        Some(path) => EndpointTable::from_file(Path::new(path)),
        None => EndpointTable::bundled(config.gitlab.api_version),
    }
}

/// Build an API client from resolved configuration.
pub fn create_client(config: &AppConfig, global: &GlobalArgs) -> GlResult<Client> {
    Client::builder(config.gitlab.clone())
        .endpoints(load_endpoints(config, global)?)
        .build()
}
