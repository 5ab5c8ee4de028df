//! GitLab REST core - foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by the other crates:
//! - Client and application configuration (base URL, credentials, retry policy)
//! - The unified error type covering every failure the client can surface
//! - Structured logging with tracing
//! - Platform directory lookup and common constants

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod platform;

// Re-export commonly used items at the crate root
pub use config::{ApiVersion, AppConfig, ClientConfig, Credential};
pub use error::{GlError, GlResult};
pub use logging::{init_logging, LogFilter};
pub use platform::Platform;
