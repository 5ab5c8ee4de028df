//! Endpoint descriptor table.
//!
//! Every GitLab endpoint the client knows about is a row in a YAML table:
//!
//! ```yaml
//! - name: get_project
//!   verb: GET
//!   path: projects/:project_id
//!   params: true
//! ```
//!
//! `params` says whether a trailing parameter map is accepted and `response`
//! selects `decoded` (default), `raw`, or `none`. Tables for API v3 and v4 are
//! bundled into the crate; custom tables can be loaded from YAML at runtime.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use gl_core::config::ApiVersion;
use gl_core::error::{GlError, GlResult};

use crate::path::placeholder_count;
use crate::response::ResponseMode;
use crate::transport::Verb;

const V3_TABLE: &str = include_str!("../endpoints/v3.yaml");
const V4_TABLE: &str = include_str!("../endpoints/v4.yaml");

/// One endpoint: a name bound to a verb and a path template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub name: String,
    pub verb: Verb,
    pub path: String,
    /// Whether a parameter map may follow the positional arguments.
    #[serde(default)]
    pub params: bool,
    #[serde(default)]
    pub response: ResponseMode,
}

impl EndpointDescriptor {
    /// Fewest positional arguments accepted.
    pub fn min_args(&self) -> usize {
        placeholder_count(&self.path)
    }

    /// Most positional arguments accepted.
    pub fn max_args(&self) -> usize {
        placeholder_count(&self.path)
    }

    /// Validate a call shape before anything touches the network.
    pub fn check_arity(&self, args: usize, has_params: bool) -> GlResult<()> {
        let (min, max) = (self.min_args(), self.max_args());
        if args < min || args > max {
            return Err(GlError::Arity(format!(
                "{} expects {min} positional argument(s) ({}), got {args}",
                self.name, self.path
            )));
        }
        if has_params && !self.params {
            return Err(GlError::Arity(format!(
                "{} does not accept parameters",
                self.name
            )));
        }
        Ok(())
    }
}

/// Immutable, name-indexed collection of endpoint descriptors.
#[derive(Debug, Clone, Default)]
pub struct EndpointTable {
    entries: Vec<EndpointDescriptor>,
    index: HashMap<String, usize>,
}

impl EndpointTable {
    /// The table shipped with the crate for an API version.
    pub fn bundled(version: ApiVersion) -> GlResult<Self> {
        match version {
            ApiVersion::V3 => Self::from_yaml(V3_TABLE),
            ApiVersion::V4 => Self::from_yaml(V4_TABLE),
        }
    }

    /// Parse a YAML list of descriptors.
    pub fn from_yaml(yaml: &str) -> GlResult<Self> {
        let entries: Vec<EndpointDescriptor> = serde_yaml::from_str(yaml)?;
        Self::from_entries(entries)
    }

    /// Load a YAML table from disk.
    pub fn from_file(path: &Path) -> GlResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GlError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// Build a table from descriptors, rejecting duplicate names.
    pub fn from_entries(entries: Vec<EndpointDescriptor>) -> GlResult<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        let mut normalized = Vec::with_capacity(entries.len());

        for mut entry in entries {
            if entry.name.trim().is_empty() {
                return Err(GlError::Config(format!(
                    "endpoint for {} has an empty name",
                    entry.path
                )));
            }
            entry.path = entry.path.trim().trim_matches('/').to_string();
            if index.insert(entry.name.clone(), normalized.len()).is_some() {
                return Err(GlError::Config(format!(
                    "duplicate endpoint name: {}",
                    entry.name
                )));
            }
            normalized.push(entry);
        }

        Ok(Self {
            entries: normalized,
            index,
        })
    }

    /// Look up a descriptor by method name.
    pub fn get(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Look up a descriptor or fail with `UnknownEndpoint`.
    pub fn require(&self, name: &str) -> GlResult<&EndpointDescriptor> {
        self.get(name)
            .ok_or_else(|| GlError::UnknownEndpoint(name.to_string()))
    }

    /// Descriptors in table order.
    pub fn iter(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
