//! Path template resolution.
//!
//! Endpoint paths are written as templates such as
//! `projects/:project_id/issues/:issue_iid`. Each `:name` segment is replaced,
//! left to right, by a positional argument that is percent-encoded as a single
//! path segment, so `group/project` becomes `group%2Fproject`.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use gl_core::error::{GlError, GlResult};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r":[A-Za-z_][A-Za-z0-9_]*").unwrap();
}

/// A positional path argument.
///
/// Arguments are opaque scalars: strings or integers, rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathArg(String);

impl PathArg {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PathArg {
    fn from(value: &str) -> Self {
        PathArg(value.to_string())
    }
}

impl From<String> for PathArg {
    fn from(value: String) -> Self {
        PathArg(value)
    }
}

impl From<&String> for PathArg {
    fn from(value: &String) -> Self {
        PathArg(value.clone())
    }
}

macro_rules! path_arg_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for PathArg {
                fn from(value: $t) -> Self {
                    PathArg(value.to_string())
                }
            }
        )*
    };
}

path_arg_from_int!(u8, u16, u32, u64, usize, i32, i64);

/// Build a `Vec<PathArg>` from heterogeneous scalars.
///
/// ```
/// use gl_api::path_args;
/// let args = path_args!["group/project", 42];
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! path_args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::path::PathArg::from($arg)),*]
    };
}

/// Number of `:name` placeholders in a template.
pub fn placeholder_count(template: &str) -> usize {
    PLACEHOLDER.find_iter(template).count()
}

/// Substitute positional arguments into a path template.
///
/// Fails with an arity error when the argument count differs from the
/// placeholder count.
pub fn resolve_path(template: &str, args: &[PathArg]) -> GlResult<String> {
    let expected = placeholder_count(template);
    if expected != args.len() {
        return Err(GlError::Arity(format!(
            "{template} takes {expected} positional argument(s), got {}",
            args.len()
        )));
    }

    let mut values = args.iter();
    let resolved = PLACEHOLDER.replace_all(template, |_: &regex::Captures<'_>| {
        values
            .next()
            .map(|arg| urlencoding::encode(arg.as_str()).into_owned())
            .unwrap_or_default()
    });
    Ok(resolved.into_owned())
}
