//! Command-line argument parsing for endpoint calls.
//!
//! Tokens after the method name are either positional path arguments or
//! `key:value` parameters. A token is a parameter when the text before its
//! first `:` is a valid parameter name.

use serde_json::Value;

use gl_api::{FileUpload, Params, PathArg};
use gl_core::constants::access_levels;
use gl_core::error::{GlError, GlResult};

/// Parameter names whose `@path` value is a file to upload.
const UPLOAD_FIELDS: &[&str] = &["file", "avatar"];

/// A parsed endpoint invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Endpoint name in table form (snake_case).
    pub method: String,
    pub args: Vec<PathArg>,
    pub params: Params,
    pub upload: Option<FileUpload>,
}

impl Invocation {
    /// Parameters for the call, `None` when none were given.
    pub fn params(&self) -> Option<Params> {
        if self.params.is_empty() {
            None
        } else {
            Some(self.params.clone())
        }
    }
}

/// Parse `<method> [args...] [key:value...]`.
pub fn parse_invocation(tokens: &[String]) -> GlResult<Invocation> {
    let (method, rest) = tokens
        .split_first()
        .ok_or_else(|| GlError::Arity("no method given".into()))?;

    let mut invocation = Invocation {
        method: method_name(method),
        args: Vec::new(),
        params: Params::new(),
        upload: None,
    };

    for token in rest {
        if is_flag(token) {
            return Err(GlError::Arity(format!(
                "{token} must come before the method name, e.g. gitlab {token} {method} ..."
            )));
        }
        match split_param(token) {
            Some((key, raw)) => {
                if let Some(path) = raw.strip_prefix('@').filter(|_| UPLOAD_FIELDS.contains(&key)) {
                    if invocation.upload.is_some() {
                        return Err(GlError::Arity("only one file can be uploaded per call".into()));
                    }
                    invocation.upload = Some(FileUpload::new(path).with_field(key));
                } else {
                    invocation.params.insert(key.to_string(), parse_value(key, raw));
                }
            }
            None => invocation.args.push(PathArg::from(token.as_str())),
        }
    }

    Ok(invocation)
}

/// Convert a kebab-case command name to the endpoint's snake_case name.
pub fn method_name(command: &str) -> String {
    command.trim().replace('-', "_")
}

/// Whether a token looks like a command-line flag. Negative numbers do not.
fn is_flag(token: &str) -> bool {
    token.starts_with("--")
        || token
            .strip_prefix('-')
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_alphabetic())
}

/// Split `key:value` when `key` is a parameter name.
fn split_param(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once(':')?;
    let mut chars = key.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some((key, value))
}

/// Interpret a parameter value. Access level names become their numeric
/// codes, and integers and booleans are sent as JSON scalars.
pub fn parse_value(key: &str, raw: &str) -> Value {
    if key.ends_with("access_level") {
        if let Some(level) = access_levels::from_name(raw) {
            return Value::from(level);
        }
    }
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    // Only canonical integers, so "007" and "1.10" stay strings.
    if let Ok(n) = raw.parse::<i64>() {
        if n.to_string() == raw {
            return Value::from(n);
        }
    }
    Value::String(raw.to_string())
}
