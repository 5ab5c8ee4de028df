//! Response interpretation.
//!
//! Maps a final HTTP response to a payload, to absence, or to an error,
//! following GitLab's conventions: a 404 on GET means "no such thing" rather
//! than failure, and 204 carries no value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use gl_core::constants::ERROR_GLIMPSE_CHARS;
use gl_core::error::{GlError, GlResult};

use crate::transport::{Response, Verb};

/// How a successful response body is returned to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Parse the body as JSON.
    #[default]
    Decoded,
    /// Return the body bytes untouched.
    Raw,
    /// Discard the body.
    None,
}

/// Value produced by a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw(Vec<u8>),
    Empty,
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Raw(b) => Some(b),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Json(Value::Array(_)) => "a JSON array",
            Payload::Json(Value::Object(_)) => "a JSON object",
            Payload::Json(_) => "a JSON scalar",
            Payload::Raw(_) => "raw bytes",
            Payload::Empty => "no body",
        }
    }
}

/// Inputs to [`interpret`] that come from the call rather than the response.
#[derive(Debug, Clone, Copy)]
pub struct Interpretation<'a> {
    pub verb: Verb,
    /// Unresolved path template, used for the 403 quirk lookup.
    pub template: &'a str,
    /// Resolved URL, reported in errors.
    pub url: &'a str,
    pub mode: ResponseMode,
    /// Templates whose 403 on GET means absent.
    pub absent_on_forbidden: &'a [String],
}

/// Interpret a final response.
///
/// Returns `Ok(None)` for absence, `Ok(Some(_))` for a successful payload,
/// and an error for anything else.
pub fn interpret(ctx: &Interpretation<'_>, response: &Response) -> GlResult<Option<Payload>> {
    if ctx.verb == Verb::Get {
        if response.status == 404 {
            return Ok(None);
        }
        if response.status == 403
            && ctx
                .absent_on_forbidden
                .iter()
                .any(|t| t.trim_matches('/') == ctx.template.trim_matches('/'))
        {
            return Ok(None);
        }
    }

    if response.status == 204 {
        return Ok(None);
    }

    if !response.is_success() {
        return Err(GlError::Api {
            verb: ctx.verb.to_string(),
            url: ctx.url.to_string(),
            status: response.status,
            reason: response.reason.clone(),
            glimpse: glimpse(&response.body),
        });
    }

    match ctx.mode {
        ResponseMode::None => Ok(Some(Payload::Empty)),
        ResponseMode::Raw => Ok(Some(Payload::Raw(response.body.clone()))),
        ResponseMode::Decoded => response
            .json()
            .map(|v| Some(Payload::Json(v)))
            .map_err(|e| GlError::Decode {
                verb: ctx.verb.to_string(),
                url: ctx.url.to_string(),
                status: response.status,
                message: e.to_string(),
            }),
    }
}

/// Whitespace-collapsed, truncated view of a response body for error messages.
pub fn glimpse(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > ERROR_GLIMPSE_CHARS {
        let head: String = collapsed.chars().take(ERROR_GLIMPSE_CHARS).collect();
        format!("{head}...")
    } else {
        collapsed
    }
}

/// Pagination headers GitLab attaches to list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub next_page: Option<u64>,
    pub prev_page: Option<u64>,
    pub total: Option<u64>,
    pub total_pages: Option<u64>,
}

impl PageInfo {
    /// Read `X-Page`, `X-Per-Page`, `X-Next-Page`, `X-Prev-Page`, `X-Total`
    /// and `X-Total-Pages`. Missing or empty headers stay `None`.
    pub fn from_response(response: &Response) -> Self {
        let number = |name: &str| {
            response
                .header(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
        };
        Self {
            page: number("x-page"),
            per_page: number("x-per-page"),
            next_page: number("x-next-page"),
            prev_page: number("x-prev-page"),
            total: number("x-total"),
            total_pages: number("x-total-pages"),
        }
    }

    /// Whether the server advertised a following page.
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}
