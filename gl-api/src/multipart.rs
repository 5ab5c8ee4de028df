//! File upload encoding.
//!
//! A [`FileUpload`] names a local file and an optional form field. Reading it
//! yields a [`FilePart`], which is sent either through reqwest's multipart
//! support (POST) or as a hand-encoded `multipart/form-data` body (PUT).

use std::path::{Path, PathBuf};

use uuid::Uuid;

use gl_core::constants::DEFAULT_UPLOAD_FIELD;
use gl_core::error::{GlError, GlResult};

const OCTET_STREAM: &str = "application/octet-stream";

/// A local file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub path: PathBuf,
    /// Form field name; `"file"` when unset.
    pub field: Option<String>,
}

impl FileUpload {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            field: None,
        }
    }

    /// Send the file under a specific form field name.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Field name the file is sent under.
    pub fn field_name(&self) -> &str {
        self.field.as_deref().unwrap_or(DEFAULT_UPLOAD_FIELD)
    }

    /// Read the file from disk.
    pub async fn read(&self) -> GlResult<FilePart> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| GlError::FileAccess {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(FilePart {
            field: self.field_name().to_string(),
            file_name: base_name(&self.path),
            bytes,
        })
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_UPLOAD_FIELD.to_string())
}

/// File contents ready to be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// Build a reqwest multipart form holding this file as its only part.
    ///
    /// Forms are consumed on send, so one is built per attempt.
    pub fn to_form(&self) -> GlResult<reqwest::multipart::Form> {
        let part = reqwest::multipart::Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(OCTET_STREAM)
            .map_err(|e| GlError::Transport(format!("invalid mime type: {e}")))?;
        Ok(reqwest::multipart::Form::new().part(self.field.clone(), part))
    }
}

/// A hand-encoded multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMultipart {
    pub boundary: String,
    pub body: Vec<u8>,
}

impl RawMultipart {
    /// Value for the `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Encode a single file field as `multipart/form-data`.
pub fn encode_form(part: &FilePart) -> RawMultipart {
    let boundary = boundary_for(&part.bytes);

    let mut body = Vec::with_capacity(part.bytes.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            quote(&part.field),
            quote(&part.file_name)
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {OCTET_STREAM}\r\n\r\n").as_bytes());
    body.extend_from_slice(&part.bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    RawMultipart { boundary, body }
}

/// Pick a boundary that does not occur anywhere in `content`.
fn boundary_for(content: &[u8]) -> String {
    loop {
        let candidate = format!("gitlab-rest-{}", Uuid::new_v4().simple());
        if !contains(content, candidate.as_bytes()) {
            return candidate;
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Escape characters that would break a quoted header parameter.
fn quote(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
