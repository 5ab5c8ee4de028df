//! Page-number pagination over list endpoints.
//!
//! A [`Paginator`] repeatedly calls a named endpoint with an incrementing
//! `page` and a fixed `per_page`, stopping after the first short page. Records
//! can be consumed a page at a time, one at a time, or all at once.

use std::collections::VecDeque;

use serde_json::Value;
use tracing::debug;

use gl_core::constants::DEFAULT_PER_PAGE;
use gl_core::error::{GlError, GlResult};

use crate::client::{Client, Params};
use crate::path::PathArg;
use crate::response::Payload;

/// Where a paginator is in its walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// No page fetched yet.
    Fresh,
    /// At least one page fetched and more may follow.
    Paging,
    /// The last page has been seen.
    Exhausted,
}

/// Paginated walk over a list endpoint.
pub struct Paginator {
    client: Client,
    name: String,
    args: Vec<PathArg>,
    params: Params,
    page: u64,
    exhausted: bool,
    buffer: VecDeque<Value>,
}

impl Paginator {
    pub fn new(
        client: Client,
        name: impl Into<String>,
        args: Vec<PathArg>,
        params: Option<Params>,
    ) -> Self {
        Self {
            client,
            name: name.into(),
            args,
            params: params.unwrap_or_default(),
            page: 0,
            exhausted: false,
            buffer: VecDeque::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> PageState {
        if self.exhausted {
            PageState::Exhausted
        } else if self.page == 0 {
            PageState::Fresh
        } else {
            PageState::Paging
        }
    }

    /// Last page number requested, 0 when fresh.
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Page size: the caller's `per_page` if it is a positive integer, else 20.
    pub fn per_page(&self) -> u64 {
        let requested = match self.params.get("per_page") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        requested.filter(|&n| n > 0).unwrap_or(DEFAULT_PER_PAGE)
    }

    /// Fetch the next page. Returns `None` once exhausted or when the page is
    /// empty. The record buffer always reflects the latest fetch, so an empty
    /// page or a failed fetch leaves nothing for [`Paginator::next`].
    pub async fn next_page(&mut self) -> GlResult<Option<Vec<Value>>> {
        self.buffer.clear();
        let records = self.fetch_page().await?;
        if let Some(ref items) = records {
            self.buffer.extend(items.iter().cloned());
        }
        Ok(records)
    }

    /// Next single record, fetching pages as needed.
    pub async fn next(&mut self) -> GlResult<Option<Value>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            if self.exhausted {
                return Ok(None);
            }
            if self.next_page().await?.is_none() {
                return Ok(None);
            }
        }
    }

    /// Every record from page 1 onward. Always restarts from a fresh state.
    pub async fn all(&mut self) -> GlResult<Vec<Value>> {
        self.reset();
        let mut records = Vec::new();
        while let Some(page) = self.fetch_page().await? {
            records.extend(page);
        }
        Ok(records)
    }

    /// Return to the fresh state, dropping buffered records.
    pub fn reset(&mut self) {
        self.page = 0;
        self.exhausted = false;
        self.buffer.clear();
    }

    async fn fetch_page(&mut self) -> GlResult<Option<Vec<Value>>> {
        if self.exhausted {
            return Ok(None);
        }

        let per_page = self.per_page();
        self.page += 1;

        let mut params = self.params.clone();
        params.insert("page".into(), Value::from(self.page));
        params.insert("per_page".into(), Value::from(per_page));

        debug!("{} page {} (per_page={})", self.name, self.page, per_page);

        let result = self.client.call(&self.name, &self.args, Some(params)).await?;
        let items = match result {
            Some(Payload::Json(Value::Array(items))) => items,
            Some(other) => {
                self.exhausted = true;
                return Err(GlError::Contract(format!(
                    "{} returned {} where a list was expected",
                    self.name,
                    other.kind()
                )));
            }
            None => {
                self.exhausted = true;
                return Err(GlError::Contract(format!(
                    "{} returned nothing where a list was expected",
                    self.name
                )));
            }
        };

        if (items.len() as u64) < per_page {
            self.exhausted = true;
        }

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(items))
        }
    }
}
