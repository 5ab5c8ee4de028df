//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use gl_api::{Client, EndpointTable, Request, Response, Transport};
use gl_core::{ClientConfig, GlError, GlResult};

pub const BASE: &str = "https://gitlab.example.com";

/// Replays canned responses in order and records every request it sees.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Response>>,
    fallback: Option<Response>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    /// Answer with each response once, then fail.
    pub fn new(responses: Vec<Response>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(responses.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Answer every request with the same response.
    pub fn always(response: Response) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Request {
        self.requests.lock().unwrap().last().cloned().expect("no request sent")
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &Request) -> GlResult<Response> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(response) => Ok(response),
            None => Err(GlError::Transport("script exhausted".into())),
        }
    }
}

/// Fails every request at the network level.
#[derive(Default)]
pub struct UnreachableTransport {
    pub calls: Mutex<usize>,
}

#[async_trait]
impl Transport for UnreachableTransport {
    async fn send(&self, _request: &Request) -> GlResult<Response> {
        *self.calls.lock().unwrap() += 1;
        Err(GlError::Transport("connection failed: connection refused".into()))
    }
}

/// Client over `transport` with the bundled v4 table and zero retry wait.
pub fn client_with<F>(transport: Arc<dyn Transport>, configure: F) -> Client
where
    F: FnOnce(&mut ClientConfig),
{
    let mut config = ClientConfig::new(BASE);
    config.retry_wait_ms = 0;
    configure(&mut config);
    Client::builder(config).transport(transport).build().unwrap()
}

/// Client over `transport` with a custom endpoint table.
pub fn client_with_table(transport: Arc<dyn Transport>, yaml: &str) -> Client {
    let mut config = ClientConfig::new(BASE);
    config.retry_wait_ms = 0;
    Client::builder(config)
        .transport(transport)
        .endpoints(EndpointTable::from_yaml(yaml).unwrap())
        .build()
        .unwrap()
}

/// Value of a query parameter in a request URL.
pub fn query_param(url: &str, key: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}

/// Convert a `json!` object literal into call params.
pub fn params(value: serde_json::Value) -> gl_api::Params {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("params must be an object, got {other}"),
    }
}
