//! GitLab REST client.
//!
//! Handles URL construction, authentication headers, body encoding, bounded
//! retry on 5xx/429, and response interpretation. Every call returns its own
//! [`Exchange`], so one client can be shared freely across tasks.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use gl_core::config::{ClientConfig, Credential};
use gl_core::error::{GlError, GlResult};

use crate::endpoints::{EndpointDescriptor, EndpointTable};
use crate::multipart::{encode_form, FileUpload};
use crate::paginator::Paginator;
use crate::path::{resolve_path, PathArg};
use crate::response::{interpret, Interpretation, PageInfo, Payload, ResponseMode};
use crate::transport::{ReqwestTransport, Request, RequestBody, Response, Transport, Verb};

/// Named call parameters.
pub type Params = Map<String, Value>;

/// Body of a call.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Content {
    #[default]
    None,
    /// Serialized as `application/json`.
    Json(Value),
    /// Sent as `multipart/form-data`. Only valid for POST and PUT.
    File(FileUpload),
}

/// Per-call options for [`Client::execute`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    pub query: Option<Params>,
    pub content: Content,
    pub mode: ResponseMode,
}

impl CallOptions {
    /// Route `params` the way GitLab expects for `verb`: the query string for
    /// GET and DELETE, a JSON body otherwise.
    pub fn for_params(verb: Verb, params: Option<Params>) -> Self {
        match params {
            Some(p) if verb.params_in_query() => Self {
                query: Some(p),
                ..Self::default()
            },
            Some(p) => Self {
                content: Content::Json(Value::Object(p)),
                ..Self::default()
            },
            None => Self::default(),
        }
    }

    pub fn query(mut self, query: Params) -> Self {
        self.query = Some(query);
        self
    }

    pub fn content(mut self, content: Content) -> Self {
        self.content = content;
        self
    }

    pub fn mode(mut self, mode: ResponseMode) -> Self {
        self.mode = mode;
        self
    }
}

/// The request sent, the final response received, and its interpretation.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub request: Request,
    pub response: Response,
    /// Total attempts, including the first.
    pub attempts: u32,
    /// `None` when the server reported the resource as absent.
    pub payload: Option<Payload>,
}

impl Exchange {
    /// Pagination headers of the final response.
    pub fn page_info(&self) -> PageInfo {
        PageInfo::from_response(&self.response)
    }
}

/// Builder for [`Client`], mainly for swapping the transport or table.
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    endpoints: Option<EndpointTable>,
}

impl ClientBuilder {
    /// Use a custom transport instead of reqwest.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom endpoint table instead of the bundled one.
    pub fn endpoints(mut self, endpoints: EndpointTable) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> GlResult<Client> {
        self.config.validate()?;
        let credential = self.config.credential()?;
        let base_url = self.config.base_url()?;

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(&self.config)?),
        };
        let endpoints = match self.endpoints {
            Some(e) => e,
            None => EndpointTable::bundled(self.config.api_version)?,
        };

        debug!("client configured for {base_url} ({} endpoints)", endpoints.len());

        Ok(Client {
            config: Arc::new(self.config),
            credential: Arc::new(credential),
            base_url: Arc::from(base_url),
            transport,
            endpoints: Arc::new(endpoints),
        })
    }
}

/// GitLab REST client.
///
/// Cheap to clone; configuration, transport and endpoint table are shared.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    credential: Arc<Credential>,
    /// Canonical API root, no trailing slash.
    base_url: Arc<str>,
    transport: Arc<dyn Transport>,
    endpoints: Arc<EndpointTable>,
}

impl Client {
    /// Create a client over reqwest with the bundled endpoint table.
    pub fn new(config: ClientConfig) -> GlResult<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            transport: None,
            endpoints: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoints(&self) -> &EndpointTable {
        &self.endpoints
    }

    /// A new client that impersonates `user`. `self` is left untouched.
    pub fn with_sudo(&self, user: impl Into<String>) -> Client {
        self.with_config(|config| config.sudo = Some(user.into()))
    }

    /// A new client without impersonation.
    pub fn without_sudo(&self) -> Client {
        self.with_config(|config| config.sudo = None)
    }

    fn with_config<F: FnOnce(&mut ClientConfig)>(&self, update: F) -> Client {
        let mut config = (*self.config).clone();
        update(&mut config);
        Client {
            config: Arc::new(config),
            ..self.clone()
        }
    }

    /// Authentication and content negotiation headers for every request.
    fn base_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        match self.credential.as_ref() {
            Credential::AccessToken(token) => {
                headers.push(("Authorization".into(), format!("Bearer {token}")));
            }
            Credential::PrivateToken(token) => {
                headers.push(("Private-Token".into(), token.clone()));
            }
            Credential::None => {}
        }
        if let Some(ref user) = self.config.sudo {
            headers.push(("Sudo".into(), user.clone()));
        }
        headers
    }

    /// Execute one logical API call against a path template.
    pub async fn execute(
        &self,
        verb: Verb,
        template: &str,
        args: &[PathArg],
        options: CallOptions,
    ) -> GlResult<Exchange> {
        let path = resolve_path(template, args)?;

        let mut url = format!("{}/{}", self.base_url, path);
        if let Some(query) = options.query.as_ref().filter(|q| !q.is_empty()) {
            let encoded = encode_query(query);
            if !encoded.is_empty() {
                url.push('?');
                url.push_str(&encoded);
            }
        }

        let mut headers = self.base_headers();
        let body = match options.content {
            Content::None => RequestBody::Empty,
            Content::Json(value) => {
                let bytes = serde_json::to_vec(&value)?;
                headers.push(("Content-Type".into(), "application/json".into()));
                headers.push(("Content-Length".into(), bytes.len().to_string()));
                RequestBody::Json(bytes)
            }
            Content::File(upload) => match verb {
                Verb::Post => RequestBody::Form(upload.read().await?),
                Verb::Put => {
                    let raw = encode_form(&upload.read().await?);
                    headers.push(("Content-Type".into(), raw.content_type()));
                    headers.push(("Content-Length".into(), raw.body.len().to_string()));
                    RequestBody::Raw(raw.body)
                }
                other => {
                    return Err(GlError::Arity(format!(
                        "file uploads require POST or PUT, not {other}"
                    )))
                }
            },
        };

        let request = Request {
            verb,
            url,
            headers,
            body,
        };
        let (response, attempts) = self.send_with_retry(&request).await?;

        let payload = interpret(
            &Interpretation {
                verb,
                template,
                url: &request.url,
                mode: options.mode,
                absent_on_forbidden: &self.config.absent_on_forbidden,
            },
            &response,
        )?;

        Ok(Exchange {
            request,
            response,
            attempts,
            payload,
        })
    }

    /// Send `request`, resending it after a fixed wait while the server
    /// answers 5xx or 429 and retries remain.
    async fn send_with_retry(&self, request: &Request) -> GlResult<(Response, u32)> {
        debug!("{} {}", request.verb, request.url);

        let max_attempts = self.config.retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            let response = self.transport.send(request).await?;

            if is_retryable(response.status) && attempt < max_attempts {
                let wait = self.config.retry_wait();
                warn!(
                    "retryable status {} from {} {} (attempt {}/{}), retrying in {:.1}s",
                    response.status,
                    request.verb,
                    request.url,
                    attempt,
                    max_attempts,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            debug!("{} {} -> {}", request.verb, request.url, response.status);
            return Ok((response, attempt));
        }
    }

    /// Look up an endpoint by name.
    pub fn endpoint(&self, name: &str) -> GlResult<&EndpointDescriptor> {
        self.endpoints.require(name)
    }

    /// Call a named endpoint and return its payload, or `None` when absent.
    pub async fn call(
        &self,
        name: &str,
        args: &[PathArg],
        params: Option<Params>,
    ) -> GlResult<Option<Payload>> {
        Ok(self.call_exchange(name, args, params).await?.payload)
    }

    /// Call a named endpoint and return the full exchange.
    pub async fn call_exchange(
        &self,
        name: &str,
        args: &[PathArg],
        params: Option<Params>,
    ) -> GlResult<Exchange> {
        let endpoint = self.endpoint(name)?;
        endpoint.check_arity(args.len(), params.is_some())?;

        let options = CallOptions::for_params(endpoint.verb, params).mode(endpoint.response);
        self.execute(endpoint.verb, &endpoint.path, args, options)
            .await
    }

    /// Upload a file to a named endpoint. Extra parameters go in the query.
    pub async fn upload(
        &self,
        name: &str,
        args: &[PathArg],
        file: FileUpload,
        params: Option<Params>,
    ) -> GlResult<Option<Payload>> {
        let endpoint = self.endpoint(name)?;
        endpoint.check_arity(args.len(), params.is_some())?;

        let mut options = CallOptions::default()
            .content(Content::File(file))
            .mode(endpoint.response);
        options.query = params;
        Ok(self
            .execute(endpoint.verb, &endpoint.path, args, options)
            .await?
            .payload)
    }

    /// Iterate a list endpoint page by page.
    pub fn paginate(
        &self,
        name: impl Into<String>,
        args: Vec<PathArg>,
        params: Option<Params>,
    ) -> Paginator {
        Paginator::new(self.clone(), name, args, params)
    }
}

fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Encode parameters as a query string.
///
/// Arrays become repeated `key[]=v` pairs, objects become `key[sub]=v`, and
/// nulls are skipped.
pub fn encode_query(params: &Params) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        push_pairs(&mut pairs, urlencoding::encode(key).into_owned(), value);
    }
    pairs.join("&")
}

fn push_pairs(pairs: &mut Vec<String>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push(format!("{key}={b}")),
        Value::Number(n) => pairs.push(format!("{key}={n}")),
        Value::String(s) => pairs.push(format!("{key}={}", urlencoding::encode(s))),
        Value::Array(items) => {
            for item in items {
                push_pairs(pairs, format!("{key}[]"), item);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                push_pairs(pairs, format!("{key}[{}]", urlencoding::encode(sub)), item);
            }
        }
    }
}
