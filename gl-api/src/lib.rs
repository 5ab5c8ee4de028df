//! GitLab REST API client.
//!
//! Every GitLab endpoint is a row in a declarative table (verb, path template,
//! whether it takes parameters, how to return the body). A single generic
//! dispatcher turns a table row plus positional arguments into an HTTP call,
//! handling authentication, bounded retry on 5xx/429, file uploads, and
//! GitLab's "404 on GET means absent" convention. A paginator walks list
//! endpoints page by page.
//!
//! ```no_run
//! use gl_api::{path_args, Client};
//! use gl_core::ClientConfig;
//!
//! # async fn example() -> gl_core::GlResult<()> {
//! let mut config = ClientConfig::new("https://gitlab.com");
//! config.private_token = Some("glpat-...".into());
//! let client = Client::new(config)?;
//!
//! match client.call("get_project", &path_args!["gitlab-org/gitlab"], None).await? {
//!     Some(project) => println!("{:?}", project.as_json()),
//!     None => println!("no such project"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod endpoints;
pub mod multipart;
pub mod paginator;
pub mod path;
pub mod response;
pub mod transport;

// Re-export key types
pub use client::{CallOptions, Client, ClientBuilder, Content, Exchange, Params};
pub use endpoints::{EndpointDescriptor, EndpointTable};
pub use multipart::FileUpload;
pub use paginator::{PageState, Paginator};
pub use path::PathArg;
pub use response::{PageInfo, Payload, ResponseMode};
pub use transport::{ReqwestTransport, Request, RequestBody, Response, Transport, Verb};
