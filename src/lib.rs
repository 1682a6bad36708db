//! `reqflow` turns declarative request templates into resilient outbound
//! calls: URI-pattern materialization, optional cache-first resolution and
//! a budgeted primary-then-fallback execution chain, with the actual
//! network transport supplied as a collaborator.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use bytes::Bytes;
//! use reqflow::prelude::*;
//!
//! struct HttpTransport;
//!
//! #[async_trait]
//! impl Transport for HttpTransport {
//!     async fn send(
//!         &self,
//!         request: &MaterializedRequest,
//!         _attempt: Attempt,
//!     ) -> Result<Bytes, BoxError> {
//!         // Hand the materialized request to your HTTP stack here.
//!         Ok(Bytes::from(format!("GET {}", request.uri())))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let group = ResourceGroup::builder("movies", Arc::new(HttpTransport))
//!         .try_common_header("x-client-id", "reqflow-demo")?
//!         .with_client_options(ClientOptions::create().with_max_auto_retries(1))
//!         .build();
//!
//!     let template = group
//!         .new_template("recommendations-by-user")
//!         .with_uri_template("/users/{user}/recommendations")
//!         .build()?;
//!
//!     let payload = template
//!         .request_builder()
//!         .with_param("user", "u1012")
//!         .build()?
//!         .execute()
//!         .await?;
//!
//!     println!("{} bytes", payload.len());
//!     Ok(())
//! }
//! ```
//!
//! # Execution model
//!
//! - Templates are immutable once built and shared across requests; each
//!   template owns the shared admission semaphore for its calls.
//! - Binding parameters materializes the URI and cache key; an unbound
//!   variable fails fast, before any network attempt.
//! - A cache hit short-circuits the transport entirely; miss and provider
//!   error both fall through silently.
//! - The chain runs `1 + max_auto_retries + max_auto_retries_next_server`
//!   units in order under one aggregate deadline; the first success wins
//!   and the last failure is authoritative.

mod cache;
mod chain;
mod error;
mod group;
mod metrics;
mod options;
mod request;
mod template;
mod transport;
mod util;
mod vars;

pub use crate::cache::{CacheProvider, PropertyMap};
pub use crate::chain::{ChainBudget, ExecutionUnit, ResiliencyChain};
pub use crate::error::{BoxError, RequestError, RequestErrorCode};
pub use crate::group::{ResourceGroup, ResourceGroupBuilder};
pub use crate::metrics::MetricsSnapshot;
pub use crate::options::{AdmissionPolicy, ClientOptions};
pub use crate::request::PreparedRequest;
pub use crate::template::{
    MaterializedRequest, RequestBuilder, RequestTemplate, RequestTemplateBuilder,
};
pub use crate::transport::{Attempt, AttemptKind, Transport};
pub use crate::vars::ParameterBindings;

pub type ReqflowResult<T> = std::result::Result<T, RequestError>;

pub mod prelude {
    pub use crate::{
        AdmissionPolicy, Attempt, AttemptKind, BoxError, CacheProvider, ChainBudget,
        ClientOptions, MaterializedRequest, MetricsSnapshot, PreparedRequest, PropertyMap,
        ReqflowResult, RequestError, RequestErrorCode, RequestTemplate, ResiliencyChain,
        ResourceGroup, Transport,
    };
}
