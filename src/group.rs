use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

use crate::ReqflowResult;
use crate::metrics::{GroupMetrics, MetricsSnapshot};
use crate::options::ClientOptions;
use crate::template::RequestTemplateBuilder;
use crate::transport::Transport;
use crate::util::{parse_header_name, parse_header_value};

/// Shared defaults for a family of request templates: common headers,
/// default options, the transport collaborator and group-wide metrics.
///
/// Groups are explicitly constructed and passed by reference; there is no
/// process-wide registry, and the application entry point owns their
/// lifetime.
pub struct ResourceGroup {
    name: String,
    common_headers: HeaderMap,
    default_options: ClientOptions,
    transport: Arc<dyn Transport>,
    metrics: GroupMetrics,
}

impl ResourceGroup {
    pub fn new(name: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self::builder(name, transport).build()
    }

    pub fn builder(name: impl Into<String>, transport: Arc<dyn Transport>) -> ResourceGroupBuilder {
        ResourceGroupBuilder {
            name: name.into(),
            common_headers: HeaderMap::new(),
            default_options: ClientOptions::create(),
            transport,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn common_headers(&self) -> &HeaderMap {
        &self.common_headers
    }

    pub const fn default_options(&self) -> &ClientOptions {
        &self.default_options
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Starts a template seeded with this group's headers and options.
    pub fn new_template(&self, name: impl Into<String>) -> RequestTemplateBuilder {
        RequestTemplateBuilder::new(
            name.into(),
            self.name.clone(),
            self.common_headers.clone(),
            self.default_options,
            Arc::clone(&self.transport),
            self.metrics.clone(),
        )
    }
}

pub struct ResourceGroupBuilder {
    name: String,
    common_headers: HeaderMap,
    default_options: ClientOptions,
    transport: Arc<dyn Transport>,
}

impl ResourceGroupBuilder {
    /// Appends a header shared by every template in the group. Appending
    /// the same name twice keeps both values.
    pub fn with_common_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.common_headers.append(name, value);
        self
    }

    pub fn try_common_header(self, name: &str, value: &str) -> ReqflowResult<Self> {
        let name = parse_header_name(name)?;
        let value = parse_header_value(name.as_str(), value)?;
        Ok(self.with_common_header(name, value))
    }

    pub fn with_client_options(mut self, default_options: ClientOptions) -> Self {
        self.default_options = default_options;
        self
    }

    pub fn build(self) -> ResourceGroup {
        ResourceGroup {
            name: self.name,
            common_headers: self.common_headers,
            default_options: self.default_options,
            transport: self.transport,
            metrics: GroupMetrics::default(),
        }
    }
}
