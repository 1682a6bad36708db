use std::fmt::Display;
use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use tokio::sync::Semaphore;

use crate::ReqflowResult;
use crate::cache::{CacheProvider, PropertyMap};
use crate::error::RequestError;
use crate::metrics::GroupMetrics;
use crate::options::{AdmissionPolicy, ClientOptions};
use crate::request::PreparedRequest;
use crate::transport::Transport;
use crate::util::{merge_headers, parse_header_name, parse_header_value};
use crate::vars::{ParameterBindings, substitute};

/// Configures one kind of outbound call before it is frozen into a
/// [`RequestTemplate`].
///
/// The builder starts from its resource group's defaults: common headers
/// are already present (template headers append after them) and the
/// effective options start as the group options, overridden field by field.
pub struct RequestTemplateBuilder {
    name: String,
    group_name: String,
    group_headers: HeaderMap,
    headers: HeaderMap,
    method: Method,
    uri_pattern: Option<String>,
    cache_key_pattern: Option<String>,
    cache_provider: Option<Arc<dyn CacheProvider>>,
    options: ClientOptions,
    transport: Arc<dyn Transport>,
    metrics: GroupMetrics,
}

impl std::fmt::Debug for RequestTemplateBuilder {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RequestTemplateBuilder")
            .field("name", &self.name)
            .field("group_name", &self.group_name)
            .field("group_headers", &self.group_headers)
            .field("headers", &self.headers)
            .field("method", &self.method)
            .field("uri_pattern", &self.uri_pattern)
            .field("cache_key_pattern", &self.cache_key_pattern)
            .field("options", &self.options)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl RequestTemplateBuilder {
    pub(crate) fn new(
        name: String,
        group_name: String,
        group_headers: HeaderMap,
        options: ClientOptions,
        transport: Arc<dyn Transport>,
        metrics: GroupMetrics,
    ) -> Self {
        Self {
            name,
            group_name,
            group_headers,
            headers: HeaderMap::new(),
            method: Method::GET,
            uri_pattern: None,
            cache_key_pattern: None,
            cache_provider: None,
            options,
            transport,
            metrics,
        }
    }

    pub fn with_uri_template(mut self, uri_pattern: impl Into<String>) -> Self {
        self.uri_pattern = Some(uri_pattern.into());
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn try_header(self, name: &str, value: &str) -> ReqflowResult<Self> {
        let name = parse_header_name(name)?;
        let value = parse_header_value(name.as_str(), value)?;
        Ok(self.with_header(name, value))
    }

    pub fn with_cache_provider(
        mut self,
        key_pattern: impl Into<String>,
        provider: Arc<dyn CacheProvider>,
    ) -> Self {
        self.cache_key_pattern = Some(key_pattern.into());
        self.cache_provider = Some(provider);
        self
    }

    pub fn with_client_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_auto_retries(mut self, max_auto_retries: usize) -> Self {
        self.options = self.options.with_max_auto_retries(max_auto_retries);
        self
    }

    pub fn with_max_auto_retries_next_server(
        mut self,
        max_auto_retries_next_server: usize,
    ) -> Self {
        self.options = self
            .options
            .with_max_auto_retries_next_server(max_auto_retries_next_server);
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: std::time::Duration) -> Self {
        self.options = self.options.with_connect_timeout(connect_timeout);
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: std::time::Duration) -> Self {
        self.options = self.options.with_read_timeout(read_timeout);
        self
    }

    pub fn with_max_total_connections(mut self, max_total_connections: usize) -> Self {
        self.options = self.options.with_max_total_connections(max_total_connections);
        self
    }

    pub fn with_admission_policy(mut self, admission_policy: AdmissionPolicy) -> Self {
        self.options = self.options.with_admission_policy(admission_policy);
        self
    }

    /// Freezes the template. Headers are merged here, once: group values
    /// first, template values appended after them. The admission semaphore
    /// is created here and shared by every request built from the template.
    pub fn build(self) -> ReqflowResult<RequestTemplate> {
        let Some(uri_pattern) = self.uri_pattern else {
            return Err(RequestError::TemplateIncomplete { name: self.name });
        };

        Ok(RequestTemplate {
            name: self.name,
            group_name: self.group_name,
            method: self.method,
            uri_pattern,
            headers: merge_headers(&self.group_headers, &self.headers),
            cache_key_pattern: self.cache_key_pattern,
            cache_provider: self.cache_provider,
            admission: Arc::new(Semaphore::new(self.options.max_total_connections())),
            options: self.options,
            transport: self.transport,
            metrics: self.metrics,
        })
    }
}

/// Immutable description of one kind of call, shared read-only across all
/// requests built from it.
pub struct RequestTemplate {
    name: String,
    group_name: String,
    method: Method,
    uri_pattern: String,
    headers: HeaderMap,
    cache_key_pattern: Option<String>,
    cache_provider: Option<Arc<dyn CacheProvider>>,
    options: ClientOptions,
    admission: Arc<Semaphore>,
    transport: Arc<dyn Transport>,
    metrics: GroupMetrics,
}

impl std::fmt::Debug for RequestTemplate {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RequestTemplate")
            .field("name", &self.name)
            .field("group_name", &self.group_name)
            .field("method", &self.method)
            .field("uri_pattern", &self.uri_pattern)
            .field("headers", &self.headers)
            .field("cache_key_pattern", &self.cache_key_pattern)
            .field("options", &self.options)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl RequestTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri_pattern(&self) -> &str {
        &self.uri_pattern
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn cache_key_pattern(&self) -> Option<&str> {
        self.cache_key_pattern.as_deref()
    }

    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn request_builder(&self) -> RequestBuilder<'_> {
        RequestBuilder {
            template: self,
            bindings: ParameterBindings::new(),
        }
    }
}

/// Binds per-call parameters to a template.
pub struct RequestBuilder<'a> {
    template: &'a RequestTemplate,
    bindings: ParameterBindings,
}

impl RequestBuilder<'_> {
    pub fn with_param(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.bindings.set(name, value);
        self
    }

    /// Materializes the request: URI pattern first, then the cache-key
    /// pattern when present, both against the same bindings. Headers come
    /// verbatim from the template. Fails fast with
    /// [`RequestError::UnboundVariable`] before any network attempt.
    pub fn build(self) -> ReqflowResult<PreparedRequest> {
        let uri = substitute(&self.template.uri_pattern, &self.bindings)?;
        let cache_key = self
            .template
            .cache_key_pattern
            .as_deref()
            .map(|pattern| substitute(pattern, &self.bindings))
            .transpose()?;

        let properties: PropertyMap = self
            .bindings
            .iter()
            .map(|(name, value)| (name.to_owned(), serde_json::Value::from(value)))
            .collect();

        Ok(PreparedRequest {
            request: MaterializedRequest {
                uri,
                method: self.template.method.clone(),
                headers: self.template.headers.clone(),
                cache_key,
            },
            properties,
            template_name: self.template.name.clone(),
            group_name: self.template.group_name.clone(),
            options: self.template.options,
            admission: Arc::clone(&self.template.admission),
            transport: Arc::clone(&self.template.transport),
            cache_provider: self.template.cache_provider.clone(),
            metrics: self.template.metrics.clone(),
        })
    }
}

/// The concrete result of binding parameters to a template: exact URI,
/// method, headers and (when configured) cache key. Never mutated after
/// creation.
#[derive(Clone, Debug)]
pub struct MaterializedRequest {
    uri: String,
    method: Method,
    headers: HeaderMap,
    cache_key: Option<String>,
}

impl MaterializedRequest {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn cache_key(&self) -> Option<&str> {
        self.cache_key.as_deref()
    }
}
