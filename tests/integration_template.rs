use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use reqflow::prelude::*;

struct CountingTransport {
    sends: AtomicUsize,
}

impl CountingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sends: AtomicUsize::new(0),
        })
    }

    fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn send(
        &self,
        _request: &MaterializedRequest,
        _attempt: Attempt,
    ) -> Result<Bytes, BoxError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from_static(b"ok"))
    }
}

struct NullCacheProvider;

#[async_trait]
impl CacheProvider for NullCacheProvider {
    async fn lookup(
        &self,
        _key: &str,
        _properties: &PropertyMap,
    ) -> Result<Option<Bytes>, BoxError> {
        Ok(None)
    }
}

#[test]
fn variables_are_replaced_in_the_uri_pattern() {
    let group = ResourceGroup::new("test", CountingTransport::new());
    let template = group
        .new_template("var-replacement")
        .with_uri_template("/foo/{id}?name={name}")
        .with_method(Method::GET)
        .build()
        .expect("template has a uri pattern");

    let prepared = template
        .request_builder()
        .with_param("id", 3)
        .with_param("name", "acme")
        .build()
        .expect("all variables are bound");

    assert_eq!(prepared.request().uri(), "/foo/3?name=acme");
    assert_eq!(prepared.request().method(), &Method::GET);
}

#[test]
fn cache_key_pattern_materializes_with_the_same_bindings() {
    let group = ResourceGroup::new("test", CountingTransport::new());
    let template = group
        .new_template("cache-key")
        .with_uri_template("/foo/{id}")
        .with_cache_provider("/cache/{id}", Arc::new(NullCacheProvider))
        .build()
        .expect("template should build");

    let prepared = template
        .request_builder()
        .with_param("id", 5)
        .build()
        .expect("id is bound");

    assert_eq!(prepared.request().uri(), "/foo/5");
    assert_eq!(prepared.request().cache_key(), Some("/cache/5"));
}

#[test]
fn group_headers_precede_template_headers_for_a_shared_name() {
    let transport = CountingTransport::new();
    let group = ResourceGroup::builder("test", transport)
        .try_common_header("header1", "group")
        .expect("valid header")
        .build();

    let template = group
        .new_template("http-headers")
        .with_uri_template("/foo/bar")
        .try_header("header2", "template")
        .expect("valid header")
        .try_header("header1", "template")
        .expect("valid header")
        .build()
        .expect("template should build");

    let prepared = template
        .request_builder()
        .build()
        .expect("no variables to bind");
    let headers = prepared.request().headers();

    let header1: Vec<_> = headers.get_all("header1").iter().collect();
    assert_eq!(header1.len(), 2);
    assert_eq!(header1[0], "group");
    assert_eq!(header1[1], "template");

    let header2: Vec<_> = headers.get_all("header2").iter().collect();
    assert_eq!(header2.len(), 1);
    assert_eq!(header2[0], "template");
}

#[test]
fn missing_binding_fails_before_any_transport_call() {
    let transport = CountingTransport::new();
    let group = ResourceGroup::new("test", Arc::clone(&transport) as Arc<dyn Transport>);
    let template = group
        .new_template("missing-binding")
        .with_uri_template("/foo/{id}")
        .build()
        .expect("template should build");

    let error = template
        .request_builder()
        .build()
        .expect_err("id is not bound");

    match error {
        RequestError::UnboundVariable { name, pattern } => {
            assert_eq!(name, "id");
            assert_eq!(pattern, "/foo/{id}");
        }
        other => panic!("unexpected error variant: {other}"),
    }
    assert_eq!(transport.send_count(), 0);
}

#[test]
fn template_without_uri_pattern_does_not_build() {
    let group = ResourceGroup::new("test", CountingTransport::new());
    let error = group
        .new_template("no-uri")
        .build()
        .expect_err("uri pattern is mandatory");

    match error {
        RequestError::TemplateIncomplete { name } => assert_eq!(name, "no-uri"),
        other => panic!("unexpected error variant: {other}"),
    }
}

#[test]
fn template_options_override_group_defaults_field_by_field() {
    let options = ClientOptions::create()
        .with_max_auto_retries(4)
        .with_max_total_connections(50);
    let group = ResourceGroup::builder("test", CountingTransport::new())
        .with_client_options(options)
        .build();

    let template = group
        .new_template("overrides")
        .with_uri_template("/foo")
        .with_max_auto_retries(2)
        .build()
        .expect("template should build");

    assert_eq!(template.options().max_auto_retries(), 2);
    assert_eq!(template.options().max_total_connections(), 50);
    assert_eq!(
        template.options().max_auto_retries_next_server(),
        group.default_options().max_auto_retries_next_server()
    );
}

#[test]
fn invalid_header_names_are_rejected_at_registration() {
    let group = ResourceGroup::new("test", CountingTransport::new());
    let error = group
        .new_template("bad-header")
        .with_uri_template("/foo")
        .try_header("not a header\n", "value")
        .expect_err("header name contains invalid characters");

    assert_eq!(error.code(), RequestErrorCode::InvalidHeaderName);
}
