use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, info_span};

use crate::ReqflowResult;
use crate::cache::{CacheProvider, PropertyMap};
use crate::chain::ResiliencyChain;
use crate::metrics::GroupMetrics;
use crate::options::ClientOptions;
use crate::template::MaterializedRequest;
use crate::transport::Transport;

/// A materialized request bound to its template's collaborators, ready to
/// resolve: cache first when configured, then a fresh resiliency chain.
pub struct PreparedRequest {
    pub(crate) request: MaterializedRequest,
    pub(crate) properties: PropertyMap,
    pub(crate) template_name: String,
    pub(crate) group_name: String,
    pub(crate) options: ClientOptions,
    pub(crate) admission: Arc<Semaphore>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) cache_provider: Option<Arc<dyn CacheProvider>>,
    pub(crate) metrics: GroupMetrics,
}

impl std::fmt::Debug for PreparedRequest {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PreparedRequest")
            .field("request", &self.request)
            .field("properties", &self.properties)
            .field("template_name", &self.template_name)
            .field("group_name", &self.group_name)
            .field("options", &self.options)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl PreparedRequest {
    pub fn request(&self) -> &MaterializedRequest {
        &self.request
    }

    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Resolves the request.
    ///
    /// With a cache provider configured the materialized cache key is
    /// looked up first; a hit returns without touching the transport, and
    /// a miss or provider error falls through silently. The network path
    /// builds a chain from the effective options and runs it to the first
    /// success, surfacing the last unit's failure when every unit fails.
    /// Cache lookups are not charged against the chain's budgets.
    pub async fn execute(&self) -> ReqflowResult<Bytes> {
        let span = info_span!(
            "reqflow.request",
            group = %self.group_name,
            template = %self.template_name,
            method = %self.request.method(),
            uri = %self.request.uri()
        );
        self.resolve().instrument(span).await
    }

    async fn resolve(&self) -> ReqflowResult<Bytes> {
        self.metrics.record_request_started();
        let _in_flight = self.metrics.enter_in_flight();
        let started_at = Instant::now();

        if let (Some(cache_key), Some(provider)) = (self.request.cache_key(), &self.cache_provider)
        {
            match provider.lookup(cache_key, &self.properties).await {
                Ok(Some(payload)) => {
                    debug!(cache_key, "cache hit, skipping network execution");
                    self.metrics.record_cache_hit();
                    let result = Ok(payload);
                    self.metrics
                        .record_request_completed(&result, started_at.elapsed());
                    return result;
                }
                Ok(None) => {
                    debug!(cache_key, "cache miss, falling through to network");
                    self.metrics.record_cache_fallthrough();
                }
                Err(error) => {
                    debug!(
                        cache_key,
                        error = %error,
                        "cache lookup failed, falling through to network"
                    );
                    self.metrics.record_cache_fallthrough();
                }
            }
        }

        let chain = ResiliencyChain::build(&self.options);
        let result = chain
            .run(
                &self.request,
                self.transport.as_ref(),
                &self.admission,
                &self.metrics,
            )
            .await;
        self.metrics
            .record_request_completed(&result, started_at.elapsed());
        result
    }
}
