use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BoxError;

/// Request-scoped context handed to a provider on lookup; carries the
/// parameter bindings of the request being resolved.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Pluggable response cache consulted before the network path.
///
/// `Ok(Some(value))` is a hit and short-circuits execution. `Ok(None)` and
/// `Err(_)` are both treated as a miss: the request falls through to the
/// resiliency chain and the lookup outcome is never surfaced to the caller.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    async fn lookup(&self, key: &str, properties: &PropertyMap)
        -> Result<Option<Bytes>, BoxError>;
}
