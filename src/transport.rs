use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BoxError;
use crate::template::MaterializedRequest;

/// Which retry dimension an execution unit belongs to.
///
/// Target selection is the load-balancer collaborator's concern; the kind
/// is passed through so that collaborator can keep same-target retries on
/// the current target and move next-target retries elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptKind {
    Primary,
    RetrySameTarget,
    RetryNextTarget,
}

impl AttemptKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::RetrySameTarget => "retry_same_target",
            Self::RetryNextTarget => "retry_next_target",
        }
    }
}

impl std::fmt::Display for AttemptKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Position of one execution unit within a chain run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attempt {
    pub index: usize,
    pub kind: AttemptKind,
}

/// External network collaborator executing one attempt.
///
/// The returned future must be cancel-safe: the chain drops it when the
/// aggregate deadline elapses mid-attempt, and the drop must abort the
/// in-flight call promptly. The core never parses HTTP wire bytes itself.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: &MaterializedRequest,
        attempt: Attempt,
    ) -> Result<Bytes, BoxError>;
}
