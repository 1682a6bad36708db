use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::{Semaphore, TryAcquireError};
use tokio::time::timeout;
use tracing::{Instrument, debug, info_span, warn};

use crate::error::RequestError;
use crate::metrics::GroupMetrics;
use crate::options::{AdmissionPolicy, ClientOptions};
use crate::template::MaterializedRequest;
use crate::transport::{Attempt, AttemptKind, Transport};
use crate::util::remaining_budget;

/// Shared limits for one chain run, derived from the effective options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainBudget {
    concurrency_limit: usize,
    aggregate_timeout: Duration,
}

impl ChainBudget {
    /// Concurrency limit is the template-wide admission ceiling, unchanged.
    /// The aggregate timeout bounds the whole run:
    /// `(connect + read) * (max_auto_retries + 1) * (max_auto_retries_next_server + 1)`,
    /// one connect+read budget per attempt multiplied across both retry
    /// dimensions.
    pub fn from_options(options: &ClientOptions) -> Self {
        let per_attempt = options
            .connect_timeout()
            .saturating_add(options.read_timeout());
        let attempts = (options.max_auto_retries() + 1)
            .saturating_mul(options.max_auto_retries_next_server() + 1);
        let attempts = u32::try_from(attempts).unwrap_or(u32::MAX);
        Self {
            concurrency_limit: options.max_total_connections(),
            aggregate_timeout: per_attempt.saturating_mul(attempts),
        }
    }

    pub const fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub const fn aggregate_timeout(&self) -> Duration {
        self.aggregate_timeout
    }
}

/// One resilient call: permit acquisition, deadline-bounded delegation to
/// the transport, permit release on every exit path.
#[derive(Clone, Copy, Debug)]
pub struct ExecutionUnit {
    attempt: Attempt,
}

impl ExecutionUnit {
    pub const fn attempt(&self) -> Attempt {
        self.attempt
    }

    async fn execute(
        &self,
        request: &MaterializedRequest,
        transport: &dyn Transport,
        admission: &Arc<Semaphore>,
        admission_policy: AdmissionPolicy,
        budget: ChainBudget,
        started_at: Instant,
    ) -> Result<Bytes, RequestError> {
        debug!("executing chain unit");
        let Some(remaining) = remaining_budget(budget.aggregate_timeout, started_at) else {
            return Err(deadline_error(budget, self.attempt.index, request));
        };

        let _permit = match admission_policy {
            AdmissionPolicy::Reject => match Arc::clone(admission).try_acquire_owned() {
                Ok(permit) => permit,
                Err(TryAcquireError::NoPermits) => {
                    return Err(RequestError::ConcurrencyLimitRejected {
                        limit: budget.concurrency_limit,
                        method: request.method().clone(),
                        uri: request.uri().to_owned(),
                    });
                }
                Err(TryAcquireError::Closed) => {
                    return Err(RequestError::ConcurrencyLimitClosed);
                }
            },
            AdmissionPolicy::Queue => {
                match timeout(remaining, Arc::clone(admission).acquire_owned()).await {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_)) => return Err(RequestError::ConcurrencyLimitClosed),
                    Err(_) => {
                        return Err(deadline_error(budget, self.attempt.index + 1, request));
                    }
                }
            }
        };

        let Some(remaining) = remaining_budget(budget.aggregate_timeout, started_at) else {
            return Err(deadline_error(budget, self.attempt.index + 1, request));
        };

        // The timeout drops the transport future on expiry; the owned permit
        // is released with this scope either way.
        match timeout(remaining, transport.send(request, self.attempt)).await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(source)) => Err(RequestError::Transport {
                attempt: self.attempt.index,
                method: request.method().clone(),
                uri: request.uri().to_owned(),
                source,
            }),
            Err(_) => Err(deadline_error(budget, self.attempt.index + 1, request)),
        }
    }
}

/// Ordered sequence of execution units for one materialized request.
///
/// Built fresh per execution and never shared: primary attempt first, then
/// same-target retries, then next-target retries. Units run sequentially;
/// the first success wins and the last unit's failure is authoritative.
#[derive(Clone, Debug)]
pub struct ResiliencyChain {
    units: Vec<ExecutionUnit>,
    budget: ChainBudget,
    admission_policy: AdmissionPolicy,
}

impl ResiliencyChain {
    pub fn build(options: &ClientOptions) -> Self {
        let same_target = options.max_auto_retries();
        let next_target = options.max_auto_retries_next_server();

        let mut units = Vec::with_capacity(1 + same_target + next_target);
        units.push(ExecutionUnit {
            attempt: Attempt {
                index: 0,
                kind: AttemptKind::Primary,
            },
        });
        for offset in 0..same_target {
            units.push(ExecutionUnit {
                attempt: Attempt {
                    index: 1 + offset,
                    kind: AttemptKind::RetrySameTarget,
                },
            });
        }
        for offset in 0..next_target {
            units.push(ExecutionUnit {
                attempt: Attempt {
                    index: 1 + same_target + offset,
                    kind: AttemptKind::RetryNextTarget,
                },
            });
        }

        Self {
            units,
            budget: ChainBudget::from_options(options),
            admission_policy: options.admission_policy(),
        }
    }

    pub fn units(&self) -> &[ExecutionUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub const fn budget(&self) -> ChainBudget {
        self.budget
    }

    pub(crate) async fn run(
        &self,
        request: &MaterializedRequest,
        transport: &dyn Transport,
        admission: &Arc<Semaphore>,
        metrics: &GroupMetrics,
    ) -> Result<Bytes, RequestError> {
        let started_at = Instant::now();
        let total_units = self.units.len();
        let mut last_failure = None;

        for (position, unit) in self.units.iter().enumerate() {
            if remaining_budget(self.budget.aggregate_timeout, started_at).is_none() {
                return Err(deadline_error(self.budget, position, request));
            }

            let span = info_span!(
                "reqflow.attempt",
                method = %request.method(),
                uri = %request.uri(),
                attempt = unit.attempt.index,
                kind = %unit.attempt.kind,
                total_units = total_units
            );

            metrics.record_attempt();
            if unit.attempt.index > 0 {
                metrics.record_retry();
            }

            match unit
                .execute(
                    request,
                    transport,
                    admission,
                    self.admission_policy,
                    self.budget,
                    started_at,
                )
                .instrument(span)
                .await
            {
                Ok(payload) => return Ok(payload),
                Err(failure) => {
                    if position + 1 < total_units {
                        warn!(error = %failure, "chain unit failed, falling back to next unit");
                    }
                    last_failure = Some(failure);
                }
            }
        }

        Err(last_failure
            .unwrap_or_else(|| deadline_error(self.budget, 0, request)))
    }
}

fn deadline_error(
    budget: ChainBudget,
    attempts_started: usize,
    request: &MaterializedRequest,
) -> RequestError {
    RequestError::DeadlineExceeded {
        budget_ms: budget.aggregate_timeout.as_millis(),
        attempts_started,
        method: request.method().clone(),
        uri: request.uri().to_owned(),
    }
}
