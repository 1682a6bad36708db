use http::Method;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequestErrorCode {
    UnboundVariable,
    TemplateIncomplete,
    InvalidHeaderName,
    InvalidHeaderValue,
    ConcurrencyLimitRejected,
    ConcurrencyLimitClosed,
    DeadlineExceeded,
    Transport,
}

impl RequestErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnboundVariable => "unbound_variable",
            Self::TemplateIncomplete => "template_incomplete",
            Self::InvalidHeaderName => "invalid_header_name",
            Self::InvalidHeaderValue => "invalid_header_value",
            Self::ConcurrencyLimitRejected => "concurrency_limit_rejected",
            Self::ConcurrencyLimitClosed => "concurrency_limit_closed",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Transport => "transport",
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RequestError {
    #[error("pattern {pattern} references unbound variable {{{name}}}")]
    UnboundVariable { name: String, pattern: String },
    #[error("request template {name} has no uri pattern")]
    TemplateIncomplete { name: String },
    #[error("invalid header name {name}: {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
    #[error("invalid header value for {name}: {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("admission limit of {limit} concurrent requests reached for {method} {uri}")]
    ConcurrencyLimitRejected {
        limit: usize,
        method: Method,
        uri: String,
    },
    #[error("request admission limiter is closed")]
    ConcurrencyLimitClosed,
    #[error(
        "aggregate budget of {budget_ms}ms exceeded after {attempts_started} attempts for {method} {uri}"
    )]
    DeadlineExceeded {
        budget_ms: u128,
        attempts_started: usize,
        method: Method,
        uri: String,
    },
    #[error("transport failure on attempt {attempt} for {method} {uri}: {source}")]
    Transport {
        attempt: usize,
        method: Method,
        uri: String,
        #[source]
        source: BoxError,
    },
}

impl RequestError {
    pub const fn code(&self) -> RequestErrorCode {
        match self {
            Self::UnboundVariable { .. } => RequestErrorCode::UnboundVariable,
            Self::TemplateIncomplete { .. } => RequestErrorCode::TemplateIncomplete,
            Self::InvalidHeaderName { .. } => RequestErrorCode::InvalidHeaderName,
            Self::InvalidHeaderValue { .. } => RequestErrorCode::InvalidHeaderValue,
            Self::ConcurrencyLimitRejected { .. } => RequestErrorCode::ConcurrencyLimitRejected,
            Self::ConcurrencyLimitClosed => RequestErrorCode::ConcurrencyLimitClosed,
            Self::DeadlineExceeded { .. } => RequestErrorCode::DeadlineExceeded,
            Self::Transport { .. } => RequestErrorCode::Transport,
        }
    }
}
