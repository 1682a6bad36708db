use std::time::{Duration, Instant};

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

use crate::error::RequestError;

/// Appends template headers after group headers, keeping every value.
///
/// For a name present in both inputs the merged order is all group values
/// in insertion order followed by all template values in insertion order;
/// nothing is deduplicated or replaced.
pub(crate) fn merge_headers(group_headers: &HeaderMap, template_headers: &HeaderMap) -> HeaderMap {
    let mut merged = group_headers.clone();
    for (name, value) in template_headers {
        merged.append(name.clone(), value.clone());
    }
    merged
}

pub(crate) fn parse_header_name(name: &str) -> Result<HeaderName, RequestError> {
    name.parse()
        .map_err(|source| RequestError::InvalidHeaderName {
            name: name.to_owned(),
            source,
        })
}

pub(crate) fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue, RequestError> {
    value
        .parse()
        .map_err(|source| RequestError::InvalidHeaderValue {
            name: name.to_owned(),
            source,
        })
}

/// Wall-clock budget left before the aggregate deadline, `None` once elapsed.
pub(crate) fn remaining_budget(budget: Duration, started_at: Instant) -> Option<Duration> {
    let elapsed = started_at.elapsed();
    if elapsed >= budget {
        return None;
    }
    Some(budget - elapsed)
}
