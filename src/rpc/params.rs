//! Request parameter access.
//!
//! Every helper names the offending field in its
//! [`Error::InvalidParameter`] so callers can correct the request. Defaults
//! are normalized here too - most notably `maxResults`, where non-positive
//! values reset to the default instead of erroring.

use serde_json::{Map, Value};

use crate::analysis::collector::DEFAULT_MAX_RESULTS;
use crate::Result;

/// Requires a non-empty, non-whitespace string parameter.
pub fn require_str(params: &Map<String, Value>, name: &str) -> Result<String> {
    match params.get(name).and_then(Value::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
        _ => Err(invalid_param_error!("Missing parameter: {name}")),
    }
}

/// Requires a string parameter, allowing the empty string (e.g. the global
/// namespace).
pub fn require_str_allow_empty(params: &Map<String, Value>, name: &str) -> Result<String> {
    match params.get(name).and_then(Value::as_str) {
        Some(value) => Ok(value.to_string()),
        None => Err(invalid_param_error!("Missing parameter: {name}")),
    }
}

/// Returns an optional string parameter.
#[must_use]
pub fn opt_str(params: &Map<String, Value>, name: &str) -> Option<String> {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Returns a boolean parameter, or `default` when absent or null.
#[must_use]
pub fn get_bool(params: &Map<String, Value>, name: &str, default: bool) -> bool {
    match params.get(name) {
        Some(Value::Bool(value)) => *value,
        _ => default,
    }
}

/// Returns an integer parameter, or `default` when absent or null.
#[must_use]
pub fn get_int(params: &Map<String, Value>, name: &str, default: i64) -> i64 {
    match params.get(name).and_then(Value::as_i64) {
        Some(value) => value,
        None => default,
    }
}

/// Returns an optional `u32` parameter (metadata tokens).
pub fn opt_u32(params: &Map<String, Value>, name: &str) -> Result<Option<u32>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|raw| u32::try_from(raw).ok())
            .map(Some)
            .ok_or_else(|| invalid_param_error!("Invalid parameter: {name}")),
    }
}

/// Requires a `u32` parameter (metadata tokens).
pub fn require_u32(params: &Map<String, Value>, name: &str) -> Result<u32> {
    opt_u32(params, name)?.ok_or_else(|| invalid_param_error!("Missing parameter: {name}"))
}

/// Requires a module identity parameter and parses it.
pub fn require_mvid(params: &Map<String, Value>, name: &str) -> Result<uguid::Guid> {
    let text = require_str(params, name)?;
    text.parse::<uguid::Guid>()
        .map_err(|_| invalid_param_error!("Invalid GUID for {name}"))
}

/// Reads `maxResults`, applying the default when absent or non-positive.
#[must_use]
pub fn max_results(params: &Map<String, Value>) -> usize {
    let requested = get_int(params, "maxResults", DEFAULT_MAX_RESULTS as i64);
    if requested <= 0 {
        DEFAULT_MAX_RESULTS
    } else {
        requested as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_require_str_rejects_blank() {
        let map = params(json!({"pattern": "   "}));
        assert!(require_str(&map, "pattern").is_err());
        assert!(require_str_allow_empty(&map, "pattern").is_ok());
    }

    #[test]
    fn test_max_results_normalization() {
        assert_eq!(max_results(&params(json!({}))), DEFAULT_MAX_RESULTS);
        assert_eq!(max_results(&params(json!({"maxResults": 0}))), DEFAULT_MAX_RESULTS);
        assert_eq!(max_results(&params(json!({"maxResults": -5}))), DEFAULT_MAX_RESULTS);
        assert_eq!(max_results(&params(json!({"maxResults": 10}))), 10);
    }

    #[test]
    fn test_mvid_parsing() {
        let map = params(json!({"moduleMvid": "01234567-89ab-cdef-0123-456789abcdef"}));
        assert!(require_mvid(&map, "moduleMvid").is_ok());

        let map = params(json!({"moduleMvid": "not-a-guid"}));
        let err = require_mvid(&map, "moduleMvid").unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_u32_extraction() {
        let map = params(json!({"token": 0x0200_0001u32}));
        assert_eq!(require_u32(&map, "token").unwrap(), 0x0200_0001);
        assert!(require_u32(&map, "missing").is_err());

        let map = params(json!({"token": "wrong"}));
        assert!(require_u32(&map, "token").is_err());
    }
}
