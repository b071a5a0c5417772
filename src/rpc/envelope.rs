//! The request/response envelope.
//!
//! `{ id?, method, params? }` in; `{ jsonrpc, id, result }` or
//! `{ jsonrpc, id, error: { code, message } }` out. A request without an `id`
//! is a notification: it still executes, but no envelope is ever produced for
//! it - which is different from an explicit `"id": null`.

use serde_json::{json, Map, Value};

use crate::{Error, Result};

/// A parsed request envelope.
#[derive(Debug)]
pub struct Request {
    /// Correlation id. `None` when the field was absent (a notification);
    /// `Some(Value::Null)` when it was explicitly null.
    pub id: Option<Value>,
    /// Requested method name, if present and a string.
    pub method: Option<String>,
    /// Parameter object; empty when absent or not an object.
    pub params: Map<String, Value>,
}

impl Request {
    /// Interprets a JSON value as a request envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseFailure`] when the value is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::ParseFailure("request must be a JSON object".to_string()));
        };
        let id = map.get("id").cloned();
        let method = map
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string);
        let params = match map.get("params") {
            Some(Value::Object(params)) => params.clone(),
            _ => Map::new(),
        };
        Ok(Request { id, method, params })
    }

    /// Parses a request from raw text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseFailure`] for malformed JSON.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|err| Error::ParseFailure(err.to_string()))?;
        Self::from_value(value)
    }

    /// Returns `true` when the request carries no correlation id at all.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Builds a success envelope.
#[must_use]
pub fn make_result(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// Builds an error envelope from a failure.
#[must_use]
pub fn make_error(id: &Value, error: &Error) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code(),
            "message": error.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_id_is_notification() {
        let request = Request::parse(r#"{"method": "listAssemblies"}"#).unwrap();
        assert!(request.is_notification());
        assert_eq!(request.method.as_deref(), Some("listAssemblies"));
    }

    #[test]
    fn test_explicit_null_id_is_not_a_notification() {
        let request = Request::parse(r#"{"id": null, "method": "listAssemblies"}"#).unwrap();
        assert!(!request.is_notification());
        assert_eq!(request.id, Some(Value::Null));
    }

    #[test]
    fn test_malformed_body_is_parse_failure() {
        assert!(matches!(
            Request::parse("not json").unwrap_err(),
            Error::ParseFailure(_)
        ));
        assert!(matches!(
            Request::parse("[1, 2]").unwrap_err(),
            Error::ParseFailure(_)
        ));
    }

    #[test]
    fn test_error_envelope_shape() {
        let envelope = make_error(&json!(7), &Error::MethodNotFound("nope".to_string()));
        assert_eq!(envelope["id"], json!(7));
        assert_eq!(envelope["error"]["code"], json!(-32601));
    }
}
