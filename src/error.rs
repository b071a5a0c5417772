use thiserror::Error;

macro_rules! invalid_param_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvalidParameter($msg.to_string())
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidParameter(format!($fmt, $($arg)*))
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure raised while executing a query is converted into one of these variants at the
/// dispatch boundary, where it becomes an error response. Errors never cross the serialized
/// execution context as panics.
///
/// # Error Categories
///
/// ## Request Errors
/// - [`Error::ParseFailure`] - The request body was not well-formed JSON
/// - [`Error::InvalidRequest`] - The request envelope was missing its method name
/// - [`Error::MethodNotFound`] - No handler is registered under the requested name
///
/// ## Query Errors
/// - [`Error::InvalidParameter`] - A parameter was missing, malformed, or semantically invalid
///   (an unparseable module identity, an unresolvable token, an unknown enumerated option,
///   an invalid search pattern)
/// - [`Error::Internal`] - Any unexpected failure while executing an otherwise valid request
///
/// Note that a truncated result set is *not* an error: operations cap their output at
/// `maxResults` and report a `tooManyResults` flag instead. Traversals that find nothing
/// return a well-formed empty result.
#[derive(Error, Debug)]
pub enum Error {
    /// The request body could not be parsed.
    ///
    /// Raised by the envelope layer when the incoming bytes are not a JSON object.
    /// Transport framing failures never reach the engine itself.
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// The request envelope is structurally invalid.
    ///
    /// A request must carry a non-empty `method` name. Requests without one cannot
    /// be dispatched and are rejected before any handler runs.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No operation is registered under the requested method name.
    ///
    /// The associated value is the name that failed to resolve against the
    /// handler registry.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// A request parameter is missing, has the wrong type, or is semantically invalid.
    ///
    /// The message names the offending field so callers can correct the request.
    /// Pattern compilation failures surface here with the compiler's diagnostic text.
    #[error("{0}")]
    InvalidParameter(String),

    /// An unexpected failure occurred while executing an otherwise valid request.
    ///
    /// This covers failures from collaborators (e.g. the decompiler) as well as
    /// conditions the engine does not model explicitly.
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Returns the wire-level error code for this failure.
    ///
    /// The codes follow the small fixed taxonomy used by the request/response
    /// envelope: parse failure, invalid request, method not found, invalid
    /// parameter(s), internal error.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Error::ParseFailure(_) => -32700,
            Error::InvalidRequest(_) => -32600,
            Error::MethodNotFound(_) => -32601,
            Error::InvalidParameter(_) => -32602,
            Error::Internal(_) => -32603,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ParseFailure(err.to_string())
    }
}
