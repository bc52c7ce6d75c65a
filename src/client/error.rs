use super::transport::HttpResponse;

/// Everything that can go wrong when configuring or running a query.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Only GET and POST bindings of the SPARQL protocol are supported.
    #[error("HTTP methods other than GET and POST are not supported: {0:?}")]
    UnsupportedMethod(String),

    /// The request could not be sent, or the endpoint did not answer with a success status.
    ///
    /// `response` holds the untouched response when the endpoint answered at all,
    /// so that callers can inspect its status and body.
    #[error("transport failure: {reason}")]
    TransportFailure {
        reason: String,
        response: Option<HttpResponse>,
    },

    /// The response body could not be decoded,
    /// or does not have the shape expected by the requested transformation.
    #[error("malformed result: {0}")]
    MalformedResult(String),

    /// The service was configured with unusable values (e.g. an empty endpoint URL).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedResult(reason.into())
    }

    /// The raw response attached to a [`Error::TransportFailure`], if any.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Error::TransportFailure { response, .. } => response.as_ref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedResult(format!("invalid JSON results: {err}"))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
