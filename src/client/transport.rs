//! I define the [`Transport`] trait,
//! through which queries reach the network, and its default [`reqwest`] implementation.

use std::time::Duration;

use super::request::Method;

/// A fully built HTTP request, ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The raw response of an endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A failure to obtain any response at all.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Called exactly once when a request completes.
pub type Completion = Box<dyn FnOnce(Result<HttpResponse, TransportError>) + Send>;

/// An asynchronous HTTP sender.
///
/// `send` must return without waiting for the response,
/// and later invoke `done` exactly once (possibly from another thread).
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest, done: Completion);
}

/// Sends each request from its own thread, with a blocking [`reqwest`] client.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transport whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError(err.to_string()))?;
        Ok(Self { client })
    }

    fn execute(
        client: &reqwest::blocking::Client,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => client.get(&request.url),
            Method::Post => client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let resp = builder
            .send()
            .map_err(|err| TransportError(err.to_string()))?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|val| val.to_str().ok())
            .map(str::to_string);
        let body = resp.text().map_err(|err| TransportError(err.to_string()))?;
        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest, done: Completion) {
        let client = self.client.clone();
        std::thread::spawn(move || {
            log::trace!("{} {}", request.method, request.url);
            done(Self::execute(&client, request))
        });
    }
}
