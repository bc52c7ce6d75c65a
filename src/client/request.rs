//! I define [`QueryRequest`], a query prepared against an [`EndpointService`](super::EndpointService).

use std::sync::Arc;

use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::error::{Error, Result};
use super::service::Core;
use super::transport::HttpRequest;
use crate::transform::{self, QueryResponse, Transformation, Transformed};

/// Characters left as is in protocol parameters: RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub(crate) fn encode_component(txt: &str) -> String {
    utf8_percent_encode(txt, COMPONENT).to_string()
}

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The HTTP binding of the SPARQL protocol used to send queries.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Method {
    Get,
    #[default]
    Post,
}

impl std::str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
        .fmt(f)
    }
}

/// The value of a custom request header.
#[derive(Clone)]
pub enum HeaderValue {
    Static(String),
    /// Evaluated each time a request is sent (e.g. to refresh an access token).
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl HeaderValue {
    pub fn resolve(&self) -> String {
        match self {
            HeaderValue::Static(value) => value.clone(),
            HeaderValue::Dynamic(f) => f(),
        }
    }
}

impl std::fmt::Debug for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderValue::Static(value) => value.fmt(f),
            HeaderValue::Dynamic(_) => f.write_str("<dynamic>"),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Static(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Static(value)
    }
}

/// One graph URI or a sequence of them, flattened when added.
pub trait IntoGraphs {
    fn into_graphs(self) -> Vec<String>;
}

impl IntoGraphs for &str {
    fn into_graphs(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoGraphs for String {
    fn into_graphs(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoGraphs for &String {
    fn into_graphs(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<S: AsRef<str>> IntoGraphs for &[S] {
    fn into_graphs(self) -> Vec<String> {
        self.iter().map(|g| g.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> IntoGraphs for [S; N] {
    fn into_graphs(self) -> Vec<String> {
        self.iter().map(|g| g.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> IntoGraphs for Vec<S> {
    fn into_graphs(self) -> Vec<String> {
        self.iter().map(|g| g.as_ref().to_string()).collect()
    }
}

/// Dataset, prefixes and protocol options, shared by services and requests.
#[derive(Clone, Debug)]
pub(crate) struct Settings {
    pub default_graphs: Vec<String>,
    pub named_graphs: Vec<String>,
    pub prefixes: IndexMap<String, String>,
    pub method: Method,
    pub output: String,
    pub headers: IndexMap<String, HeaderValue>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_graphs: vec![],
            named_graphs: vec![],
            prefixes: IndexMap::new(),
            method: Method::default(),
            output: "json".to_string(),
            headers: IndexMap::new(),
        }
    }
}

/// A query against a given endpoint.
///
/// A request copies the graphs, prefixes, headers, method and output format of its service
/// when it is created; it can then be refined without affecting the service,
/// and later changes to the service do not affect it.
///
/// Each dispatch method (e.g. [`QueryRequest::select_values`]) records the query text
/// and sends an independent HTTP request, possibly after waiting for the service to have capacity.
#[derive(Clone)]
pub struct QueryRequest {
    core: Arc<Core>,
    settings: Settings,
    priority: i32,
    query_text: String,
}

impl QueryRequest {
    pub(crate) fn new(core: Arc<Core>, settings: Settings, priority: i32) -> Self {
        QueryRequest {
            core,
            settings,
            priority,
            query_text: String::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.core.endpoint()
    }

    pub fn default_graphs(&self) -> &[String] {
        &self.settings.default_graphs
    }

    pub fn named_graphs(&self) -> &[String] {
        &self.settings.named_graphs
    }

    pub fn prefixes(&self) -> &IndexMap<String, String> {
        &self.settings.prefixes
    }

    pub fn method(&self) -> Method {
        self.settings.method
    }

    pub fn output(&self) -> &str {
        &self.settings.output
    }

    pub fn request_headers(&self) -> &IndexMap<String, HeaderValue> {
        &self.settings.headers
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The query text, without generated PREFIX declarations.
    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn add_default_graph(&mut self, graphs: impl IntoGraphs) {
        self.settings.default_graphs.extend(graphs.into_graphs());
    }

    pub fn add_named_graph(&mut self, graphs: impl IntoGraphs) {
        self.settings.named_graphs.extend(graphs.into_graphs());
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.settings.prefixes.insert(prefix.into(), namespace.into());
    }

    pub fn set_method(&mut self, method: &str) -> Result<()> {
        self.settings.method = method.parse()?;
        Ok(())
    }

    pub fn set_http_method(&mut self, method: Method) {
        self.settings.method = method;
    }

    pub fn set_output(&mut self, output: impl Into<String>) {
        self.settings.output = output.into();
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn set_request_header(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        self.settings.headers.insert(name.into(), value.into());
    }

    pub fn set_dynamic_request_header<F>(&mut self, name: impl Into<String>, value: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.settings
            .headers
            .insert(name.into(), HeaderValue::Dynamic(Arc::new(value)));
    }

    /// Set the query text without sending it (e.g. to inspect [`QueryRequest::query_url`]).
    pub fn set_query_text(&mut self, query_text: impl Into<String>) {
        self.query_text = query_text.into();
    }

    /// The query as sent to the endpoint,
    /// optionally preceded by a `PREFIX` declaration for each prefix of this request.
    pub fn query_string(&self, include_prefixes: bool) -> String {
        let mut ret = String::new();
        if include_prefixes {
            for (prefix, namespace) in &self.settings.prefixes {
                ret.push_str(&format!("PREFIX {prefix}: <{namespace}> "));
            }
        }
        ret.push_str(&self.query_text);
        ret
    }

    /// The protocol parameters, in the order expected by SPARQL endpoints:
    /// default graphs, named graphs, output format, then the query itself.
    pub fn query_parameters(&self) -> String {
        let mut ret = String::new();
        for g in &self.settings.default_graphs {
            ret.push_str(&format!("default-graph-uri={}&", encode_component(g)));
        }
        for g in &self.settings.named_graphs {
            ret.push_str(&format!("named-graph-uri={}&", encode_component(g)));
        }
        ret.push_str(&format!(
            "output={}&",
            encode_component(&self.settings.output)
        ));
        ret.push_str("query=");
        ret.push_str(&encode_component(&self.query_string(true)));
        ret
    }

    /// The GET URL of this query, whatever the configured method.
    pub fn query_url(&self) -> String {
        format!("{}?{}", self.endpoint(), self.query_parameters())
    }

    /// The HTTP request for this query; dynamic headers are evaluated now.
    pub fn http_request(&self) -> HttpRequest {
        let post = self.settings.method == Method::Post;
        let mut headers: Vec<(String, String)> = self
            .settings
            .headers
            .iter()
            .filter(|(name, _)| !(post && name.eq_ignore_ascii_case("content-type")))
            .map(|(name, value)| (name.clone(), value.resolve()))
            .collect();
        match self.settings.method {
            Method::Get => HttpRequest {
                method: Method::Get,
                url: self.query_url(),
                headers,
                body: None,
            },
            Method::Post => {
                headers.push(("Content-Type".into(), FORM_CONTENT_TYPE.into()));
                HttpRequest {
                    method: Method::Post,
                    url: self.endpoint().to_string(),
                    headers,
                    body: Some(self.query_parameters()),
                }
            }
        }
    }

    /// Send `query_text`, reshape the response with `transformer`,
    /// and pass the outcome to `callback`.
    ///
    /// The request is queued if the service is already running as many queries as it allows.
    pub fn dispatch_with<T, F, C>(&mut self, query_text: impl Into<String>, transformer: F, callback: C)
    where
        T: 'static,
        F: FnOnce(QueryResponse) -> Result<T> + Send + 'static,
        C: FnOnce(Result<T>) + Send + 'static,
    {
        self.query_text = query_text.into();
        let snapshot = self.clone();
        log::trace!(
            "dispatching query to {} (priority {})",
            self.endpoint(),
            self.priority
        );
        self.core.submit(
            self.priority,
            Box::new(move || snapshot.run(transformer, callback)),
        );
    }

    fn run<T, F, C>(self, transformer: F, callback: C)
    where
        T: 'static,
        F: FnOnce(QueryResponse) -> Result<T> + Send + 'static,
        C: FnOnce(Result<T>) + Send + 'static,
    {
        let request = self.http_request();
        let json = self.settings.output == "json";
        let core = self.core.clone();
        core.statistics.sent();
        log::debug!("{} {}", request.method, self.endpoint());
        self.core.transport().send(
            request,
            Box::new(move |outcome| {
                let outcome = core.complete(outcome);
                core.finished();
                callback(outcome.and_then(|resp| {
                    let response = if json {
                        QueryResponse::Results(crate::results::decode(&resp.body)?)
                    } else {
                        QueryResponse::Text(resp.body)
                    };
                    transformer(response)
                }));
            }),
        );
    }

    /// Dispatch with the named transformation.
    pub fn dispatch<C>(&mut self, transformation: Transformation, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<Transformed>) + Send + 'static,
    {
        self.dispatch_with(query_text, move |resp| transformation.apply(resp), callback)
    }

    /// Dispatch with the named transformation, and wait for the outcome.
    pub fn run_blocking(
        &mut self,
        transformation: Transformation,
        query_text: impl Into<String>,
    ) -> Result<Transformed> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.dispatch(transformation, query_text, move |res| {
            // the receiver only goes away if the caller stopped waiting
            let _ = tx.send(res);
        });
        rx.recv().unwrap_or_else(|_| {
            Err(Error::TransportFailure {
                reason: "query dropped before completion".into(),
                response: None,
            })
        })
    }

    pub fn query<C>(&mut self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<QueryResponse>) + Send + 'static,
    {
        self.dispatch_with(query_text, transform::query, callback)
    }

    pub fn ask<C>(&mut self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<bool>) + Send + 'static,
    {
        self.dispatch_with(query_text, transform::ask, callback)
    }

    pub fn select_values<C>(&mut self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<Vec<String>>) + Send + 'static,
    {
        self.dispatch_with(query_text, transform::select_values, callback)
    }

    pub fn select_single_value<C>(&mut self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<String>) + Send + 'static,
    {
        self.dispatch_with(query_text, transform::select_single_value, callback)
    }

    pub fn select_value_arrays<C>(&mut self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<IndexMap<String, Vec<String>>>) + Send + 'static,
    {
        self.dispatch_with(query_text, transform::select_value_arrays, callback)
    }

    pub fn select_value_hashes<C>(&mut self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<Vec<IndexMap<String, String>>>) + Send + 'static,
    {
        self.dispatch_with(query_text, transform::select_value_hashes, callback)
    }
}

impl std::fmt::Debug for QueryRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRequest")
            .field("endpoint", &self.endpoint())
            .field("settings", &self.settings)
            .field("priority", &self.priority)
            .field("query_text", &self.query_text)
            .finish()
    }
}
