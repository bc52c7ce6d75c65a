//! I define [`EndpointService`], the entry point of the client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::error::{Error, Result};
use super::request::{HeaderValue, IntoGraphs, Method, QueryRequest, Settings};
use super::throttle::{Job, Throttle};
use super::transport::{HttpResponse, ReqwestTransport, Transport, TransportError};
use crate::transform::{self, QueryResponse, Transformation, Transformed};

/// Query counters of one service.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Statistics {
    pub queries_sent: u64,
    pub successes: u64,
    pub failures: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    sent: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    pub fn sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> Statistics {
        Statistics {
            queries_sent: self.sent.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// The state shared by a service and all the requests created from it.
pub(crate) struct Core {
    endpoint: String,
    transport: Arc<dyn Transport>,
    throttle: Mutex<Throttle>,
    pub statistics: Counters,
}

impl Core {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Run `job` now if the throttle allows it, otherwise queue it.
    pub fn submit(&self, priority: i32, job: Job) {
        let admitted = self.throttle.lock().admit(priority, job);
        match admitted {
            Some(job) => job(),
            None => log::debug!(
                "{}: query queued ({} pending)",
                self.endpoint,
                self.throttle.lock().pending()
            ),
        }
    }

    /// Classify the outcome of a request, and count it.
    pub fn complete(
        &self,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<HttpResponse> {
        match outcome {
            Ok(resp) if resp.is_success() => {
                self.statistics.successes.fetch_add(1, Ordering::Relaxed);
                Ok(resp)
            }
            Ok(resp) => {
                self.statistics.failures.fetch_add(1, Ordering::Relaxed);
                Err(Error::TransportFailure {
                    reason: format!("endpoint answered with HTTP status {}", resp.status),
                    response: Some(resp),
                })
            }
            Err(err) => {
                self.statistics.failures.fetch_add(1, Ordering::Relaxed);
                Err(Error::TransportFailure {
                    reason: err.0,
                    response: None,
                })
            }
        }
    }

    /// Release the slot of a finished request, and start whatever queued requests now fit.
    pub fn finished(&self) {
        let jobs = {
            let mut throttle = self.throttle.lock();
            throttle.done();
            throttle.next_admitted()
        };
        self.run_all(jobs);
    }

    fn drain(&self) {
        let jobs = self.throttle.lock().next_admitted();
        self.run_all(jobs);
    }

    fn run_all(&self, jobs: Vec<Job>) {
        if !jobs.is_empty() {
            log::debug!("{}: running {} queued queries", self.endpoint, jobs.len());
        }
        for job in jobs {
            job();
        }
    }
}

/// A SPARQL endpoint implementing the HTTP bindings (GET or POST) of the SPARQL protocol.
///
/// The graphs, prefixes, headers, method and output format of a service
/// are inherited by every query created from it afterwards.
/// All queries created from a service share its concurrency limit
/// (see [`EndpointService::set_max_concurrent`]).
///
/// ```no_run
/// use snorql::client::EndpointService;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut sparqler = EndpointService::new("http://dbpedia.org/sparql")?;
/// sparqler.set_prefix("foaf", "http://xmlns.com/foaf/0.1/");
/// sparqler.select_values(
///     "SELECT ?name WHERE { ?p foaf:name ?name } LIMIT 10",
///     |res| match res {
///         Ok(names) => println!("{names:?}"),
///         Err(err) => eprintln!("{err}"),
///     },
/// );
/// # Ok(()) }
/// ```
pub struct EndpointService {
    core: Arc<Core>,
    settings: Settings,
}

impl EndpointService {
    /// Create a service sending its queries with a [`ReqwestTransport`].
    ///
    /// Fails with [`Error::InvalidConfiguration`] if `endpoint` is empty.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_transport(endpoint, ReqwestTransport::new())
    }

    pub fn with_transport(
        endpoint: impl Into<String>,
        transport: impl Transport + 'static,
    ) -> Result<Self> {
        Self::with_shared_transport(endpoint, Arc::new(transport))
    }

    pub fn with_shared_transport(
        endpoint: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(Error::InvalidConfiguration(
                "the endpoint URL must not be empty".into(),
            ));
        }
        Ok(EndpointService {
            core: Arc::new(Core {
                endpoint,
                transport,
                throttle: Mutex::default(),
                statistics: Counters::default(),
            }),
            settings: Settings::default(),
        })
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

    /// 0 means unlimited.
    pub fn max_concurrent(&self) -> usize {
        self.core.throttle.lock().max_concurrent()
    }

    /// Number of queries currently waiting for their response.
    pub fn active_count(&self) -> usize {
        self.core.throttle.lock().active()
    }

    /// Number of queries waiting for a free slot.
    pub fn pending_count(&self) -> usize {
        self.core.throttle.lock().pending()
    }

    pub fn statistics(&self) -> Statistics {
        self.core.statistics.snapshot()
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

    /// Fails with [`Error::UnsupportedMethod`] unless `method` is `GET` or `POST`.
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

    /// Limit the number of queries running at once (0 for unlimited).
    ///
    /// Raising the limit immediately starts queued queries that now fit.
    pub fn set_max_concurrent(&mut self, max: usize) {
        self.core.throttle.lock().set_max_concurrent(max);
        self.core.drain();
    }

    pub fn set_request_header(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        self.settings.headers.insert(name.into(), value.into());
    }

    /// Set a header whose value is computed each time a query is sent.
    pub fn set_dynamic_request_header<F>(&mut self, name: impl Into<String>, value: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.settings
            .headers
            .insert(name.into(), HeaderValue::Dynamic(Arc::new(value)));
    }

    /// A new query, inheriting the current settings of this service.
    pub fn create_query(&self) -> QueryRequest {
        self.create_query_with_priority(0)
    }

    /// A new query, that will jump ahead of queued queries with a lower priority.
    pub fn create_query_with_priority(&self, priority: i32) -> QueryRequest {
        QueryRequest::new(self.core.clone(), self.settings.clone(), priority)
    }

    pub fn dispatch<C>(&self, transformation: Transformation, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<Transformed>) + Send + 'static,
    {
        self.create_query()
            .dispatch(transformation, query_text, callback)
    }

    pub fn run_blocking(
        &self,
        transformation: Transformation,
        query_text: impl Into<String>,
    ) -> Result<Transformed> {
        self.create_query().run_blocking(transformation, query_text)
    }

    pub fn query<C>(&self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<QueryResponse>) + Send + 'static,
    {
        self.create_query()
            .dispatch_with(query_text, transform::query, callback)
    }

    pub fn ask<C>(&self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<bool>) + Send + 'static,
    {
        self.create_query()
            .dispatch_with(query_text, transform::ask, callback)
    }

    pub fn select_values<C>(&self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<Vec<String>>) + Send + 'static,
    {
        self.create_query()
            .dispatch_with(query_text, transform::select_values, callback)
    }

    pub fn select_single_value<C>(&self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<String>) + Send + 'static,
    {
        self.create_query()
            .dispatch_with(query_text, transform::select_single_value, callback)
    }

    pub fn select_value_arrays<C>(&self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<IndexMap<String, Vec<String>>>) + Send + 'static,
    {
        self.create_query()
            .dispatch_with(query_text, transform::select_value_arrays, callback)
    }

    pub fn select_value_hashes<C>(&self, query_text: impl Into<String>, callback: C)
    where
        C: FnOnce(Result<Vec<IndexMap<String, String>>>) + Send + 'static,
    {
        self.create_query()
            .dispatch_with(query_text, transform::select_value_hashes, callback)
    }
}

impl std::fmt::Debug for EndpointService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointService")
            .field("endpoint", &self.endpoint())
            .field("settings", &self.settings)
            .field("max_concurrent", &self.max_concurrent())
            .finish()
    }
}
