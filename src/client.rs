//! A client for the HTTP bindings of the [SPARQL protocol].
//!
//! An [`EndpointService`] holds the settings shared by all queries to one endpoint,
//! and bounds how many of them run at once.
//! A [`QueryRequest`] is a query prepared from a service,
//! which can be further refined before being dispatched.
//! Both provide one dispatch method per [transformation](crate::transform),
//! which passes the transformed result (or an [`Error`]) to a callback.
//!
//! [SPARQL protocol]: https://www.w3.org/TR/sparql11-protocol/

mod error;
pub use error::*;
mod request;
pub(crate) use request::encode_component;
pub use request::{HeaderValue, IntoGraphs, Method, QueryRequest, FORM_CONTENT_TYPE};
mod service;
pub use service::{EndpointService, Statistics};
mod throttle;
mod transport;
pub use transport::*;

#[cfg(test)]
pub(crate) mod testing;
