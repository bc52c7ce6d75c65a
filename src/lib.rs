//! A client for SPARQL endpoints.
//!
//! * [`client`] builds SPARQL protocol requests, sends them with a bounded concurrency,
//!   and hands their outcome to callbacks;
//! * [`results`] models the JSON results format;
//! * [`transform`] reshapes results for common usage patterns
//!   (a boolean, a column of values, a single value...);
//! * [`render`] and [`page`] are the building blocks of a query page:
//!   result tables, canned queries, error reporting.

pub mod client;
pub mod page;
pub mod render;
pub mod results;
pub mod transform;
