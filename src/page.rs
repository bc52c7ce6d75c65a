//! I define the canned queries of the query page,
//! and the helpers it uses to choose how a query is sent and how failures are reported.

use std::sync::LazyLock;

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::client::HttpResponse;

/// Query shown when the page is opened without parameters.
pub const DEFAULT_QUERY: &str = "SELECT DISTINCT * WHERE {\n  ?s ?p ?o\n}\nLIMIT 10";

/// A query selected from the parameters of the page URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CannedQuery {
    Classes,
    Properties,
    NamedGraphs,
    /// All uses of a property.
    Property(String),
    /// All instances of a class.
    Class(String),
    /// All triples in which a resource is subject or object.
    Describe(String),
    /// A query typed by the user.
    Raw(String),
}

/// A [`CannedQuery`] together with the optional named graph to query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    pub query: CannedQuery,
    pub graph: Option<String>,
}

impl PageQuery {
    /// Read the page parameters (the part of the URL after `?`, with or without the `?`).
    ///
    /// When several selectors are present, the last one in this list wins:
    /// `browse`, `property`, `class`, `describe`, `query`.
    /// Returns `None` if none is present.
    pub fn from_page_query(qs: &str) -> Option<Self> {
        let qs = qs.strip_prefix('?').unwrap_or(qs);
        let param = |key: &str| -> Option<String> {
            qs.split('&').find_map(|kv| {
                let (k, v) = kv.split_once('=')?;
                (k == key).then(|| unescape(v))
            })
        };
        let mut query = match param("browse").as_deref() {
            Some("classes") => Some(CannedQuery::Classes),
            Some("properties") => Some(CannedQuery::Properties),
            Some("graphs") => Some(CannedQuery::NamedGraphs),
            _ => None,
        };
        if let Some(p) = param("property") {
            query = Some(CannedQuery::Property(p));
        }
        if let Some(c) = param("class") {
            query = Some(CannedQuery::Class(c));
        }
        if let Some(d) = param("describe") {
            query = Some(CannedQuery::Describe(d));
        }
        if let Some(q) = param("query") {
            query = Some(CannedQuery::Raw(q));
        }
        Some(PageQuery {
            query: query?,
            graph: param("graph").filter(|g| !g.is_empty()),
        })
    }
}

/// Decode a URL parameter, treating `+` as a space.
fn unescape(txt: &str) -> String {
    percent_decode_str(&txt.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

impl CannedQuery {
    pub fn title(&self) -> String {
        match self {
            CannedQuery::Classes => "List of all classes:".into(),
            CannedQuery::Properties => "List of all properties:".into(),
            CannedQuery::NamedGraphs => "List of all named graphs:".into(),
            CannedQuery::Property(p) => format!("All uses of property {p}:"),
            CannedQuery::Class(c) => format!("All instances of class {c}:"),
            CannedQuery::Describe(r) => format!("Description of {r}:"),
            CannedQuery::Raw(_) => "SPARQL results:".into(),
        }
    }

    /// The query text, as displayed to the user.
    pub fn text(&self) -> String {
        match self {
            CannedQuery::Classes => "SELECT DISTINCT ?class\nWHERE { [] a ?class }\nORDER BY ?class".into(),
            CannedQuery::Properties => {
                "SELECT DISTINCT ?property\nWHERE { [] ?property [] }\nORDER BY ?property".into()
            }
            CannedQuery::NamedGraphs => "SELECT DISTINCT ?namedgraph ?label\n\
                WHERE {\n  GRAPH ?namedgraph { ?s ?p ?o }\n  OPTIONAL { ?namedgraph rdfs:label ?label }\n}\n\
                ORDER BY ?namedgraph"
                .into(),
            CannedQuery::Property(p) => format!(
                "SELECT DISTINCT ?resource ?value\nWHERE {{ ?resource <{p}> ?value }}\nORDER BY ?resource ?value"
            ),
            CannedQuery::Class(c) => format!(
                "SELECT DISTINCT ?instance\nWHERE {{ ?instance a <{c}> }}\nORDER BY ?instance"
            ),
            CannedQuery::Describe(r) => format!(
                "SELECT DISTINCT ?property ?hasValue ?isValueOf\n\
                 WHERE {{\n  {{ <{r}> ?property ?hasValue }}\n  UNION\n  {{ ?isValueOf ?property <{r}> }}\n}}\n\
                 ORDER BY (!BOUND(?hasValue)) ?property ?hasValue ?isValueOf"
            ),
            CannedQuery::Raw(q) => q.clone(),
        }
    }

    /// The query text, as sent to the endpoint.
    ///
    /// The named graph listing carries the one prefix it uses;
    /// other prefixes are expected to be declared by the request.
    pub fn query(&self) -> String {
        match self {
            CannedQuery::NamedGraphs => format!(
                "PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n{}",
                self.text()
            ),
            _ => self.text(),
        }
    }
}

/// One `PREFIX` line per namespace.
pub fn prefix_declarations(namespaces: &IndexMap<String, String>) -> String {
    namespaces
        .iter()
        .map(|(prefix, ns)| format!("PREFIX {prefix}: <{ns}>\n"))
        .collect()
}

/// The form of a SPARQL query, as far as choosing the result format goes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum QueryForm {
    Select,
    Ask,
    Construct,
    Describe,
}

impl QueryForm {
    /// Detect the form of `query` from its first keyword after any PREFIX declarations.
    ///
    /// Anything unrecognized is treated as SELECT.
    pub fn detect(query: &str) -> Self {
        static FORM: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?i)^\s*(?:(?:PREFIX\s+[\w.-]*:\s*<[^>]*>|BASE\s*<[^>]*>|#[^\n]*)\s*)*(\w+)")
                .unwrap()
        });
        let keyword = FORM
            .captures(query)
            .map(|c| c[1].to_ascii_uppercase())
            .unwrap_or_default();
        match keyword.as_str() {
            "ASK" => QueryForm::Ask,
            "CONSTRUCT" => QueryForm::Construct,
            "DESCRIBE" => QueryForm::Describe,
            _ => QueryForm::Select,
        }
    }

    /// The `output` parameter to request for this form.
    pub fn output(self) -> &'static str {
        match self {
            QueryForm::Ask => "boolean",
            QueryForm::Construct | QueryForm::Describe => "rdf",
            QueryForm::Select => "json",
        }
    }

    /// The `Accept` header to send for this form, if any.
    pub fn accept(self) -> Option<&'static str> {
        match self {
            QueryForm::Select => Some("application/sparql-results+json,*/*"),
            _ => None,
        }
    }
}

/// A human-readable message for a failed query,
/// extracted from the error page of the endpoint when possible.
pub fn failure_message(response: &HttpResponse) -> String {
    static PRE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<pre>([\s\S]*)</pre>").unwrap());
    if let Some(c) = PRE.captures(&response.body) {
        let message = c[1].trim();
        if message == "Unknown error" {
            "Unknown error (timeout?)".into()
        } else {
            message.to_string()
        }
    } else if response.body.starts_with('{') {
        "Could not parse server response (incomplete result due to timeout?)".into()
    } else if response.body.trim().is_empty() {
        format!("HTTP status {}", response.status)
    } else {
        response.body.clone()
    }
}
