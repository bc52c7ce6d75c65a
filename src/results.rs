//! I define the SPARQL 1.1 Query Results JSON format,
//! as returned by endpoints for `output=json`.
//!
//! See <https://www.w3.org/TR/sparql11-results-json/>.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::client::{Error, Result};

/// A parsed `application/sparql-results+json` document.
///
/// SELECT results carry `results`, ASK results carry `boolean`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ResultsDocument {
    #[serde(default)]
    pub head: Head,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Results>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Results {
    pub bindings: Vec<Binding>,
}

/// One result row: variable name → term. Unbound variables are absent.
pub type Binding = IndexMap<String, RdfTerm>;

/// An RDF term, as serialized in SPARQL JSON results.
///
/// `typed-literal` is the SPARQL 1.0 (pre-recommendation) spelling still produced by some endpoints;
/// SPARQL 1.1 endpoints use `literal` with a `datatype`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RdfTerm {
    Uri {
        value: String,
    },
    Bnode {
        value: String,
    },
    Literal {
        value: String,
        #[serde(
            rename = "xml:lang",
            alias = "lang",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        lang: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
    },
    TypedLiteral {
        value: String,
        datatype: String,
    },
}

impl RdfTerm {
    /// The lexical value of this term, with all type information dropped.
    pub fn value(&self) -> &str {
        match self {
            RdfTerm::Uri { value }
            | RdfTerm::Bnode { value }
            | RdfTerm::Literal { value, .. }
            | RdfTerm::TypedLiteral { value, .. } => value,
        }
    }

    pub fn datatype(&self) -> Option<&str> {
        match self {
            RdfTerm::Literal { datatype, .. } => datatype.as_deref(),
            RdfTerm::TypedLiteral { datatype, .. } => Some(datatype),
            _ => None,
        }
    }

    pub fn lang(&self) -> Option<&str> {
        match self {
            RdfTerm::Literal { lang, .. } => lang.as_deref(),
            _ => None,
        }
    }
}

impl ResultsDocument {
    pub fn vars(&self) -> &[String] {
        &self.head.vars
    }

    /// The result rows, or [`Error::MalformedResult`] if this is not a SELECT result.
    pub fn bindings(&self) -> Result<&[Binding]> {
        self.results
            .as_ref()
            .map(|r| &r.bindings[..])
            .ok_or_else(|| Error::malformed("expected SELECT results, found no 'results' member"))
    }
}

/// Decode a response body into a [`ResultsDocument`].
///
/// The body is only ever handed to a JSON parser, and must match the results schema.
pub fn decode(text: &str) -> Result<ResultsDocument> {
    if text.trim().is_empty() {
        return Err(Error::malformed("empty response body"));
    }
    let doc: ResultsDocument = serde_json::from_str(text)?;
    if doc.results.is_none() && doc.boolean.is_none() {
        return Err(Error::malformed(
            "results document has neither 'results' nor 'boolean'",
        ));
    }
    Ok(doc)
}
