//! I define the result transformations,
//! which reshape the response of an endpoint into a value convenient for a given usage pattern.
//!
//! All transformations that return plain values lose the type information of the terms,
//! and the ability to distinguish IRIs, blank nodes and literals.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{RegexSet, RegexSetBuilder};
use serde::Serialize;

use crate::client::{Error, Result};
use crate::results::ResultsDocument;

/// The body of a successful response, before any transformation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    /// Decoded JSON results (`output=json`).
    Results(ResultsDocument),
    /// Raw text, for any other output format (RDF/XML, boolean text...).
    Text(String),
}

impl QueryResponse {
    pub fn results(&self) -> Result<&ResultsDocument> {
        match self {
            QueryResponse::Results(doc) => Ok(doc),
            QueryResponse::Text(_) => Err(Error::malformed(
                "expected JSON results, got a raw text response",
            )),
        }
    }
}

/// Identity transformation.
pub fn query(response: QueryResponse) -> Result<QueryResponse> {
    Ok(response)
}

/// The answer to an ASK query.
pub fn ask(response: QueryResponse) -> Result<bool> {
    match response {
        QueryResponse::Results(doc) => doc
            .boolean
            .ok_or_else(|| Error::malformed("expected an ASK result, found no 'boolean' member")),
        QueryResponse::Text(txt) => match txt.trim() {
            t if t.eq_ignore_ascii_case("true") => Ok(true),
            t if t.eq_ignore_ascii_case("false") => Ok(false),
            t => Err(Error::malformed(format!("not a boolean answer: {t:?}"))),
        },
    }
}

/// The values of the first variable, in row order. Rows leaving it unbound are skipped.
pub fn select_values(response: QueryResponse) -> Result<Vec<String>> {
    let doc = response.results()?;
    let var = first_var(doc)?;
    Ok(doc
        .bindings()?
        .iter()
        .filter_map(|row| row.get(var))
        .map(|term| term.value().to_string())
        .collect())
}

/// The value of the only variable in the only row.
///
/// Fails unless the results project exactly one variable and hold exactly one row binding it.
pub fn select_single_value(response: QueryResponse) -> Result<String> {
    let doc = response.results()?;
    let var = match doc.vars() {
        [var] => var,
        vars => {
            return Err(Error::malformed(format!(
                "expected one variable, got {}",
                vars.len()
            )))
        }
    };
    let row = match doc.bindings()? {
        [row] => row,
        rows => {
            return Err(Error::malformed(format!(
                "expected one row, got {}",
                rows.len()
            )))
        }
    };
    row.get(var)
        .map(|term| term.value().to_string())
        .ok_or_else(|| Error::malformed(format!("variable ?{var} is unbound")))
}

/// The values of each variable, as independent columns.
///
/// Useful for UNION queries, where different rows bind different variables.
pub fn select_value_arrays(response: QueryResponse) -> Result<IndexMap<String, Vec<String>>> {
    let doc = response.results()?;
    let mut columns: IndexMap<String, Vec<String>> = doc
        .vars()
        .iter()
        .map(|v| (v.clone(), Vec::new()))
        .collect();
    for row in doc.bindings()? {
        for (var, term) in row {
            if let Some(column) = columns.get_mut(var) {
                column.push(term.value().to_string());
            }
        }
    }
    Ok(columns)
}

/// One variable → value map per row.
pub fn select_value_hashes(response: QueryResponse) -> Result<Vec<IndexMap<String, String>>> {
    let doc = response.results()?;
    Ok(doc
        .bindings()?
        .iter()
        .map(|row| {
            row.iter()
                .map(|(var, term)| (var.clone(), term.value().to_string()))
                .collect()
        })
        .collect())
}

fn first_var(doc: &ResultsDocument) -> Result<&str> {
    doc.vars()
        .first()
        .map(String::as_str)
        .ok_or_else(|| Error::malformed("results project no variable"))
}

/// The name of a result transformation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Transformation {
    Query,
    Ask,
    SelectValues,
    SelectSingleValue,
    SelectValueArrays,
    SelectValueHashes,
}

pub use Transformation::*;

impl Transformation {
    pub const ALL: [Transformation; 6] = [
        Query,
        Ask,
        SelectValues,
        SelectSingleValue,
        SelectValueArrays,
        SelectValueHashes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Query => "query",
            Ask => "ask",
            SelectValues => "selectValues",
            SelectSingleValue => "selectSingleValue",
            SelectValueArrays => "selectValueArrays",
            SelectValueHashes => "selectValueHashes",
        }
    }

    pub fn apply(self, response: QueryResponse) -> Result<Transformed> {
        Ok(match self {
            Query => Transformed::Response(query(response)?),
            Ask => Transformed::Boolean(ask(response)?),
            SelectValues => Transformed::Values(select_values(response)?),
            SelectSingleValue => Transformed::Value(select_single_value(response)?),
            SelectValueArrays => Transformed::ValueArrays(select_value_arrays(response)?),
            SelectValueHashes => Transformed::ValueHashes(select_value_hashes(response)?),
        })
    }
}

impl std::str::FromStr for Transformation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static RES: LazyLock<RegexSet> = LazyLock::new(|| {
            RegexSetBuilder::new([
                r"^( query | raw )$",
                r"^( ask | boolean )$",
                r"^( select-?values | values )$",
                r"^( select-?single-?value | single-?value | single )$",
                r"^( select-?value-?arrays | value-?arrays | columns )$",
                r"^( select-?value-?hashes | value-?hashes | rows )$",
            ])
            .ignore_whitespace(true)
            .case_insensitive(true)
            .build()
            .unwrap()
        });
        match RES.matches(s).iter().next() {
            Some(i) => Ok(Self::ALL[i]),
            None => Err(anyhow::Error::msg(format!(
                "Unrecognized transformation: {s}"
            ))),
        }
    }
}

impl std::fmt::Display for Transformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.name().fmt(f)
    }
}

/// The output of any [`Transformation`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Transformed {
    Response(QueryResponse),
    Boolean(bool),
    Values(Vec<String>),
    Value(String),
    ValueArrays(IndexMap<String, Vec<String>>),
    ValueHashes(Vec<IndexMap<String, String>>),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::results::decode;
    use test_case::test_case;

    fn json(txt: &str) -> QueryResponse {
        QueryResponse::Results(decode(txt).unwrap())
    }

    fn two_rows() -> QueryResponse {
        json(
            r#"{"head": {"vars": ["x"]}, "results": {"bindings": [
                {"x": {"type": "literal", "value": "a"}},
                {"x": {"type": "literal", "value": "b"}}
            ]}}"#,
        )
    }

    fn union_rows() -> QueryResponse {
        json(
            r#"{"head": {"vars": ["x", "y"]}, "results": {"bindings": [
                {"x": {"type": "uri", "value": "http://example.org/1"}},
                {"y": {"type": "literal", "value": "foo"}},
                {"x": {"type": "bnode", "value": "b1"}, "y": {"type": "literal", "value": "bar"}},
                {"z": {"type": "literal", "value": "not projected"}}
            ]}}"#,
        )
    }

    fn empty() -> QueryResponse {
        json(r#"{"head": {"vars": ["x"]}, "results": {"bindings": []}}"#)
    }

    #[test]
    fn query_is_identity() {
        assert_eq!(query(two_rows()).unwrap(), two_rows());
    }

    #[test]
    fn ask_json() {
        assert!(ask(json(r#"{"boolean": true}"#)).unwrap());
        assert!(!ask(json(r#"{"head": {}, "boolean": false}"#)).unwrap());
    }

    #[test_case("true" => true)]
    #[test_case("false\n" => false; "trailing newline")]
    #[test_case("TRUE" => true; "true cap")]
    fn ask_text(txt: &str) -> bool {
        ask(QueryResponse::Text(txt.into())).unwrap()
    }

    #[test]
    fn ask_on_select_is_malformed() {
        assert!(matches!(ask(two_rows()), Err(Error::MalformedResult(_))));
    }

    #[test]
    fn values() {
        assert_eq!(select_values(two_rows()).unwrap(), ["a", "b"]);
        assert_eq!(
            select_values(union_rows()).unwrap(),
            ["http://example.org/1", "b1"]
        );
        assert!(select_values(empty()).unwrap().is_empty());
    }

    #[test]
    fn values_without_vars_is_malformed() {
        let resp = json(r#"{"head": {"vars": []}, "results": {"bindings": []}}"#);
        assert!(matches!(
            select_values(resp),
            Err(Error::MalformedResult(_))
        ));
    }

    #[test]
    fn single_value() {
        let resp = json(
            r#"{"head": {"vars": ["x"]}, "results": {"bindings": [
                {"x": {"type": "literal", "value": "a"}}
            ]}}"#,
        );
        assert_eq!(select_single_value(resp).unwrap(), "a");
    }

    #[test_case(r#"{"head": {"vars": ["x"]}, "results": {"bindings": []}}"#; "no row")]
    #[test_case(r#"{"head": {"vars": ["x"]}, "results": {"bindings": [
        {"x": {"type": "literal", "value": "a"}},
        {"x": {"type": "literal", "value": "b"}}
    ]}}"#; "two rows")]
    #[test_case(r#"{"head": {"vars": ["x", "y"]}, "results": {"bindings": [
        {"x": {"type": "literal", "value": "a"}, "y": {"type": "literal", "value": "z"}}
    ]}}"#; "two variables")]
    #[test_case(r#"{"head": {"vars": ["x", "y"]}, "results": {"bindings": [
        {"x": {"type": "literal", "value": "a"}, "y": {"type": "literal", "value": "z"}},
        {"x": {"type": "literal", "value": "b"}}
    ]}}"#; "two rows two variables")]
    #[test_case(r#"{"head": {"vars": ["x"]}, "results": {"bindings": [{}]}}"#; "unbound")]
    #[test_case(r#"{"head": {"vars": []}, "results": {"bindings": [{}]}}"#; "no variable")]
    fn single_value_is_malformed(txt: &str) {
        assert!(matches!(
            select_single_value(json(txt)),
            Err(Error::MalformedResult(_))
        ));
    }

    #[test]
    fn value_arrays() {
        let columns = select_value_arrays(union_rows()).unwrap();
        assert_eq!(columns.keys().collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(columns["x"], ["http://example.org/1", "b1"]);
        assert_eq!(columns["y"], ["foo", "bar"]);
    }

    #[test]
    fn value_hashes() {
        let rows = select_value_hashes(union_rows()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["x"], "http://example.org/1");
        assert!(!rows[0].contains_key("y"));
        assert_eq!(rows[2]["y"], "bar");
        assert_eq!(rows[3]["z"], "not projected");
    }

    #[test]
    fn text_response_is_malformed_for_select() {
        let resp = QueryResponse::Text("<rdf:RDF/>".into());
        assert!(matches!(
            select_value_hashes(resp),
            Err(Error::MalformedResult(_))
        ));
    }

    #[test_case("query" => Query)]
    #[test_case("ask" => Ask)]
    #[test_case("selectValues" => SelectValues)]
    #[test_case("select-values" => SelectValues)]
    #[test_case("values" => SelectValues; "values short")]
    #[test_case("selectSingleValue" => SelectSingleValue)]
    #[test_case("single" => SelectSingleValue)]
    #[test_case("selectValueArrays" => SelectValueArrays)]
    #[test_case("columns" => SelectValueArrays)]
    #[test_case("selectValueHashes" => SelectValueHashes)]
    #[test_case("rows" => SelectValueHashes)]
    fn parse_transformation(txt: &str) -> Transformation {
        txt.parse().unwrap()
    }

    #[test]
    fn display_round_trip() {
        for t in Transformation::ALL {
            assert_eq!(t, t.to_string().parse::<Transformation>().unwrap());
        }
    }

    #[test]
    fn apply_dispatches_by_name() {
        assert_eq!(
            SelectValues.apply(two_rows()).unwrap(),
            Transformed::Values(vec!["a".into(), "b".into()])
        );
    }
}
