//! I render SPARQL results for humans:
//! [`HtmlTable`] for browsing (with links to further queries), and [`Tsv`] for the terminal.

use std::fmt::{self, Display, Write};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::client::encode_component;
use crate::results::{Binding, RdfTerm, ResultsDocument};

pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

const NUMERIC_XSD_TYPES: [&str; 16] = [
    "long",
    "decimal",
    "float",
    "double",
    "int",
    "short",
    "byte",
    "integer",
    "nonPositiveInteger",
    "negativeInteger",
    "nonNegativeInteger",
    "positiveInteger",
    "unsignedLong",
    "unsignedInt",
    "unsignedShort",
    "unsignedByte",
];

/// Variable whose values are named graphs; rows get a "Switch" link to that graph.
const NAMED_GRAPH_VAR: &str = "namedgraph";

pub fn is_numeric_xsd_type(datatype: &str) -> bool {
    datatype
        .strip_prefix(XSD)
        .is_some_and(|local| NUMERIC_XSD_TYPES.contains(&local))
}

/// Abbreviate `iri` with the first matching namespace.
pub fn to_qname(iri: &str, namespaces: &IndexMap<String, String>) -> Option<String> {
    namespaces
        .iter()
        .find(|(_, ns)| iri.starts_with(ns.as_str()))
        .map(|(prefix, ns)| format!("{prefix}:{}", &iri[ns.len()..]))
}

fn to_qname_or_iri(iri: &str, namespaces: &IndexMap<String, String>) -> String {
    to_qname(iri, namespaces).unwrap_or_else(|| format!("<{iri}>"))
}

/// The query-page link for an IRI bound to `var`.
///
/// `?property` values link to the uses of that property,
/// `?class` values link to the instances of that class,
/// and anything else links to the description of the resource.
pub fn link_for(var: &str, iri: &str) -> String {
    let key = match var {
        "property" => "property",
        "class" => "class",
        _ => "describe",
    };
    format!("?{key}={}", encode_component(iri))
}

struct Escaped<'a>(&'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&#39;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

/// An HTML table displaying SELECT results.
///
/// Links produced for IRIs are relative to `base` (empty by default),
/// see [`link_for`].
pub struct HtmlTable<'a> {
    doc: &'a ResultsDocument,
    namespaces: &'a IndexMap<String, String>,
    base: &'a str,
}

impl<'a> HtmlTable<'a> {
    pub fn new(doc: &'a ResultsDocument, namespaces: &'a IndexMap<String, String>) -> Self {
        HtmlTable {
            doc,
            namespaces,
            base: "",
        }
    }

    pub fn with_base(mut self, base: &'a str) -> Self {
        self.base = base;
        self
    }

    fn has_named_graph(&self) -> bool {
        self.doc.vars().iter().any(|v| v == NAMED_GRAPH_VAR)
    }

    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<tr>")?;
        if self.has_named_graph() {
            f.write_str("<th> </th>")?;
        }
        for var in self.doc.vars() {
            write!(f, "<th>{}</th>", Escaped(var))?;
        }
        f.write_str("</tr>\n")
    }

    fn write_row(&self, f: &mut fmt::Formatter<'_>, row: &Binding, index: usize) -> fmt::Result {
        let class = if index % 2 == 1 { "odd" } else { "even" };
        write!(f, "<tr class=\"{class}\">")?;
        if self.has_named_graph() {
            f.write_str("<td>")?;
            if let Some(graph) = row.get(NAMED_GRAPH_VAR) {
                write!(
                    f,
                    "<a href=\"{}?graph={}\">Switch</a>",
                    Escaped(self.base),
                    encode_component(graph.value())
                )?;
            }
            f.write_str("</td>")?;
        }
        for var in self.doc.vars() {
            f.write_str("<td>")?;
            self.write_term(f, row.get(var), var)?;
            f.write_str("</td>")?;
        }
        f.write_str("</tr>\n")
    }

    fn write_term(&self, f: &mut fmt::Formatter<'_>, term: Option<&RdfTerm>, var: &str) -> fmt::Result {
        static EXTERNAL: LazyLock<Regex> =
            LazyLock::new(|| Regex::new("^(https?|ftp|mailto|irc|gopher|news):").unwrap());
        match term {
            None => f.write_str("<span class=\"unbound\" title=\"Unbound\">-</span>"),
            Some(RdfTerm::Uri { value }) => {
                let href = format!("{}{}", self.base, link_for(var, value));
                f.write_str("<span class=\"uri\">")?;
                let link = format!(
                    "<a href=\"{}\" title=\"&lt;{}&gt;\" class=\"graph-link\">",
                    Escaped(&href),
                    Escaped(value)
                );
                match to_qname(value, self.namespaces) {
                    Some(qname) => write!(f, "{link}{}</a>", Escaped(&qname))?,
                    None => write!(f, "&lt;{link}{}</a>&gt;", Escaped(value))?,
                }
                if let Some(scheme) = EXTERNAL.captures(value).map(|c| c[1].to_string()) {
                    write!(
                        f,
                        " <a href=\"{}\"><img src=\"link.png\" alt=\"[{scheme}]\" title=\"Go to Web page\"/></a>",
                        Escaped(value)
                    )?;
                }
                f.write_str("</span>")
            }
            Some(RdfTerm::Bnode { value }) => write!(f, "_:{}", Escaped(value)),
            Some(RdfTerm::Literal {
                value,
                lang,
                datatype: None,
            }) => {
                let mut text = format!("\"{value}\"");
                if let Some(lang) = lang {
                    text.push('@');
                    text.push_str(lang);
                }
                write!(f, "{}", Escaped(&text))
            }
            Some(
                RdfTerm::Literal {
                    value,
                    datatype: Some(datatype),
                    ..
                }
                | RdfTerm::TypedLiteral { value, datatype },
            ) => {
                let text = format!(
                    "\"{value}\"^^{}",
                    to_qname_or_iri(datatype, self.namespaces)
                );
                if is_numeric_xsd_type(datatype) {
                    write!(
                        f,
                        "<span title=\"{}\">{}</span>",
                        Escaped(&text),
                        Escaped(value)
                    )
                } else {
                    write!(f, "{}", Escaped(&text))
                }
            }
        }
    }
}

impl Display for HtmlTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.doc.results.as_ref().map(|r| &r.bindings[..]).unwrap_or(&[]);
        if rows.is_empty() {
            return f.write_str("<p class=\"empty\">[no results]</p>\n");
        }
        f.write_str("<table class=\"queryresults\">\n")?;
        self.write_header(f)?;
        for (i, row) in rows.iter().enumerate() {
            self.write_row(f, row, i)?;
        }
        f.write_str("</table>\n")
    }
}

/// Tab-separated rendering of SELECT results, one line per row.
pub struct Tsv<'a> {
    doc: &'a ResultsDocument,
    headers: bool,
}

impl<'a> Tsv<'a> {
    pub fn new(doc: &'a ResultsDocument) -> Self {
        Tsv { doc, headers: true }
    }

    pub fn without_headers(mut self) -> Self {
        self.headers = false;
        self
    }
}

impl Display for Tsv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vars = self.doc.vars();
        if vars.is_empty() {
            return Ok(());
        }
        if self.headers {
            writeln!(f, "?{}", vars.join("\t?"))?;
        }
        let rows = self.doc.results.as_ref().map(|r| &r.bindings[..]).unwrap_or(&[]);
        for row in rows {
            for (i, var) in vars.iter().enumerate() {
                if i > 0 {
                    f.write_char('\t')?;
                }
                if let Some(term) = row.get(var) {
                    write_plain(f, term)?;
                }
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}

/// Strings are quoted, numbers and booleans are bare, other terms use N-Triples syntax.
fn write_plain(f: &mut fmt::Formatter<'_>, term: &RdfTerm) -> fmt::Result {
    match term {
        RdfTerm::Uri { value } => write!(f, "<{value}>"),
        RdfTerm::Bnode { value } => write!(f, "_:{value}"),
        RdfTerm::Literal {
            value,
            lang: Some(lang),
            ..
        } => write!(f, "{}@{lang}", Quoted(value)),
        _ => {
            let value = term.value();
            match term.datatype() {
                None => write!(f, "{}", Quoted(value)),
                Some(dt) if dt == format!("{XSD}string") => write!(f, "{}", Quoted(value)),
                Some(dt)
                    if is_numeric_xsd_type(dt) || dt == format!("{XSD}boolean") =>
                {
                    f.write_str(value)
                }
                Some(dt) => write!(f, "{}^^<{dt}>", Quoted(value)),
            }
        }
    }
}

/// A string literal in N-Triples syntax (ECHAR escapes only).
struct Quoted<'a>(&'a str);

impl Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for c in self.0.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c => f.write_char(c)?,
            }
        }
        f.write_char('"')
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::results::decode;
    use test_case::test_case;

    fn namespaces() -> IndexMap<String, String> {
        IndexMap::from([
            ("foaf".to_string(), "http://xmlns.com/foaf/0.1/".to_string()),
            ("xsd".to_string(), XSD.to_string()),
        ])
    }

    fn doc() -> ResultsDocument {
        decode(
            r#"{"head": {"vars": ["property", "class", "s", "o"]}, "results": {"bindings": [
                {
                    "property": {"type": "uri", "value": "http://xmlns.com/foaf/0.1/name"},
                    "class": {"type": "uri", "value": "http://xmlns.com/foaf/0.1/Person"},
                    "s": {"type": "uri", "value": "urn:x:1"},
                    "o": {"type": "literal", "value": "Tom & Jerry", "xml:lang": "en"}
                },
                {
                    "s": {"type": "bnode", "value": "b0"},
                    "o": {"type": "typed-literal", "value": "42", "datatype": "http://www.w3.org/2001/XMLSchema#integer"}
                }
            ]}}"#,
        )
        .unwrap()
    }

    #[test_case("property", "http://ex.org/p" => "?property=http%3A%2F%2Fex.org%2Fp")]
    #[test_case("class", "http://ex.org/C" => "?class=http%3A%2F%2Fex.org%2FC")]
    #[test_case("s", "http://ex.org/s#x" => "?describe=http%3A%2F%2Fex.org%2Fs%23x")]
    #[test_case("namedgraph", "urn:g" => "?describe=urn%3Ag")]
    fn links(var: &str, iri: &str) -> String {
        link_for(var, iri)
    }

    #[test_case("http://www.w3.org/2001/XMLSchema#integer" => true)]
    #[test_case("http://www.w3.org/2001/XMLSchema#unsignedByte" => true)]
    #[test_case("http://www.w3.org/2001/XMLSchema#string" => false)]
    #[test_case("http://example.org/integer" => false)]
    fn numeric(dt: &str) -> bool {
        is_numeric_xsd_type(dt)
    }

    #[test]
    fn qnames() {
        let ns = namespaces();
        assert_eq!(
            to_qname("http://xmlns.com/foaf/0.1/name", &ns).as_deref(),
            Some("foaf:name")
        );
        assert_eq!(to_qname("http://other.org/x", &ns), None);
    }

    #[test]
    fn html_table() {
        let doc = doc();
        let ns = namespaces();
        let html = HtmlTable::new(&doc, &ns).to_string();
        assert!(html.starts_with("<table class=\"queryresults\">\n<tr><th>property</th><th>class</th><th>s</th><th>o</th></tr>\n"));
        assert!(html.contains("<tr class=\"even\">"));
        assert!(html.contains("<tr class=\"odd\">"));
        assert!(html.contains(
            "<a href=\"?property=http%3A%2F%2Fxmlns.com%2Ffoaf%2F0.1%2Fname\" title=\"&lt;http://xmlns.com/foaf/0.1/name&gt;\" class=\"graph-link\">foaf:name</a>"
        ));
        assert!(html.contains("href=\"?class=http%3A%2F%2Fxmlns.com%2Ffoaf%2F0.1%2FPerson\""));
        assert!(html.contains("&lt;<a href=\"?describe=urn%3Ax%3A1\""));
        assert!(html.contains("alt=\"[http]\""));
        assert!(html.contains("&quot;Tom &amp; Jerry&quot;@en"));
        assert!(html.contains("_:b0"));
        assert!(html.contains("<span title=\"&quot;42&quot;^^xsd:integer\">42</span>"));
        assert!(html.contains("<span class=\"unbound\" title=\"Unbound\">-</span>"));
    }

    #[test]
    fn html_table_with_base() {
        let doc = doc();
        let ns = IndexMap::new();
        let html = HtmlTable::new(&doc, &ns)
            .with_base("/snorql/")
            .to_string();
        assert!(html.contains("href=\"/snorql/?describe=urn%3Ax%3A1\""));
        assert!(html.contains("<span title=\"&quot;42&quot;^^&lt;http://www.w3.org/2001/XMLSchema#integer&gt;\">42</span>"));
    }

    #[test]
    fn html_named_graphs() {
        let doc = decode(
            r#"{"head": {"vars": ["namedgraph", "label"]}, "results": {"bindings": [
                {"namedgraph": {"type": "uri", "value": "http://g/1"}}
            ]}}"#,
        )
        .unwrap();
        let ns = IndexMap::new();
        let html = HtmlTable::new(&doc, &ns).to_string();
        assert!(html.contains("<tr><th> </th><th>namedgraph</th><th>label</th></tr>"));
        assert!(html.contains("<td><a href=\"?graph=http%3A%2F%2Fg%2F1\">Switch</a></td>"));
    }

    #[test]
    fn html_empty() {
        let doc = decode(r#"{"head": {"vars": ["x"]}, "results": {"bindings": []}}"#).unwrap();
        let ns = IndexMap::new();
        assert_eq!(
            HtmlTable::new(&doc, &ns).to_string(),
            "<p class=\"empty\">[no results]</p>\n"
        );
    }

    #[test]
    fn tsv() {
        let doc = doc();
        assert_eq!(
            Tsv::new(&doc).to_string(),
            "?property\t?class\t?s\t?o\n\
             <http://xmlns.com/foaf/0.1/name>\t<http://xmlns.com/foaf/0.1/Person>\t<urn:x:1>\t\"Tom & Jerry\"@en\n\
             \t\t_:b0\t42\n"
        );
        assert!(Tsv::new(&doc)
            .without_headers()
            .to_string()
            .starts_with("<http://xmlns.com/foaf/0.1/name>"));
    }

    #[test_case("plain" => "\"plain\"")]
    #[test_case("say \"hi\"" => r#""say \"hi\"""#; "quotes")]
    #[test_case("a\\b" => r#""a\\b""#; "backslash")]
    #[test_case("l1\nl2\r\tend" => r#""l1\nl2\r\tend""#; "control")]
    #[test_case("e\u{301}t\u{e9}" => "\"e\u{301}t\u{e9}\""; "combining accent")]
    fn quoted(txt: &str) -> String {
        Quoted(txt).to_string()
    }

    #[test]
    fn tsv_escapes_literals() {
        let doc = decode(
            r#"{"head": {"vars": ["x"]}, "results": {"bindings": [
                {"x": {"type": "literal", "value": "cafe\u0301\n\"ok\"", "xml:lang": "fr"}}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(
            Tsv::new(&doc).without_headers().to_string(),
            "\"cafe\u{301}\\n\\\"ok\\\"\"@fr\n"
        );
    }
}
