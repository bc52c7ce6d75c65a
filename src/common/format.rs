use std::sync::LazyLock;

use anyhow::Error;
use regex::{RegexSet, RegexSetBuilder};

/// How results are printed on the standard output.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum RenderFormat {
    /// Tab-separated values, one line per solution.
    #[default]
    Tsv,
    /// The HTML table of the query page.
    Html,
    /// The JSON value produced by the transformation.
    Json,
}

impl std::str::FromStr for RenderFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static RES: LazyLock<RegexSet> = LazyLock::new(|| {
            RegexSetBuilder::new([
                r"^( text/tab-separated-values | tsv | tab | text )$",
                r"^( text/html | html | table )$",
                r"^( application/sparql-results\+json | application/json | json )$",
            ])
            .ignore_whitespace(true)
            .case_insensitive(true)
            .build()
            .unwrap()
        });
        match RES.matches(s).iter().next() {
            Some(0) => Ok(RenderFormat::Tsv),
            Some(1) => Ok(RenderFormat::Html),
            Some(2) => Ok(RenderFormat::Json),
            _ => Err(Error::msg(format!("Unrecognized render format: {s}"))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;
    use RenderFormat::*;

    #[test_case("tsv" => Tsv)]
    #[test_case("TSV" => Tsv; "tsv cap")]
    #[test_case("tab" => Tsv)]
    #[test_case("text" => Tsv)]
    #[test_case("text/tab-separated-values" => Tsv)]
    #[test_case("html" => Html)]
    #[test_case("HTML" => Html; "html cap")]
    #[test_case("table" => Html)]
    #[test_case("text/html" => Html)]
    #[test_case("json" => Json)]
    #[test_case("Json" => Json; "json cam")]
    #[test_case("application/json" => Json)]
    #[test_case("application/sparql-results+json" => Json)]
    fn parse_format(txt: &str) -> RenderFormat {
        txt.parse().unwrap()
    }

    #[test_case("xml")]
    #[test_case("tsvx")]
    #[test_case("")]
    fn unrecognized(txt: &str) {
        assert!(txt.parse::<RenderFormat>().is_err());
    }
}
