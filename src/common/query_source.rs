use std::io::Read;
use std::sync::LazyLock;

use anyhow::{Context, Error, Result};
use regex::Regex;
use reqwest::Url;

/// Where the text of a query comes from.
///
/// On the command line, `-` denotes the standard input,
/// `@` followed by a path or an http(s) URL denotes the content of that file or resource,
/// and anything else is the query itself.
#[derive(Clone, Debug, PartialEq)]
pub enum QuerySource {
    Text(String),
    File(String),
    Url(Url),
    StdIn,
}

impl std::str::FromStr for QuerySource {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new("^http(s)?://").unwrap());
        let Some(location) = value.strip_prefix('@') else {
            return Ok(if value == "-" {
                QuerySource::StdIn
            } else {
                QuerySource::Text(value.to_string())
            });
        };
        if URL_RE.is_match(location) {
            Ok(QuerySource::Url(Url::parse(location)?))
        } else if std::fs::exists(location)? {
            Ok(QuerySource::File(location.to_string()))
        } else {
            Err(Error::msg(format!(
                "Neither an http(s) URL nor an existing file: {location}"
            )))
        }
    }
}

impl QuerySource {
    /// Get the text of the query.
    pub fn read(&self) -> Result<String> {
        match self {
            QuerySource::Text(txt) => Ok(txt.clone()),
            QuerySource::File(path) => {
                std::fs::read_to_string(path).with_context(|| format!("Can not read {path}"))
            }
            QuerySource::Url(url) => {
                log::debug!("fetching query from {url}");
                let resp = reqwest::blocking::get(url.clone())?.error_for_status()?;
                Ok(resp.text()?)
            }
            QuerySource::StdIn => {
                let mut txt = String::new();
                std::io::stdin()
                    .read_to_string(&mut txt)
                    .context("Can not read query from standard input")?;
                Ok(txt)
            }
        }
    }
}

impl std::fmt::Display for QuerySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuerySource::Text(txt) => txt.fmt(f),
            QuerySource::File(path) => write!(f, "@{path}"),
            QuerySource::Url(url) => write!(f, "@{url}"),
            QuerySource::StdIn => "-".fmt(f),
        }
    }
}
