use std::sync::LazyLock;

use anyhow::{bail, Result};
use regex::Regex;

/// Parse a prefix map expressed as PREFIX:URI,PREFIX:URI,...
///
/// Prefixes must be valid SPARQL prefix names (possibly empty),
/// and namespaces may not contain characters that would break a `PREFIX` declaration.
pub fn parse_prefix_map(txt: &str) -> Result<Vec<(String, String)>> {
    static PREFIX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^([A-Za-z]([\w.-]*\w)?)?$").unwrap());
    static NAMESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^[^\s<>"{}|^`\\]+$"#).unwrap());
    txt.split(',')
        .map(|item| {
            let Some((prefix, ns)) = item.split_once(':') else {
                bail!("Missing colon (':') in prefix-map entry {item:?}");
            };
            let (prefix, ns) = (prefix.trim(), ns.trim());
            if !PREFIX.is_match(prefix) {
                bail!("Invalid prefix {prefix:?} in prefix-map entry {item:?}");
            }
            if !NAMESPACE.is_match(ns) {
                bail!("Invalid namespace {ns:?} in prefix-map entry {item:?}");
            }
            Ok((prefix.to_string(), ns.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test]
    fn several() {
        let map = parse_prefix_map("foaf:http://xmlns.com/foaf/0.1/, ex:http://example.org/").unwrap();
        assert_eq!(
            map,
            vec![
                ("foaf".to_string(), "http://xmlns.com/foaf/0.1/".to_string()),
                ("ex".to_string(), "http://example.org/".to_string()),
            ]
        );
    }

    #[test]
    fn empty_prefix() {
        let map = parse_prefix_map(":http://example.org/#").unwrap();
        assert_eq!(map, vec![(String::new(), "http://example.org/#".to_string())]);
    }

    #[test_case("foaf"; "no colon")]
    #[test_case("1x:http://example.org/"; "bad prefix")]
    #[test_case("x-:http://example.org/"; "trailing dash")]
    #[test_case("ex:"; "empty namespace")]
    #[test_case("ex:http://example.org/>"; "angle bracket")]
    #[test_case("ex:http://example.org/,foaf"; "second entry")]
    fn invalid(txt: &str) {
        assert!(parse_prefix_map(txt).is_err());
    }
}
