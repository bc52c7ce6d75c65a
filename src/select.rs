use anyhow::Result;
use snorql::{
    client::EndpointService,
    transform::{Transformation, Transformed},
};

use crate::common::{outcome::wait_for, query_source::QuerySource};

/// Send a SELECT query to the endpoint, and print the reshaped results
///
/// Terms are printed as plain strings, without their kind (IRI, blank node, literal),
/// datatype or language tag.
#[derive(clap::Args, Clone, Debug)]
#[command(verbatim_doc_comment)]
pub struct Args {
    /// SPARQL SELECT query (`-` for standard input, `@FILE` or `@URL` to read it from there)
    #[arg()]
    query: QuerySource,

    /// Print the result as JSON
    #[arg(short = 'J', long)]
    json: bool,
}

pub fn run(service: EndpointService, args: Args, transformation: Transformation) -> Result<()> {
    log::trace!("{transformation} args: {args:#?}");
    let text = args.query.read()?;
    let result = wait_for(|done| service.dispatch(transformation, text, done))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", lines(&result)?);
    }
    Ok(())
}

/// Plain text rendering of a transformed result.
///
/// Values are printed one per line;
/// columns are printed as `VAR<TAB>VALUE` lines;
/// rows are printed as tab-separated `VAR=VALUE` items, one row per line.
pub(crate) fn lines(result: &Transformed) -> Result<String> {
    let mut out = String::new();
    match result {
        Transformed::Boolean(b) => out.push_str(&format!("{b}\n")),
        Transformed::Value(v) => {
            out.push_str(v);
            out.push('\n');
        }
        Transformed::Values(values) => {
            for v in values {
                out.push_str(v);
                out.push('\n');
            }
        }
        Transformed::ValueArrays(columns) => {
            for (var, values) in columns {
                for v in values {
                    out.push_str(&format!("{var}\t{v}\n"));
                }
            }
        }
        Transformed::ValueHashes(rows) => {
            for row in rows {
                let items: Vec<_> = row.iter().map(|(var, v)| format!("{var}={v}")).collect();
                out.push_str(&items.join("\t"));
                out.push('\n');
            }
        }
        Transformed::Response(resp) => {
            out.push_str(&serde_json::to_string(resp)?);
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn values() {
        let res = Transformed::Values(vec!["a".into(), "b".into()]);
        assert_eq!(lines(&res).unwrap(), "a\nb\n");
    }

    #[test]
    fn single() {
        assert_eq!(lines(&Transformed::Value("42".into())).unwrap(), "42\n");
    }

    #[test]
    fn columns() {
        let res = Transformed::ValueArrays(IndexMap::from([
            ("x".to_string(), vec!["1".to_string(), "2".to_string()]),
            ("y".to_string(), vec!["3".to_string()]),
        ]));
        assert_eq!(lines(&res).unwrap(), "x\t1\nx\t2\ny\t3\n");
    }

    #[test]
    fn rows() {
        let res = Transformed::ValueHashes(vec![
            IndexMap::from([("x".to_string(), "1".to_string()), ("y".to_string(), "a".to_string())]),
            IndexMap::from([("y".to_string(), "b".to_string())]),
        ]);
        assert_eq!(lines(&res).unwrap(), "x=1\ty=a\ny=b\n");
    }
}
