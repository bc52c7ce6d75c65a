use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use snorql::client::{EndpointService, Method, ReqwestTransport};

use super::{config::Config, prefix_map::parse_prefix_map};

/// Options describing the endpoint, shared by all subcommands.
///
/// Options given on the command line override those of the configuration file.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct EndpointArgs {
    /// YAML configuration file
    #[arg(short, long, env = "SNORQL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// URL of the SPARQL endpoint
    #[arg(short, long, env = "SNORQL_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Default graph of the queries (can be repeated)
    #[arg(short, long = "default-graph", value_name = "IRI", global = true)]
    default_graphs: Vec<String>,

    /// Named graph of the queries (can be repeated)
    #[arg(short, long = "named-graph", value_name = "IRI", global = true)]
    named_graphs: Vec<String>,

    /// Prefix map expressed as PREFIX:URI,PREFIX:URI,...
    ///
    /// The corresponding PREFIX declarations are prepended to every query.
    #[arg(short, long, value_parser=parse_prefix_map, env="SNORQL_PREFIXES", global = true, verbatim_doc_comment)]
    prefixes: Option<PrefixMap>,

    /// HTTP method used to send queries (GET or POST) [default: POST]
    #[arg(short, long, global = true)]
    method: Option<Method>,

    /// Value of the 'output' parameter sent to the endpoint [default: json]
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Extra request header, as NAME:VALUE (can be repeated)
    #[arg(short = 'H', long = "header", value_parser = parse_header, global = true)]
    headers: Vec<(String, String)>,

    /// Maximum number of queries running at once (0 for no limit)
    #[arg(short = 'j', long, global = true)]
    max_concurrent: Option<usize>,

    /// Give up on a query after this many seconds
    #[arg(short, long, global = true)]
    timeout: Option<u64>,
}

type PrefixMap = Vec<(String, String)>;

impl EndpointArgs {
    /// Build the service described by the configuration file and the command line.
    pub fn service(&self) -> Result<EndpointService> {
        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        log::trace!("configuration: {config:#?}");
        let Some(endpoint) = self.endpoint.as_ref().or(config.endpoint.as_ref()) else {
            bail!("No endpoint given (use --endpoint, SNORQL_ENDPOINT or a configuration file)");
        };
        let transport = match self.timeout.or(config.timeout) {
            Some(secs) => ReqwestTransport::with_timeout(Duration::from_secs(secs))?,
            None => ReqwestTransport::new(),
        };
        let mut service = EndpointService::with_transport(endpoint.as_str(), transport)
            .context("Can not create endpoint service")?;
        config.apply(&mut service)?;

        service.add_default_graph(&self.default_graphs[..]);
        service.add_named_graph(&self.named_graphs[..]);
        for (prefix, ns) in self.prefixes.iter().flatten() {
            service.set_prefix(prefix, ns);
        }
        if let Some(method) = self.method {
            service.set_http_method(method);
        }
        if let Some(output) = &self.output {
            service.set_output(output);
        }
        for (name, value) in &self.headers {
            service.set_request_header(name, value.as_str());
        }
        if let Some(max) = self.max_concurrent {
            service.set_max_concurrent(max);
        }
        log::debug!("{service:?}");
        Ok(service)
    }
}

/// Parse a request header expressed as NAME:VALUE
pub fn parse_header(txt: &str) -> Result<(String, String)> {
    let Some((name, value)) = txt.split_once(':') else {
        bail!("Missing colon (':') in header {txt:?}");
    };
    let name = name.trim();
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic()) {
        bail!("Invalid header name {name:?}");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case("Accept: text/csv" => ("Accept".to_string(), "text/csv".to_string()))]
    #[test_case("X-Token:a:b" => ("X-Token".to_string(), "a:b".to_string()); "colon in value")]
    #[test_case("X-Empty:" => ("X-Empty".to_string(), String::new()))]
    fn header(txt: &str) -> (String, String) {
        parse_header(txt).unwrap()
    }

    #[test_case("Accept"; "no colon")]
    #[test_case(": text/csv"; "no name")]
    #[test_case("Bad Name: x"; "space in name")]
    fn bad_header(txt: &str) {
        assert!(parse_header(txt).is_err());
    }

    #[test]
    fn no_endpoint() {
        let args = EndpointArgs::default();
        assert!(args.service().is_err());
    }

    #[test]
    fn command_line_settings() {
        let args = EndpointArgs {
            endpoint: Some("http://example.org/sparql".into()),
            default_graphs: vec!["http://example.org/g".into()],
            prefixes: Some(vec![("ex".into(), "http://example.org/".into())]),
            method: Some(Method::Get),
            headers: vec![("X-Api-Key".into(), "secret".into())],
            max_concurrent: Some(2),
            ..Default::default()
        };
        let service = args.service().unwrap();
        assert_eq!(service.endpoint(), "http://example.org/sparql");
        assert_eq!(service.default_graphs(), ["http://example.org/g"]);
        assert_eq!(service.prefixes()["ex"], "http://example.org/");
        assert_eq!(service.method(), Method::Get);
        assert_eq!(service.output(), "json");
        assert_eq!(service.max_concurrent(), 2);
        assert_eq!(service.request_headers()["X-Api-Key"].resolve(), "secret");
    }

    #[test]
    fn command_line_overrides_configuration() {
        let path = std::env::temp_dir().join(format!("snorql-config-{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            "endpoint: http://config.example/sparql\noutput: xml\nmax-concurrent: 8\n",
        )
        .unwrap();
        let args = EndpointArgs {
            config: Some(path.clone()),
            max_concurrent: Some(1),
            ..Default::default()
        };
        let service = args.service().unwrap();
        std::fs::remove_file(path).unwrap();
        assert_eq!(service.endpoint(), "http://config.example/sparql");
        assert_eq!(service.output(), "xml");
        assert_eq!(service.max_concurrent(), 1);
    }
}
