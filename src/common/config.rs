//! I define the configuration file,
//! which provides the defaults of an [`EndpointService`] as YAML:
//!
//! ```yaml
//! endpoint: https://dbpedia.org/sparql
//! method: GET
//! default-graphs: [http://dbpedia.org]
//! prefixes:
//!   dbo: http://dbpedia.org/ontology/
//! headers:
//!   User-Agent: snorql
//! max-concurrent: 4
//! timeout: 30
//! ```
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use snorql::client::EndpointService;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    pub endpoint: Option<String>,
    pub default_graphs: Vec<String>,
    pub named_graphs: Vec<String>,
    /// Raw prefix values, see [`Config::prefixes`].
    prefixes: IndexMap<String, serde_yaml::Value>,
    pub method: Option<String>,
    pub output: Option<String>,
    pub headers: IndexMap<String, String>,
    pub max_concurrent: Option<usize>,
    /// In seconds.
    pub timeout: Option<u64>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = std::fs::read_to_string(path)
            .with_context(|| format!("Can not read configuration file {}", path.display()))?;
        Self::from_yaml(&txt)
            .with_context(|| format!("Invalid configuration file {}", path.display()))
    }

    pub fn from_yaml(txt: &str) -> Result<Self> {
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(txt)?)
    }

    /// The prefixes whose namespace is a string.
    ///
    /// Other entries are skipped with a warning.
    pub fn prefixes(&self) -> Vec<(String, String)> {
        self.prefixes
            .iter()
            .filter_map(|(prefix, value)| match value {
                serde_yaml::Value::String(ns) => Some((prefix.clone(), ns.clone())),
                other => {
                    log::warn!("Ignoring prefix {prefix:?}: namespace is not a string ({other:?})");
                    None
                }
            })
            .collect()
    }

    /// Set the defaults of `service` from this configuration.
    pub fn apply(&self, service: &mut EndpointService) -> Result<()> {
        service.add_default_graph(&self.default_graphs[..]);
        service.add_named_graph(&self.named_graphs[..]);
        for (prefix, ns) in self.prefixes() {
            service.set_prefix(prefix, ns);
        }
        if let Some(method) = &self.method {
            service.set_method(method)?;
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
        Ok(())
    }
}
