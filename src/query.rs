use anyhow::Result;
use snorql::{
    client::EndpointService,
    render::{HtmlTable, Tsv},
    transform::QueryResponse,
};

use crate::common::{
    format::RenderFormat,
    outcome::wait_for,
    query_source::QuerySource,
};

/// Send a SPARQL query to the endpoint, and print the results
///
/// SELECT results are printed according to --render.
/// Boolean results are printed as `true` or `false`.
/// Responses in a format other than JSON (see --output) are printed untouched.
#[derive(clap::Args, Clone, Debug)]
#[command(verbatim_doc_comment)]
pub struct Args {
    /// SPARQL query (`-` for standard input, `@FILE` or `@URL` to read it from there)
    #[arg()]
    query: QuerySource,

    #[command(flatten)]
    render: RenderArgs,
}

/// Reusable rendering options
#[derive(clap::Args, Clone, Debug)]
pub struct RenderArgs {
    /// How to print results: tsv, html or json
    #[arg(short, long, default_value = "tsv")]
    pub(crate) render: RenderFormat,

    /// Do not output column headers (variable names) with --render tsv
    #[arg(short = 'N', long)]
    pub(crate) no_headers: bool,

    /// Base of the links in the HTML table
    #[arg(short, long, default_value = "")]
    pub(crate) base: String,
}

pub fn run(service: EndpointService, args: Args) -> Result<()> {
    log::trace!("query args: {args:#?}");
    let text = args.query.read()?;
    let response = wait_for(|done| service.query(text, done))?;
    print!("{}", render(&response, &service, &args.render)?);
    Ok(())
}

/// Render a response according to `args`, using the prefixes of `service` for QNames.
pub fn render(response: &QueryResponse, service: &EndpointService, args: &RenderArgs) -> Result<String> {
    let doc = match response {
        QueryResponse::Text(txt) => return Ok(txt.clone()),
        QueryResponse::Results(doc) => doc,
    };
    if args.render == RenderFormat::Json {
        return Ok(serde_json::to_string_pretty(doc)? + "\n");
    }
    if let Some(b) = doc.boolean {
        return Ok(format!("{b}\n"));
    }
    Ok(match args.render {
        RenderFormat::Html => HtmlTable::new(doc, service.prefixes())
            .with_base(&args.base)
            .to_string(),
        _ if args.no_headers => Tsv::new(doc).without_headers().to_string(),
        _ => Tsv::new(doc).to_string(),
    })
}
