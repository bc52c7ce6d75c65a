use anyhow::Result;
use snorql::client::EndpointService;

use crate::common::query_source::QuerySource;

/// Print the URL that sends a query to the endpoint with the GET method
///
/// Nothing is sent to the endpoint.
#[derive(clap::Args, Clone, Debug)]
#[command(verbatim_doc_comment)]
pub struct Args {
    /// SPARQL query (`-` for standard input, `@FILE` or `@URL` to read it from there)
    #[arg()]
    query: QuerySource,

    /// Print the query string (with its PREFIX declarations) instead of the URL
    #[arg(short = 'Q', long)]
    query_string: bool,

    /// With --query-string, omit the PREFIX declarations
    #[arg(short = 'P', long, requires = "query_string")]
    no_prefixes: bool,
}

pub fn run(service: EndpointService, args: Args) -> Result<()> {
    log::trace!("url args: {args:#?}");
    let mut request = service.create_query();
    request.set_query_text(args.query.read()?);
    if args.query_string {
        println!("{}", request.query_string(!args.no_prefixes));
    } else {
        println!("{}", request.query_url());
    }
    Ok(())
}
