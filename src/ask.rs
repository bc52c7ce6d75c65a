use anyhow::Result;
use snorql::client::EndpointService;

use crate::common::{outcome::wait_for, query_source::QuerySource};

/// Send an ASK query to the endpoint, and print its boolean result
#[derive(clap::Args, Clone, Debug)]
pub struct Args {
    /// SPARQL ASK query (`-` for standard input, `@FILE` or `@URL` to read it from there)
    #[arg()]
    query: QuerySource,

    /// Exit with an error status if the result is `false`
    ///
    /// The result of the query will also not be printed to the output.
    #[arg(short, long, verbatim_doc_comment)]
    status: bool,
}

pub fn run(service: EndpointService, args: Args) -> Result<()> {
    log::trace!("ask args: {args:#?}");
    let text = args.query.read()?;
    let response = wait_for(|done| service.ask(text, done))?;
    if args.status {
        std::process::exit(if response { 0 } else { 128 })
    } else {
        println!("{response}");
        Ok(())
    }
}
