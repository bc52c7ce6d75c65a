use anyhow::Result;
use snorql::{
    client::EndpointService,
    page::{prefix_declarations, PageQuery, QueryForm, DEFAULT_QUERY},
};

use crate::{
    common::outcome::wait_for,
    query::{render, RenderArgs},
};

/// Run the query selected by the parameters of a query page URL
///
/// PAGE is the part of the URL after `?`, for example
///   browse=classes
///   browse=properties
///   browse=graphs
///   property=http://xmlns.com/foaf/0.1/name
///   class=http://xmlns.com/foaf/0.1/Person
///   describe=http://example.org/alice&graph=http://example.org/g
///   query=SELECT+*+{+?s+?p+?o+}+LIMIT+10
///
/// The output format requested from the endpoint depends on the form of the query
/// (ASK, CONSTRUCT, DESCRIBE or SELECT), overriding --output.
#[derive(clap::Args, Clone, Debug)]
#[command(verbatim_doc_comment)]
pub struct Args {
    /// Parameters of the query page
    #[arg(default_value = "")]
    page: String,

    /// Print the query instead of sending it
    #[arg(short = 'S', long)]
    show_query: bool,

    #[command(flatten)]
    render: RenderArgs,
}

pub fn run(service: EndpointService, args: Args) -> Result<()> {
    log::trace!("browse args: {args:#?}");
    let Some(page) = PageQuery::from_page_query(&args.page) else {
        log::info!("No query selected, showing the default query");
        println!("{}{DEFAULT_QUERY}", prefix_declarations(service.prefixes()));
        return Ok(());
    };
    log::info!("{}", page.query.title());
    if args.show_query {
        println!("{}{}", prefix_declarations(service.prefixes()), page.query.text());
        return Ok(());
    }

    let text = page.query.query();
    let mut request = service.create_query();
    if let Some(graph) = &page.graph {
        log::debug!("querying graph {graph}");
        request.add_default_graph(graph);
    }
    let form = QueryForm::detect(&text);
    request.set_output(form.output());
    if let Some(accept) = form.accept() {
        request.set_request_header("Accept", accept);
    }
    log::debug!("{form:?} query, output={}", request.output());

    let response = wait_for(|done| request.query(text, done))?;
    print!("{}", render(&response, &service, &args.render)?);
    Ok(())
}
