use std::sync::mpsc;

use anyhow::{bail, Result};
use snorql::{
    client::EndpointService,
    transform::{Transformation, Transformed},
};

use crate::{
    common::{outcome::report, query_source::QuerySource},
    query::{render, RenderArgs},
    select::lines,
};

/// Send several queries to the endpoint at once, and print each result as it arrives
///
/// At most --max-concurrent queries run at the same time;
/// the others wait in a queue, ordered by priority.
/// Each result is preceded by a line `==> QUERY <==`.
#[derive(clap::Args, Clone, Debug)]
#[command(verbatim_doc_comment)]
pub struct Args {
    /// SPARQL queries (`-` for standard input, `@FILE` or `@URL` to read them from there)
    #[arg(required = true)]
    queries: Vec<QuerySource>,

    /// Priority of the queries, in the same order (can be repeated) [default: 0]
    ///
    /// Queued queries with a higher priority are sent first.
    #[arg(short = 'P', long = "priority", allow_negative_numbers = true, verbatim_doc_comment)]
    priorities: Vec<i32>,

    /// Transformation applied to every result
    /// (query, ask, values, single, columns or rows)
    #[arg(short = 'T', long, default_value = "query", verbatim_doc_comment)]
    transform: Transformation,

    #[command(flatten)]
    render: RenderArgs,
}

pub fn run(service: EndpointService, args: Args) -> Result<()> {
    log::trace!("batch args: {args:#?}");
    if args.priorities.len() > args.queries.len() {
        bail!(
            "{} priorities given for {} queries",
            args.priorities.len(),
            args.queries.len()
        );
    }
    let texts = args
        .queries
        .iter()
        .map(QuerySource::read)
        .collect::<Result<Vec<_>>>()?;

    let (tx, rx) = mpsc::channel();
    for (i, text) in texts.into_iter().enumerate() {
        let priority = args.priorities.get(i).copied().unwrap_or(0);
        let tx = tx.clone();
        service
            .create_query_with_priority(priority)
            .dispatch(args.transform, text, move |res| {
                // the receiver lives until every query reported
                let _ = tx.send((i, res));
            });
        log::debug!(
            "dispatched {} ({} running, {} queued)",
            args.queries[i],
            service.active_count(),
            service.pending_count()
        );
    }
    drop(tx);

    let mut failed = 0;
    for (i, res) in rx {
        println!("==> {} <==", args.queries[i]);
        match res {
            Ok(Transformed::Response(resp)) => print!("{}", render(&resp, &service, &args.render)?),
            Ok(other) => print!("{}", lines(&other)?),
            Err(err) => {
                failed += 1;
                log::error!("{:#}", report(err));
            }
        }
    }
    let stats = service.statistics();
    log::info!(
        "{} queries sent, {} succeeded, {} failed",
        stats.queries_sent,
        stats.successes,
        stats.failures
    );
    if failed > 0 {
        bail!("{failed} of {} queries failed", args.queries.len());
    }
    Ok(())
}
