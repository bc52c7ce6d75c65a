use anyhow::Result;
use clap::Parser;
use clap_verbosity::InfoLevel;
use snorql::transform::Transformation;

mod ask;
mod batch;
mod browse;
mod common;
mod query;
mod select;
mod url;

/// Explore a SPARQL endpoint from the command line.
#[derive(Parser, Debug)]
#[command(version, about, disable_help_subcommand = true)]
struct CmdArgs {
    #[command(flatten)]
    verbose: common::verbosity::Verbosity<InfoLevel>,

    #[command(flatten)]
    endpoint: common::endpoint::EndpointArgs,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(clap::Subcommand, Clone, Debug)]
enum Subcommand {
    #[command(visible_aliases=["q"], aliases=["qu", "que"])]
    Query(query::Args),
    #[command(visible_aliases=["a"], aliases=["as"])]
    Ask(ask::Args),
    /// Print the values of the first variable of a SELECT query, one per line
    #[command(visible_aliases=["v"], aliases=["va", "val"])]
    Values(select::Args),
    /// Print the only value of a SELECT query with one variable and one solution
    #[command(visible_aliases=["s"], aliases=["si", "sin"])]
    Single(select::Args),
    /// Print the values of each variable of a SELECT query, column by column
    #[command(visible_aliases=["c"], aliases=["co", "col"])]
    Columns(select::Args),
    /// Print each solution of a SELECT query as VAR=VALUE items
    #[command(visible_aliases=["r"], aliases=["ro", "row"])]
    Rows(select::Args),
    #[command(visible_aliases=["u"])]
    Url(url::Args),
    #[command(visible_aliases=["b"], aliases=["br", "bro"])]
    Browse(browse::Args),
    #[command(aliases=["ba", "bat"])]
    Batch(batch::Args),
}

fn main() -> Result<()> {
    #[cfg(feature = "markdown-help")]
    if std::env::args().any(|arg| arg == "--markdown-help") {
        clap_markdown::print_help_markdown::<CmdArgs>();
        return Ok(());
    }

    let args = CmdArgs::parse();

    env_logger::builder()
        .format_timestamp(None)
        .filter_level(args.verbose.log_level_filter())
        .init();
    log::trace!("verbosity: {}", args.verbose);
    let service = args.endpoint.service()?;
    use Subcommand::*;
    match args.subcommand {
        Query(args) => query::run(service, args),
        Ask(args) => ask::run(service, args),
        Values(args) => select::run(service, args, Transformation::SelectValues),
        Single(args) => select::run(service, args, Transformation::SelectSingleValue),
        Columns(args) => select::run(service, args, Transformation::SelectValueArrays),
        Rows(args) => select::run(service, args, Transformation::SelectValueHashes),
        Url(args) => url::run(service, args),
        Browse(args) => browse::run(service, args),
        Batch(args) => batch::run(service, args),
    }
}
