use crate::{
    cli::AppArgs,
    error::ResolveError,
    io::UdpTransport,
    message::record::Record,
    resolver::{Resolver, ResolverConfig},
};
use tracing_subscriber::EnvFilter;

mod cli;
mod dns_types;
mod error;
mod io;
mod message;
mod resolver;
#[cfg(test)]
mod testing;

fn main() {
    let args = match AppArgs::parse() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print!("{}", cli::HELP);
            return;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            print!("{}", cli::HELP);
            return;
        }
    };
    init_logging();

    let outcome = lookup(&args);
    if let Err(e) = &outcome {
        tracing::info!(name = %args.name, error = %e, "lookup failed");
    }
    io::print_outcome(&args.name, &outcome);
}

/// Diagnostics go to stderr, stdout is reserved for the lookup result and the trace.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs one lookup session over a fresh socket.
fn lookup(args: &AppArgs) -> Result<Vec<Record>, ResolveError> {
    let transport = UdpTransport::bind_for(args.root_server)?;
    let mut resolver = Resolver::new(transport, args.root_server, ResolverConfig::default())
        .with_trace(args.trace);
    let result = resolver.lookup(&args.name, args.record_type());
    tracing::debug!(queries = resolver.queries_sent(), "lookup finished");
    result
}
