use crate::{
    catalog::{BookApi, HttpBookApi},
    cli::actions::interrupt::Interrupts,
    config::AppConfig,
    display,
    recommend::{recommend_until_cancelled, EXAMPLE_QUERIES},
};
use anyhow::Result;
use std::io::Write;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub config: AppConfig,
    pub query: String,
}

/// Run one recommendation query.
///
/// # Errors
/// Returns an error for a blank query or when the recommendation request fails.
pub async fn execute(args: Args) -> Result<()> {
    let api = HttpBookApi::new(&args.config)?;
    let interrupts = Interrupts::listen();
    print_recommendations(&api, &args.query, &interrupts, &mut std::io::stdout()).await
}

/// # Errors
/// Returns an error if the output cannot be written.
pub fn print_examples<W: Write>(out: &mut W) -> Result<()> {
    for query in EXAMPLE_QUERIES {
        writeln!(out, "{query}")?;
    }
    Ok(())
}

/// Fetches and prints recommendations. The next Ctrl-C abandons the
/// outstanding requests.
pub(crate) async fn print_recommendations<A: BookApi, W: Write>(
    api: &A,
    query: &str,
    interrupts: &Interrupts,
    out: &mut W,
) -> Result<()> {
    let (cancel, watcher) = interrupts.cancel_on_next();
    let result = recommend_until_cancelled(api, query, &cancel).await;
    watcher.abort();

    match result? {
        None => {
            debug!("recommendations interrupted");
            writeln!(out, "Cancelled")?;
        }
        Some(items) if items.is_empty() => writeln!(out, "No recommendations found")?,
        Some(items) => {
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    writeln!(out)?;
                }
                write!(out, "{}", display::recommendation(item))?;
            }
        }
    }

    Ok(())
}
