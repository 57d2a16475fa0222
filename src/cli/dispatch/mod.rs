use crate::{
    cli::{
        actions::{catalog, recommend, shell, Action},
        commands::{self, api, identity},
    },
    config::AppConfig,
};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use std::time::Duration;

/// Builds the client configuration from the global flags.
///
/// # Errors
/// Returns an error when a required flag is missing or a value is invalid.
pub fn config(matches: &ArgMatches) -> Result<AppConfig> {
    let api = api::Options::parse(matches)?;
    let identity = identity::Options::parse(matches)?;

    AppConfig::new(
        &api.url,
        &identity.region,
        &identity.client_id,
        identity.endpoint.as_deref(),
        Duration::from_secs(api.timeout_seconds),
    )
    .context("invalid configuration")
}

/// Maps the parsed command line to the action to run.
///
/// # Errors
/// Returns an error when the configuration a subcommand needs is incomplete.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((commands::CMD_BOOK, sub_m)) => Ok(Action::Book(catalog::BookArgs {
            config: config(sub_m)?,
            id: sub_m
                .get_one::<String>(commands::ARG_BOOK_ID)
                .cloned()
                .ok_or_else(|| anyhow!("missing book id"))?,
        })),
        Some((commands::CMD_BOOKS, sub_m)) => Ok(Action::Books(catalog::BooksArgs {
            config: config(sub_m)?,
        })),
        Some((commands::CMD_RECOMMEND, sub_m)) => {
            if sub_m.get_flag(commands::ARG_EXAMPLES) {
                return Ok(Action::Examples);
            }
            let query = sub_m
                .get_many::<String>(commands::ARG_QUERY)
                .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "))
                .unwrap_or_default();

            Ok(Action::Recommend(recommend::Args {
                config: config(sub_m)?,
                query,
            }))
        }
        Some((commands::CMD_SHELL, sub_m)) => Ok(Action::Shell(shell::Args {
            config: config(sub_m)?,
        })),
        _ => Err(anyhow!("unknown command")),
    }
}
