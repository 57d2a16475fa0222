use clap::{Arg, ArgMatches, Command};

pub const ARG_COGNITO_REGION: &str = "cognito-region";
pub const ARG_COGNITO_CLIENT_ID: &str = "cognito-client-id";
pub const ARG_COGNITO_ENDPOINT: &str = "cognito-endpoint";

#[derive(Debug)]
pub struct Options {
    pub region: String,
    pub client_id: String,
    pub endpoint: Option<String>,
}

impl Options {
    /// Parse identity provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the region or the app client id is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // clap passes through empty strings when env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };
        let read_required = |id: &str| -> anyhow::Result<String> {
            get_non_empty(id).ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            region: read_required(ARG_COGNITO_REGION)?,
            client_id: read_required(ARG_COGNITO_CLIENT_ID)?,
            endpoint: get_non_empty(ARG_COGNITO_ENDPOINT),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_COGNITO_REGION)
                .long(ARG_COGNITO_REGION)
                .help("Cognito user pool region, example: eu-west-1")
                .env("LIBRIS_COGNITO_REGION")
                .global(true),
        )
        .arg(
            Arg::new(ARG_COGNITO_CLIENT_ID)
                .long(ARG_COGNITO_CLIENT_ID)
                .help("Cognito app client id (public client, no secret)")
                .env("LIBRIS_COGNITO_CLIENT_ID")
                .global(true),
        )
        .arg(
            Arg::new(ARG_COGNITO_ENDPOINT)
                .long(ARG_COGNITO_ENDPOINT)
                .help("Override the Cognito endpoint, e.g. a local emulator")
                .env("LIBRIS_COGNITO_ENDPOINT")
                .global(true),
        )
}
