pub mod api;
pub mod identity;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const CMD_BOOK: &str = "book";
pub const CMD_BOOKS: &str = "books";
pub const CMD_RECOMMEND: &str = "recommend";
pub const CMD_SHELL: &str = "shell";

pub const ARG_BOOK_ID: &str = "id";
pub const ARG_QUERY: &str = "query";
pub const ARG_EXAMPLES: &str = "examples";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let git_hash = crate::GIT_COMMIT_HASH;
    let long_version: &'static str =
        Box::leak(format!("{} - {}", env!("CARGO_PKG_VERSION"), git_hash).into_boxed_str());

    let command = Command::new("libris")
        .about("Book discovery: browse the catalogue and get recommendations")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_BOOK)
                .about("Show one book from the catalogue")
                .arg(Arg::new(ARG_BOOK_ID).help("Book id").required(true)),
        )
        .subcommand(Command::new(CMD_BOOKS).about("List the catalogue"))
        .subcommand(
            Command::new(CMD_RECOMMEND)
                .about("Recommend books for a free-text query")
                .arg(
                    Arg::new(ARG_EXAMPLES)
                        .long(ARG_EXAMPLES)
                        .help("Print example queries and exit")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new(ARG_QUERY)
                        .help("What you feel like reading")
                        .num_args(1..)
                        .trailing_var_arg(true)
                        .required_unless_present(ARG_EXAMPLES),
                ),
        )
        .subcommand(Command::new(CMD_SHELL).about("Interactive session with sign-up and login"));

    let command = api::with_args(command);
    let command = identity::with_args(command);
    logging::with_args(command)
}
