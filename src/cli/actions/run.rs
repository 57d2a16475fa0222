use crate::cli::actions::{catalog, recommend, shell, Action};
use anyhow::Result;

/// Execute the action
///
/// # Errors
///
/// Returns an error if the action fails to execute
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Book(args) => catalog::show_book(args).await,
        Action::Books(args) => catalog::list_books(args).await,
        Action::Recommend(args) => recommend::execute(args).await,
        Action::Examples => recommend::print_examples(&mut std::io::stdout()),
        Action::Shell(args) => shell::execute(args).await,
    }
}
