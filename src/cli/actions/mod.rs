pub mod catalog;
pub mod interrupt;
pub mod recommend;
pub mod run;
pub mod shell;

use anyhow::Result;

#[derive(Debug)]
pub enum Action {
    Book(catalog::BookArgs),
    Books(catalog::BooksArgs),
    Recommend(recommend::Args),
    Examples,
    Shell(shell::Args),
}

impl Action {
    /// Execute the action
    ///
    /// # Errors
    ///
    /// Returns an error if the action fails to execute
    pub async fn execute(self) -> Result<()> {
        run::execute(self).await
    }
}
