use crate::{
    catalog::{BookApi, HttpBookApi},
    config::AppConfig,
    display,
};
use anyhow::Result;
use std::io::Write;

#[derive(Debug)]
pub struct BookArgs {
    pub config: AppConfig,
    pub id: String,
}

#[derive(Debug)]
pub struct BooksArgs {
    pub config: AppConfig,
}

/// Print one book, or a not-found notice when the catalogue has no such id.
///
/// # Errors
/// Returns an error if the lookup fails.
pub async fn show_book(args: BookArgs) -> Result<()> {
    let api = HttpBookApi::new(&args.config)?;
    print_book(&api, &args.id, &mut std::io::stdout()).await
}

/// Print the whole catalogue.
///
/// # Errors
/// Returns an error if the listing fails.
pub async fn list_books(args: BooksArgs) -> Result<()> {
    let api = HttpBookApi::new(&args.config)?;
    print_books(&api, &mut std::io::stdout()).await
}

pub(crate) async fn print_book<A: BookApi, W: Write>(
    api: &A,
    id: &str,
    out: &mut W,
) -> Result<()> {
    match api.get_book(id).await? {
        Some(book) => write!(out, "{}", display::book_detail(&book))?,
        None => writeln!(out, "Book not found: {id}")?,
    }
    Ok(())
}

pub(crate) async fn print_books<A: BookApi, W: Write>(api: &A, out: &mut W) -> Result<()> {
    let books = api.list_books().await?;
    if books.is_empty() {
        writeln!(out, "The catalogue is empty")?;
    }
    for book in &books {
        writeln!(out, "{}", display::book_line(book))?;
    }
    Ok(())
}
