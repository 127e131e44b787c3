use anyhow::{Context, Result};

use cardwise_lib::flashcards::get_due_cards;

use crate::app::App;
use crate::commands::card::print_cards;
use crate::OutputFormat;

pub async fn run(app: &App, deck_name: Option<&str>, format: &OutputFormat) -> Result<()> {
    let deck_id = app.find_deck_id(deck_name)?;
    let due = get_due_cards(app.storage.as_ref(), app.clock.as_ref(), deck_id)
        .await
        .context("Failed to query due cards")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(due.as_slice())?),
        OutputFormat::Plain => print_cards(due.as_slice()),
    }
    Ok(())
}
