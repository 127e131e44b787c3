use anyhow::{Context, Result};

use cardwise_lib::flashcards::{Card, CardUpdate};

use crate::app::{short_id, truncate, App};
use crate::OutputFormat;

pub fn run_add(
    app: &App,
    deck_name: &str,
    front: String,
    back: String,
    tags: Vec<String>,
    format: &OutputFormat,
) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let card = app
        .storage
        .create_card(deck.id, front, back, tags)
        .context("Failed to create card")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card)?),
        OutputFormat::Plain => println!("Added card {} to '{}'", card.id, deck.name),
    }
    Ok(())
}

pub fn run_list(app: &App, deck_name: &str, format: &OutputFormat) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let cards = app.storage.list_cards(Some(deck.id)).context("Failed to list cards")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cards)?),
        OutputFormat::Plain => print_cards(&cards),
    }
    Ok(())
}

pub fn run_edit(
    app: &App,
    id: &str,
    front: Option<String>,
    back: Option<String>,
    tags: Option<Vec<String>>,
    format: &OutputFormat,
) -> Result<()> {
    let card = app.find_card(id)?;
    let updated = app
        .storage
        .update_card(card.id, CardUpdate { front, back, tags })
        .context("Failed to update card")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&updated)?),
        OutputFormat::Plain => println!("Updated card {}", updated.id),
    }
    Ok(())
}

pub fn run_delete(app: &App, id: &str) -> Result<()> {
    let card = app.find_card(id)?;
    app.storage.delete_card(card.id).context("Failed to delete card")?;
    println!("Deleted card {}", card.id);
    Ok(())
}

pub(crate) fn print_cards(cards: &[Card]) {
    if cards.is_empty() {
        println!("No cards found.");
        return;
    }

    let side_width = 30;
    let tags_width = 20;

    println!(
        "{:<8} {:<side_w$} {:<side_w$} {}",
        "Id",
        "Front",
        "Back",
        "Tags",
        side_w = side_width
    );
    println!(
        "{} {} {} {}",
        "\u{2500}".repeat(8),
        "\u{2500}".repeat(side_width),
        "\u{2500}".repeat(side_width),
        "\u{2500}".repeat(tags_width)
    );

    for card in cards {
        let tags = card
            .tags
            .iter()
            .map(|t| format!("#{}", t))
            .collect::<Vec<_>>()
            .join(" ");

        println!(
            "{:<8} {:<side_w$} {:<side_w$} {}",
            short_id(card.id),
            truncate(&card.front, side_width),
            truncate(&card.back, side_width),
            truncate(&tags, tags_width),
            side_w = side_width
        );
    }

    println!("\n{} cards total", cards.len());
}
