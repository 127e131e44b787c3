use anyhow::{Context, Result};

use cardwise_lib::flashcards::{due_counts_by_deck, review_stats, DeckUpdate, NewDeck};

use crate::app::{short_id, truncate, App};
use crate::OutputFormat;

pub fn run_create(
    app: &App,
    name: String,
    description: Option<String>,
    color: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let deck = app
        .storage
        .create_deck(NewDeck {
            name,
            description,
            color: Some(color.unwrap_or_else(|| app.config.default_deck_color.clone())),
        })
        .context("Failed to create deck")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deck)?),
        OutputFormat::Plain => println!("Created deck '{}' ({})", deck.name, deck.id),
    }
    Ok(())
}

pub async fn run_list(app: &App, format: &OutputFormat) -> Result<()> {
    let decks = app.storage.list_decks().context("Failed to list decks")?;
    let due = due_counts_by_deck(app.storage.as_ref(), app.clock.as_ref())
        .await
        .context("Failed to count due cards")?;

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = decks
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "id": d.id.to_string(),
                        "name": d.name,
                        "description": d.description,
                        "color": d.color,
                        "cardCount": d.card_count,
                        "dueCount": due.get(&d.id).copied().unwrap_or(0),
                        "updatedAt": d.updated_at.to_rfc3339(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if decks.is_empty() {
                println!("No decks found.");
                return Ok(());
            }

            let name_width = decks
                .iter()
                .map(|d| d.name.chars().count())
                .max()
                .unwrap_or(4)
                .clamp(4, 40);

            println!(
                "{:<8} {:<name_w$} {:>6} {:>6}",
                "Id",
                "Name",
                "Cards",
                "Due",
                name_w = name_width
            );
            println!(
                "{} {} {} {}",
                "\u{2500}".repeat(8),
                "\u{2500}".repeat(name_width),
                "\u{2500}".repeat(6),
                "\u{2500}".repeat(6)
            );

            for deck in &decks {
                println!(
                    "{:<8} {:<name_w$} {:>6} {:>6}",
                    short_id(deck.id),
                    truncate(&deck.name, name_width),
                    deck.card_count,
                    due.get(&deck.id).copied().unwrap_or(0),
                    name_w = name_width
                );
            }

            println!("\n{} decks total", decks.len());
        }
    }

    Ok(())
}

pub async fn run_show(app: &App, name: &str, format: &OutputFormat) -> Result<()> {
    let deck = app.find_deck(name)?;
    let stats = review_stats(app.storage.as_ref(), app.clock.as_ref(), Some(deck.id))
        .await
        .context("Failed to compute deck statistics")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "deck": deck, "stats": stats });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{} ({})", deck.name, deck.id);
            if let Some(description) = &deck.description {
                println!("{}", description);
            }
            println!("Color:    {}", deck.color);
            println!("Cards:    {}", deck.card_count);
            println!("Due now:  {}", stats.due_cards);
            println!("New:      {}", stats.new_cards);
            println!("Learning: {}", stats.learning_cards);
            println!("Review:   {}", stats.review_cards);
            println!("Created:  {}", deck.created_at.format("%Y-%m-%d"));
        }
    }

    Ok(())
}

pub fn run_rename(app: &App, name: &str, new_name: String, format: &OutputFormat) -> Result<()> {
    let deck = app.find_deck(name)?;
    let updated = app
        .storage
        .update_deck(
            deck.id,
            DeckUpdate {
                name: Some(new_name),
                ..Default::default()
            },
        )
        .context("Failed to rename deck")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&updated)?),
        OutputFormat::Plain => println!("Renamed '{}' to '{}'", deck.name, updated.name),
    }
    Ok(())
}

pub fn run_delete(app: &App, name: &str) -> Result<()> {
    let deck = app.find_deck(name)?;
    app.storage.delete_deck(deck.id).context("Failed to delete deck")?;
    println!("Deleted deck '{}' and its {} cards", deck.name, deck.card_count);
    Ok(())
}
