use anyhow::{Context, Result};

use cardwise_lib::flashcards::{estimated_intervals, format_interval, review_stats, Rating};

use crate::app::App;
use crate::OutputFormat;

pub async fn run(app: &App, deck_name: Option<&str>, format: &OutputFormat) -> Result<()> {
    let deck_id = app.find_deck_id(deck_name)?;
    let stats = review_stats(app.storage.as_ref(), app.clock.as_ref(), deck_id)
        .await
        .context("Failed to compute statistics")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Plain => {
            println!("Total:    {}", stats.total_cards);
            println!("Due now:  {}", stats.due_cards);
            println!("New:      {}", stats.new_cards);
            println!("Learning: {}", stats.learning_cards);
            println!("Review:   {}", stats.review_cards);
        }
    }
    Ok(())
}

pub fn run_preview(app: &App, id: &str, format: &OutputFormat) -> Result<()> {
    let card = app.find_card(id)?;
    let with_state = app
        .storage
        .get_card_with_state(card.id)
        .context("Failed to load review state")?;
    let intervals = estimated_intervals(&with_state.state.params());

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "card": with_state.card,
                "state": with_state.state,
                "intervals": intervals,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let state = &with_state.state;
            println!("{}", with_state.card.front);
            println!(
                "Ease {:.2}, interval {}d, {} in a row, due {}",
                state.ease_factor,
                state.interval,
                state.repetitions,
                state.next_review.format("%Y-%m-%d %H:%M")
            );
            for rating in Rating::ALL {
                println!(
                    "  {:<6} {}",
                    rating.as_str(),
                    format_interval(intervals.get(rating))
                );
            }
        }
    }
    Ok(())
}
