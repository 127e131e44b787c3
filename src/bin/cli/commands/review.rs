use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use cardwise_lib::flashcards::{
    format_interval, FlashcardStore, Rating, ReviewSession, SessionError, Side,
};

use crate::app::App;

enum Input {
    Line(String),
    Quit,
}

/// Read one line from stdin. EOF and "q" both quit.
fn prompt(message: &str) -> Result<Input> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    if read == 0 || line.eq_ignore_ascii_case("q") {
        return Ok(Input::Quit);
    }
    Ok(Input::Line(line.to_string()))
}

pub async fn run(app: &App, deck_name: Option<&str>) -> Result<()> {
    let deck_id = app.find_deck_id(deck_name)?;
    let store: Arc<dyn FlashcardStore> = app.storage.clone();
    let mut session = ReviewSession::for_due_cards(store, Arc::clone(&app.clock), deck_id)
        .await
        .context("Failed to load due cards")?;

    session.start_review()?;
    if session.is_finished() {
        println!("Nothing to review.");
        return Ok(());
    }

    let total = session.total();
    while let Some(card) = session.current_card().cloned() {
        let position = session.current_index().map_or(0, |i| i + 1);

        match session.current_side() {
            Some(Side::Front) => {
                println!("\n[{}/{}] {}", position, total, card.front);
                match prompt("Press Enter to show the answer (q to quit) ")? {
                    Input::Quit => break,
                    Input::Line(_) => session.flip(),
                }
            }
            Some(Side::Back) => {
                println!("\n{}", card.back);

                let hint = match session.estimated_intervals().await {
                    Ok(intervals) => Rating::ALL
                        .iter()
                        .enumerate()
                        .map(|(i, r)| {
                            format!("{} {} ({})", i + 1, r, format_interval(intervals.get(*r)))
                        })
                        .collect::<Vec<_>>()
                        .join("  "),
                    Err(err) => {
                        eprintln!("Cannot preview intervals: {}", err);
                        "1 again  2 hard  3 good  4 easy".to_string()
                    }
                };
                println!("{}", hint);

                let answer = match prompt("Rating (q to quit) ")? {
                    Input::Quit => break,
                    Input::Line(answer) => answer,
                };
                let rating = match answer.parse::<Rating>() {
                    Ok(rating) => rating,
                    Err(err) => {
                        eprintln!("{}", err);
                        continue;
                    }
                };

                match session.rate(rating).await {
                    Ok(rated) => {
                        println!("Next review in {}", format_interval(rated.state.interval))
                    }
                    Err(SessionError::Store(err)) => {
                        eprintln!(
                            "Could not save rating: {}. Rate again to retry, or q to quit.",
                            err
                        );
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            None => break,
        }
    }

    let summary = session.summary();
    if session.is_finished() {
        println!("\nReview complete: {} cards", summary.processed);
    } else {
        println!("\nReview stopped: {} of {} cards rated", summary.processed, summary.total);
    }
    println!(
        "again {}  hard {}  good {}  easy {}",
        summary.again, summary.hard, summary.good, summary.easy
    );

    Ok(())
}
