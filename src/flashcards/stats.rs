//! Review statistics for a deck or all decks

use uuid::Uuid;

use super::clock::Clock;
use super::due::cards_with_states;
use super::models::ReviewStats;
use super::store::{FlashcardStore, Result};

/// Count cards by learning stage
pub async fn review_stats(
    store: &dyn FlashcardStore,
    clock: &dyn Clock,
    deck_id: Option<Uuid>,
) -> Result<ReviewStats> {
    let now = clock.now();
    let cards = cards_with_states(store, deck_id).await?;

    let mut stats = ReviewStats {
        total_cards: cards.len(),
        ..Default::default()
    };

    for entry in &cards {
        let state = &entry.state;
        if state.last_review.is_none() {
            stats.new_cards += 1;
        } else if state.repetitions < 2 {
            stats.learning_cards += 1;
        } else {
            stats.review_cards += 1;
        }

        if state.is_due(now) {
            stats.due_cards += 1;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::due::tests::{deck_with_cards, setup, start};
    use chrono::Duration;

    #[tokio::test]
    async fn test_stats_by_stage() {
        let (storage, clock) = setup();
        let (deck, cards) = deck_with_cards(&storage, "A", 4);
        deck_with_cards(&storage, "B", 2);

        // learning: reviewed once
        let mut learning = storage.get_review_state(cards[0].id).await.unwrap().unwrap();
        learning.repetitions = 1;
        learning.interval = 1;
        learning.last_review = Some(start());
        learning.next_review = start() + Duration::days(1);
        storage.put_review_state(cards[0].id, &learning).await.unwrap();

        // review: two successes in a row
        let mut review = learning.clone();
        review.card_id = cards[1].id;
        review.repetitions = 2;
        review.interval = 6;
        review.next_review = start() + Duration::days(6);
        storage.put_review_state(cards[1].id, &review).await.unwrap();

        let stats = review_stats(storage.as_ref(), clock.as_ref(), Some(deck)).await.unwrap();
        assert_eq!(
            stats,
            ReviewStats {
                total_cards: 4,
                new_cards: 2,
                learning_cards: 1,
                review_cards: 1,
                due_cards: 2,
            }
        );

        let all = review_stats(storage.as_ref(), clock.as_ref(), None).await.unwrap();
        assert_eq!(all.total_cards, 6);
        assert_eq!(all.due_cards, 4);
    }

    #[tokio::test]
    async fn test_stats_for_empty_store() {
        let (storage, clock) = setup();
        let stats = review_stats(storage.as_ref(), clock.as_ref(), None).await.unwrap();
        assert_eq!(stats, ReviewStats::default());
    }
}
