//! Due-card query
//!
//! A card is due once its review state's `next_review` is at or before now.

use std::collections::HashMap;

use uuid::Uuid;

use super::clock::Clock;
use super::models::{Card, CardWithState};
use super::store::{FlashcardStore, Result, StoreError};

/// Snapshot of the cards due at query time
///
/// Sorted oldest-due first; cards due at the same instant keep the store's
/// order. Iterating consumes the snapshot.
#[derive(Debug)]
pub struct DueCards {
    cards: std::vec::IntoIter<Card>,
}

impl DueCards {
    pub fn ids(&self) -> Vec<Uuid> {
        self.cards.as_slice().iter().map(|c| c.id).collect()
    }

    pub fn as_slice(&self) -> &[Card] {
        self.cards.as_slice()
    }
}

impl Iterator for DueCards {
    type Item = Card;

    fn next(&mut self) -> Option<Card> {
        self.cards.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cards.size_hint()
    }
}

impl ExactSizeIterator for DueCards {}

/// Pair every card in scope with its review state
///
/// A card without a review state is a data-integrity error, never skipped.
pub(crate) async fn cards_with_states(
    store: &dyn FlashcardStore,
    deck_id: Option<Uuid>,
) -> Result<Vec<CardWithState>> {
    let cards = store.query_cards_by_deck(deck_id).await?;
    let mut paired = Vec::with_capacity(cards.len());

    for card in cards {
        let state = match store.get_review_state(card.id).await? {
            Some(state) => state,
            None => {
                log::warn!("Card {} in deck {} has no review state", card.id, card.deck_id);
                return Err(StoreError::MissingReviewState(card.id));
            }
        };
        paired.push(CardWithState { card, state });
    }

    Ok(paired)
}

/// Cards due now, in one deck or across all decks
pub async fn get_due_cards(
    store: &dyn FlashcardStore,
    clock: &dyn Clock,
    deck_id: Option<Uuid>,
) -> Result<DueCards> {
    let now = clock.now();
    let mut due: Vec<CardWithState> = cards_with_states(store, deck_id)
        .await?
        .into_iter()
        .filter(|c| c.state.is_due(now))
        .collect();

    // Stable sort keeps store order among equal due dates
    due.sort_by_key(|c| c.state.next_review);

    log::debug!("{} cards due (deck: {:?})", due.len(), deck_id);

    let cards: Vec<Card> = due.into_iter().map(|c| c.card).collect();
    Ok(DueCards {
        cards: cards.into_iter(),
    })
}

/// Number of due cards per deck. Decks with nothing due are absent.
pub async fn due_counts_by_deck(
    store: &dyn FlashcardStore,
    clock: &dyn Clock,
) -> Result<HashMap<Uuid, usize>> {
    let mut counts = HashMap::new();
    for card in get_due_cards(store, clock, None).await? {
        *counts.entry(card.deck_id).or_insert(0) += 1;
    }
    Ok(counts)
}
