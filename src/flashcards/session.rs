//! Review session controller
//!
//! A session walks a list of cards fixed when the session is built:
//!
//! ```text
//! NotStarted -> Showing(0, Front) -> Showing(0, Back) -> Showing(1, Front) -> ... -> Finished
//! ```
//!
//! Cards that become due mid-session are not added, so a session always
//! terminates. Each rating is persisted before the session advances; a
//! rating that fails leaves the session on the same card, answer shown.
//! Abandoning a session keeps every rating already persisted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::algorithm::{calculate_next, estimated_intervals};
use super::clock::Clock;
use super::due::get_due_cards;
use super::models::{Card, EstimatedIntervals, Rating, ReviewState};
use super::store::{FlashcardStore, StoreError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Review already started")]
    AlreadyStarted,

    #[error("Review not started")]
    NotStarted,

    #[error("Answer must be revealed before rating")]
    AnswerHidden,

    #[error("Review finished")]
    Finished,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Which side of the current card is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionState {
    NotStarted,
    Showing { index: usize, side: Side },
    Finished,
}

/// A rating that was persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedCard {
    pub card_id: Uuid,
    pub rating: Rating,
    pub state: ReviewState,
}

/// Tally of a session so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total: usize,
    pub processed: usize,
    pub again: usize,
    pub hard: usize,
    pub good: usize,
    pub easy: usize,
}

impl SessionSummary {
    fn record(&mut self, rating: Rating) {
        self.processed += 1;
        match rating {
            Rating::Again => self.again += 1,
            Rating::Hard => self.hard += 1,
            Rating::Good => self.good += 1,
            Rating::Easy => self.easy += 1,
        }
    }
}

/// One learner's pass over a snapshot of cards
pub struct ReviewSession {
    store: Arc<dyn FlashcardStore>,
    clock: Arc<dyn Clock>,
    cards: Vec<Card>,
    state: SessionState,
    summary: SessionSummary,
}

impl ReviewSession {
    /// Session over exactly `cards`, in the given order
    pub fn new(
        store: Arc<dyn FlashcardStore>,
        clock: Arc<dyn Clock>,
        cards: impl IntoIterator<Item = Card>,
    ) -> Self {
        let cards: Vec<Card> = cards.into_iter().collect();
        let summary = SessionSummary {
            total: cards.len(),
            ..Default::default()
        };
        Self {
            store,
            clock,
            cards,
            state: SessionState::NotStarted,
            summary,
        }
    }

    /// Session over the cards due now, in one deck or all decks
    pub async fn for_due_cards(
        store: Arc<dyn FlashcardStore>,
        clock: Arc<dyn Clock>,
        deck_id: Option<Uuid>,
    ) -> Result<Self> {
        let due = get_due_cards(store.as_ref(), clock.as_ref(), deck_id).await?;
        Ok(Self::new(store, clock, due))
    }

    /// Show the first card, or finish at once if there is nothing to review
    pub fn start_review(&mut self) -> Result<()> {
        if self.state != SessionState::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }

        self.state = if self.cards.is_empty() {
            SessionState::Finished
        } else {
            SessionState::Showing {
                index: 0,
                side: Side::Front,
            }
        };
        log::info!("Review started with {} cards", self.cards.len());
        Ok(())
    }

    /// Reveal the answer. Does nothing unless a front is showing.
    pub fn flip(&mut self) {
        if let SessionState::Showing {
            index,
            side: Side::Front,
        } = self.state
        {
            self.state = SessionState::Showing {
                index,
                side: Side::Back,
            };
        }
    }

    /// Rate the current card, persist its new schedule, and move on
    ///
    /// On error the session stays on the same card with the answer shown.
    pub async fn rate(&mut self, rating: Rating) -> Result<RatedCard> {
        let index = match self.state {
            SessionState::Showing {
                index,
                side: Side::Back,
            } => index,
            SessionState::Showing {
                side: Side::Front, ..
            } => return Err(SessionError::AnswerHidden),
            SessionState::NotStarted => return Err(SessionError::NotStarted),
            SessionState::Finished => return Err(SessionError::Finished),
        };
        let card_id = self.cards[index].id;

        let prior = self.load_state(card_id).await?;
        let now = self.clock.now();
        let state = calculate_next(rating, &prior.params(), now).into_state(card_id, now);

        if let Err(err) = self.store.put_review_state(card_id, &state).await {
            log::warn!("Failed to save review of card {}: {}", card_id, err);
            return Err(err.into());
        }

        log::debug!(
            "Rated card {} {} -> next review in {} days",
            card_id,
            rating,
            state.interval
        );

        self.summary.record(rating);
        self.state = if index + 1 < self.cards.len() {
            SessionState::Showing {
                index: index + 1,
                side: Side::Front,
            }
        } else {
            log::info!("Review finished: {} cards", self.summary.processed);
            SessionState::Finished
        };

        Ok(RatedCard {
            card_id,
            rating,
            state,
        })
    }

    /// Interval each rating would give the current card
    pub async fn estimated_intervals(&self) -> Result<EstimatedIntervals> {
        let card = match self.current_card() {
            Some(card) => card,
            None if self.is_finished() => return Err(SessionError::Finished),
            None => return Err(SessionError::NotStarted),
        };
        let state = self.load_state(card.id).await?;
        Ok(estimated_intervals(&state.params()))
    }

    async fn load_state(&self, card_id: Uuid) -> Result<ReviewState> {
        match self.store.get_review_state(card_id).await? {
            Some(state) => Ok(state),
            None => {
                log::warn!("Card {} has no review state", card_id);
                Err(StoreError::MissingReviewState(card_id).into())
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.current_index().map(|i| &self.cards[i])
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            SessionState::Showing { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn current_side(&self) -> Option<Side> {
        match self.state {
            SessionState::Showing { side, .. } => Some(side),
            _ => None,
        }
    }

    /// Cards rated and persisted so far
    pub fn processed_count(&self) -> usize {
        self.summary.processed
    }

    pub fn total(&self) -> usize {
        self.cards.len()
    }

    pub fn remaining(&self) -> usize {
        self.total() - self.processed_count()
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
