//! Store adapter contract
//!
//! The scheduling engine only needs three operations from whatever holds
//! cards and review states. [`FlashcardStorage`](super::FlashcardStorage)
//! is the bundled SQLite implementation.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{Card, ReviewState};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deck not found: {0}")]
    DeckNotFound(Uuid),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    /// A card exists without its review state. Never defaulted: doing so
    /// would rewrite the card's scheduling history.
    #[error("Review state missing for card {0}")]
    MissingReviewState(Uuid),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Reads and writes the engine performs against the card store
#[async_trait]
pub trait FlashcardStore: Send + Sync {
    /// Review state of a card, or `None` if the store has none
    async fn get_review_state(&self, card_id: Uuid) -> Result<Option<ReviewState>>;

    /// Overwrite the review state of an existing card
    async fn put_review_state(&self, card_id: Uuid, state: &ReviewState) -> Result<()>;

    /// All cards of one deck, or of every deck when `deck_id` is `None`,
    /// in a stable order
    async fn query_cards_by_deck(&self, deck_id: Option<Uuid>) -> Result<Vec<Card>>;
}
