//! Flashcard spaced repetition engine
//!
//! This module provides:
//! - Deck and card storage with one review state per card
//! - SM-2 spaced repetition algorithm
//! - Due-card queries and review statistics
//! - Review sessions that persist each rating

pub mod algorithm;
pub mod clock;
pub mod due;
pub mod models;
pub mod session;
pub mod stats;
pub mod storage;
pub mod store;

pub use algorithm::{calculate_next, estimated_intervals, format_interval, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR};
pub use clock::{Clock, ManualClock, SystemClock};
pub use due::{due_counts_by_deck, get_due_cards, DueCards};
pub use models::*;
pub use session::{RatedCard, ReviewSession, SessionError, SessionState, SessionSummary, Side};
pub use stats::review_stats;
pub use storage::FlashcardStorage;
pub use store::{FlashcardStore, StoreError};
