//! Data models for the flashcard system

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Color given to decks created without one
pub const DEFAULT_DECK_COLOR: &str = "#06b6d4";

/// Ease factor every new card starts with
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// A deck is a named collection of flashcards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_deck_color")]
    pub color: String,
    /// Number of cards referencing this deck. Maintained by the store.
    #[serde(default)]
    pub card_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_deck_color() -> String {
    DEFAULT_DECK_COLOR.to_string()
}

impl Deck {
    pub fn new(name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            color: default_deck_color(),
            card_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields accepted when creating a deck
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeck {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial update of a deck. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
}

/// A flashcard with question (front) and answer (back)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(deck_id: Uuid, front: String, back: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            deck_id,
            front,
            back,
            tags: Vec::new(),
            created_at: now,
        }
    }
}

/// Partial update of a card's content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUpdate {
    pub front: Option<String>,
    pub back: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// The three numbers SM-2 carries from one review to the next
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingParams {
    pub ease_factor: f64,
    /// Current interval in days
    pub interval: u32,
    /// Consecutive successful reviews since the last failure
    pub repetitions: u32,
}

impl Default for SchedulingParams {
    fn default() -> Self {
        Self {
            ease_factor: INITIAL_EASE_FACTOR,
            interval: 0,
            repetitions: 0,
        }
    }
}

/// Spaced repetition state for a card. Exactly one exists per card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub card_id: Uuid,
    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
    /// When the card is due for review
    pub next_review: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
}

impl ReviewState {
    /// State of a freshly created card: due immediately
    pub fn initial(card_id: Uuid, now: DateTime<Utc>) -> Self {
        let params = SchedulingParams::default();
        Self {
            card_id,
            ease_factor: params.ease_factor,
            interval: params.interval,
            repetitions: params.repetitions,
            next_review: now,
            last_review: None,
        }
    }

    pub fn params(&self) -> SchedulingParams {
        SchedulingParams {
            ease_factor: self.ease_factor,
            interval: self.interval,
            repetitions: self.repetitions,
        }
    }

    /// Check if the card is due at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }
}

/// SM-2 recall quality on the 0-5 scale
///
/// Construction clamps and rounds, so every value is in range:
/// - 0: Complete blackout, no recall
/// - 1: Incorrect, but upon seeing answer, remembered
/// - 2: Incorrect, but answer seemed easy to recall
/// - 3: Correct response with serious difficulty
/// - 4: Correct response after hesitation
/// - 5: Perfect response with no hesitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    /// Lowest quality that counts as a successful recall
    pub const PASSING: Quality = Quality(3);

    /// Clamp to `[0, 5]` and round. NaN maps to 0.
    pub fn clamped(raw: f64) -> Self {
        // `as` saturates and maps NaN to 0
        Self(raw.clamp(0.0, f64::from(Self::MAX)).round() as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_passing(self) -> bool {
        self >= Self::PASSING
    }
}

impl From<f64> for Quality {
    fn from(raw: f64) -> Self {
        Self::clamped(raw)
    }
}

impl From<i32> for Quality {
    fn from(raw: i32) -> Self {
        Self(raw.clamp(0, i32::from(Self::MAX)) as u8)
    }
}

impl From<u8> for Quality {
    fn from(raw: u8) -> Self {
        Self(raw.min(Self::MAX))
    }
}

impl From<Rating> for Quality {
    fn from(rating: Rating) -> Self {
        rating.quality()
    }
}

/// The four answers offered to the learner after revealing a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Canonical SM-2 quality for this rating
    pub fn quality(self) -> Quality {
        match self {
            Rating::Again => Quality(1),
            Rating::Hard => Quality(3),
            Rating::Good => Quality(4),
            Rating::Easy => Quality(5),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown rating '{0}' (expected again, hard, good, easy or 1-4)")]
pub struct ParseRatingError(pub String);

impl FromStr for Rating {
    type Err = ParseRatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "again" => Ok(Rating::Again),
            "2" | "hard" => Ok(Rating::Hard),
            "3" | "good" => Ok(Rating::Good),
            "4" | "easy" => Ok(Rating::Easy),
            other => Err(ParseRatingError(other.to_string())),
        }
    }
}

/// Output of one scheduling step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingResult {
    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
}

impl SchedulingResult {
    /// The review state to persist for `card_id` after a review at `reviewed_at`
    pub fn into_state(self, card_id: Uuid, reviewed_at: DateTime<Utc>) -> ReviewState {
        ReviewState {
            card_id,
            ease_factor: self.ease_factor,
            interval: self.interval,
            repetitions: self.repetitions,
            next_review: self.next_review,
            last_review: Some(reviewed_at),
        }
    }
}

/// Interval in days each rating would produce, for previewing before rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedIntervals {
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl EstimatedIntervals {
    pub fn get(&self, rating: Rating) -> u32 {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }
}

/// Statistics for a deck or all decks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    /// Never reviewed
    pub new_cards: usize,
    /// Reviewed, fewer than two consecutive successes
    pub learning_cards: usize,
    /// Two or more consecutive successes
    pub review_cards: usize,
    pub due_cards: usize,
}

/// A card with its current state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardWithState {
    pub card: Card,
    pub state: ReviewState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_clamps_and_rounds() {
        assert_eq!(Quality::from(-3).value(), 0);
        assert_eq!(Quality::from(9).value(), 5);
        assert_eq!(Quality::from(3.6).value(), 4);
        assert_eq!(Quality::from(2.4).value(), 2);
        assert_eq!(Quality::from(f64::NAN).value(), 0);
        assert_eq!(Quality::from(f64::INFINITY).value(), 5);
        assert_eq!(Quality::from(200u8).value(), 5);
    }

    #[test]
    fn test_passing_threshold() {
        assert!(!Quality::from(2).is_passing());
        assert!(Quality::from(3).is_passing());
        assert!(Quality::from(5).is_passing());
    }

    #[test]
    fn test_rating_to_quality() {
        assert_eq!(Rating::Again.quality().value(), 1);
        assert_eq!(Rating::Hard.quality().value(), 3);
        assert_eq!(Rating::Good.quality().value(), 4);
        assert_eq!(Rating::Easy.quality().value(), 5);
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!("good".parse::<Rating>().unwrap(), Rating::Good);
        assert_eq!(" EASY ".parse::<Rating>().unwrap(), Rating::Easy);
        assert_eq!("1".parse::<Rating>().unwrap(), Rating::Again);
        assert_eq!("2".parse::<Rating>().unwrap(), Rating::Hard);
        assert!("5".parse::<Rating>().is_err());
        assert!("meh".parse::<Rating>().is_err());
    }

    #[test]
    fn test_initial_state_is_due_immediately() {
        let now = Utc::now();
        let state = ReviewState::initial(Uuid::new_v4(), now);

        assert_eq!(state.ease_factor, 2.5);
        assert_eq!(state.interval, 0);
        assert_eq!(state.repetitions, 0);
        assert!(state.last_review.is_none());
        assert!(state.is_due(now));
    }

    #[test]
    fn test_review_state_serializes_camel_case() {
        let state = ReviewState::initial(Uuid::nil(), Utc::now());
        let json = serde_json::to_value(&state).unwrap();

        assert!(json.get("easeFactor").is_some());
        assert!(json.get("nextReview").is_some());
        assert!(json.get("lastReview").is_none());
    }
}
