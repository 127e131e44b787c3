//! Storage operations for flashcards
//!
//! Decks, cards and review states live in one SQLite database:
//! ```text
//! decks          id, name, description, color, card_count, created_at, updated_at
//! cards          id, deck_id, front, back, tags (JSON array), created_at
//! review_states  card_id, ease_factor, interval_days, repetitions, next_review, last_review
//! ```
//! Timestamps are RFC 3339 strings with nanosecond precision, so text order
//! matches time order.
//!
//! Every mutation that touches more than one table runs in a single
//! transaction: a card never exists without its review state, and a deck's
//! `card_count` always matches its cards.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::models::*;
use super::store::{FlashcardStore, Result, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS decks (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    color TEXT NOT NULL,
    card_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cards (
    id TEXT PRIMARY KEY,
    deck_id TEXT NOT NULL,
    front TEXT NOT NULL,
    back TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS review_states (
    card_id TEXT PRIMARY KEY,
    ease_factor REAL NOT NULL,
    interval_days INTEGER NOT NULL,
    repetitions INTEGER NOT NULL,
    next_review TEXT NOT NULL,
    last_review TEXT
);

CREATE INDEX IF NOT EXISTS idx_cards_deck_id ON cards(deck_id);
CREATE INDEX IF NOT EXISTS idx_review_states_next_review ON review_states(next_review);
"#;

const DECK_COLUMNS: &str = "id, name, description, color, card_count, created_at, updated_at";
const CARD_COLUMNS: &str = "id, deck_id, front, back, tags, created_at";
const STATE_COLUMNS: &str =
    "card_id, ease_factor, interval_days, repetitions, next_review, last_review";

/// SQLite-backed store for decks, cards and review states
pub struct FlashcardStorage {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl FlashcardStorage {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        log::debug!("Opening flashcard database at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// A private database that disappears when dropped
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
        })
    }

    /// Use `clock` for creation and update timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    // ==================== Deck Operations ====================

    /// List all decks, newest first
    pub fn list_decks(&self) -> Result<Vec<Deck>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM decks ORDER BY created_at DESC, rowid DESC",
            DECK_COLUMNS
        ))?;
        let decks = stmt
            .query_map([], deck_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(decks)
    }

    /// Get a specific deck
    pub fn get_deck(&self, deck_id: Uuid) -> Result<Deck> {
        let conn = self.conn()?;
        fetch_deck(&conn, deck_id)?.ok_or(StoreError::DeckNotFound(deck_id))
    }

    /// Create a new, empty deck
    pub fn create_deck(&self, new_deck: NewDeck) -> Result<Deck> {
        let name = new_deck.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::InvalidData("deck name cannot be empty".into()));
        }

        let mut deck = Deck::new(name, self.clock.now());
        deck.description = new_deck.description;
        if let Some(color) = new_deck.color {
            deck.color = color;
        }

        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO decks ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)", DECK_COLUMNS),
            params![
                deck.id.to_string(),
                deck.name,
                deck.description,
                deck.color,
                deck.card_count as i64,
                timestamp(deck.created_at),
                timestamp(deck.updated_at),
            ],
        )?;

        log::info!("Created deck '{}' ({})", deck.name, deck.id);
        Ok(deck)
    }

    /// Update a deck's name, description or color
    pub fn update_deck(&self, deck_id: Uuid, update: DeckUpdate) -> Result<Deck> {
        let conn = self.conn()?;
        let mut deck = fetch_deck(&conn, deck_id)?.ok_or(StoreError::DeckNotFound(deck_id))?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(StoreError::InvalidData("deck name cannot be empty".into()));
            }
            deck.name = name;
        }
        if let Some(description) = update.description {
            deck.description = description;
        }
        if let Some(color) = update.color {
            deck.color = color;
        }
        deck.updated_at = self.clock.now();

        conn.execute(
            "UPDATE decks SET name = ?2, description = ?3, color = ?4, updated_at = ?5 WHERE id = ?1",
            params![
                deck.id.to_string(),
                deck.name,
                deck.description,
                deck.color,
                timestamp(deck.updated_at),
            ],
        )?;

        Ok(deck)
    }

    /// Delete a deck with all its cards and their review states
    pub fn delete_deck(&self, deck_id: Uuid) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let id = deck_id.to_string();
        tx.execute(
            "DELETE FROM review_states WHERE card_id IN (SELECT id FROM cards WHERE deck_id = ?1)",
            params![id],
        )?;
        let cards = tx.execute("DELETE FROM cards WHERE deck_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM decks WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::DeckNotFound(deck_id));
        }

        tx.commit()?;
        log::info!("Deleted deck {} and {} cards", deck_id, cards);
        Ok(())
    }

    // ==================== Card Operations ====================

    /// List cards in a deck, or in every deck, oldest first. Cards created
    /// at the same instant come back in insertion order.
    pub fn list_cards(&self, deck_id: Option<Uuid>) -> Result<Vec<Card>> {
        let conn = self.conn()?;
        let cards = match deck_id {
            Some(deck_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM cards WHERE deck_id = ?1 ORDER BY created_at, rowid",
                    CARD_COLUMNS
                ))?;
                let rows = stmt.query_map(params![deck_id.to_string()], card_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM cards ORDER BY created_at, rowid",
                    CARD_COLUMNS
                ))?;
                let rows = stmt.query_map([], card_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(cards)
    }

    /// Get a specific card
    pub fn get_card(&self, card_id: Uuid) -> Result<Card> {
        let conn = self.conn()?;
        fetch_card(&conn, card_id)?.ok_or(StoreError::CardNotFound(card_id))
    }

    /// Get a card together with its review state
    pub fn get_card_with_state(&self, card_id: Uuid) -> Result<CardWithState> {
        let conn = self.conn()?;
        let card = fetch_card(&conn, card_id)?.ok_or(StoreError::CardNotFound(card_id))?;
        let state = fetch_state(&conn, card_id)?.ok_or(StoreError::MissingReviewState(card_id))?;
        Ok(CardWithState { card, state })
    }

    /// Create a card and its initial review state
    ///
    /// The card, its state and the deck's card count are written in one
    /// transaction. The new card is due immediately.
    pub fn create_card(
        &self,
        deck_id: Uuid,
        front: String,
        back: String,
        tags: Vec<String>,
    ) -> Result<Card> {
        let now = self.clock.now();
        let mut card = Card::new(deck_id, front, back, now);
        card.tags = tags;
        let state = ReviewState::initial(card.id, now);

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if fetch_deck(&tx, deck_id)?.is_none() {
            return Err(StoreError::DeckNotFound(deck_id));
        }

        tx.execute(
            &format!("INSERT INTO cards ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)", CARD_COLUMNS),
            params![
                card.id.to_string(),
                card.deck_id.to_string(),
                card.front,
                card.back,
                serde_json::to_string(&card.tags)?,
                timestamp(card.created_at),
            ],
        )?;
        write_state(&tx, &state)?;
        refresh_card_count(&tx, deck_id, now)?;

        tx.commit()?;
        log::info!("Created card {} in deck {}", card.id, deck_id);
        Ok(card)
    }

    /// Edit a card's content. Its review state is left alone.
    pub fn update_card(&self, card_id: Uuid, update: CardUpdate) -> Result<Card> {
        let conn = self.conn()?;
        let mut card = fetch_card(&conn, card_id)?.ok_or(StoreError::CardNotFound(card_id))?;

        if let Some(front) = update.front {
            card.front = front;
        }
        if let Some(back) = update.back {
            card.back = back;
        }
        if let Some(tags) = update.tags {
            card.tags = tags;
        }

        conn.execute(
            "UPDATE cards SET front = ?2, back = ?3, tags = ?4 WHERE id = ?1",
            params![
                card.id.to_string(),
                card.front,
                card.back,
                serde_json::to_string(&card.tags)?,
            ],
        )?;

        Ok(card)
    }

    /// Delete a card and its review state
    pub fn delete_card(&self, card_id: Uuid) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let card = fetch_card(&tx, card_id)?.ok_or(StoreError::CardNotFound(card_id))?;
        tx.execute(
            "DELETE FROM review_states WHERE card_id = ?1",
            params![card_id.to_string()],
        )?;
        tx.execute("DELETE FROM cards WHERE id = ?1", params![card_id.to_string()])?;
        refresh_card_count(&tx, card.deck_id, self.clock.now())?;

        tx.commit()?;
        log::info!("Deleted card {} from deck {}", card_id, card.deck_id);
        Ok(())
    }

    // ==================== State Operations ====================

    fn load_review_state(&self, card_id: Uuid) -> Result<Option<ReviewState>> {
        let conn = self.conn()?;
        fetch_state(&conn, card_id)
    }

    fn save_review_state(&self, card_id: Uuid, state: &ReviewState) -> Result<()> {
        if state.card_id != card_id {
            return Err(StoreError::InvalidData(format!(
                "review state for card {} written under card {}",
                state.card_id, card_id
            )));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        if fetch_card(&tx, card_id)?.is_none() {
            return Err(StoreError::CardNotFound(card_id));
        }
        write_state(&tx, state)?;
        tx.commit()?;
        Ok(())
    }
}

#[async_trait]
impl FlashcardStore for FlashcardStorage {
    async fn get_review_state(&self, card_id: Uuid) -> Result<Option<ReviewState>> {
        self.load_review_state(card_id)
    }

    async fn put_review_state(&self, card_id: Uuid, state: &ReviewState) -> Result<()> {
        self.save_review_state(card_id, state)
    }

    async fn query_cards_by_deck(&self, deck_id: Option<Uuid>) -> Result<Vec<Card>> {
        self.list_cards(deck_id)
    }
}

// ==================== Row helpers ====================

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| conversion_error(idx, e))
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn optional_time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|text| {
        DateTime::parse_from_rfc3339(&text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn deck_from_row(row: &Row<'_>) -> rusqlite::Result<Deck> {
    let card_count: i64 = row.get(4)?;
    Ok(Deck {
        id: uuid_column(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        color: row.get(3)?,
        card_count: card_count.max(0) as usize,
        created_at: time_column(row, 5)?,
        updated_at: time_column(row, 6)?,
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    let tags: String = row.get(4)?;
    Ok(Card {
        id: uuid_column(row, 0)?,
        deck_id: uuid_column(row, 1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        tags: serde_json::from_str(&tags).map_err(|e| conversion_error(4, e))?,
        created_at: time_column(row, 5)?,
    })
}

fn state_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewState> {
    Ok(ReviewState {
        card_id: uuid_column(row, 0)?,
        ease_factor: row.get(1)?,
        interval: row.get(2)?,
        repetitions: row.get(3)?,
        next_review: time_column(row, 4)?,
        last_review: optional_time_column(row, 5)?,
    })
}

fn fetch_deck(conn: &Connection, deck_id: Uuid) -> Result<Option<Deck>> {
    let deck = conn
        .query_row(
            &format!("SELECT {} FROM decks WHERE id = ?1", DECK_COLUMNS),
            params![deck_id.to_string()],
            deck_from_row,
        )
        .optional()?;
    Ok(deck)
}

fn fetch_card(conn: &Connection, card_id: Uuid) -> Result<Option<Card>> {
    let card = conn
        .query_row(
            &format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS),
            params![card_id.to_string()],
            card_from_row,
        )
        .optional()?;
    Ok(card)
}

fn fetch_state(conn: &Connection, card_id: Uuid) -> Result<Option<ReviewState>> {
    let state = conn
        .query_row(
            &format!("SELECT {} FROM review_states WHERE card_id = ?1", STATE_COLUMNS),
            params![card_id.to_string()],
            state_from_row,
        )
        .optional()?;
    Ok(state)
}

fn write_state(tx: &Transaction<'_>, state: &ReviewState) -> Result<()> {
    tx.execute(
        &format!(
            "INSERT INTO review_states ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(card_id) DO UPDATE SET
                ease_factor = excluded.ease_factor,
                interval_days = excluded.interval_days,
                repetitions = excluded.repetitions,
                next_review = excluded.next_review,
                last_review = excluded.last_review",
            STATE_COLUMNS
        ),
        params![
            state.card_id.to_string(),
            state.ease_factor,
            state.interval,
            state.repetitions,
            timestamp(state.next_review),
            state.last_review.map(timestamp),
        ],
    )?;
    Ok(())
}

fn refresh_card_count(tx: &Transaction<'_>, deck_id: Uuid, now: DateTime<Utc>) -> Result<()> {
    tx.execute(
        "UPDATE decks SET
            card_count = (SELECT COUNT(*) FROM cards WHERE deck_id = ?1),
            updated_at = ?2
         WHERE id = ?1",
        params![deck_id.to_string(), timestamp(now)],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::clock::ManualClock;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 8, 0, 0).unwrap()
    }

    fn create_test_storage() -> (FlashcardStorage, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let storage = FlashcardStorage::open_in_memory()
            .unwrap()
            .with_clock(clock.clone());
        (storage, clock)
    }

    fn deck(storage: &FlashcardStorage, name: &str) -> Deck {
        storage
            .create_deck(NewDeck {
                name: name.to_string(),
                ..Default::default()
            })
            .unwrap()
    }

    fn card(storage: &FlashcardStorage, deck_id: Uuid, front: &str) -> Card {
        storage
            .create_card(deck_id, front.to_string(), format!("{} back", front), Vec::new())
            .unwrap()
    }

    #[test]
    fn test_create_and_get_deck() {
        let (storage, _clock) = create_test_storage();

        let created = storage
            .create_deck(NewDeck {
                name: "  Kanji  ".to_string(),
                description: Some("N5 set".to_string()),
                color: Some("#8b5cf6".to_string()),
            })
            .unwrap();
        assert_eq!(created.name, "Kanji");
        assert_eq!(created.card_count, 0);

        let fetched = storage.get_deck(created.id).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_deck_defaults_color() {
        let (storage, _clock) = create_test_storage();
        assert_eq!(deck(&storage, "Rust").color, DEFAULT_DECK_COLOR);
    }

    #[test]
    fn test_empty_deck_name_rejected() {
        let (storage, _clock) = create_test_storage();
        let result = storage.create_deck(NewDeck {
            name: "   ".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_list_decks_newest_first() {
        let (storage, clock) = create_test_storage();
        deck(&storage, "First");
        clock.advance(Duration::minutes(1));
        deck(&storage, "Second");

        let names: Vec<String> = storage.list_decks().unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[test]
    fn test_same_timestamp_decks_newest_insert_first() {
        let (storage, _clock) = create_test_storage();
        for name in ["One", "Two", "Three"] {
            deck(&storage, name);
        }

        let names: Vec<String> = storage.list_decks().unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Three", "Two", "One"]);
    }

    #[test]
    fn test_same_timestamp_cards_keep_insertion_order() {
        let (storage, _clock) = create_test_storage();
        let a = deck(&storage, "A");
        let b = deck(&storage, "B");

        let mut expected = Vec::new();
        for i in 0..12 {
            let deck_id = if i % 3 == 0 { b.id } else { a.id };
            expected.push((deck_id, card(&storage, deck_id, &format!("card {}", i)).id));
        }

        let ids = |deck_id| -> Vec<Uuid> {
            storage.list_cards(deck_id).unwrap().iter().map(|c| c.id).collect()
        };

        let expected_a: Vec<Uuid> = expected
            .iter()
            .filter(|(d, _)| *d == a.id)
            .map(|(_, id)| *id)
            .collect();
        assert_eq!(ids(Some(a.id)), expected_a);

        let all = ids(None);
        let expected_all: Vec<Uuid> = expected.iter().map(|(_, id)| *id).collect();
        assert_eq!(all, expected_all);
    }

    #[test]
    fn test_card_order_survives_edit() {
        let (storage, _clock) = create_test_storage();
        let d = deck(&storage, "D");
        let first = card(&storage, d.id, "first");
        let second = card(&storage, d.id, "second");

        let edit = CardUpdate {
            front: Some("edited".to_string()),
            ..Default::default()
        };
        storage.update_card(first.id, edit).unwrap();

        let ids: Vec<Uuid> = storage.list_cards(Some(d.id)).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn test_update_deck() {
        let (storage, clock) = create_test_storage();
        let created = deck(&storage, "Old");
        clock.advance(Duration::hours(1));

        let updated = storage
            .update_deck(
                created.id,
                DeckUpdate {
                    name: Some("New".to_string()),
                    description: Some(Some("desc".to_string())),
                    color: None,
                },
            )
            .unwrap();

        assert_eq!(updated.name, "New");
        assert_eq!(updated.description.as_deref(), Some("desc"));
        assert_eq!(updated.color, created.color);
        assert_eq!(updated.updated_at, start() + Duration::hours(1));
        assert_eq!(storage.get_deck(created.id).unwrap(), updated);
    }

    #[test]
    fn test_missing_deck() {
        let (storage, _clock) = create_test_storage();
        let id = Uuid::new_v4();
        assert!(matches!(storage.get_deck(id), Err(StoreError::DeckNotFound(d)) if d == id));
        assert!(matches!(storage.delete_deck(id), Err(StoreError::DeckNotFound(_))));
    }

    #[test]
    fn test_create_card_creates_due_state_and_counts() {
        let (storage, _clock) = create_test_storage();
        let d = deck(&storage, "Capitals");

        let c = storage
            .create_card(
                d.id,
                "France".to_string(),
                "Paris".to_string(),
                vec!["europe".to_string()],
            )
            .unwrap();

        let with_state = storage.get_card_with_state(c.id).unwrap();
        assert_eq!(with_state.card, c);
        assert_eq!(with_state.state, ReviewState::initial(c.id, start()));
        assert_eq!(storage.get_deck(d.id).unwrap().card_count, 1);
    }

    #[test]
    fn test_create_card_in_missing_deck_writes_nothing() {
        let (storage, _clock) = create_test_storage();
        let result = storage.create_card(Uuid::new_v4(), "q".into(), "a".into(), Vec::new());

        assert!(matches!(result, Err(StoreError::DeckNotFound(_))));
        assert!(storage.list_cards(None).unwrap().is_empty());
    }

    #[test]
    fn test_card_count_tracks_creates_and_deletes() {
        let (storage, _clock) = create_test_storage();
        let a = deck(&storage, "A");
        let b = deck(&storage, "B");

        let a1 = card(&storage, a.id, "a1");
        card(&storage, a.id, "a2");
        card(&storage, b.id, "b1");
        assert_eq!(storage.get_deck(a.id).unwrap().card_count, 2);
        assert_eq!(storage.get_deck(b.id).unwrap().card_count, 1);

        storage.delete_card(a1.id).unwrap();
        assert_eq!(storage.get_deck(a.id).unwrap().card_count, 1);
        assert_eq!(storage.get_deck(b.id).unwrap().card_count, 1);
    }

    #[tokio::test]
    async fn test_delete_card_removes_state() {
        let (storage, _clock) = create_test_storage();
        let d = deck(&storage, "A");
        let c = card(&storage, d.id, "q");

        storage.delete_card(c.id).unwrap();

        assert!(matches!(storage.get_card(c.id), Err(StoreError::CardNotFound(_))));
        assert!(storage.get_review_state(c.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_deck_cascades() {
        let (storage, _clock) = create_test_storage();
        let doomed = deck(&storage, "Doomed");
        let kept = deck(&storage, "Kept");
        let c1 = card(&storage, doomed.id, "one");
        let c2 = card(&storage, kept.id, "two");

        storage.delete_deck(doomed.id).unwrap();

        assert!(storage.get_review_state(c1.id).await.unwrap().is_none());
        assert!(storage.get_review_state(c2.id).await.unwrap().is_some());
        let remaining = storage.list_cards(None).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, c2.id);
        assert_eq!(storage.list_decks().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_card_keeps_state() {
        let (storage, clock) = create_test_storage();
        let d = deck(&storage, "A");
        let c = card(&storage, d.id, "q");

        let mut state = storage.get_review_state(c.id).await.unwrap().unwrap();
        state.repetitions = 2;
        state.interval = 6;
        storage.put_review_state(c.id, &state).await.unwrap();
        clock.advance(Duration::days(1));

        let updated = storage
            .update_card(
                c.id,
                CardUpdate {
                    back: Some("better answer".to_string()),
                    tags: Some(vec!["fixed".to_string()]),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.front, "q");
        assert_eq!(updated.back, "better answer");
        assert_eq!(storage.get_card(c.id).unwrap(), updated);
        assert_eq!(storage.get_review_state(c.id).await.unwrap().unwrap(), state);
    }

    #[tokio::test]
    async fn test_put_review_state_overwrites() {
        let (storage, _clock) = create_test_storage();
        let d = deck(&storage, "A");
        let c = card(&storage, d.id, "q");

        let state = ReviewState {
            card_id: c.id,
            ease_factor: 2.36,
            interval: 15,
            repetitions: 3,
            next_review: start() + Duration::days(15),
            last_review: Some(start()),
        };
        storage.put_review_state(c.id, &state).await.unwrap();

        assert_eq!(storage.get_review_state(c.id).await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_put_review_state_for_unknown_card() {
        let (storage, _clock) = create_test_storage();
        let id = Uuid::new_v4();
        let result = storage.put_review_state(id, &ReviewState::initial(id, start())).await;
        assert!(matches!(result, Err(StoreError::CardNotFound(_))));
    }

    #[tokio::test]
    async fn test_put_review_state_rejects_mismatched_id() {
        let (storage, _clock) = create_test_storage();
        let d = deck(&storage, "A");
        let c = card(&storage, d.id, "q");

        let other = ReviewState::initial(Uuid::new_v4(), start());
        let result = storage.put_review_state(c.id, &other).await;
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_query_cards_by_deck() {
        let (storage, clock) = create_test_storage();
        let a = deck(&storage, "A");
        let b = deck(&storage, "B");
        let a1 = card(&storage, a.id, "a1");
        clock.advance(Duration::seconds(1));
        let b1 = card(&storage, b.id, "b1");
        clock.advance(Duration::seconds(1));
        let a2 = card(&storage, a.id, "a2");

        let in_a: Vec<Uuid> = storage
            .query_cards_by_deck(Some(a.id))
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(in_a, vec![a1.id, a2.id]);

        let all: Vec<Uuid> = storage
            .query_cards_by_deck(None)
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(all, vec![a1.id, b1.id, a2.id]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("cards.db");

        let (deck_id, card_id) = {
            let storage = FlashcardStorage::open(&path).unwrap();
            let d = deck(&storage, "Persistent");
            let c = card(&storage, d.id, "q");
            (d.id, c.id)
        };

        let reopened = FlashcardStorage::open(&path).unwrap();
        assert_eq!(reopened.get_deck(deck_id).unwrap().card_count, 1);
        assert_eq!(reopened.get_card(card_id).unwrap().front, "q");
        assert!(reopened.get_card_with_state(card_id).is_ok());
    }
}
