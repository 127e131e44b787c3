use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use cardwise_lib::config::Config;
use cardwise_lib::flashcards::{Card, Clock, Deck, FlashcardStorage, SystemClock};

/// Shared application state for CLI commands
pub struct App {
    pub config: Config,
    pub storage: Arc<FlashcardStorage>,
    pub clock: Arc<dyn Clock>,
}

impl App {
    /// Open the database named by the config, or `database` if given
    pub fn new(config: Config, database: Option<&Path>) -> Result<Self> {
        let path = match database {
            Some(path) => path.to_path_buf(),
            None => config.database_path().context("Failed to get database path")?,
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let storage = FlashcardStorage::open(&path)
            .with_context(|| format!("Failed to open database {}", path.display()))?
            .with_clock(Arc::clone(&clock));

        Ok(Self {
            config,
            storage: Arc::new(storage),
            clock,
        })
    }

    /// Find a deck by id or name (case-insensitive, exact match before prefix)
    pub fn find_deck(&self, name: &str) -> Result<Deck> {
        let decks = self.storage.list_decks().context("Failed to list decks")?;

        if let Ok(id) = Uuid::parse_str(name) {
            if let Some(deck) = decks.iter().find(|d| d.id == id) {
                return Ok(deck.clone());
            }
        }

        let name_lower = name.to_lowercase();

        // Exact match first
        if let Some(deck) = decks.iter().find(|d| d.name.to_lowercase() == name_lower) {
            return Ok(deck.clone());
        }

        // Prefix match
        let matches: Vec<&Deck> = decks
            .iter()
            .filter(|d| d.name.to_lowercase().starts_with(&name_lower))
            .collect();

        match matches.len() {
            0 => bail!(
                "No deck matching '{}'. Available decks:\n{}",
                name,
                deck_list(decks.iter())
            ),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous deck name '{}'. Matches:\n{}",
                name,
                deck_list(matches.into_iter())
            ),
        }
    }

    /// Resolve an optional deck argument to its id
    pub fn find_deck_id(&self, name: Option<&str>) -> Result<Option<Uuid>> {
        name.map(|n| self.find_deck(n).map(|d| d.id)).transpose()
    }

    /// Find a card by full id or unique id prefix
    pub fn find_card(&self, id: &str) -> Result<Card> {
        if let Ok(id) = Uuid::parse_str(id) {
            return self.storage.get_card(id).context("Failed to load card");
        }

        let prefix = id.to_lowercase();
        let cards = self.storage.list_cards(None).context("Failed to list cards")?;
        let mut matches = cards.into_iter().filter(|c| c.id.to_string().starts_with(&prefix));

        match (matches.next(), matches.next()) {
            (Some(card), None) => Ok(card),
            (None, _) => bail!("No card with id starting '{}'", id),
            (Some(_), Some(_)) => bail!("Ambiguous card id '{}'", id),
        }
    }
}

fn deck_list<'a>(decks: impl Iterator<Item = &'a Deck>) -> String {
    decks
        .map(|d| format!("  - {}", d.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shorten an id for table output
pub fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Truncate text to `width` characters for table output
pub fn truncate(text: &str, width: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() > width {
        let cut: String = single_line.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        single_line
    }
}
