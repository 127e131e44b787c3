//! Spaced-repetition scheduling for flashcards.
//!
//! [`flashcards`] holds the engine: the SM-2 scheduler, the card/deck store,
//! due-card queries and review sessions. [`config`] reads the settings file
//! used by the command-line host.

pub mod config;
pub mod flashcards;
