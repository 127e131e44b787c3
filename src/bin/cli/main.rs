mod app;
mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use cardwise_lib::config::Config;

#[derive(Parser)]
#[command(name = "cardwise-cli", about = "Spaced-repetition flashcards", version)]
struct Cli {
    /// Config file (default: <config dir>/cardwise/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Manage decks
    #[command(subcommand)]
    Deck(DeckCommand),

    /// Manage cards
    #[command(subcommand)]
    Card(CardCommand),

    /// List cards due for review
    Due {
        /// Only this deck (name prefix or id)
        #[arg(long)]
        deck: Option<String>,
    },

    /// Review due cards interactively
    Review {
        /// Only this deck (name prefix or id)
        #[arg(long)]
        deck: Option<String>,
    },

    /// Show card counts by learning stage
    Stats {
        /// Only this deck (name prefix or id)
        #[arg(long)]
        deck: Option<String>,
    },

    /// Show the interval each rating would give a card
    Preview {
        /// Card id (or unique id prefix)
        card: String,
    },
}

#[derive(Subcommand)]
enum DeckCommand {
    /// Create a deck
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Hex color, e.g. "#8b5cf6"
        #[arg(long)]
        color: Option<String>,
    },

    /// List decks with card and due counts
    List,

    /// Show one deck
    Show {
        /// Deck name prefix or id
        deck: String,
    },

    /// Rename a deck
    Rename {
        /// Deck name prefix or id
        deck: String,
        name: String,
    },

    /// Delete a deck and all its cards
    Delete {
        /// Deck name prefix or id
        deck: String,
    },
}

#[derive(Subcommand)]
enum CardCommand {
    /// Add a card to a deck
    Add {
        /// Deck name prefix or id
        deck: String,
        front: String,
        back: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// List cards in a deck
    List {
        /// Deck name prefix or id
        deck: String,
    },

    /// Edit a card's content
    Edit {
        /// Card id (or unique id prefix)
        card: String,
        #[arg(long)]
        front: Option<String>,
        #[arg(long)]
        back: Option<String>,
        /// Comma-separated tags, replacing the existing ones
        #[arg(long)]
        tags: Option<String>,
    },

    /// Delete a card
    Delete {
        /// Card id (or unique id prefix)
        card: String,
    },
}

/// Split a comma-separated tag list
fn parse_tags(tags: Option<&str>) -> Option<Vec<String>> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.clone()),
    )
    .init();

    // One logical thread: the engine does no internal parallelism
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(cli, config))
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let app = app::App::new(config, cli.database.as_deref())?;
    let format = &cli.format;

    match cli.command {
        Command::Deck(subcmd) => match subcmd {
            DeckCommand::Create { name, description, color } => {
                commands::deck::run_create(&app, name, description, color, format)?;
            }
            DeckCommand::List => commands::deck::run_list(&app, format).await?,
            DeckCommand::Show { deck } => commands::deck::run_show(&app, &deck, format).await?,
            DeckCommand::Rename { deck, name } => {
                commands::deck::run_rename(&app, &deck, name, format)?;
            }
            DeckCommand::Delete { deck } => commands::deck::run_delete(&app, &deck)?,
        },
        Command::Card(subcmd) => match subcmd {
            CardCommand::Add { deck, front, back, tags } => {
                let tags = parse_tags(tags.as_deref()).unwrap_or_default();
                commands::card::run_add(&app, &deck, front, back, tags, format)?;
            }
            CardCommand::List { deck } => commands::card::run_list(&app, &deck, format)?,
            CardCommand::Edit { card, front, back, tags } => {
                let tags = parse_tags(tags.as_deref());
                commands::card::run_edit(&app, &card, front, back, tags, format)?;
            }
            CardCommand::Delete { card } => commands::card::run_delete(&app, &card)?,
        },
        Command::Due { deck } => commands::due::run(&app, deck.as_deref(), format).await?,
        Command::Review { deck } => commands::review::run(&app, deck.as_deref()).await?,
        Command::Stats { deck } => commands::stats::run(&app, deck.as_deref(), format).await?,
        Command::Preview { card } => commands::stats::run_preview(&app, &card, format)?,
    }

    Ok(())
}
