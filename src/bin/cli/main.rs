mod app;
mod commands;
mod render;
#[cfg(feature = "tui")]
mod tui;

use std::io::IsTerminal;
use std::path::PathBuf;

use antor_lib::{CardStyle, SourceRequest};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "antor",
    about = "Generate Anki flashcards from a topic, a YouTube video or an article with a local Ollama model",
    version,
    args_conflicts_with_subcommands = true,
    after_help = "A topic that matches a subcommand name (decks, status, sync, tui) runs that \
                  subcommand. Put `--` before such a topic: antor -- status"
)]
struct Cli {
    /// Config file (default: <config dir>/antor/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(flatten)]
    generate: GenerateArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Args)]
struct GenerateArgs {
    /// Topic to generate flashcards about (use `antor -- <TOPIC>` for topics named like a subcommand)
    topic: Option<String>,

    /// Generate from a YouTube video's transcript (URL or video id)
    #[arg(long, conflicts_with_all = ["topic", "article"])]
    youtube: Option<String>,

    /// Generate from an article URL
    #[arg(long, conflicts_with_all = ["topic", "youtube"])]
    article: Option<String>,

    /// Card style: basic, eli5 or code (default from config)
    #[arg(long)]
    style: Option<CardStyle>,

    /// Target deck (default from config)
    #[arg(long)]
    deck: Option<String>,

    /// Add the new cards to Anki after the preview
    #[arg(long)]
    add: bool,

    /// Sync with AnkiWeb after adding
    #[arg(long, requires = "add")]
    sync: bool,
}

impl GenerateArgs {
    fn source(&self) -> Option<SourceRequest> {
        if let Some(url) = &self.youtube {
            Some(SourceRequest::Transcript(url.clone()))
        } else if let Some(url) = &self.article {
            Some(SourceRequest::Article(url.clone()))
        } else {
            self.topic.clone().map(SourceRequest::Topic)
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List Anki decks
    Decks,

    /// Check that Anki and Ollama are reachable
    Status,

    /// Sync the Anki collection with AnkiWeb
    Sync,

    /// Launch interactive TUI
    #[cfg(feature = "tui")]
    Tui,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let config_path = cli.config.as_deref();

    match cli.command {
        None => match cli.generate.source() {
            Some(request) => {
                let app = app::App::new(config_path)?;
                let options = commands::generate::GenerateOptions {
                    request,
                    style: cli.generate.style.unwrap_or(app.config.card_style),
                    deck: app.deck(cli.generate.deck.as_deref()),
                    add: cli.generate.add,
                    sync: cli.generate.sync,
                };
                commands::generate::run(&app, &options, &cli.format, use_color)?;
            }
            None => {
                // No topic, URL or subcommand → launch TUI
                #[cfg(feature = "tui")]
                {
                    tui::run(config_path)?;
                }
                #[cfg(not(feature = "tui"))]
                {
                    eprintln!("TUI not available (built without 'tui' feature). Give a topic or a subcommand.");
                    eprintln!("Run with --help for usage.");
                    std::process::exit(1);
                }
            }
        },
        Some(Command::Decks) => {
            let app = app::App::new(config_path)?;
            commands::decks::run(&app, &cli.format, use_color)?;
        }
        Some(Command::Status) => {
            let app = app::App::new(config_path)?;
            commands::status::run(&app, &cli.format, use_color)?;
        }
        Some(Command::Sync) => {
            let app = app::App::new(config_path)?;
            commands::sync::run(&app, &cli.format, use_color)?;
        }
        #[cfg(feature = "tui")]
        Some(Command::Tui) => {
            tui::run(config_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_dash_topic_named_like_subcommand() {
        let cli = Cli::try_parse_from(["antor", "--", "status"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.generate.topic.as_deref(), Some("status"));

        let cli = Cli::try_parse_from(["antor", "status"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Status)));
    }

    #[test]
    fn test_sync_flag_requires_add() {
        assert!(Cli::try_parse_from(["antor", "osmosis", "--sync"]).is_err());
        let cli = Cli::try_parse_from(["antor", "osmosis", "--add", "--sync"]).unwrap();
        assert!(cli.generate.add && cli.generate.sync);
    }
}
