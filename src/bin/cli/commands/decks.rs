use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal::Color;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let decks = app.store().deck_names().context("Failed to list decks")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&decks)?);
        }
        OutputFormat::Plain => {
            if decks.is_empty() {
                println!("(no decks)");
            }
            for deck in &decks {
                let is_default = *deck == app.config.deck_name;
                match (is_default, use_color) {
                    (true, true) => println!("* {}{}{}", Color::BOLD, deck, Color::RESET),
                    (true, false) => println!("* {}", deck),
                    (false, _) => println!("  {}", deck),
                }
            }
        }
    }

    Ok(())
}
