use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, _use_color: bool) -> Result<()> {
    if matches!(format, OutputFormat::Plain) {
        eprintln!("Syncing with AnkiWeb (this can take a minute)...");
    }

    app.store().sync().context("Sync failed")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "synced": true })),
        OutputFormat::Plain => println!("Synced with AnkiWeb."),
    }

    Ok(())
}
