use anyhow::Result;

use crate::app::App;
use crate::render::terminal as renderer;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let anki_version = app.store().version().ok();
    let ollama_ok = app.ollama().is_reachable();

    // Note type fields only matter when Anki is up
    let fields = anki_version
        .and_then(|_| app.store().model_field_names(&app.config.note_type).ok())
        .unwrap_or_default();
    let missing_fields: Vec<&str> = [app.config.front_field.as_str(), app.config.back_field.as_str()]
        .into_iter()
        .filter(|f| anki_version.is_some() && !fields.iter().any(|have| have == f))
        .collect();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "anki": {
                    "url": app.config.anki_url,
                    "reachable": anki_version.is_some(),
                    "version": anki_version,
                    "noteType": app.config.note_type,
                    "missingFields": missing_fields,
                },
                "ollama": {
                    "url": app.config.ollama_url,
                    "reachable": ollama_ok,
                    "model": app.config.ollama_model,
                },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let anki_detail = match anki_version {
                Some(v) => format!("{} (AnkiConnect v{})", app.config.anki_url, v),
                None => format!("{} (is Anki running with AnkiConnect?)", app.config.anki_url),
            };
            println!("{}", renderer::render_status("anki", anki_version.is_some(), &anki_detail, use_color));

            let ollama_detail = format!("{} (model {})", app.config.ollama_url, app.config.ollama_model);
            println!("{}", renderer::render_status("ollama", ollama_ok, &ollama_detail, use_color));

            if !missing_fields.is_empty() {
                println!(
                    "{}",
                    renderer::render_error(
                        &format!(
                            "Note type '{}' has no field(s): {}",
                            app.config.note_type,
                            missing_fields.join(", ")
                        ),
                        use_color
                    )
                );
            }
        }
    }

    Ok(())
}
