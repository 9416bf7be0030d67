use anyhow::Result;

use revu_lib::review::algorithm::format_interval;
use revu_lib::review::Familiarity;
use revu_lib::{ItemKey, ItemState};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, collection: &str, format: &OutputFormat) -> Result<()> {
    let collection = app.find_collection(collection)?;
    let items = app.scan_collection(&collection)?;
    let ranked = app.scheduler.rank_by_weight(&items);

    // Tracked items whose files are gone from the directory
    let missing: Vec<ItemKey> = app
        .scheduler
        .tracked_keys(&app.collection_code(&collection))
        .into_iter()
        .filter(|key| !items.contains(key))
        .collect();

    match format {
        OutputFormat::Json => {
            let output = ranked_json(&ranked, &app.scheduler.rank_by_weight(&missing));
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if ranked.is_empty() {
                println!("No items in {}", app.display_name(&collection));
                return Ok(());
            }

            let max_name_len = ranked
                .iter()
                .map(|(key, _)| key.item().len())
                .max()
                .unwrap_or(4)
                .max(4);

            println!("{:<width$} Weight   Interval  Band", "Item", width = max_name_len);
            println!("{}", "\u{2500}".repeat(max_name_len + 29));

            for (key, state) in &ranked {
                let band = match Familiarity::from_weight(state.weight) {
                    Familiarity::Mastered => "mastered",
                    Familiarity::NeedsReview => "needs review",
                    Familiarity::Strange => "strange",
                };
                let interval = if state.last_reviewed.is_some() {
                    format_interval(state.interval)
                } else {
                    "new".to_string()
                };
                println!(
                    "{:<width$} {:<8.3} {:<9} {}",
                    key.item(),
                    state.weight,
                    interval,
                    band,
                    width = max_name_len
                );
            }

            if !missing.is_empty() {
                println!(
                    "\n{} tracked items no longer in {}",
                    missing.len(),
                    app.display_name(&collection)
                );
            }
        }
    }

    Ok(())
}

/// Items in rank order, followed by tracked items no longer on disk
fn ranked_json(ranked: &[(ItemKey, ItemState)], missing: &[(ItemKey, ItemState)]) -> serde_json::Value {
    let entry = |key: &ItemKey, state: &ItemState, on_disk: bool| {
        serde_json::json!({
            "item": key.item(),
            "weight": state.weight,
            "interval": state.interval,
            "lastReviewed": state.last_reviewed,
            "onDisk": on_disk,
        })
    };

    let output: Vec<serde_json::Value> = ranked
        .iter()
        .map(|(key, state)| entry(key, state, true))
        .chain(missing.iter().map(|(key, state)| entry(key, state, false)))
        .collect();
    serde_json::Value::Array(output)
}
