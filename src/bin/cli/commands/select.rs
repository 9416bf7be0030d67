use anyhow::Result;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, collection: &str, count: Option<usize>, format: &OutputFormat) -> Result<()> {
    let collection = app.find_collection(collection)?;
    let items = app.scan_collection(&collection)?;
    let count = count.unwrap_or(app.config.default_count);

    let selected = app.scheduler.select_for_review(&items, count);

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = selected
                .iter()
                .map(|key| {
                    let path = app.item_path(key);
                    serde_json::json!({
                        "key": key.as_str(),
                        "path": path.to_string_lossy(),
                        "weight": app.scheduler.weight(key),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if selected.is_empty() {
                println!("No items in {}", app.display_name(&collection));
                return Ok(());
            }

            for key in &selected {
                println!("{}", key);
            }
            println!(
                "\n{} of {} items selected from {}",
                selected.len(),
                items.len(),
                app.display_name(&collection)
            );
        }
    }

    Ok(())
}
