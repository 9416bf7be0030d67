use anyhow::Result;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let collections = app.list_collections()?;

    let mut rows = Vec::new();
    for collection in &collections {
        let items = app.scan_collection(collection)?;
        rows.push((collection, app.collection_code(collection), items.len()));
    }

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = rows
                .iter()
                .map(|(name, id, count)| {
                    serde_json::json!({
                        "id": id,
                        "name": name,
                        "itemCount": count,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if rows.is_empty() {
                println!("No collections in {}", app.data_dir.display());
                return Ok(());
            }

            for (name, id, count) in &rows {
                if *name == id {
                    println!("{} ({} items)", name, count);
                } else {
                    println!("{} [{}] ({} items)", name, id, count);
                }
            }
        }
    }

    Ok(())
}
