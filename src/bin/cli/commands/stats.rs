use anyhow::Result;

use revu_lib::ItemKey;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, collection: Option<&str>, format: &OutputFormat) -> Result<()> {
    let collections = match collection {
        Some(name) => vec![app.find_collection(name)?],
        None => app.list_collections()?,
    };

    let mut items: Vec<ItemKey> = Vec::new();
    for collection in &collections {
        items.extend(app.scan_collection(collection)?);
    }

    let stats = app.scheduler.stats(&items);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Plain => {
            if stats.totals.item_count == 0 {
                println!("No items found.");
                return Ok(());
            }

            for (id, c) in &stats.collections {
                println!("{}", app.display_name(id));
                println!(
                    "  {} items, average weight {:.2}",
                    c.item_count, c.average_weight
                );
                println!(
                    "  mastered {}  needs review {}  strange {}  never reviewed {}",
                    c.mastered_count, c.needs_review_count, c.strange_count, c.never_reviewed_count
                );
            }

            let t = &stats.totals;
            println!(
                "\n{} collections, {} items, average weight {:.2}",
                stats.total_collections, t.item_count, t.average_weight
            );
            println!(
                "Intervals: average {:.1}d, min {:.1}d, max {:.1}d",
                stats.average_interval, stats.min_interval, stats.max_interval
            );
        }
    }

    Ok(())
}
