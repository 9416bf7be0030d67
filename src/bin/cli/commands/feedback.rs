use anyhow::{Context, Result};

use revu_lib::review::algorithm::format_interval;
use revu_lib::{Feedback, ItemKey, ItemState};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, key: &str, label: Option<&str>, format: &OutputFormat) -> Result<()> {
    let key = app.parse_key(key)?;
    let feedback = Feedback::from(label);
    if !app.scheduler.is_tracked(&key) {
        log::warn!("{} has no stored state yet, starting from defaults", key);
    }

    let state = app
        .scheduler
        .record_feedback(&key, feedback)
        .context("Feedback was applied but could not be saved; do not retry blindly")?;

    print_state(&key, &state, Some(feedback), format)
}

pub fn run_set_weight(app: &App, key: &str, weight: f64, format: &OutputFormat) -> Result<()> {
    let key = app.parse_key(key)?;
    let state = app
        .scheduler
        .set_weight(&key, weight)
        .context("Failed to set weight")?;

    print_state(&key, &state, None, format)
}

fn print_state(
    key: &ItemKey,
    state: &ItemState,
    feedback: Option<Feedback>,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "key": key.as_str(),
                "feedback": feedback,
                "state": state,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if let Some(feedback) = feedback {
                println!("Recorded '{}' for {}", feedback, key);
            } else {
                println!("Updated {}", key);
            }
            println!("  weight:   {:.4}", state.weight);
            println!("  interval: {}", format_interval(state.interval));
            if let Some(due) = state.due_at() {
                println!("  due:      {}", due.format("%Y-%m-%d %H:%M UTC"));
            }
        }
    }

    Ok(())
}
