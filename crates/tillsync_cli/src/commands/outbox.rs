//! Outbox command implementation.

use std::path::Path;

/// Runs the outbox command.
pub fn run(
    path: &Path,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_store(path)?;
    let pending = store.outbox_pending();
    let total = pending.len();
    let shown: Vec<_> = match limit {
        Some(n) => pending.into_iter().take(n).collect(),
        None => pending,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&shown)?),
        _ => {
            println!("Pending outbox entries: {total}");
            if shown.len() < total {
                println!("(showing first {})", shown.len());
            }
            println!();
            for entry in &shown {
                println!(
                    "  #{:<6} {:<16} {:<7} enqueued {}  {}",
                    entry.sequence,
                    entry.table,
                    entry.action,
                    entry.enqueued_at,
                    entry.payload
                );
            }
        }
    }

    Ok(())
}
