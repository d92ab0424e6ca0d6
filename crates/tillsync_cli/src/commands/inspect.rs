//! Inspect command implementation.

use serde::Serialize;
use std::path::Path;
use tillsync_store::StoreStats;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Whether a usable remote endpoint is configured.
    pub endpoint: Option<String>,
    /// Counts and sizes from the store.
    #[serde(flatten)]
    pub stats: StoreStats,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_store(path)?;
    let result = InspectResult {
        path: path.display().to_string(),
        endpoint: store.endpoint(),
        stats: store.stats()?,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("TillSync Store Inspection");
    println!("=========================");
    println!();
    println!("Path: {}", result.path);
    println!(
        "Endpoint: {}",
        result.endpoint.as_deref().unwrap_or("(not configured)")
    );
    println!();
    println!("Journal: {}", format_size(result.stats.journal_bytes));
    println!();
    println!("Records:");
    for (table, count) in &result.stats.records {
        println!("  {table:<16} {count}");
    }
    println!();
    println!("Outbox pending: {}", result.stats.outbox_pending);
    println!();
    println!("Watermarks (ms since epoch):");
    for (table, watermark) in &result.stats.watermarks {
        println!("  {table:<16} {watermark}");
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_humanized() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
