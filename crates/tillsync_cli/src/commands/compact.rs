//! Compact command implementation.

use std::path::Path;

/// Runs the compact command.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_store(path)?;
    let stats = store.stats()?;

    println!("Compacting journal at {path:?}");
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();
    println!("Journal size: {} bytes", stats.journal_bytes);
    println!(
        "Live records: {}",
        stats.records.values().sum::<usize>()
    );
    println!("Outbox pending: {} (always preserved)", stats.outbox_pending);

    if dry_run {
        return Ok(());
    }

    println!();
    let result = store.compact()?;
    println!(
        "✓ Compaction complete: {} -> {} bytes ({:.1}% reclaimed)",
        result.bytes_before,
        result.bytes_after,
        if result.bytes_before > 0 {
            (result.bytes_before.saturating_sub(result.bytes_after)) as f64
                / result.bytes_before as f64
                * 100.0
        } else {
            0.0
        }
    );

    Ok(())
}
