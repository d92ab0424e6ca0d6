//! Config command implementation.

use std::path::Path;
use tillsync_store::{FileBackend, RecordStore};

/// Prints one configuration key, or every key when none is given.
pub fn get(path: &Path, key: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_store(path)?;

    match key {
        Some(key) => match store.get_config(key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("Key not set: {key}").into()),
        },
        None => {
            for (key, value) in store.config_entries() {
                println!("{key} = {value}");
            }
        }
    }

    Ok(())
}

/// Sets a configuration key.
///
/// The value is parsed as JSON first so numbers and booleans keep their type;
/// anything that does not parse is stored as a plain string.
pub fn set(path: &Path, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Unlike the read-only commands, `set` creates the store if needed so a
    // fresh till can be pointed at its endpoint before first use.
    let store = RecordStore::open(FileBackend::open_with_create_dirs(path)?)?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_owned()));
    store.set_config(key, value)?;
    println!("{key} updated");
    Ok(())
}
