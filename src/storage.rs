//! Persisted harvest files.
//!
//! Harvested collections are written as JSON arrays into the data
//! directory, name-stamped with the session prefix and a timestamp so
//! successive runs against the same environment do not overwrite each
//! other. Files are read back with a plain JSON load for the
//! load-from-file flows.

use chrono::Local;
use colored::Colorize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Write records to `<data_dir>/<prefix>_harvested_<resource>_<M-D-Y_H-M>.json`
/// and return the path written.
pub async fn write_harvest(
    data_dir: &Path,
    prefix: &str,
    resource: &str,
    records: &[Value],
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(data_dir).await?;

    let now = Local::now();
    let stamp = now.format("%-m-%-d-%Y_%H-%M");
    let path = data_dir.join(format!("{prefix}_harvested_{resource}_{stamp}.json"));

    println!("{}", format!("[*] Writing results to {}", path.display()).green());
    let body = serde_json::to_string_pretty(records)?;
    tokio::fs::write(&path, body).await?;

    Ok(path)
}

/// Load a previously saved harvest file.
pub async fn load_json_file(path: &Path) -> Result<Vec<Value>> {
    let body = tokio::fs::read_to_string(path).await?;
    let records = serde_json::from_str(&body)?;
    Ok(records)
}

/// Harvest files left behind by earlier sessions, newest last.
pub fn saved_harvest_files(data_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(data_dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}
