// System status display — shows DB size, model contents and import source.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::db::queries;

/// Display system status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    let db_path = config.db_path.as_str();
    if !Path::new(db_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `iris init` to set up the database.");
        return Ok(());
    }

    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_path, file_size);

    let conn = db::open(db_path)?;
    let stats = queries::model_stats(&conn)?;
    if stats.is_empty() {
        println!("Topic model: not imported");
        println!("  Run `iris import <dump.json>` to load one");
    } else {
        println!(
            "Topic model: {} scored topics, {} documents",
            stats.topics, stats.documents
        );
        println!(
            "  {} topic affinities, {} n-grams, {} words",
            stats.affinities, stats.ngrams, stats.words
        );
        match queries::get_model_meta(&conn, "source")? {
            Some(source) => println!("  Imported from {}", source),
            None => println!("  Import source unknown"),
        }
    }

    match config.threshold_percentile {
        Some(p) => println!("Coherence threshold: {:.0}th percentile", p * 100.0),
        None => println!("Coherence threshold: {}", config.topic_threshold),
    }
    println!("Solr: {}", config.solr_url);

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
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
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
