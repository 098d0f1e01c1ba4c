// Database schema — table creation and migrations.
//
// We use a simple version-based migration approach: a `schema_version` table
// tracks which migrations have run, and each migration is a function that
// executes SQL statements.
//
// Every list-valued table keeps a `position` column so rows come back in the
// order they were imported. The engine relies on that order to break ties
// when it sorts by probability or score.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Semantic coherence per topic; low scores mark junk topics
        CREATE TABLE IF NOT EXISTS topic_coherence (
            topic INTEGER PRIMARY KEY,
            score REAL NOT NULL
        );

        -- Document -> topic assignments (theta)
        CREATE TABLE IF NOT EXISTS document_topics (
            document TEXT NOT NULL,
            position INTEGER NOT NULL,
            topic INTEGER NOT NULL,
            probability REAL NOT NULL,
            PRIMARY KEY (document, position)
        );

        -- Topic -> co-topic affinity (covariance)
        CREATE TABLE IF NOT EXISTS topic_affinity (
            topic INTEGER NOT NULL,
            position INTEGER NOT NULL,
            co_topic INTEGER NOT NULL,
            covariance REAL NOT NULL,
            PRIMARY KEY (topic, position)
        );

        -- Scored phrases per topic; size is 1, 2 or 3 words
        CREATE TABLE IF NOT EXISTS topic_ngrams (
            topic INTEGER NOT NULL,
            position INTEGER NOT NULL,
            ngram TEXT NOT NULL,
            size INTEGER NOT NULL,
            score REAL NOT NULL,
            PRIMARY KEY (topic, position)
        );

        -- Topic word distributions (phi)
        CREATE TABLE IF NOT EXISTS topic_words (
            topic INTEGER NOT NULL,
            position INTEGER NOT NULL,
            word TEXT NOT NULL,
            probability REAL NOT NULL,
            PRIMARY KEY (topic, position)
        );
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    // Migration v2: index coherence scores so percentile thresholds and
    // junk-topic lookups don't scan the whole table.
    run_migration(conn, 2, |c| {
        c.execute_batch("CREATE INDEX IF NOT EXISTS idx_coherence_score ON topic_coherence(score);")
    })?;

    // Migration v3: key/value metadata about the imported model
    // (source file, import time).
    run_migration(conn, 3, |c| {
        c.execute_batch(
            "CREATE TABLE IF NOT EXISTS model_metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
    })?;

    Ok(())
}

/// Run a migration if it hasn't been applied yet.
/// The migration function receives the connection and should execute its SQL.
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;

    if !already_applied {
        migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
    }

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
