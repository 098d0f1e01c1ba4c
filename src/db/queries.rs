// Database queries — reads and writes for the topic-model tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::{bail, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::models::{CoherenceScore, ModelStats, NGram, SortOrder, TopicAssociation, TopicId, Unigram};

/// Build `?1, ?2, ...` for an `IN (...)` clause, starting after `offset`
/// already-bound parameters.
fn placeholders(count: usize, offset: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i + offset))
        .collect::<Vec<_>>()
        .join(", ")
}

// --- Coherence ---

/// List coherence scores, optionally restricted to the given topics,
/// sorted by score in the requested order.
pub fn coherence_scores(
    conn: &Connection,
    topic_ids: Option<&[TopicId]>,
    order: SortOrder,
) -> Result<Vec<CoherenceScore>> {
    let map_row = |row: &rusqlite::Row<'_>| {
        Ok(CoherenceScore {
            topic: row.get(0)?,
            score: row.get(1)?,
        })
    };

    let rows = match topic_ids {
        None => {
            let sql = format!(
                "SELECT topic, score FROM topic_coherence ORDER BY score {}, topic ASC",
                order.as_sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], map_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        Some([]) => Vec::new(),
        Some(ids) => {
            let sql = format!(
                "SELECT topic, score FROM topic_coherence WHERE topic IN ({}) ORDER BY score {}, topic ASC",
                placeholders(ids.len(), 0),
                order.as_sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(ids.iter()), map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };
    Ok(rows)
}

/// Return the topics among `topic_ids` whose coherence is strictly below
/// `threshold`. Topics without a stored score are never reported.
pub fn topics_below_threshold(
    conn: &Connection,
    topic_ids: &[TopicId],
    threshold: f64,
) -> Result<Vec<TopicId>> {
    if topic_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT topic FROM topic_coherence WHERE score < ?1 AND topic IN ({})",
        placeholders(topic_ids.len(), 1)
    );
    let mut values: Vec<rusqlite::types::Value> = Vec::with_capacity(topic_ids.len() + 1);
    values.push(threshold.into());
    values.extend(topic_ids.iter().map(|&id| id.into()));

    let mut stmt = conn.prepare(&sql)?;
    let junk = stmt
        .query_map(params_from_iter(values), |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<TopicId>>>()?;
    Ok(junk)
}

// --- Associations ---

/// All topics assigned to a document, in import order.
pub fn topics_for_document(conn: &Connection, document: &str) -> Result<Vec<TopicAssociation>> {
    let mut stmt = conn.prepare(
        "SELECT topic, probability FROM document_topics WHERE document = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map(params![document], |row| {
            Ok(TopicAssociation::document(row.get(0)?, row.get(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// All co-topics recorded for a topic, in import order.
pub fn related_topics(conn: &Connection, topic: TopicId) -> Result<Vec<TopicAssociation>> {
    let mut stmt = conn.prepare(
        "SELECT co_topic, covariance FROM topic_affinity WHERE topic = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map(params![topic], |row| {
            Ok(TopicAssociation::related(topic, row.get(0)?, row.get(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

// --- Terms ---

/// All n-grams for a topic, in import order.
///
/// Fails on a stored size outside 1..=3 rather than passing a malformed
/// row on to the ranker.
pub fn ngrams_for_topic(conn: &Connection, topic: TopicId) -> Result<Vec<NGram>> {
    let mut stmt = conn.prepare(
        "SELECT ngram, size, score FROM topic_ngrams WHERE topic = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map(params![topic], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, f64>(2)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut ngrams = Vec::with_capacity(rows.len());
    for (text, size, score) in rows {
        if !(1..=3).contains(&size) {
            bail!("Malformed n-gram {text:?} for topic {topic}: size {size} is not 1, 2 or 3");
        }
        ngrams.push(NGram {
            text,
            size: size as u8,
            score,
        });
    }
    Ok(ngrams)
}

/// The word distribution for a topic, in import order.
pub fn unigrams_for_topic(conn: &Connection, topic: TopicId) -> Result<Vec<Unigram>> {
    let mut stmt = conn.prepare(
        "SELECT word, probability FROM topic_words WHERE topic = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map(params![topic], |row| {
            Ok(Unigram {
                word: row.get(0)?,
                probability: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

// --- Writes (used by the importer) ---

/// Save or update a topic's coherence score.
pub fn upsert_coherence(conn: &Connection, topic: TopicId, score: f64) -> Result<()> {
    conn.execute(
        "INSERT INTO topic_coherence (topic, score) VALUES (?1, ?2)
         ON CONFLICT(topic) DO UPDATE SET score = ?2",
        params![topic, score],
    )?;
    Ok(())
}

/// Replace all topic assignments for a document.
pub fn replace_document_topics(
    conn: &Connection,
    document: &str,
    topics: &[(TopicId, f64)],
) -> Result<()> {
    conn.execute(
        "DELETE FROM document_topics WHERE document = ?1",
        params![document],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO document_topics (document, position, topic, probability) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, (topic, probability)) in topics.iter().enumerate() {
        stmt.execute(params![document, position as i64, topic, probability])?;
    }
    Ok(())
}

/// Replace all affinity rows for a topic.
pub fn replace_topic_affinity(
    conn: &Connection,
    topic: TopicId,
    co_topics: &[(TopicId, f64)],
) -> Result<()> {
    conn.execute("DELETE FROM topic_affinity WHERE topic = ?1", params![topic])?;
    let mut stmt = conn.prepare(
        "INSERT INTO topic_affinity (topic, position, co_topic, covariance) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, (co_topic, covariance)) in co_topics.iter().enumerate() {
        stmt.execute(params![topic, position as i64, co_topic, covariance])?;
    }
    Ok(())
}

/// Replace all n-grams for a topic.
pub fn replace_topic_ngrams(conn: &Connection, topic: TopicId, ngrams: &[NGram]) -> Result<()> {
    conn.execute("DELETE FROM topic_ngrams WHERE topic = ?1", params![topic])?;
    let mut stmt = conn.prepare(
        "INSERT INTO topic_ngrams (topic, position, ngram, size, score) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (position, ngram) in ngrams.iter().enumerate() {
        stmt.execute(params![
            topic,
            position as i64,
            ngram.text,
            ngram.size as i64,
            ngram.score
        ])?;
    }
    Ok(())
}

/// Replace the word distribution for a topic.
pub fn replace_topic_words(conn: &Connection, topic: TopicId, words: &[Unigram]) -> Result<()> {
    conn.execute("DELETE FROM topic_words WHERE topic = ?1", params![topic])?;
    let mut stmt = conn.prepare(
        "INSERT INTO topic_words (topic, position, word, probability) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, unigram) in words.iter().enumerate() {
        stmt.execute(params![topic, position as i64, unigram.word, unigram.probability])?;
    }
    Ok(())
}

// --- Model metadata ---

/// Get a metadata value by key (e.g., "source").
pub fn get_model_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM model_metadata WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set a metadata value (upsert).
pub fn set_model_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO model_metadata (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

/// Row counts across the topic-model tables.
pub fn model_stats(conn: &Connection) -> Result<ModelStats> {
    let count = |sql: &str| -> Result<u64> {
        let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as u64)
    };

    Ok(ModelStats {
        topics: count("SELECT COUNT(*) FROM topic_coherence")?,
        documents: count("SELECT COUNT(DISTINCT document) FROM document_topics")?,
        affinities: count("SELECT COUNT(*) FROM topic_affinity")?,
        ngrams: count("SELECT COUNT(*) FROM topic_ngrams")?,
        words: count("SELECT COUNT(*) FROM topic_words")?,
    })
}
