// Topic model import — loads a JSON dump of the LDA model into SQLite.
//
// The dump mirrors the collections the topic model is trained into: one
// list per table, with the original field names (`semco`, `prob`,
// `cotopic`, `covar`). Everything is written in a single transaction, and
// each document or topic in the dump replaces whatever was stored for it.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::models::{NGram, TopicId, Unigram};
use super::queries;

/// A complete (or partial) topic model, as exported from the training run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicModelDump {
    #[serde(default)]
    pub coherence: Vec<CoherenceRecord>,
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub related: Vec<RelatedRecord>,
    #[serde(default)]
    pub ngrams: Vec<NgramRecord>,
    #[serde(default)]
    pub words: Vec<WordsRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoherenceRecord {
    pub topic: TopicId,
    #[serde(rename = "semco")]
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document: String,
    pub topics: Vec<DocumentTopic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTopic {
    pub topic: TopicId,
    #[serde(rename = "prob")]
    pub probability: f64,
}

/// One affinity row. Rows for the same topic keep their relative order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedRecord {
    pub topic: TopicId,
    #[serde(rename = "cotopic")]
    pub co_topic: TopicId,
    #[serde(rename = "covar")]
    pub covariance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NgramRecord {
    pub topic: TopicId,
    pub ngrams: Vec<NgramEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NgramEntry {
    #[serde(rename = "ngram")]
    pub text: String,
    pub size: u8,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordsRecord {
    pub topic: TopicId,
    pub words: Vec<WordEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    #[serde(rename = "prob")]
    pub probability: f64,
}

/// What an import wrote, for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub topics_scored: usize,
    pub documents: usize,
    pub topics_with_affinity: usize,
    pub topics_with_ngrams: usize,
    pub topics_with_words: usize,
}

/// Read and parse a dump file.
pub fn load_dump(path: &Path) -> Result<TopicModelDump> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read topic model dump {}", path.display()))?;
    let dump: TopicModelDump = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse topic model dump {}", path.display()))?;
    Ok(dump)
}

/// Write a dump into the database inside one transaction.
pub fn import_model(conn: &mut Connection, dump: &TopicModelDump, source: &str) -> Result<ImportSummary> {
    let tx = conn.transaction().context("Failed to start import transaction")?;

    for record in &dump.coherence {
        queries::upsert_coherence(&tx, record.topic, record.score)?;
    }

    for record in &dump.documents {
        let topics: Vec<(TopicId, f64)> = record
            .topics
            .iter()
            .map(|t| (t.topic, t.probability))
            .collect();
        queries::replace_document_topics(&tx, &record.document, &topics)?;
    }

    // Affinity rows arrive flat; group them per topic, keeping first-seen
    // topic order and row order within each topic.
    let mut grouped: Vec<(TopicId, Vec<(TopicId, f64)>)> = Vec::new();
    let mut slot_of: HashMap<TopicId, usize> = HashMap::new();
    for record in &dump.related {
        let row = (record.co_topic, record.covariance);
        match slot_of.get(&record.topic) {
            Some(&slot) => grouped[slot].1.push(row),
            None => {
                slot_of.insert(record.topic, grouped.len());
                grouped.push((record.topic, vec![row]));
            }
        }
    }
    for (topic, rows) in &grouped {
        queries::replace_topic_affinity(&tx, *topic, rows)?;
    }

    for record in &dump.ngrams {
        let ngrams: Vec<NGram> = record
            .ngrams
            .iter()
            .map(|n| NGram {
                text: n.text.clone(),
                size: n.size,
                score: n.score,
            })
            .collect();
        if let Some(bad) = ngrams.iter().find(|n| !(1..=3).contains(&n.size)) {
            anyhow::bail!(
                "N-gram {:?} for topic {} has size {}; expected 1, 2 or 3",
                bad.text,
                record.topic,
                bad.size
            );
        }
        queries::replace_topic_ngrams(&tx, record.topic, &ngrams)?;
    }

    for record in &dump.words {
        let words: Vec<Unigram> = record
            .words
            .iter()
            .map(|w| Unigram {
                word: w.word.clone(),
                probability: w.probability,
            })
            .collect();
        queries::replace_topic_words(&tx, record.topic, &words)?;
    }

    queries::set_model_meta(&tx, "source", source)?;
    tx.commit().context("Failed to commit topic model import")?;

    let summary = ImportSummary {
        topics_scored: dump.coherence.len(),
        documents: dump.documents.len(),
        topics_with_affinity: grouped.len(),
        topics_with_ngrams: dump.ngrams.len(),
        topics_with_words: dump.words.len(),
    };
    info!(
        source,
        topics = summary.topics_scored,
        documents = summary.documents,
        "Topic model imported"
    );
    Ok(summary)
}
