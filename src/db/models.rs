// Data models — Rust structs that map to topic-model rows.
//
// These are the types that flow through the expansion engine. They're kept
// separate from the queries so the engine can use them without depending on
// rusqlite directly.

use serde::{Deserialize, Serialize};

/// Topics carry no payload of their own; everything is looked up by ID.
pub type TopicId = i64;

/// Semantic coherence of a single topic. Lower scores mark "junk" topics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoherenceScore {
    pub topic: TopicId,
    pub score: f64,
}

/// Association strength between a topic and a document, or between a topic
/// and one of its co-topics.
///
/// Document associations leave `co_topic` empty and carry the topic's
/// probability in `weight`. Affinity records carry the co-topic and the
/// covariance between the two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopicAssociation {
    pub topic: TopicId,
    pub co_topic: Option<TopicId>,
    pub weight: f64,
}

impl TopicAssociation {
    /// A topic assigned to a document with the given probability.
    pub fn document(topic: TopicId, probability: f64) -> Self {
        Self {
            topic,
            co_topic: None,
            weight: probability,
        }
    }

    /// A co-topic correlated with `topic` by `covariance`.
    pub fn related(topic: TopicId, co_topic: TopicId, covariance: f64) -> Self {
        Self {
            topic,
            co_topic: Some(co_topic),
            weight: covariance,
        }
    }
}

/// A scored phrase belonging to a topic. `size` is the number of words (1-3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NGram {
    pub text: String,
    pub size: u8,
    pub score: f64,
}

impl NGram {
    pub fn is_trigram(&self) -> bool {
        self.size == 3
    }

    pub fn is_bigram(&self) -> bool {
        self.size == 2
    }
}

/// A single word from a topic's word distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unigram {
    pub word: String,
    pub probability: f64,
}

/// Ordering for coherence score listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Row counts for each topic-model table, shown by `iris status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub topics: u64,
    pub documents: u64,
    pub affinities: u64,
    pub ngrams: u64,
    pub words: u64,
}

impl ModelStats {
    pub fn is_empty(&self) -> bool {
        self.topics == 0 && self.documents == 0
    }
}
