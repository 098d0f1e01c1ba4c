//! Error types for the topic expansion engine.
//!
//! Sparse data is never an error: a short enriched set or a topic with only
//! four words comes back as a short result. Only broken preconditions,
//! exhausted candidate lists and collaborator failures land here, so an
//! empty result always means "nothing matched".

use crate::db::models::TopicId;

/// Errors raised while selecting, ranking or compiling expansion topics.
#[derive(Debug, thiserror::Error)]
pub enum ExpansionError {
    /// The caller asked for something whose inputs don't exist yet.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A topic has fewer surviving candidates than the selection needs.
    #[error("insufficient related topics for topic {topic}: needed {needed}, found {found}")]
    InsufficientCandidates {
        /// The topic whose candidates ran out.
        topic: TopicId,
        /// How many the selection requires.
        needed: usize,
        /// How many survived filtering.
        found: usize,
    },

    /// The topic store or search engine failed, or returned a malformed record.
    #[error("collaborator I/O error: {0:#}")]
    Store(#[from] anyhow::Error),
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, ExpansionError>;
