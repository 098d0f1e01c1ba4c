// Topic store trait — backend-agnostic read interface over the topic model.
//
// Implementors: SqliteTopicStore (wraps rusqlite). The expansion engine only
// ever talks to this trait, so tests and alternative backends can swap in
// without touching selection or ranking code.
//
// Methods are synchronous: one expansion request runs to completion on the
// caller's thread, and each lookup is a short blocking read.

use anyhow::Result;

use super::models::{CoherenceScore, ModelStats, NGram, SortOrder, TopicAssociation, TopicId, Unigram};

pub trait TopicStore: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    fn table_count(&self) -> Result<i64>;

    /// Row counts for each topic-model table.
    fn model_stats(&self) -> Result<ModelStats>;

    // --- Coherence ---

    /// Coherence scores for the given topics (or all topics), sorted by score.
    fn coherence_scores(
        &self,
        topic_ids: Option<&[TopicId]>,
        order: SortOrder,
    ) -> Result<Vec<CoherenceScore>>;

    /// The topics among `topic_ids` whose coherence is strictly below `threshold`.
    fn topics_below_threshold(&self, topic_ids: &[TopicId], threshold: f64) -> Result<Vec<TopicId>>;

    // --- Associations ---

    /// Topics assigned to a document, with their probabilities.
    fn topics_for_document(&self, document: &str) -> Result<Vec<TopicAssociation>>;

    /// Co-topics of a topic, with their covariance.
    fn related_topics(&self, topic: TopicId) -> Result<Vec<TopicAssociation>>;

    // --- Terms ---

    /// All scored n-grams (sizes 1-3) for a topic.
    fn ngrams_for_topic(&self, topic: TopicId) -> Result<Vec<NGram>>;

    /// The word distribution for a topic.
    fn unigrams_for_topic(&self, topic: TopicId) -> Result<Vec<Unigram>>;
}
