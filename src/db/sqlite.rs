// SqliteTopicStore — rusqlite backend implementing the TopicStore trait.
//
// The Connection is wrapped in a std Mutex because Connection is !Sync and
// the store is shared process-wide as `Arc<dyn TopicStore>`. Each trait
// method locks, runs one query from queries.rs, and releases.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use rusqlite::Connection;

use super::models::{CoherenceScore, ModelStats, NGram, SortOrder, TopicAssociation, TopicId, Unigram};
use super::traits::TopicStore;

pub struct SqliteTopicStore {
    conn: Mutex<Connection>,
}

impl SqliteTopicStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// A fresh in-memory store with all tables created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }

    /// Run `f` with exclusive access to the connection.
    ///
    /// Writers (the importer) use this too, so reads never observe a
    /// half-applied import.
    pub fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Topic store connection mutex was poisoned"))?;
        f(&mut conn)
    }
}

impl TopicStore for SqliteTopicStore {
    fn table_count(&self) -> Result<i64> {
        self.with_conn(|conn| super::schema::table_count(conn))
    }

    fn model_stats(&self) -> Result<ModelStats> {
        self.with_conn(|conn| super::queries::model_stats(conn))
    }

    fn coherence_scores(
        &self,
        topic_ids: Option<&[TopicId]>,
        order: SortOrder,
    ) -> Result<Vec<CoherenceScore>> {
        self.with_conn(|conn| super::queries::coherence_scores(conn, topic_ids, order))
    }

    fn topics_below_threshold(&self, topic_ids: &[TopicId], threshold: f64) -> Result<Vec<TopicId>> {
        self.with_conn(|conn| super::queries::topics_below_threshold(conn, topic_ids, threshold))
    }

    fn topics_for_document(&self, document: &str) -> Result<Vec<TopicAssociation>> {
        self.with_conn(|conn| super::queries::topics_for_document(conn, document))
    }

    fn related_topics(&self, topic: TopicId) -> Result<Vec<TopicAssociation>> {
        self.with_conn(|conn| super::queries::related_topics(conn, topic))
    }

    fn ngrams_for_topic(&self, topic: TopicId) -> Result<Vec<NGram>> {
        self.with_conn(|conn| super::queries::ngrams_for_topic(conn, topic))
    }

    fn unigrams_for_topic(&self, topic: TopicId) -> Result<Vec<Unigram>> {
        self.with_conn(|conn| super::queries::unigrams_for_topic(conn, topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_table_count() {
        let store = SqliteTopicStore::in_memory().unwrap();
        assert_eq!(store.table_count().unwrap(), 7);
    }

    #[test]
    fn test_trait_empty_model() {
        let store = SqliteTopicStore::in_memory().unwrap();
        assert!(store.model_stats().unwrap().is_empty());
        assert!(store.topics_for_document("nothing").unwrap().is_empty());
        assert!(store.unigrams_for_topic(1).unwrap().is_empty());
    }

    #[test]
    fn test_trait_reads_through_connection() {
        let store = SqliteTopicStore::in_memory().unwrap();
        store
            .with_conn(|conn| {
                super::super::queries::upsert_coherence(conn, 4, -120.0)?;
                super::super::queries::replace_topic_affinity(conn, 4, &[(8, 0.5)])
            })
            .unwrap();

        assert_eq!(store.topics_below_threshold(&[4], -100.0).unwrap(), vec![4]);
        let related = store.related_topics(4).unwrap();
        assert_eq!(related[0].co_topic, Some(8));
    }
}
