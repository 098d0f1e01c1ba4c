// Topic selection — picks the enriched and related topics for a query.
//
// Enriched topics come straight from the two top-ranked result documents:
// each document contributes up to two of its most probable coherent topics,
// round-robin, until four are collected. Related topics are the two
// strongest coherent co-topics of each enriched topic.

use std::cmp::Ordering;

use tracing::{debug, warn};

use super::coherence::{filter_topics, TopicKind};
use crate::db::models::{TopicAssociation, TopicId};
use crate::db::TopicStore;
use crate::error::{ExpansionError, Result};

/// Upper bound on the enriched set.
pub const MAX_ENRICHED_TOPICS: usize = 4;
/// New topics a single document may contribute per visit.
pub const TOPICS_PER_DOCUMENT: usize = 2;
/// Related topics taken for each enriched topic.
pub const RELATED_PER_TOPIC: usize = 2;
/// Full walks over both documents before giving up on reaching four.
const MAX_ENRICHED_PASSES: usize = 2;

/// Sort associations by weight, strongest first. Stable, so equal weights
/// keep the store's order.
fn sort_by_weight_desc(associations: &mut [TopicAssociation]) {
    associations.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
}

/// Selects topics for one request against a topic store.
pub struct TopicSelector<'a> {
    store: &'a dyn TopicStore,
    threshold: f64,
}

impl<'a> TopicSelector<'a> {
    pub fn new(store: &'a dyn TopicStore, threshold: f64) -> Self {
        Self { store, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// A document's coherent topics, most probable first.
    fn ranked_document_topics(&self, document: &str) -> Result<Vec<TopicId>> {
        let mut associations = self.store.topics_for_document(document)?;
        sort_by_weight_desc(&mut associations);
        filter_topics(self.store, &associations, self.threshold, TopicKind::Enriched)
    }

    /// Build the enriched topic set from two seed documents.
    ///
    /// Each document visit adds at most two topics not already present.
    /// When one pass over both documents leaves fewer than four topics,
    /// both are walked once more; after that the set is returned as is,
    /// which can be short when the model is sparse.
    pub fn select_enriched(&self, first_doc: &str, second_doc: &str) -> Result<Vec<TopicId>> {
        let ranked = [
            self.ranked_document_topics(first_doc)?,
            self.ranked_document_topics(second_doc)?,
        ];

        let mut enriched: Vec<TopicId> = Vec::with_capacity(MAX_ENRICHED_TOPICS);
        for pass in 0..MAX_ENRICHED_PASSES {
            for topics in &ranked {
                let mut added = 0;
                for &topic in topics {
                    if added == TOPICS_PER_DOCUMENT || enriched.len() == MAX_ENRICHED_TOPICS {
                        break;
                    }
                    if !enriched.contains(&topic) {
                        enriched.push(topic);
                        added += 1;
                    }
                }
            }

            if enriched.len() == MAX_ENRICHED_TOPICS {
                break;
            }
            debug!(pass, found = enriched.len(), "Enriched set short after pass");
        }

        debug!(
            first_doc,
            second_doc,
            topics = ?enriched,
            "Selected enriched topics"
        );
        Ok(enriched)
    }

    /// The two strongest coherent co-topics of a single topic.
    fn top_related(&self, topic: TopicId) -> Result<[TopicId; RELATED_PER_TOPIC]> {
        let mut affinities = self.store.related_topics(topic)?;
        sort_by_weight_desc(&mut affinities);
        let survivors = filter_topics(self.store, &affinities, self.threshold, TopicKind::Related)?;

        match survivors.as_slice() {
            [first, second, ..] => Ok([*first, *second]),
            _ => Err(ExpansionError::InsufficientCandidates {
                topic,
                needed: RELATED_PER_TOPIC,
                found: survivors.len(),
            }),
        }
    }

    /// Build the related topic set: two co-topics per enriched topic, in
    /// enriched order.
    ///
    /// Fails with `InsufficientCandidates` on the first enriched topic that
    /// has fewer than two coherent co-topics. An empty enriched set is a
    /// precondition failure.
    pub fn select_related(&self, enriched: &[TopicId]) -> Result<Vec<TopicId>> {
        if enriched.is_empty() {
            return Err(ExpansionError::Precondition(
                "related topics need a populated enriched topic set".to_string(),
            ));
        }

        let mut related = Vec::with_capacity(enriched.len() * RELATED_PER_TOPIC);
        for &topic in enriched {
            related.extend(self.top_related(topic)?);
        }
        debug!(topics = ?related, "Selected related topics");
        Ok(related)
    }

    /// Like `select_related`, but skips enriched topics whose co-topics run
    /// out instead of failing the whole request.
    pub fn select_related_lenient(&self, enriched: &[TopicId]) -> Result<Vec<TopicId>> {
        if enriched.is_empty() {
            return Err(ExpansionError::Precondition(
                "related topics need a populated enriched topic set".to_string(),
            ));
        }

        let mut related = Vec::with_capacity(enriched.len() * RELATED_PER_TOPIC);
        for &topic in enriched {
            match self.top_related(topic) {
                Ok(pair) => related.extend(pair),
                Err(ExpansionError::InsufficientCandidates { found, .. }) => {
                    warn!(topic, found, "Skipping enriched topic with too few related topics");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(related)
    }
}

/// Enriched topics followed by each related topic not already listed.
pub fn latent_topics(enriched: &[TopicId], related: &[TopicId]) -> Vec<TopicId> {
    let mut topics = enriched.to_vec();
    for &topic in related {
        if !topics.contains(&topic) {
            topics.push(topic);
        }
    }
    topics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::{replace_document_topics, replace_topic_affinity, upsert_coherence};
    use crate::db::SqliteTopicStore;

    fn store() -> SqliteTopicStore {
        SqliteTopicStore::in_memory().unwrap()
    }

    #[test]
    fn test_each_document_contributes_two() {
        let store = store();
        store
            .with_conn(|conn| {
                replace_document_topics(conn, "a", &[(1, 0.1), (2, 0.5), (3, 0.3)])?;
                replace_document_topics(conn, "b", &[(4, 0.6), (5, 0.2), (6, 0.1)])
            })
            .unwrap();

        let selector = TopicSelector::new(&store, -100.0);
        let enriched = selector.select_enriched("a", "b").unwrap();
        assert_eq!(enriched, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_second_pass_fills_from_first_document() {
        // Document b only repeats a's topics, so the second pass goes back
        // to a for its third and fourth topics.
        let store = store();
        store
            .with_conn(|conn| {
                replace_document_topics(conn, "a", &[(1, 0.9), (2, 0.8), (3, 0.7), (4, 0.6)])?;
                replace_document_topics(conn, "b", &[(1, 0.9), (2, 0.8)])
            })
            .unwrap();

        let enriched = TopicSelector::new(&store, -100.0)
            .select_enriched("a", "b")
            .unwrap();
        assert_eq!(enriched, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_sparse_documents_give_short_set() {
        let store = store();
        store
            .with_conn(|conn| {
                replace_document_topics(conn, "a", &[(1, 0.9)])?;
                replace_document_topics(conn, "b", &[(1, 0.9), (2, 0.1)])
            })
            .unwrap();

        let enriched = TopicSelector::new(&store, -100.0)
            .select_enriched("a", "b")
            .unwrap();
        assert_eq!(enriched, vec![1, 2]);
    }

    #[test]
    fn test_junk_topics_never_enriched() {
        let store = store();
        store
            .with_conn(|conn| {
                upsert_coherence(conn, 2, -500.0)?;
                replace_document_topics(conn, "a", &[(2, 0.9), (1, 0.5)])?;
                replace_document_topics(conn, "b", &[(3, 0.9)])
            })
            .unwrap();

        let enriched = TopicSelector::new(&store, -100.0)
            .select_enriched("a", "b")
            .unwrap();
        assert_eq!(enriched, vec![1, 3]);
    }

    #[test]
    fn test_related_takes_top_two_by_covariance() {
        let store = store();
        store
            .with_conn(|conn| {
                replace_topic_affinity(conn, 1, &[(10, 0.1), (11, 0.9), (12, 0.5)])?;
                replace_topic_affinity(conn, 2, &[(20, 0.4), (21, 0.3)])
            })
            .unwrap();

        let related = TopicSelector::new(&store, -100.0)
            .select_related(&[1, 2])
            .unwrap();
        assert_eq!(related, vec![11, 12, 20, 21]);
    }

    #[test]
    fn test_related_shortfall_is_reported() {
        let store = store();
        store
            .with_conn(|conn| {
                replace_topic_affinity(conn, 1, &[(10, 0.1), (11, 0.9)])?;
                replace_topic_affinity(conn, 2, &[(20, 0.4)])
            })
            .unwrap();

        let selector = TopicSelector::new(&store, -100.0);
        match selector.select_related(&[1, 2]) {
            Err(ExpansionError::InsufficientCandidates {
                topic,
                needed,
                found,
            }) => {
                assert_eq!(topic, 2);
                assert_eq!(needed, 2);
                assert_eq!(found, 1);
            }
            other => panic!("expected InsufficientCandidates, got {other:?}"),
        }

        let lenient = selector.select_related_lenient(&[1, 2]).unwrap();
        assert_eq!(lenient, vec![11, 10]);
    }

    #[test]
    fn test_related_before_enriched_is_precondition() {
        let store = store();
        let selector = TopicSelector::new(&store, -100.0);
        assert!(matches!(
            selector.select_related(&[]),
            Err(ExpansionError::Precondition(_))
        ));
        assert!(matches!(
            selector.select_related_lenient(&[]),
            Err(ExpansionError::Precondition(_))
        ));
    }

    #[test]
    fn test_latent_topics_dedups_related() {
        assert_eq!(latent_topics(&[1, 2], &[3, 1, 4, 3]), vec![1, 2, 3, 4]);
    }
}
