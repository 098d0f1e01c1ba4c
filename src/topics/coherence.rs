// Coherence filtering — drops "junk" topics before anything is selected.
//
// Every topic carries a precomputed semantic coherence score. Topics scoring
// strictly below the threshold are removed; a topic sitting exactly on the
// threshold survives. The threshold is either absolute or read off the
// ascending score distribution at a percentile.

use tracing::debug;

use crate::db::models::{SortOrder, TopicAssociation, TopicId};
use crate::db::TopicStore;
use crate::error::{ExpansionError, Result};

/// Threshold used when none is configured. Low enough to keep almost
/// every topic in a typical model.
pub const DEFAULT_TOPIC_THRESHOLD: f64 = -100.0;

/// Which side of an association names the topic being filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    /// A topic assigned to a seed document: filter on the topic itself.
    Enriched,
    /// An affinity record: filter on the co-topic.
    Related,
}

/// Remove junk topics from a ranked association list.
///
/// Returns the surviving topic IDs in input order. Topics with no stored
/// coherence score are kept, since the store only reports scored topics
/// that fall below the threshold.
pub fn filter_topics(
    store: &dyn TopicStore,
    associations: &[TopicAssociation],
    threshold: f64,
    kind: TopicKind,
) -> Result<Vec<TopicId>> {
    let mut candidates = Vec::with_capacity(associations.len());
    for assoc in associations {
        let id = match kind {
            TopicKind::Enriched => assoc.topic,
            TopicKind::Related => assoc.co_topic.ok_or_else(|| {
                anyhow::anyhow!(
                    "Affinity record for topic {} is missing its co-topic",
                    assoc.topic
                )
            })?,
        };
        candidates.push(id);
    }

    let junk = store.topics_below_threshold(&candidates, threshold)?;
    let before = candidates.len();
    candidates.retain(|id| !junk.contains(id));

    debug!(
        ?kind,
        threshold,
        kept = candidates.len(),
        dropped = before - candidates.len(),
        "Filtered junk topics"
    );
    Ok(candidates)
}

/// Derive a threshold from a percentile of all coherence scores.
///
/// The threshold is the ascending score at rank `floor(p * N) - 1`. A
/// percentile outside (0, 1], one too small to select a rank, or an empty
/// model is a precondition failure.
pub fn threshold_from_percentile(store: &dyn TopicStore, percentile: f64) -> Result<f64> {
    let scores = store.coherence_scores(None, SortOrder::Ascending)?;
    let count = scores.len();

    if !(percentile > 0.0 && percentile <= 1.0) {
        return Err(ExpansionError::Precondition(format!(
            "coherence percentile must be in (0, 1], got {percentile}"
        )));
    }

    // p is in (0, 1], so floor(p * N) lies in 0..=N.
    let position = (percentile * count as f64).floor() as usize;
    let Some(rank) = position.checked_sub(1) else {
        return Err(ExpansionError::Precondition(format!(
            "coherence percentile {percentile} selects no rank among the {count} scored topics"
        )));
    };

    let threshold = scores[rank].score;
    debug!(percentile, rank, threshold, "Derived coherence threshold");
    Ok(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::upsert_coherence;
    use crate::db::SqliteTopicStore;

    fn store_with_scores(scores: &[(TopicId, f64)]) -> SqliteTopicStore {
        let store = SqliteTopicStore::in_memory().unwrap();
        store
            .with_conn(|conn| {
                for &(topic, score) in scores {
                    upsert_coherence(conn, topic, score)?;
                }
                Ok(())
            })
            .unwrap();
        store
    }

    #[test]
    fn test_filter_keeps_order_and_equal_threshold() {
        let store = store_with_scores(&[(1, -100.0), (2, -150.0), (3, -10.0)]);
        let assocs = vec![
            TopicAssociation::document(3, 0.9),
            TopicAssociation::document(2, 0.5),
            TopicAssociation::document(1, 0.1),
        ];
        let kept = filter_topics(&store, &assocs, -100.0, TopicKind::Enriched).unwrap();
        assert_eq!(kept, vec![3, 1]);
    }

    #[test]
    fn test_filter_related_uses_co_topic() {
        let store = store_with_scores(&[(5, -500.0), (6, 0.0)]);
        let assocs = vec![
            TopicAssociation::related(1, 5, 0.9),
            TopicAssociation::related(1, 6, 0.8),
        ];
        let kept = filter_topics(&store, &assocs, -100.0, TopicKind::Related).unwrap();
        assert_eq!(kept, vec![6]);
    }

    #[test]
    fn test_filter_related_without_co_topic_is_store_error() {
        let store = store_with_scores(&[]);
        let assocs = vec![TopicAssociation::document(1, 0.9)];
        let err = filter_topics(&store, &assocs, -100.0, TopicKind::Related).unwrap_err();
        assert!(matches!(err, ExpansionError::Store(_)));
    }

    #[test]
    fn test_filter_drops_every_duplicate_of_a_junk_topic() {
        let store = store_with_scores(&[(7, -300.0)]);
        let assocs = vec![
            TopicAssociation::related(1, 7, 0.9),
            TopicAssociation::related(1, 8, 0.8),
            TopicAssociation::related(1, 7, 0.7),
        ];
        let kept = filter_topics(&store, &assocs, -100.0, TopicKind::Related).unwrap();
        assert_eq!(kept, vec![8]);
    }

    #[test]
    fn test_filter_keeps_unscored_topics() {
        let store = store_with_scores(&[]);
        let assocs = vec![TopicAssociation::document(42, 0.3)];
        let kept = filter_topics(&store, &assocs, 1000.0, TopicKind::Enriched).unwrap();
        assert_eq!(kept, vec![42]);
    }

    #[test]
    fn test_percentile_threshold_rank() {
        // 8 topics with scores -8..-1; p=0.25 -> rank floor(2) - 1 = 1
        let scores: Vec<(TopicId, f64)> = (1..=8).map(|i| (i, -(i as f64))).collect();
        let store = store_with_scores(&scores);
        let threshold = threshold_from_percentile(&store, 0.25).unwrap();
        assert_eq!(threshold, -7.0);

        let top = threshold_from_percentile(&store, 1.0).unwrap();
        assert_eq!(top, -1.0);
    }

    #[test]
    fn test_percentile_out_of_range_is_precondition() {
        let store = store_with_scores(&[(1, -1.0), (2, -2.0)]);
        for p in [0.0, 0.2, 1.5, -1e300, -0.5, f64::NAN, f64::INFINITY] {
            let err = threshold_from_percentile(&store, p).unwrap_err();
            assert!(
                matches!(err, ExpansionError::Precondition(_)),
                "percentile {p} should be rejected"
            );
        }
    }

    #[test]
    fn test_percentile_on_empty_model_is_precondition() {
        let store = store_with_scores(&[]);
        assert!(matches!(
            threshold_from_percentile(&store, 0.5),
            Err(ExpansionError::Precondition(_))
        ));
    }
}
