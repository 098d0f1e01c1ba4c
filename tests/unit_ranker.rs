// Unit tests for n-gram and unigram ranking.
//
// Term lists are stored out of order on purpose: the ranker must sort
// them itself rather than trust import order.

use iris::db::import::{import_model, TopicModelDump};
use iris::db::SqliteTopicStore;
use iris::topics::ranker::{TermRanker, NO_TRIGRAM};

const MODEL: &str = r#"{
    "ngrams": [
        {"topic": 134, "ngrams": [
            {"ngram": "court ruling",         "size": 2, "score": 4.0},
            {"ngram": "court",                "size": 1, "score": 20.0},
            {"ngram": "court of appeals",     "size": 3, "score": 6.0},
            {"ngram": "supreme court",        "size": 2, "score": 15.0},
            {"ngram": "supreme court ruling", "size": 3, "score": 12.0},
            {"ngram": "federal court",        "size": 2, "score": 11.0}
        ]},
        {"topic": 474, "ngrams": [
            {"ngram": "gulf coast", "size": 2, "score": 5.0},
            {"ngram": "oil spill",  "size": 2, "score": 8.0}
        ]},
        {"topic": 81, "ngrams": [
            {"ngram": "crude oil price", "size": 3, "score": 2.0}
        ]},
        {"topic": 90, "ngrams": [
            {"ngram": "tropical storm", "size": 2, "score": 5.0},
            {"ngram": "storm surge",    "size": 2, "score": 5.0},
            {"ngram": "high winds",     "size": 2, "score": 5.0}
        ]}
    ],
    "words": [
        {"topic": 134, "words": [
            {"word": "judge",   "prob": 0.07},
            {"word": "court",   "prob": 0.09},
            {"word": "law",     "prob": 0.02},
            {"word": "ruling",  "prob": 0.05},
            {"word": "justice", "prob": 0.03},
            {"word": "appeal",  "prob": 0.04}
        ]},
        {"topic": 474, "words": [
            {"word": "spill", "prob": 0.08},
            {"word": "oil",   "prob": 0.10},
            {"word": "gulf",  "prob": 0.05}
        ]},
        {"topic": 391, "words": [
            {"word": "storm",     "prob": 0.06},
            {"word": "hurricane", "prob": 0.11},
            {"word": "damage",    "prob": 0.04},
            {"word": "coast",     "prob": 0.05}
        ]}
    ]
}"#;

fn seeded_store() -> SqliteTopicStore {
    let dump: TopicModelDump = serde_json::from_str(MODEL).unwrap();
    let store = SqliteTopicStore::in_memory().unwrap();
    store
        .with_conn(|conn| import_model(conn, &dump, "fixture").map(|_| ()))
        .unwrap();
    store
}

// ============================================================
// N-grams
// ============================================================

#[test]
fn best_trigram_and_two_best_bigrams() {
    let store = seeded_store();
    let ranker = TermRanker::new(&store);

    let selected = ranker.select_ngrams(134).unwrap();
    assert_eq!(selected.trigram_text(), "supreme court ruling");
    assert_eq!(selected.bigram_text(), "supreme court, federal court");

    let texts: Vec<String> = selected.to_vec().into_iter().map(|n| n.text).collect();
    assert_eq!(
        texts,
        vec!["supreme court ruling", "supreme court", "federal court"]
    );
}

#[test]
fn unigrams_never_appear_as_ngrams() {
    let store = seeded_store();
    let ranker = TermRanker::new(&store);

    let selected = ranker.select_ngrams(134).unwrap();
    assert!(selected.to_vec().iter().all(|n| n.size > 1));
}

#[test]
fn topic_without_trigrams_shows_placeholder() {
    let store = seeded_store();
    let ranker = TermRanker::new(&store);

    let selected = ranker.select_ngrams(474).unwrap();
    assert!(selected.trigram.is_none());
    assert_eq!(selected.trigram_text(), NO_TRIGRAM);
    assert_eq!(selected.bigram_text(), "oil spill, gulf coast");
}

#[test]
fn equal_bigram_scores_keep_import_order() {
    let store = seeded_store();
    let ranker = TermRanker::new(&store);

    let selected = ranker.select_ngrams(90).unwrap();
    assert_eq!(selected.bigram_text(), "tropical storm, storm surge");
}

#[test]
fn topic_with_only_a_trigram() {
    let store = seeded_store();
    let ranker = TermRanker::new(&store);

    let selected = ranker.select_ngrams(81).unwrap();
    assert_eq!(selected.trigram_text(), "crude oil price");
    assert!(selected.bigrams.is_empty());
    assert_eq!(selected.bigram_text(), "");
}

#[test]
fn topic_with_no_terms_is_empty_not_an_error() {
    let store = seeded_store();
    let ranker = TermRanker::new(&store);

    let ngrams = ranker.select_ngrams(9999).unwrap();
    assert!(ngrams.trigram.is_none());
    assert!(ngrams.bigrams.is_empty());

    let unigrams = ranker.select_unigrams(9999).unwrap();
    assert!(unigrams.display.is_empty());
    assert!(unigrams.expansion_words.is_empty());
}

#[test]
fn ngram_selection_is_repeatable() {
    let store = seeded_store();
    let ranker = TermRanker::new(&store);

    assert_eq!(
        ranker.select_ngrams(134).unwrap(),
        ranker.select_ngrams(134).unwrap()
    );
}

// ============================================================
// Unigrams
// ============================================================

#[test]
fn four_display_words_and_five_expansion_words() {
    let store = seeded_store();
    let ranker = TermRanker::new(&store);

    let selected = ranker.select_unigrams(134).unwrap();
    assert_eq!(selected.display_text(), "court, judge, ruling, appeal");
    assert_eq!(
        selected.expansion_words,
        vec!["court", "judge", "ruling", "appeal", "justice"]
    );
}

#[test]
fn exactly_four_words_expand_with_four() {
    let store = seeded_store();
    let ranker = TermRanker::new(&store);

    let selected = ranker.select_unigrams(391).unwrap();
    assert_eq!(selected.display.len(), 4);
    assert_eq!(
        selected.expansion_words,
        vec!["hurricane", "storm", "coast", "damage"]
    );
}

#[test]
fn sparse_topic_returns_what_it_has() {
    let store = seeded_store();
    let ranker = TermRanker::new(&store);

    let selected = ranker.select_unigrams(474).unwrap();
    assert_eq!(selected.display.len(), 3);
    assert_eq!(selected.expansion_words, vec!["oil", "spill", "gulf"]);
}

// ============================================================
// Import validation
// ============================================================

#[test]
fn import_rejects_ngram_sizes_outside_one_to_three() {
    let dump: TopicModelDump = serde_json::from_str(
        r#"{"ngrams": [{"topic": 1, "ngrams": [{"ngram": "a b c d", "size": 4, "score": 1.0}]}]}"#,
    )
    .unwrap();
    let store = SqliteTopicStore::in_memory().unwrap();

    let result = store.with_conn(|conn| import_model(conn, &dump, "bad").map(|_| ()));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("size 4"), "got: {err}");
}
