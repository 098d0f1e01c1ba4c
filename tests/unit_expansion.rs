// Unit tests for boost compiling and DisMax serialization.
//
// Covers the word -> boost map step, per-field merging and replacement,
// and what ends up in the `bq` parameter Solr receives.

use iris::query::dismax::DisMaxQuery;
use iris::topics::expansion::{compile_boost_map, BoostSign, BoostTermMap, TermBoosts};

fn boosts(pairs: &[(&str, f32)]) -> TermBoosts {
    pairs.iter().map(|&(t, b)| (t, b)).collect()
}

// ============================================================
// compile_boost_map
// ============================================================

#[test]
fn positive_boost_map_keeps_word_order() {
    let map = compile_boost_map(&["united", "states", "damage"], 1.0, BoostSign::Positive);
    let pairs: Vec<(&str, f32)> = map.iter().collect();
    assert_eq!(
        pairs,
        vec![("united", 1.0), ("states", 1.0), ("damage", 1.0)]
    );
}

#[test]
fn negative_boost_map_prefixes_every_term() {
    let map = compile_boost_map(&["oil", "spill"], 0.7, BoostSign::Negative);
    assert_eq!(map.terms(), vec!["-oil", "-spill"]);
    assert!(map.iter().all(|(_, boost)| boost == 0.7));
}

#[test]
fn unknown_sign_character_boosts_positively() {
    let sign = BoostSign::from_char('*');
    let map = compile_boost_map(&["oil"], 1.0, sign);
    assert_eq!(map.terms(), vec!["oil"]);
}

#[test]
fn words_shared_by_topics_collapse_to_one_term() {
    let words = ["court", "judge", "judge", "jury"];
    let map = compile_boost_map(&words, 1.0, BoostSign::Positive);
    assert_eq!(map.len(), 3);
}

// ============================================================
// BoostTermMap
// ============================================================

#[test]
fn merge_into_named_field() {
    let mut map = BoostTermMap::new();
    map.merge_into_field("author", &boosts(&[("John", 0.5), ("Doe", 0.5)]));

    assert_eq!(map.scopes(), &["author".to_string()]);
    let author = map.scope_terms("author");
    assert_eq!(author.terms(), vec!["John", "Doe"]);
    assert_eq!(author.get("John"), Some(0.5));
}

#[test]
fn later_merge_overwrites_boost_in_place() {
    let mut map = BoostTermMap::new();
    map.merge_into_field("", &boosts(&[("oil", 1.0), ("spill", 1.0)]));
    map.merge_into_field("", &boosts(&[("oil", 2.5)]));

    let unscoped = map.scope_terms("");
    assert_eq!(unscoped.terms(), vec!["oil", "spill"]);
    assert_eq!(unscoped.get("oil"), Some(2.5));
}

#[test]
fn unscoped_merge_joins_the_latest_field() {
    let mut map = BoostTermMap::new();
    map.merge_into_field("title", &boosts(&[("storm", 1.0)]));
    map.merge_into_field("", &boosts(&[("coast", 1.0)]));

    assert!(!map.has_scope(""));
    assert_eq!(map.scope_terms("title").terms(), vec!["storm", "coast"]);
}

#[test]
fn replace_all_leaves_only_the_new_terms() {
    let mut map = BoostTermMap::new();
    map.merge_into_field("title", &boosts(&[("storm", 1.0)]));
    map.merge_into_field("author", &boosts(&[("Doe", 0.5)]));
    map.replace_all("body", &boosts(&[("hurricane", 2.0)]));

    assert_eq!(map.scopes(), &["body".to_string()]);
    assert_eq!(map.rows().len(), 1);
}

// ============================================================
// DisMax bq serialization
// ============================================================

#[test]
fn bq_lists_unscoped_and_scoped_terms() {
    let mut query = DisMaxQuery::new("hurricane");
    query.add_boost_query("", &boosts(&[("storm", 1.0), ("coast", 1.0)]));
    query.add_boost_query("author", &boosts(&[("John", 0.5), ("Doe", 0.5)]));

    assert_eq!(
        query.bq_param().unwrap(),
        "storm^1.0 coast^1.0 author:John^0.5 author:Doe^0.5"
    );
}

#[test]
fn negative_scoped_terms_negate_the_whole_clause() {
    let mut query = DisMaxQuery::new("hurricane");
    let terms = compile_boost_map(&["oil", "spill"], 1.0, BoostSign::Negative);
    query.add_boost_query("body", &terms);

    assert_eq!(
        query.bq_param().unwrap(),
        "-body:oil^1.0 -body:spill^1.0"
    );
}

#[test]
fn set_boost_query_replaces_earlier_terms() {
    let mut query = DisMaxQuery::new("hurricane");
    query.add_boost_query("title", &boosts(&[("storm", 1.0)]));
    query.set_boost_query("", &boosts(&[("damage", 2.0)]));

    assert_eq!(query.bq_param().unwrap(), "damage^2.0");
}

#[test]
fn empty_boost_query_sends_no_bq() {
    let query = DisMaxQuery::new("hurricane");
    assert!(query.bq_param().is_none());
    assert!(!query.to_params().iter().any(|(k, _)| k == "bq"));
}
