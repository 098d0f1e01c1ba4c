// Term ranking — picks the phrases and words that represent a topic.
//
// For display, a topic is summarized by its best trigram, its two best
// bigrams and its four most probable words. The words double as query
// expansion terms, with a fifth word appended when the topic has one.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::db::models::{NGram, TopicId, Unigram};
use crate::db::TopicStore;
use crate::error::Result;

/// Bigrams kept per topic.
pub const MAX_BIGRAMS: usize = 2;
/// Words shown per topic.
pub const DISPLAY_UNIGRAMS: usize = 4;
/// Words used for expansion per topic (display words plus one).
pub const EXPANSION_UNIGRAMS: usize = 5;

/// Placeholder shown when a topic has no trigram.
pub const NO_TRIGRAM: &str = "(No trigrams found)";

/// The best trigram (if any) followed by up to two bigrams.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectedNGrams {
    pub trigram: Option<NGram>,
    pub bigrams: Vec<NGram>,
}

impl SelectedNGrams {
    /// Trigram first, then bigrams in rank order.
    pub fn to_vec(&self) -> Vec<NGram> {
        self.trigram
            .iter()
            .chain(self.bigrams.iter())
            .cloned()
            .collect()
    }

    pub fn trigram_text(&self) -> &str {
        self.trigram.as_ref().map(|t| t.text.as_str()).unwrap_or(NO_TRIGRAM)
    }

    pub fn bigram_text(&self) -> String {
        self.bigrams
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A topic's display words and its expansion word list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectedUnigrams {
    /// Up to four most probable words, for display.
    pub display: Vec<Unigram>,
    /// The display words plus the fifth most probable word, when present.
    pub expansion_words: Vec<String>,
}

impl SelectedUnigrams {
    pub fn display_text(&self) -> String {
        self.display
            .iter()
            .map(|u| u.word.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Order n-grams by size then score, both descending. Stable.
fn sort_ngrams(ngrams: &mut [NGram]) {
    ngrams.sort_by(|a, b| {
        b.size.cmp(&a.size).then_with(|| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
        })
    });
}

/// Pick the first trigram and the first two bigrams from a sorted list.
///
/// Sorting puts every trigram before every bigram, so once two bigrams are
/// held the trigram slot is already settled.
fn pick_ngrams(sorted: &[NGram]) -> SelectedNGrams {
    let mut selected = SelectedNGrams::default();
    for ngram in sorted {
        if selected.bigrams.len() == MAX_BIGRAMS {
            break;
        }
        if ngram.is_trigram() {
            if selected.trigram.is_none() {
                selected.trigram = Some(ngram.clone());
            }
        } else if ngram.is_bigram() {
            selected.bigrams.push(ngram.clone());
        }
    }
    selected
}

/// Split a probability-sorted word list into display and expansion words.
fn pick_unigrams(sorted: &[Unigram]) -> SelectedUnigrams {
    let display: Vec<Unigram> = sorted.iter().take(DISPLAY_UNIGRAMS).cloned().collect();
    let expansion_words = sorted
        .iter()
        .take(EXPANSION_UNIGRAMS)
        .map(|u| u.word.clone())
        .collect();
    SelectedUnigrams {
        display,
        expansion_words,
    }
}

/// Ranks terms for topics against a topic store.
pub struct TermRanker<'a> {
    store: &'a dyn TopicStore,
}

impl<'a> TermRanker<'a> {
    pub fn new(store: &'a dyn TopicStore) -> Self {
        Self { store }
    }

    /// The topic's best trigram and two best bigrams.
    pub fn select_ngrams(&self, topic: TopicId) -> Result<SelectedNGrams> {
        let mut ngrams = self.store.ngrams_for_topic(topic)?;
        sort_ngrams(&mut ngrams);
        let selected = pick_ngrams(&ngrams);
        debug!(
            topic,
            has_trigram = selected.trigram.is_some(),
            bigrams = selected.bigrams.len(),
            "Selected n-grams"
        );
        Ok(selected)
    }

    /// The topic's four display words and four-to-five expansion words.
    pub fn select_unigrams(&self, topic: TopicId) -> Result<SelectedUnigrams> {
        let mut unigrams = self.store.unigrams_for_topic(topic)?;
        unigrams.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(Ordering::Equal)
        });

        let selected = pick_unigrams(&unigrams);
        if selected.expansion_words.len() < EXPANSION_UNIGRAMS {
            debug!(
                topic,
                available = selected.expansion_words.len(),
                "Topic has fewer than five words; expanding with what it has"
            );
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ng(text: &str, size: u8, score: f64) -> NGram {
        NGram {
            text: text.to_string(),
            size,
            score,
        }
    }

    fn uni(word: &str, probability: f64) -> Unigram {
        Unigram {
            word: word.to_string(),
            probability,
        }
    }

    #[test]
    fn test_sort_is_size_then_score() {
        let mut ngrams = vec![
            ng("b low", 2, 1.0),
            ng("u", 1, 99.0),
            ng("t r i", 3, 0.5),
            ng("b high", 2, 5.0),
            ng("t o p", 3, 2.0),
        ];
        sort_ngrams(&mut ngrams);
        let texts: Vec<&str> = ngrams.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["t o p", "t r i", "b high", "b low", "u"]);
    }

    #[test]
    fn test_pick_first_trigram_and_two_bigrams() {
        let mut ngrams = vec![
            ng("new york times", 3, 10.0),
            ng("los angeles times", 3, 20.0),
            ng("public opinion", 2, 121.18),
            ng("conflict interest", 2, 118.03),
            ng("third bigram", 2, 50.0),
        ];
        sort_ngrams(&mut ngrams);
        let selected = pick_ngrams(&ngrams);
        assert_eq!(selected.trigram_text(), "los angeles times");
        assert_eq!(selected.bigram_text(), "public opinion, conflict interest");
        assert_eq!(selected.to_vec().len(), 3);
    }

    #[test]
    fn test_no_trigram_placeholder() {
        let selected = pick_ngrams(&[ng("public opinion", 2, 1.0)]);
        assert!(selected.trigram.is_none());
        assert_eq!(selected.trigram_text(), NO_TRIGRAM);
        assert_eq!(selected.to_vec(), vec![ng("public opinion", 2, 1.0)]);
    }

    #[test]
    fn test_unigrams_are_ignored_by_ngram_pick() {
        let selected = pick_ngrams(&[ng("court", 1, 100.0)]);
        assert_eq!(selected, SelectedNGrams::default());
    }

    #[test]
    fn test_pick_unigrams_five_available() {
        let words = vec![
            uni("issue", 5.0),
            uni("policy", 4.0),
            uni("public", 3.0),
            uni("issues", 2.0),
            uni("debate", 1.0),
            uni("extra", 0.5),
        ];
        let selected = pick_unigrams(&words);
        assert_eq!(selected.display.len(), 4);
        assert_eq!(
            selected.expansion_words,
            vec!["issue", "policy", "public", "issues", "debate"]
        );
        assert_eq!(selected.display_text(), "issue, policy, public, issues");
    }

    #[test]
    fn test_pick_unigrams_only_four() {
        let words = vec![uni("a", 4.0), uni("b", 3.0), uni("c", 2.0), uni("d", 1.0)];
        let selected = pick_unigrams(&words);
        assert_eq!(selected.display.len(), 4);
        assert_eq!(selected.expansion_words.len(), 4);
    }

    #[test]
    fn test_pick_unigrams_sparse_topic() {
        let selected = pick_unigrams(&[uni("lonely", 1.0)]);
        assert_eq!(selected.display.len(), 1);
        assert_eq!(selected.expansion_words, vec!["lonely"]);
    }
}
