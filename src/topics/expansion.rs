// Expansion compiling — turns topic words into weighted boost terms.
//
// Each selected topic contributes its four or five expansion words. A set of
// topics is flattened into one word list, every word gets the same boost
// (optionally negated with a leading `-`), and the result is merged into a
// per-field boost table that the DisMax formatter serializes.

use serde::Serialize;

use crate::db::models::TopicId;
use crate::error::{ExpansionError, Result};

/// Whether expansion terms push results up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BoostSign {
    #[default]
    Positive,
    Negative,
}

impl BoostSign {
    /// `'-'` is negative; every other character is positive.
    pub fn from_char(sign: char) -> Self {
        match sign {
            '-' => BoostSign::Negative,
            _ => BoostSign::Positive,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            BoostSign::Positive => '+',
            BoostSign::Negative => '-',
        }
    }

    /// The term as it should appear in the boost query.
    pub fn apply(&self, term: &str) -> String {
        match self {
            BoostSign::Positive => term.to_string(),
            BoostSign::Negative => format!("-{term}"),
        }
    }
}

/// An insertion-ordered term -> boost map. Re-inserting a term keeps its
/// original position and takes the new boost.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TermBoosts {
    entries: Vec<(String, f32)>,
}

impl TermBoosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, term: impl Into<String>, boost: f32) {
        let term = term.into();
        match self.entries.iter_mut().find(|(t, _)| *t == term) {
            Some(entry) => entry.1 = boost,
            None => self.entries.push((term, boost)),
        }
    }

    pub fn get(&self, term: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(t, _)| t == term)
            .map(|(_, boost)| *boost)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(t, b)| (t.as_str(), *b))
    }

    pub fn terms(&self) -> Vec<&str> {
        self.entries.iter().map(|(t, _)| t.as_str()).collect()
    }
}

impl<S: Into<String>> FromIterator<(S, f32)> for TermBoosts {
    fn from_iter<I: IntoIterator<Item = (S, f32)>>(iter: I) -> Self {
        let mut boosts = TermBoosts::new();
        for (term, boost) in iter {
            boosts.insert(term, boost);
        }
        boosts
    }
}

/// One row of the boost table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoostTerm {
    /// Field the term is restricted to; empty means the default field.
    pub scope: String,
    pub term: String,
    pub boost: f32,
}

/// Boost terms for every field scope, as one table keyed by `(scope, term)`.
///
/// Scopes are listed in the order they were first created, terms within a
/// scope in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoostTermMap {
    scopes: Vec<String>,
    terms: Vec<BoostTerm>,
}

impl BoostTermMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn clear(&mut self) {
        self.scopes.clear();
        self.terms.clear();
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Scopes in creation order.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The terms boosted within one scope.
    pub fn scope_terms(&self, scope: &str) -> TermBoosts {
        self.terms
            .iter()
            .filter(|t| t.scope == scope)
            .map(|t| (t.term.clone(), t.boost))
            .collect()
    }

    /// Every row, grouped by scope in creation order.
    pub fn rows(&self) -> Vec<&BoostTerm> {
        self.scopes
            .iter()
            .flat_map(|scope| self.terms.iter().filter(move |t| &t.scope == scope))
            .collect()
    }

    fn upsert(&mut self, scope: &str, term: &str, boost: f32) {
        if !self.has_scope(scope) {
            self.scopes.push(scope.to_string());
        }
        match self
            .terms
            .iter_mut()
            .find(|t| t.scope == scope && t.term == term)
        {
            Some(existing) => existing.boost = boost,
            None => self.terms.push(BoostTerm {
                scope: scope.to_string(),
                term: term.to_string(),
                boost,
            }),
        }
    }

    /// Add terms to a scope, overwriting boosts of terms already there.
    ///
    /// Compatibility quirk: an unscoped merge (`scope == ""`) into a table
    /// that has no unscoped entry but already has other scopes lands in the
    /// most recently created scope instead of opening an unscoped one.
    /// Existing callers rely on "add to whatever field is active".
    pub fn merge_into_field(&mut self, scope: &str, new_terms: &TermBoosts) {
        if new_terms.is_empty() {
            return;
        }

        let target = if scope.is_empty() && !self.has_scope("") {
            self.scopes.last().cloned().unwrap_or_default()
        } else {
            scope.to_string()
        };

        for (term, boost) in new_terms.iter() {
            self.upsert(&target, term, boost);
        }
    }

    /// Discard every scope and term, then add `new_terms` under `scope`.
    /// An empty `new_terms` leaves the table untouched.
    pub fn replace_all(&mut self, scope: &str, new_terms: &TermBoosts) {
        if new_terms.is_empty() {
            return;
        }
        self.clear();
        for (term, boost) in new_terms.iter() {
            self.upsert(scope, term, boost);
        }
    }
}

/// Build the boost map for a word list: one shared boost, optional negation.
pub fn compile_boost_map<S: AsRef<str>>(words: &[S], boost: f32, sign: BoostSign) -> TermBoosts {
    words
        .iter()
        .map(|word| (sign.apply(word.as_ref()), boost))
        .collect()
}

/// Expansion words recorded per topic, in the order topics were ranked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpansionWords {
    by_topic: Vec<(TopicId, Vec<String>)>,
}

impl ExpansionWords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a topic's words, replacing any earlier list for it in place.
    pub fn insert(&mut self, topic: TopicId, words: Vec<String>) {
        match self.by_topic.iter_mut().find(|(t, _)| *t == topic) {
            Some(entry) => entry.1 = words,
            None => self.by_topic.push((topic, words)),
        }
    }

    pub fn get(&self, topic: TopicId) -> Option<&[String]> {
        self.by_topic
            .iter()
            .find(|(t, _)| *t == topic)
            .map(|(_, words)| words.as_slice())
    }

    pub fn topics(&self) -> Vec<TopicId> {
        self.by_topic.iter().map(|(t, _)| *t).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TopicId, &[String])> {
        self.by_topic.iter().map(|(t, w)| (*t, w.as_slice()))
    }

    /// Concatenate the words of several topics, in the order given.
    ///
    /// Words shared between topics are kept twice; the boost map collapses
    /// them later. A topic that was never ranked is a precondition failure.
    pub fn words_for_topics(&self, topics: &[TopicId]) -> Result<Vec<String>> {
        let mut words = Vec::new();
        for &topic in topics {
            let topic_words = self.get(topic).ok_or_else(|| {
                ExpansionError::Precondition(format!(
                    "no expansion words recorded for topic {topic}"
                ))
            })?;
            words.extend(topic_words.iter().cloned());
        }
        Ok(words)
    }
}
