// Expansion engine — runs one query-expansion request end to end.
//
// The engine itself only holds the shared topic store and fixed settings,
// so one engine serves any number of sequential requests. Everything a
// request derives (enriched and related topics, ranked terms, expansion
// words) lives in the ExpansionContext it returns.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::db::models::TopicId;
use crate::db::TopicStore;
use crate::error::{ExpansionError, Result};
use crate::query::dismax::DisMaxQuery;
use crate::search::{first_two_result_ids, SearchHit};
use crate::topics::coherence::{threshold_from_percentile, DEFAULT_TOPIC_THRESHOLD};
use crate::topics::expansion::{compile_boost_map, BoostSign, ExpansionWords, TermBoosts};
use crate::topics::ranker::{SelectedNGrams, SelectedUnigrams, TermRanker};
use crate::topics::selector::{latent_topics, TopicSelector};

/// What to do when an enriched topic has fewer than two related topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelatedShortfall {
    /// Fail the request with `InsufficientCandidates`.
    #[default]
    Fail,
    /// Leave that topic's related topics out.
    Skip,
}

impl FromStr for RelatedShortfall {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(RelatedShortfall::Fail),
            "skip" => Ok(RelatedShortfall::Skip),
            other => anyhow::bail!("Unknown related-topic shortfall policy {other:?} (expected fail or skip)"),
        }
    }
}

/// Display terms for one latent topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicTerms {
    pub topic: TopicId,
    pub ngrams: SelectedNGrams,
    pub unigrams: SelectedUnigrams,
}

/// Stateless driver over a shared topic store.
pub struct ExpansionEngine {
    store: Arc<dyn TopicStore>,
    threshold: f64,
    shortfall: RelatedShortfall,
}

impl ExpansionEngine {
    pub fn new(store: Arc<dyn TopicStore>) -> Self {
        Self {
            store,
            threshold: DEFAULT_TOPIC_THRESHOLD,
            shortfall: RelatedShortfall::default(),
        }
    }

    /// Use an absolute coherence threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Use the coherence score at `percentile` of all topics as threshold.
    pub fn with_percentile_threshold(mut self, percentile: f64) -> Result<Self> {
        self.threshold = threshold_from_percentile(self.store.as_ref(), percentile)?;
        Ok(self)
    }

    pub fn with_related_shortfall(mut self, shortfall: RelatedShortfall) -> Self {
        self.shortfall = shortfall;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn store(&self) -> &dyn TopicStore {
        self.store.as_ref()
    }

    /// Select and rank topics for two seed documents.
    pub fn expand(&self, first_doc: &str, second_doc: &str) -> Result<ExpansionContext> {
        let store = self.store.as_ref();
        let selector = TopicSelector::new(store, self.threshold);

        let enriched = selector.select_enriched(first_doc, second_doc)?;
        let related = match self.shortfall {
            RelatedShortfall::Fail => selector.select_related(&enriched)?,
            RelatedShortfall::Skip => selector.select_related_lenient(&enriched)?,
        };
        let latent = latent_topics(&enriched, &related);

        let ranker = TermRanker::new(store);
        let mut terms = Vec::with_capacity(latent.len());
        let mut expansion_words = ExpansionWords::new();
        for &topic in &latent {
            let ngrams = ranker.select_ngrams(topic)?;
            let unigrams = ranker.select_unigrams(topic)?;
            expansion_words.insert(topic, unigrams.expansion_words.clone());
            terms.push(TopicTerms {
                topic,
                ngrams,
                unigrams,
            });
        }

        info!(
            first_doc,
            second_doc,
            enriched = enriched.len(),
            related = related.len(),
            latent = latent.len(),
            "Expanded seed documents into latent topics"
        );

        Ok(ExpansionContext {
            enriched,
            related,
            latent,
            terms,
            expansion_words,
        })
    }

    /// Expand using the top two hits of a search as seed documents.
    pub fn expand_from_hits(&self, hits: &[SearchHit]) -> Result<ExpansionContext> {
        let (first, second) = first_two_result_ids(hits)?;
        self.expand(&first, &second)
    }

    /// `expand_from_hits` on tokio's blocking pool, keeping the SQLite
    /// reads off the async worker threads.
    pub async fn expand_from_hits_blocking(
        self: Arc<Self>,
        hits: Vec<SearchHit>,
    ) -> Result<ExpansionContext> {
        tokio::task::spawn_blocking(move || self.expand_from_hits(&hits))
            .await
            .map_err(|e| {
                ExpansionError::Store(anyhow::Error::new(e).context("Expansion task failed"))
            })?
    }
}

/// Everything derived for one expansion request.
#[derive(Debug, Clone, Serialize)]
pub struct ExpansionContext {
    enriched: Vec<TopicId>,
    related: Vec<TopicId>,
    latent: Vec<TopicId>,
    terms: Vec<TopicTerms>,
    expansion_words: ExpansionWords,
}

impl ExpansionContext {
    pub fn enriched(&self) -> &[TopicId] {
        &self.enriched
    }

    pub fn related(&self) -> &[TopicId] {
        &self.related
    }

    /// Enriched topics followed by new related topics: the topics offered
    /// to the user.
    pub fn latent_topics(&self) -> &[TopicId] {
        &self.latent
    }

    pub fn terms(&self) -> &[TopicTerms] {
        &self.terms
    }

    pub fn topic_terms(&self, topic: TopicId) -> Option<&TopicTerms> {
        self.terms.iter().find(|t| t.topic == topic)
    }

    pub fn expansion_words(&self) -> &ExpansionWords {
        &self.expansion_words
    }

    /// Boost map for the expansion words of the given topics.
    pub fn boost_terms(&self, topics: &[TopicId], boost: f32, sign: BoostSign) -> Result<TermBoosts> {
        if topics.is_empty() {
            return Err(ExpansionError::Precondition(
                "no topics chosen for expansion".to_string(),
            ));
        }
        let words = self.expansion_words.words_for_topics(topics)?;
        Ok(compile_boost_map(&words, boost, sign))
    }

    /// Add the topics' expansion words to the query's boost terms.
    ///
    /// `scope` restricts the terms to a field; `boost` defaults to the
    /// query's default boost.
    pub fn expand_boost_query(
        &self,
        query: &mut DisMaxQuery,
        topics: &[TopicId],
        scope: Option<&str>,
        boost: Option<f32>,
        sign: BoostSign,
    ) -> Result<()> {
        let boost = boost.unwrap_or_else(|| query.default_boost());
        let terms = self.boost_terms(topics, boost, sign)?;
        query.add_boost_query(scope.unwrap_or(""), &terms);
        Ok(())
    }

    /// Replace the query's boost terms with the topics' expansion words.
    /// Replacement always boosts positively.
    pub fn reset_boost_query(
        &self,
        query: &mut DisMaxQuery,
        topics: &[TopicId],
        scope: Option<&str>,
        boost: Option<f32>,
    ) -> Result<()> {
        let boost = boost.unwrap_or_else(|| query.default_boost());
        let terms = self.boost_terms(topics, boost, BoostSign::Positive)?;
        query.set_boost_query(scope.unwrap_or(""), &terms);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortfall_parse() {
        assert_eq!("fail".parse::<RelatedShortfall>().unwrap(), RelatedShortfall::Fail);
        assert_eq!(" Skip ".parse::<RelatedShortfall>().unwrap(), RelatedShortfall::Skip);
        assert!("ignore".parse::<RelatedShortfall>().is_err());
    }
}
