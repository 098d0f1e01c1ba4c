// Search backend — the swap-ready boundary to the document index.
//
// Expansion needs exactly one thing from search: the ranked document ids
// for a query, so it can seed topic selection with the top two hits.

pub mod solr;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{ExpansionError, Result};
use crate::query::dismax::DisMaxQuery;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: Option<f32>,
}

impl SearchHit {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score: None,
        }
    }
}

/// The ids of the two top-ranked hits, in rank order.
pub fn first_two_result_ids(hits: &[SearchHit]) -> Result<(String, String)> {
    match hits {
        [first, second, ..] => Ok((first.id.clone(), second.id.clone())),
        _ => Err(ExpansionError::Precondition(format!(
            "expansion needs at least two search results, got {}",
            hits.len()
        ))),
    }
}

/// A document index that answers DisMax queries.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &DisMaxQuery, rows: u32) -> anyhow::Result<Vec<SearchHit>>;
}
