// HTTP client for a Solr select handler.
//
// Sends DisMax queries built by `query::dismax` and reads back the ranked
// document ids. Solr collections differ on whether `id` is a string or a
// number, so both are accepted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{SearchBackend, SearchHit};
use crate::query::dismax::DisMaxQuery;

/// A document id as Solr returns it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Text(String),
    Number(i64),
}

impl DocumentId {
    pub fn into_string(self) -> String {
        match self {
            DocumentId::Text(s) => s,
            DocumentId::Number(n) => n.to_string(),
        }
    }
}

/// A single result document; only the fields expansion reads.
#[derive(Debug, Clone, Deserialize)]
pub struct SolrDocument {
    pub id: DocumentId,
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolrResultSet {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    #[serde(default)]
    pub docs: Vec<SolrDocument>,
}

/// Response from the `/select` handler with `wt=json`.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectResponse {
    pub response: SolrResultSet,
}

impl SelectResponse {
    pub fn into_hits(self) -> Vec<SearchHit> {
        self.response
            .docs
            .into_iter()
            .map(|doc| SearchHit {
                id: doc.id.into_string(),
                score: doc.score,
            })
            .collect()
    }
}

/// Client for one Solr collection.
pub struct SolrClient {
    client: reqwest::Client,
    base_url: String,
}

impl SolrClient {
    /// `base_url` is the collection URL, e.g. `http://localhost:8983/solr/collection1`.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("iris/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn select_url(&self) -> String {
        format!("{}/select", self.base_url)
    }

    /// Run a query and return the raw select response.
    pub async fn select(&self, query: &DisMaxQuery, rows: u32) -> Result<SelectResponse> {
        let mut params = query.to_params();
        params.retain(|(key, _)| key != "rows");
        params.push(("rows".to_string(), rows.to_string()));
        params.push(("fl".to_string(), "id,score".to_string()));
        params.push(("wt".to_string(), "json".to_string()));

        let url = self.select_url();
        debug!(url = %url, q = query.query(), rows, "Querying Solr");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .context("Solr request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Solr returned {}: {}", status, body);
        }

        response
            .json::<SelectResponse>()
            .await
            .context("Failed to parse Solr response")
    }
}

#[async_trait]
impl SearchBackend for SolrClient {
    async fn search(&self, query: &DisMaxQuery, rows: u32) -> Result<Vec<SearchHit>> {
        let response = self.select(query, rows).await?;
        debug!(
            found = response.response.num_found,
            returned = response.response.docs.len(),
            "Solr results"
        );
        Ok(response.into_hits())
    }
}
