use std::env;

use anyhow::{Context, Result};

use crate::engine::RelatedShortfall;
use crate::query::dismax::DEFAULT_BOOST;
use crate::topics::coherence::DEFAULT_TOPIC_THRESHOLD;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite file holding the imported topic model.
    pub db_path: String,
    /// Solr collection URL (only needed by `search`).
    pub solr_url: String,
    /// Absolute coherence threshold; topics scoring below it are dropped.
    pub topic_threshold: f64,
    /// When set, the threshold is taken from this percentile of all
    /// coherence scores instead.
    pub threshold_percentile: Option<f64>,
    pub default_boost: f32,
    /// Field that expansion boost terms are scoped to. Unset means unscoped.
    pub query_field: Option<String>,
    pub related_shortfall: RelatedShortfall,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every value has a default; only malformed numbers are errors.
    pub fn load() -> Result<Self> {
        let topic_threshold = match env::var("IRIS_TOPIC_THRESHOLD") {
            Ok(v) => v
                .trim()
                .parse::<f64>()
                .with_context(|| format!("IRIS_TOPIC_THRESHOLD is not a number: {v:?}"))?,
            Err(_) => DEFAULT_TOPIC_THRESHOLD,
        };

        let threshold_percentile = match env::var("IRIS_THRESHOLD_PERCENTILE") {
            Ok(v) => {
                let p = v
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("IRIS_THRESHOLD_PERCENTILE is not a number: {v:?}"))?;
                if !(p > 0.0 && p <= 1.0) {
                    anyhow::bail!("IRIS_THRESHOLD_PERCENTILE must be in (0, 1], got {p}");
                }
                Some(p)
            }
            Err(_) => None,
        };

        let default_boost = match env::var("IRIS_DEFAULT_BOOST") {
            Ok(v) => v
                .trim()
                .parse::<f32>()
                .with_context(|| format!("IRIS_DEFAULT_BOOST is not a number: {v:?}"))?,
            Err(_) => DEFAULT_BOOST,
        };

        let related_shortfall = match env::var("IRIS_RELATED_SHORTFALL") {
            Ok(v) => v.parse::<RelatedShortfall>()?,
            Err(_) => RelatedShortfall::default(),
        };

        Ok(Self {
            db_path: env::var("IRIS_DB_PATH").unwrap_or_else(|_| "./iris.db".to_string()),
            solr_url: env::var("SOLR_URL")
                .unwrap_or_else(|_| "http://localhost:8983/solr/collection1".to_string()),
            topic_threshold,
            threshold_percentile,
            default_boost,
            query_field: env::var("IRIS_QUERY_FIELD").ok().filter(|f| !f.is_empty()),
            related_shortfall,
        })
    }

    /// Check that a Solr URL is usable.
    /// Call this before any operation that talks to the search index.
    pub fn require_solr(&self) -> Result<()> {
        if !(self.solr_url.starts_with("http://") || self.solr_url.starts_with("https://")) {
            anyhow::bail!(
                "SOLR_URL must be an http(s) URL, got {:?}.\n\
                 Add it to your .env file. See .env.example for the available variables.",
                self.solr_url
            );
        }
        Ok(())
    }
}
