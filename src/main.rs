use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use iris::config::Config;
use iris::db::models::TopicId;
use iris::db::TopicStore;
use iris::engine::ExpansionEngine;
use iris::query::dismax::DisMaxQuery;
use iris::search::solr::SolrClient;
use iris::search::SearchBackend;
use iris::topics::expansion::BoostSign;

/// Iris: latent topic feedback for search.
///
/// Suggests latent topics for a pair of relevant documents using a
/// precomputed LDA topic model, then turns the topics the user picks into
/// boost terms for the next query.
#[derive(Parser)]
#[command(name = "iris", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Import a topic model dump (JSON)
    Import {
        /// Path to the dump file
        file: PathBuf,
    },

    /// Show system status (DB stats, model contents, threshold)
    Status,

    /// Show the coherence score at a percentile of all topics
    Threshold {
        /// Percentile in (0, 1], e.g. 0.25
        #[arg(long)]
        percentile: f64,
    },

    /// Show latent topics for two seed documents
    Topics {
        first_doc: String,
        second_doc: String,

        /// Print the expansion as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Build a boosted query from chosen latent topics
    Expand {
        first_doc: String,
        second_doc: String,

        /// Topics to expand with (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        topics: Vec<TopicId>,

        /// Field to scope the boost terms to
        #[arg(long)]
        field: Option<String>,

        /// Boost for the expansion terms (default: IRIS_DEFAULT_BOOST)
        #[arg(long)]
        boost: Option<f32>,

        /// '-' to push the terms down instead of up
        #[arg(long, default_value = "+", allow_hyphen_values = true)]
        sign: char,

        /// Replace existing boost terms instead of merging
        #[arg(long)]
        reset: bool,

        /// Query text the boosts apply to
        #[arg(long, default_value = "")]
        query: String,
    },

    /// Run a query against Solr
    Search {
        query: String,

        /// Number of results to fetch (default: 10)
        #[arg(long, default_value = "10")]
        rows: u32,

        /// Expand from the top two hits with every latent topic and search again
        #[arg(long)]
        expand_all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("iris=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing Iris database...");
            let conn = iris::db::initialize(&config.db_path)?;
            let table_count = iris::db::schema::table_count(&conn)?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: import a topic model");
            println!("  iris import <dump.json>");
        }

        Commands::Import { file } => {
            let dump = iris::db::import::load_dump(&file)?;
            let mut conn = iris::db::initialize(&config.db_path)?;
            let source = file.display().to_string();
            let summary = iris::db::import::import_model(&mut conn, &dump, &source)?;

            println!("{}", format!("Imported {source}").bold());
            println!("  Scored topics:          {}", summary.topics_scored);
            println!("  Documents:              {}", summary.documents);
            println!("  Topics with affinities: {}", summary.topics_with_affinity);
            println!("  Topics with n-grams:    {}", summary.topics_with_ngrams);
            println!("  Topics with words:      {}", summary.topics_with_words);
        }

        Commands::Status => {
            iris::status::show(&config)?;
        }

        Commands::Threshold { percentile } => {
            let store = iris::db::open_store(&config.db_path)?;
            let threshold =
                iris::topics::coherence::threshold_from_percentile(store.as_ref(), percentile)?;
            println!(
                "Coherence at the {:.0}th percentile: {}",
                percentile * 100.0,
                threshold
            );
            println!(
                "{}",
                format!("Set IRIS_THRESHOLD_PERCENTILE={percentile} to filter with it.").dimmed()
            );
        }

        Commands::Topics {
            first_doc,
            second_doc,
            json,
        } => {
            let engine = build_engine(&config)?;
            let ctx = engine.expand(&first_doc, &second_doc)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ctx)?);
            } else {
                iris::output::terminal::display_latent_topics(&ctx);
            }
        }

        Commands::Expand {
            first_doc,
            second_doc,
            topics,
            field,
            boost,
            sign,
            reset,
            query,
        } => {
            let engine = build_engine(&config)?;
            let ctx = engine.expand(&first_doc, &second_doc)?;
            let mut dismax = new_query(&config, query);

            let scope = field.as_deref().or(config.query_field.as_deref());
            if reset {
                ctx.reset_boost_query(&mut dismax, &topics, scope, boost)?;
            } else {
                let sign = BoostSign::from_char(sign);
                ctx.expand_boost_query(&mut dismax, &topics, scope, boost, sign)?;
            }

            iris::output::terminal::display_boost_query(&dismax);
            println!("{}", dismax.to_query_string());
        }

        Commands::Search {
            query,
            rows,
            expand_all,
        } => {
            config.require_solr()?;
            let client = SolrClient::new(&config.solr_url)?;
            let mut dismax = new_query(&config, query);

            let hits = client.search(&dismax, rows).await?;
            iris::output::terminal::display_search_hits(&hits);

            if expand_all {
                let engine_config = config.clone();
                let engine = tokio::task::spawn_blocking(move || build_engine(&engine_config))
                    .await
                    .context("Engine setup task failed")??;
                let ctx = Arc::new(engine)
                    .expand_from_hits_blocking(hits)
                    .await?;
                iris::output::terminal::display_latent_topics(&ctx);

                let scope = config.query_field.as_deref();
                ctx.expand_boost_query(
                    &mut dismax,
                    ctx.latent_topics(),
                    scope,
                    None,
                    BoostSign::Positive,
                )?;
                iris::output::terminal::display_boost_query(&dismax);

                let hits = client
                    .search(&dismax, rows)
                    .await
                    .context("Expanded search failed")?;
                iris::output::terminal::display_search_hits(&hits);
            }
        }
    }

    Ok(())
}

/// Open the topic store and configure an engine from the environment.
fn build_engine(config: &Config) -> Result<ExpansionEngine> {
    let store: Arc<dyn TopicStore> = iris::db::open_store(&config.db_path)?;
    let stats = store.model_stats()?;
    if stats.is_empty() {
        anyhow::bail!(
            "No topic model in {}. Run `iris import <dump.json>` first.",
            config.db_path
        );
    }

    let engine = ExpansionEngine::new(store).with_related_shortfall(config.related_shortfall);
    let engine = match config.threshold_percentile {
        Some(p) => engine.with_percentile_threshold(p)?,
        None => engine.with_threshold(config.topic_threshold),
    };
    info!(threshold = engine.threshold(), "Coherence threshold");
    Ok(engine)
}

/// A DisMax query carrying the configured default boost and query field.
fn new_query(config: &Config, text: String) -> DisMaxQuery {
    let mut query = DisMaxQuery::new(text);
    query.set_default_boost(config.default_boost);
    if let Some(field) = config.query_field.as_deref() {
        query.set_query_field(field, None);
    }
    query
}
