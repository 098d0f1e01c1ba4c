// Colored terminal output for latent topics, boost terms and search hits.
//
// main.rs delegates all formatting here so command handlers stay small.

use colored::Colorize;

use crate::db::models::TopicId;
use crate::engine::{ExpansionContext, TopicTerms};
use crate::query::dismax::{format_boost, DisMaxQuery};
use crate::search::SearchHit;

const TERM_COLUMN_WIDTH: usize = 60;

/// Display the latent topics of an expansion, one block per topic.
pub fn display_latent_topics(ctx: &ExpansionContext) {
    let latent = ctx.latent_topics();
    println!(
        "\n{}",
        format!("=== Latent Topics ({}) ===", latent.len()).bold()
    );
    println!(
        "  {} {}   {} {}",
        "Enriched:".dimmed(),
        format_topic_list(ctx.enriched()),
        "Related:".dimmed(),
        format_topic_list(ctx.related()),
    );
    println!();

    for terms in ctx.terms() {
        let origin = if ctx.enriched().contains(&terms.topic) {
            "enriched".cyan()
        } else {
            "related".magenta()
        };
        display_topic_terms(terms, &origin.to_string());
    }
}

fn display_topic_terms(terms: &TopicTerms, origin: &str) {
    println!("  {} {}", format!("Topic {}", terms.topic).bold(), origin);

    let trigram = terms.ngrams.trigram_text();
    let trigram = if terms.ngrams.trigram.is_some() {
        trigram.normal()
    } else {
        trigram.dimmed()
    };
    println!("    {:<10} {}", "trigram".dimmed(), trigram);

    let bigrams = super::truncate_chars(&terms.ngrams.bigram_text(), TERM_COLUMN_WIDTH);
    println!("    {:<10} {}", "bigrams".dimmed(), bigrams);

    let words = super::truncate_chars(&terms.unigrams.display_text(), TERM_COLUMN_WIDTH);
    println!("    {:<10} {}", "words".dimmed(), words.green());
}

/// Display the boost terms a query will send, grouped by field scope.
pub fn display_boost_query(query: &DisMaxQuery) {
    let bq = query.boost_query();
    if bq.is_empty() {
        println!("No boost terms. Run `iris expand` with --topics to add some.");
        return;
    }

    println!("\n{}", "=== Boost Terms ===".bold());
    for scope in bq.scopes() {
        let label = if scope.is_empty() {
            "(any field)".dimmed().to_string()
        } else {
            scope.yellow().to_string()
        };
        println!("  {label}");
        for (term, boost) in bq.scope_terms(scope).iter() {
            let term = if term.starts_with('-') {
                term.red()
            } else {
                term.normal()
            };
            println!("    {:<24} ^{}", term, format_boost(boost));
        }
    }
    println!();
}

/// Display ranked search hits.
pub fn display_search_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No documents matched.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Results ({} documents) ===", hits.len()).bold()
    );
    for (i, hit) in hits.iter().enumerate() {
        let score = hit
            .score
            .map(|s| format!("{s:.3}"))
            .unwrap_or_else(|| "-".to_string());
        let rank = format!("{:>4}.", i + 1);
        let rank = if i < 2 { rank.bold() } else { rank.normal() };
        println!("  {} {:<40} {:>8}", rank, hit.id, score.dimmed());
    }
    println!();
}

fn format_topic_list(topics: &[TopicId]) -> String {
    if topics.is_empty() {
        return "none".to_string();
    }
    topics
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
