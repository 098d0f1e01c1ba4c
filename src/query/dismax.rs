// DisMax query building — query fields and boost terms for Solr.
//
// A DisMaxQuery carries the user's query string plus two weighted maps:
// query fields (`qf`: field -> boost) and boost terms (`bq`: field scope ->
// term -> boost). Expansion writes into the boost terms; this module turns
// both maps into request parameters.

use serde::Serialize;

use crate::topics::expansion::{BoostTermMap, TermBoosts};

/// Boost applied when a caller doesn't give one.
pub const DEFAULT_BOOST: f32 = 1.0;

/// Parameter names understood by the DisMax query parser.
pub mod params {
    pub const DEF_TYPE: &str = "defType";
    pub const DISMAX: &str = "dismax";
    pub const QUERY: &str = "q";
    pub const QF: &str = "qf";
    pub const BQ: &str = "bq";
    pub const ROWS: &str = "rows";
    pub const HIGHLIGHT: &str = "hl";
    pub const HIGHLIGHT_FIELDS: &str = "hl.fl";
    pub const HIGHLIGHT_SNIPPETS: &str = "hl.snippets";
}

/// Render a boost the way Solr's own clients do: whole numbers keep one
/// decimal place (`1.0`, not `1`).
pub fn format_boost(boost: f32) -> String {
    if boost.fract() == 0.0 && boost.abs() < 1e7 {
        format!("{boost:.1}")
    } else {
        format!("{boost}")
    }
}

/// Render one scoped boost term. A negated term keeps its `-` in front of
/// the field so the whole clause is negated.
fn format_boost_term(scope: &str, term: &str, boost: f32) -> String {
    let boost = format_boost(boost);
    match (scope.is_empty(), term.strip_prefix('-')) {
        (true, _) => format!("{term}^{boost}"),
        (false, Some(rest)) => format!("-{scope}:{rest}^{boost}"),
        (false, None) => format!("{scope}:{term}^{boost}"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Highlight {
    snippets: u32,
    fields: Vec<String>,
}

/// A DisMax query under construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisMaxQuery {
    query: String,
    default_boost: f32,
    query_fields: TermBoosts,
    boost_query: BoostTermMap,
    rows: Option<u32>,
    highlight: Option<Highlight>,
}

impl Default for DisMaxQuery {
    fn default() -> Self {
        Self::new("")
    }
}

impl DisMaxQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            default_boost: DEFAULT_BOOST,
            query_fields: TermBoosts::new(),
            boost_query: BoostTermMap::new(),
            rows: None,
            highlight: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) -> &mut Self {
        self.query = query.into();
        self
    }

    pub fn default_boost(&self) -> f32 {
        self.default_boost
    }

    pub fn set_default_boost(&mut self, boost: f32) -> &mut Self {
        self.default_boost = boost;
        self
    }

    pub fn set_rows(&mut self, rows: u32) -> &mut Self {
        self.rows = Some(rows);
        self
    }

    // --- Query fields ---

    pub fn query_fields(&self) -> &TermBoosts {
        &self.query_fields
    }

    /// Search only `field`, at `boost` (or the default boost). Empty field
    /// names are ignored.
    pub fn set_query_field(&mut self, field: &str, boost: Option<f32>) -> &mut Self {
        if field.is_empty() {
            return self;
        }
        let boost = boost.unwrap_or(self.default_boost);
        self.query_fields = TermBoosts::new();
        self.query_fields.insert(field, boost);
        self
    }

    /// Search exactly these fields at the default boost.
    pub fn set_query_fields(&mut self, fields: &[&str]) -> &mut Self {
        if fields.is_empty() {
            return self;
        }
        let boost = self.default_boost;
        self.query_fields = fields.iter().map(|f| (*f, boost)).collect();
        self
    }

    /// Search exactly these weighted fields.
    pub fn set_boosted_query_fields(&mut self, fields: TermBoosts) -> &mut Self {
        if !fields.is_empty() {
            self.query_fields = fields;
        }
        self
    }

    /// Also search `field`, at `boost` (or the default boost).
    pub fn add_query_field(&mut self, field: &str, boost: Option<f32>) -> &mut Self {
        let boost = boost.unwrap_or(self.default_boost);
        self.query_fields.insert(field, boost);
        self
    }

    // --- Boost query ---

    pub fn boost_query(&self) -> &BoostTermMap {
        &self.boost_query
    }

    /// Replace every boost term with `terms` under `scope`.
    pub fn set_boost_query(&mut self, scope: &str, terms: &TermBoosts) -> &mut Self {
        self.boost_query.replace_all(scope, terms);
        self
    }

    /// Merge `terms` into `scope` (see `BoostTermMap::merge_into_field` for
    /// how an empty scope is resolved).
    pub fn add_boost_query(&mut self, scope: &str, terms: &TermBoosts) -> &mut Self {
        self.boost_query.merge_into_field(scope, terms);
        self
    }

    /// Merge a single term at `boost` (or the default boost).
    pub fn add_boost_term(&mut self, scope: &str, term: &str, boost: Option<f32>) -> &mut Self {
        if term.is_empty() {
            return self;
        }
        let mut terms = TermBoosts::new();
        terms.insert(term, boost.unwrap_or(self.default_boost));
        self.add_boost_query(scope, &terms)
    }

    // --- Highlighting ---

    pub fn set_highlights(&mut self, snippets: u32, fields: &[&str]) -> &mut Self {
        self.highlight = Some(Highlight {
            snippets,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    // --- Serialization ---

    /// The `qf` value, e.g. `title^2.0 body^1.0`.
    pub fn qf_param(&self) -> Option<String> {
        if self.query_fields.is_empty() {
            return None;
        }
        let value = self
            .query_fields
            .iter()
            .map(|(field, boost)| format!("{field}^{}", format_boost(boost)))
            .collect::<Vec<_>>()
            .join(" ");
        Some(value)
    }

    /// The `bq` value, e.g. `court^1.0 author:Doe^0.5`.
    pub fn bq_param(&self) -> Option<String> {
        if self.boost_query.is_empty() {
            return None;
        }
        let value = self
            .boost_query
            .rows()
            .iter()
            .map(|row| format_boost_term(&row.scope, &row.term, row.boost))
            .collect::<Vec<_>>()
            .join(" ");
        Some(value)
    }

    /// All request parameters, in a stable order.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut out = vec![
            (params::QUERY.to_string(), self.query.clone()),
            (params::DEF_TYPE.to_string(), params::DISMAX.to_string()),
        ];
        if let Some(qf) = self.qf_param() {
            out.push((params::QF.to_string(), qf));
        }
        if let Some(bq) = self.bq_param() {
            out.push((params::BQ.to_string(), bq));
        }
        if let Some(rows) = self.rows {
            out.push((params::ROWS.to_string(), rows.to_string()));
        }
        if let Some(ref hl) = self.highlight {
            out.push((params::HIGHLIGHT.to_string(), "true".to_string()));
            out.push((params::HIGHLIGHT_FIELDS.to_string(), hl.fields.join(",")));
            out.push((params::HIGHLIGHT_SNIPPETS.to_string(), hl.snippets.to_string()));
        }
        out
    }

    /// The parameters as a URL-encoded query string.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_params())
            .finish()
    }
}
