// Iris: latent topic feedback and query expansion
//
// This is the library root. Each module corresponds to a stage of the
// expansion flow: the stored topic model, topic selection and ranking,
// boost compiling, and the search-engine boundary.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod output;
pub mod query;
pub mod search;
pub mod status;
pub mod topics;
