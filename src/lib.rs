//! moviemind: personal movie recommendations from a Letterboxd export
//!
//! A watch history is turned into paraphrased text documents, embedded into a
//! Qdrant collection, and retrieved by semantic search. Retrieved favourites
//! seed a prompt for a generative model that suggests unseen movies.

pub mod commands;
pub mod config;
pub mod documents;
pub mod embed;
pub mod error;
pub mod expand;
pub mod generate;
pub mod loader;
pub mod profile;
pub mod progress;
pub mod recommend;
pub mod retrieval;
pub mod store;

#[cfg(test)]
mod test_support;
