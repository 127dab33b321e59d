//! Backend for band writeups: streams a paragraph about a band from a hosted
//! language model, scores it with a few text metrics, generates a matching
//! photo, and keeps the latest result in a document store.

pub mod ai;
pub mod api;
pub mod app;
pub mod error;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod repository;
pub mod storage;

pub use error::{Error, Result};
