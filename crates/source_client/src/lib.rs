//! Remote record services client for the importers.
//!
//! This crate is the single source of truth for the remote wire contract:
//! the `{results, next}` pagination envelope, single JSON documents, the
//! catalog document, CSV exports and media lookups.
//!
//! Blocking reqwest client, no Tokio runtime. No retries: a failed call
//! is reported once and the caller decides whether it is fatal.

mod client;
mod error;
mod pages;

pub use client::{build_url, SourceClient, DEFAULT_TIMEOUT, USER_AGENT};
pub use error::FetchError;
pub use pages::Pages;
