//! `mainsite-recon`: record reconciliation for the content importers.
//!
//! Pure engine crate: normalizes remote records, matches them against the
//! local content repository by stable key and converges the repository.
//! No HTTP or CLI dependencies; fetching lives in `mainsite-source-client`.

pub mod classify;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod memory;
pub mod model;
pub mod normalize;
pub mod stats;
pub mod store;
pub mod taxonomy;
pub mod thumbnails;
pub mod wxr;

pub use engine::{Reconciler, RunOptions, SyncMode};
pub use error::{RecordError, SourceError, StoreError, SyncError};
pub use memory::MemoryRepository;
pub use model::{NormalizedRecord, Outcome, RemoteRecord};
pub use normalize::normalize;
pub use stats::RunStats;
pub use store::ContentRepository;
