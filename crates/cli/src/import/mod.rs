//! `mainsite <source> import`: one module per remote source.
//!
//! Every importer follows the same shape: resolve settings, fetch the whole
//! source (any fetch error aborts before the store is touched), open the
//! store snapshot, reconcile, save, report.

pub mod colleges;
pub mod degrees;
pub mod experts;
pub mod pool;
pub mod research;
pub mod resources;
pub mod thumbnails;

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};

use mainsite_config::{ConfigError, Settings, STORE_ENV};
use mainsite_recon::{MemoryRepository, SyncError};
use mainsite_source_client::SourceClient;

use crate::CliError;

/// Per-invocation state shared by the importers.
pub struct Context {
    pub settings: Settings,
    store: Option<PathBuf>,
    json: bool,
}

impl Context {
    pub fn new(settings: Settings, store: Option<PathBuf>, json: bool) -> Self {
        Self { settings, store, json }
    }

    /// `--store`, else the configured path.
    pub fn store_path(&self) -> Result<PathBuf, ConfigError> {
        self.store
            .clone()
            .or_else(|| self.settings.store.path.clone())
            .ok_or_else(|| ConfigError::Missing {
                name: "content store".into(),
                flag: "--store".into(),
                env: Some(STORE_ENV.into()),
            })
    }

    /// Load the snapshot; a missing file is an empty store.
    pub fn open_store(&self) -> Result<(PathBuf, MemoryRepository), CliError> {
        let path = self.store_path()?;
        let repo = MemoryRepository::load(&path)?;
        info!(path = %path.display(), "store opened");
        Ok((path, repo))
    }

    /// Save the store whatever the run's outcome, then surface the outcome.
    ///
    /// Writes issued before a fatal error stay applied, so they are
    /// persisted too; the next run converges the rest.
    pub fn finish<T>(&self, path: &Path, repo: &MemoryRepository, outcome: Result<T, SyncError>) -> Result<T, CliError> {
        let saved = repo.save(path);
        let value = outcome.inspect_err(|err| error!(error = %err, "run aborted"))?;
        saved?;
        Ok(value)
    }

    pub fn client(&self, timeout_secs: u64) -> Result<SourceClient, CliError> {
        Ok(SourceClient::new(Duration::from_secs(timeout_secs))?)
    }

    /// Stats to stdout, as text or as a JSON object.
    pub fn report<T: Serialize + Display>(&self, stats: &T) -> Result<(), CliError> {
        if self.json {
            let json = serde_json::to_string_pretty(stats)
                .map_err(|e| CliError::general(format!("cannot serialize stats: {e}")))?;
            println!("{json}");
        } else {
            println!("{stats}");
        }
        Ok(())
    }
}

/// Contents of a local export file; an unreadable file is a usage error.
pub(crate) fn read_source(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| CliError::usage(format!("cannot read {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mainsite_recon::StoreError;

    fn context(store: Option<&Path>, configured: Option<&Path>) -> Context {
        let mut settings = Settings::default();
        settings.store.path = configured.map(Path::to_path_buf);
        Context::new(settings, store.map(Path::to_path_buf), false)
    }

    #[test]
    fn store_flag_wins_over_settings() {
        let ctx = context(Some(Path::new("/tmp/flag.json")), Some(Path::new("/tmp/file.json")));
        assert_eq!(ctx.store_path().unwrap(), PathBuf::from("/tmp/flag.json"));

        let ctx = context(None, Some(Path::new("/tmp/file.json")));
        assert_eq!(ctx.store_path().unwrap(), PathBuf::from("/tmp/file.json"));
    }

    #[test]
    fn missing_store_names_the_flag() {
        let err = context(None, None).store_path().unwrap_err();
        assert_eq!(err.hint().as_deref(), Some("pass --store or set MAINSITE_STORE"));
    }

    #[test]
    fn failed_run_still_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let ctx = context(Some(&path), None);
        let (path, repo) = ctx.open_store().unwrap();

        let outcome: Result<(), SyncError> = Err(StoreError::Unavailable("gone".into()).into());
        let err = ctx.finish(&path, &repo, outcome).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_STORE_UNAVAILABLE);
        assert!(path.exists());
    }
}
