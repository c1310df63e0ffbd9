//! `mainsite degrees`: degree programs from the program search.

use std::collections::BTreeMap;
use std::fmt;

use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use mainsite_config::{required, CATALOG_URL_ENV, SEARCH_URL_ENV};
use mainsite_recon::engine::remove_all;
use mainsite_recon::matcher::CatalogEntry;
use mainsite_recon::normalize::degree::{
    DegreeRecord, CONTENT_TYPE, KEY_FIELD, TAX_COLLEGES, TAX_DEPARTMENTS, TAX_PROGRAM_TYPES,
};
use mainsite_recon::store::Criteria;
use mainsite_recon::taxonomy::{clear_taxonomy, seed_program_types};
use mainsite_recon::{
    normalize, MemoryRepository, NormalizedRecord, Reconciler, RecordError, RemoteRecord, RunOptions, RunStats,
    SyncError,
};

use super::Context;
use crate::CliError;

#[derive(Subcommand)]
pub enum DegreeCommands {
    /// Converge degree records to the program search, with catalog PDFs
    #[command(after_help = "\
Examples:
  mainsite degrees import --search-url https://search.example.edu/api/v1/ \\
      --catalog-url https://catalog.example.edu/programs.json --store store.json
  MAINSITE_SEARCH_URL=https://search.example.edu/api/v1/ mainsite degrees import --json")]
    Import {
        /// Search service base URL (default: $MAINSITE_SEARCH_URL, then [search] base_url)
        #[arg(long)]
        search_url: Option<String>,

        /// Catalog programs document (default: $MAINSITE_CATALOG_URL, then [catalog] url)
        #[arg(long)]
        catalog_url: Option<String>,
    },

    /// Delete every degree record and the degree taxonomies
    Reset,
}

pub fn cmd_degrees(ctx: &Context, cmd: DegreeCommands) -> Result<(), CliError> {
    match cmd {
        DegreeCommands::Import { search_url, catalog_url } => import(ctx, search_url.as_deref(), catalog_url.as_deref()),
        DegreeCommands::Reset => reset(ctx),
    }
}

fn import(ctx: &Context, search_url: Option<&str>, catalog_url: Option<&str>) -> Result<(), CliError> {
    let settings = &ctx.settings;
    let search_url = required(
        search_url.or(settings.search.base_url.as_deref()),
        "search service URL",
        "--search-url",
        Some(SEARCH_URL_ENV),
    )?;
    let catalog_url = required(
        catalog_url.or(settings.catalog.url.as_deref()),
        "catalog URL",
        "--catalog-url",
        Some(CATALOG_URL_ENV),
    )?;
    let client = ctx.client(settings.search.timeout_secs)?;

    info!(url = %search_url, "fetching degrees");
    let raw: Vec<Value> = client.fetch_all(&search_url, &[("use", "programSearch")])?.collect::<Result<_, _>>()?;
    info!(url = %catalog_url, "fetching catalog");
    let catalog = catalog_entries(client.fetch_catalog(&catalog_url)?);
    info!(degrees = raw.len(), programs = catalog.len(), "sources fetched");

    let records = normalize_all(raw, &catalog);

    let (path, mut repo) = ctx.open_store()?;
    let outcome = reconcile(&mut repo, records);
    let stats = ctx.finish(&path, &repo, outcome)?;
    ctx.report(&stats)
}

/// Catalog programs; an entry that does not decode is dropped with a warning.
fn catalog_entries(programs: Vec<Value>) -> Vec<CatalogEntry> {
    programs
        .into_iter()
        .enumerate()
        .filter_map(|(index, program)| match serde_json::from_value(program) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(index, error = %err, "skipping catalog program");
                None
            }
        })
        .collect()
}

fn normalize_all(raw: Vec<Value>, catalog: &[CatalogEntry]) -> Vec<Result<NormalizedRecord, RecordError>> {
    raw.into_iter()
        .map(|value| {
            let record = DegreeRecord::from_json(value)?;
            normalize(&RemoteRecord::Degree(record), catalog)
        })
        .collect()
}

fn reconcile(repo: &mut MemoryRepository, records: Vec<Result<NormalizedRecord, RecordError>>) -> Result<RunStats, SyncError> {
    let seeded = seed_program_types(repo)?;
    let mut stats = Reconciler::new(repo, RunOptions::full_sync(CONTENT_TYPE, KEY_FIELD))?.run(records)?;
    if seeded > 0 {
        *stats.terms_created.entry(TAX_PROGRAM_TYPES.to_string()).or_default() += seeded;
    }
    Ok(stats)
}

// ── reset ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
struct ResetStats {
    removed: usize,
    terms_removed: BTreeMap<String, usize>,
}

impl fmt::Display for ResetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Removed         : {}", self.removed)?;
        for (taxonomy, count) in &self.terms_removed {
            write!(f, "\nRemoved {taxonomy:<8}: {count}")?;
        }
        Ok(())
    }
}

fn reset(ctx: &Context) -> Result<(), CliError> {
    let (path, mut repo) = ctx.open_store()?;
    let outcome = clear(&mut repo);
    let stats = ctx.finish(&path, &repo, outcome)?;
    ctx.report(&stats)
}

fn clear(repo: &mut MemoryRepository) -> Result<ResetStats, SyncError> {
    let mut stats = ResetStats { removed: remove_all(repo, &Criteria::new(CONTENT_TYPE, KEY_FIELD))?, ..Default::default() };
    for taxonomy in [TAX_PROGRAM_TYPES, TAX_COLLEGES, TAX_DEPARTMENTS] {
        stats.terms_removed.insert(taxonomy.to_string(), clear_taxonomy(repo, taxonomy)?);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bad_catalog_programs_are_dropped() {
        let entries = catalog_entries(vec![
            json!({"name": "History", "type": "Degree Program", "college": "College of Arts and Humanities"}),
            json!(17),
        ]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "History");
    }

    #[test]
    fn reconcile_seeds_program_types_once() {
        let mut repo = MemoryRepository::new();
        let records = normalize_all(
            vec![json!({"degree_id": 1, "type_id": 2, "name": "History", "type": "major", "college_name": "College of Arts and Humanities"})],
            &[],
        );

        let first = reconcile(&mut repo, records).unwrap();
        assert_eq!(first.created, 1);
        assert!(first.terms_created_in(TAX_PROGRAM_TYPES) >= 9);

        let second = reconcile(&mut repo, Vec::new()).unwrap();
        assert_eq!(second.removed, 1);
        assert_eq!(second.terms_created_in(TAX_PROGRAM_TYPES), 0);
    }

    #[test]
    fn reset_removes_records_and_terms() {
        let mut repo = MemoryRepository::new();
        let records = normalize_all(
            vec![json!({"degree_id": 1, "type_id": 2, "name": "History", "type": "major", "college_name": "College of Arts and Humanities"})],
            &[],
        );
        reconcile(&mut repo, records).unwrap();

        let stats = clear(&mut repo).unwrap();
        assert_eq!(stats.removed, 1);
        assert!(stats.terms_removed[TAX_PROGRAM_TYPES] >= 9);
        assert_eq!(stats.terms_removed[TAX_COLLEGES], 1);
        assert_eq!(repo.records_of(CONTENT_TYPE).count(), 0);
    }
}
