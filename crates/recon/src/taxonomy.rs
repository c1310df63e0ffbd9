//! Taxonomy upkeep outside the per-record loop: seeding the program type
//! hierarchy and linking college terms to their search-service ids.

use tracing::{info, warn};

use crate::classify::PROGRAM_TYPE_GROUPS;
use crate::error::{RecordError, SyncError};
use crate::normalize::degree::{TAX_COLLEGES, TAX_PROGRAM_TYPES};
use crate::stats::RunStats;
use crate::store::{ContentRepository, TermId, TermSpec};

pub const COLLEGE_SEARCH_ID_META: &str = "colleges_search_id";

/// Make sure every program type group and its children exist.
/// Returns the number of terms created.
pub fn seed_program_types<R: ContentRepository + ?Sized>(repo: &mut R) -> Result<usize, SyncError> {
    let mut created = 0;
    for (parent, children) in PROGRAM_TYPE_GROUPS {
        created += usize::from(repo.get_or_create_term(TAX_PROGRAM_TYPES, &TermSpec::named(parent))?.created);
        for child in children {
            let spec = TermSpec { name: child.to_string(), slug: None, parent: Some(parent.to_string()) };
            created += usize::from(repo.get_or_create_term(TAX_PROGRAM_TYPES, &spec)?.created);
        }
    }
    if created > 0 {
        info!(created, "generated default program types");
    } else {
        info!("default program types already exist");
    }
    Ok(created)
}

/// Delete every term of `taxonomy`. Returns the number deleted.
pub fn clear_taxonomy<R: ContentRepository + ?Sized>(repo: &mut R, taxonomy: &str) -> Result<usize, SyncError> {
    let terms = repo.list_terms(taxonomy)?;
    for term in &terms {
        repo.delete_term(term.id)?;
    }
    info!(taxonomy, removed = terms.len(), "taxonomy cleared");
    Ok(terms.len())
}

/// A college term and the value used to find it in the search service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollegeLookup {
    pub term_id: TermId,
    pub name: String,
    /// Stored search id when known, else the term name.
    pub search_value: String,
}

pub fn college_lookups<R: ContentRepository + ?Sized>(repo: &R) -> Result<Vec<CollegeLookup>, SyncError> {
    let mut lookups = Vec::new();
    for term in repo.list_terms(TAX_COLLEGES)? {
        let search_value = repo
            .term_meta(term.id, COLLEGE_SEARCH_ID_META)?
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| term.name.clone());
        lookups.push(CollegeLookup { term_id: term.id, name: term.name, search_value });
    }
    Ok(lookups)
}

/// Store the search-service id of every college term.
///
/// `resolve` returns the id for a lookup, `Ok(None)` when the service has
/// no match. Both a miss and a resolve error count as failed and the loop
/// continues; a fatal repository error aborts.
pub fn sync_college_ids<R, F>(repo: &mut R, mut resolve: F) -> Result<RunStats, SyncError>
where
    R: ContentRepository + ?Sized,
    F: FnMut(&CollegeLookup) -> Result<Option<String>, RecordError>,
{
    let mut stats = RunStats::default();

    for lookup in college_lookups(&*repo)? {
        stats.processed += 1;
        let id = match resolve(&lookup) {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!(college = %lookup.name, "no results found");
                stats.failed += 1;
                continue;
            }
            Err(err) => {
                warn!(college = %lookup.name, error = %err, "college lookup failed");
                stats.failed += 1;
                continue;
            }
        };

        match repo.set_term_meta(lookup.term_id, COLLEGE_SEARCH_ID_META, &id) {
            Ok(()) => stats.updated += 1,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(college = %lookup.name, error = %err, "could not store search id");
                stats.failed += 1;
            }
        }
    }

    info!(processed = stats.processed, updated = stats.updated, failed = stats.failed, "college ids synced");
    Ok(stats)
}
