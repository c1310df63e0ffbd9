use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::model::Outcome;

/// Counters for one reconciliation run.
///
/// Owned and mutated by the reconciler only; callers get a finished copy
/// back from [`Reconciler::run`](crate::engine::Reconciler::run).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub duplicate: usize,
    pub failed: usize,
    /// Records dropped before any write because they carry no stable key.
    pub skipped: usize,
    /// Terms created on demand, per taxonomy.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub terms_created: BTreeMap<String, usize>,
}

impl RunStats {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::DuplicateSkipped => self.duplicate += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    pub fn term_created(&mut self, taxonomy: &str) {
        *self.terms_created.entry(taxonomy.to_string()).or_default() += 1;
    }

    pub fn terms_created_in(&self, taxonomy: &str) -> usize {
        self.terms_created.get(taxonomy).copied().unwrap_or(0)
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Processed : {}", self.processed)?;
        writeln!(f)?;
        writeln!(f, "Created         : {}", self.created)?;
        writeln!(f, "Updated         : {}", self.updated)?;
        writeln!(f, "Removed         : {}", self.removed)?;
        writeln!(f, "Duplicates      : {}", self.duplicate)?;
        writeln!(f, "Failed          : {}", self.failed)?;
        write!(f, "Skipped         : {}", self.skipped)?;
        for (taxonomy, count) in &self.terms_created {
            write!(f, "\nNew {taxonomy:<11} : {count}")?;
        }
        Ok(())
    }
}
