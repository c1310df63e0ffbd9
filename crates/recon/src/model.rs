use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::{DegreeRecord, ExpertRow, ResearcherRecord, ResourceLink};

/// Identifier assigned by the content repository.
pub type LocalId = u64;

// ---------------------------------------------------------------------------
// Remote side
// ---------------------------------------------------------------------------

/// One decoded unit from a remote service, typed per domain.
///
/// Raw JSON objects are validated into one of these at the normalizer
/// boundary; everything downstream works on typed fields.
#[derive(Debug, Clone)]
pub enum RemoteRecord {
    Degree(DegreeRecord),
    Researcher(ResearcherRecord),
    Expert(ExpertRow),
    Resource(ResourceLink),
}

/// A taxonomy term assignment carried by a normalized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRef {
    pub name: String,
    /// Explicit slug; the repository slugifies `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Term meta written whenever the term is assigned.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl TermRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), slug: None, parent: None, meta: BTreeMap::new() }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// Canonical record produced by a normalizer and consumed by the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedRecord {
    /// Remote-assigned identifier correlating this record across runs.
    pub stable_key: String,
    pub title: String,
    /// Slug used on create only. Updates never change it.
    pub slug: String,
    /// Type discriminator (program type, person type, ...).
    pub kind: String,
    pub fields: BTreeMap<String, Value>,
    /// Fields written on create, and on update only when forced.
    pub initial_fields: BTreeMap<String, Value>,
    /// taxonomy -> assigned terms. An empty list clears the taxonomy.
    pub terms: BTreeMap<String, Vec<TermRef>>,
    /// Soft per-field problems found while normalizing.
    pub warnings: Vec<String>,
}

impl NormalizedRecord {
    pub fn new(stable_key: impl Into<String>, title: impl Into<String>) -> Self {
        Self { stable_key: stable_key.into(), title: title.into(), ..Default::default() }
    }

    pub fn set_field(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn set_initial_field(&mut self, key: &str, value: impl Into<Value>) {
        self.initial_fields.insert(key.to_string(), value.into());
    }

    pub fn add_term(&mut self, taxonomy: &str, term: TermRef) {
        self.terms.entry(taxonomy.to_string()).or_default().push(term);
    }

    /// Declare a taxonomy with no terms, so the store clears it.
    pub fn clear_terms(&mut self, taxonomy: &str) {
        self.terms.entry(taxonomy.to_string()).or_default();
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

// ---------------------------------------------------------------------------
// Local side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Draft,
    Publish,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Publish => "publish",
        }
    }
}

/// An existing record as seen by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRecordRef {
    pub local_id: LocalId,
    pub stable_key: String,
    pub status: RecordStatus,
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Updated,
    DuplicateSkipped,
    Failed,
}
