//! The content repository contract.
//!
//! The storage engine is an external collaborator. Everything the engine
//! does to local records goes through [`ContentRepository`]; each call is
//! individually atomic and there is no cross-call transaction.

use serde_json::Value;

use crate::error::StoreError;
use crate::model::{LocalId, LocalRecordRef, RecordStatus};

pub type TermId = u64;

/// Key field naming the record's own title rather than a stored field.
pub const TITLE_KEY: &str = "post_title";

/// Field equality filter for [`Criteria`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub key: String,
    pub value: String,
    pub ignore_case: bool,
}

impl FieldFilter {
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into(), ignore_case: false }
    }

    pub fn equals_ignore_case(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into(), ignore_case: true }
    }
}

/// Query for [`ContentRepository::find_by`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    pub content_type: String,
    /// Empty means any status.
    pub statuses: Vec<RecordStatus>,
    /// Field whose value becomes [`LocalRecordRef::stable_key`];
    /// [`TITLE_KEY`] keys records by title.
    pub key_field: String,
    pub fields: Vec<FieldFilter>,
    /// `(taxonomy, term name)` pairs the record must carry.
    pub terms: Vec<(String, String)>,
}

impl Criteria {
    pub fn new(content_type: impl Into<String>, key_field: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            statuses: Vec::new(),
            key_field: key_field.into(),
            fields: Vec::new(),
            terms: Vec::new(),
        }
    }

    pub fn with_statuses(mut self, statuses: &[RecordStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn with_field(mut self, filter: FieldFilter) -> Self {
        self.fields.push(filter);
        self
    }

    pub fn with_term(mut self, taxonomy: impl Into<String>, name: impl Into<String>) -> Self {
        self.terms.push((taxonomy.into(), name.into()));
        self
    }
}

/// Payload for [`ContentRepository::create`]. Records are created as drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub content_type: String,
    pub title: String,
    pub slug: String,
}

/// Payload for [`ContentRepository::update`].
///
/// Has no slug or creation date: updates never move a permalink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPatch {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSpec {
    pub name: String,
    pub slug: Option<String>,
    pub parent: Option<String>,
}

impl TermSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), slug: None, parent: None }
    }
}

/// Result of [`ContentRepository::get_or_create_term`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermHandle {
    pub id: TermId,
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermInfo {
    pub id: TermId,
    pub name: String,
    pub slug: String,
    pub parent: Option<TermId>,
}

pub trait ContentRepository {
    fn find_by(&self, criteria: &Criteria) -> Result<Vec<LocalRecordRef>, StoreError>;

    fn create(&mut self, draft: &RecordDraft) -> Result<LocalId, StoreError>;
    fn update(&mut self, id: LocalId, patch: &RecordPatch) -> Result<(), StoreError>;
    /// `hard = false` moves the record to trash instead of erasing it.
    fn delete(&mut self, id: LocalId, hard: bool) -> Result<(), StoreError>;

    fn set_field(&mut self, id: LocalId, key: &str, value: &Value) -> Result<(), StoreError>;
    /// Replace the record's terms in `taxonomy`. Names must already exist.
    fn set_terms(&mut self, id: LocalId, taxonomy: &str, names: &[String]) -> Result<(), StoreError>;
    fn publish(&mut self, id: LocalId) -> Result<(), StoreError>;

    fn get_or_create_term(&mut self, taxonomy: &str, spec: &TermSpec) -> Result<TermHandle, StoreError>;
    fn list_terms(&self, taxonomy: &str) -> Result<Vec<TermInfo>, StoreError>;
    fn term_meta(&self, term: TermId, key: &str) -> Result<Option<String>, StoreError>;
    fn set_term_meta(&mut self, term: TermId, key: &str, value: &str) -> Result<(), StoreError>;
    /// Delete a term and unassign it from every record. Child terms move up to its parent.
    fn delete_term(&mut self, term: TermId) -> Result<(), StoreError>;

    fn thumbnail(&self, id: LocalId) -> Result<Option<String>, StoreError>;
    /// `None` detaches and deletes the current thumbnail.
    fn set_thumbnail(&mut self, id: LocalId, url: Option<&str>) -> Result<(), StoreError>;
}
