//! In-memory [`ContentRepository`] with JSON snapshot persistence.
//!
//! Used by the CLI (`--store <file>`) and by tests. Loading a snapshot,
//! running importers against it and saving it back gives the same
//! observable behavior as a real content store, one call at a time.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::model::{LocalId, LocalRecordRef, RecordStatus};
use crate::normalize::lenient::scalar_to_string;
use crate::normalize::names::slugify;
use crate::store::{
    ContentRepository, Criteria, FieldFilter, RecordDraft, RecordPatch, TermHandle, TermId, TermInfo, TermSpec, TITLE_KEY,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: LocalId,
    pub content_type: String,
    pub title: String,
    pub slug: String,
    pub status: RecordStatus,
    pub created_at: String,
    pub modified_at: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    /// taxonomy -> assigned term ids
    #[serde(default)]
    pub terms: BTreeMap<String, Vec<TermId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTerm {
    pub id: TermId,
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TermId>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryRepository {
    #[serde(default)]
    next_id: LocalId,
    #[serde(default)]
    records: BTreeMap<LocalId, StoredRecord>,
    /// Soft-deleted records.
    #[serde(default)]
    trash: BTreeMap<LocalId, StoredRecord>,
    #[serde(default)]
    next_term_id: TermId,
    #[serde(default)]
    terms: BTreeMap<TermId, StoredTerm>,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn field_matches(record: &StoredRecord, filter: &FieldFilter) -> bool {
    let Some(actual) = record.fields.get(&filter.key).and_then(scalar_to_string) else {
        return false;
    };
    if filter.ignore_case {
        actual.to_lowercase() == filter.value.to_lowercase()
    } else {
        actual == filter.value
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot. A missing file is an empty repository.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path).map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Format(format!("{}: {e}", path.display())))
    }

    /// Write the snapshot through a temp file so a crash never leaves half a file.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| StoreError::Format(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Io(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, path).map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))
    }

    pub fn record(&self, id: LocalId) -> Option<&StoredRecord> {
        self.records.get(&id)
    }

    pub fn records_of<'a>(&'a self, content_type: &'a str) -> impl Iterator<Item = &'a StoredRecord> + 'a {
        self.records.values().filter(move |r| r.content_type == content_type)
    }

    pub fn trashed(&self, id: LocalId) -> Option<&StoredRecord> {
        self.trash.get(&id)
    }

    /// Names of the terms assigned to a record in one taxonomy.
    pub fn term_names(&self, id: LocalId, taxonomy: &str) -> Vec<String> {
        self.records
            .get(&id)
            .and_then(|r| r.terms.get(taxonomy))
            .map(|ids| ids.iter().filter_map(|t| self.terms.get(t)).map(|t| t.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn term(&self, id: TermId) -> Option<&StoredTerm> {
        self.terms.get(&id)
    }

    fn record_mut(&mut self, id: LocalId) -> Result<&mut StoredRecord, StoreError> {
        self.records.get_mut(&id).ok_or(StoreError::NotFound(id))
    }

    fn find_term(&self, taxonomy: &str, name: &str) -> Option<&StoredTerm> {
        self.terms.values().find(|t| t.taxonomy == taxonomy && t.name == name)
    }

    fn unique_slug(&self, taken: impl Fn(&str) -> bool, base: &str) -> String {
        let base = if base.is_empty() { "untitled" } else { base };
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

impl ContentRepository for MemoryRepository {
    fn find_by(&self, criteria: &Criteria) -> Result<Vec<LocalRecordRef>, StoreError> {
        let found = self
            .records
            .values()
            .filter(|r| r.content_type == criteria.content_type)
            .filter(|r| criteria.statuses.is_empty() || criteria.statuses.contains(&r.status))
            .filter(|r| criteria.fields.iter().all(|f| field_matches(r, f)))
            .filter(|r| {
                criteria.terms.iter().all(|(taxonomy, name)| {
                    let assigned = r.terms.get(taxonomy).map(Vec::as_slice).unwrap_or(&[]);
                    assigned.iter().any(|t| self.terms.get(t).is_some_and(|t| &t.name == name))
                })
            })
            .map(|r| LocalRecordRef {
                local_id: r.id,
                stable_key: if criteria.key_field == TITLE_KEY {
                    r.title.trim().to_string()
                } else {
                    r.fields.get(&criteria.key_field).and_then(scalar_to_string).unwrap_or_default()
                },
                status: r.status,
            })
            .collect();
        Ok(found)
    }

    fn create(&mut self, draft: &RecordDraft) -> Result<LocalId, StoreError> {
        if draft.content_type.is_empty() {
            return Err(StoreError::Rejected("content type is required".into()));
        }
        let slug = self.unique_slug(
            |s| self.records.values().any(|r| r.content_type == draft.content_type && r.slug == s),
            &draft.slug,
        );
        self.next_id += 1;
        let id = self.next_id;
        let stamp = now();
        self.records.insert(
            id,
            StoredRecord {
                id,
                content_type: draft.content_type.clone(),
                title: draft.title.clone(),
                slug,
                status: RecordStatus::Draft,
                created_at: stamp.clone(),
                modified_at: stamp,
                fields: BTreeMap::new(),
                terms: BTreeMap::new(),
                thumbnail: None,
            },
        );
        Ok(id)
    }

    fn update(&mut self, id: LocalId, patch: &RecordPatch) -> Result<(), StoreError> {
        let record = self.record_mut(id)?;
        record.title = patch.title.clone();
        record.modified_at = now();
        Ok(())
    }

    fn delete(&mut self, id: LocalId, hard: bool) -> Result<(), StoreError> {
        let record = self.records.remove(&id).ok_or(StoreError::NotFound(id))?;
        if !hard {
            self.trash.insert(id, record);
        }
        Ok(())
    }

    fn set_field(&mut self, id: LocalId, key: &str, value: &Value) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::Rejected("field key is empty".into()));
        }
        let record = self.record_mut(id)?;
        record.fields.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn set_terms(&mut self, id: LocalId, taxonomy: &str, names: &[String]) -> Result<(), StoreError> {
        let ids = names
            .iter()
            .map(|name| {
                self.find_term(taxonomy, name)
                    .map(|t| t.id)
                    .ok_or_else(|| StoreError::Rejected(format!("unknown term '{name}' in {taxonomy}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let record = self.record_mut(id)?;
        if ids.is_empty() {
            record.terms.remove(taxonomy);
        } else {
            record.terms.insert(taxonomy.to_string(), ids);
        }
        Ok(())
    }

    fn publish(&mut self, id: LocalId) -> Result<(), StoreError> {
        let record = self.record_mut(id)?;
        record.status = RecordStatus::Publish;
        Ok(())
    }

    fn get_or_create_term(&mut self, taxonomy: &str, spec: &TermSpec) -> Result<TermHandle, StoreError> {
        if spec.name.trim().is_empty() {
            return Err(StoreError::Rejected(format!("empty term name in {taxonomy}")));
        }
        if let Some(term) = self.find_term(taxonomy, &spec.name) {
            return Ok(TermHandle { id: term.id, created: false });
        }

        let parent = match &spec.parent {
            Some(name) => Some(
                self.find_term(taxonomy, name)
                    .map(|t| t.id)
                    .ok_or_else(|| StoreError::Rejected(format!("unknown parent term '{name}' in {taxonomy}")))?,
            ),
            None => None,
        };
        let base = spec.slug.clone().unwrap_or_else(|| slugify(&spec.name));
        let slug = self.unique_slug(
            |s| self.terms.values().any(|t| t.taxonomy == taxonomy && t.slug == s),
            &base,
        );

        self.next_term_id += 1;
        let id = self.next_term_id;
        self.terms.insert(
            id,
            StoredTerm {
                id,
                taxonomy: taxonomy.to_string(),
                name: spec.name.clone(),
                slug,
                parent,
                meta: BTreeMap::new(),
            },
        );
        Ok(TermHandle { id, created: true })
    }

    fn list_terms(&self, taxonomy: &str) -> Result<Vec<TermInfo>, StoreError> {
        Ok(self
            .terms
            .values()
            .filter(|t| t.taxonomy == taxonomy)
            .map(|t| TermInfo { id: t.id, name: t.name.clone(), slug: t.slug.clone(), parent: t.parent })
            .collect())
    }

    fn term_meta(&self, term: TermId, key: &str) -> Result<Option<String>, StoreError> {
        let term = self.terms.get(&term).ok_or_else(|| StoreError::Rejected(format!("unknown term id {term}")))?;
        Ok(term.meta.get(key).cloned())
    }

    fn set_term_meta(&mut self, term: TermId, key: &str, value: &str) -> Result<(), StoreError> {
        let term = self
            .terms
            .get_mut(&term)
            .ok_or_else(|| StoreError::Rejected(format!("unknown term id {term}")))?;
        term.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete_term(&mut self, term: TermId) -> Result<(), StoreError> {
        let removed = self
            .terms
            .remove(&term)
            .ok_or_else(|| StoreError::Rejected(format!("unknown term id {term}")))?;
        for child in self.terms.values_mut().filter(|t| t.parent == Some(term)) {
            child.parent = removed.parent;
        }
        for record in self.records.values_mut() {
            if let Some(ids) = record.terms.get_mut(&removed.taxonomy) {
                ids.retain(|id| *id != term);
                if ids.is_empty() {
                    record.terms.remove(&removed.taxonomy);
                }
            }
        }
        Ok(())
    }

    fn thumbnail(&self, id: LocalId) -> Result<Option<String>, StoreError> {
        self.records.get(&id).map(|r| r.thumbnail.clone()).ok_or(StoreError::NotFound(id))
    }

    fn set_thumbnail(&mut self, id: LocalId, url: Option<&str>) -> Result<(), StoreError> {
        let record = self.record_mut(id)?;
        record.thumbnail = url.map(String::from);
        Ok(())
    }
}
