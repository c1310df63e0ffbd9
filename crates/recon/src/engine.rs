//! The reconciler: converges the content repository to a normalized
//! record stream.
//!
//! One run:
//! 1. load the existing-key index (`stable key -> local record`) once;
//! 2. for each record in stream order: skip repeated keys, update a matched
//!    record (consuming its index entry) or create a draft, then overwrite
//!    its fields and terms;
//! 3. hard-delete whatever is left in the index (full sync only);
//! 4. publish the drafts created in step 2.
//!
//! Per-record failures are counted and the loop continues. A fatal
//! repository error ends the run; writes already issued stay applied.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::error::{RecordError, StoreError, SyncError};
use crate::model::{LocalId, LocalRecordRef, NormalizedRecord, Outcome, RecordStatus, TermRef};
use crate::stats::RunStats;
use crate::store::{ContentRepository, Criteria, RecordDraft, RecordPatch, TermHandle, TermSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Local records not seen in the run are deleted.
    #[default]
    FullSync,
    /// Create and update only. Nothing is removed.
    Merge,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Selects the existing records this run owns.
    pub criteria: Criteria,
    pub mode: SyncMode,
    /// Hard-delete every indexed record before the loop, so all are re-created.
    pub purge_existing: bool,
    /// Write `initial_fields` on update too.
    pub force_initial_fields: bool,
}

impl RunOptions {
    /// Full sync over publish + draft records of `content_type`, keyed by `key_field`.
    pub fn full_sync(content_type: &str, key_field: &str) -> Self {
        Self {
            criteria: Criteria::new(content_type, key_field)
                .with_statuses(&[RecordStatus::Publish, RecordStatus::Draft]),
            mode: SyncMode::FullSync,
            purge_existing: false,
            force_initial_fields: false,
        }
    }

    pub fn merge(content_type: &str, key_field: &str) -> Self {
        Self { mode: SyncMode::Merge, ..Self::full_sync(content_type, key_field) }
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.criteria.content_type.trim().is_empty() {
            return Err(SyncError::Options("content type is empty".into()));
        }
        if self.criteria.key_field.trim().is_empty() {
            return Err(SyncError::Options("key field is empty".into()));
        }
        if self.purge_existing && self.mode == SyncMode::Merge {
            return Err(SyncError::Options("purge requires a full sync".into()));
        }
        Ok(())
    }
}

pub struct Reconciler<'r, R: ContentRepository + ?Sized> {
    repo: &'r mut R,
    options: RunOptions,
    existing: HashMap<String, LocalRecordRef>,
    /// Indexed records sharing a key with an earlier one, or keyless.
    orphans: Vec<LocalId>,
    seen: HashSet<String>,
    to_publish: Vec<LocalId>,
    stats: RunStats,
}

impl<'r, R: ContentRepository + ?Sized> Reconciler<'r, R> {
    pub fn new(repo: &'r mut R, options: RunOptions) -> Result<Self, SyncError> {
        options.validate()?;
        Ok(Self {
            repo,
            options,
            existing: HashMap::new(),
            orphans: Vec::new(),
            seen: HashSet::new(),
            to_publish: Vec::new(),
            stats: RunStats::default(),
        })
    }

    /// Reconcile the whole stream and return the final counters.
    pub fn run<I>(mut self, records: I) -> Result<RunStats, SyncError>
    where
        I: IntoIterator<Item = Result<NormalizedRecord, RecordError>>,
    {
        let content_type = self.options.criteria.content_type.clone();
        info!(content_type = %content_type, "reconciliation started");

        self.load_index()?;
        if self.options.purge_existing {
            self.purge()?;
        }

        for item in records {
            self.process(item)?;
        }

        if self.options.mode == SyncMode::FullSync {
            self.remove_stale()?;
        }
        self.publish_new()?;

        info!(
            content_type = %content_type,
            processed = self.stats.processed,
            created = self.stats.created,
            updated = self.stats.updated,
            removed = self.stats.removed,
            duplicate = self.stats.duplicate,
            failed = self.stats.failed,
            "reconciliation finished"
        );
        Ok(self.stats)
    }

    fn load_index(&mut self) -> Result<(), SyncError> {
        for local in self.repo.find_by(&self.options.criteria)? {
            if local.stable_key.is_empty() || self.existing.contains_key(&local.stable_key) {
                self.orphans.push(local.local_id);
            } else {
                self.existing.insert(local.stable_key.clone(), local);
            }
        }
        info!(existing = self.existing.len(), orphans = self.orphans.len(), "loaded existing-key index");
        Ok(())
    }

    fn purge(&mut self) -> Result<(), SyncError> {
        let ids: Vec<LocalId> = self
            .existing
            .drain()
            .map(|(_, local)| local.local_id)
            .chain(self.orphans.drain(..))
            .collect();
        info!(count = ids.len(), "purging existing records");
        for id in ids {
            self.delete(id)?;
        }
        Ok(())
    }

    fn process(&mut self, item: Result<NormalizedRecord, RecordError>) -> Result<(), SyncError> {
        self.stats.processed += 1;

        let record = match item {
            Ok(record) if !record.stable_key.is_empty() => record,
            Ok(_) | Err(RecordError::MissingKey) => {
                warn!("record has no stable key, skipped");
                self.stats.skipped += 1;
                return Ok(());
            }
            Err(err) => return self.fail(None, err),
        };

        for warning in &record.warnings {
            warn!(key = %record.stable_key, "{warning}");
        }

        match self.apply(&record) {
            Ok(outcome) => {
                debug!(key = %record.stable_key, outcome = ?outcome, "record reconciled");
                self.stats.record(outcome);
                Ok(())
            }
            Err(err) => self.fail(Some(&record.stable_key), err),
        }
    }

    fn fail(&mut self, key: Option<&str>, err: RecordError) -> Result<(), SyncError> {
        match err {
            RecordError::Store(store) if store.is_fatal() => Err(SyncError::Store(store)),
            err => {
                warn!(key = key.unwrap_or("-"), error = %err, "record failed");
                self.stats.record(Outcome::Failed);
                Ok(())
            }
        }
    }

    fn apply(&mut self, record: &NormalizedRecord) -> Result<Outcome, RecordError> {
        if !self.seen.insert(record.stable_key.clone()) {
            return Ok(Outcome::DuplicateSkipped);
        }

        match self.existing.remove(&record.stable_key) {
            Some(local) => {
                self.repo.update(local.local_id, &RecordPatch { title: record.title.clone() })?;
                self.write_content(local.local_id, record, self.options.force_initial_fields)?;
                if local.status == RecordStatus::Draft {
                    self.to_publish.push(local.local_id);
                }
                Ok(Outcome::Updated)
            }
            None => {
                let id = self.repo.create(&RecordDraft {
                    content_type: self.options.criteria.content_type.clone(),
                    title: record.title.clone(),
                    slug: record.slug.clone(),
                })?;
                // A create whose content writes fail stays an unpublished draft.
                self.write_content(id, record, true)?;
                self.to_publish.push(id);
                Ok(Outcome::Created)
            }
        }
    }

    fn write_content(&mut self, id: LocalId, record: &NormalizedRecord, initial: bool) -> Result<(), RecordError> {
        for (key, value) in &record.fields {
            self.repo.set_field(id, key, value)?;
        }
        if initial {
            for (key, value) in &record.initial_fields {
                self.repo.set_field(id, key, value)?;
            }
        }

        for (taxonomy, terms) in &record.terms {
            let mut names = Vec::with_capacity(terms.len());
            for term in terms {
                let handle = self.ensure_term(taxonomy, term)?;
                for (key, value) in &term.meta {
                    self.repo.set_term_meta(handle.id, key, value)?;
                }
                names.push(term.name.clone());
            }
            self.repo.set_terms(id, taxonomy, &names)?;
        }
        Ok(())
    }

    fn ensure_term(&mut self, taxonomy: &str, term: &TermRef) -> Result<TermHandle, StoreError> {
        if let Some(parent) = &term.parent {
            self.get_or_create_term(taxonomy, &TermSpec::named(parent.as_str()))?;
        }
        let spec = TermSpec { name: term.name.clone(), slug: term.slug.clone(), parent: term.parent.clone() };
        self.get_or_create_term(taxonomy, &spec)
    }

    fn get_or_create_term(&mut self, taxonomy: &str, spec: &TermSpec) -> Result<TermHandle, StoreError> {
        let handle = self.repo.get_or_create_term(taxonomy, spec)?;
        if handle.created {
            debug!(taxonomy, term = %spec.name, "term created");
            self.stats.term_created(taxonomy);
        }
        Ok(handle)
    }

    fn remove_stale(&mut self) -> Result<(), SyncError> {
        let stale: Vec<LocalId> = self
            .existing
            .drain()
            .map(|(_, local)| local.local_id)
            .chain(self.orphans.drain(..))
            .collect();
        if !stale.is_empty() {
            info!(count = stale.len(), "removing stale records");
        }
        for id in stale {
            self.delete(id)?;
        }
        Ok(())
    }

    fn delete(&mut self, id: LocalId) -> Result<(), SyncError> {
        match self.repo.delete(id, true) {
            Ok(()) => {
                self.stats.removed += 1;
                Ok(())
            }
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                warn!(local_id = id, error = %err, "delete failed");
                Ok(())
            }
        }
    }

    fn publish_new(&mut self) -> Result<(), SyncError> {
        for id in std::mem::take(&mut self.to_publish) {
            match self.repo.publish(id) {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => warn!(local_id = id, error = %err, "publish failed"),
            }
        }
        Ok(())
    }
}

/// Hard-delete every record matching `criteria`, whatever its key.
/// Returns the number removed.
pub fn remove_all<R: ContentRepository + ?Sized>(repo: &mut R, criteria: &Criteria) -> Result<usize, SyncError> {
    let ids: Vec<LocalId> = repo.find_by(criteria)?.into_iter().map(|local| local.local_id).collect();
    for id in &ids {
        repo.delete(*id, true)?;
    }
    info!(content_type = %criteria.content_type, removed = ids.len(), "records removed");
    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRepository;
    use crate::store::{TermId, TermInfo};
    use serde_json::{json, Value};

    const TYPE: &str = "degree";
    const KEY: &str = "degree_key";

    fn record(key: &str, title: &str) -> NormalizedRecord {
        let mut record = NormalizedRecord::new(key, title);
        record.slug = title.to_lowercase();
        record.set_field(KEY, key);
        record
    }

    fn stream(records: &[NormalizedRecord]) -> Vec<Result<NormalizedRecord, RecordError>> {
        records.iter().cloned().map(Ok).collect()
    }

    fn sync<R: ContentRepository>(repo: &mut R, records: &[NormalizedRecord]) -> RunStats {
        Reconciler::new(repo, RunOptions::full_sync(TYPE, KEY)).unwrap().run(stream(records)).unwrap()
    }

    fn keys(repo: &MemoryRepository) -> Vec<String> {
        let mut keys: Vec<String> = repo
            .records_of(TYPE)
            .map(|r| r.fields[KEY].as_str().unwrap_or_default().to_string())
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn first_run_creates_and_publishes() {
        let mut repo = MemoryRepository::new();
        let stats = sync(&mut repo, &[record("1", "History"), record("2", "Physics")]);

        assert_eq!((stats.processed, stats.created, stats.updated, stats.removed), (2, 2, 0, 0));
        assert_eq!(keys(&repo), ["1", "2"]);
        assert!(repo.records_of(TYPE).all(|r| r.status == RecordStatus::Publish));
    }

    #[test]
    fn rerun_with_same_input_only_updates() {
        let mut repo = MemoryRepository::new();
        let input = [record("1", "History"), record("2", "Physics")];
        sync(&mut repo, &input);
        let before: Vec<_> = repo.records_of(TYPE).map(|r| (r.id, r.slug.clone(), r.fields.clone())).collect();

        let stats = sync(&mut repo, &input);
        let after: Vec<_> = repo.records_of(TYPE).map(|r| (r.id, r.slug.clone(), r.fields.clone())).collect();

        assert_eq!((stats.created, stats.updated, stats.removed), (0, 2, 0));
        assert_eq!(before, after);
    }

    #[test]
    fn update_keeps_slug_and_overwrites_fields() {
        let mut repo = MemoryRepository::new();
        sync(&mut repo, &[record("1", "History")]);

        let mut renamed = record("1", "World History");
        renamed.set_field("degree_hours", "120");
        sync(&mut repo, &[renamed]);

        let stored = repo.records_of(TYPE).next().unwrap();
        assert_eq!(stored.title, "World History");
        assert_eq!(stored.slug, "history");
        assert_eq!(stored.fields["degree_hours"], json!("120"));
    }

    #[test]
    fn records_missing_from_the_input_are_removed() {
        let mut repo = MemoryRepository::new();
        sync(&mut repo, &[record("1", "A"), record("2", "B"), record("3", "C")]);

        let stats = sync(&mut repo, &[record("1", "A"), record("3", "C")]);
        assert_eq!((stats.updated, stats.removed), (2, 1));
        assert_eq!(keys(&repo), ["1", "3"]);
    }

    #[test]
    fn empty_input_removes_everything_owned() {
        let mut repo = MemoryRepository::new();
        sync(&mut repo, &[record("1", "A"), record("2", "B")]);
        let other = repo
            .create(&RecordDraft { content_type: "person".into(), title: "Ada".into(), slug: "ada".into() })
            .unwrap();

        let stats = sync(&mut repo, &[]);
        assert_eq!((stats.processed, stats.removed), (0, 2));
        assert!(keys(&repo).is_empty());
        assert!(repo.record(other).is_some());
    }

    #[test]
    fn repeated_keys_are_written_once() {
        let mut repo = MemoryRepository::new();
        let stats = sync(&mut repo, &[record("1", "First"), record("1", "Second"), record("2", "Other")]);

        assert_eq!((stats.processed, stats.created, stats.duplicate), (3, 2, 1));
        let first = repo.records_of(TYPE).find(|r| r.fields[KEY] == json!("1")).unwrap();
        assert_eq!(first.title, "First");
    }

    #[test]
    fn keyless_records_are_skipped() {
        let mut repo = MemoryRepository::new();
        let items = vec![Ok(record("", "Nameless")), Err(RecordError::MissingKey), Ok(record("1", "A"))];
        let stats = Reconciler::new(&mut repo, RunOptions::full_sync(TYPE, KEY)).unwrap().run(items).unwrap();

        assert_eq!((stats.processed, stats.skipped, stats.created, stats.failed), (3, 2, 1, 0));
        assert_eq!(keys(&repo), ["1"]);
    }

    #[test]
    fn invalid_records_fail_and_the_run_continues() {
        let mut repo = MemoryRepository::new();
        let items = vec![Err(RecordError::Invalid("bad json".into())), Ok(record("1", "A"))];
        let stats = Reconciler::new(&mut repo, RunOptions::full_sync(TYPE, KEY)).unwrap().run(items).unwrap();
        assert_eq!((stats.processed, stats.failed, stats.created), (2, 1, 1));
    }

    #[test]
    fn duplicate_local_keys_are_collapsed() {
        let mut repo = MemoryRepository::new();
        for _ in 0..2 {
            let id = repo
                .create(&RecordDraft { content_type: TYPE.into(), title: "A".into(), slug: "a".into() })
                .unwrap();
            repo.set_field(id, KEY, &json!("1")).unwrap();
            repo.publish(id).unwrap();
        }
        repo.create(&RecordDraft { content_type: TYPE.into(), title: "Keyless".into(), slug: "k".into() })
            .unwrap();

        let stats = sync(&mut repo, &[record("1", "A")]);
        assert_eq!((stats.updated, stats.removed), (1, 2));
        assert_eq!(keys(&repo), ["1"]);
    }

    #[test]
    fn matched_drafts_are_published() {
        let mut repo = MemoryRepository::new();
        let id = repo.create(&RecordDraft { content_type: TYPE.into(), title: "A".into(), slug: "a".into() }).unwrap();
        repo.set_field(id, KEY, &json!("1")).unwrap();

        let stats = sync(&mut repo, &[record("1", "A")]);
        assert_eq!(stats.updated, 1);
        assert_eq!(repo.record(id).unwrap().status, RecordStatus::Publish);
    }

    #[test]
    fn merge_never_removes() {
        let mut repo = MemoryRepository::new();
        sync(&mut repo, &[record("1", "A"), record("2", "B")]);

        let stats = Reconciler::new(&mut repo, RunOptions::merge(TYPE, KEY))
            .unwrap()
            .run(stream(&[record("3", "C")]))
            .unwrap();
        assert_eq!((stats.created, stats.removed), (1, 0));
        assert_eq!(keys(&repo), ["1", "2", "3"]);
    }

    #[test]
    fn purge_recreates_everything() {
        let mut repo = MemoryRepository::new();
        sync(&mut repo, &[record("1", "A"), record("2", "B")]);
        let old_ids: Vec<LocalId> = repo.records_of(TYPE).map(|r| r.id).collect();

        let options = RunOptions { purge_existing: true, ..RunOptions::full_sync(TYPE, KEY) };
        let stats = Reconciler::new(&mut repo, options).unwrap().run(stream(&[record("1", "A")])).unwrap();

        assert_eq!((stats.removed, stats.created, stats.updated), (2, 1, 0));
        assert_eq!(keys(&repo), ["1"]);
        assert!(repo.records_of(TYPE).all(|r| !old_ids.contains(&r.id)));
    }

    #[test]
    fn remove_all_ignores_keys_and_status() {
        let mut repo = MemoryRepository::new();
        sync(&mut repo, &[record("1", "A"), record("2", "B")]);
        repo.create(&RecordDraft { content_type: TYPE.into(), title: "Draft".into(), slug: "d".into() }).unwrap();

        assert_eq!(remove_all(&mut repo, &Criteria::new(TYPE, KEY)).unwrap(), 3);
        assert_eq!(repo.records_of(TYPE).count(), 0);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut repo = MemoryRepository::new();
        let purge_merge = RunOptions { purge_existing: true, ..RunOptions::merge(TYPE, KEY) };
        assert!(matches!(Reconciler::new(&mut repo, purge_merge), Err(SyncError::Options(_))));
        assert!(Reconciler::new(&mut repo, RunOptions::full_sync(TYPE, "")).is_err());
    }

    #[test]
    fn initial_fields_are_written_on_create_or_when_forced() {
        let mut repo = MemoryRepository::new();
        let mut with_template = record("1", "A");
        with_template.set_initial_field("_wp_page_template", "template-faculty.php");
        sync(&mut repo, &[with_template.clone()]);

        let id = repo.records_of(TYPE).next().unwrap().id;
        repo.set_field(id, "_wp_page_template", &json!("custom.php")).unwrap();

        sync(&mut repo, &[with_template.clone()]);
        assert_eq!(repo.record(id).unwrap().fields["_wp_page_template"], json!("custom.php"));

        let forced = RunOptions { force_initial_fields: true, ..RunOptions::full_sync(TYPE, KEY) };
        Reconciler::new(&mut repo, forced).unwrap().run(stream(&[with_template])).unwrap();
        assert_eq!(repo.record(id).unwrap().fields["_wp_page_template"], json!("template-faculty.php"));
    }

    #[test]
    fn terms_are_created_once_with_parents_and_meta() {
        let mut repo = MemoryRepository::new();
        let mut a = record("1", "A");
        a.add_term("program_types", TermRef::named("Master").with_parent("Graduate Program"));
        a.add_term("colleges", TermRef::named("College of Sciences").with_slug("sciences").with_meta("colleges_alias", "Sciences"));
        let mut b = record("2", "B");
        b.add_term("program_types", TermRef::named("Master").with_parent("Graduate Program"));

        let stats = sync(&mut repo, &[a, b.clone()]);
        assert_eq!(stats.terms_created_in("program_types"), 2);
        assert_eq!(stats.terms_created_in("colleges"), 1);

        let college = repo.list_terms("colleges").unwrap().remove(0);
        assert_eq!(college.slug, "sciences");
        assert_eq!(repo.term_meta(college.id, "colleges_alias").unwrap().as_deref(), Some("Sciences"));

        let id = repo.records_of(TYPE).find(|r| r.fields[KEY] == json!("2")).unwrap().id;
        assert_eq!(repo.term_names(id, "program_types"), ["Master"]);

        b.clear_terms("colleges");
        b.terms.remove("program_types");
        b.clear_terms("program_types");
        let stats = sync(&mut repo, &[b]);
        assert!(stats.terms_created.is_empty());
        assert!(repo.term_names(id, "program_types").is_empty());
    }

    // ── Failing repository ──────────────────────────────────────────

    /// Delegates to a memory repository, failing `set_field` for one key
    /// value and every call once `down` is set.
    struct FlakyRepo {
        inner: MemoryRepository,
        reject_value: Option<Value>,
        down_after_creates: Option<usize>,
        creates: usize,
    }

    impl FlakyRepo {
        fn new() -> Self {
            Self { inner: MemoryRepository::new(), reject_value: None, down_after_creates: None, creates: 0 }
        }

        fn check(&self) -> Result<(), StoreError> {
            match self.down_after_creates {
                Some(limit) if self.creates >= limit => Err(StoreError::Unavailable("connection lost".into())),
                _ => Ok(()),
            }
        }
    }

    impl ContentRepository for FlakyRepo {
        fn find_by(&self, criteria: &Criteria) -> Result<Vec<LocalRecordRef>, StoreError> {
            self.check()?;
            self.inner.find_by(criteria)
        }
        fn create(&mut self, draft: &RecordDraft) -> Result<LocalId, StoreError> {
            self.check()?;
            self.creates += 1;
            self.inner.create(draft)
        }
        fn update(&mut self, id: LocalId, patch: &RecordPatch) -> Result<(), StoreError> {
            self.check()?;
            self.inner.update(id, patch)
        }
        fn delete(&mut self, id: LocalId, hard: bool) -> Result<(), StoreError> {
            self.check()?;
            self.inner.delete(id, hard)
        }
        fn set_field(&mut self, id: LocalId, key: &str, value: &Value) -> Result<(), StoreError> {
            if self.reject_value.as_ref() == Some(value) {
                return Err(StoreError::Rejected(format!("{key} refused")));
            }
            self.inner.set_field(id, key, value)
        }
        fn set_terms(&mut self, id: LocalId, taxonomy: &str, names: &[String]) -> Result<(), StoreError> {
            self.inner.set_terms(id, taxonomy, names)
        }
        fn publish(&mut self, id: LocalId) -> Result<(), StoreError> {
            self.check()?;
            self.inner.publish(id)
        }
        fn get_or_create_term(&mut self, taxonomy: &str, spec: &TermSpec) -> Result<TermHandle, StoreError> {
            self.inner.get_or_create_term(taxonomy, spec)
        }
        fn list_terms(&self, taxonomy: &str) -> Result<Vec<TermInfo>, StoreError> {
            self.inner.list_terms(taxonomy)
        }
        fn term_meta(&self, term: TermId, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.term_meta(term, key)
        }
        fn set_term_meta(&mut self, term: TermId, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.set_term_meta(term, key, value)
        }
        fn delete_term(&mut self, term: TermId) -> Result<(), StoreError> {
            self.inner.delete_term(term)
        }
        fn thumbnail(&self, id: LocalId) -> Result<Option<String>, StoreError> {
            self.inner.thumbnail(id)
        }
        fn set_thumbnail(&mut self, id: LocalId, url: Option<&str>) -> Result<(), StoreError> {
            self.inner.set_thumbnail(id, url)
        }
    }

    #[test]
    fn rejected_write_fails_one_record_and_leaves_it_unpublished() {
        let mut repo = FlakyRepo::new();
        repo.reject_value = Some(json!("2"));

        let stats = sync(&mut repo, &[record("1", "A"), record("2", "B"), record("3", "C")]);
        assert_eq!((stats.processed, stats.created, stats.failed), (3, 2, 1));

        let failed = repo.inner.records_of(TYPE).find(|r| r.title == "B").unwrap();
        assert_eq!(failed.status, RecordStatus::Draft);
        assert!(!failed.fields.contains_key(KEY));
        assert_eq!(repo.inner.records_of(TYPE).filter(|r| r.status == RecordStatus::Publish).count(), 2);
    }

    #[test]
    fn unavailable_store_aborts_the_run() {
        let mut repo = FlakyRepo::new();
        repo.down_after_creates = Some(1);

        let result = Reconciler::new(&mut repo, RunOptions::full_sync(TYPE, KEY))
            .unwrap()
            .run(stream(&[record("1", "A"), record("2", "B")]));

        assert!(matches!(result, Err(SyncError::Store(StoreError::Unavailable(_)))));
        let written: Vec<_> = repo.inner.records_of(TYPE).collect();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].status, RecordStatus::Draft);
    }
}
