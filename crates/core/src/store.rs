//! Versioned in-memory record store.
//!
//! Every logical record owns an append-only version history. Two counters are involved:
//!
//! - a process-wide identity counter, advanced once per `create` and never wrapped
//! - a per-history position, from which each version label is derived (`"0"`, `"1"`, ...)
//!
//! The store is guarded by a single `parking_lot::RwLock`: `create` and `update` take the write
//! lock for the duration of their mutation, `read` and [`RecordStore::current_versions`] take
//! the read lock. Updates to one logical id are therefore totally ordered; readers see each
//! history atomically but get no snapshot across histories.

use crate::constants::DEFAULT_FIRST_LOGICAL_ID;
use crate::error::{PatientError, PatientResult};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;

/// Stable numeric identity of a record across all its versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalId(u64);

impl LogicalId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for LogicalId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable snapshot of a record at one point in its history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordVersion<R> {
    logical_id: LogicalId,
    version_label: String,
    last_updated: DateTime<Utc>,
    record: R,
}

impl<R> RecordVersion<R> {
    pub fn logical_id(&self) -> LogicalId {
        self.logical_id
    }

    /// Ordinal label: the number of versions that existed before this one.
    pub fn version_label(&self) -> &str {
        &self.version_label
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn into_record(self) -> R {
        self.record
    }
}

/// Ordered, append-only list of a record's versions. Never empty.
#[derive(Clone, Debug)]
struct VersionHistory<R> {
    versions: Vec<RecordVersion<R>>,
}

impl<R> VersionHistory<R> {
    fn started_with(logical_id: LogicalId, record: R, now: DateTime<Utc>) -> Self {
        let mut history = Self {
            versions: Vec::with_capacity(1),
        };
        history.append(logical_id, record, now);
        history
    }

    /// Appends a version labelled with the pre-append length and returns it.
    fn append(&mut self, logical_id: LogicalId, record: R, now: DateTime<Utc>) -> &RecordVersion<R> {
        let version_label = self.versions.len().to_string();
        self.versions.push(RecordVersion {
            logical_id,
            version_label,
            last_updated: now,
            record,
        });
        self.current()
    }

    /// The most recently appended version.
    fn current(&self) -> &RecordVersion<R> {
        &self.versions[self.versions.len() - 1]
    }

    /// First version whose label equals `version_label`.
    fn find(&self, version_label: &str) -> Option<&RecordVersion<R>> {
        self.versions
            .iter()
            .find(|v| v.version_label == version_label)
    }

    fn iter(&self) -> impl Iterator<Item = &RecordVersion<R>> {
        self.versions.iter()
    }
}

struct StoreInner<R> {
    histories: BTreeMap<LogicalId, VersionHistory<R>>,
    /// `None` once `u64::MAX` has been handed out.
    next_id: Option<u64>,
}

/// Process-wide store mapping each [`LogicalId`] to its version history.
///
/// Share it by reference (typically `Arc<RecordStore<_>>`); it synchronises internally.
pub struct RecordStore<R> {
    inner: RwLock<StoreInner<R>>,
}

impl<R> Default for RecordStore<R> {
    fn default() -> Self {
        Self::new(LogicalId::new(DEFAULT_FIRST_LOGICAL_ID))
    }
}

impl<R> fmt::Debug for RecordStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("RecordStore")
            .field("records", &inner.histories.len())
            .field("next_id", &inner.next_id)
            .finish()
    }
}

impl<R> RecordStore<R> {
    /// Creates an empty store whose first allocated identity is `first_id`.
    pub fn new(first_id: LogicalId) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                histories: BTreeMap::new(),
                next_id: Some(first_id.value()),
            }),
        }
    }

    /// Number of logical records.
    pub fn len(&self) -> usize {
        self.inner.read().histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The identity the next `create` will allocate, or `None` if the id space is exhausted.
    pub fn next_id(&self) -> Option<LogicalId> {
        self.inner.read().next_id.map(LogicalId::new)
    }

    /// Allocates the next identity and stores `record` as its version `"0"`.
    ///
    /// Callers validate before calling; a record handed to the store always consumes an id.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::InvalidInput`] once every identity up to `u64::MAX` has been
    /// allocated. The store is left unchanged.
    pub fn create(&self, record: R) -> PatientResult<LogicalId> {
        let mut inner = self.inner.write();
        let next = inner.next_id.ok_or_else(|| {
            PatientError::InvalidInput("logical id space exhausted".into())
        })?;
        let logical_id = LogicalId::new(next);
        inner.next_id = next.checked_add(1);
        inner.histories.insert(
            logical_id,
            VersionHistory::started_with(logical_id, record, Utc::now()),
        );
        Ok(logical_id)
    }
}

impl<R: Clone> RecordStore<R> {
    /// Resolves a version of `logical_id`: the current one when `version_label` is `None`,
    /// otherwise the first version carrying that label.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::NotFound`] if the id is unknown or no version carries the label.
    pub fn read(
        &self,
        logical_id: LogicalId,
        version_label: Option<&str>,
    ) -> PatientResult<RecordVersion<R>> {
        let inner = self.inner.read();
        let history = inner
            .histories
            .get(&logical_id)
            .ok_or_else(|| PatientError::NotFound(logical_id.to_string()))?;

        match version_label {
            None => Ok(history.current().clone()),
            Some(label) => history.find(label).cloned().ok_or_else(|| {
                PatientError::NotFound(format!("{logical_id}/_history/{label}"))
            }),
        }
    }

    /// Appends `record` as the new current version of `logical_id` and returns that version.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::NotFound`] if the id was never created.
    pub fn update(&self, logical_id: LogicalId, record: R) -> PatientResult<RecordVersion<R>> {
        let mut inner = self.inner.write();
        let history = inner
            .histories
            .get_mut(&logical_id)
            .ok_or_else(|| PatientError::NotFound(logical_id.to_string()))?;

        Ok(history.append(logical_id, record, Utc::now()).clone())
    }

    /// The current version of every record, in ascending id order.
    pub fn current_versions(&self) -> Vec<RecordVersion<R>> {
        self.inner
            .read()
            .histories
            .values()
            .map(|history| history.current().clone())
            .collect()
    }

    /// Every version of `logical_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::NotFound`] if the id is unknown.
    pub fn history(&self, logical_id: LogicalId) -> PatientResult<Vec<RecordVersion<R>>> {
        let inner = self.inner.read();
        inner
            .histories
            .get(&logical_id)
            .map(|history| history.iter().cloned().collect())
            .ok_or_else(|| PatientError::NotFound(logical_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn store() -> RecordStore<&'static str> {
        RecordStore::new(LogicalId::new(1))
    }

    #[test]
    fn create_allocates_monotonic_ids_starting_at_first_id() {
        let store = RecordStore::new(LogicalId::new(51));
        let a = store.create("a").expect("create a");
        let b = store.create("b").expect("create b");

        assert_eq!(a, LogicalId::new(51));
        assert_eq!(b, LogicalId::new(52));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn create_stores_version_zero() {
        let store = store();
        let id = store.create("first").expect("create");

        let version = store.read(id, None).expect("read should succeed");
        assert_eq!(version.version_label(), "0");
        assert_eq!(version.logical_id(), id);
        assert_eq!(*version.record(), "first");
    }

    #[test]
    fn version_labels_follow_append_position() {
        let store = store();
        let id = store.create("v0").expect("create");
        for n in 1..=5 {
            let appended = store.update(id, "later").expect("update should succeed");
            assert_eq!(appended.version_label(), n.to_string());
        }

        let history = store.history(id).expect("history");
        for (n, version) in history.iter().enumerate() {
            assert_eq!(version.version_label(), n.to_string());
        }
    }

    #[test]
    fn read_without_version_returns_latest() {
        let store = store();
        let id = store.create("original").expect("create");
        store.update(id, "revised").expect("update should succeed");

        let current = store.read(id, None).expect("read current");
        assert_eq!(*current.record(), "revised");
        assert_eq!(current.version_label(), "1");

        let original = store.read(id, Some("0")).expect("read version 0");
        assert_eq!(*original.record(), "original");
        assert!(original.last_updated() <= current.last_updated());
    }

    #[test]
    fn read_unknown_id_or_version_is_not_found() {
        let store = store();
        let id = store.create("only").expect("create");

        assert!(matches!(
            store.read(LogicalId::new(999), None),
            Err(PatientError::NotFound(_))
        ));
        let err = store.read(id, Some("7")).expect_err("unknown version");
        match err {
            PatientError::NotFound(msg) => assert!(msg.contains("_history/7"), "{msg}"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn update_unknown_id_is_not_found_and_leaves_store_unchanged() {
        let store = store();
        store.create("a").expect("create");

        assert!(matches!(
            store.update(LogicalId::new(42), "b"),
            Err(PatientError::NotFound(_))
        ));
        assert_eq!(store.len(), 1);
        assert!(store.history(LogicalId::new(42)).is_err());
    }

    #[test]
    fn update_does_not_touch_other_histories_or_counter() {
        let store = store();
        let a = store.create("a0").expect("create");
        let b = store.create("b0").expect("create");
        store.update(a, "a1").expect("update a");

        assert_eq!(store.history(b).expect("history b").len(), 1);
        assert_eq!(store.create("c0").expect("create c"), LogicalId::new(3));
    }

    #[test]
    fn current_versions_projects_each_history() {
        let store = store();
        assert!(store.current_versions().is_empty());

        let a = store.create("a0").expect("create");
        store.create("b0").expect("create");
        store.update(a, "a1").expect("update a");

        let current: Vec<_> = store
            .current_versions()
            .into_iter()
            .map(RecordVersion::into_record)
            .collect();
        assert_eq!(current, vec!["a1", "b0"]);
    }

    #[test]
    fn last_identity_is_allocated_once_then_create_fails() {
        let store = RecordStore::new(LogicalId::new(u64::MAX));

        let last = store.create("last").expect("u64::MAX is still a valid id");
        assert_eq!(last, LogicalId::new(u64::MAX));
        assert_eq!(store.next_id(), None);

        let err = store.create("overflow").expect_err("id space exhausted");
        assert!(matches!(err, PatientError::InvalidInput(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(*store.read(last, None).expect("read last").record(), "last");
    }

    #[test]
    fn concurrent_updates_to_one_id_produce_a_gapless_sequence() {
        let store = Arc::new(RecordStore::<u32>::new(LogicalId::new(1)));
        let id = store.create(0).expect("create");

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.update(id, t * 100 + i).expect("update should succeed");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread should not panic");
        }

        let history = store.history(id).expect("history");
        assert_eq!(history.len(), 201);
        for (n, version) in history.iter().enumerate() {
            assert_eq!(version.version_label(), n.to_string());
        }
    }
}
