/* The InMemoryStore keeps all records in per-collection BTreeMaps. It is
the reference DocumentStore implementation: fast, isolated tests and small
deployments that do not need persistence across restarts. */

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use coursebook_base::CoursebookResult;

use crate::record::{Record, RecordId};
use crate::store::traits::DocumentStore;

/// An in-memory document store backed by per-collection BTreeMaps.
///
/// Collections are created lazily on first insert. Records are cloned on
/// the way in and out, so the store owns its own copies.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use coursebook_engine::store::InMemoryStore;
/// use coursebook_engine::store::traits::DocumentStore;
///
/// let mut store = InMemoryStore::new();
/// let mut fields = BTreeMap::new();
/// fields.insert("course_name".to_string(), "Yoga".to_string());
///
/// let id = store.insert_one("course", fields).unwrap();
/// let record = store.find_one("course", &id).unwrap().unwrap();
/// assert_eq!(record.field("course_name"), Some("Yoga"));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: HashMap<String, BTreeMap<RecordId, Record>>,
}

impl InMemoryStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self {
            collections: HashMap::new(),
        }
    }

    fn collection(&self, name: &str) -> Option<&BTreeMap<RecordId, Record>> {
        self.collections.get(name)
    }

    fn collection_mut(&mut self, name: &str) -> &mut BTreeMap<RecordId, Record> {
        self.collections.entry(name.to_string()).or_default()
    }
}

/// Order two records by the given sort fields ascending, falling back to
/// the record id so equal keys still sort deterministically.
fn compare_records(a: &Record, b: &Record, sort: &[&str]) -> Ordering {
    for field in sort {
        let left = a.field(field).unwrap_or("");
        let right = b.field(field).unwrap_or("");
        match left.cmp(right) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.id().cmp(b.id())
}

impl DocumentStore for InMemoryStore {
    fn insert_one(
        &mut self,
        collection: &str,
        fields: BTreeMap<String, String>,
    ) -> CoursebookResult<RecordId> {
        let id = RecordId::generate();
        let record = Record::new(id.clone(), fields);
        self.collection_mut(collection).insert(id.clone(), record);
        Ok(id)
    }

    fn find_one(&self, collection: &str, id: &RecordId) -> CoursebookResult<Option<Record>> {
        Ok(self
            .collection(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    fn find_many(
        &self,
        collection: &str,
        filter: &BTreeMap<String, String>,
        sort: &[&str],
    ) -> CoursebookResult<Vec<Record>> {
        let mut results: Vec<Record> = self
            .collection(collection)
            .map(|records| {
                records
                    .values()
                    .filter(|record| record.matches(filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        results.sort_by(|a, b| compare_records(a, b, sort));
        Ok(results)
    }

    fn update_one(
        &mut self,
        collection: &str,
        id: &RecordId,
        fields: BTreeMap<String, String>,
    ) -> CoursebookResult<Option<Record>> {
        let Some(record) = self.collection_mut(collection).get_mut(id) else {
            return Ok(None);
        };

        for (key, value) in fields {
            record.set_field(key, value);
        }
        Ok(Some(record.clone()))
    }

    fn delete_one(&mut self, collection: &str, id: &RecordId) -> CoursebookResult<u64> {
        let removed = self
            .collections
            .get_mut(collection)
            .and_then(|records| records.remove(id));
        Ok(if removed.is_some() { 1 } else { 0 })
    }
}
