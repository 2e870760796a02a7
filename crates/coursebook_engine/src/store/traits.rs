/* The DocumentStore trait abstracts how records are persisted, addressed
by named collections. The engine only needs the five operations below;
connection setup and teardown belong to the implementation. Defining a
trait lets tests run against the fast in-memory store while a deployment
can plug in a real database backend. */

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use coursebook_base::CoursebookResult;

use crate::record::{Record, RecordId};

/// Trait for record storage implementations.
///
/// Provides CRUD operations on named collections of flat records. All
/// operations return `CoursebookResult`; an implementation that loses its
/// connection reports `StorageUnavailable`.
pub trait DocumentStore: Send + Sync + 'static {
    /// Insert a record built from the given fields into a collection.
    ///
    /// The store assigns the id; it is returned to the caller and is
    /// immutable for the lifetime of the record.
    fn insert_one(
        &mut self,
        collection: &str,
        fields: BTreeMap<String, String>,
    ) -> CoursebookResult<RecordId>;

    /// Retrieve a record by id.
    ///
    /// Returns `Ok(None)` if no record with that id exists; absence is not
    /// an error at this layer.
    fn find_one(&self, collection: &str, id: &RecordId) -> CoursebookResult<Option<Record>>;

    /// Find all records matching an exact-match filter.
    ///
    /// An empty filter matches everything. Results are ordered by the given
    /// sort fields ascending, with the record id as final tiebreaker so the
    /// order is deterministic.
    fn find_many(
        &self,
        collection: &str,
        filter: &BTreeMap<String, String>,
        sort: &[&str],
    ) -> CoursebookResult<Vec<Record>>;

    /// Overwrite the given fields of an existing record.
    ///
    /// Fields not named in `fields` keep their value. Returns the updated
    /// record, or `Ok(None)` if no record with that id exists.
    fn update_one(
        &mut self,
        collection: &str,
        id: &RecordId,
        fields: BTreeMap<String, String>,
    ) -> CoursebookResult<Option<Record>>;

    /// Remove a record by id.
    ///
    /// Returns the number of records removed (0 or 1).
    fn delete_one(&mut self, collection: &str, id: &RecordId) -> CoursebookResult<u64>;
}

/// A thread-safe handle to a document store.
///
/// StoreHandle provides cheap cloning (via Arc) and interior mutability
/// (via RwLock). The process entry point constructs it once and passes a
/// clone to each resource service; there is no process-wide singleton.
#[derive(Clone)]
pub struct StoreHandle(Arc<RwLock<dyn DocumentStore>>);

impl StoreHandle {
    /// Create a new StoreHandle wrapping the given store implementation.
    pub fn new<S: DocumentStore>(store: S) -> Self {
        Self(Arc::new(RwLock::new(store)))
    }

    /// Insert a record. See [`DocumentStore::insert_one`].
    pub fn insert_one(
        &self,
        collection: &str,
        fields: BTreeMap<String, String>,
    ) -> CoursebookResult<RecordId> {
        self.0.write().insert_one(collection, fields)
    }

    /// Retrieve a record by id. See [`DocumentStore::find_one`].
    pub fn find_one(&self, collection: &str, id: &RecordId) -> CoursebookResult<Option<Record>> {
        self.0.read().find_one(collection, id)
    }

    /// Find matching records. See [`DocumentStore::find_many`].
    pub fn find_many(
        &self,
        collection: &str,
        filter: &BTreeMap<String, String>,
        sort: &[&str],
    ) -> CoursebookResult<Vec<Record>> {
        self.0.read().find_many(collection, filter, sort)
    }

    /// Overwrite fields of a record. See [`DocumentStore::update_one`].
    pub fn update_one(
        &self,
        collection: &str,
        id: &RecordId,
        fields: BTreeMap<String, String>,
    ) -> CoursebookResult<Option<Record>> {
        self.0.write().update_one(collection, id, fields)
    }

    /// Remove a record by id. See [`DocumentStore::delete_one`].
    pub fn delete_one(&self, collection: &str, id: &RecordId) -> CoursebookResult<u64> {
        self.0.write().delete_one(collection, id)
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle").finish()
    }
}
