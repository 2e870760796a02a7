/* One generic service replaces the three near-identical per-entity service
classes of the obvious design: a ResourceSchema names the collection, its
declared fields and its sort key, and ResourceService runs the same CRUD
logic for all of them against a shared StoreHandle. */

use std::collections::BTreeMap;

use tracing::debug;

use coursebook_base::CoursebookResult;

use crate::record::{Record, RecordId};
use crate::store::StoreHandle;

/// Static description of one resource: its name (also the collection name
/// and URL segment), the declared fields, and the fixed sort key used by
/// search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSchema {
    name: &'static str,
    fields: &'static [&'static str],
    sort_key: &'static [&'static str],
}

impl ResourceSchema {
    /// The `course` resource.
    pub fn course() -> Self {
        Self {
            name: "course",
            fields: &["course_name", "description", "date"],
            sort_key: &["course_name"],
        }
    }

    /// The `registration` resource.
    pub fn registration() -> Self {
        Self {
            name: "registration",
            fields: &["first_name", "last_name", "course_name", "phone", "memberID"],
            sort_key: &["first_name", "last_name"],
        }
    }

    /// The `review` resource.
    pub fn review() -> Self {
        Self {
            name: "review",
            fields: &["first_name", "last_name", "course_name", "text"],
            sort_key: &["first_name", "last_name"],
        }
    }

    /// Resource name, doubling as collection name and URL segment.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared field names.
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// Fixed sort key for search results.
    pub fn sort_key(&self) -> &'static [&'static str] {
        self.sort_key
    }

    /// Whether a field name is declared for this resource.
    pub fn declares(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }
}

/// CRUD access to one collection.
///
/// Holds no business rules beyond default-filling and id-based addressing;
/// everything else is delegated to the store.
#[derive(Debug, Clone)]
pub struct ResourceService {
    schema: ResourceSchema,
    store: StoreHandle,
}

impl ResourceService {
    /// Create a service for one resource over the given store handle.
    pub fn new(schema: ResourceSchema, store: StoreHandle) -> Self {
        Self { schema, store }
    }

    /// The schema this service is instantiated for.
    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Find records by exact-match filter, ordered by the schema's sort
    /// key. An empty filter returns all records.
    pub fn search(&self, filter: &BTreeMap<String, String>) -> CoursebookResult<Vec<Record>> {
        debug!(resource = self.schema.name, filters = filter.len(), "searching records");
        self.store
            .find_many(self.schema.name, filter, self.schema.sort_key)
    }

    /// Persist a new record.
    ///
    /// Declared fields missing from the input default to the empty string;
    /// fields outside the schema are dropped. Returns the persisted record
    /// including its store-assigned id.
    pub fn create(&self, input: &BTreeMap<String, String>) -> CoursebookResult<Record> {
        let mut fields = BTreeMap::new();
        for field in self.schema.fields {
            let value = input.get(*field).cloned().unwrap_or_default();
            fields.insert(field.to_string(), value);
        }

        let id = self.store.insert_one(self.schema.name, fields)?;
        debug!(resource = self.schema.name, id = %id, "created record");

        match self.store.find_one(self.schema.name, &id)? {
            Some(record) => Ok(record),
            None => Err(Box::new(coursebook_base::CoursebookError::storage_unavailable(
                format!("record {} vanished directly after insert", id),
            ))),
        }
    }

    /// Read a record by id string.
    ///
    /// A malformed id fails with `InvalidIdentifier` before reaching the
    /// store. A missing record is `Ok(None)`; the caller decides how to
    /// surface absence.
    pub fn read(&self, id: &str) -> CoursebookResult<Option<Record>> {
        let id = RecordId::parse(id)?;
        self.store.find_one(self.schema.name, &id)
    }

    /// Overwrite fields of an existing record.
    ///
    /// Exactly the declared fields present in the input are overwritten; a
    /// present empty string clears the field. Returns the updated record,
    /// or `Ok(None)` if no record with that id exists.
    pub fn update(
        &self,
        id: &str,
        input: &BTreeMap<String, String>,
    ) -> CoursebookResult<Option<Record>> {
        let id = RecordId::parse(id)?;

        let mut fields = BTreeMap::new();
        for (key, value) in input {
            if self.schema.declares(key) {
                fields.insert(key.clone(), value.clone());
            }
        }

        let updated = self.store.update_one(self.schema.name, &id, fields)?;
        if updated.is_some() {
            debug!(resource = self.schema.name, id = %id, "updated record");
        }
        Ok(updated)
    }

    /// Remove a record by id string. Returns the count removed (0 or 1).
    pub fn delete(&self, id: &str) -> CoursebookResult<u64> {
        let id = RecordId::parse(id)?;
        let count = self.store.delete_one(self.schema.name, &id)?;
        debug!(resource = self.schema.name, id = %id, count, "deleted records");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use coursebook_base::ErrorKind;

    fn course_service() -> ResourceService {
        ResourceService::new(ResourceSchema::course(), StoreHandle::new(InMemoryStore::new()))
    }

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_create_returns_input_fields_and_fresh_id() {
        let service = course_service();

        let first = service
            .create(&fields(&[("course_name", "Yoga"), ("date", "Mon")]))
            .unwrap();
        assert_eq!(first.field("course_name"), Some("Yoga"));
        assert_eq!(first.field("date"), Some("Mon"));
        // Missing declared field defaults to empty string
        assert_eq!(first.field("description"), Some(""));

        let second = service.create(&fields(&[("course_name", "Pilates")])).unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_create_drops_undeclared_fields() {
        let service = course_service();
        let record = service
            .create(&fields(&[("course_name", "Yoga"), ("phone", "12345")]))
            .unwrap();
        assert_eq!(record.field("phone"), None);
    }

    #[test]
    fn test_read_after_create_returns_equal_record() {
        let service = course_service();
        let created = service.create(&fields(&[("course_name", "Yoga")])).unwrap();

        let read = service.read(created.id().as_str()).unwrap().unwrap();
        assert_eq!(read, created);
    }

    #[test]
    fn test_read_malformed_id_fails_before_store() {
        let service = course_service();
        let err = service.read("not-an-id").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_update_overwrites_present_fields_only() {
        let service = course_service();
        let created = service
            .create(&fields(&[("course_name", "Yoga"), ("date", "Mon")]))
            .unwrap();

        let updated = service
            .update(created.id().as_str(), &fields(&[("date", "Tue")]))
            .unwrap()
            .unwrap();
        assert_eq!(updated.field("course_name"), Some("Yoga"));
        assert_eq!(updated.field("date"), Some("Tue"));
        assert_eq!(updated.id(), created.id());
    }

    #[test]
    fn test_update_present_empty_string_clears_field() {
        let service = course_service();
        let created = service
            .create(&fields(&[("course_name", "Yoga"), ("date", "Mon")]))
            .unwrap();

        let updated = service
            .update(created.id().as_str(), &fields(&[("date", "")]))
            .unwrap()
            .unwrap();
        assert_eq!(updated.field("date"), Some(""));
    }

    #[test]
    fn test_update_empty_input_leaves_fields_unchanged() {
        let service = course_service();
        let created = service
            .create(&fields(&[("course_name", "Yoga"), ("date", "Mon")]))
            .unwrap();

        let updated = service
            .update(created.id().as_str(), &BTreeMap::new())
            .unwrap()
            .unwrap();
        assert_eq!(updated, created);
    }

    #[test]
    fn test_update_missing_record_returns_none() {
        let service = course_service();
        let absent_id = RecordId::generate();
        let result = service
            .update(absent_id.as_str(), &fields(&[("date", "Tue")]))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_update_ignores_undeclared_fields() {
        let service = course_service();
        let created = service.create(&fields(&[("course_name", "Yoga")])).unwrap();

        let updated = service
            .update(created.id().as_str(), &fields(&[("memberID", "42")]))
            .unwrap()
            .unwrap();
        assert_eq!(updated.field("memberID"), None);
    }

    #[test]
    fn test_delete_is_idempotent_in_effect() {
        let service = course_service();
        let created = service.create(&fields(&[("course_name", "Yoga")])).unwrap();

        assert_eq!(service.delete(created.id().as_str()).unwrap(), 1);
        assert_eq!(service.delete(created.id().as_str()).unwrap(), 0);
    }

    #[test]
    fn test_search_empty_filter_returns_all_in_sort_order() {
        let service = course_service();
        service.create(&fields(&[("course_name", "Weekend Flow")])).unwrap();
        service.create(&fields(&[("course_name", "Functional Yoga")])).unwrap();

        let results = service.search(&BTreeMap::new()).unwrap();
        let names: Vec<&str> = results
            .iter()
            .map(|r| r.field("course_name").unwrap())
            .collect();
        assert_eq!(names, vec!["Functional Yoga", "Weekend Flow"]);
    }

    #[test]
    fn test_search_exact_match_subset() {
        let store = StoreHandle::new(InMemoryStore::new());
        let service = ResourceService::new(ResourceSchema::registration(), store);

        service
            .create(&fields(&[("first_name", "Teresa"), ("course_name", "Yoga")]))
            .unwrap();
        service
            .create(&fields(&[("first_name", "Lisa"), ("course_name", "Weekend Flow")]))
            .unwrap();

        let results = service.search(&fields(&[("course_name", "Yoga")])).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].field("first_name"), Some("Teresa"));
    }

    #[test]
    fn test_yoga_lifecycle_scenario() {
        let service = course_service();

        let created = service
            .create(&fields(&[
                ("course_name", "Yoga"),
                ("description", ""),
                ("date", "Mon"),
            ]))
            .unwrap();
        assert_eq!(created.field("course_name"), Some("Yoga"));
        assert_eq!(created.field("description"), Some(""));
        assert_eq!(created.field("date"), Some("Mon"));

        let updated = service
            .update(created.id().as_str(), &fields(&[("date", "Tue")]))
            .unwrap()
            .unwrap();
        assert_eq!(updated.field("course_name"), Some("Yoga"));
        assert_eq!(updated.field("description"), Some(""));
        assert_eq!(updated.field("date"), Some("Tue"));

        assert_eq!(service.delete(created.id().as_str()).unwrap(), 1);
        assert!(service.read(created.id().as_str()).unwrap().is_none());
    }
}
