/* One generic controller per resource translates HTTP verb + path + body
into service calls. Controllers never touch the transport: they produce an
ApiReply, and the validation middleware owns serialization and transmission. */

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use coursebook_base::http::{HttpMethod, HttpStatusCode};
use coursebook_base::{CoursebookError, CoursebookResult};

use crate::record::Record;
use crate::resource::{ResourceSchema, ResourceService};

/// Outcome of a controller call: status, optional JSON body, extra headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: HttpStatusCode,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiReply {
    /// A 200 reply with a JSON body.
    pub fn ok(body: Value) -> Self {
        Self {
            status: HttpStatusCode::Ok,
            body: Some(body),
            headers: vec![],
        }
    }

    /// A 201 reply with a JSON body and a Location header.
    pub fn created(body: Value, location: impl Into<String>) -> Self {
        Self {
            status: HttpStatusCode::Created,
            body: Some(body),
            headers: vec![("Location".to_string(), location.into())],
        }
    }

    /// A 204 reply with no body.
    pub fn no_content() -> Self {
        Self {
            status: HttpStatusCode::NoContent,
            body: None,
            headers: vec![],
        }
    }
}

/// HTTP controller for one resource.
///
/// Maps the five-verb contract onto the resource service and attaches the
/// `_links` hypermedia block so a client can discover the follow-up
/// actions of every record it receives.
#[derive(Debug, Clone)]
pub struct ResourceController {
    service: ResourceService,
    prefix: String,
}

impl ResourceController {
    /// Create a controller for the given service. The URL prefix is derived
    /// from the resource name.
    pub fn new(service: ResourceService) -> Self {
        let prefix = format!("/{}", service.schema().name());
        Self { service, prefix }
    }

    /// The resource name this controller answers for.
    pub fn resource_name(&self) -> &'static str {
        self.service.schema().name()
    }

    /// The schema of the resource this controller answers for.
    pub fn schema(&self) -> ResourceSchema {
        *self.service.schema()
    }

    /// Dispatch one request to the matching operation.
    ///
    /// `id` is the second path segment if present; `query` the decoded
    /// query parameters; `body` the parsed JSON body if one was sent.
    pub fn handle(
        &self,
        method: &HttpMethod,
        id: Option<&str>,
        query: &BTreeMap<String, String>,
        body: Option<&Value>,
    ) -> CoursebookResult<ApiReply> {
        match (method, id) {
            (HttpMethod::Get, None) => self.search(query),
            (HttpMethod::Post, None) => self.create(body),
            (HttpMethod::Get, Some(id)) => self.read(id),
            (HttpMethod::Put, Some(id)) | (HttpMethod::Patch, Some(id)) => self.update(id, body),
            (HttpMethod::Delete, Some(id)) => self.delete(id),
            _ => Err(Box::new(CoursebookError::bad_request(format!(
                "method {} is not supported for resource `{}`",
                method,
                self.resource_name()
            )))),
        }
    }

    /// GET /{resource}
    fn search(&self, query: &BTreeMap<String, String>) -> CoursebookResult<ApiReply> {
        let records = self.service.search(query)?;
        let items: Vec<Value> = records.iter().map(|r| self.record_to_json(r)).collect();
        Ok(ApiReply::ok(Value::Array(items)))
    }

    /// POST /{resource}
    fn create(&self, body: Option<&Value>) -> CoursebookResult<ApiReply> {
        let input = body_to_fields(body);
        let record = self.service.create(&input)?;
        let location = format!("{}/{}", self.prefix, record.id());
        Ok(ApiReply::created(self.record_to_json(&record), location))
    }

    /// GET /{resource}/{id}
    fn read(&self, id: &str) -> CoursebookResult<ApiReply> {
        match self.service.read(id)? {
            Some(record) => Ok(ApiReply::ok(self.record_to_json(&record))),
            None => Err(Box::new(CoursebookError::not_found(
                self.resource_name(),
                id,
            ))),
        }
    }

    /// PUT or PATCH /{resource}/{id}
    fn update(&self, id: &str, body: Option<&Value>) -> CoursebookResult<ApiReply> {
        let input = body_to_fields(body);
        match self.service.update(id, &input)? {
            Some(record) => Ok(ApiReply::ok(self.record_to_json(&record))),
            None => Err(Box::new(CoursebookError::not_found(
                self.resource_name(),
                id,
            ))),
        }
    }

    /// DELETE /{resource}/{id}
    ///
    /// Replies 204 regardless of whether a record existed.
    fn delete(&self, id: &str) -> CoursebookResult<ApiReply> {
        self.service.delete(id)?;
        Ok(ApiReply::no_content())
    }

    /// Serialize a record, augmented with the `_links` hypermedia block.
    fn record_to_json(&self, record: &Record) -> Value {
        let url = format!("{}/{}", self.prefix, record.id());

        let mut object = Map::new();
        object.insert("_id".to_string(), Value::String(record.id().to_string()));
        for (field, value) in record.fields() {
            object.insert(field.clone(), Value::String(value.clone()));
        }
        object.insert(
            "_links".to_string(),
            json!({
                "read":   {"url": url, "method": "GET"},
                "update": {"url": url, "method": "PUT"},
                "patch":  {"url": url, "method": "PATCH"},
                "delete": {"url": url, "method": "DELETE"},
            }),
        );
        Value::Object(object)
    }
}

/// Extract the flat field map from a JSON body.
///
/// Request validation has already guaranteed string values; anything else
/// that slips through (no validator configured) is silently dropped.
fn body_to_fields(body: Option<&Value>) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    if let Some(object) = body.and_then(Value::as_object) {
        for (key, value) in object {
            if let Some(s) = value.as_str() {
                fields.insert(key.clone(), s.to_string());
            }
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordId;
    use crate::resource::ResourceSchema;
    use crate::store::{InMemoryStore, StoreHandle};
    use coursebook_base::ErrorKind;

    fn controller() -> ResourceController {
        let store = StoreHandle::new(InMemoryStore::new());
        ResourceController::new(ResourceService::new(ResourceSchema::course(), store))
    }

    fn no_query() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_create_replies_201_with_location_and_links() {
        let controller = controller();
        let body = json!({"course_name": "Yoga", "date": "Mon"});

        let reply = controller
            .handle(&HttpMethod::Post, None, &no_query(), Some(&body))
            .unwrap();

        assert_eq!(reply.status, HttpStatusCode::Created);
        let record = reply.body.unwrap();
        let id = record["_id"].as_str().unwrap().to_string();
        assert_eq!(record["course_name"], "Yoga");
        assert_eq!(record["description"], "");
        assert_eq!(record["_links"]["read"]["method"], "GET");
        assert_eq!(
            record["_links"]["delete"]["url"],
            format!("/course/{}", id)
        );
        assert_eq!(
            reply.headers,
            vec![("Location".to_string(), format!("/course/{}", id))]
        );
    }

    #[test]
    fn test_search_replies_list_with_links() {
        let controller = controller();
        for name in ["Weekend Flow", "Functional Yoga"] {
            controller
                .handle(
                    &HttpMethod::Post,
                    None,
                    &no_query(),
                    Some(&json!({"course_name": name})),
                )
                .unwrap();
        }

        let reply = controller
            .handle(&HttpMethod::Get, None, &no_query(), None)
            .unwrap();
        assert_eq!(reply.status, HttpStatusCode::Ok);
        let items = reply.body.unwrap();
        let items = items.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["course_name"], "Functional Yoga");
        assert!(items[0]["_links"].is_object());
    }

    #[test]
    fn test_search_applies_query_filter() {
        let controller = controller();
        for name in ["Yoga", "Pilates"] {
            controller
                .handle(
                    &HttpMethod::Post,
                    None,
                    &no_query(),
                    Some(&json!({"course_name": name})),
                )
                .unwrap();
        }

        let mut query = BTreeMap::new();
        query.insert("course_name".to_string(), "Yoga".to_string());
        let reply = controller
            .handle(&HttpMethod::Get, None, &query, None)
            .unwrap();
        let items = reply.body.unwrap();
        assert_eq!(items.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_read_missing_record_is_not_found() {
        let controller = controller();
        let absent = RecordId::generate();
        let err = controller
            .handle(&HttpMethod::Get, Some(absent.as_str()), &no_query(), None)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NotFound { .. }));
    }

    #[test]
    fn test_read_malformed_id_is_invalid_identifier() {
        let controller = controller();
        let err = controller
            .handle(&HttpMethod::Get, Some("nope"), &no_query(), None)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_update_via_put_and_patch() {
        let controller = controller();
        let created = controller
            .handle(
                &HttpMethod::Post,
                None,
                &no_query(),
                Some(&json!({"course_name": "Yoga", "date": "Mon"})),
            )
            .unwrap();
        let id = created.body.unwrap()["_id"].as_str().unwrap().to_string();

        for method in [HttpMethod::Put, HttpMethod::Patch] {
            let reply = controller
                .handle(
                    &method,
                    Some(&id),
                    &no_query(),
                    Some(&json!({"date": "Tue"})),
                )
                .unwrap();
            assert_eq!(reply.status, HttpStatusCode::Ok);
            let record = reply.body.unwrap();
            assert_eq!(record["course_name"], "Yoga");
            assert_eq!(record["date"], "Tue");
        }
    }

    #[test]
    fn test_delete_replies_204_even_when_absent() {
        let controller = controller();
        let absent = RecordId::generate();
        let reply = controller
            .handle(&HttpMethod::Delete, Some(absent.as_str()), &no_query(), None)
            .unwrap();
        assert_eq!(reply.status, HttpStatusCode::NoContent);
        assert!(reply.body.is_none());
    }

    #[test]
    fn test_unroutable_method_is_bad_request() {
        let controller = controller();
        let err = controller
            .handle(&HttpMethod::Delete, None, &no_query(), None)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::BadRequest { .. }));
    }
}
