/* Schema validation gates every request/response pair before and after the
controller runs. The SchemaValidator trait is the seam: the middleware only
needs the two capabilities below, and tests can substitute their own
validator. ApiSchema is the concrete validator, derived from the registered
resource schemas instead of an external schema document. */

use serde_json::Value;

use coursebook_base::http::{HttpHeaders, HttpMethod, HttpStatusCode};

use crate::resource::ResourceSchema;

/// Structural validation of requests and responses against a declared
/// interface contract.
///
/// Both operations return the validator's message on mismatch; how that
/// message is surfaced (400 vs. 500) is the middleware's decision.
pub trait SchemaValidator: Send + Sync + 'static {
    /// Validate method, path, headers and (if present) body of an inbound
    /// request.
    fn validate_request(
        &self,
        method: &HttpMethod,
        path: &str,
        headers: &HttpHeaders,
        body: Option<&Value>,
    ) -> Result<(), String>;

    /// Validate an outbound response body for the given status code.
    fn validate_response(
        &self,
        status: HttpStatusCode,
        body: Option<&Value>,
        headers: &HttpHeaders,
    ) -> Result<(), String>;
}

/// Validator derived from the registered resource schemas.
///
/// Knows every route shape (`/{resource}` and `/{resource}/{id}` with
/// their allowed methods) and the body schema of each entity: a flat JSON
/// object whose declared fields carry string values, with unknown fields
/// rejected.
#[derive(Debug, Clone)]
pub struct ApiSchema {
    resources: Vec<ResourceSchema>,
}

impl ApiSchema {
    /// Build a validator covering the given resources.
    pub fn new(resources: Vec<ResourceSchema>) -> Self {
        Self { resources }
    }

    fn resource(&self, segment: &str) -> Option<&ResourceSchema> {
        self.resources.iter().find(|r| r.name() == segment)
    }

    /// Whether any registered resource declares this field.
    fn declared_anywhere(&self, field: &str) -> bool {
        self.resources.iter().any(|r| r.declares(field))
    }

    fn validate_body(&self, resource: &ResourceSchema, body: &Value) -> Result<(), String> {
        let Some(object) = body.as_object() else {
            return Err("request body must be a JSON object".to_string());
        };

        for (field, value) in object {
            if !resource.declares(field) {
                return Err(format!(
                    "field `{}` is not declared for resource `{}`",
                    field,
                    resource.name()
                ));
            }
            if !value.is_string() {
                return Err(format!("field `{}` must be a string", field));
            }
        }
        Ok(())
    }

    /// Check that a JSON value is a well-formed record representation:
    /// a string `_id`, a `_links` block with the four actions, and string
    /// values for every declared field.
    fn validate_record(&self, value: &Value) -> Result<(), String> {
        let Some(object) = value.as_object() else {
            return Err("record must be a JSON object".to_string());
        };

        match object.get("_id") {
            Some(Value::String(_)) => {}
            _ => return Err("record is missing a string `_id`".to_string()),
        }

        let Some(links) = object.get("_links").and_then(Value::as_object) else {
            return Err("record is missing a `_links` object".to_string());
        };
        for action in ["read", "update", "patch", "delete"] {
            let Some(link) = links.get(action).and_then(Value::as_object) else {
                return Err(format!("`_links` is missing the `{}` action", action));
            };
            if !link.get("url").is_some_and(Value::is_string)
                || !link.get("method").is_some_and(Value::is_string)
            {
                return Err(format!(
                    "`_links.{}` must carry a url and a method",
                    action
                ));
            }
        }

        for (field, value) in object {
            if field == "_id" || field == "_links" {
                continue;
            }
            if !self.declared_anywhere(field) {
                return Err(format!("record carries undeclared field `{}`", field));
            }
            if !value.is_string() {
                return Err(format!("record field `{}` must be a string", field));
            }
        }
        Ok(())
    }
}

impl SchemaValidator for ApiSchema {
    fn validate_request(
        &self,
        method: &HttpMethod,
        path: &str,
        _headers: &HttpHeaders,
        body: Option<&Value>,
    ) -> Result<(), String> {
        let bare_path = path.split('?').next().unwrap_or(path);
        let segments: Vec<&str> = bare_path
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let (resource, has_id) = match segments.as_slice() {
            [name] => (self.resource(name), false),
            [name, _id] => (self.resource(name), true),
            _ => (None, false),
        };
        let Some(resource) = resource else {
            return Err(format!("no declared route matches path `{}`", bare_path));
        };

        let method_allowed = if has_id {
            matches!(
                method,
                HttpMethod::Get | HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete
            )
        } else {
            matches!(method, HttpMethod::Get | HttpMethod::Post)
        };
        if !method_allowed {
            return Err(format!(
                "method {} is not declared for path `{}`",
                method, bare_path
            ));
        }

        // Bodies are only declared on the writing methods
        if matches!(method, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
            && let Some(body) = body
        {
            self.validate_body(resource, body)?;
        }
        Ok(())
    }

    fn validate_response(
        &self,
        status: HttpStatusCode,
        body: Option<&Value>,
        headers: &HttpHeaders,
    ) -> Result<(), String> {
        match status {
            HttpStatusCode::Ok => {
                let Some(body) = body else {
                    return Err("200 response is missing a body".to_string());
                };
                match body {
                    Value::Array(items) => {
                        for item in items {
                            self.validate_record(item)?;
                        }
                        Ok(())
                    }
                    other => self.validate_record(other),
                }
            }
            HttpStatusCode::Created => {
                if !headers.contains("Location") {
                    return Err("201 response is missing a Location header".to_string());
                }
                let Some(body) = body else {
                    return Err("201 response is missing a body".to_string());
                };
                self.validate_record(body)
            }
            HttpStatusCode::NoContent => match body {
                None => Ok(()),
                Some(_) => Err("204 response must not carry a body".to_string()),
            },
            _ => {
                let Some(error) = body.and_then(|b| b.get("error")) else {
                    return Err(format!(
                        "{} response must carry an error message",
                        status.as_u16()
                    ));
                };
                if error.is_string() {
                    Ok(())
                } else {
                    Err("error message must be a string".to_string())
                }
            }
        }
    }
}
