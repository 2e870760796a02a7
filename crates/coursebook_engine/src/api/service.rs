/* ApiService routes /{resource}[/{id}] to the registered controllers.
SchemaValidation wraps it as the outward-facing HttpService: requests are
validated before dispatch, and every successful reply leaves through
send_validated(), which serializes, checks the body against the schema for
the status code and only then builds the wire response. */

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, error, warn};

use coursebook_base::http::{
    HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpService, error_response,
};
use coursebook_base::{CoursebookError, CoursebookResult};

use crate::api::controller::{ApiReply, ResourceController};
use crate::api::schema::SchemaValidator;
use crate::resource::{ResourceSchema, ResourceService};
use crate::store::StoreHandle;

/// Routing service holding one controller per registered resource.
///
/// Construction wires each resource service to a clone of the same store
/// handle; the handle itself is owned by the process entry point.
#[derive(Clone)]
pub struct ApiService {
    controllers: Vec<ResourceController>,
}

impl ApiService {
    /// Create a service exposing the three standard resources.
    pub fn new(store: &StoreHandle) -> Self {
        Self::with_resources(
            store,
            vec![
                ResourceSchema::course(),
                ResourceSchema::registration(),
                ResourceSchema::review(),
            ],
        )
    }

    /// Create a service exposing the given resources.
    pub fn with_resources(store: &StoreHandle, schemas: Vec<ResourceSchema>) -> Self {
        let controllers = schemas
            .into_iter()
            .map(|schema| {
                ResourceController::new(ResourceService::new(schema, store.clone()))
            })
            .collect();
        Self { controllers }
    }

    /// The resource schemas this service exposes.
    pub fn schemas(&self) -> Vec<ResourceSchema> {
        self.controllers.iter().map(|c| c.schema()).collect()
    }

    /// Route a request to the matching controller operation.
    pub fn dispatch(
        &self,
        method: &HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> CoursebookResult<ApiReply> {
        let (bare_path, query) = split_query(path);
        let segments: Vec<&str> = bare_path
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let (name, id) = match segments.as_slice() {
            [name] => (*name, None),
            [name, id] => (*name, Some(*id)),
            _ => {
                return Err(Box::new(CoursebookError::bad_request(format!(
                    "no route matches path `{}`",
                    bare_path
                ))));
            }
        };

        let Some(controller) = self
            .controllers
            .iter()
            .find(|c| c.resource_name() == name)
        else {
            return Err(Box::new(CoursebookError::bad_request(format!(
                "unknown resource `{}`",
                name
            ))));
        };

        controller.handle(method, id, &query, body)
    }
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.controllers.iter().map(|c| c.resource_name()).collect();
        f.debug_struct("ApiService").field("resources", &names).finish()
    }
}

/// Split a request path into bare path and decoded query parameters.
fn split_query(path: &str) -> (&str, BTreeMap<String, String>) {
    let mut parts = path.splitn(2, '?');
    let bare_path = parts.next().unwrap_or(path);
    let mut query = BTreeMap::new();

    if let Some(raw) = parts.next() {
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            query.insert(decode_component(key), decode_component(value));
        }
    }
    (bare_path, query)
}

/// Percent-decode one query component; form-encoded `+` means space.
fn decode_component(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    urlencoding::decode(&plus_decoded)
        .map(|cow| cow.into_owned())
        .unwrap_or(plus_decoded)
}

/// Validation middleware gating every request/response pair.
///
/// Wraps the routing service as the outward-facing [`HttpService`]. CORS
/// preflight requests bypass validation entirely; everything else is
/// checked on the way in (mismatch: 400 before the controller runs) and on
/// the way out (mismatch: 500, a server-side contract bug).
pub struct SchemaValidation<V: SchemaValidator> {
    validator: V,
    inner: ApiService,
}

impl<V: SchemaValidator> SchemaValidation<V> {
    /// Wrap the routing service with the given validator.
    pub fn new(validator: V, inner: ApiService) -> Self {
        Self { validator, inner }
    }

    /// Serialize a reply, validate it against the schema for its status
    /// code and build the wire response. The single exit path for every
    /// successful controller reply.
    fn send_validated(&self, reply: ApiReply) -> CoursebookResult<HttpResponse> {
        let mut headers = HttpHeaders::new();
        for (key, value) in &reply.headers {
            headers.insert(key.clone(), value.clone());
        }

        self.validator
            .validate_response(reply.status, reply.body.as_ref(), &headers)
            .map_err(|message| Box::new(CoursebookError::response_contract(message)))?;

        let mut response = HttpResponse::new(reply.status);
        for (key, value) in reply.headers {
            response = response.with_header(key, value);
        }
        if let Some(body) = reply.body {
            response = response
                .with_content_type("application/json")
                .with_body(body.to_string());
        }
        Ok(response)
    }

    /// Answer a CORS preflight without validation.
    fn preflight_response() -> HttpResponse {
        with_cors_headers(HttpResponse::no_content())
            .with_header(
                "Access-Control-Allow-Methods",
                "GET, POST, PUT, PATCH, DELETE, OPTIONS",
            )
            .with_header("Access-Control-Allow-Headers", "Content-Type")
    }

    /// Map a failed request to its wire response, logging by severity.
    fn failure(&self, error: &CoursebookError) -> HttpResponse {
        if error.is_expected() {
            debug!(error = %error, "request resolved to an expected error");
        } else {
            warn!(error = %error, "request failed");
        }
        with_cors_headers(error_response(error))
    }
}

/// The frontend is served from a different origin during development.
fn with_cors_headers(response: HttpResponse) -> HttpResponse {
    response.with_header("Access-Control-Allow-Origin", "*")
}

impl<V: SchemaValidator> std::fmt::Debug for SchemaValidation<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidation")
            .field("inner", &self.inner)
            .finish()
    }
}

impl<V: SchemaValidator> HttpService for SchemaValidation<V> {
    fn handle_request(&self, request: HttpRequest) -> CoursebookResult<HttpResponse> {
        // Don't break the CORS OPTIONS pre-flight
        if request.method() == &HttpMethod::Options {
            return Ok(Self::preflight_response());
        }

        let body = if request.body().is_empty() {
            None
        } else {
            match serde_json::from_slice::<Value>(request.body().as_bytes()) {
                Ok(value) => Some(value),
                Err(e) => {
                    let error =
                        CoursebookError::bad_request(format!("request body is not valid JSON: {}", e));
                    return Ok(self.failure(&error));
                }
            }
        };

        if let Err(message) = self.validator.validate_request(
            request.method(),
            request.path(),
            request.headers(),
            body.as_ref(),
        ) {
            return Ok(self.failure(&CoursebookError::bad_request(message)));
        }

        let reply = match self.inner.dispatch(request.method(), request.path(), body.as_ref()) {
            Ok(reply) => reply,
            Err(e) => return Ok(self.failure(&e)),
        };

        match self.send_validated(reply) {
            Ok(response) => Ok(with_cors_headers(response)),
            Err(e) => {
                // A reply failing its own schema is a bug in this server
                error!(error = %e, "response violates the interface schema");
                Ok(self.failure(&e))
            }
        }
    }
}
