/* The api module exposes the engine over HTTP: one generic controller per
resource, a routing service implementing HttpService, and the validation
middleware that gates every request/response pair against the declared
interface schema. */

mod controller;
mod schema;
mod service;

pub use controller::{ApiReply, ResourceController};
pub use schema::{ApiSchema, SchemaValidator};
pub use service::{ApiService, SchemaValidation};
