pub mod api;
pub mod config;
pub mod record;
pub mod resource;
pub mod store;

pub use api::{ApiReply, ApiSchema, ApiService, ResourceController, SchemaValidation};
pub use api::SchemaValidator;
pub use config::{Config, load_config};
pub use record::{Record, RecordId};
pub use resource::{ResourceSchema, ResourceService};
pub use store::{DocumentStore, InMemoryStore, StoreHandle};
