/* The CLI is intentionally minimal: no argument parsing, just a
`coursebook.toml` in the current directory (optional) and a running
server. The entry point owns the store handle's lifecycle and passes it
down to the services; nothing else holds global state. */

use std::path::Path;
use std::process;
use std::sync::Arc;

use coursebook_base::http::HttpServerConfig;
use coursebook_base::server::HttpServer;
use coursebook_base::tracing::init_tracing;
use coursebook_engine::{ApiSchema, ApiService, InMemoryStore, SchemaValidation, StoreHandle};
use coursebook_engine::load_config;

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Error: Failed to initialize tracing: {}", e);
        process::exit(1);
    }

    let config = match load_config(Path::new("coursebook.toml")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config from coursebook.toml: {}", e);
            process::exit(1);
        }
    };

    let store = StoreHandle::new(InMemoryStore::new());
    let api = ApiService::new(&store);
    let validator = ApiSchema::new(api.schemas());
    let service = SchemaValidation::new(validator, api);

    let mut server_config = HttpServerConfig::new(config.host.clone());
    if let Some(port) = config.port {
        server_config = server_config.with_port(port);
    }

    let handle = match HttpServer::start(&server_config, Arc::new(service)) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: Failed to start HTTP server: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Serving course, registration and review resources on http://{}:{}",
        config.host,
        handle.port()
    );

    handle.wait();
}
