/* The server loop is the top-level error handler: any Err escaping the
service stack is mapped to its wire representation here. Requests are
handled one at a time on a dedicated thread; the only state shared between
requests lives behind the store handle. */

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{CoursebookError, CoursebookResult};
use crate::http::{
    HttpBody, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpService,
    HttpStatusCode, error_response,
};

/// How long the accept loop blocks before re-checking the shutdown flag.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Handle to a running HTTP server.
///
/// Allows control over the server lifecycle. Dropping the handle signals
/// the accept loop to stop after the current request.
#[derive(Debug)]
pub struct HttpServerHandle {
    port: u16,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl HttpServerHandle {
    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Signal the server to shut down.
    ///
    /// The accept loop exits after the in-flight request (if any) completes.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Check if the server has been signaled to shut down.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Block until the server thread exits.
    pub fn wait(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for HttpServerHandle {
    fn drop(&mut self) {
        // Signal shutdown when the handle is dropped
        self.shutdown();
    }
}

/// Synchronous HTTP server backed by tiny_http.
pub struct HttpServer;

impl HttpServer {
    /// Bind to the configured address and start serving requests on a
    /// dedicated thread. Returns a handle carrying the bound port.
    pub fn start(
        config: &HttpServerConfig,
        service: Arc<dyn HttpService>,
    ) -> CoursebookResult<HttpServerHandle> {
        let address = config.address();
        let server = tiny_http::Server::http(&address).map_err(|e| {
            Box::new(CoursebookError::message(format!(
                "Failed to bind HTTP server to {}: {}",
                address, e
            )))
        })?;

        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .unwrap_or(0);

        info!(port, "HTTP server listening");

        let shutdown = Arc::new(AtomicBool::new(false));
        let loop_shutdown = shutdown.clone();

        let thread = std::thread::spawn(move || {
            while !loop_shutdown.load(Ordering::SeqCst) {
                match server.recv_timeout(RECV_TIMEOUT) {
                    Ok(Some(request)) => handle_connection(request, service.as_ref()),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "Failed to receive HTTP request");
                    }
                }
            }
            debug!("HTTP server loop exited");
        });

        Ok(HttpServerHandle {
            port,
            shutdown,
            thread: Some(thread),
        })
    }
}

/// Translate one tiny_http request, run it through the service and write
/// the response back.
fn handle_connection(mut raw: tiny_http::Request, service: &dyn HttpService) {
    let method_str = raw.method().to_string();
    let path = raw.url().to_string();
    debug!(method = %method_str, path = %path, "Incoming request");

    let Some(method) = HttpMethod::parse(&method_str) else {
        let response = HttpResponse::new(HttpStatusCode::MethodNotAllowed);
        respond(raw, response);
        return;
    };

    let mut headers = HttpHeaders::new();
    for header in raw.headers() {
        headers.insert(header.field.to_string(), header.value.to_string());
    }

    let mut body_bytes = Vec::new();
    if let Err(e) = raw.as_reader().read_to_end(&mut body_bytes) {
        warn!(error = %e, "Failed to read request body");
        let error = CoursebookError::bad_request("could not read request body");
        respond(raw, error_response(&error));
        return;
    }

    let mut request = HttpRequest::new(method, path).with_body(HttpBody::from_bytes(body_bytes));
    for (key, value) in headers.all() {
        request = request.with_header(key.clone(), value.clone());
    }

    let response = match service.handle_request(request) {
        Ok(response) => response,
        Err(error) => {
            if error.is_expected() {
                debug!(error = %error, "Request resolved to an expected error");
            } else {
                warn!(error = %error, "Request failed");
            }
            error_response(&error)
        }
    };

    respond(raw, response);
}

/// Write an HttpResponse back through tiny_http.
fn respond(raw: tiny_http::Request, response: HttpResponse) {
    let status = response.status();
    let mut out = tiny_http::Response::from_data(response.body().as_bytes().to_vec())
        .with_status_code(status.as_u16());

    for (key, value) in response.headers().all() {
        if let Ok(header) = tiny_http::Header::from_bytes(key.as_bytes(), value.as_bytes()) {
            out = out.with_header(header);
        } else {
            warn!(header = %key, "Dropping malformed response header");
        }
    }

    if let Err(e) = raw.respond(out) {
        warn!(error = %e, status = status.as_u16(), "Failed to write response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct EchoService;

    impl HttpService for EchoService {
        fn handle_request(&self, request: HttpRequest) -> CoursebookResult<HttpResponse> {
            Ok(HttpResponse::json(format!(
                "{{\"path\":\"{}\"}}",
                request.path()
            )))
        }
    }

    #[test]
    fn test_server_start_and_shutdown() {
        let config = HttpServerConfig::default(); // OS-assigned port
        let handle = HttpServer::start(&config, Arc::new(EchoService)).unwrap();

        assert_ne!(handle.port(), 0);
        assert!(!handle.is_shutdown());

        handle.shutdown();
        assert!(handle.is_shutdown());
        handle.wait();
    }

    #[test]
    fn test_server_serves_request() {
        let config = HttpServerConfig::default();
        let handle = HttpServer::start(&config, Arc::new(EchoService)).unwrap();
        let port = handle.port();

        // Plain TcpStream request to avoid a client dependency
        use std::io::{Read, Write};
        let mut stream = std::net::TcpStream::connect(("127.0.0.1", port)).unwrap();
        write!(
            stream,
            "GET /ping HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n"
        )
        .unwrap();

        let mut raw = String::new();
        stream.read_to_string(&mut raw).unwrap();
        assert!(raw.starts_with("HTTP/1.1 200"));
        assert!(raw.contains("{\"path\":\"/ping\"}"));

        handle.shutdown();
        handle.wait();
    }

    #[derive(Debug)]
    struct FailingService;

    impl HttpService for FailingService {
        fn handle_request(&self, _request: HttpRequest) -> CoursebookResult<HttpResponse> {
            Err(Box::new(CoursebookError::not_found("course", "missing")))
        }
    }

    #[test]
    fn test_server_maps_errors_to_responses() {
        let config = HttpServerConfig::default();
        let handle = HttpServer::start(&config, Arc::new(FailingService)).unwrap();
        let port = handle.port();

        use std::io::{Read, Write};
        let mut stream = std::net::TcpStream::connect(("127.0.0.1", port)).unwrap();
        write!(
            stream,
            "GET /course/missing HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n"
        )
        .unwrap();

        let mut raw = String::new();
        stream.read_to_string(&mut raw).unwrap();
        assert!(raw.starts_with("HTTP/1.1 404"));

        handle.shutdown();
        handle.wait();
    }
}
