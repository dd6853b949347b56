//! Blocking HTTP front end on `tiny_http`.
//!
//! [`HttpServer::run`] blocks on `recv()`, so async callers run it inside
//! `spawn_blocking`. Each accepted request is dispatched on its own scoped
//! thread. A [`ShutdownHandle`] stops the loop from another thread; in-flight
//! requests finish before `run` returns.

use desk_core::{AppError, envelope::CONTENT_TYPE};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::app::{App, MALFORMED_BODY_CODE};

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Error code for bodies over [`MAX_BODY_BYTES`].
pub const BODY_TOO_LARGE_CODE: i64 = 400_002;
use crate::error::ServeError;
use crate::request::RawRequest;

/// Serves an [`App`] over HTTP/1.1.
pub struct HttpServer {
    server: Arc<tiny_http::Server>,
    app: Arc<App>,
    stopped: Arc<AtomicBool>,
}

/// Stops a running [`HttpServer`].
#[derive(Clone)]
pub struct ShutdownHandle {
    server: Arc<tiny_http::Server>,
    stopped: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.server.unblock();
    }
}

impl HttpServer {
    /// Bind to `addr`. Port `0` picks a free port.
    ///
    /// # Errors
    ///
    /// Returns `ServeError::Bind` if the socket cannot be opened.
    pub fn bind(addr: SocketAddr, app: Arc<App>) -> Result<Self, ServeError> {
        let server = tiny_http::Server::http(addr).map_err(|e| ServeError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            server: Arc::new(server),
            app,
            stopped: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The bound address, with the real port when bound to port `0`.
    ///
    /// # Errors
    ///
    /// Returns `ServeError::NoAddress` for non-IP listeners.
    pub fn local_addr(&self) -> Result<SocketAddr, ServeError> {
        self.server.server_addr().to_ip().ok_or(ServeError::NoAddress)
    }

    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server: Arc::clone(&self.server),
            stopped: Arc::clone(&self.stopped),
        }
    }

    /// Serve requests until [`ShutdownHandle::shutdown`] is called.
    pub fn run(&self) {
        std::thread::scope(|scope| {
            loop {
                match self.server.recv() {
                    Ok(request) => {
                        scope.spawn(move || self.serve_one(request));
                    }
                    Err(_) if self.stopped.load(Ordering::SeqCst) => break,
                    Err(error) => tracing::warn!(%error, "server: failed to accept request"),
                }
            }
        });
        tracing::info!("server: stopped");
    }

    fn serve_one(&self, mut request: tiny_http::Request) {
        let raw = RawRequest::from_tiny(&request);
        let method = raw.method.clone();
        let url = raw.url.clone();

        let response = match read_body(request.as_reader(), MAX_BODY_BYTES) {
            Ok(body) => self.app.dispatch_raw(raw, &body),
            Err(failure) => self.app.pipeline().handle(failure.into(), &raw),
        };

        let status = response.status.as_u16();
        tracing::info!(%method, %url, status, "request");

        let mut reply = tiny_http::Response::from_data(response.to_bytes()).with_status_code(status);
        if let Ok(header) = tiny_http::Header::from_bytes("Content-Type", CONTENT_TYPE) {
            reply = reply.with_header(header);
        }
        if let Err(error) = request.respond(reply) {
            tracing::warn!(%error, %method, %url, "server: failed to write response");
        }
    }
}

/// Read at most `limit` bytes of UTF-8 body.
fn read_body(reader: &mut dyn Read, limit: u64) -> Result<String, AppError> {
    let mut body = String::new();
    reader
        .take(limit + 1)
        .read_to_string(&mut body)
        .map_err(|error| {
            AppError::bad_request()
                .with_code(MALFORMED_BODY_CODE)
                .with_message("Unreadable request body")
                .with_cause(error)
        })?;

    if body.len() as u64 > limit {
        return Err(AppError::bad_request()
            .with_code(BODY_TOO_LARGE_CODE)
            .with_message("Request body too large")
            .with_err_data(serde_json::json!({ "limit": limit })));
    }
    Ok(body)
}
