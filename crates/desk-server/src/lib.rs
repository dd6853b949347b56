//! # desk-server
//!
//! The HTTP edge of taskdesk: request adapters, routing, the exception
//! pipeline that turns every handler failure into an enveloped response, and
//! a small `tiny_http` server.
//!
//! ```no_run
//! use desk_server::{App, ExceptionPipeline, HttpServer, Router};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let router = Router::new().route("GET", "/health", |_| Ok(json!({"status": "ok"}).into()));
//! let app = Arc::new(App::new(router, ExceptionPipeline::new(false)));
//! let server = HttpServer::bind("127.0.0.1:8000".parse().unwrap(), app).unwrap();
//! server.run();
//! ```

pub mod app;
pub mod config_warnings;
pub mod pipeline;
pub mod request;
pub mod server;

mod error;

pub use app::{App, Handler, Reply, Router};
pub use error::ServeError;
pub use pipeline::{ExceptionPipeline, HandlerMode};
pub use request::{ApiRequest, RawRequest};
pub use server::{HttpServer, ShutdownHandle};
