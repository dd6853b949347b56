//! End-to-end error handling through the pipeline with a recording tracker.

use desk_core::{AppError, ErrorKind, Notify, RequestSource, UNHANDLED_ERROR_CODE};
use desk_notify::{MemoryTransport, Notifier};
use desk_server::{ApiRequest, ExceptionPipeline, HandlerMode, RawRequest};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

fn tracked(debug: bool) -> (ExceptionPipeline, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    let notifier: Arc<dyn Notify> = Arc::new(Notifier::new("test", "taskdesk", transport.clone()));
    let pipeline = ExceptionPipeline::new(debug)
        .with_mode(HandlerMode::DebugNative)
        .with_notifier(Some(notifier));
    (pipeline, transport)
}

fn request() -> ApiRequest {
    ApiRequest::new(
        RawRequest::new("PUT", "/user/tasks/7?notify=1").with_header("User-Agent", "TaskApp/2.1"),
    )
    .with_body(json!({"status": "done"}))
}

#[rstest]
#[case(ErrorKind::BadRequest, false)]
#[case(ErrorKind::Unauthorized, false)]
#[case(ErrorKind::Forbidden, false)]
#[case(ErrorKind::NotFound, false)]
#[case(ErrorKind::Conflict, false)]
#[case(ErrorKind::ServerError, true)]
fn taxonomy_errors_pass_through(#[case] kind: ErrorKind, #[case] reported: bool) {
    let (pipeline, transport) = tracked(false);
    let response = pipeline.handle(AppError::new(kind).into(), &request());

    assert_eq!(response.status, kind.status());
    assert_eq!(response.body["message"], kind.default_message());
    assert_eq!(response.body["success"], false);
    assert_eq!(transport.len(), usize::from(reported));
}

#[test]
fn foreign_failure_in_production() {
    let (pipeline, transport) = tracked(false);
    let response = pipeline.handle(anyhow::anyhow!("index out of range"), &request());

    assert_eq!(response.status.as_u16(), 500);
    assert_eq!(response.body["message"], "Server error");
    assert_eq!(response.body["info"]["error_code"], UNHANDLED_ERROR_CODE);
    assert!(response.body["info"].get("request_data").is_none());

    let reports = transport.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].tags["err_code"], "500005");
    assert_eq!(reports[0].tags["err_message"], "index out of range");
    assert_eq!(reports[0].contexts["device"], json!({"name": "TaskApp/2.1"}));
}

#[test]
fn foreign_failure_in_debug_is_native() {
    let (pipeline, transport) = tracked(true);
    let response = pipeline.handle(anyhow::anyhow!("index out of range"), &request());

    assert_eq!(response.status.as_u16(), 500);
    assert_eq!(response.body["detail"], "index out of range");
    assert!(response.body.get("info").is_none());
    assert!(transport.is_empty());
}

#[test]
fn debug_body_carries_request_snapshot() {
    let (pipeline, _) = tracked(true);
    let err = AppError::conflict()
        .with_code(409_001)
        .with_err_data(json!({"task": 7}));
    let response = pipeline.handle(err.into(), &request());

    let info = &response.body["info"];
    assert_eq!(
        info["request_data"],
        json!({
            "request": {"url": "/user/tasks/7", "method": "PUT"},
            "user": null,
            "request_data": {"status": "done"},
            "param": {"notify": "1"},
            "device": "TaskApp/2.1",
        })
    );
    assert_eq!(info["error_data"], json!({"task": 7}));
}

/// A request with nothing usable in it.
struct Opaque;

impl RequestSource for Opaque {
    fn path(&self) -> Option<String> {
        None
    }

    fn method(&self) -> Option<String> {
        None
    }

    fn query_params(&self) -> Option<BTreeMap<String, String>> {
        None
    }

    fn user_agent(&self) -> Option<String> {
        None
    }
}

#[test]
fn disabled_tracker_ignores_malformed_requests() {
    let pipeline = ExceptionPipeline::new(false);
    let response = pipeline.handle(AppError::server_error().into(), &Opaque);
    assert_eq!(response.status.as_u16(), 500);

    let err = AppError::server_error().with_request(&Opaque);
    err.notify(None);
    assert!(err.is_notified());
}
