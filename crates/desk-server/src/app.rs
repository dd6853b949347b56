//! Routing and request dispatch.
//!
//! Handlers return [`Reply`]: plain data that the envelope wraps, or an
//! already rendered [`ApiResponse`] that is sent as-is. Every `Err` goes
//! through the [`ExceptionPipeline`].

use desk_core::{ApiResponse, AppError};
use serde_json::Value;

use crate::pipeline::ExceptionPipeline;
use crate::request::{ApiRequest, RawRequest};

/// Error code for request bodies that are not valid JSON.
pub const MALFORMED_BODY_CODE: i64 = 400_001;

/// Error code for a known path requested with the wrong method.
pub const METHOD_NOT_ALLOWED_CODE: i64 = 400_005;

/// Successful handler output.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Data to be wrapped by the envelope with `200 OK`.
    Data(Value),
    /// A response rendered by the handler itself.
    Rendered(ApiResponse),
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<ApiResponse> for Reply {
    fn from(response: ApiResponse) -> Self {
        Self::Rendered(response)
    }
}

impl Reply {
    #[must_use]
    pub fn into_response(self) -> ApiResponse {
        match self {
            Self::Data(value) => ApiResponse::ok(value),
            Self::Rendered(response) => response,
        }
    }
}

/// A request handler.
pub trait Handler: Send + Sync {
    /// # Errors
    ///
    /// Any error; the pipeline classifies it.
    fn call(&self, request: &ApiRequest) -> anyhow::Result<Reply>;
}

impl<F> Handler for F
where
    F: Fn(&ApiRequest) -> anyhow::Result<Reply> + Send + Sync,
{
    fn call(&self, request: &ApiRequest) -> anyhow::Result<Reply> {
        self(request)
    }
}

struct Route {
    method: String,
    path: String,
    handler: Box<dyn Handler>,
}

/// Exact-path router.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route<F>(mut self, method: &str, path: &str, handler: F) -> Self
    where
        F: Fn(&ApiRequest) -> anyhow::Result<Reply> + Send + Sync + 'static,
    {
        self.routes.push(Route {
            method: method.to_ascii_uppercase(),
            path: normalize(path).to_string(),
            handler: Box::new(handler),
        });
        self
    }

    /// Find the handler for `method` and `path`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown path, `BadRequest` for a known path with
    /// another method.
    pub fn resolve(&self, method: &str, path: &str) -> Result<&dyn Handler, AppError> {
        let path = normalize(path);
        let mut path_known = false;
        for route in self.routes.iter().filter(|r| r.path == path) {
            path_known = true;
            if route.method.eq_ignore_ascii_case(method) {
                return Ok(route.handler.as_ref());
            }
        }

        if path_known {
            Err(AppError::bad_request()
                .with_code(METHOD_NOT_ALLOWED_CODE)
                .with_message(format!("Method {method} not allowed")))
        } else {
            Err(AppError::not_found()
                .with_message("Resource not found")
                .with_err_data(serde_json::json!({ "path": path })))
        }
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Router plus exception pipeline.
pub struct App {
    router: Router,
    pipeline: ExceptionPipeline,
}

impl App {
    #[must_use]
    pub const fn new(router: Router, pipeline: ExceptionPipeline) -> Self {
        Self { router, pipeline }
    }

    #[must_use]
    pub const fn pipeline(&self) -> &ExceptionPipeline {
        &self.pipeline
    }

    /// Parse the body of `raw` and dispatch it.
    pub fn dispatch_raw(&self, raw: RawRequest, body: &str) -> ApiResponse {
        match parse_body(body) {
            Ok(parsed) => {
                let mut request = ApiRequest::new(raw);
                request.body = parsed;
                self.dispatch(&request)
            }
            Err(error) => self.pipeline.handle(error.into(), &raw),
        }
    }

    /// Run the matching handler and render its outcome.
    pub fn dispatch(&self, request: &ApiRequest) -> ApiResponse {
        let outcome = self
            .router
            .resolve(&request.raw.method, request.raw.path_only())
            .map_err(anyhow::Error::from)
            .and_then(|handler| handler.call(request));

        match outcome {
            Ok(reply) => reply.into_response(),
            Err(error) => self.pipeline.handle(error, request),
        }
    }
}

fn parse_body(body: &str) -> Result<Option<Value>, AppError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body).map(Some).map_err(|e| {
        AppError::bad_request()
            .with_code(MALFORMED_BODY_CODE)
            .with_message("Malformed JSON body")
            .with_cause(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn app() -> App {
        let router = Router::new()
            .route("GET", "/health", |_| Ok(json!({"status": "ok"}).into()))
            .route("POST", "/echo", |req| {
                Ok(req.body.clone().unwrap_or(Value::Null).into())
            })
            .route("GET", "/greeting", |_| Ok(json!("hello").into()))
            .route("GET", "/created", |_| {
                Ok(ApiResponse::new(json!({"id": 1}), StatusCode::CREATED).into())
            })
            .route("GET", "/fail", |_| Err(anyhow::anyhow!("database is locked")))
            .route("GET", "/deny", |_| {
                Err(AppError::forbidden().with_code(403_004).into())
            });
        App::new(router, ExceptionPipeline::new(false))
    }

    fn get(path: &str) -> ApiResponse {
        app().dispatch_raw(RawRequest::new("GET", path), "")
    }

    #[test]
    fn data_is_enveloped() {
        let response = get("/health");
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body,
            json!({"success": true, "message": "Success", "data": {"status": "ok"}})
        );
    }

    #[test]
    fn text_becomes_message() {
        assert_eq!(
            get("/greeting").body,
            json!({"success": true, "message": "hello"})
        );
    }

    #[test]
    fn rendered_responses_pass_through() {
        let response = get("/created");
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["data"], json!({"id": 1}));
    }

    #[test]
    fn trailing_slash_and_query_are_ignored() {
        assert_eq!(get("/health/?verbose=1").status, StatusCode::OK);
    }

    #[test]
    fn unknown_path_is_not_found() {
        let response = get("/nowhere");
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["message"], "Resource not found");
    }

    #[test]
    fn wrong_method_is_bad_request() {
        let response = app().dispatch_raw(RawRequest::new("DELETE", "/health"), "");
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["info"]["error_code"], METHOD_NOT_ALLOWED_CODE);
    }

    #[test]
    fn handler_errors_go_through_pipeline() {
        let response = get("/fail");
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body["info"]["error_code"], 500_005);

        let response = get("/deny");
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body["info"]["error_code"], 403_004);
    }

    #[test]
    fn json_body_reaches_handler() {
        let response =
            app().dispatch_raw(RawRequest::new("POST", "/echo"), r#"{"message": "hi", "x": 1}"#);
        assert_eq!(response.body, json!({"success": true, "message": "hi", "x": 1}));
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let response = app().dispatch_raw(RawRequest::new("POST", "/echo"), "{not json");
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["message"], "Malformed JSON body");
        assert_eq!(response.body["info"]["error_code"], MALFORMED_BODY_CODE);
    }
}
