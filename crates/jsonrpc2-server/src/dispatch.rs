use std::sync::Arc;

use tracing::debug;

use crate::context::RequestContext;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::ErrorObject;
use crate::registry::MethodRegistry;
use crate::request::Request;
use crate::response::Response;

/// Resolves one request to one response.
///
/// Cheap to clone; batch tasks each take their own copy.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Dispatcher {
    pub fn new(registry: Arc<MethodRegistry>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { registry, sink }
    }

    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }

    pub(crate) fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    /// Look up `request.method` and run its handler. The response always
    /// carries the request's id unchanged; notification suppression is the
    /// caller's business.
    pub async fn dispatch(&self, ctx: RequestContext, request: Request) -> Response {
        let Request {
            method, params, id, ..
        } = request;

        let Some(handler) = self.registry.lookup(&method) else {
            debug!(method = %method, id = %id, "Method not found");
            return Response::error(id, ErrorObject::method_not_found(&method));
        };

        debug!(method = %method, id = %id, "Dispatching request");
        match handler.call(ctx, params).await {
            Ok(result) => Response::success(id, result),
            Err(error) => {
                self.sink.report(Diagnostic::HandlerError {
                    method: &method,
                    id: &id,
                    error: &error,
                });
                Response::error(id, error)
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NoopSink;
    use crate::error::ErrorCode;
    use crate::handler::{HandlerResult, to_result};
    use crate::request::Params;
    use crate::types::RequestId;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl DiagnosticSink for RecordingSink {
        fn report(&self, diagnostic: Diagnostic<'_>) {
            self.events.lock().push(diagnostic.to_string());
        }
    }

    fn dispatcher_with(sink: Arc<dyn DiagnosticSink>) -> Dispatcher {
        let registry = Arc::new(MethodRegistry::new());
        registry.register("echo", |_ctx: RequestContext, params: Params| async move {
            match params.as_raw() {
                Some(raw) => Ok(raw.to_owned()),
                None => to_result(&()),
            }
        });
        registry.register("fail", |_ctx: RequestContext, _params: Params| async move {
            HandlerResult::Err(
                ErrorObject::application(42, "nope", Some(json!({"why": "testing"}))).unwrap(),
            )
        });
        Dispatcher::new(registry, sink)
    }

    #[tokio::test]
    async fn test_dispatch_success_echoes_id() {
        let dispatcher = dispatcher_with(Arc::new(NoopSink));
        let params = Params::from_value(&json!({"x": 1})).unwrap();

        let response = dispatcher
            .dispatch(RequestContext::new(), Request::new("a".into(), "echo", params))
            .await;

        assert_eq!(response.id, RequestId::from("a"));
        assert_eq!(response.result().map(|r| r.get()), Some(r#"{"x":1}"#));
        assert!(response.error_object().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_method_not_found() {
        let dispatcher = dispatcher_with(Arc::new(NoopSink));

        let response = dispatcher
            .dispatch(
                RequestContext::new(),
                Request::new(RequestId::from(9), "missing", Params::none()),
            )
            .await;

        assert_eq!(response.id, RequestId::from(9));
        assert_eq!(
            response.error_object().map(|e| e.error_code()),
            Some(ErrorCode::MethodNotFound)
        );
    }

    #[tokio::test]
    async fn test_handler_error_is_passed_through_and_reported() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher_with(sink.clone());

        let response = dispatcher
            .dispatch(
                RequestContext::new(),
                Request::new(RequestId::Null, "fail", Params::none()),
            )
            .await;

        let error = response.error_object().expect("error response");
        assert_eq!(error.code, 42);
        assert_eq!(error.message, "nope");
        assert_eq!(error.data, Some(json!({"why": "testing"})));
        assert_eq!(response.id, RequestId::Null);

        let events = sink.events.lock();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains("'fail'"));
    }

    #[tokio::test]
    async fn test_context_reaches_handler() {
        let registry = Arc::new(MethodRegistry::new());
        registry.register("cancelled?", |ctx: RequestContext, _params: Params| async move {
            to_result(&ctx.is_cancelled())
        });
        let dispatcher = Dispatcher::new(registry, Arc::new(NoopSink));

        let ctx = RequestContext::new();
        ctx.cancel();
        let response = dispatcher
            .dispatch(ctx, Request::new(RequestId::from(1), "cancelled?", Params::none()))
            .await;

        assert_eq!(response.result().map(|r| r.get()), Some("true"));
    }
}
