//! Concurrent batch execution.
//!
//! Every request gets its own task and its own output slot, indexed by its
//! position in the batch. Tasks never share a collection; the slots are read
//! back in order after all of them have finished, and only then are
//! suppressed notifications filtered out.

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::codec::BatchItem;
use crate::context::RequestContext;
use crate::diagnostics::Diagnostic;
use crate::dispatch::Dispatcher;
use crate::error::ErrorObject;
use crate::response::Response;
use crate::types::RequestId;

enum Slot {
    /// Answered during decoding.
    Ready(Response),
    Running {
        task: JoinHandle<Response>,
        method: String,
        id: RequestId,
    },
}

/// Dispatch `items` concurrently and return the responses in input order,
/// leaving out every request for which `suppress(id)` holds.
///
/// All tasks are spawned before any is awaited. A task that panics yields an
/// `InternalError` response in its slot; its siblings are unaffected.
pub async fn run_batch<S>(
    dispatcher: &Dispatcher,
    ctx: &RequestContext,
    items: Vec<BatchItem>,
    suppress: S,
) -> Vec<Response>
where
    S: Fn(&RequestId) -> bool,
{
    let mut suppressed = Vec::with_capacity(items.len());
    let slots: Vec<Slot> = items
        .into_iter()
        .map(|item| match item {
            BatchItem::Invalid(response) => {
                suppressed.push(false);
                Slot::Ready(response)
            }
            BatchItem::Request(request) => {
                suppressed.push(suppress(&request.id));
                let method = request.method.clone();
                let id = request.id.clone();
                let dispatcher = dispatcher.clone();
                let ctx = ctx.clone();
                let task = tokio::spawn(async move { dispatcher.dispatch(ctx, request).await });
                Slot::Running { task, method, id }
            }
        })
        .collect();

    debug!(size = slots.len(), "Batch dispatched");

    // join barrier: slot i resolves to the response for item i
    let responses = join_all(slots.into_iter().map(|slot| async move {
        match slot {
            Slot::Ready(response) => response,
            Slot::Running { task, method, id } => match task.await {
                Ok(response) => response,
                Err(join_error) => {
                    dispatcher.sink().report(Diagnostic::TaskFailed {
                        method: &method,
                        reason: join_error.to_string(),
                    });
                    Response::error(
                        id,
                        ErrorObject::internal_error(Some(format!(
                            "Handler for '{}' did not complete",
                            method
                        ))),
                    )
                }
            },
        }
    }))
    .await;

    responses
        .into_iter()
        .zip(suppressed)
        .filter_map(|(response, suppressed)| (!suppressed).then_some(response))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NoopSink;
    use crate::error::ErrorCode;
    use crate::handler::{HandlerResult, to_result};
    use crate::registry::MethodRegistry;
    use crate::request::{Params, Request};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn request(id: RequestId, method: &str) -> BatchItem {
        BatchItem::Request(Request::new(id, method, Params::none()))
    }

    fn ids(responses: &[Response]) -> Vec<RequestId> {
        responses.iter().map(|r| r.id.clone()).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_order_follows_input_not_completion() {
        let registry = Arc::new(MethodRegistry::new());
        for (name, delay) in [("slow", 60), ("medium", 30), ("fast", 1)] {
            registry.register(name, move |_ctx: RequestContext, _params: Params| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                to_result(name)
            });
        }
        let dispatcher = Dispatcher::new(registry, Arc::new(NoopSink));

        let items = vec![
            request("a".into(), "slow"),
            request("b".into(), "medium"),
            request("c".into(), "fast"),
        ];
        let responses = run_batch(&dispatcher, &RequestContext::new(), items, |_| false).await;

        let expected: Vec<RequestId> = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(ids(&responses), expected);
        assert_eq!(responses[0].result().map(|r| r.get()), Some(r#""slow""#));
    }

    #[tokio::test]
    async fn test_suppressed_items_still_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(MethodRegistry::new());
        let counter = calls.clone();
        registry.register("count", move |_ctx: RequestContext, _params: Params| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                to_result(&())
            }
        });
        let dispatcher = Dispatcher::new(registry, Arc::new(NoopSink));

        let items = vec![
            request(RequestId::from(1), "count"),
            request(RequestId::Absent, "count"),
            request(RequestId::from(3), "count"),
        ];
        let responses = run_batch(&dispatcher, &RequestContext::new(), items, |id| {
            id.is_absent()
        })
        .await;

        assert_eq!(ids(&responses), vec![RequestId::from(1), RequestId::from(3)]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_panicking_handler_only_fails_its_slot() {
        let registry = Arc::new(MethodRegistry::new());
        registry.register("panic", |_ctx: RequestContext, _params: Params| async move {
            if true {
                panic!("handler blew up");
            }
            HandlerResult::Ok(serde_json::value::to_raw_value(&0).unwrap())
        });
        registry.register("ok", |_ctx: RequestContext, _params: Params| async move {
            to_result("fine")
        });
        let dispatcher = Dispatcher::new(registry, Arc::new(NoopSink));

        let items = vec![
            request(RequestId::from(1), "panic"),
            request(RequestId::from(2), "ok"),
            BatchItem::Invalid(Response::error(
                RequestId::Null,
                ErrorObject::invalid_request(None),
            )),
        ];
        let responses = run_batch(&dispatcher, &RequestContext::new(), items, |_| false).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(
            responses[0].error_object().map(|e| e.error_code()),
            Some(ErrorCode::InternalError)
        );
        assert_eq!(responses[0].id, RequestId::from(1));
        assert!(!responses[1].is_error());
        assert_eq!(
            responses[2].error_object().map(|e| e.error_code()),
            Some(ErrorCode::InvalidRequest)
        );
    }
}
