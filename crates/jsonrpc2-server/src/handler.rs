use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

use crate::context::RequestContext;
use crate::error::ErrorObject;
use crate::request::Params;

/// Result type for method handlers
pub type HandlerResult = Result<Box<RawValue>, ErrorObject>;

/// Business logic behind one method name.
///
/// Errors are returned verbatim to the caller, so a handler picks its own
/// code, message and data. Cancellation and deadlines arrive through `ctx`.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn call(&self, ctx: RequestContext, params: Params) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> MethodHandler for F
where
    F: Fn(RequestContext, Params) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, ctx: RequestContext, params: Params) -> HandlerResult {
        (self)(ctx, params).await
    }
}

/// Serialize a handler result into the opaque payload form.
pub fn to_result<T: Serialize + ?Sized>(value: &T) -> HandlerResult {
    serde_json::value::to_raw_value(value)
        .map_err(|e| ErrorObject::internal_error(Some(format!("Failed to encode result: {}", e))))
}

/// Handler over typed params and a typed result. See [`typed`].
pub struct TypedHandler<F, P, R> {
    f: F,
    _marker: PhantomData<fn(P) -> R>,
}

/// Wrap a closure taking decoded params.
///
/// Params that do not decode into `P` are answered with `InvalidParams`
/// without calling `f`.
pub fn typed<F, Fut, P, R>(f: F) -> TypedHandler<F, P, R>
where
    F: Fn(RequestContext, P) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, ErrorObject>> + Send + 'static,
    P: DeserializeOwned + Send + 'static,
    R: Serialize + 'static,
{
    TypedHandler {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, P, R> MethodHandler for TypedHandler<F, P, R>
where
    F: Fn(RequestContext, P) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, ErrorObject>> + Send + 'static,
    P: DeserializeOwned + Send + 'static,
    R: Serialize + 'static,
{
    async fn call(&self, ctx: RequestContext, params: Params) -> HandlerResult {
        let params: P = params.parse()?;
        let result = (self.f)(ctx, params).await?;
        to_result(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct AddParams {
        a: i64,
        b: i64,
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let handler = |_ctx: RequestContext, params: Params| async move {
            to_result(&json!({"echo": params.get()}))
        };

        let params = Params::from_value(&json!([1])).unwrap();
        let result = handler.call(RequestContext::new(), params).await.unwrap();
        assert_eq!(result.get(), r#"{"echo":"[1]"}"#);
    }

    #[tokio::test]
    async fn test_typed_handler() {
        let handler = typed(|_ctx: RequestContext, p: AddParams| async move {
            Ok::<_, ErrorObject>(p.a + p.b)
        });

        let params = Params::from_value(&json!({"a": 2, "b": 3})).unwrap();
        let result = handler.call(RequestContext::new(), params).await.unwrap();
        assert_eq!(result.get(), "5");
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_bad_params() {
        let handler = typed(|_ctx: RequestContext, p: AddParams| async move {
            Ok::<_, ErrorObject>(p.a + p.b)
        });

        let params = Params::from_value(&json!({"a": "two"})).unwrap();
        let err = handler
            .call(RequestContext::new(), params)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidParams);
    }
}
