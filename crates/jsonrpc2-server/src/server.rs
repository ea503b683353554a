//! The server: registry, dispatcher and configuration behind the two
//! stream-based entry points.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::batch::run_batch;
use crate::codec::{self, BatchDecodePolicy};
use crate::context::RequestContext;
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::dispatch::Dispatcher;
use crate::error::{CodecError, ErrorCode, ErrorObject};
use crate::handler::MethodHandler;
use crate::registry::MethodRegistry;
use crate::response::Response;
use crate::types::RequestId;

/// Which request ids mark a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotificationPolicy {
    /// A missing id or `"id": null`.
    #[default]
    AbsentOrNull,
    /// Only a missing id; `"id": null` still gets a response.
    AbsentOnly,
}

impl NotificationPolicy {
    pub fn is_notification(&self, id: &RequestId) -> bool {
        match self {
            NotificationPolicy::AbsentOrNull => id.is_absent() || id.is_null(),
            NotificationPolicy::AbsentOnly => id.is_absent(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Write nothing for notifications
    pub ignore_notifications: bool,
    /// What counts as a notification
    pub notification_policy: NotificationPolicy,
    /// Handling of malformed batch elements
    pub batch_decode: BatchDecodePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ignore_notifications: true,
            notification_policy: NotificationPolicy::AbsentOrNull,
            batch_decode: BatchDecodePolicy::WholeBatch,
        }
    }
}

impl ServerConfig {
    /// Whether the response for `id` is dropped instead of written.
    pub fn suppresses(&self, id: &RequestId) -> bool {
        self.ignore_notifications && self.notification_policy.is_notification(id)
    }
}

/// Builder for [`Server`]
pub struct ServerBuilder {
    config: ServerConfig,
    registry: MethodRegistry,
    sink: Arc<dyn DiagnosticSink>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            registry: MethodRegistry::new(),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn ignore_notifications(mut self, ignore: bool) -> Self {
        self.config.ignore_notifications = ignore;
        self
    }

    pub fn notification_policy(mut self, policy: NotificationPolicy) -> Self {
        self.config.notification_policy = policy;
        self
    }

    pub fn batch_decode(mut self, policy: BatchDecodePolicy) -> Self {
        self.config.batch_decode = policy;
        self
    }

    pub fn diagnostic_sink<S>(mut self, sink: S) -> Self
    where
        S: DiagnosticSink + 'static,
    {
        self.sink = Arc::new(sink);
        self
    }

    pub fn method<H>(self, method: impl Into<String>, handler: H) -> Self
    where
        H: MethodHandler + 'static,
    {
        self.registry.register(method, handler);
        self
    }

    pub fn build(self) -> Server {
        Server {
            dispatcher: Dispatcher::new(Arc::new(self.registry), self.sink),
            config: self.config,
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON-RPC 2.0 server.
///
/// All entry points take `&self`; share it behind an `Arc` to serve several
/// callers at once.
#[derive(Debug)]
pub struct Server {
    dispatcher: Dispatcher,
    config: ServerConfig,
}

impl Server {
    /// A server with default configuration and no methods.
    pub fn new() -> Self {
        ServerBuilder::new().build()
    }

    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &MethodRegistry {
        self.dispatcher.registry()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Install or replace the handler for `method`. Safe while serving.
    pub fn register<H>(&self, method: impl Into<String>, handler: H)
    where
        H: MethodHandler + 'static,
    {
        self.dispatcher.registry().register(method, handler);
    }

    /// Read one request object from `reader` and write at most one response
    /// to `writer`.
    pub async fn single_request<R, W>(&self, ctx: &RequestContext, reader: &mut R, writer: &mut W)
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        match codec::read_value(reader).await {
            Ok(bytes) => self.single_from_bytes(ctx, &bytes, writer).await,
            Err(error) => self.reject_input(error, RequestId::Absent, writer).await,
        }
    }

    /// Read an array of request objects from `reader`, dispatch them
    /// concurrently and write the ordered array of responses to `writer`.
    pub async fn batch_request<R, W>(&self, ctx: &RequestContext, reader: &mut R, writer: &mut W)
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        match codec::read_value(reader).await {
            Ok(bytes) => self.batch_from_bytes(ctx, &bytes, writer).await,
            Err(error) => self.reject_input(error, RequestId::Absent, writer).await,
        }
    }

    /// Route to [`batch_request`](Self::batch_request) when the input is a
    /// JSON array, otherwise to [`single_request`](Self::single_request).
    pub async fn handle<R, W>(&self, ctx: &RequestContext, reader: &mut R, writer: &mut W)
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let bytes = match codec::read_value(reader).await {
            Ok(bytes) => bytes,
            Err(error) => return self.reject_input(error, RequestId::Absent, writer).await,
        };
        if codec::looks_like_batch(&bytes) {
            self.batch_from_bytes(ctx, &bytes, writer).await
        } else {
            self.single_from_bytes(ctx, &bytes, writer).await
        }
    }

    async fn single_from_bytes<W>(&self, ctx: &RequestContext, bytes: &[u8], writer: &mut W)
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let request = match codec::decode_request(bytes) {
            Ok(request) => request,
            Err(error) => {
                let id = match error.error_code() {
                    ErrorCode::InvalidRequest => codec::recover_id(bytes),
                    _ => RequestId::Absent,
                };
                return self.reject_input(error, id, writer).await;
            }
        };

        let suppress = self.config.suppresses(&request.id);
        let response = self.dispatcher.dispatch(ctx.clone(), request).await;
        if suppress {
            debug!(id = %response.id, "Notification handled, no response written");
            return;
        }

        if let Err(error) = codec::write_envelope(writer, &response).await {
            self.dispatcher
                .sink()
                .report(Diagnostic::EncodeFailed { error: &error });
            self.write_fallback(writer).await;
        }
    }

    async fn batch_from_bytes<W>(&self, ctx: &RequestContext, bytes: &[u8], writer: &mut W)
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let items = match codec::decode_batch(bytes, self.config.batch_decode) {
            Ok(items) => items,
            Err(error) => return self.reject_input(error, RequestId::Absent, writer).await,
        };

        let config = self.config;
        let responses = run_batch(&self.dispatcher, ctx, items, |id| config.suppresses(id)).await;
        if responses.is_empty() {
            debug!("Batch contained only notifications, no response written");
            return;
        }

        // no fallback here: part of the array may already be on the wire
        if let Err(error) = codec::write_envelope(writer, &responses).await {
            self.dispatcher
                .sink()
                .report(Diagnostic::EncodeFailed { error: &error });
        }
    }

    /// Report a decode failure and answer it with a standalone envelope.
    async fn reject_input<W>(&self, error: CodecError, id: RequestId, writer: &mut W)
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.dispatcher
            .sink()
            .report(Diagnostic::DecodeFailed { error: &error });

        let response = Response::error(id, ErrorObject::from(error.error_code()));
        if let Err(error) = codec::write_envelope(writer, &response).await {
            self.dispatcher
                .sink()
                .report(Diagnostic::EncodeFailed { error: &error });
        }
    }

    async fn write_fallback<W>(&self, writer: &mut W)
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if let Err(error) = codec::write_error(ErrorCode::InternalError, writer).await {
            self.dispatcher
                .sink()
                .report(Diagnostic::EncodeFailed { error: &error });
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}
