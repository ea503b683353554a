//! # JSON-RPC 2.0 Server Core
//!
//! A small, transport-agnostic JSON-RPC 2.0 server. It decodes one request or
//! a batch from a byte stream, dispatches each request to a registered
//! handler by method name and writes the response(s) back.
//!
//! ## Features
//! - Method registry safe to mutate while serving
//! - Concurrent batch execution with responses kept in request order
//! - Configurable notification semantics (absent id, or absent/null id)
//! - Whole-batch or per-element handling of malformed batch entries
//! - `params`/`result` passed through as raw JSON, never reinterpreted
//!
//! ```rust,no_run
//! use jsonrpc2_server::prelude::*;
//!
//! # async fn run() {
//! let server = Server::builder()
//!     .method("ping", |_ctx: RequestContext, _params: Params| async move {
//!         to_result("pong")
//!     })
//!     .build();
//!
//! let mut out = Vec::new();
//! let input = br#"{"jsonrpc":"2.0","method":"ping","id":1}"#;
//! server
//!     .single_request(&RequestContext::new(), &mut &input[..], &mut out)
//!     .await;
//! # }
//! ```

pub mod batch;
pub mod codec;
pub mod context;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod server;
pub mod types;

// Re-export main types
pub use codec::{BatchDecodePolicy, BatchItem, write_error};
pub use context::{CancellationHandle, RequestContext};
pub use diagnostics::{Diagnostic, DiagnosticSink, NoopSink, TracingSink};
pub use dispatch::Dispatcher;
pub use error::{CodecError, ErrorCode, ErrorObject, ReservedCodeError};
pub use handler::{HandlerResult, MethodHandler, to_result, typed};
pub use registry::MethodRegistry;
pub use request::{Params, Request};
pub use response::{Outcome, Response};
pub use server::{NotificationPolicy, Server, ServerBuilder, ServerConfig};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Reserved for the protocol: -32768 to -32000
    pub const RESERVED_START: i64 = -32768;
    pub const RESERVED_END: i64 = -32000;
}
