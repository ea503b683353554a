//! # JSON-RPC Server Prelude
//!
//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use jsonrpc2_server::prelude::*;
//! ```

pub use crate::codec::{BatchDecodePolicy, write_error};
pub use crate::context::{CancellationHandle, RequestContext};
pub use crate::diagnostics::{DiagnosticSink, NoopSink, TracingSink};
pub use crate::error::{ErrorCode, ErrorObject};
pub use crate::handler::{HandlerResult, MethodHandler, to_result, typed};
pub use crate::request::{Params, Request};
pub use crate::response::Response;
pub use crate::server::{NotificationPolicy, Server, ServerBuilder, ServerConfig};
pub use crate::types::RequestId;

// Standard error codes
pub use crate::error_codes::*;
