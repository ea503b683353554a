//! Diagnostic sink for non-fatal server events.
//!
//! Nothing reported here changes what goes on the wire.

use std::fmt;

use tracing::{error, warn};

use crate::error::{CodecError, ErrorObject};
use crate::types::RequestId;

/// Something the server wants an operator to know about.
#[derive(Debug)]
pub enum Diagnostic<'a> {
    /// Input bytes could not be decoded into request envelope(s).
    DecodeFailed { error: &'a CodecError },
    /// A handler returned an error object.
    HandlerError {
        method: &'a str,
        id: &'a RequestId,
        error: &'a ErrorObject,
    },
    /// A response could not be serialized or written.
    EncodeFailed { error: &'a CodecError },
    /// A batch task panicked or was aborted before producing a response.
    TaskFailed { method: &'a str, reason: String },
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DecodeFailed { error } => write!(f, "Can't read body: {}", error),
            Diagnostic::HandlerError { method, id, error } => {
                write!(f, "Handler error in '{}' (id {}): {}", method, id, error)
            }
            Diagnostic::EncodeFailed { error } => write!(f, "Can't write response: {}", error),
            Diagnostic::TaskFailed { method, reason } => {
                write!(f, "Task for '{}' failed: {}", method, reason)
            }
        }
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic<'_>);
}

impl<S> DiagnosticSink for std::sync::Arc<S>
where
    S: DiagnosticSink + ?Sized,
{
    fn report(&self, diagnostic: Diagnostic<'_>) {
        (**self).report(diagnostic)
    }
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic<'_>) {
        match &diagnostic {
            Diagnostic::DecodeFailed { error } => {
                warn!(code = error.error_code().code(), "{}", diagnostic)
            }
            Diagnostic::HandlerError { method, error, .. } => {
                warn!(method = %method, code = error.code, "{}", diagnostic)
            }
            Diagnostic::EncodeFailed { .. } => error!("{}", diagnostic),
            Diagnostic::TaskFailed { method, .. } => error!(method = %method, "{}", diagnostic),
        }
    }
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn report(&self, _diagnostic: Diagnostic<'_>) {}
}
