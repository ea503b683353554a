use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error_codes;

/// JSON-RPC error codes
///
/// The five protocol codes are produced by the server itself. Everything a
/// handler reports travels as `Application` with its caller-chosen code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    Application(i64),
}

impl ErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            ErrorCode::ParseError => error_codes::PARSE_ERROR,
            ErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            ErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            ErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            ErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            ErrorCode::Application(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::Application(_) => "Application error",
        }
    }

    /// Inverse of [`ErrorCode::code`]. Unknown codes map to `Application`.
    pub fn from_code(code: i64) -> Self {
        match code {
            error_codes::PARSE_ERROR => ErrorCode::ParseError,
            error_codes::INVALID_REQUEST => ErrorCode::InvalidRequest,
            error_codes::METHOD_NOT_FOUND => ErrorCode::MethodNotFound,
            error_codes::INVALID_PARAMS => ErrorCode::InvalidParams,
            error_codes::INTERNAL_ERROR => ErrorCode::InternalError,
            other => ErrorCode::Application(other),
        }
    }

    /// True for codes inside `-32768..=-32000`.
    pub fn is_reserved(code: i64) -> bool {
        (error_codes::RESERVED_START..=error_codes::RESERVED_END).contains(&code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Returned when an application error tries to use a protocol-reserved code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("error code {0} is inside the reserved JSON-RPC range -32768..=-32000")]
pub struct ReservedCodeError(pub i64);

/// JSON-RPC Error object
///
/// Protocol errors and application errors share this one shape; an
/// application error is simply an instance with a caller-chosen code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_data"
    )]
    pub data: Option<Value>,
}

// `"data": null` is a value, not a missing member.
fn present_data<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ErrorObject {
    pub fn new(code: ErrorCode, message: Option<String>, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            data,
        }
    }

    /// Build an application error, rejecting codes from the reserved range.
    pub fn application(
        code: i64,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Result<Self, ReservedCodeError> {
        if ErrorCode::is_reserved(code) {
            return Err(ReservedCodeError(code));
        }
        Ok(Self {
            code,
            message: message.into(),
            data,
        })
    }

    pub fn parse_error(data: Option<Value>) -> Self {
        Self::new(ErrorCode::ParseError, None, data)
    }

    pub fn invalid_request(data: Option<Value>) -> Self {
        Self::new(ErrorCode::InvalidRequest, None, data)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            None,
            Some(Value::String(method.to_string())),
        )
    }

    pub fn invalid_params(data: Option<Value>) -> Self {
        Self::new(ErrorCode::InvalidParams, None, data)
    }

    pub fn internal_error(message: Option<String>) -> Self {
        Self::new(ErrorCode::InternalError, message, None)
    }

    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from_code(self.code)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<ErrorCode> for ErrorObject {
    fn from(code: ErrorCode) -> Self {
        Self::new(code, None, None)
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorObject {}

/// Failures while turning bytes into envelopes or envelopes into bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Input is not well-formed JSON (or ended early).
    #[error("JSON parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Well-formed JSON that is not a valid request envelope.
    #[error("Invalid request: {0}")]
    Invalid(#[source] serde_json::Error),

    #[error("Empty batch")]
    EmptyBatch,

    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Sort a serde failure into syntax (`Parse`) or structure (`Invalid`).
    pub fn from_decode(error: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match error.classify() {
            Category::Data => CodecError::Invalid(error),
            Category::Syntax | Category::Eof | Category::Io => CodecError::Parse(error),
        }
    }

    /// The protocol code this failure surfaces as.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CodecError::Parse(_) | CodecError::Io(_) => ErrorCode::ParseError,
            CodecError::Invalid(_) | CodecError::EmptyBatch => ErrorCode::InvalidRequest,
            CodecError::Serialize(_) => ErrorCode::InternalError,
        }
    }
}
