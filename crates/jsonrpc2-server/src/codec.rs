//! Envelope codec: bytes to requests, responses to bytes.

use serde::Serialize;
use serde::de::IgnoredAny;
use serde_json::value::RawValue;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{CodecError, ErrorCode, ErrorObject};
use crate::request::{IdProbe, Request};
use crate::response::Response;
use crate::types::RequestId;

/// How a batch reacts to an element that is not a valid request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchDecodePolicy {
    /// Any bad element fails the whole batch with a single `ParseError`.
    #[default]
    WholeBatch,
    /// Every element is decoded on its own; a bad one becomes an
    /// `InvalidRequest` response in its own position.
    PerItem,
}

/// One decoded batch element.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem {
    Request(Request),
    /// Element that failed to decode, already answered.
    Invalid(Response),
}

pub fn decode_request(bytes: &[u8]) -> Result<Request, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::from_decode)
}

pub fn decode_batch(bytes: &[u8], policy: BatchDecodePolicy) -> Result<Vec<BatchItem>, CodecError> {
    let items = match policy {
        BatchDecodePolicy::WholeBatch => serde_json::from_slice::<Vec<Request>>(bytes)
            .map_err(CodecError::Parse)?
            .into_iter()
            .map(BatchItem::Request)
            .collect::<Vec<_>>(),
        BatchDecodePolicy::PerItem => serde_json::from_slice::<Vec<Box<RawValue>>>(bytes)
            .map_err(CodecError::from_decode)?
            .iter()
            .map(|raw| decode_item(raw))
            .collect(),
    };
    if items.is_empty() {
        return Err(CodecError::EmptyBatch);
    }
    Ok(items)
}

fn decode_item(raw: &RawValue) -> BatchItem {
    match serde_json::from_str::<Request>(raw.get()) {
        Ok(request) => BatchItem::Request(request),
        Err(e) => {
            let id = match recover_id(raw.get().as_bytes()) {
                RequestId::Absent => RequestId::Null,
                id => id,
            };
            let error = ErrorObject::invalid_request(Some(e.to_string().into()));
            BatchItem::Invalid(Response::error(id, error))
        }
    }
}

/// Best-effort extraction of the `id` from input that did not decode as a
/// request.
pub fn recover_id(bytes: &[u8]) -> RequestId {
    serde_json::from_slice::<IdProbe>(bytes)
        .map(|probe| probe.id)
        .unwrap_or_default()
}

/// True when the first non-whitespace byte opens a JSON array.
pub fn looks_like_batch(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'[')
}

/// Serialize one envelope (or a batch of them), newline terminated.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut bytes = serde_json::to_vec(value).map_err(CodecError::Serialize)?;
    bytes.push(b'\n');
    Ok(bytes)
}

const READ_CHUNK: usize = 4 * 1024;

/// Read until `reader` has produced one complete JSON value and return its
/// bytes. The peer may keep the stream open.
///
/// Input that can never become valid JSON is returned as soon as that is
/// known, and a stream that ends mid-value returns what arrived; decoding
/// then reports either case. Bytes after the value are dropped.
pub async fn read_value<R>(reader: &mut R) -> Result<Vec<u8>, CodecError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut bytes = Vec::with_capacity(READ_CHUNK);
    loop {
        bytes.reserve(READ_CHUNK);
        if reader.read_buf(&mut bytes).await? == 0 {
            return Ok(bytes);
        }
        if let Some(end) = value_end(&bytes) {
            bytes.truncate(end);
            return Ok(bytes);
        }
    }
}

/// Offset just past the first JSON value in `bytes`, or `None` while the
/// value is still incomplete.
fn value_end(bytes: &[u8]) -> Option<usize> {
    let mut values = serde_json::Deserializer::from_slice(bytes).into_iter::<IgnoredAny>();
    match values.next() {
        Some(Ok(_)) => Some(values.byte_offset()),
        Some(Err(e)) if e.is_eof() => None,
        Some(Err(_)) => Some(bytes.len()),
        None => None,
    }
}

pub async fn write_envelope<W, T>(writer: &mut W, value: &T) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin + ?Sized,
    T: Serialize + ?Sized,
{
    let bytes = encode(value)?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Write a standalone error envelope (no `id`) carrying `code` and its
/// canonical message.
pub async fn write_error<W>(code: ErrorCode, writer: &mut W) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    write_envelope(writer, &Response::standalone(code)).await
}
