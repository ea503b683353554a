use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{ErrorCode, ErrorObject};
use crate::types::{JsonRpcVersion, RequestId};

/// Either side of a response. Having one enum instead of two optional fields
/// keeps "both" and "neither" unrepresentable.
#[derive(Debug, Clone)]
pub enum Outcome {
    Result(Box<RawValue>),
    Error(ErrorObject),
}

impl PartialEq for Outcome {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Outcome::Result(a), Outcome::Result(b)) => a.get() == b.get(),
            (Outcome::Error(a), Outcome::Error(b)) => a == b,
            _ => false,
        }
    }
}

/// A JSON-RPC response envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub version: JsonRpcVersion,
    pub outcome: Outcome,
    pub id: RequestId,
}

impl Response {
    pub fn success(id: RequestId, result: Box<RawValue>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            outcome: Outcome::Result(result),
            id,
        }
    }

    pub fn error(id: RequestId, error: ErrorObject) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            outcome: Outcome::Error(error),
            id,
        }
    }

    /// An error envelope without an `id` member, used for failures that
    /// happen before any request could be identified.
    pub fn standalone(code: ErrorCode) -> Self {
        Self::error(RequestId::Absent, code.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    pub fn result(&self) -> Option<&RawValue> {
        match &self.outcome {
            Outcome::Result(raw) => Some(raw),
            Outcome::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            Outcome::Error(err) => Some(err),
            Outcome::Result(_) => None,
        }
    }
}

impl Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let len = if self.id.is_absent() { 2 } else { 3 };
        let mut state = serializer.serialize_struct("Response", len)?;
        state.serialize_field("jsonrpc", &self.version)?;
        match &self.outcome {
            Outcome::Result(raw) => state.serialize_field("result", raw)?,
            Outcome::Error(err) => state.serialize_field("error", err)?,
        }
        if self.id.is_absent() {
            state.skip_field("id")?;
        } else {
            state.serialize_field("id", &self.id)?;
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct WireResponse {
    jsonrpc: JsonRpcVersion,
    #[serde(default, deserialize_with = "present")]
    result: Option<Box<RawValue>>,
    #[serde(default)]
    error: Option<ErrorObject>,
    #[serde(default)]
    id: RequestId,
}

// Plain `Option` would fold `"result": null` into `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = WireResponse::deserialize(deserializer)?;
        let outcome = match (wire.result, wire.error) {
            (Some(result), None) => Outcome::Result(result),
            (None, Some(error)) => Outcome::Error(error),
            (Some(_), Some(_)) => {
                return Err(serde::de::Error::custom(
                    "response carries both result and error",
                ));
            }
            (None, None) => {
                return Err(serde::de::Error::custom(
                    "response carries neither result nor error",
                ));
            }
        };
        Ok(Self {
            version: wire.jsonrpc,
            outcome,
            id: wire.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::value::to_raw_value;
    use serde_json::{Value, from_str, json, to_string};

    #[test]
    fn test_response_serialization() {
        let response = Response::success(
            RequestId::from(1),
            to_raw_value(&json!({"value": "success"})).unwrap(),
        );

        let json_str = to_string(&response).unwrap();
        assert_eq!(
            json_str,
            r#"{"jsonrpc":"2.0","result":{"value":"success"},"id":1}"#
        );
    }

    #[test]
    fn test_standalone_error_has_no_id() {
        let json_str = to_string(&Response::standalone(ErrorCode::ParseError)).unwrap();
        assert_eq!(
            json_str,
            r#"{"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error"}}"#
        );
    }

    #[test]
    fn test_null_result_survives_decoding() {
        let parsed: Response = from_str(r#"{"jsonrpc":"2.0","result":null,"id":"a"}"#).unwrap();
        assert_eq!(parsed.result().map(RawValue::get), Some("null"));
        assert_eq!(parsed.id, RequestId::from("a"));
    }

    #[test]
    fn test_decode_rejects_ambiguous_outcomes() {
        assert!(
            from_str::<Response>(
                r#"{"jsonrpc":"2.0","result":1,"error":{"code":1,"message":"x"},"id":1}"#
            )
            .is_err()
        );
        assert!(from_str::<Response>(r#"{"jsonrpc":"2.0","id":1}"#).is_err());
    }

    #[test]
    fn test_round_trip_preserves_id_tags() {
        let ids = [
            RequestId::Absent,
            RequestId::Null,
            RequestId::from("abc"),
            RequestId::from(-7),
        ];
        for id in ids {
            let response = Response::error(
                id,
                ErrorObject::application(7, "custom", Some(json!([1, 2]))).unwrap(),
            );
            let decoded: Response = from_str(&to_string(&response).unwrap()).unwrap();
            assert_eq!(decoded, response);
        }
    }

    #[test]
    fn test_round_trip_keeps_null_error_data() {
        let with_null = Response::error(
            RequestId::from(1),
            ErrorObject::application(5, "x", Some(Value::Null)).unwrap(),
        );
        let text = to_string(&with_null).unwrap();
        assert_eq!(
            text,
            r#"{"jsonrpc":"2.0","error":{"code":5,"message":"x","data":null},"id":1}"#
        );
        assert_eq!(from_str::<Response>(&text).unwrap(), with_null);

        let without = Response::error(
            RequestId::from(1),
            ErrorObject::application(5, "x", None).unwrap(),
        );
        let decoded: Response = from_str(&to_string(&without).unwrap()).unwrap();
        assert_eq!(decoded.error_object().and_then(|e| e.data.clone()), None);
    }
}
