use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Identifier of a JSON-RPC request.
///
/// The four variants are kept apart on purpose: a missing `id` and an explicit
/// `"id": null` are different on the wire and may be treated differently by
/// the notification policy. Whatever tag a request carries is echoed verbatim
/// in its response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum RequestId {
    /// The `id` member was not present at all.
    #[default]
    Absent,
    /// `"id": null`
    Null,
    /// Any JSON string, compared byte for byte.
    String(String),
    /// Kept as the literal JSON number (`arbitrary_precision`), so `7`, `1.5`
    /// and integers wider than 64 bits all echo back unchanged.
    Number(Number),
}

impl RequestId {
    pub fn is_absent(&self) -> bool {
        matches!(self, RequestId::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RequestId::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestId::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RequestId::Number(n) => n.as_i64(),
            _ => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Absent => write!(f, "<absent>"),
            RequestId::Null => write!(f, "null"),
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

// `Absent` is only meaningful together with `skip_serializing_if = "RequestId::is_absent"`
// on the containing field; serialized on its own it degrades to `null`.
impl Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            RequestId::Absent | RequestId::Null => serializer.serialize_unit(),
            RequestId::String(s) => serializer.serialize_str(s),
            RequestId::Number(n) => n.serialize(serializer),
        }
    }
}

// A missing field never reaches this impl; containers use `#[serde(default)]` for that.
impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(RequestId::Null),
            Value::String(s) => Ok(RequestId::String(s)),
            Value::Number(n) => Ok(RequestId::Number(n)),
            other => Err(serde::de::Error::custom(format!(
                "Invalid request id: expected string, number or null, got {}",
                other
            ))),
        }
    }
}

/// JSON-RPC version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonRpcVersion::V2_0 => crate::JSONRPC_VERSION,
        }
    }
}

impl fmt::Display for JsonRpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            crate::JSONRPC_VERSION => Ok(JsonRpcVersion::V2_0),
            _ => Err(serde::de::Error::custom(format!(
                "Invalid JSON-RPC version: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Holder {
        #[serde(default, skip_serializing_if = "RequestId::is_absent")]
        id: RequestId,
    }

    #[test]
    fn test_request_id_serialization() {
        assert_eq!(
            serde_json::to_string(&RequestId::from("test")).unwrap(),
            r#""test""#
        );
        assert_eq!(serde_json::to_string(&RequestId::from(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&RequestId::Null).unwrap(), "null");
    }

    #[test]
    fn test_absent_and_null_are_distinct() {
        let absent: Holder = serde_json::from_str("{}").unwrap();
        let null: Holder = serde_json::from_str(r#"{"id":null}"#).unwrap();

        assert_eq!(absent.id, RequestId::Absent);
        assert_eq!(null.id, RequestId::Null);
        assert_eq!(serde_json::to_string(&absent).unwrap(), "{}");
        assert_eq!(serde_json::to_string(&null).unwrap(), r#"{"id":null}"#);
    }

    #[test]
    fn test_numeric_ids_keep_their_representation() {
        let float: Holder = serde_json::from_str(r#"{"id":1.5}"#).unwrap();
        assert_eq!(serde_json::to_string(&float).unwrap(), r#"{"id":1.5}"#);

        let negative: Holder = serde_json::from_str(r#"{"id":-3}"#).unwrap();
        assert_eq!(negative.id.as_i64(), Some(-3));

        let wide: Holder =
            serde_json::from_str(r#"{"id":123456789012345678901234567890}"#).unwrap();
        assert_eq!(
            serde_json::to_string(&wide).unwrap(),
            r#"{"id":123456789012345678901234567890}"#
        );
        assert_eq!(wide.id.as_i64(), None);
    }

    #[test]
    fn test_string_and_number_ids_do_not_coerce() {
        let text: Holder = serde_json::from_str(r#"{"id":"1"}"#).unwrap();
        let number: Holder = serde_json::from_str(r#"{"id":1}"#).unwrap();
        assert_ne!(text.id, number.id);
    }

    #[test]
    fn test_rejects_non_scalar_ids() {
        assert!(serde_json::from_str::<Holder>(r#"{"id":true}"#).is_err());
        assert!(serde_json::from_str::<Holder>(r#"{"id":[1]}"#).is_err());
    }

    #[test]
    fn test_json_rpc_version() {
        let version = JsonRpcVersion::V2_0;
        assert_eq!(version.as_str(), "2.0");
        assert_eq!(serde_json::to_string(&version).unwrap(), r#""2.0""#);
        assert!(serde_json::from_str::<JsonRpcVersion>(r#""1.0""#).is_err());
    }
}
