use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

use crate::error::ErrorObject;
use crate::types::{JsonRpcVersion, RequestId};

/// Raw `params` of a request.
///
/// The server never looks inside; the JSON text is handed to the handler
/// exactly as received. A literal `"params": null` is kept as `Some("null")`,
/// only a missing member is `None`.
#[derive(Debug, Clone, Default)]
pub struct Params(Option<Box<RawValue>>);

impl Params {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn from_raw(raw: Box<RawValue>) -> Self {
        Self(Some(raw))
    }

    /// Serialize `value` into params.
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::value::to_raw_value(value).map(Self::from_raw)
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_raw(&self) -> Option<&RawValue> {
        self.0.as_deref()
    }

    /// The raw JSON text, if params were present.
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref().map(RawValue::get)
    }

    /// Decode params into `T`. Missing params decode as JSON `null`, so
    /// `Option<_>` and `()` targets accept them.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ErrorObject> {
        let text = self.get().unwrap_or("null");
        serde_json::from_str(text)
            .map_err(|e| ErrorObject::invalid_params(Some(Value::String(e.to_string()))))
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Serialize for Params {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match &self.0 {
            Some(raw) => raw.serialize(serializer),
            None => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for Params {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Box::<RawValue>::deserialize(deserializer).map(Self::from_raw)
    }
}

/// A JSON-RPC request envelope. With an absent (or, depending on policy,
/// null) id it is a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub method: String,
    #[serde(default, skip_serializing_if = "Params::is_none")]
    pub params: Params,
    #[serde(default, skip_serializing_if = "RequestId::is_absent")]
    pub id: RequestId,
}

impl Request {
    pub fn new(id: RequestId, method: impl Into<String>, params: Params) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
            id,
        }
    }

    /// A request with no `id` member.
    pub fn notification(method: impl Into<String>, params: Params) -> Self {
        Self::new(RequestId::Absent, method, params)
    }
}

/// Used to recover the id of an element that failed to decode as a request.
#[derive(Deserialize)]
pub(crate) struct IdProbe {
    #[serde(default)]
    pub id: RequestId,
}
