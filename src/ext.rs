//! Extension method passthrough.
//!
//! Method names starting with `_` are reserved for implementation-specific
//! RPCs. The dispatcher strips the underscore and hands the raw params to the
//! handler untouched; outbound, the underscore is prepended again. The params
//! and the result are opaque to the protocol engine and survive the trip
//! byte-for-byte.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// An extension method call.
///
/// `method` is the name with the leading `_` stripped. On the wire only
/// `params` is transmitted; the method name travels in the JSON-RPC envelope.
#[derive(Clone, Debug)]
pub struct ExtRequest {
    /// The extension method name, without the `_` prefix.
    pub method: Arc<str>,
    /// The raw parameters, preserved verbatim.
    pub params: Arc<RawValue>,
}

impl ExtRequest {
    pub fn new(method: impl Into<Arc<str>>, params: impl Into<Arc<RawValue>>) -> Self {
        ExtRequest {
            method: method.into(),
            params: params.into(),
        }
    }
}

impl PartialEq for ExtRequest {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.params.get() == other.params.get()
    }
}

impl Serialize for ExtRequest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.params.serialize(serializer)
    }
}

/// The result of an extension method call: a raw JSON value, opaque to the
/// protocol engine.
#[derive(Clone, Debug)]
pub struct ExtResponse(pub Arc<RawValue>);

impl ExtResponse {
    pub fn new(value: impl Into<Arc<RawValue>>) -> Self {
        ExtResponse(value.into())
    }
}

impl PartialEq for ExtResponse {
    fn eq(&self, other: &Self) -> bool {
        self.0.get() == other.0.get()
    }
}

impl From<Box<RawValue>> for ExtResponse {
    fn from(value: Box<RawValue>) -> Self {
        ExtResponse(value.into())
    }
}

impl Serialize for ExtResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExtResponse {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Box::<RawValue>::deserialize(deserializer).map(Into::into)
    }
}

/// A one-way extension notification.
#[derive(Clone, Debug)]
pub struct ExtNotification {
    /// The extension notification name, without the `_` prefix.
    pub method: Arc<str>,
    /// The raw parameters, preserved verbatim.
    pub params: Arc<RawValue>,
}

impl ExtNotification {
    pub fn new(method: impl Into<Arc<str>>, params: impl Into<Arc<RawValue>>) -> Self {
        ExtNotification {
            method: method.into(),
            params: params.into(),
        }
    }
}

impl PartialEq for ExtNotification {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.params.get() == other.params.get()
    }
}

impl Serialize for ExtNotification {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.params.serialize(serializer)
    }
}
