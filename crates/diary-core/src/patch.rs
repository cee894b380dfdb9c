//! Presence-aware field container for sparse updates.
//!
//! `Option<T>` cannot tell "the caller did not send this field" from "the
//! caller sent `null`". [`Patch`] keeps the three cases apart:
//!
//! | JSON            | `Patch`         |
//! |-----------------|-----------------|
//! | key missing     | `Absent`        |
//! | `"key": null`   | `Null`          |
//! | `"key": value`  | `Value(value)`  |
//!
//! Fields must be annotated with `#[serde(default)]` so a missing key
//! produces `Absent`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A field of a sparse update request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Patch<T> {
    /// The field was not part of the request.
    Absent,
    /// The field was sent as `null`.
    Null,
    /// The field was sent with a value.
    Value(T),
}

impl<T> Patch<T> {
    /// Collapse into `Option<Option<T>>`: outer `None` means absent,
    /// `Some(None)` means explicit null.
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Self::Absent => None,
            Self::Null => Some(None),
            Self::Value(v) => Some(Some(v)),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|v| v.map_or(Self::Null, Self::Value))
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Absent | Self::Null => serializer.serialize_none(),
        }
    }
}
