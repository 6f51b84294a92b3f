//! A three-state optional for partial-update payloads.

use serde::{Deserialize, Serialize};

/// A field value that distinguishes *absent*, *null*, and *present*.
///
/// Partial updates need all three states: leaving a field out means "no
/// change", an explicit `null` means "clear", and a value means "set". A plain
/// `Option` collapses the first two, so fields with these semantics use this
/// type together with:
///
/// ```ignore
/// #[serde(default, skip_serializing_if = "MaybeUndefined::is_undefined")]
/// ```
///
/// The `default` attribute supplies [`MaybeUndefined::Undefined`] when the key
/// is missing; the custom `Deserialize` impl below only ever sees keys that
/// are present, so `null` maps to [`MaybeUndefined::Null`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MaybeUndefined<T> {
    /// The field was not present at all.
    #[default]
    Undefined,
    /// The field was present with an explicit `null`.
    Null,
    /// The field was present with a value.
    Value(T),
}

impl<T> MaybeUndefined<T> {
    pub fn is_undefined(&self) -> bool {
        matches!(self, MaybeUndefined::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MaybeUndefined::Null)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, MaybeUndefined::Value(_))
    }

    /// The contained value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            MaybeUndefined::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Converts into an `Option`, losing the absent/null distinction.
    pub fn into_option(self) -> Option<T> {
        match self {
            MaybeUndefined::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for MaybeUndefined<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            // Undefined fields are skipped by the containing struct; a bare
            // serialize call still has to produce something, and null is the
            // closest JSON has to "nothing".
            MaybeUndefined::Undefined | MaybeUndefined::Null => serializer.serialize_none(),
            MaybeUndefined::Value(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for MaybeUndefined<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            None => MaybeUndefined::Null,
            Some(value) => MaybeUndefined::Value(value),
        })
    }
}
