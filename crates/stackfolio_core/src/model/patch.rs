//! Tri-state optional field for partial updates.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A field that was not supplied, explicitly cleared, or set to a value.
///
/// Deserializes with `#[serde(default)]`: a missing key is `Absent`, `null`
/// is `Null`, anything else is `Value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Patch<T> {
    /// Not supplied; the stored value stays as it is.
    Absent,
    /// Explicitly set to null.
    Null,
    /// Explicitly set to a value.
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Self::Absent => Patch::Absent,
            Self::Null => Patch::Null,
            Self::Value(value) => Patch::Value(value),
        }
    }

    /// `None` when absent, otherwise the nullable value that was supplied.
    pub fn into_supplied(self) -> Option<Option<T>> {
        match self {
            Self::Absent => None,
            Self::Null => Some(None),
            Self::Value(value) => Some(Some(value)),
        }
    }

    /// Resolves the patch against the currently stored value without consuming it.
    pub fn resolve<'a>(&'a self, current: Option<&'a T>) -> Option<&'a T> {
        match self {
            Self::Absent => current,
            Self::Null => None,
            Self::Value(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Value(value),
            None => Self::Null,
        }
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => serializer.serialize_some(value),
            Self::Absent | Self::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::Patch;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Record {
        #[serde(default)]
        description: Patch<String>,
    }

    #[test]
    fn deserialize_distinguishes_missing_null_and_value() {
        let missing: Record = serde_json::from_str("{}").unwrap();
        let null: Record = serde_json::from_str(r#"{"description": null}"#).unwrap();
        let value: Record = serde_json::from_str(r#"{"description": "x"}"#).unwrap();

        assert_eq!(missing.description, Patch::Absent);
        assert_eq!(null.description, Patch::Null);
        assert_eq!(value.description, Patch::Value("x".to_string()));
    }

    #[test]
    fn resolve_prefers_supplied_state() {
        let current = 3;
        assert_eq!(Patch::<i32>::Absent.resolve(Some(&current)), Some(&3));
        assert_eq!(Patch::<i32>::Null.resolve(Some(&current)), None);
        assert_eq!(Patch::Value(4).resolve(Some(&current)), Some(&4));
    }
}
