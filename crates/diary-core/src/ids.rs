//! UUID-backed ID newtypes.
//!
//! Each entity has its own ID type so a task ID cannot be handed to a
//! resource lookup by accident. Parsing is strict: anything that is not a
//! UUID is rejected with [`IdError`], which the HTTP layer turns into a 400.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when a string is not a valid UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} ID format: {value}")]
pub struct IdError {
    /// Entity kind the ID was meant for (e.g. `"task"`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random ID.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an ID from its hyphenated string form.
            pub fn parse(raw: &str) -> Result<Self, IdError> {
                Uuid::parse_str(raw.trim()).map(Self).map_err(|_| IdError {
                    kind: $kind,
                    value: raw.to_string(),
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }

        impl FromStr for $name {
            type Err = IdError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

entity_id! {
    /// Identifier of a task.
    TaskId, "task"
}

entity_id! {
    /// Identifier of a learning resource.
    ResourceId, "resource"
}

entity_id! {
    /// Opaque reference to a project. No project entity exists; tasks only
    /// carry the reference.
    ProjectId, "project"
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }

    #[test]
    fn parse_roundtrips_display() {
        let id = ResourceId::new();
        let parsed = ResourceId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_accepts_surrounding_whitespace() {
        let id = TaskId::new();
        let parsed = TaskId::parse(&format!("  {id} ")).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = TaskId::parse("not-a-uuid").unwrap_err();
        assert_eq!(err.kind, "task");
        assert_eq!(err.value, "not-a-uuid");
        assert_eq!(err.to_string(), "invalid task ID format: not-a-uuid");
    }

    #[test]
    fn from_str_uses_parse() {
        assert_matches!("123".parse::<ProjectId>(), Err(IdError { kind: "project", .. }));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = TaskId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }

    #[test]
    fn deserialize_rejects_non_uuid() {
        let result: Result<ProjectId, _> = serde_json::from_str("\"abc\"");
        assert!(result.is_err());
    }
}
