//! Type-safe identifier wrappers around opaque strings.
//!
//! Entities and agents are referenced by opaque string ids (`"tree_01"`,
//! `"farmer_001"`). Strong typing prevents accidental mixing of the two at
//! compile time. The `generate()` constructors produce UUID v7 backed ids
//! for entities created without an explicit id (tests, ad-hoc world setup).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around an opaque `String` id.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing opaque id.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Create a fresh identifier using UUID v7 (time-ordered).
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// View the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner `String` value.
            pub fn into_inner(self) -> String {
                self.0
            }

            /// True when the id is empty or whitespace-only.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a world entity.
    EntityId
}

define_id! {
    /// Unique identifier for an agent.
    AgentId
}
