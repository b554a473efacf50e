//! Identity types for Fundable
//!
//! Identities are opaque, caller-supplied strings. The core never
//! authenticates them, it only compares them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The all-zero 20-byte address, treated as "no identity"
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Macro to generate string-backed ID types with common implementations
macro_rules! define_string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create from anything string-like
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the inner string
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when the identifier carries no characters
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(AccountId, "Identity of a caller, wallet, operator or agent");
define_string_id!(OperationId, "Caller-supplied identifier naming one fund order for its whole lifetime");

impl AccountId {
    /// The null identity
    pub fn zero() -> Self {
        Self(ZERO_ADDRESS.to_string())
    }

    /// True for the empty identity and the all-zero address
    pub fn is_null(&self) -> bool {
        self.0.is_empty() || self.0.eq_ignore_ascii_case(ZERO_ADDRESS)
    }
}
