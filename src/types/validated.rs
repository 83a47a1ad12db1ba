//! Validated string types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for configuration values
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("hostname cannot be empty or whitespace")]
    EmptyHostName,

    #[error("port cannot be 0")]
    InvalidPort,

    #[error("invalid port number: {0}")]
    InvalidPortNumber(String),

    #[error("invalid SQL identifier '{0}': use letters, digits and underscores, not starting with a digit")]
    InvalidIdentifier(String),
}

/// Rules for names that are interpolated into SQL text.
///
/// Table and schema names cannot be bound as statement parameters, so they
/// are restricted to `[A-Za-z_][A-Za-z0-9_]*` and at most 63 bytes.
fn validate_identifier(s: &str) -> Result<(), ValidationError> {
    let mut chars = s.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
                && s.len() <= 63
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier(s.to_string()))
    }
}

/// Macro to generate validated string newtypes.
///
/// Each type gets:
/// - A `new()` constructor that validates
/// - `as_str()` getter
/// - `AsRef<str>`, `Deref`, `Display`, `TryFrom<String>` impls
/// - Serde `Serialize` and `Deserialize` with validation
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            validation: |$s_param:ident| $validation:expr,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new($s_param: String) -> Result<Self, ValidationError> {
                let validate = || $validation;
                validate()?;
                Ok(Self($s_param))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from($s_param: String) -> Result<Self, Self::Error> {
                Self::new($s_param)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_string! {
    /// A validated hostname that cannot be empty or whitespace-only
    ///
    /// # Examples
    /// ```
    /// use linkstats::types::HostName;
    ///
    /// let host = HostName::new("127.0.0.1".to_string()).unwrap();
    /// assert_eq!(host.as_str(), "127.0.0.1");
    ///
    /// assert!(HostName::new("   ".to_string()).is_err());
    /// ```
    #[doc(alias = "host")]
    pub struct HostName(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyHostName)
            } else {
                Ok(())
            }
        },
    }
}

validated_string! {
    /// The table that receives link statistics rows
    ///
    /// # Examples
    /// ```
    /// use linkstats::types::TableName;
    ///
    /// assert!(TableName::new("links_statics".to_string()).is_ok());
    /// assert!(TableName::new("links; DROP TABLE x".to_string()).is_err());
    /// ```
    pub struct TableName(String) {
        validation: |s| validate_identifier(&s),
    }
}

validated_string! {
    /// The schema that qualifies [`TableName`] on backends that have schemas
    pub struct SchemaName(String) {
        validation: |s| validate_identifier(&s),
    }
}
