use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum ReweaveError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Traversal exceeded the configured depth limit of {0}")]
    DepthExceeded(usize),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Member '{member}' of {record} expects a {expected} value")]
    MemberKind {
        record: String,
        member: String,
        expected: String,
    },
    #[error("Cannot validate an absent instance")]
    NullInstance,
    #[error("Traversal Cancellation Event")]
    OperationCancelled,
    #[error("Validation rule for '{member}' failed: {message}")]
    Rule { member: String, message: String },
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Value source for '{member}' failed: {message}")]
    Source { member: String, message: String },
    #[error("Member '{member}' is not declared by {record}")]
    UnsupportedMember { record: String, member: String },
}

impl ReweaveError {
    /// Programmer errors indicate a mismatch between a record's member enumeration and its
    /// schema; they are never caused by the data being built or validated.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            ReweaveError::UnsupportedMember { .. }
                | ReweaveError::MemberKind { .. }
                | ReweaveError::NullInstance
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReweaveError::OperationCancelled)
    }

    /// Convenience constructor for rule implementations that need to signal a fault.
    pub fn rule(member: impl ToString, message: impl Into<String>) -> Self {
        ReweaveError::Rule {
            member: member.to_string(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [crate::builder::ValueSource] implementations.
    pub fn value_source(member: impl ToString, message: impl Into<String>) -> Self {
        ReweaveError::Source {
            member: member.to_string(),
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for ReweaveError {
    fn from(src: toml::de::Error) -> ReweaveError {
        ReweaveError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for ReweaveError {
    fn from(src: toml::ser::Error) -> ReweaveError {
        ReweaveError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<io::Error> for ReweaveError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => ReweaveError::Io(format!("Not found: {x}")),
            _ => ReweaveError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let unsupported = ReweaveError::UnsupportedMember {
            record: "Sample".to_string(),
            member: "ghost".to_string(),
        };
        assert!(unsupported.is_programmer_error());
        assert!(ReweaveError::NullInstance.is_programmer_error());
        assert!(!ReweaveError::OperationCancelled.is_programmer_error());
        assert!(ReweaveError::OperationCancelled.is_cancelled());
        assert!(!ReweaveError::rule("value", "boom").is_programmer_error());
    }

    #[test]
    fn test_error_display() {
        let err = ReweaveError::value_source("value", "timed out");
        assert_eq!(format!("{err}"), "Value source for 'value' failed: timed out");

        let err = ReweaveError::MemberKind {
            record: "Sample".to_string(),
            member: "nestedObject".to_string(),
            expected: "nested".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Member 'nestedObject' of Sample expects a nested value"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing.toml");
        let err: ReweaveError = io_err.into();
        assert!(matches!(err, ReweaveError::Io(msg) if msg.contains("missing.toml")));
    }
}
