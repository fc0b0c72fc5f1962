//! Error types for record mapping

use std::fmt;

use thiserror::Error;

use crate::value::Value;

/// Result type for mapping operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for every mapping operation
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Decoding(#[from] DecodingError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Hydrator(#[from] HydratorError),

    #[error(transparent)]
    NotFound(#[from] RecordNotFound),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl Error {
    /// Attach the field identifier to a decoding error that has none yet
    pub fn in_field(self, field: &str) -> Self {
        match self {
            Error::Decoding(err) if err.field.is_none() => Error::Decoding(DecodingError {
                field: Some(field.to_string()),
                ..err
            }),
            other => other,
        }
    }
}

/// Defects in a record type's mapping declaration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("The record type {type_name} must declare an entity mapping")]
    MissingSchemaDeclaration { type_name: String },

    #[error("The field {type_name}.{field} has complex type {field_type} without a hydrator")]
    MissingHydratorCapability {
        type_name: String,
        field: String,
        field_type: String,
    },

    #[error("The field {type_name}.{field} cannot be a union type")]
    UnsupportedUnionType { type_name: String, field: String },

    #[error("The field {type_name}.{field} cannot be an intersection type")]
    UnsupportedIntersectionType { type_name: String, field: String },

    #[error("The field {type_name}.{field} has unknown type {field_type}")]
    UnknownFieldType {
        type_name: String,
        field: String,
        field_type: String,
    },

    #[error("The record type {type_name} has no primary key")]
    NoPrimaryKey { type_name: String },

    #[error("The record type {type_name} does not expose the mapped field {field}")]
    UnreadableField { type_name: String, field: String },
}

/// A raw value could not be decoded by a type definition
#[derive(Error, Debug, Clone, PartialEq)]
pub struct DecodingError {
    /// Name of the definition that rejected the value
    pub definition: String,
    /// Field identifier, once known
    pub field: Option<String>,
    pub reason: String,
}

impl fmt::Display for DecodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subject = self.field.as_deref().unwrap_or(&self.definition);
        write!(f, "Cannot decode {}: {}", subject, self.reason)
    }
}

impl DecodingError {
    pub fn new(definition: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            field: None,
            reason: reason.into(),
        }
    }
}

/// A value could not be encoded by a type definition
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot encode {definition}: {reason}")]
pub struct EncodingError {
    pub definition: String,
    pub reason: String,
}

impl EncodingError {
    pub fn new(definition: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            reason: reason.into(),
        }
    }
}

/// A value destined for storage has no storable form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HydratorError {
    #[error(
        "The field {type_name}.{field} must be scalar, null, nested or serializable. Got {value_type}"
    )]
    UnsupportedAssignValue {
        type_name: String,
        field: String,
        value_type: String,
    },
}

/// A lookup by identity found no row
#[derive(Error, Debug, Clone, PartialEq)]
pub struct RecordNotFound {
    pub entity: String,
    pub key: String,
    pub value: Option<Value>,
}

impl fmt::Display for RecordNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} with {}: {} is not found", self.entity, self.key, value),
            None => write!(f, "{} with {}: null is not found", self.entity, self.key),
        }
    }
}

impl RecordNotFound {
    /// Not found without a specific key
    pub fn entity(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            key: "*".to_string(),
            value: None,
        }
    }

    pub fn with_key(entity: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            entity: entity.into(),
            key: key.into(),
            value: Some(value),
        }
    }
}

/// Failure reported by a query executor
#[derive(Error, Debug)]
#[error("Query execution failed: {message}")]
pub struct ExecutorError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ExecutorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
