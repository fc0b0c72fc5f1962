//! Type definitions
//!
//! A [`TypeDefinition`] decodes raw values into their canonical form, encodes
//! them for external formats, and reports whether the type is scalar. The
//! resolver derives one per mapped field; callers may also supply their own
//! through `FieldMap::definition`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DecodingError, EncodingError};
use crate::value::Value;

/// Storage and wire format for timestamps
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What kind of value a definition describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum DefinitionKind {
    Null,
    Integer,
    Float,
    String,
    Bool,
    /// Arrays and maps
    Json,
    DateTime {
        immutable: bool,
    },
    /// A record with its own property definitions
    Object {
        type_name: String,
        properties: Vec<TypeDefinition>,
    },
}

impl DefinitionKind {
    pub fn label(&self) -> &'static str {
        match self {
            DefinitionKind::Null => "null",
            DefinitionKind::Integer => "integer",
            DefinitionKind::Float => "float",
            DefinitionKind::String => "string",
            DefinitionKind::Bool => "bool",
            DefinitionKind::Json => "json",
            DefinitionKind::DateTime { .. } => "datetime",
            DefinitionKind::Object { .. } => "object",
        }
    }
}

/// Definition of a single value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Field identifier the definition belongs to
    pub name: String,
    pub kind: DefinitionKind,
    pub required: bool,
    pub nullable: bool,
    /// Alternate key used by external formats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encode_key: Option<String>,
}

impl TypeDefinition {
    /// Create a required, non-nullable definition
    pub fn new(name: impl Into<String>, kind: DefinitionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            nullable: false,
            encode_key: None,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::Float)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::String)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::Bool)
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::Json)
    }

    /// An immutable timestamp definition
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::DateTime { immutable: true })
    }

    pub fn object(
        name: impl Into<String>,
        type_name: impl Into<String>,
        properties: Vec<TypeDefinition>,
    ) -> Self {
        Self::new(
            name,
            DefinitionKind::Object {
                type_name: type_name.into(),
                properties,
            },
        )
    }

    /// Nullable values are not required
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self.required = !nullable;
        self
    }

    pub fn with_encode_key(mut self, encode_key: Option<String>) -> Self {
        self.encode_key = encode_key;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Key used in external formats
    pub fn external_key(&self) -> &str {
        self.encode_key.as_deref().unwrap_or(&self.name)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self.kind, DefinitionKind::Json | DefinitionKind::Object { .. })
    }

    fn accepts_null(&self) -> bool {
        self.nullable || !self.required || self.kind == DefinitionKind::Null
    }

    fn decoding_error(&self, reason: impl Into<String>) -> DecodingError {
        DecodingError::new(&self.name, reason)
    }

    fn unexpected(&self, value: &Value) -> DecodingError {
        self.decoding_error(format!(
            "expected {}, got {}",
            self.kind.label(),
            value.type_name()
        ))
    }

    /// Decode a raw value into the canonical value for this definition
    pub fn decode(&self, raw: Value) -> Result<Value, DecodingError> {
        if raw.is_null() {
            return if self.accepts_null() {
                Ok(Value::Null)
            } else {
                Err(self.decoding_error("value is required"))
            };
        }

        match &self.kind {
            DefinitionKind::Null => Err(self.unexpected(&raw)),
            DefinitionKind::Integer => raw
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| self.unexpected(&raw)),
            DefinitionKind::Float => raw
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| self.unexpected(&raw)),
            DefinitionKind::String => match raw {
                Value::Text(_) => Ok(raw),
                other => Err(self.unexpected(&other)),
            },
            DefinitionKind::Bool => match &raw {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::Int(i) => Ok(Value::Bool(*i != 0)),
                Value::Text(s) => match s.as_str() {
                    "true" | "1" => Ok(Value::Bool(true)),
                    "false" | "0" | "" => Ok(Value::Bool(false)),
                    _ => Err(self.unexpected(&raw)),
                },
                _ => Err(self.unexpected(&raw)),
            },
            DefinitionKind::Json => match raw {
                Value::Json(_) => Ok(raw),
                Value::Record(_) => Ok(Value::Json(raw.to_json())),
                Value::Text(text) => serde_json::from_str(&text)
                    .map(Value::Json)
                    .map_err(|e| self.decoding_error(e.to_string())),
                other => Err(self.unexpected(&other)),
            },
            DefinitionKind::DateTime { .. } => match raw {
                Value::Timestamp(_) => Ok(raw),
                Value::Text(text) => parse_datetime(&text)
                    .map(Value::Timestamp)
                    .ok_or_else(|| self.decoding_error(format!("invalid datetime '{}'", text))),
                Value::Int(seconds) => Utc
                    .timestamp_opt(seconds, 0)
                    .single()
                    .map(Value::Timestamp)
                    .ok_or_else(|| {
                        self.decoding_error(format!("timestamp {} out of range", seconds))
                    }),
                other => Err(self.unexpected(&other)),
            },
            DefinitionKind::Object { .. } => match raw {
                Value::Record(_) => Ok(raw),
                Value::Json(json) if json.is_object() => Ok(Value::from(json)),
                Value::Text(text) => {
                    let json: serde_json::Value = serde_json::from_str(&text)
                        .map_err(|e| self.decoding_error(e.to_string()))?;
                    if json.is_object() {
                        Ok(Value::from(json))
                    } else {
                        Err(self.decoding_error("expected a JSON object"))
                    }
                }
                other => Err(self.unexpected(&other)),
            },
        }
    }

    /// Encode a value for external formats
    pub fn encode(&self, value: &Value) -> Result<serde_json::Value, EncodingError> {
        let unexpected = || {
            EncodingError::new(
                &self.name,
                format!("expected {}, got {}", self.kind.label(), value.type_name()),
            )
        };

        if value.is_null() {
            return if self.accepts_null() {
                Ok(serde_json::Value::Null)
            } else {
                Err(EncodingError::new(&self.name, "value is required"))
            };
        }

        match (&self.kind, value) {
            (DefinitionKind::Integer, Value::Int(i)) => Ok(serde_json::Value::from(*i)),
            (DefinitionKind::Float, Value::Float(_) | Value::Int(_)) => {
                Ok(serde_json::Value::from(value.as_f64().unwrap_or_default()))
            }
            (DefinitionKind::String, Value::Text(s)) => Ok(serde_json::Value::String(s.clone())),
            (DefinitionKind::Bool, Value::Bool(b)) => Ok(serde_json::Value::Bool(*b)),
            (DefinitionKind::Json, _) => Ok(value.to_json()),
            (DefinitionKind::DateTime { .. }, Value::Timestamp(_)) => Ok(value.to_json()),
            (DefinitionKind::DateTime { .. }, Value::Text(text)) => parse_datetime(text)
                .map(|ts| Value::Timestamp(ts).to_json())
                .ok_or_else(unexpected),
            (DefinitionKind::Object { .. }, Value::Record(_) | Value::Json(_)) => {
                Ok(value.to_json())
            }
            _ => Err(unexpected()),
        }
    }
}

/// Parse the storage format, RFC 3339, or a bare date
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
