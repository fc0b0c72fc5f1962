//! Field value conversions
//!
//! [`FieldType`] connects a Rust field type to the mapper: the declared type
//! used for schema derivation, the tagged value read for extraction and query
//! assignments, and the conversion back from a hydrated raw value.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::declaration::{short_type_name, DeclaredType};
use crate::definition::parse_datetime;
use crate::error::{DecodingError, EncodingError, Result};
use crate::hydrator::Hydrate;
use crate::value::{record_from_json, FieldValue, RawRecord, Value};

/// A Rust type usable as a mapped field
pub trait FieldType: Sized {
    fn declared_type() -> DeclaredType;

    fn to_field(&self) -> Result<FieldValue>;

    fn from_value(value: Value) -> Result<Self>;
}

fn unexpected<T>(value: &Value) -> DecodingError {
    DecodingError::new(
        short_type_name::<T>(),
        format!("unexpected {} value", value.type_name()),
    )
}

fn required<T>() -> DecodingError {
    DecodingError::new(short_type_name::<T>(), "value is required")
}

fn integer_from(value: Value) -> std::result::Result<i64, DecodingError> {
    if value.is_null() {
        return Err(required::<i64>());
    }
    value.as_i64().ok_or_else(|| unexpected::<i64>(&value))
}

impl FieldType for i64 {
    fn declared_type() -> DeclaredType {
        DeclaredType::Integer
    }

    fn to_field(&self) -> Result<FieldValue> {
        Ok(FieldValue::Plain(Value::Int(*self)))
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(integer_from(value)?)
    }
}

macro_rules! narrow_integer_field {
    ($($ty:ty),+) => {$(
        impl FieldType for $ty {
            fn declared_type() -> DeclaredType {
                DeclaredType::Integer
            }

            fn to_field(&self) -> Result<FieldValue> {
                i64::try_from(*self)
                    .map(|i| FieldValue::Plain(Value::Int(i)))
                    .map_err(|_| EncodingError::new(stringify!($ty), "integer out of range").into())
            }

            fn from_value(value: Value) -> Result<Self> {
                let wide = integer_from(value)?;
                <$ty>::try_from(wide).map_err(|_| {
                    DecodingError::new(stringify!($ty), format!("{} is out of range", wide)).into()
                })
            }
        }
    )+};
}

narrow_integer_field!(i32, u32, u64);

impl FieldType for f64 {
    fn declared_type() -> DeclaredType {
        DeclaredType::Float
    }

    fn to_field(&self) -> Result<FieldValue> {
        Ok(FieldValue::Plain(Value::Float(*self)))
    }

    fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Err(required::<f64>().into());
        }
        value.as_f64().ok_or_else(|| unexpected::<f64>(&value).into())
    }
}

impl FieldType for bool {
    fn declared_type() -> DeclaredType {
        DeclaredType::Bool
    }

    fn to_field(&self) -> Result<FieldValue> {
        Ok(FieldValue::Plain(Value::Bool(*self)))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(i) => Ok(i != 0),
            Value::Null => Err(required::<bool>().into()),
            other => Err(unexpected::<bool>(&other).into()),
        }
    }
}

impl FieldType for String {
    fn declared_type() -> DeclaredType {
        DeclaredType::String
    }

    fn to_field(&self) -> Result<FieldValue> {
        Ok(FieldValue::Plain(Value::Text(self.clone())))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(text) => Ok(text),
            Value::Null => Err(required::<String>().into()),
            other => Err(unexpected::<String>(&other).into()),
        }
    }
}

impl FieldType for DateTime<Utc> {
    fn declared_type() -> DeclaredType {
        DeclaredType::Timestamp
    }

    fn to_field(&self) -> Result<FieldValue> {
        Ok(FieldValue::Plain(Value::Timestamp(*self)))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            Value::Text(text) => parse_datetime(&text).ok_or_else(|| {
                DecodingError::new("DateTime", format!("invalid datetime '{}'", text)).into()
            }),
            Value::Null => Err(required::<DateTime<Utc>>().into()),
            other => Err(unexpected::<DateTime<Utc>>(&other).into()),
        }
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn declared_type() -> DeclaredType {
        T::declared_type().nullable()
    }

    fn to_field(&self) -> Result<FieldValue> {
        match self {
            Some(inner) => inner.to_field(),
            None => Ok(FieldValue::Plain(Value::Null)),
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Arrays and maps serialize themselves to JSON for storage
fn serialize_json<T: Serialize>(value: &T) -> Result<FieldValue> {
    serde_json::to_value(value)
        .map(|json| FieldValue::Serialized(Value::Json(json)))
        .map_err(|e| EncodingError::new(short_type_name::<T>(), e.to_string()).into())
}

fn deserialize_json<T: DeserializeOwned>(value: Value) -> Result<T> {
    let json = match value {
        Value::Null => return Err(required::<T>().into()),
        Value::Text(text) => serde_json::from_str(&text)
            .map_err(|e| DecodingError::new(short_type_name::<T>(), e.to_string()))?,
        other => other.to_json(),
    };
    serde_json::from_value(json)
        .map_err(|e| DecodingError::new(short_type_name::<T>(), e.to_string()).into())
}

impl<T: Serialize + DeserializeOwned> FieldType for Vec<T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::Array
    }

    fn to_field(&self) -> Result<FieldValue> {
        serialize_json(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        deserialize_json(value)
    }
}

impl<T: Serialize + DeserializeOwned> FieldType for BTreeMap<String, T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::Map
    }

    fn to_field(&self) -> Result<FieldValue> {
        serialize_json(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        deserialize_json(value)
    }
}

impl FieldType for serde_json::Value {
    fn declared_type() -> DeclaredType {
        DeclaredType::Map
    }

    fn to_field(&self) -> Result<FieldValue> {
        Ok(FieldValue::Serialized(Value::Json(self.clone())))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(text) => serde_json::from_str(&text)
                .map_err(|e| DecodingError::new("json", e.to_string()).into()),
            other => Ok(other.to_json()),
        }
    }
}

/// Read a nested record field; used by [`nested_field!`](crate::nested_field)
pub fn nested_to_field<T: Hydrate>(value: &T) -> Result<FieldValue> {
    value.extract().map(FieldValue::Nested)
}

/// Hydrate a nested record field; used by [`nested_field!`](crate::nested_field)
fn not_a_record<T>() -> DecodingError {
    DecodingError::new(short_type_name::<T>(), "expected a record")
}

pub fn nested_from_value<T: Hydrate>(value: Value) -> Result<T> {
    let record: RawRecord = match value {
        Value::Record(record) => record,
        Value::Json(json) => {
            record_from_json(json).ok_or_else(not_a_record::<T>)?
        }
        Value::Text(text) => {
            let json: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| DecodingError::new(short_type_name::<T>(), e.to_string()))?;
            record_from_json(json).ok_or_else(not_a_record::<T>)?
        }
        Value::Null => return Err(required::<T>().into()),
        other => return Err(unexpected::<T>(&other).into()),
    };
    T::hydrate(record)
}

/// Implement [`FieldType`] for record types used as nested fields
///
/// ```text
/// nested_field!(Address, Contact);
/// ```
#[macro_export]
macro_rules! nested_field {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::field::FieldType for $ty {
            fn declared_type() -> $crate::declaration::DeclaredType {
                $crate::declaration::DeclaredType::nested::<$ty>()
            }

            fn to_field(&self) -> $crate::error::Result<$crate::value::FieldValue> {
                $crate::field::nested_to_field(self)
            }

            fn from_value(value: $crate::value::Value) -> $crate::error::Result<Self> {
                $crate::field::nested_from_value::<$ty>(value)
            }
        }
    )+};
}
