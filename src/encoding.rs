//! External encodings
//!
//! JSON forms of a record for untrusted or external consumers. Keys are the
//! field's encode key, or its identifier when it has none. Hidden fields are
//! left out on encode and take their default on decode.
//!
//! [`to_map`] and [`from_map`] are the trusted counterparts: every field,
//! keyed by identifier.

use serde_json::{Map, Value as JsonValue};

use crate::declaration::short_type_name;
use crate::definition::TypeDefinition;
use crate::error::{DecodingError, EncodingError, Result};
use crate::hydrator::{extract_record, Hydrated};
use crate::record::Record;
use crate::schema::FieldDescriptor;
use crate::value::Value;

/// Object definition listing every visible field
pub fn definition<T: Record>() -> Result<TypeDefinition> {
    let schema = T::schema()?;
    let properties = schema
        .visible_fields()
        .map(|(ident, field)| match (&field.type_def, &field.nested_codec) {
            (Some(def), _) => def.clone(),
            (None, Some(codec)) => {
                TypeDefinition::object(ident.clone(), codec.type_name, Vec::new())
                    .with_nullable(field.nullable)
                    .with_encode_key(field.encode_key.clone())
            }
            (None, None) => TypeDefinition::json(ident.clone()).with_nullable(field.nullable),
        })
        .collect();
    Ok(TypeDefinition::object(
        schema.entity_name.clone(),
        schema.type_name.clone(),
        properties,
    ))
}

fn encode_value(field: &FieldDescriptor, value: &Value) -> Result<JsonValue> {
    match &field.type_def {
        Some(def) => Ok(def.encode(value)?),
        None => Ok(value.to_json()),
    }
}

fn decode_value(field: &FieldDescriptor, value: Value) -> Result<Value> {
    match &field.type_def {
        Some(def) => Ok(def.decode(value)?),
        None => Ok(value),
    }
}

/// Encode the visible fields of a record
pub fn encode<T: Record>(instance: &T) -> Result<JsonValue> {
    let schema = T::schema()?;
    let raw = extract_record(instance)?;

    let mut object = Map::with_capacity(schema.fields.len());
    for (ident, field) in schema.visible_fields() {
        let value = raw.get(&field.storage_key).unwrap_or(&Value::Null);
        let key = field.encode_key.clone().unwrap_or_else(|| ident.clone());
        let encoded = encode_value(field, value).map_err(|err| err.in_field(ident))?;
        object.insert(key, encoded);
    }
    Ok(JsonValue::Object(object))
}

/// Decode a record from its external JSON form
pub fn decode<T: Record>(json: JsonValue) -> Result<T> {
    let schema = T::schema()?;
    let JsonValue::Object(mut object) = json else {
        return Err(DecodingError::new(short_type_name::<T>(), "expected a JSON object").into());
    };

    let mut values = indexmap::IndexMap::with_capacity(schema.fields.len());
    for (ident, field) in schema.visible_fields() {
        let key = field.encode_key.as_deref().unwrap_or(ident);
        let raw = object.remove(key).map(Value::from).unwrap_or_default();
        let value = decode_value(field, raw).map_err(|err| err.in_field(ident))?;
        values.insert(ident.clone(), value);
    }

    T::construct(&mut Hydrated::new(schema.type_name.clone(), values))
}

/// Render the external JSON form as a string
pub fn to_json_string<T: Record>(instance: &T) -> Result<String> {
    let json = encode(instance)?;
    serde_json::to_string(&json)
        .map_err(|e| EncodingError::new(short_type_name::<T>(), e.to_string()).into())
}

/// Every field keyed by identifier, hidden fields included
pub fn to_map<T: Record>(instance: &T) -> Result<JsonValue> {
    let schema = T::schema()?;
    let mut object = Map::with_capacity(schema.fields.len());
    for (ident, field) in &schema.fields {
        let value = instance.field(ident)?.into_value();
        let encoded = encode_value(field, &value).map_err(|err| err.in_field(ident))?;
        object.insert(ident.clone(), encoded);
    }
    Ok(JsonValue::Object(object))
}

/// Inverse of [`to_map`]
pub fn from_map<T: Record>(json: JsonValue) -> Result<T> {
    let schema = T::schema()?;
    let JsonValue::Object(mut object) = json else {
        return Err(DecodingError::new(short_type_name::<T>(), "expected a JSON object").into());
    };

    let mut values = indexmap::IndexMap::with_capacity(schema.fields.len());
    for (ident, field) in &schema.fields {
        let raw = object.remove(ident.as_str()).map(Value::from).unwrap_or_default();
        let value = decode_value(field, raw).map_err(|err| err.in_field(ident))?;
        values.insert(ident.clone(), value);
    }

    T::construct(&mut Hydrated::new(schema.type_name.clone(), values))
}
