//! Hydration and extraction
//!
//! Hydration turns a storage-keyed [`RawRecord`] into a typed instance;
//! extraction reads an instance back into one. Both walk the fields of the
//! resolved schema in declaration order.

use indexmap::IndexMap;

use crate::definition::DefinitionKind;
use crate::error::{DecodingError, Error, Result};
use crate::field::FieldType;
use crate::record::Record;
use crate::schema::FieldDescriptor;
use crate::value::{RawRecord, Value};

/// Types that build themselves from a raw record and read back into one
pub trait Hydrate: Sized {
    fn hydrate(raw: RawRecord) -> Result<Self>;

    fn extract(&self) -> Result<RawRecord>;
}

impl<T: Record> Hydrate for T {
    fn hydrate(raw: RawRecord) -> Result<Self> {
        hydrate_record(raw)
    }

    fn extract(&self) -> Result<RawRecord> {
        extract_record(self)
    }
}

/// Coerced field values, keyed by field identifier, awaiting construction
#[derive(Debug, Clone, Default)]
pub struct Hydrated {
    type_name: String,
    values: IndexMap<String, Value>,
}

impl Hydrated {
    pub fn new(type_name: impl Into<String>, values: IndexMap<String, Value>) -> Self {
        Self {
            type_name: type_name.into(),
            values,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Take a field value and convert it; a missing value reads as null
    pub fn take<F: FieldType>(&mut self, ident: &str) -> Result<F> {
        let value = self.values.shift_remove(ident).unwrap_or_default();
        F::from_value(value).map_err(|err| err.in_field(ident))
    }

    /// Like [`take`](Self::take), with the default for a null or missing value
    pub fn take_or_default<F: FieldType + Default>(&mut self, ident: &str) -> Result<F> {
        match self.values.shift_remove(ident) {
            None | Some(Value::Null) => Ok(F::default()),
            Some(value) => F::from_value(value).map_err(|err| err.in_field(ident)),
        }
    }

    /// Take the raw value without conversion
    pub fn take_raw(&mut self, ident: &str) -> Value {
        self.values.shift_remove(ident).unwrap_or_default()
    }

    pub fn contains(&self, ident: &str) -> bool {
        self.values.contains_key(ident)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Build an instance of `T` from a storage-keyed record
pub fn hydrate_record<T: Record>(raw: RawRecord) -> Result<T> {
    let schema = T::schema()?;
    let raw = T::hydrate_before(raw);

    let mut values = IndexMap::with_capacity(schema.fields.len());
    for (ident, field) in &schema.fields {
        let value = raw.get(&field.storage_key).cloned().unwrap_or_default();
        let value = coerce(field, value).map_err(|err| Error::from(err).in_field(ident))?;
        values.insert(ident.clone(), value);
    }

    T::construct(&mut Hydrated::new(schema.type_name.clone(), values))
}

/// Read an instance of `T` into a storage-keyed record
pub fn extract_record<T: Record>(instance: &T) -> Result<RawRecord> {
    let schema = T::schema()?;

    let mut raw = RawRecord::with_capacity(schema.fields.len());
    for (ident, field) in &schema.fields {
        let value = instance.field(ident)?;
        raw.insert(field.storage_key.clone(), value.into_value());
    }

    Ok(instance.extract_after(raw))
}

/// Coerce a raw value according to the field's mapping
fn coerce(field: &FieldDescriptor, value: Value) -> std::result::Result<Value, DecodingError> {
    if field.is_nested() {
        return Ok(match value {
            Value::Null if field.nullable => Value::Null,
            Value::Null => Value::Record(RawRecord::new()),
            other => other,
        });
    }

    let Some(definition) = &field.type_def else {
        return Ok(value);
    };
    if value.is_null() {
        return Ok(value);
    }

    match definition.kind {
        DefinitionKind::Bool => Ok(Value::Bool(value.to_bool())),
        DefinitionKind::Float => match value.as_f64() {
            Some(float) => Ok(Value::Float(float)),
            None => Err(DecodingError::new(
                &definition.name,
                format!("cannot cast {} to float", value.type_name()),
            )),
        },
        DefinitionKind::DateTime { .. } => definition.decode(value),
        _ => Ok(value),
    }
}
