//! Query generation
//!
//! Builds [`Query`] values from a record type's schema. Every builder passes
//! its result through [`Record::after_query_built`] before returning it.

use crate::error::{HydratorError, MappingError, Result};
use crate::query::{
    Assignment, Column, ColumnRef, Condition, Count, Delete, Insert, Limit, OrderBy, Query, Select,
    Update,
};
use crate::record::Record;
use crate::schema::SchemaDescriptor;
use crate::value::{FieldValue, Filters, Value};

/// One column per field, returned under its storage key
pub fn select_columns(schema: &SchemaDescriptor) -> Vec<ColumnRef> {
    schema
        .fields
        .values()
        .map(|field| ColumnRef {
            column: schema.column(field),
            alias: field.storage_key.clone(),
        })
        .collect()
}

/// One equality condition per filter; keys are passed through unchecked
pub fn filters_from_map(filters: Filters) -> Vec<Condition> {
    filters
        .into_iter()
        .map(|(key, value)| Condition::equal(Column::new(key), value))
        .collect()
}

/// Column assignments for an insert or, with `for_update`, an update
pub fn assigns_for_write<T: Record>(
    instance: &T,
    schema: &SchemaDescriptor,
    for_update: bool,
) -> Result<Vec<Assignment>> {
    let mut assignments = Vec::with_capacity(schema.fields.len());

    for (ident, field) in &schema.fields {
        if field.is_read_only || (for_update && field.is_primary_key) {
            continue;
        }

        let value = match instance.field(ident)? {
            FieldValue::Plain(value) if field.is_primary_key && value.is_empty() => continue,
            FieldValue::Plain(value) if value.is_null() || value.is_scalar() => value,
            FieldValue::Plain(value) => {
                return Err(HydratorError::UnsupportedAssignValue {
                    type_name: schema.type_name.clone(),
                    field: ident.clone(),
                    value_type: value.type_name().to_string(),
                }
                .into())
            }
            FieldValue::Nested(record) => Value::Record(record),
            FieldValue::Serialized(value) => value,
        };

        assignments.push(Assignment {
            column: schema.column(field),
            value,
        });
    }

    Ok(assignments)
}

/// Equality on the first primary-key field
pub fn primary_key_condition<T: Record>(
    instance: &T,
    schema: &SchemaDescriptor,
) -> Result<Condition> {
    let (ident, field) = schema.primary_key().ok_or_else(|| MappingError::NoPrimaryKey {
        type_name: schema.type_name.clone(),
    })?;
    let value = instance.field(ident)?.into_value();
    Ok(Condition::equal(schema.column(field), value))
}

fn finish<T: Record>(mut query: Query) -> Query {
    T::after_query_built(&mut query);
    query
}

pub fn select<T: Record>(
    filters: Filters,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
) -> Result<Query> {
    let schema = T::schema()?;
    Ok(finish::<T>(Query::Select(Select {
        entity: schema.entity_name.clone(),
        columns: select_columns(&schema),
        conditions: filters_from_map(T::query_filters(filters)),
        order_by,
        limit: Limit::new(limit, offset),
    })))
}

pub fn select_count<T: Record>(filters: Filters) -> Result<Query> {
    let schema = T::schema()?;
    Ok(finish::<T>(Query::Count(Count {
        entity: schema.entity_name.clone(),
        conditions: filters_from_map(T::query_filters(filters)),
    })))
}

pub fn insert<T: Record>(instance: &T) -> Result<Query> {
    let schema = T::schema()?;
    Ok(finish::<T>(Query::Insert(Insert {
        entity: schema.entity_name.clone(),
        assignments: assigns_for_write(instance, &schema, false)?,
    })))
}

pub fn update<T: Record>(instance: &T) -> Result<Query> {
    let schema = T::schema()?;
    let condition = primary_key_condition(instance, &schema)?;
    Ok(finish::<T>(Query::Update(Update {
        entity: schema.entity_name.clone(),
        conditions: vec![condition],
        assignments: assigns_for_write(instance, &schema, true)?,
        limit: Limit::one(),
    })))
}

pub fn delete<T: Record>(instance: &T) -> Result<Query> {
    let schema = T::schema()?;
    let condition = primary_key_condition(instance, &schema)?;
    Ok(finish::<T>(Query::Delete(Delete {
        entity: schema.entity_name.clone(),
        conditions: vec![condition],
        limit: Limit::one(),
    })))
}
