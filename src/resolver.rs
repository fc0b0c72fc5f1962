//! Schema resolution
//!
//! Turns a [`Declaration`] into a [`SchemaDescriptor`]. Fields declared on the
//! type come first in declaration order, followed by inherited fields whose
//! identifiers the type did not claim. Fields without a mapping are skipped.

use indexmap::IndexMap;

use crate::declaration::{DeclaredType, Declaration, EntityMap, FieldDeclaration, FieldMap};
use crate::definition::{DefinitionKind, TypeDefinition};
use crate::error::MappingError;
use crate::schema::{FieldDescriptor, SchemaDescriptor};

/// Resolve a declaration, including everything it inherits
pub fn resolve_declaration(declaration: &Declaration) -> Result<SchemaDescriptor, MappingError> {
    let type_name = declaration.type_name;
    let entity = declaration
        .entity
        .as_ref()
        .ok_or_else(|| MappingError::MissingSchemaDeclaration {
            type_name: type_name.to_string(),
        })?;

    let mut fields = IndexMap::new();
    collect_fields(declaration, type_name, entity, &mut fields)?;

    Ok(SchemaDescriptor {
        type_name: type_name.to_string(),
        entity_name: entity.entity_name.clone(),
        scope: entity.scope.clone(),
        fields,
    })
}

fn collect_fields(
    declaration: &Declaration,
    type_name: &str,
    entity: &EntityMap,
    fields: &mut IndexMap<String, FieldDescriptor>,
) -> Result<(), MappingError> {
    for field in &declaration.fields {
        if fields.contains_key(&field.ident) {
            continue;
        }
        let Some(map) = &field.map else {
            continue;
        };
        let descriptor = resolve_field(type_name, entity, field, map)?;
        fields.insert(field.ident.clone(), descriptor);
    }

    match declaration.parent {
        Some(parent) => collect_fields(&parent(), type_name, entity, fields),
        None => Ok(()),
    }
}

fn resolve_field(
    type_name: &str,
    entity: &EntityMap,
    field: &FieldDeclaration,
    map: &FieldMap,
) -> Result<FieldDescriptor, MappingError> {
    let nested_codec = match field.declared_type.inner() {
        DeclaredType::Record { codec: Some(codec), .. } => Some(*codec),
        DeclaredType::Record { codec: None, .. } => {
            return Err(MappingError::MissingHydratorCapability {
                type_name: type_name.to_string(),
                field: field.ident.clone(),
                field_type: field.declared_type.label(),
            })
        }
        _ => None,
    };

    let type_def = if map.is_hidden || nested_codec.is_some() {
        None
    } else if let Some(definition) = &map.definition {
        Some(definition.clone())
    } else {
        Some(derive_definition(type_name, field, map.encode_key.clone())?)
    };

    let scope = map
        .scope
        .clone()
        .filter(|scope| !scope.is_empty())
        .unwrap_or_else(|| entity.scope.clone());

    Ok(FieldDescriptor {
        storage_key: map.storage_key.clone().unwrap_or_else(|| field.ident.clone()),
        is_primary_key: map.is_primary_key,
        is_hidden: map.is_hidden,
        is_read_only: map.is_read_only,
        scope,
        encode_key: map.encode_key.clone(),
        nested_codec,
        type_def,
        nullable: field.declared_type.is_nullable(),
    })
}

/// Derive a type definition from a declared field type
pub fn derive_definition(
    type_name: &str,
    field: &FieldDeclaration,
    encode_key: Option<String>,
) -> Result<TypeDefinition, MappingError> {
    let declared = &field.declared_type;
    let kind = match declared.inner() {
        DeclaredType::Null => DefinitionKind::Null,
        DeclaredType::Integer => DefinitionKind::Integer,
        DeclaredType::Float => DefinitionKind::Float,
        DeclaredType::String => DefinitionKind::String,
        DeclaredType::Bool => DefinitionKind::Bool,
        DeclaredType::Array | DeclaredType::Map => DefinitionKind::Json,
        DeclaredType::Timestamp => DefinitionKind::DateTime { immutable: true },
        DeclaredType::Union(_) => {
            return Err(MappingError::UnsupportedUnionType {
                type_name: type_name.to_string(),
                field: field.ident.clone(),
            })
        }
        DeclaredType::Intersection(_) => {
            return Err(MappingError::UnsupportedIntersectionType {
                type_name: type_name.to_string(),
                field: field.ident.clone(),
            })
        }
        DeclaredType::Record { .. } | DeclaredType::Other(_) | DeclaredType::Nullable(_) => {
            return Err(MappingError::UnknownFieldType {
                type_name: type_name.to_string(),
                field: field.ident.clone(),
                field_type: declared.label(),
            })
        }
    };

    Ok(TypeDefinition::new(field.ident.clone(), kind)
        .with_nullable(declared.is_nullable())
        .with_encode_key(encode_key))
}
