//! Resolved schema descriptors

use indexmap::IndexMap;
use serde::Serialize;

use crate::checksum::Checksum;
use crate::declaration::CodecRef;
use crate::definition::{DefinitionKind, TypeDefinition};
use crate::error::EncodingError;
use crate::query::Column;

/// Resolved mapping of a single field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    /// Key under which the value is stored
    pub storage_key: String,
    pub is_primary_key: bool,
    /// Excluded from derived definitions and external encodings
    pub is_hidden: bool,
    /// Never written by insert or update
    pub is_read_only: bool,
    /// Scope qualifying the column
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encode_key: Option<String>,
    /// Set when the value is a nested record that hydrates itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_codec: Option<CodecRef>,
    /// Absent for hidden and nested fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_def: Option<TypeDefinition>,
    pub nullable: bool,
}

impl FieldDescriptor {
    pub fn is_nested(&self) -> bool {
        self.nested_codec.is_some()
    }

    pub fn definition_kind(&self) -> Option<&DefinitionKind> {
        self.type_def.as_ref().map(|def| &def.kind)
    }
}

/// Resolved mapping of a record type, cached once per type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDescriptor {
    pub type_name: String,
    pub entity_name: String,
    pub scope: String,
    /// Keyed by field identifier, in declaration order
    pub fields: IndexMap<String, FieldDescriptor>,
}

impl SchemaDescriptor {
    pub fn field(&self, ident: &str) -> Option<&FieldDescriptor> {
        self.fields.get(ident)
    }

    /// The first field flagged as primary key
    pub fn primary_key(&self) -> Option<(&str, &FieldDescriptor)> {
        self.fields
            .iter()
            .find(|(_, field)| field.is_primary_key)
            .map(|(ident, field)| (ident.as_str(), field))
    }

    /// Fields included in external encodings
    pub fn visible_fields(&self) -> impl Iterator<Item = (&String, &FieldDescriptor)> {
        self.fields.iter().filter(|(_, field)| !field.is_hidden)
    }

    /// Column of a field, qualified by its scope or the entity name
    pub fn column(&self, field: &FieldDescriptor) -> Column {
        let scope = if field.scope.is_empty() {
            self.entity_name.clone()
        } else {
            field.scope.clone()
        };
        Column::scoped(field.storage_key.clone(), scope)
    }

    /// Stable digest of the resolved mapping
    pub fn fingerprint(&self) -> Result<Checksum, EncodingError> {
        Checksum::of(self).map_err(|e| EncodingError::new(&self.type_name, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(storage_key: &str, scope: &str) -> FieldDescriptor {
        FieldDescriptor {
            storage_key: storage_key.to_string(),
            is_primary_key: false,
            is_hidden: false,
            is_read_only: false,
            scope: scope.to_string(),
            encode_key: None,
            nested_codec: None,
            type_def: Some(TypeDefinition::string(storage_key)),
            nullable: false,
        }
    }

    fn sample() -> SchemaDescriptor {
        let mut fields = IndexMap::new();
        fields.insert("name".to_string(), descriptor("fullName", ""));
        let mut id = descriptor("id", "main");
        id.is_primary_key = true;
        id.is_hidden = true;
        fields.insert("id".to_string(), id);

        SchemaDescriptor {
            type_name: "Sample".to_string(),
            entity_name: "sample".to_string(),
            scope: String::new(),
            fields,
        }
    }

    #[test]
    fn test_column_scope_falls_back_to_entity() {
        let schema = sample();
        let name = schema.field("name").unwrap();
        assert_eq!(schema.column(name), Column::scoped("fullName", "sample"));
        let id = schema.field("id").unwrap();
        assert_eq!(schema.column(id), Column::scoped("id", "main"));
    }

    #[test]
    fn test_primary_key_and_visibility() {
        let schema = sample();
        assert_eq!(schema.primary_key().map(|(ident, _)| ident), Some("id"));
        let visible: Vec<_> = schema.visible_fields().map(|(ident, _)| ident.as_str()).collect();
        assert_eq!(visible, vec!["name"]);
    }

    #[test]
    fn test_fingerprint_tracks_changes() {
        let schema = sample();
        let mut changed = sample();
        changed.entity_name = "other".to_string();
        assert_eq!(schema.fingerprint().unwrap(), sample().fingerprint().unwrap());
        assert_ne!(schema.fingerprint().unwrap(), changed.fingerprint().unwrap());
    }
}
