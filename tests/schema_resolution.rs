//! Schema resolution and caching

mod common;

use std::sync::Arc;
use std::thread;

use common::*;
use recordmap::{
    DefinitionKind, MappingError, Record, SchemaRegistry, TypeDefinition,
};

// =============================================================================
// Descriptor contents
// =============================================================================

#[test]
fn test_example_descriptor() {
    let registry = SchemaRegistry::new();
    let schema = registry.resolve::<ExampleDto>().unwrap();

    assert_eq!(schema.entity_name, "example");
    assert_eq!(schema.type_name, "ExampleDto");
    let idents: Vec<_> = schema.fields.keys().map(String::as_str).collect();
    assert_eq!(idents, vec!["name", "age", "email", "created_at", "updated_at", "id"]);

    let name = schema.field("name").unwrap();
    assert_eq!(name.storage_key, "fullName");
    assert_eq!(name.type_def.as_ref().unwrap().kind, DefinitionKind::String);

    let age = schema.field("age").unwrap();
    assert_eq!(age.storage_key, "fullAge");
    assert_eq!(age.encode_key.as_deref(), Some("customerAge"));
    assert_eq!(age.type_def.as_ref().unwrap().external_key(), "customerAge");

    let created = schema.field("created_at").unwrap();
    let def = created.type_def.as_ref().unwrap();
    assert_eq!(def.kind, DefinitionKind::DateTime { immutable: true });
    assert!(def.nullable);

    let id = schema.field("id").unwrap();
    assert!(id.is_primary_key);
    assert!(id.is_hidden);
    assert!(id.type_def.is_none());
}

#[test]
fn test_every_field_has_one_capability() {
    let registry = SchemaRegistry::new();
    for schema in [
        registry.resolve::<ExampleDto>().unwrap(),
        registry.resolve::<Profile>().unwrap(),
        registry.resolve::<Article>().unwrap(),
    ] {
        for (ident, field) in &schema.fields {
            let capabilities = [
                field.nested_codec.is_some(),
                field.type_def.is_some(),
                field.is_hidden,
            ]
            .iter()
                .filter(|set| **set)
                .count();
            assert_eq!(capabilities, 1, "{}.{}", schema.type_name, ident);
        }
    }
}

#[test]
fn test_nested_fields_carry_codec() {
    let registry = SchemaRegistry::new();
    let schema = registry.resolve::<Profile>().unwrap();

    let address = schema.field("address").unwrap();
    assert_eq!(address.nested_codec.unwrap().type_name, "Address");
    assert!(!address.nullable);

    let shipping = schema.field("shipping").unwrap();
    assert!(shipping.is_nested());
    assert!(shipping.nullable);

    let tags = schema.field("tags").unwrap();
    assert_eq!(tags.definition_kind(), Some(&DefinitionKind::Json));
}

// =============================================================================
// Inheritance and scopes
// =============================================================================

#[test]
fn test_subtype_shadows_inherited_fields() {
    let registry = SchemaRegistry::new();
    let schema = registry.resolve::<Article>().unwrap();

    let idents: Vec<_> = schema.fields.keys().map(String::as_str).collect();
    assert_eq!(idents, vec!["label", "title", "id", "created_at"]);
    assert_eq!(schema.field("label").unwrap().storage_key, "articleLabel");
    assert!(schema.field("cached_slug").is_none());
    assert!(schema.field("id").unwrap().is_read_only);
}

#[test]
fn test_scope_override_and_fallback() {
    let registry = SchemaRegistry::new();
    let schema = registry.resolve::<Article>().unwrap();

    assert_eq!(schema.scope, "content");
    assert_eq!(schema.field("title").unwrap().scope, "meta");
    assert_eq!(schema.field("id").unwrap().scope, "content");

    let example = registry.resolve::<ExampleDto>().unwrap();
    let name = example.field("name").unwrap();
    assert_eq!(name.scope, "");
    assert_eq!(example.column(name).scope.as_deref(), Some("example"));
}

// =============================================================================
// Cache behavior
// =============================================================================

#[test]
fn test_resolution_is_idempotent() {
    let registry = SchemaRegistry::new();
    let first = registry.resolve::<ExampleDto>().unwrap();
    let second = registry.resolve::<ExampleDto>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
}

#[test]
fn test_concurrent_first_resolution_shares_instance() {
    let registry = SchemaRegistry::new();

    let resolved: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| registry.resolve::<ExampleDto>().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let stored = registry.resolve::<ExampleDto>().unwrap();
    for schema in &resolved {
        assert!(Arc::ptr_eq(schema, &stored));
    }
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_global_registry_backs_records() {
    let schema = ExampleDto::schema().unwrap();
    let again = SchemaRegistry::global().resolve::<ExampleDto>().unwrap();
    assert!(Arc::ptr_eq(&schema, &again));
}

#[test]
fn test_registry_lists_schemas() {
    let registry = SchemaRegistry::new();
    registry.resolve::<Profile>().unwrap();
    registry.resolve::<ExampleDto>().unwrap();

    let names: Vec<_> = registry.schemas().iter().map(|s| s.type_name.clone()).collect();
    assert_eq!(names, vec!["ExampleDto".to_string(), "Profile".to_string()]);
}

// =============================================================================
// Declaration defects
// =============================================================================

#[test]
fn test_missing_entity_map() {
    let err = SchemaRegistry::new().resolve::<Unmapped>().unwrap_err();
    assert!(matches!(err, MappingError::MissingSchemaDeclaration { .. }));
}

#[test]
fn test_union_and_intersection_rejected() {
    let registry = SchemaRegistry::new();
    match registry.resolve::<WithUnion>() {
        Err(MappingError::UnsupportedUnionType { field, .. }) => assert_eq!(field, "value"),
        other => panic!("Expected union error, got {:?}", other),
    }
    assert!(matches!(
        registry.resolve::<WithIntersection>(),
        Err(MappingError::UnsupportedIntersectionType { .. })
    ));
    assert!(registry.is_empty());
}

#[test]
fn test_explicit_definition_skips_derivation() {
    let schema = SchemaRegistry::new().resolve::<WithDefinedUnion>().unwrap();
    assert_eq!(
        schema.field("value").unwrap().type_def,
        Some(TypeDefinition::string("value"))
    );
}

#[test]
fn test_record_without_hydrator() {
    match SchemaRegistry::new().resolve::<WithOpaqueRecord>() {
        Err(MappingError::MissingHydratorCapability { field, field_type, .. }) => {
            assert_eq!(field, "connection");
            assert_eq!(field_type, "Connection");
        }
        other => panic!("Expected missing hydrator, got {:?}", other),
    }
}

#[test]
fn test_unknown_type() {
    let err = SchemaRegistry::new().resolve::<WithUnknownType>().unwrap_err();
    assert_eq!(
        err.to_string(),
        "The field WithUnknownType.handle has unknown type Resource"
    );
}
