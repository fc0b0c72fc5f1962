//! Mapping declarations
//!
//! A record type describes its mapping once by implementing [`Declare`]. The
//! returned [`Declaration`] is the raw input to the resolver: the entity the
//! type maps to, each field with its declared value type and [`FieldMap`]
//! options, and optionally the parent declaration it extends.
//!
//! ```text
//! Declaration::of::<Customer>()
//!     .entity("customer")
//!     .field::<String>("name", FieldMap::new().storage_key("fullName"))
//!     .field::<i64>("id", FieldMap::new().primary_key().hidden())
//! ```

use std::any::TypeId;

use serde::{Serialize, Serializer};

use crate::definition::TypeDefinition;
use crate::field::FieldType;
use crate::hydrator::Hydrate;

/// Types that declare a record mapping
pub trait Declare: 'static {
    fn declaration() -> Declaration;
}

/// Last path segment of a type name, generics included
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

/// Reference to a type with the nested hydration capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecRef {
    pub type_name: &'static str,
    pub type_id: TypeId,
}

impl CodecRef {
    pub fn of<T: Hydrate + 'static>() -> Self {
        Self {
            type_name: short_type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

impl Serialize for CodecRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.type_name)
    }
}

/// The value type a field is declared with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    Null,
    Integer,
    Float,
    String,
    Bool,
    Array,
    Map,
    /// Immutable UTC timestamp
    Timestamp,
    /// A composite record type; `codec` is set when it can hydrate itself
    Record {
        type_name: &'static str,
        codec: Option<CodecRef>,
    },
    Union(Vec<DeclaredType>),
    Intersection(Vec<DeclaredType>),
    Nullable(Box<DeclaredType>),
    /// Anything the mapper has no derivation for
    Other(&'static str),
}

impl DeclaredType {
    /// A composite type that hydrates and extracts itself
    pub fn nested<T: Hydrate + 'static>() -> Self {
        DeclaredType::Record {
            type_name: short_type_name::<T>(),
            codec: Some(CodecRef::of::<T>()),
        }
    }

    /// A composite type without the nested hydration capability
    pub fn opaque_record<T: ?Sized>() -> Self {
        DeclaredType::Record {
            type_name: short_type_name::<T>(),
            codec: None,
        }
    }

    pub fn nullable(self) -> Self {
        match self {
            DeclaredType::Nullable(_) | DeclaredType::Null => self,
            other => DeclaredType::Nullable(Box::new(other)),
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            DeclaredType::Null | DeclaredType::Nullable(_) => true,
            DeclaredType::Union(types) => types.iter().any(DeclaredType::is_nullable),
            _ => false,
        }
    }

    /// The type with any nullable wrapper removed
    pub fn inner(&self) -> &DeclaredType {
        match self {
            DeclaredType::Nullable(inner) => inner.inner(),
            other => other,
        }
    }

    pub fn label(&self) -> String {
        match self {
            DeclaredType::Null => "null".to_string(),
            DeclaredType::Integer => "int".to_string(),
            DeclaredType::Float => "float".to_string(),
            DeclaredType::String => "string".to_string(),
            DeclaredType::Bool => "bool".to_string(),
            DeclaredType::Array => "array".to_string(),
            DeclaredType::Map => "map".to_string(),
            DeclaredType::Timestamp => "timestamp".to_string(),
            DeclaredType::Record { type_name, .. } | DeclaredType::Other(type_name) => {
                type_name.to_string()
            }
            DeclaredType::Union(types) => join_labels(types, "|"),
            DeclaredType::Intersection(types) => join_labels(types, "&"),
            DeclaredType::Nullable(inner) => format!("?{}", inner.label()),
        }
    }
}

fn join_labels(types: &[DeclaredType], separator: &str) -> String {
    types
        .iter()
        .map(DeclaredType::label)
        .collect::<Vec<_>>()
        .join(separator)
}

/// The top-level entity mapping of a record type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityMap {
    pub entity_name: String,
    pub scope: String,
}

impl EntityMap {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            scope: String::new(),
        }
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

impl From<&str> for EntityMap {
    fn from(entity_name: &str) -> Self {
        Self::new(entity_name)
    }
}

/// Per-field mapping options
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldMap {
    /// Storage key override; the field identifier when unset
    pub storage_key: Option<String>,
    pub is_primary_key: bool,
    pub is_hidden: bool,
    pub is_read_only: bool,
    /// Scope override; the entity scope when unset
    pub scope: Option<String>,
    pub encode_key: Option<String>,
    /// Explicit definition; skips derivation from the declared type
    pub definition: Option<TypeDefinition>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn encode_key(mut self, key: impl Into<String>) -> Self {
        self.encode_key = Some(key.into());
        self
    }

    pub fn definition(mut self, definition: TypeDefinition) -> Self {
        self.definition = Some(definition);
        self
    }
}

/// One declared field; `map` is `None` for transient fields
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    pub ident: String,
    pub declared_type: DeclaredType,
    pub map: Option<FieldMap>,
}

/// Everything a record type declares about its mapping
#[derive(Debug, Clone)]
pub struct Declaration {
    pub type_name: &'static str,
    pub entity: Option<EntityMap>,
    pub fields: Vec<FieldDeclaration>,
    pub parent: Option<fn() -> Declaration>,
}

impl Declaration {
    /// Start a declaration for `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_name: short_type_name::<T>(),
            entity: None,
            fields: Vec::new(),
            parent: None,
        }
    }

    pub fn entity(mut self, entity: impl Into<EntityMap>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Map a field whose declared type comes from its Rust type
    pub fn field<F: FieldType>(self, ident: impl Into<String>, map: FieldMap) -> Self {
        self.field_as(ident, F::declared_type(), map)
    }

    /// Map a field with an explicitly declared type
    pub fn field_as(
        mut self,
        ident: impl Into<String>,
        declared_type: DeclaredType,
        map: FieldMap,
    ) -> Self {
        self.fields.push(FieldDeclaration {
            ident: ident.into(),
            declared_type,
            map: Some(map),
        });
        self
    }

    /// Declare a field the mapper ignores
    pub fn transient<F: FieldType>(mut self, ident: impl Into<String>) -> Self {
        self.fields.push(FieldDeclaration {
            ident: ident.into(),
            declared_type: F::declared_type(),
            map: None,
        });
        self
    }

    /// Inherit the fields of `P` that this declaration does not redeclare
    pub fn extends<P: Declare>(mut self) -> Self {
        self.parent = Some(P::declaration);
        self
    }
}
