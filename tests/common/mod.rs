//! Shared record types and fixtures for integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use recordmap::{
    nested_field, Declaration, DeclaredType, Declare, EntityMap, FieldMap, FieldType, FieldValue,
    Hydrated, MemoryStore, Query, RawRecord, Record, Result, Value,
};

pub const EXAMPLE: &str = "example";

pub fn ts(text: &str) -> DateTime<Utc> {
    recordmap::definition::parse_datetime(text).unwrap()
}

// =============================================================================
// Example record
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ExampleDto {
    pub name: String,
    pub age: i64,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub id: i64,
}

impl ExampleDto {
    pub fn new(name: &str, age: i64, email: &str) -> Self {
        Self {
            name: name.to_string(),
            age,
            email: email.to_string(),
            created_at: None,
            updated_at: None,
            id: 0,
        }
    }
}

impl Declare for ExampleDto {
    fn declaration() -> Declaration {
        Declaration::of::<ExampleDto>()
            .entity(EXAMPLE)
            .field::<String>("name", FieldMap::new().storage_key("fullName"))
            .field::<i64>("age", FieldMap::new().storage_key("fullAge").encode_key("customerAge"))
            .field::<String>("email", FieldMap::new().encode_key("customerEmail"))
            .field::<Option<DateTime<Utc>>>(
                "created_at",
                FieldMap::new().storage_key("createdAt").encode_key("createdAt"),
            )
            .field::<Option<DateTime<Utc>>>(
                "updated_at",
                FieldMap::new().storage_key("updatedAt").encode_key("updatedAt"),
            )
            .field::<i64>("id", FieldMap::new().primary_key().hidden())
    }
}

impl Record for ExampleDto {
    fn field(&self, ident: &str) -> Result<FieldValue> {
        match ident {
            "name" => self.name.to_field(),
            "age" => self.age.to_field(),
            "email" => self.email.to_field(),
            "created_at" => self.created_at.to_field(),
            "updated_at" => self.updated_at.to_field(),
            "id" => self.id.to_field(),
            _ => Err(Self::unknown_field(ident)),
        }
    }

    fn construct(fields: &mut Hydrated) -> Result<Self> {
        Ok(Self {
            name: fields.take("name")?,
            age: fields.take("age")?,
            email: fields.take("email")?,
            created_at: fields.take("created_at")?,
            updated_at: fields.take("updated_at")?,
            id: fields.take_or_default("id")?,
        })
    }
}

pub fn example_row(
    name: &str,
    age: i64,
    email: &str,
    created_at: &str,
    updated_at: &str,
) -> RawRecord {
    let mut row = RawRecord::new();
    row.insert("fullName".to_string(), Value::from(name));
    row.insert("fullAge".to_string(), Value::Int(age));
    row.insert("email".to_string(), Value::from(email));
    row.insert("createdAt".to_string(), Value::Timestamp(ts(created_at)));
    row.insert("updatedAt".to_string(), Value::Timestamp(ts(updated_at)));
    row
}

pub fn example_rows() -> Vec<RawRecord> {
    vec![
        example_row(
            "John Doe",
            18,
            "test-email@mydomain.com",
            "2021-01-01 00:10:00",
            "2021-02-01 00:20:00",
        ),
        example_row(
            "Alice Doe",
            19,
            "xxx-email@mydomain.com",
            "2022-01-01 00:30:00",
            "2022-02-01 00:40:00",
        ),
        example_row(
            "Clark Doe",
            78,
            "clack@mydomain.net",
            "2023-11-30 00:21:00",
            "2024-12-29 00:22:00",
        ),
    ]
}

/// Memory store holding the three example rows with ids 1..=3
pub fn example_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.define_table(EXAMPLE, "id");
    store.seed(EXAMPLE, example_rows()).unwrap();
    store
}

// =============================================================================
// Nested records
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
}

impl Declare for Address {
    fn declaration() -> Declaration {
        Declaration::of::<Address>()
            .entity("address")
            .field::<String>("street", FieldMap::new())
            .field::<String>("city", FieldMap::new().storage_key("cityName"))
    }
}

impl Record for Address {
    fn field(&self, ident: &str) -> Result<FieldValue> {
        match ident {
            "street" => self.street.to_field(),
            "city" => self.city.to_field(),
            _ => Err(Self::unknown_field(ident)),
        }
    }

    fn construct(fields: &mut Hydrated) -> Result<Self> {
        Ok(Self {
            street: fields.take("street")?,
            city: fields.take("city")?,
        })
    }
}

/// Nested record whose fields all have defaults
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Preferences {
    pub theme: String,
    pub newsletter: bool,
}

impl Declare for Preferences {
    fn declaration() -> Declaration {
        Declaration::of::<Preferences>()
            .entity("preferences")
            .field::<String>("theme", FieldMap::new())
            .field::<bool>("newsletter", FieldMap::new())
    }
}

impl Record for Preferences {
    fn field(&self, ident: &str) -> Result<FieldValue> {
        match ident {
            "theme" => self.theme.to_field(),
            "newsletter" => self.newsletter.to_field(),
            _ => Err(Self::unknown_field(ident)),
        }
    }

    fn construct(fields: &mut Hydrated) -> Result<Self> {
        Ok(Self {
            theme: fields.take_or_default("theme")?,
            newsletter: fields.take_or_default("newsletter")?,
        })
    }
}

nested_field!(Address, Preferences);

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub address: Address,
    pub shipping: Option<Address>,
    pub preferences: Preferences,
    pub tags: Vec<String>,
    pub score: f64,
}

impl Declare for Profile {
    fn declaration() -> Declaration {
        Declaration::of::<Profile>()
            .entity("profile")
            .field::<i64>("id", FieldMap::new().primary_key())
            .field::<Address>("address", FieldMap::new())
            .field::<Option<Address>>("shipping", FieldMap::new())
            .field::<Preferences>("preferences", FieldMap::new())
            .field::<Vec<String>>("tags", FieldMap::new())
            .field::<f64>("score", FieldMap::new())
    }
}

impl Record for Profile {
    fn field(&self, ident: &str) -> Result<FieldValue> {
        match ident {
            "id" => self.id.to_field(),
            "address" => self.address.to_field(),
            "shipping" => self.shipping.to_field(),
            "preferences" => self.preferences.to_field(),
            "tags" => self.tags.to_field(),
            "score" => self.score.to_field(),
            _ => Err(Self::unknown_field(ident)),
        }
    }

    fn construct(fields: &mut Hydrated) -> Result<Self> {
        Ok(Self {
            id: fields.take_or_default("id")?,
            address: fields.take("address")?,
            shipping: fields.take("shipping")?,
            preferences: fields.take("preferences")?,
            tags: fields.take_or_default("tags")?,
            score: fields.take_or_default("score")?,
        })
    }
}

// =============================================================================
// Inheritance
// =============================================================================

pub struct BaseEntity;

impl Declare for BaseEntity {
    fn declaration() -> Declaration {
        Declaration::of::<BaseEntity>()
            .entity("base")
            .field::<i64>("id", FieldMap::new().primary_key().read_only())
            .field::<String>("label", FieldMap::new().storage_key("baseLabel"))
            .field::<Option<DateTime<Utc>>>("created_at", FieldMap::new().storage_key("createdAt"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: i64,
    pub label: String,
    pub title: String,
    pub cached_slug: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Declare for Article {
    fn declaration() -> Declaration {
        Declaration::of::<Article>()
            .entity(EntityMap::new("article").scope("content"))
            .field::<String>("label", FieldMap::new().storage_key("articleLabel"))
            .field::<String>("title", FieldMap::new().scope("meta"))
            .transient::<String>("cached_slug")
            .extends::<BaseEntity>()
    }
}

impl Record for Article {
    fn field(&self, ident: &str) -> Result<FieldValue> {
        match ident {
            "id" => self.id.to_field(),
            "label" => self.label.to_field(),
            "title" => self.title.to_field(),
            "created_at" => self.created_at.to_field(),
            _ => Err(Self::unknown_field(ident)),
        }
    }

    fn construct(fields: &mut Hydrated) -> Result<Self> {
        Ok(Self {
            id: fields.take_or_default("id")?,
            label: fields.take("label")?,
            title: fields.take("title")?,
            cached_slug: String::new(),
            created_at: fields.take("created_at")?,
        })
    }
}

// =============================================================================
// Hooks
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Tenanted {
    pub id: i64,
    pub name: String,
}

impl Declare for Tenanted {
    fn declaration() -> Declaration {
        Declaration::of::<Tenanted>()
            .entity("tenanted")
            .field::<i64>("id", FieldMap::new().primary_key())
            .field::<String>("name", FieldMap::new())
    }
}

impl Record for Tenanted {
    fn field(&self, ident: &str) -> Result<FieldValue> {
        match ident {
            "id" => self.id.to_field(),
            "name" => self.name.to_field(),
            _ => Err(Self::unknown_field(ident)),
        }
    }

    fn construct(fields: &mut Hydrated) -> Result<Self> {
        Ok(Self {
            id: fields.take_or_default("id")?,
            name: fields.take("name")?,
        })
    }

    fn hydrate_before(mut raw: RawRecord) -> RawRecord {
        if let Some(legacy) = raw.shift_remove("legacy_name") {
            raw.entry("name".to_string()).or_insert(legacy);
        }
        raw
    }

    fn extract_after(&self, mut raw: RawRecord) -> RawRecord {
        raw.insert("tenant".to_string(), Value::Int(1));
        raw
    }

    fn query_filters(mut filters: recordmap::Filters) -> recordmap::Filters {
        filters.insert("tenant".to_string(), Value::Int(1));
        filters
    }

    fn after_query_built(query: &mut Query) {
        if let Query::Select(select) = query {
            select.order_by.push(recordmap::OrderBy::asc("id"));
        }
    }
}

// =============================================================================
// Defective declarations
// =============================================================================

pub struct Unmapped;

impl Declare for Unmapped {
    fn declaration() -> Declaration {
        Declaration::of::<Unmapped>().field::<i64>("id", FieldMap::new())
    }
}

pub struct WithUnion;

impl Declare for WithUnion {
    fn declaration() -> Declaration {
        Declaration::of::<WithUnion>().entity("with_union").field_as(
            "value",
            DeclaredType::Union(vec![DeclaredType::Integer, DeclaredType::String]),
            FieldMap::new(),
        )
    }
}

pub struct WithIntersection;

impl Declare for WithIntersection {
    fn declaration() -> Declaration {
        Declaration::of::<WithIntersection>()
            .entity("with_intersection")
            .field_as(
                "value",
                DeclaredType::Intersection(vec![
                    DeclaredType::Other("Countable"),
                    DeclaredType::Other("Traversable"),
                ]),
                FieldMap::new(),
            )
    }
}

/// Union allowed once an explicit definition is supplied
pub struct WithDefinedUnion;

impl Declare for WithDefinedUnion {
    fn declaration() -> Declaration {
        Declaration::of::<WithDefinedUnion>()
            .entity("with_defined_union")
            .field_as(
                "value",
                DeclaredType::Union(vec![DeclaredType::Integer, DeclaredType::String]),
                FieldMap::new().definition(recordmap::TypeDefinition::string("value")),
            )
    }
}

pub struct Connection;

pub struct WithOpaqueRecord;

impl Declare for WithOpaqueRecord {
    fn declaration() -> Declaration {
        Declaration::of::<WithOpaqueRecord>()
            .entity("with_opaque")
            .field_as("connection", DeclaredType::opaque_record::<Connection>(), FieldMap::new())
    }
}

pub struct WithUnknownType;

impl Declare for WithUnknownType {
    fn declaration() -> Declaration {
        Declaration::of::<WithUnknownType>()
            .entity("with_unknown")
            .field_as("handle", DeclaredType::Other("Resource"), FieldMap::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyless {
    pub name: String,
    pub payload: Value,
}

impl Declare for Keyless {
    fn declaration() -> Declaration {
        Declaration::of::<Keyless>()
            .entity("keyless")
            .field::<String>("name", FieldMap::new())
            .field_as("payload", DeclaredType::String, FieldMap::new())
    }
}

impl Record for Keyless {
    fn field(&self, ident: &str) -> Result<FieldValue> {
        match ident {
            "name" => self.name.to_field(),
            "payload" => Ok(FieldValue::Plain(self.payload.clone())),
            _ => Err(Self::unknown_field(ident)),
        }
    }

    fn construct(fields: &mut Hydrated) -> Result<Self> {
        Ok(Self {
            name: fields.take("name")?,
            payload: fields.take_raw("payload"),
        })
    }
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0).unwrap()
}
