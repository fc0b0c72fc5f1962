//! recordmap
//!
//! Declarative mapping between typed records and storage rows.
//!
//! ## Features
//!
//! - **Declared Schemas**: Record types declare their entity and field mapping once
//! - **Schema Cache**: Resolved schemas are built on first use and shared process-wide
//! - **Hydration**: Storage rows become typed records and back, nested records included
//! - **Query Generation**: Select, count, insert, update and delete statements per record type
//! - **Lifecycle Verbs**: fetch, insert, update and delete through any query executor
//!
//! ## Architecture
//!
//! ```text
//! Declaration ──resolve──▶ SchemaDescriptor (cached in SchemaRegistry)
//!                               │
//!          RawRecord ◀──extract─┼─hydrate──▶ Record
//!                               │
//!                           generator ──▶ Query ──▶ QueryExecutor
//! ```

pub mod checksum;
pub mod config;
pub mod declaration;
pub mod definition;
pub mod encoding;
pub mod error;
pub mod executor;
pub mod field;
pub mod generator;
pub mod hydrator;
pub mod memory;
pub mod query;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod value;

pub use checksum::Checksum;
pub use config::RecordMapConfig;
pub use declaration::{Declaration, DeclaredType, Declare, EntityMap, FieldMap};
pub use definition::{DefinitionKind, TypeDefinition};
pub use error::{
    DecodingError, EncodingError, Error, ExecutorError, HydratorError, MappingError,
    RecordNotFound, Result,
};
pub use executor::{QueryExecutor, QueryResult};
pub use field::FieldType;
pub use hydrator::{extract_record as extract, hydrate_record as hydrate, Hydrate, Hydrated};
pub use memory::MemoryStore;
pub use query::{OrderBy, Query};
pub use record::{Record, TYPICAL_ID_KEY};
pub use registry::SchemaRegistry;
pub use schema::{FieldDescriptor, SchemaDescriptor};
pub use value::{FieldValue, Filters, RawRecord, Value};
