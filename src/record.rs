//! Record lifecycle
//!
//! A [`Record`] is a declared type that can read its own fields and build
//! itself from hydrated values. Everything else is provided: schema lookup,
//! hydration, query generation, and the persistence verbs that hand the
//! generated queries to a [`QueryExecutor`].

use std::sync::Arc;

use crate::declaration::{short_type_name, Declare};
use crate::error::{Error, MappingError, RecordNotFound, Result};
use crate::executor::{run, QueryExecutor};
use crate::generator;
use crate::hydrator::{hydrate_record, Hydrated};
use crate::query::{OrderBy, Query};
use crate::registry::SchemaRegistry;
use crate::schema::SchemaDescriptor;
use crate::value::{FieldValue, Filters, RawRecord, Value};

/// Filter key addressing the primary key of any entity
pub const TYPICAL_ID_KEY: &str = "@id";

/// A persistable record type
///
/// Implementors supply two accessors:
///
/// ```text
/// impl Record for Customer {
///     fn field(&self, ident: &str) -> Result<FieldValue> {
///         match ident {
///             "id" => self.id.to_field(),
///             "name" => self.name.to_field(),
///             _ => Err(Self::unknown_field(ident)),
///         }
///     }
///
///     fn construct(fields: &mut Hydrated) -> Result<Self> {
///         Ok(Self {
///             id: fields.take_or_default("id")?,
///             name: fields.take("name")?,
///         })
///     }
/// }
/// ```
pub trait Record: Declare + Sized {
    /// Current value of a mapped field
    fn field(&self, ident: &str) -> Result<FieldValue>;

    /// Assemble an instance from hydrated field values
    fn construct(fields: &mut Hydrated) -> Result<Self>;

    /// The resolved schema, cached process-wide
    fn schema() -> Result<Arc<SchemaDescriptor>> {
        Ok(SchemaRegistry::global().resolve::<Self>()?)
    }

    fn unknown_field(ident: &str) -> Error {
        MappingError::UnreadableField {
            type_name: short_type_name::<Self>().to_string(),
            field: ident.to_string(),
        }
        .into()
    }

    /// Rewrite a raw record before hydration
    fn hydrate_before(raw: RawRecord) -> RawRecord {
        raw
    }

    /// Rewrite an extracted record
    fn extract_after(&self, raw: RawRecord) -> RawRecord {
        raw
    }

    /// Rewrite caller filters before they become conditions
    fn query_filters(filters: Filters) -> Filters {
        filters
    }

    /// Adjust every generated query
    fn after_query_built(_query: &mut Query) {}

    fn count<E: QueryExecutor + ?Sized>(executor: &E, filters: Filters) -> Result<i64> {
        let query = generator::select_count::<Self>(filters)?;
        Ok(run(executor, &query)?.first_column_as_int())
    }

    fn fetch<E: QueryExecutor + ?Sized>(
        executor: &E,
        filters: Filters,
        order_by: Vec<OrderBy>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Self>> {
        let query = generator::select::<Self>(filters, order_by, limit, offset)?;
        run(executor, &query)?
            .into_rows()
            .into_iter()
            .map(hydrate_record)
            .collect()
    }

    fn find_one<E: QueryExecutor + ?Sized>(executor: &E, filters: Filters) -> Result<Option<Self>> {
        let mut found = Self::fetch(executor, filters, Vec::new(), Some(1), None)?;
        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    fn fetch_one<E: QueryExecutor + ?Sized>(executor: &E, filters: Filters) -> Result<Self> {
        match Self::find_one(executor, filters)? {
            Some(record) => Ok(record),
            None => Err(RecordNotFound::entity(Self::schema()?.entity_name.clone()).into()),
        }
    }

    fn find_by_id<E: QueryExecutor + ?Sized>(
        executor: &E,
        id: impl Into<Value>,
    ) -> Result<Option<Self>> {
        let mut filters = Filters::new();
        filters.insert(TYPICAL_ID_KEY.to_string(), id.into());
        Self::find_one(executor, filters)
    }

    fn fetch_by_id<E: QueryExecutor + ?Sized>(executor: &E, id: impl Into<Value>) -> Result<Self> {
        let id = id.into();
        match Self::find_by_id(executor, id.clone())? {
            Some(record) => Ok(record),
            None => Err(RecordNotFound::with_key(
                Self::schema()?.entity_name.clone(),
                TYPICAL_ID_KEY,
                id,
            )
            .into()),
        }
    }

    /// Insert the record, then refresh it from the stored row
    ///
    /// The refresh hydrates an empty record when the executor reports no
    /// written row, so a record with required fields fails with a
    /// decoding error here even though the row was written. On any error
    /// the record keeps its previous values.
    fn insert<E: QueryExecutor + ?Sized>(&mut self, executor: &E) -> Result<&mut Self> {
        let query = generator::insert(&*self)?;
        let stored = run(executor, &query)?.last_row().cloned().unwrap_or_default();
        *self = hydrate_record(stored)?;
        Ok(self)
    }

    /// Update the row matching the primary key; no match is not an error
    fn update<E: QueryExecutor + ?Sized>(&self, executor: &E) -> Result<&Self> {
        let query = generator::update(self)?;
        run(executor, &query)?;
        Ok(self)
    }

    /// Delete the row matching the primary key; no match is not an error
    fn delete<E: QueryExecutor + ?Sized>(&self, executor: &E) -> Result<&Self> {
        let query = generator::delete(self)?;
        run(executor, &query)?;
        Ok(self)
    }
}
