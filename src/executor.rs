//! Query executor contract

use tracing::trace;

use crate::error::{ExecutorError, Result};
use crate::query::Query;
use crate::value::RawRecord;

/// Runs generated queries against a store
pub trait QueryExecutor {
    fn execute(&self, query: &Query) -> std::result::Result<QueryResult, ExecutorError>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for &E {
    fn execute(&self, query: &Query) -> std::result::Result<QueryResult, ExecutorError> {
        (**self).execute(query)
    }
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for Box<E> {
    fn execute(&self, query: &Query) -> std::result::Result<QueryResult, ExecutorError> {
        (**self).execute(query)
    }
}

/// Rows returned by an executor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    rows: Vec<RawRecord>,
    last_row: Option<RawRecord>,
    affected: u64,
}

impl QueryResult {
    pub fn new(rows: Vec<RawRecord>) -> Self {
        Self {
            rows,
            last_row: None,
            affected: 0,
        }
    }

    /// Result of a write reporting the stored row
    pub fn written(row: RawRecord) -> Self {
        Self {
            rows: Vec::new(),
            last_row: Some(row),
            affected: 1,
        }
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn as_rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<RawRecord> {
        self.rows
    }

    /// First column of the first row as an integer; zero when absent
    pub fn first_column_as_int(&self) -> i64 {
        self.rows
            .first()
            .and_then(|row| row.values().next())
            .and_then(|value| value.as_i64())
            .unwrap_or(0)
    }

    /// The row stored by the last write, if the executor reports it
    pub fn last_row(&self) -> Option<&RawRecord> {
        self.last_row.as_ref()
    }

    pub fn affected_rows(&self) -> u64 {
        self.affected
    }
}

/// Hand a query to an executor
pub(crate) fn run<E: QueryExecutor + ?Sized>(executor: &E, query: &Query) -> Result<QueryResult> {
    trace!(kind = query.kind(), entity = query.entity(), query = %query, "executing query");
    Ok(executor.execute(query)?)
}
