//! In-memory query executor
//!
//! Keeps one table per entity and answers the statements the generator
//! produces. Conditions are equality only; a column named with the `@`
//! prefix is a typical name, and `@id` resolves to the table's primary key.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::ExecutorError;
use crate::executor::{QueryExecutor, QueryResult};
use crate::query::{Assignment, Column, Condition, Direction, Limit, Query};
use crate::value::{RawRecord, Value};

const TYPICAL_PREFIX: char = '@';

#[derive(Debug)]
struct Table {
    primary_key: String,
    next_id: i64,
    rows: Vec<RawRecord>,
}

impl Table {
    fn new(primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            next_id: 1,
            rows: Vec::new(),
        }
    }

    fn column_name<'a>(&'a self, column: &'a Column) -> &'a str {
        match column.name.strip_prefix(TYPICAL_PREFIX) {
            Some("id") => &self.primary_key,
            Some(name) => name,
            None => &column.name,
        }
    }

    fn matches(&self, row: &RawRecord, conditions: &[Condition]) -> bool {
        conditions.iter().all(|condition| match condition {
            Condition::Equal { column, value } => row
                .get(self.column_name(column))
                .unwrap_or(&Value::Null)
                .loosely_equals(value),
        })
    }

    fn matching(&self, conditions: &[Condition], limit: &Limit) -> Vec<usize> {
        let positions = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| self.matches(row, conditions))
            .map(|(pos, _)| pos);
        window(positions, limit)
    }

    /// Assign the primary key when the row does not carry one
    fn store(&mut self, mut row: RawRecord) -> Result<RawRecord, ExecutorError> {
        let current = row.get(&self.primary_key).cloned().unwrap_or_default();
        if current.is_empty() {
            let following = self.next_id.checked_add(1).ok_or_else(|| {
                ExecutorError::new(format!(
                    "primary key sequence for '{}' is exhausted",
                    self.primary_key
                ))
            })?;
            row.insert(self.primary_key.clone(), Value::Int(self.next_id));
            self.next_id = following;
        } else if let Some(id) = current.as_i64() {
            self.next_id = self.next_id.max(id.saturating_add(1));
        }
        self.rows.push(row.clone());
        Ok(row)
    }
}

fn window<T>(items: impl Iterator<Item = T>, limit: &Limit) -> Vec<T> {
    let skipped = items.skip(limit.offset as usize);
    if limit.limit == 0 {
        skipped.collect()
    } else {
        skipped.take(limit.limit as usize).collect()
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn apply(row: &mut RawRecord, assignments: &[Assignment]) {
    for assignment in assignments {
        row.insert(assignment.column.name.clone(), assignment.value.clone());
    }
}

/// Executor backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table, replacing any existing one
    pub fn define_table(&self, entity: impl Into<String>, primary_key: impl Into<String>) {
        let entity = entity.into();
        debug!(entity = %entity, "defining table");
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity, Table::new(primary_key));
    }

    /// Add rows to a table; rows without a primary key get one assigned
    pub fn seed(
        &self,
        entity: &str,
        rows: impl IntoIterator<Item = RawRecord>,
    ) -> Result<usize, ExecutorError> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table = tables
            .get_mut(entity)
            .ok_or_else(|| ExecutorError::new(format!("unknown entity '{}'", entity)))?;
        let mut count = 0;
        for row in rows {
            table.store(row)?;
            count += 1;
        }
        debug!(entity = %entity, rows = count, "seeded table");
        Ok(count)
    }

    /// Snapshot of a table's rows
    pub fn rows(&self, entity: &str) -> Vec<RawRecord> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity)
            .map(|table| table.rows.clone())
            .unwrap_or_default()
    }
}

impl QueryExecutor for MemoryStore {
    fn execute(&self, query: &Query) -> Result<QueryResult, ExecutorError> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table = tables
            .get_mut(query.entity())
            .ok_or_else(|| ExecutorError::new(format!("unknown entity '{}'", query.entity())))?;

        match query {
            Query::Select(select) => {
                let mut matched: Vec<&RawRecord> = table
                    .rows
                    .iter()
                    .filter(|row| table.matches(row, &select.conditions))
                    .collect();

                for order in select.order_by.iter().rev() {
                    let name = table.column_name(&order.column);
                    matched.sort_by(|a, b| {
                        let ordering = compare_values(
                            a.get(name).unwrap_or(&Value::Null),
                            b.get(name).unwrap_or(&Value::Null),
                        );
                        match order.direction {
                            Direction::Asc => ordering,
                            Direction::Desc => ordering.reverse(),
                        }
                    });
                }

                let rows = window(matched.into_iter(), &select.limit)
                    .into_iter()
                    .map(|row| {
                        if select.columns.is_empty() {
                            return row.clone();
                        }
                        select
                            .columns
                            .iter()
                            .map(|column| {
                                let value = row
                                    .get(table.column_name(&column.column))
                                    .cloned()
                                    .unwrap_or_default();
                                (column.alias.clone(), value)
                            })
                            .collect()
                    })
                    .collect();
                Ok(QueryResult::new(rows))
            }
            Query::Count(count) => {
                let total = table
                    .rows
                    .iter()
                    .filter(|row| table.matches(row, &count.conditions))
                    .count();
                let mut row = RawRecord::new();
                row.insert("count".to_string(), Value::Int(total as i64));
                Ok(QueryResult::new(vec![row]))
            }
            Query::Insert(insert) => {
                let mut row = RawRecord::new();
                apply(&mut row, &insert.assignments);
                Ok(QueryResult::written(table.store(row)?))
            }
            Query::Update(update) => {
                let positions = table.matching(&update.conditions, &update.limit);
                let mut last_row = None;
                for &pos in &positions {
                    let row = &mut table.rows[pos];
                    apply(row, &update.assignments);
                    last_row = Some(row.clone());
                }
                let result = match last_row {
                    Some(row) => QueryResult::written(row),
                    None => QueryResult::default(),
                };
                Ok(result.with_affected(positions.len() as u64))
            }
            Query::Delete(delete) => {
                let positions = table.matching(&delete.conditions, &delete.limit);
                for &pos in positions.iter().rev() {
                    table.rows.remove(pos);
                }
                Ok(QueryResult::default().with_affected(positions.len() as u64))
            }
        }
    }
}
