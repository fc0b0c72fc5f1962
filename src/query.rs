//! Query objects
//!
//! Structured descriptions of the five statements the mapper produces. They
//! carry no behavior beyond rendering; a [`QueryExecutor`](crate::executor::QueryExecutor)
//! decides how to run them.

use std::fmt;

use serde::Serialize;

use crate::value::Value;

/// A column, optionally qualified by a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: None,
        }
    }

    pub fn scoped(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: Some(scope.into()),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}.{}", scope, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A selected column and the key it is returned under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRef {
    pub column: Column,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Equal { column: Column, value: Value },
}

impl Condition {
    pub fn equal(column: Column, value: impl Into<Value>) -> Self {
        Condition::Equal {
            column,
            value: value.into(),
        }
    }

    pub fn column(&self) -> &Column {
        match self {
            Condition::Equal { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub column: Column,
    pub value: Value,
}

/// Row limit and offset; a limit of zero means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Limit {
    pub limit: u64,
    pub offset: u64,
}

impl Limit {
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit: limit.unwrap_or(0),
            offset: offset.unwrap_or(0),
        }
    }

    pub fn one() -> Self {
        Self { limit: 1, offset: 0 }
    }

    pub fn is_unbounded(&self) -> bool {
        self.limit == 0 && self.offset == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub column: Column,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: Column::new(column),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: Column::new(column),
            direction: Direction::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Select {
    pub entity: String,
    pub columns: Vec<ColumnRef>,
    pub conditions: Vec<Condition>,
    pub order_by: Vec<OrderBy>,
    pub limit: Limit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Count {
    pub entity: String,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insert {
    pub entity: String,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    pub entity: String,
    pub conditions: Vec<Condition>,
    pub assignments: Vec<Assignment>,
    pub limit: Limit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delete {
    pub entity: String,
    pub conditions: Vec<Condition>,
    pub limit: Limit,
}

/// Any statement generated for a record type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    Select(Select),
    Count(Count),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl Query {
    pub fn entity(&self) -> &str {
        match self {
            Query::Select(q) => &q.entity,
            Query::Count(q) => &q.entity,
            Query::Insert(q) => &q.entity,
            Query::Update(q) => &q.entity,
            Query::Delete(q) => &q.entity,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Query::Select(_) => "select",
            Query::Count(_) => "count",
            Query::Insert(_) => "insert",
            Query::Update(_) => "update",
            Query::Delete(_) => "delete",
        }
    }

    /// Conditions of the statement; inserts have none
    pub fn conditions(&self) -> &[Condition] {
        match self {
            Query::Select(q) => &q.conditions,
            Query::Count(q) => &q.conditions,
            Query::Update(q) => &q.conditions,
            Query::Delete(q) => &q.conditions,
            Query::Insert(_) => &[],
        }
    }

    pub fn conditions_mut(&mut self) -> Option<&mut Vec<Condition>> {
        match self {
            Query::Select(q) => Some(&mut q.conditions),
            Query::Count(q) => Some(&mut q.conditions),
            Query::Update(q) => Some(&mut q.conditions),
            Query::Delete(q) => Some(&mut q.conditions),
            Query::Insert(_) => None,
        }
    }

    pub fn assignments(&self) -> &[Assignment] {
        match self {
            Query::Insert(q) => &q.assignments,
            Query::Update(q) => &q.assignments,
            _ => &[],
        }
    }
}

struct Literal<'a>(&'a Value);

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Int(_) | Value::Float(_) => write!(f, "{}", self.0),
            other => write!(f, "'{}'", other.to_string().replace('\'', "''")),
        }
    }
}

fn write_conditions(f: &mut fmt::Formatter<'_>, conditions: &[Condition]) -> fmt::Result {
    for (i, condition) in conditions.iter().enumerate() {
        f.write_str(if i == 0 { " WHERE " } else { " AND " })?;
        match condition {
            Condition::Equal { column, value } if value.is_null() => {
                write!(f, "{} IS NULL", column)?
            }
            Condition::Equal { column, value } => write!(f, "{} = {}", column, Literal(value))?,
        }
    }
    Ok(())
}

fn write_assignments(f: &mut fmt::Formatter<'_>, assignments: &[Assignment]) -> fmt::Result {
    for (i, assignment) in assignments.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{} = {}", assignment.column, Literal(&assignment.value))?;
    }
    Ok(())
}

fn write_limit(f: &mut fmt::Formatter<'_>, limit: &Limit) -> fmt::Result {
    if limit.limit > 0 {
        write!(f, " LIMIT {}", limit.limit)?;
    }
    if limit.offset > 0 {
        write!(f, " OFFSET {}", limit.offset)?;
    }
    Ok(())
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Select(q) => {
                f.write_str("SELECT ")?;
                if q.columns.is_empty() {
                    f.write_str("*")?;
                }
                for (i, column) in q.columns.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} AS {}", column.column, column.alias)?;
                }
                write!(f, " FROM {}", q.entity)?;
                write_conditions(f, &q.conditions)?;
                for (i, order) in q.order_by.iter().enumerate() {
                    f.write_str(if i == 0 { " ORDER BY " } else { ", " })?;
                    let direction = match order.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    write!(f, "{} {}", order.column, direction)?;
                }
                write_limit(f, &q.limit)
            }
            Query::Count(q) => {
                write!(f, "SELECT COUNT(*) FROM {}", q.entity)?;
                write_conditions(f, &q.conditions)
            }
            Query::Insert(q) => {
                write!(f, "INSERT INTO {} SET ", q.entity)?;
                write_assignments(f, &q.assignments)
            }
            Query::Update(q) => {
                write!(f, "UPDATE {} SET ", q.entity)?;
                write_assignments(f, &q.assignments)?;
                write_conditions(f, &q.conditions)?;
                write_limit(f, &q.limit)
            }
            Query::Delete(q) => {
                write!(f, "DELETE FROM {}", q.entity)?;
                write_conditions(f, &q.conditions)?;
                write_limit(f, &q.limit)
            }
        }
    }
}
