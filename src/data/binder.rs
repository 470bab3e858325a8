//! Typed parameter binding for prepared statements.

use std::fmt;

use rusqlite::types::Null;
use rusqlite::Statement;

use super::error::{DbError, DbResult};
use super::models::Decimal;

/// Semantic type a statement parameter is declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Decimal,
    Integer,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SqlType::Text => "text",
            SqlType::Decimal => "decimal",
            SqlType::Integer => "integer",
        })
    }
}

/// A value ready to be bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Param<'a> {
    Null,
    Text(&'a str),
    Decimal(Decimal),
    Integer(i64),
}

impl Param<'_> {
    fn sql_type(&self) -> Option<SqlType> {
        match self {
            Param::Null => None,
            Param::Text(_) => Some(SqlType::Text),
            Param::Decimal(_) => Some(SqlType::Decimal),
            Param::Integer(_) => Some(SqlType::Integer),
        }
    }
}

/// Bind `value` into the 1-based `position` slot, checking it against `declared`.
///
/// `Param::Null` binds SQL NULL for any declared type.
pub fn bind(stmt: &mut Statement<'_>, position: usize, value: Param<'_>, declared: SqlType) -> DbResult<()> {
    if let Some(actual) = value.sql_type() {
        if actual != declared {
            return Err(DbError::Validation {
                position,
                declared,
                actual,
            });
        }
    }

    if let Param::Decimal(decimal) = value {
        // Wider values would come back through REAL and lose digits
        if !decimal.fits_column() {
            return Err(DbError::DecimalRange {
                position,
                value: decimal,
                max: Decimal::COLUMN_MAX,
            });
        }
    }

    match value {
        Param::Null => stmt.raw_bind_parameter(position, Null)?,
        Param::Text(text) => stmt.raw_bind_parameter(position, text)?,
        // Two-digit text keeps the scale; DECIMAL affinity stores it numerically
        Param::Decimal(decimal) => stmt.raw_bind_parameter(position, decimal.to_string())?,
        Param::Integer(int) => stmt.raw_bind_parameter(position, int)?,
    }
    Ok(())
}

pub fn bind_text(stmt: &mut Statement<'_>, position: usize, value: Option<&str>) -> DbResult<()> {
    bind(stmt, position, value.map_or(Param::Null, Param::Text), SqlType::Text)
}

pub fn bind_decimal(stmt: &mut Statement<'_>, position: usize, value: Option<Decimal>) -> DbResult<()> {
    bind(stmt, position, value.map_or(Param::Null, Param::Decimal), SqlType::Decimal)
}

pub fn bind_integer(stmt: &mut Statement<'_>, position: usize, value: Option<i64>) -> DbResult<()> {
    bind(stmt, position, value.map_or(Param::Null, Param::Integer), SqlType::Integer)
}
