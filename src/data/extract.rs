//! Row to entity mapping through static per-entity column tables.
//!
//! Columns are looked up by name, never by position, so reordering the
//! schema or selecting extra columns (join keys) does not affect mapping.

use rusqlite::types::ValueRef;
use rusqlite::Row;

use super::error::{DbError, DbResult};
use super::models::{Category, Decimal, Material, Project, Step};

/// One column of an entity shape and how it is assigned
pub struct Column<T: 'static> {
    pub name: &'static str,
    /// Missing column or NULL value fails the mapping
    pub required: bool,
    pub assign: fn(&mut T, ValueRef<'_>) -> Result<(), String>,
}

/// An entity that can be built from a result row
pub trait Entity: Default + Sized + 'static {
    const NAME: &'static str;
    const COLUMNS: &'static [Column<Self>];
}

/// Build an entity from `row` using its column table
pub fn extract<T: Entity>(row: &Row<'_>) -> DbResult<T> {
    let mut entity = T::default();
    for column in T::COLUMNS {
        let mapping_error = |reason: String| DbError::Mapping {
            entity: T::NAME,
            column: column.name,
            reason,
        };

        let value = match row.get_ref(column.name) {
            Ok(value) => value,
            Err(rusqlite::Error::InvalidColumnName(_)) if !column.required => continue,
            Err(rusqlite::Error::InvalidColumnName(_)) => {
                return Err(mapping_error("column missing from result".to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        if column.required && matches!(value, ValueRef::Null) {
            return Err(mapping_error("unexpected NULL".to_string()));
        }
        (column.assign)(&mut entity, value).map_err(mapping_error)?;
    }
    Ok(entity)
}

fn type_name(value: ValueRef<'_>) -> &'static str {
    match value {
        ValueRef::Null => "NULL",
        ValueRef::Integer(_) => "INTEGER",
        ValueRef::Real(_) => "REAL",
        ValueRef::Text(_) => "TEXT",
        ValueRef::Blob(_) => "BLOB",
    }
}

fn nullable<T>(
    value: ValueRef<'_>,
    coerce: impl FnOnce(ValueRef<'_>) -> Result<T, String>,
) -> Result<Option<T>, String> {
    match value {
        ValueRef::Null => Ok(None),
        other => coerce(other).map(Some),
    }
}

fn to_text(value: ValueRef<'_>) -> Result<String, String> {
    match value {
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| e.to_string()),
        other => Err(format!("expected TEXT, found {}", type_name(other))),
    }
}

fn to_integer(value: ValueRef<'_>) -> Result<i64, String> {
    match value {
        ValueRef::Integer(int) => Ok(int),
        other => Err(format!("expected INTEGER, found {}", type_name(other))),
    }
}

fn to_small_integer(value: ValueRef<'_>) -> Result<i32, String> {
    let int = to_integer(value)?;
    i32::try_from(int).map_err(|_| format!("{int} does not fit a 32-bit integer"))
}

/// DECIMAL affinity may hand back INTEGER, REAL or TEXT
fn to_decimal(value: ValueRef<'_>) -> Result<Decimal, String> {
    match value {
        ValueRef::Integer(int) => {
            Decimal::from_integer(int).ok_or_else(|| format!("{int} is out of decimal range"))
        }
        ValueRef::Real(real) => {
            Decimal::from_f64(real).ok_or_else(|| format!("{real} is out of decimal range"))
        }
        ValueRef::Text(_) => to_text(value)?.parse::<Decimal>().map_err(|e| e.to_string()),
        other => Err(format!("expected DECIMAL, found {}", type_name(other))),
    }
}

impl Entity for Project {
    const NAME: &'static str = "Project";
    const COLUMNS: &'static [Column<Self>] = &[
        Column {
            name: "project_id",
            required: true,
            assign: |p, v| {
                p.project_id = Some(to_integer(v)?);
                Ok(())
            },
        },
        Column {
            name: "project_name",
            required: true,
            assign: |p, v| {
                p.project_name = to_text(v)?;
                Ok(())
            },
        },
        Column {
            name: "estimated_hours",
            required: false,
            assign: |p, v| {
                p.estimated_hours = nullable(v, to_decimal)?;
                Ok(())
            },
        },
        Column {
            name: "actual_hours",
            required: false,
            assign: |p, v| {
                p.actual_hours = nullable(v, to_decimal)?;
                Ok(())
            },
        },
        Column {
            name: "difficulty",
            required: false,
            assign: |p, v| {
                p.difficulty = nullable(v, to_small_integer)?;
                Ok(())
            },
        },
        Column {
            name: "notes",
            required: false,
            assign: |p, v| {
                p.notes = nullable(v, to_text)?;
                Ok(())
            },
        },
    ];
}

impl Entity for Material {
    const NAME: &'static str = "Material";
    const COLUMNS: &'static [Column<Self>] = &[
        Column {
            name: "material_id",
            required: true,
            assign: |m, v| {
                m.material_id = Some(to_integer(v)?);
                Ok(())
            },
        },
        Column {
            name: "project_id",
            required: true,
            assign: |m, v| {
                m.project_id = Some(to_integer(v)?);
                Ok(())
            },
        },
        Column {
            name: "material_name",
            required: true,
            assign: |m, v| {
                m.material_name = to_text(v)?;
                Ok(())
            },
        },
        Column {
            name: "num_required",
            required: false,
            assign: |m, v| {
                m.num_required = nullable(v, to_small_integer)?;
                Ok(())
            },
        },
        Column {
            name: "cost",
            required: false,
            assign: |m, v| {
                m.cost = nullable(v, to_decimal)?;
                Ok(())
            },
        },
    ];
}

impl Entity for Step {
    const NAME: &'static str = "Step";
    const COLUMNS: &'static [Column<Self>] = &[
        Column {
            name: "step_id",
            required: true,
            assign: |s, v| {
                s.step_id = Some(to_integer(v)?);
                Ok(())
            },
        },
        Column {
            name: "project_id",
            required: true,
            assign: |s, v| {
                s.project_id = Some(to_integer(v)?);
                Ok(())
            },
        },
        Column {
            name: "step_text",
            required: true,
            assign: |s, v| {
                s.step_text = to_text(v)?;
                Ok(())
            },
        },
        Column {
            name: "step_order",
            required: true,
            assign: |s, v| {
                s.step_order = to_small_integer(v)?;
                Ok(())
            },
        },
    ];
}

impl Entity for Category {
    const NAME: &'static str = "Category";
    const COLUMNS: &'static [Column<Self>] = &[
        Column {
            name: "category_id",
            required: true,
            assign: |c, v| {
                c.category_id = Some(to_integer(v)?);
                Ok(())
            },
        },
        Column {
            name: "category_name",
            required: true,
            assign: |c, v| {
                c.category_name = to_text(v)?;
                Ok(())
            },
        },
    ];
}
