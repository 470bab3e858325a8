//! Project CRUD. Every public operation is its own transaction.

use rusqlite::Connection;

use super::binder::{bind_decimal, bind_integer, bind_text};
use super::error::{DataAccessError, DbError, DbResult};
use super::extract::{extract, Entity};
use super::models::{Category, Material, Project, Step};
use super::storage::ConnectionProvider;
use super::transaction::run_in_transaction;

const CATEGORY_TABLE: &str = "category";
const MATERIAL_TABLE: &str = "material";
const PROJECT_TABLE: &str = "project";
const PROJECT_CATEGORY_TABLE: &str = "project_category";
const STEP_TABLE: &str = "step";

/// Data access for projects and their aggregates
pub struct ProjectRepository<P> {
    provider: P,
}

impl<P: ConnectionProvider> ProjectRepository<P> {
    pub fn new(provider: P) -> Self {
        ProjectRepository { provider }
    }

    /// Insert `project` and return it with its generated id assigned
    pub fn insert(&self, mut project: Project) -> Result<Project, DataAccessError> {
        let sql = format!(
            "INSERT INTO {PROJECT_TABLE} \
             (project_name, estimated_hours, actual_hours, difficulty, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5)"
        );

        let project_id = run_in_transaction(&self.provider, "insert project", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            bind_project_details(&mut stmt, &project)?;
            if stmt.raw_execute()? == 0 {
                return Err(DbError::NothingInserted {
                    table: PROJECT_TABLE,
                });
            }
            last_insert_id(conn, PROJECT_TABLE)
        })?;

        tracing::debug!(project_id, "project inserted");
        project.project_id = Some(project_id);
        Ok(project)
    }

    /// All projects sorted by name, without aggregates
    pub fn fetch_all(&self) -> Result<Vec<Project>, DataAccessError> {
        let sql = format!("SELECT * FROM {PROJECT_TABLE} ORDER BY project_name");

        run_in_transaction(&self.provider, "fetch all projects", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            collect_rows(&mut stmt)
        })
    }

    /// A project with materials, steps and categories, or `None` if the id is unknown
    pub fn fetch_by_id(&self, project_id: i64) -> Result<Option<Project>, DataAccessError> {
        let sql = format!("SELECT * FROM {PROJECT_TABLE} WHERE project_id = ?1");

        run_in_transaction(&self.provider, "fetch project", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            bind_integer(&mut stmt, 1, Some(project_id))?;
            let mut project: Project = match collect_rows(&mut stmt)?.into_iter().next() {
                Some(project) => project,
                None => return Ok(None),
            };

            project.materials = fetch_materials_for_project(conn, project_id)?;
            project.steps = fetch_steps_for_project(conn, project_id)?;
            project.categories = fetch_categories_for_project(conn, project_id)?;
            Ok(Some(project))
        })
    }

    /// Replace every mutable attribute of the project with the same id.
    /// Returns `false` when no project has that id.
    pub fn update(&self, project: &Project) -> Result<bool, DataAccessError> {
        let sql = format!(
            "UPDATE {PROJECT_TABLE} SET \
             project_name = ?1, estimated_hours = ?2, actual_hours = ?3, \
             difficulty = ?4, notes = ?5 \
             WHERE project_id = ?6"
        );

        run_in_transaction(&self.provider, "update project", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            bind_project_details(&mut stmt, project)?;
            bind_integer(&mut stmt, 6, project.project_id)?;
            Ok(stmt.raw_execute()? == 1)
        })
    }

    /// Returns `false` when no project has that id
    pub fn delete(&self, project_id: i64) -> Result<bool, DataAccessError> {
        let sql = format!("DELETE FROM {PROJECT_TABLE} WHERE project_id = ?1");

        run_in_transaction(&self.provider, "delete project", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            bind_integer(&mut stmt, 1, Some(project_id))?;
            Ok(stmt.raw_execute()? == 1)
        })
    }
}

/// Binds the five mutable project columns to slots 1-5
fn bind_project_details(stmt: &mut rusqlite::Statement<'_>, project: &Project) -> DbResult<()> {
    bind_text(stmt, 1, Some(project.project_name.as_str()))?;
    bind_decimal(stmt, 2, project.estimated_hours)?;
    bind_decimal(stmt, 3, project.actual_hours)?;
    bind_integer(stmt, 4, project.difficulty.map(i64::from))?;
    bind_text(stmt, 5, project.notes.as_deref())?;
    Ok(())
}

/// Most recent identity generated for `table`, read inside the inserting transaction
fn last_insert_id(conn: &Connection, table: &'static str) -> DbResult<i64> {
    let mut stmt = conn.prepare("SELECT seq FROM sqlite_sequence WHERE name = ?1")?;
    bind_text(&mut stmt, 1, Some(table))?;
    let mut rows = stmt.raw_query();
    let id = match rows.next()? {
        Some(row) => row.get(0)?,
        None => return Err(DbError::MissingIdentity { table }),
    };
    Ok(id)
}

fn collect_rows<T: Entity>(stmt: &mut rusqlite::Statement<'_>) -> DbResult<Vec<T>> {
    let mut rows = stmt.raw_query();
    let mut entities = Vec::new();
    while let Some(row) = rows.next()? {
        entities.push(extract(row)?);
    }
    Ok(entities)
}

fn fetch_materials_for_project(conn: &Connection, project_id: i64) -> DbResult<Vec<Material>> {
    let sql = format!("SELECT * FROM {MATERIAL_TABLE} WHERE project_id = ?1 ORDER BY material_id");
    let mut stmt = conn.prepare(&sql)?;
    bind_integer(&mut stmt, 1, Some(project_id))?;
    collect_rows(&mut stmt)
}

fn fetch_steps_for_project(conn: &Connection, project_id: i64) -> DbResult<Vec<Step>> {
    let sql = format!(
        "SELECT * FROM {STEP_TABLE} WHERE project_id = ?1 ORDER BY step_order, step_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    bind_integer(&mut stmt, 1, Some(project_id))?;
    collect_rows(&mut stmt)
}

fn fetch_categories_for_project(conn: &Connection, project_id: i64) -> DbResult<Vec<Category>> {
    let sql = format!(
        "SELECT c.* FROM {CATEGORY_TABLE} c \
         JOIN {PROJECT_CATEGORY_TABLE} pc USING (category_id) \
         WHERE pc.project_id = ?1 ORDER BY c.category_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    bind_integer(&mut stmt, 1, Some(project_id))?;
    collect_rows(&mut stmt)
}
