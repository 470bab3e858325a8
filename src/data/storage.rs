//! SQLite connection provider and schema bootstrap.
//!
//! Project tracker database schema:
//! - `project`: project_id, project_name, estimated_hours, actual_hours, difficulty, notes
//! - `material`: material_id, project_id, material_name, num_required, cost
//! - `step`: step_id, project_id, step_text, step_order
//! - `category`: category_id, category_name
//! - `project_category`: project_id, category_id (join table)

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

/// Idempotent DDL, run once at startup
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS project (
    project_id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_name VARCHAR(128) NOT NULL,
    estimated_hours DECIMAL(7,2),
    actual_hours DECIMAL(7,2),
    difficulty INT,
    notes TEXT
);

CREATE TABLE IF NOT EXISTS material (
    material_id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES project (project_id) ON DELETE CASCADE,
    material_name VARCHAR(128) NOT NULL,
    num_required INT,
    cost DECIMAL(7,2)
);

CREATE TABLE IF NOT EXISTS step (
    step_id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES project (project_id) ON DELETE CASCADE,
    step_text TEXT NOT NULL,
    step_order INT NOT NULL
);

CREATE TABLE IF NOT EXISTS category (
    category_id INTEGER PRIMARY KEY AUTOINCREMENT,
    category_name VARCHAR(128) NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS project_category (
    project_id INTEGER NOT NULL REFERENCES project (project_id) ON DELETE CASCADE,
    category_id INTEGER NOT NULL REFERENCES category (category_id) ON DELETE CASCADE,
    UNIQUE (project_id, category_id)
);
";

/// Create any missing tables
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// Supplies a live connection per call. Dropping the handle releases it.
pub trait ConnectionProvider {
    type Handle: DerefMut<Target = Connection>;

    fn acquire(&self) -> rusqlite::Result<Self::Handle>;
}

/// Opens an independent connection to a database file on every acquisition
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteProvider {
    pub fn new(db_path: PathBuf, busy_timeout: Duration) -> Self {
        SqliteProvider {
            db_path,
            busy_timeout,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl ConnectionProvider for SqliteProvider {
    type Handle = SqliteConnection;

    fn acquire(&self) -> rusqlite::Result<SqliteConnection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(self.busy_timeout)?;
        // Off by default in SQLite; cascades depend on it
        conn.pragma_update(None, "foreign_keys", "ON")?;
        tracing::trace!(path = ?self.db_path, "connection acquired");
        Ok(SqliteConnection { conn })
    }
}

/// Connection handed out by [`SqliteProvider`]
#[derive(Debug)]
pub struct SqliteConnection {
    conn: Connection,
}

impl Deref for SqliteConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for SqliteConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        tracing::trace!("connection released");
    }
}
