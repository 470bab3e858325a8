//! Data-access layer for the project tracker's SQLite database.
//!
//! Maps entities to rows, binds typed parameters, assembles project
//! aggregates and wraps each operation in its own transaction.

mod binder;
mod error;
mod extract;
mod models;
mod repository;
mod storage;
mod transaction;

pub use models::{Decimal, Project};
pub use repository::ProjectRepository;
pub use storage::{ensure_schema, ConnectionProvider, SqliteProvider};
