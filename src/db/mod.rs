//! Database module: connection, schema, statement logging and models.
//!
//! Layout:
//! - `sqlite.rs`: connection, schema bootstrap and logged statement helpers
//! - `schema.rs`: SQL DDL for initializing the database
//! - `logger.rs`: SQL statement log sink
//! - `repository.rs`: `Model` trait and generic `Repository`
//! - `models.rs`: Rust structs mirroring DB rows
//! - `value.rs`: dynamic attribute values

pub mod logger;
pub mod models;
pub mod repository;
pub mod schema;
pub mod sqlite;
pub mod value;

pub use logger::SqlLogger;
pub use models::Student;
pub use repository::{Model, Repository};
pub use schema::SQLITE_INIT;
pub use sqlite::{ColumnInfo, Database, SqlitePool};
pub use value::{Attributes, Column, ColumnKind, Value};
