//! SQL DDL for initializing the student store.

/// Table holding `Student` rows.
pub const STUDENTS_TABLE: &str = "students";

/// SQLite schema with:
/// - `id` INTEGER PRIMARY KEY (rowid alias, assigned by SQLite)
/// - `name` TEXT, nullable, not unique
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY,
    name TEXT
);
"#;
