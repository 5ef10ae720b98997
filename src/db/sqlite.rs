use crate::db::logger::SqlLogger;
use crate::db::schema::SQLITE_INIT;
use crate::db::value::{Value, bind_value, bind_value_as};
use crate::error::RosterError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteQueryResult, SqliteRow};
use sqlx::{ConnectOptions, FromRow, Pool, Sqlite};
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

/// Statement bind list: column name and value, in placeholder order.
pub type Binds<'a> = [(&'a str, &'a Value)];

/// One row of `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ColumnInfo {
    pub name: String,
    #[sqlx(rename = "type")]
    pub data_type: String,
    pub notnull: i64,
    pub pk: i64,
}

/// The single connection to the store plus its statement logger.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    logger: SqlLogger,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Connect to a SQLite database, e.g. `sqlite:db/students.sqlite`.
    ///
    /// The file is created when missing; its directory is not.
    pub async fn connect(url: &str) -> Result<Self, RosterError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        info!(database_url = %url, "connected to database");
        Ok(Self::new(pool))
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            logger: SqlLogger::disabled(),
        }
    }

    /// Attach a statement logger; every later statement is mirrored to it.
    pub fn with_logger(mut self, logger: SqlLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn logger(&self) -> &SqlLogger {
        &self.logger
    }

    /// Initialize the schema by executing the bundled DDL. Safe to repeat.
    pub async fn bootstrap(&self) -> Result<(), RosterError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            self.execute("Schema", s, &[]).await?;
        }
        Ok(())
    }

    pub async fn table_names(&self) -> Result<Vec<String>, RosterError> {
        let rows: Vec<(String,)> = self
            .fetch_all_as(
                "Schema Load",
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                &[],
            )
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    pub async fn table_info(&self, table: &str) -> Result<Vec<ColumnInfo>, RosterError> {
        let sql = format!("PRAGMA table_info(\"{table}\")");
        self.fetch_all_as("Schema Load", &sql, &[]).await
    }

    pub(crate) async fn execute(
        &self,
        label: &str,
        sql: &str,
        binds: &Binds<'_>,
    ) -> Result<SqliteQueryResult, RosterError> {
        let start = Instant::now();
        let mut query = sqlx::query(sql);
        for (_, value) in binds {
            query = bind_value(query, value);
        }
        let result = query.execute(&self.pool).await;
        self.logger.log(label, start.elapsed(), sql, binds);
        Ok(result?)
    }

    pub(crate) async fn fetch_all_as<O>(
        &self,
        label: &str,
        sql: &str,
        binds: &Binds<'_>,
    ) -> Result<Vec<O>, RosterError>
    where
        O: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let start = Instant::now();
        let mut query = sqlx::query_as::<_, O>(sql);
        for (_, value) in binds {
            query = bind_value_as(query, value);
        }
        let rows = query.fetch_all(&self.pool).await;
        self.logger.log(label, start.elapsed(), sql, binds);
        Ok(rows?)
    }

    pub(crate) async fn fetch_optional_as<O>(
        &self,
        label: &str,
        sql: &str,
        binds: &Binds<'_>,
    ) -> Result<Option<O>, RosterError>
    where
        O: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let start = Instant::now();
        let mut query = sqlx::query_as::<_, O>(sql);
        for (_, value) in binds {
            query = bind_value_as(query, value);
        }
        let row = query.fetch_optional(&self.pool).await;
        self.logger.log(label, start.elapsed(), sql, binds);
        Ok(row?)
    }

    /// Run an ad hoc statement and return its raw rows.
    pub async fn fetch_raw(&self, sql: &str) -> Result<Vec<SqliteRow>, RosterError> {
        let start = Instant::now();
        let rows = sqlx::query(sql).fetch_all(&self.pool).await;
        self.logger.log("SQL", start.elapsed(), sql, &[]);
        Ok(rows?)
    }

    /// Run an ad hoc statement that returns no rows.
    pub async fn execute_raw(&self, sql: &str) -> Result<u64, RosterError> {
        Ok(self.execute("SQL", sql, &[]).await?.rows_affected())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn bootstrap_creates_students_table() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("students.sqlite").display());
        let db = Database::connect(&url).await.unwrap();

        db.bootstrap().await.unwrap();

        assert_eq!(db.table_names().await.unwrap(), vec!["students".to_string()]);
        let cols = db.table_info("students").await.unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].name, "id");
        assert_eq!(cols[0].data_type, "INTEGER");
        assert_eq!(cols[0].pk, 1);
        assert_eq!(cols[1].name, "name");
        assert_eq!(cols[1].data_type, "TEXT");
        assert_eq!(cols[1].notnull, 0);
        assert_eq!(cols[1].pk, 0);
    }

    #[tokio::test]
    async fn missing_directory_fails_to_connect() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("students.sqlite");
        let err = Database::connect(&format!("sqlite:{}", path.display()))
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::Database(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn raw_statements_round_trip() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("raw.sqlite").display());
        let db = Database::connect(&url).await.unwrap();
        db.bootstrap().await.unwrap();

        let affected = db
            .execute_raw("INSERT INTO students (name) VALUES ('Grace')")
            .await
            .unwrap();
        assert_eq!(affected, 1);
        let rows = db.fetch_raw("SELECT id, name FROM students").await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
