//! Generic persistence over a [`Database`] for any [`Model`].

use crate::db::sqlite::Database;
use crate::db::value::{Attributes, Column, Value};
use crate::error::RosterError;
use sqlx::FromRow;
use sqlx::sqlite::SqliteRow;
use std::marker::PhantomData;

/// A type whose instances mirror rows of one table keyed by an integer `id`.
pub trait Model: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + Sized {
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Non-key columns, in table order.
    const COLUMNS: &'static [Column];

    fn id(&self) -> i64;

    /// Non-key attribute values, in `COLUMNS` order.
    fn attributes(&self) -> Vec<(&'static str, Value)>;

    fn column(name: &str) -> Option<&'static Column> {
        Self::COLUMNS.iter().find(|c| c.name == name)
    }

    /// `#<Student id: 1, name: "Ada">`
    fn inspect(&self) -> String {
        let mut parts = vec![format!("id: {}", self.id())];
        parts.extend(
            self.attributes()
                .into_iter()
                .map(|(name, value)| format!("{name}: {value}")),
        );
        format!("#<{} {}>", Self::NAME, parts.join(", "))
    }
}

pub struct Repository<M> {
    db: Database,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for Repository<M> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> Repository<M> {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            _model: PhantomData,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn select_sql() -> String {
        let mut cols = vec![quoted("id")];
        cols.extend(M::COLUMNS.iter().map(|c| quoted(c.name)));
        format!("SELECT {} FROM {}", cols.join(", "), quoted(M::TABLE))
    }

    fn label(action: &str) -> String {
        format!("{} {action}", M::NAME)
    }

    /// Resolve attribute names to declared columns.
    fn checked<'a>(attrs: &'a Attributes) -> Result<Vec<(&'static str, &'a Value)>, RosterError> {
        attrs
            .iter()
            .map(|(name, value)| {
                M::column(name)
                    .map(|c| (c.name, value))
                    .ok_or_else(|| RosterError::UnknownAttribute {
                        model: M::NAME,
                        attribute: name.clone(),
                    })
            })
            .collect()
    }

    pub async fn create(&self, attrs: Attributes) -> Result<M, RosterError> {
        let pairs = Self::checked(&attrs)?;
        let sql = if pairs.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quoted(M::TABLE))
        } else {
            let names: Vec<String> = pairs.iter().map(|(n, _)| quoted(n)).collect();
            let marks = vec!["?"; pairs.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({marks})",
                quoted(M::TABLE),
                names.join(", ")
            )
        };
        let result = self.db.execute(&Self::label("Create"), &sql, &pairs).await?;
        self.find(result.last_insert_rowid()).await
    }

    pub async fn find(&self, id: i64) -> Result<M, RosterError> {
        let sql = format!(
            "{} WHERE {}.{} = ? LIMIT 1",
            Self::select_sql(),
            quoted(M::TABLE),
            quoted("id")
        );
        let id_value = Value::Integer(id);
        self.db
            .fetch_optional_as(&Self::label("Load"), &sql, &[("id", &id_value)])
            .await?
            .ok_or(RosterError::RecordNotFound { model: M::NAME, id })
    }

    pub async fn find_by(&self, attrs: Attributes) -> Result<Option<M>, RosterError> {
        let pairs = Self::checked(&attrs)?;
        let sql = format!("{}{} LIMIT 1", Self::select_sql(), where_clause::<M>(&pairs));
        let binds = non_null(&pairs);
        self.db
            .fetch_optional_as(&Self::label("Load"), &sql, &binds)
            .await
    }

    pub async fn all(&self) -> Result<Vec<M>, RosterError> {
        let sql = format!("{} ORDER BY {}", Self::select_sql(), quoted("id"));
        self.db.fetch_all_as(&Self::label("Load"), &sql, &[]).await
    }

    pub async fn where_eq(&self, attrs: Attributes) -> Result<Vec<M>, RosterError> {
        let pairs = Self::checked(&attrs)?;
        let sql = format!(
            "{}{} ORDER BY {}",
            Self::select_sql(),
            where_clause::<M>(&pairs),
            quoted("id")
        );
        let binds = non_null(&pairs);
        self.db.fetch_all_as(&Self::label("Load"), &sql, &binds).await
    }

    pub async fn first(&self) -> Result<Option<M>, RosterError> {
        let sql = format!("{} ORDER BY {} ASC LIMIT 1", Self::select_sql(), quoted("id"));
        self.db.fetch_optional_as(&Self::label("Load"), &sql, &[]).await
    }

    pub async fn last(&self) -> Result<Option<M>, RosterError> {
        let sql = format!("{} ORDER BY {} DESC LIMIT 1", Self::select_sql(), quoted("id"));
        self.db.fetch_optional_as(&Self::label("Load"), &sql, &[]).await
    }

    pub async fn count(&self) -> Result<i64, RosterError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quoted(M::TABLE));
        let row: Option<(i64,)> = self
            .db
            .fetch_optional_as(&Self::label("Count"), &sql, &[])
            .await?;
        Ok(row.map(|(n,)| n).unwrap_or(0))
    }

    pub async fn update(&self, id: i64, attrs: Attributes) -> Result<M, RosterError> {
        let pairs = Self::checked(&attrs)?;
        if pairs.is_empty() {
            return self.find(id).await;
        }
        let sets: Vec<String> = pairs.iter().map(|(n, _)| format!("{} = ?", quoted(n))).collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quoted(M::TABLE),
            sets.join(", "),
            quoted("id")
        );
        let id_value = Value::Integer(id);
        let mut binds = pairs.clone();
        binds.push(("id", &id_value));
        let result = self.db.execute(&Self::label("Update"), &sql, &binds).await?;
        if result.rows_affected() == 0 {
            return Err(RosterError::RecordNotFound { model: M::NAME, id });
        }
        self.find(id).await
    }

    pub async fn destroy(&self, id: i64) -> Result<M, RosterError> {
        let record = self.find(id).await?;
        let sql = format!("DELETE FROM {} WHERE {} = ?", quoted(M::TABLE), quoted("id"));
        let id_value = Value::Integer(id);
        self.db
            .execute(&Self::label("Destroy"), &sql, &[("id", &id_value)])
            .await?;
        Ok(record)
    }

    pub async fn destroy_all(&self) -> Result<u64, RosterError> {
        let sql = format!("DELETE FROM {}", quoted(M::TABLE));
        let result = self.db.execute(&Self::label("Destroy"), &sql, &[]).await?;
        Ok(result.rows_affected())
    }
}

fn quoted(ident: &str) -> String {
    format!("\"{ident}\"")
}

/// Equality on every pair; NULL compares with `IS NULL` and binds nothing.
fn where_clause<M: Model>(pairs: &[(&'static str, &Value)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let conds: Vec<String> = pairs
        .iter()
        .map(|(name, value)| {
            let col = format!("{}.{}", quoted(M::TABLE), quoted(name));
            if value.is_null() {
                format!("{col} IS NULL")
            } else {
                format!("{col} = ?")
            }
        })
        .collect();
    format!(" WHERE {}", conds.join(" AND "))
}

fn non_null<'a>(pairs: &[(&'static str, &'a Value)]) -> Vec<(&'static str, &'a Value)> {
    pairs.iter().filter(|(_, v)| !v.is_null()).copied().collect()
}
