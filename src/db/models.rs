use crate::db::repository::Model;
use crate::db::schema::STUDENTS_TABLE;
use crate::db::value::{Column, ColumnKind, Value};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: Option<String>,
}

impl Model for Student {
    const NAME: &'static str = "Student";
    const TABLE: &'static str = STUDENTS_TABLE;
    const COLUMNS: &'static [Column] = &[Column::new("name", ColumnKind::Text)];

    fn id(&self) -> i64 {
        self.id
    }

    fn attributes(&self) -> Vec<(&'static str, Value)> {
        vec![("name", self.name.clone().into())]
    }
}
