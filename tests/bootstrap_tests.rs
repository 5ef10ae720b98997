use roster::{Database, Repository, RosterError, SqlLogger, Student};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().expect("buffer lock").clone()).expect("utf-8 log")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn bootstrap_twice_against_same_file_succeeds() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("students.sqlite");
    let url = format!("sqlite:{}", path.display());

    let first = Database::connect(&url).await.expect("first connect");
    first.bootstrap().await.expect("first bootstrap");
    first.close().await;
    assert!(path.exists());

    let second = Database::connect(&url).await.expect("second connect");
    second.bootstrap().await.expect("second bootstrap");
    assert_eq!(
        second.table_names().await.expect("tables"),
        vec!["students".to_string()]
    );
    second.close().await;
}

#[tokio::test]
async fn rows_survive_reconnect() {
    let dir = tempdir().expect("tempdir");
    let url = format!("sqlite:{}", dir.path().join("students.sqlite").display());

    let db = Database::connect(&url).await.expect("connect");
    db.bootstrap().await.expect("bootstrap");
    let ada = Repository::<Student>::new(db.clone())
        .create(vec![("name".into(), "Ada".into())])
        .await
        .expect("create");
    db.close().await;

    let db = Database::connect(&url).await.expect("reconnect");
    db.bootstrap().await.expect("bootstrap again");
    let found = Repository::<Student>::new(db)
        .find(ada.id)
        .await
        .expect("find");
    assert_eq!(found.name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn only_statements_after_logger_attach_are_logged() {
    let dir = tempdir().expect("tempdir");
    let url = format!("sqlite:{}", dir.path().join("students.sqlite").display());
    let buf = SharedBuffer::default();

    let db = Database::connect(&url).await.expect("connect");
    db.bootstrap().await.expect("bootstrap");
    let db = db.with_logger(SqlLogger::to_writer(buf.clone()));
    assert!(buf.contents().is_empty());

    let students = Repository::<Student>::new(db);
    let ada = students
        .create(vec![("name".into(), "Ada".into())])
        .await
        .expect("create");
    students.count().await.expect("count");

    let log = buf.contents();
    assert!(!log.contains("CREATE TABLE"));
    assert!(log.contains("Student Create"));
    assert!(log.contains(r#"INSERT INTO "students" ("name") VALUES (?)  [["name", "Ada"]]"#));
    assert!(log.contains(&format!(r#"[["id", {}]]"#, ada.id)));
    assert!(log.contains(r#"Student Count"#));
    assert!(log.contains(r#"SELECT COUNT(*) FROM "students""#));
}

#[tokio::test]
async fn missing_directory_is_fatal() {
    let dir = tempdir().expect("tempdir");
    let url = format!(
        "sqlite:{}",
        dir.path().join("db").join("students.sqlite").display()
    );
    let err = Database::connect(&url).await.expect_err("connect must fail");
    assert!(matches!(err, RosterError::Database(_)));
}
