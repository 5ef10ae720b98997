//! Command parsing and execution for the console.

use crate::db::{Attributes, Model, Repository};
use crate::error::RosterError;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column as _, Row};

/// A parsed console command. Attribute values stay raw until the target
/// model's column kinds are known.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    All,
    Find { id: i64 },
    FindBy { attrs: Vec<(String, String)> },
    Where { attrs: Vec<(String, String)> },
    First,
    Last,
    Count,
    Create { attrs: Vec<(String, String)> },
    Update { id: i64, attrs: Vec<(String, String)> },
    Destroy { id: i64 },
    DestroyAll,
    Columns,
    /// Run a statement directly against the connection
    Sql { statement: String },
    Help,
    Exit,
}

pub const HELP: &str = "\
Commands (optionally prefixed with the model name, e.g. Student.find 1):
  all                     list every record
  find <id>               load one record by id
  find_by a=v [a=v ...]   first record matching all pairs
  where a=v [a=v ...]     every record matching all pairs
  first | last            lowest / highest id
  count                   number of records
  create [a=v ...]        insert a record
  update <id> a=v [...]   change attributes of a record
  destroy <id>            delete a record
  destroy_all             delete every record
  columns                 show the table's columns
  sql <statement>         run raw SQL
  help                    show this text
  exit | quit             leave the console
Values may be double-quoted; nil or null stores NULL.";

/// Parse one input line for the model named `model`. A prefix such as
/// `Student.` must name that model.
pub fn parse(input: &str, model: &str) -> Result<Command, RosterError> {
    let input = input.trim();
    let (head, rest) = match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    };
    if head.is_empty() {
        return Err(RosterError::Command("empty command".into()));
    }

    // `Student.find` -> `find`
    let cmd = match head.split_once('.') {
        Some((prefix, cmd)) if prefix == model && !cmd.contains('.') => cmd,
        Some((prefix, _)) => {
            return Err(RosterError::Command(format!(
                "undefined model '{prefix}'; this console maps {model}"
            )));
        }
        None => head,
    }
    .to_lowercase();

    if cmd == "sql" {
        if rest.is_empty() {
            return Err(usage("sql <statement>"));
        }
        return Ok(Command::Sql {
            statement: rest.to_string(),
        });
    }

    let args = tokenize(rest)?;
    match cmd.as_str() {
        "all" => no_args(args, Command::All),
        "first" => no_args(args, Command::First),
        "last" => no_args(args, Command::Last),
        "count" => no_args(args, Command::Count),
        "destroy_all" => no_args(args, Command::DestroyAll),
        "columns" | "column_names" => no_args(args, Command::Columns),
        "help" | "?" => Ok(Command::Help),
        "exit" | "quit" | "q" => Ok(Command::Exit),
        "find" => Ok(Command::Find {
            id: single_id(&args, "find <id>")?,
        }),
        "destroy" | "delete" => Ok(Command::Destroy {
            id: single_id(&args, "destroy <id>")?,
        }),
        "find_by" => Ok(Command::FindBy {
            attrs: required_pairs(&args, "find_by a=v [a=v ...]")?,
        }),
        "where" => Ok(Command::Where {
            attrs: required_pairs(&args, "where a=v [a=v ...]")?,
        }),
        "create" | "new" => Ok(Command::Create {
            attrs: pairs(&args)?,
        }),
        "update" => {
            let Some((id, rest)) = args.split_first() else {
                return Err(usage("update <id> a=v [a=v ...]"));
            };
            Ok(Command::Update {
                id: parse_id(id)?,
                attrs: required_pairs(rest, "update <id> a=v [a=v ...]")?,
            })
        }
        other => Err(RosterError::Command(format!(
            "undefined command '{other}'; type 'help' for a list"
        ))),
    }
}

/// Execute a command against a repository and render its result.
/// `Help` and `Exit` are handled by the console loop.
pub async fn execute<M: Model>(cmd: &Command, repo: &Repository<M>) -> Result<String, RosterError> {
    let output = match cmd {
        Command::All => render_list(&repo.all().await?),
        Command::Find { id } => repo.find(*id).await?.inspect(),
        Command::FindBy { attrs } => render_option(repo.find_by(typed::<M>(attrs)?).await?),
        Command::Where { attrs } => render_list(&repo.where_eq(typed::<M>(attrs)?).await?),
        Command::First => render_option(repo.first().await?),
        Command::Last => render_option(repo.last().await?),
        Command::Count => repo.count().await?.to_string(),
        Command::Create { attrs } => repo.create(typed::<M>(attrs)?).await?.inspect(),
        Command::Update { id, attrs } => repo.update(*id, typed::<M>(attrs)?).await?.inspect(),
        Command::Destroy { id } => repo.destroy(*id).await?.inspect(),
        Command::DestroyAll => repo.destroy_all().await?.to_string(),
        Command::Columns => {
            let cols = repo.database().table_info(M::TABLE).await?;
            cols.iter()
                .map(|c| {
                    let mut line = format!("{} {}", c.name, c.data_type);
                    if c.pk != 0 {
                        line.push_str(" PRIMARY KEY");
                    } else if c.notnull != 0 {
                        line.push_str(" NOT NULL");
                    }
                    line
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Sql { statement } => run_sql(repo, statement).await?,
        Command::Help => HELP.to_string(),
        Command::Exit => String::new(),
    };
    Ok(output)
}

async fn run_sql<M: Model>(repo: &Repository<M>, statement: &str) -> Result<String, RosterError> {
    let db = repo.database();
    if returns_rows(statement) {
        let rows = db.fetch_raw(statement).await?;
        if rows.is_empty() {
            return Ok("[]".to_string());
        }
        Ok(rows.iter().map(render_row).collect::<Vec<_>>().join("\n"))
    } else {
        let n = db.execute_raw(statement).await?;
        Ok(format!("{n} row(s) affected"))
    }
}

/// Queries, plus any DML carrying a `RETURNING` clause.
fn returns_rows(statement: &str) -> bool {
    let mut words = statement
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase);
    let Some(first) = words.next() else {
        return false;
    };
    matches!(
        first.as_str(),
        "select" | "pragma" | "with" | "values" | "explain"
    ) || words.any(|w| w == "returning")
}

fn render_row(row: &SqliteRow) -> String {
    let fields: Vec<String> = row
        .columns()
        .iter()
        .map(|col| format!("{}: {}", col.name(), render_cell(row, col.ordinal())))
        .collect();
    format!("{{{}}}", fields.join(", "))
}

fn render_cell(row: &SqliteRow, idx: usize) -> String {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(|i| i.to_string()).unwrap_or_else(|| "nil".into());
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(|f| f.to_string()).unwrap_or_else(|| "nil".into());
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(|s| format!("{s:?}")).unwrap_or_else(|| "nil".into());
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v
            .map(|b| format!("<{} bytes>", b.len()))
            .unwrap_or_else(|| "nil".into());
    }
    "?".to_string()
}

fn render_list<M: Model>(records: &[M]) -> String {
    if records.is_empty() {
        return "[]".to_string();
    }
    records
        .iter()
        .map(Model::inspect)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_option<M: Model>(record: Option<M>) -> String {
    record.map(|r| r.inspect()).unwrap_or_else(|| "nil".into())
}

/// Convert raw pairs using the model's declared column kinds.
fn typed<M: Model>(attrs: &[(String, String)]) -> Result<Attributes, RosterError> {
    attrs
        .iter()
        .map(|(name, raw)| {
            let column = M::column(name).ok_or_else(|| RosterError::UnknownAttribute {
                model: M::NAME,
                attribute: name.clone(),
            })?;
            let value = column.parse(raw).ok_or_else(|| RosterError::InvalidValue {
                attribute: name.clone(),
                value: raw.clone(),
            })?;
            Ok((name.clone(), value))
        })
        .collect()
}

fn usage(text: &str) -> RosterError {
    RosterError::Command(format!("usage: {text}"))
}

fn no_args(args: Vec<String>, cmd: Command) -> Result<Command, RosterError> {
    if args.is_empty() {
        Ok(cmd)
    } else {
        Err(RosterError::Command(format!(
            "unexpected arguments: {}",
            args.join(" ")
        )))
    }
}

fn parse_id(raw: &str) -> Result<i64, RosterError> {
    raw.parse()
        .map_err(|_| RosterError::Command(format!("invalid id '{raw}'")))
}

fn single_id(args: &[String], usage_text: &str) -> Result<i64, RosterError> {
    match args {
        [id] => parse_id(id),
        _ => Err(usage(usage_text)),
    }
}

fn pairs(args: &[String]) -> Result<Vec<(String, String)>, RosterError> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
            _ => Err(RosterError::Command(format!(
                "expected attribute=value, got '{arg}'"
            ))),
        })
        .collect()
}

fn required_pairs(args: &[String], usage_text: &str) -> Result<Vec<(String, String)>, RosterError> {
    if args.is_empty() {
        return Err(usage(usage_text));
    }
    pairs(args)
}

/// Split on whitespace; double quotes group, `\"` and `\\` escape.
fn tokenize(input: &str) -> Result<Vec<String>, RosterError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            '\\' if quoted => match chars.next() {
                Some(next) => current.push(next),
                None => break,
            },
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quoted {
        return Err(RosterError::Command("unterminated quote".into()));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(input: &str) -> Result<Command, RosterError> {
        parse(input, "Student")
    }

    fn pair(a: &str, v: &str) -> (String, String) {
        (a.to_string(), v.to_string())
    }

    #[test]
    fn parses_bare_and_prefixed_commands() {
        assert_eq!(student("all").unwrap(), Command::All);
        assert_eq!(student("Student.all").unwrap(), Command::All);
        assert_eq!(student("  Student.find 7 ").unwrap(), Command::Find { id: 7 });
        assert_eq!(student("COUNT").unwrap(), Command::Count);
        assert_eq!(student("quit").unwrap(), Command::Exit);
    }

    #[test]
    fn rejects_other_model_prefixes() {
        let err = student("Course.destroy_all").unwrap_err();
        assert!(err.to_string().contains("undefined model 'Course'"));
        assert!(student("x.y.count").is_err());
        assert!(student("Student.find.all").is_err());
        assert!(student("student.count").is_err());
        assert!(student(".count").is_err());
    }

    #[test]
    fn quoted_values_keep_spaces() {
        assert_eq!(
            student(r#"create name="Ada Lovelace""#).unwrap(),
            Command::Create {
                attrs: vec![pair("name", "Ada Lovelace")]
            }
        );
        assert_eq!(
            student(r#"update 3 name="say \"hi\"""#).unwrap(),
            Command::Update {
                id: 3,
                attrs: vec![pair("name", "say \"hi\"")]
            }
        );
        assert_eq!(
            student(r#"where name="""#).unwrap(),
            Command::Where {
                attrs: vec![pair("name", "")]
            }
        );
    }

    #[test]
    fn create_accepts_no_attributes() {
        assert_eq!(student("create").unwrap(), Command::Create { attrs: vec![] });
    }

    #[test]
    fn sql_keeps_statement_verbatim() {
        assert_eq!(
            student("sql SELECT  name FROM students WHERE name = 'A B'").unwrap(),
            Command::Sql {
                statement: "SELECT  name FROM students WHERE name = 'A B'".into()
            }
        );
        assert!(student("sql").is_err());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(student("").is_err());
        assert!(student("find").is_err());
        assert!(student("find abc").is_err());
        assert!(student("find 1 2").is_err());
        assert!(student("update 1").is_err());
        assert!(student("where").is_err());
        assert!(student("create name").is_err());
        assert!(student("create =x").is_err());
        assert!(student(r#"create name="Ada"#).is_err());
        assert!(student("count 3").is_err());
        let err = student("launch").unwrap_err();
        assert!(err.to_string().contains("undefined command 'launch'"));
    }

    #[test]
    fn row_returning_statements() {
        assert!(returns_rows("select 1"));
        assert!(returns_rows("  PRAGMA table_info(students)"));
        assert!(returns_rows("select(1)"));
        assert!(returns_rows(
            "INSERT INTO students (name) VALUES ('Ada') RETURNING id"
        ));
        assert!(returns_rows("delete from students returning *"));
        assert!(!returns_rows("DELETE FROM students"));
        assert!(!returns_rows("UPDATE students SET name = 'x'"));
        assert!(!returns_rows(""));
    }
}
