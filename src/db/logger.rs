//! Explicit SQL statement log sink attached to a [`Database`](super::Database).

use super::value::Value;
use chrono::{SecondsFormat, Utc};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

#[derive(Clone, Default)]
pub struct SqlLogger {
    sink: Option<Sink>,
}

impl std::fmt::Debug for SqlLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlLogger")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl SqlLogger {
    pub fn stdout() -> Self {
        Self::to_writer(io::stdout())
    }

    pub fn to_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            sink: Some(Arc::new(Mutex::new(Box::new(writer)))),
        }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Write one statement line. Sink failures are reported through tracing
    /// and never fail the statement itself.
    pub fn log(&self, label: &str, elapsed: Duration, sql: &str, binds: &[(&str, &Value)]) {
        let sql = squish(sql);
        debug!(target: "roster::sql", label, elapsed_ms = elapsed.as_secs_f64() * 1000.0, %sql);

        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        let line = format_line(label, elapsed, &sql, binds);
        let mut guard = match sink.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(guard, "{line}").and_then(|_| guard.flush()) {
            warn!(error = %e, "failed to write SQL log line");
        }
    }
}

fn format_line(label: &str, elapsed: Duration, sql: &str, binds: &[(&str, &Value)]) -> String {
    let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let ms = elapsed.as_secs_f64() * 1000.0;
    let mut line = format!("[{ts}] {label} ({ms:.1}ms)  {sql}");
    if !binds.is_empty() {
        let rendered: Vec<String> = binds
            .iter()
            .map(|(name, value)| format!("[\"{name}\", {value}]"))
            .collect();
        line.push_str(&format!("  [{}]", rendered.join(", ")));
    }
    line
}

/// Collapse multi-line SQL into a single line.
fn squish(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
