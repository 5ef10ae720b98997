//! Console read-eval-print loop.

use crate::console::commands::{Command, HELP, execute, parse};
use crate::db::{Model, Repository};
use crate::error::RosterError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One read from a [`LineSource`].
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Input(String),
    Interrupted,
    Eof,
}

/// Where console input comes from.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Line, RosterError>;

    fn add_history(&mut self, _line: &str) {}

    /// Called once when the console leaves.
    fn finish(&mut self) {}
}

/// Terminal input through rustyline, with optional persisted history.
pub struct EditorSource {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
}

impl EditorSource {
    pub fn new(history_path: Option<PathBuf>) -> Result<Self, RosterError> {
        let mut editor = DefaultEditor::new()?;
        if let Some(ref path) = history_path {
            if let Err(e) = editor.load_history(path) {
                debug!(path = %path.display(), error = %e, "no console history loaded");
            }
        }
        Ok(Self {
            editor,
            history_path,
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<Line, RosterError> {
        // readline blocks the thread until the operator answers
        let read = tokio::task::block_in_place(|| self.editor.readline(prompt));
        match read {
            Ok(line) => Ok(Line::Input(line)),
            Err(ReadlineError::Interrupted) => Ok(Line::Interrupted),
            Err(ReadlineError::Eof) => Ok(Line::Eof),
            Err(e) => Err(e.into()),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            debug!(error = %e, "failed to add console history entry");
        }
    }

    fn finish(&mut self) {
        let Some(ref path) = self.history_path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "failed to create console history directory");
            }
        }
        if let Err(e) = self.editor.save_history(path) {
            warn!(path = %path.display(), error = %e, "failed to save console history");
        }
    }
}

/// Fixed input lines, read in order; end of the list reads as EOF.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    lines: VecDeque<String>,
}

impl ScriptedSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self, _prompt: &str) -> Result<Line, RosterError> {
        Ok(self.lines.pop_front().map(Line::Input).unwrap_or(Line::Eof))
    }
}

/// Interactive session over one model's repository.
pub struct Console<M, S, W> {
    repo: Repository<M>,
    source: S,
    out: W,
}

impl<M: Model, S: LineSource, W: Write> Console<M, S, W> {
    pub fn new(repo: Repository<M>, source: S, out: W) -> Self {
        Self { repo, source, out }
    }

    /// Run until `exit`, `quit` or end of input.
    pub async fn run(&mut self) -> Result<(), RosterError> {
        self.print_banner()?;
        let prompt = format!("{}> ", M::TABLE);

        loop {
            let line = match self.source.read_line(&prompt)? {
                Line::Input(line) => line,
                Line::Interrupted => {
                    writeln!(self.out, "Use 'exit' or Ctrl-D to leave")?;
                    continue;
                }
                Line::Eof => break,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.source.add_history(line);

            let cmd = match parse(line, M::NAME) {
                Ok(cmd) => cmd,
                Err(e) => {
                    writeln!(self.out, "error: {e}")?;
                    continue;
                }
            };
            match cmd {
                Command::Exit => break,
                Command::Help => writeln!(self.out, "{HELP}")?,
                cmd => match execute(&cmd, &self.repo).await {
                    Ok(output) => writeln!(self.out, "=> {output}")?,
                    Err(e) => writeln!(self.out, "error: {e}")?,
                },
            }
            self.out.flush()?;
        }

        self.source.finish();
        writeln!(self.out, "bye")?;
        Ok(())
    }

    fn print_banner(&mut self) -> Result<(), RosterError> {
        writeln!(
            self.out,
            "roster console: {} is mapped to the \"{}\" table.",
            M::NAME,
            M::TABLE
        )?;
        writeln!(self.out, "Type 'help' for commands, 'exit' to leave.")?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_ends_with_eof() {
        let mut source = ScriptedSource::new(["count", "exit"]);
        assert_eq!(source.read_line("> ").unwrap(), Line::Input("count".into()));
        assert_eq!(source.read_line("> ").unwrap(), Line::Input("exit".into()));
        assert_eq!(source.read_line("> ").unwrap(), Line::Eof);
    }

    #[test]
    fn editor_history_is_saved_under_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.txt");

        let mut source = EditorSource::new(Some(path.clone())).unwrap();
        source.add_history("Student.count");
        source.finish();

        assert!(path.exists());
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("Student.count"));
    }
}
