//! Interactive console over a mapped model.
//!
//! The console is the last step of startup. It only runs when [`enter`] is
//! called, so callers that must not block (tests, `--no-console`) skip it or
//! drive it with a [`ScriptedSource`].

pub mod commands;
pub mod repl;

pub use commands::{Command, execute, parse};
pub use repl::{Console, EditorSource, Line, LineSource, ScriptedSource};

use crate::db::{Model, Repository};
use crate::error::RosterError;
use std::io::Write;

/// Hand control to an interactive session. Returns when the operator exits.
pub async fn enter<M, S, W>(repo: Repository<M>, source: S, out: W) -> Result<(), RosterError>
where
    M: Model,
    S: LineSource,
    W: Write,
{
    Console::new(repo, source, out).run().await
}

/// Run a single command outside the loop and return its rendered output.
pub async fn run_once<M: Model>(repo: &Repository<M>, input: &str) -> Result<String, RosterError> {
    match parse(input, M::NAME)? {
        Command::Help => Ok(commands::HELP.to_string()),
        Command::Exit => Ok(String::new()),
        cmd => execute(&cmd, repo).await,
    }
}
