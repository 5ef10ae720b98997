pub mod config;
pub mod console;
pub mod db;
pub mod error;

pub use db::{Database, Model, Repository, SqlLogger, Student};
pub use error::RosterError;
