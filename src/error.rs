use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RosterError {
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Readline error: {0}")]
    Readline(String),

    #[error("Couldn't find {model} with 'id'={id}")]
    RecordNotFound { model: &'static str, id: i64 },

    #[error("unknown attribute '{attribute}' for {model}")]
    UnknownAttribute {
        model: &'static str,
        attribute: String,
    },

    #[error("invalid value {value:?} for attribute '{attribute}'")]
    InvalidValue { attribute: String, value: String },

    #[error("{0}")]
    Command(String),
}

impl From<rustyline::error::ReadlineError> for RosterError {
    fn from(e: rustyline::error::ReadlineError) -> Self {
        RosterError::Readline(e.to_string())
    }
}
