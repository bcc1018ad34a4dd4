use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WarriorError {
    #[error("failed to read config file {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse JSON from {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config file {path} has no '{section}' entry")]
    MissingSection { path: PathBuf, section: String },

    #[error("invalid settings in '{section}' of {path}")]
    InvalidSection {
        path: PathBuf,
        section: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no IPv4 address found for connection '{0}'")]
    AddressNotFound(String),

    #[error("printer setup needs a network connection name to resolve the subnet")]
    MissingConnection,

    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with status {code}")]
    CommandFailed { command: String, code: i32 },
}

impl WarriorError {
    /// Process exit code for this error: the failing subprocess's code, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { code, .. } => *code,
            _ => 1,
        }
    }
}

/// Exit status for a run that ended with `err`.
///
/// Finds a [`WarriorError`] anywhere in the context chain; codes outside
/// 1..=255 and any other error give 1.
#[must_use]
pub fn exit_status(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<WarriorError>()
        .map(WarriorError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

pub type Result<T> = std::result::Result<T, WarriorError>;
