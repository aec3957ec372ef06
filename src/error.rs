//! Error types for environment operations

use crate::config::ConfigError;
use crate::runtime::RuntimeError;
use dockenv_archive::RebaseError;
use std::fmt;
use thiserror::Error;

/// Environment operation result type
pub type Result<T> = std::result::Result<T, EnvError>;

/// Runtime call an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Connect,
    Inspect,
    Start,
    Stop,
    Remove,
    Copy,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Connect => "connect",
            Operation::Inspect => "inspect",
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Remove => "remove",
            Operation::Copy => "copy",
        })
    }
}

/// Environment operation errors
#[derive(Error, Debug)]
pub enum EnvError {
    /// The named container does not exist
    #[error("Missing container for environment: {0}")]
    MissingEnvironment(String),

    /// The path does not exist inside an existing container
    #[error("No such file in environment {name}: {path}")]
    NoSuchPath { name: String, path: String },

    /// Any other runtime failure
    #[error("Failed to {op} container {name}: {source}")]
    Runtime {
        op: Operation,
        name: String,
        #[source]
        source: RuntimeError,
    },

    /// The copied archive could not be re-rooted
    #[error("Failed to rebase archive of {path} from {name}: {source}")]
    Archive {
        name: String,
        path: String,
        #[source]
        source: RebaseError,
    },

    /// The blocking archive task panicked or was cancelled
    #[error("Archive task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EnvError {
    /// Classify a runtime error, turning not-found conditions into sentinels.
    pub(crate) fn runtime(op: Operation, name: &str, source: RuntimeError) -> Self {
        match source {
            RuntimeError::NoSuchContainer(_) => EnvError::MissingEnvironment(name.to_string()),
            RuntimeError::NoSuchPath { name, path } => EnvError::NoSuchPath { name, path },
            source => EnvError::Runtime {
                op,
                name: name.to_string(),
                source,
            },
        }
    }

    /// True for both not-found sentinels.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EnvError::MissingEnvironment(_) | EnvError::NoSuchPath { .. }
        )
    }
}
