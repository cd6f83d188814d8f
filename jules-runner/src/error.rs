//! Error types for jules-runner.

use std::path::PathBuf;

use thiserror::Error;

use jules_resolver::ResolveError;

/// Why a resolved command did not run to a successful exit.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The project's working directory is absent.
    #[error("working directory {path} does not exist")]
    MissingWorkingDir { path: PathBuf },

    /// The shell could not be started.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading output from, or waiting on, the child failed.
    #[error("I/O error while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[error("`{command}` {}", exit_label(.code))]
    Failed { command: String, code: Option<i32> },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// The single error a worker records for its project.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Execution failed; `output` holds everything the command printed.
    #[error("{source}")]
    Execute {
        #[source]
        source: ExecError,
        output: Vec<u8>,
    },

    /// The worker thread could not be started.
    #[error("failed to launch worker: {0}")]
    Launch(#[source] std::io::Error),

    #[error("worker panicked: {0}")]
    Panicked(String),
}

impl WorkerError {
    /// Captured command output, for execution failures only.
    pub fn output(&self) -> Option<&[u8]> {
        match self {
            WorkerError::Execute { output, .. } => Some(output),
            _ => None,
        }
    }
}
