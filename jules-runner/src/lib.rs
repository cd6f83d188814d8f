//! # jules-runner
//!
//! Concurrent stage execution across projects.
//!
//! Call [`Orchestrator::run`] with a stage, a project list and a loaded
//! config. One worker thread is launched per project; progress is drawn on a
//! [`StatusBoard`] and failures are collected in an [`ErrorRegistry`] that is
//! only read once every worker has finished.

pub mod error;
pub mod executor;
pub mod failures;
pub mod log;
pub mod orchestrator;
pub mod status;

pub use error::{ExecError, WorkerError};
pub use executor::{CommandExecutor, ProcessExecutor};
pub use failures::ErrorRegistry;
pub use log::{CapturedOutput, OperatorLog};
pub use orchestrator::{
    install_worker_panic_hook, Orchestrator, ProjectOutcome, RunReport, WORKER_THREAD_PREFIX,
};
pub use status::{EntryHandle, EntrySnapshot, EntryState, RenderMode, StatusBoard};
