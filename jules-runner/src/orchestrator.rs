//! Fan-out of one worker per project, with deferred failure reporting.
//!
//! ## Run protocol
//!
//! 1. For each project: create a board entry, then launch a scoped worker
//!    thread owning that entry.
//! 2. Each worker resolves, then executes into its own buffer. On failure it
//!    records the error in the [`ErrorRegistry`] *before* marking its entry
//!    failed, so a settled board implies a complete registry.
//! 3. The calling thread renders the board until every entry is terminal.
//! 4. The registry is drained and one diagnostic block per failure is written
//!    to the [`OperatorLog`].

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};

use jules_core::{Config, ProjectName, StageName};
use jules_resolver::CommandResolver;

use crate::error::WorkerError;
use crate::executor::CommandExecutor;
use crate::failures::ErrorRegistry;
use crate::log::OperatorLog;
use crate::status::{EntryHandle, EntryState, RenderMode, StatusBoard};

/// Default redraw interval for the live board.
pub const DEFAULT_REFRESH: Duration = Duration::from_millis(100);

/// Every worker thread is named with this prefix followed by its project.
pub const WORKER_THREAD_PREFIX: &str = "jules-";

/// Send panics raised on worker threads to `tracing` at debug level instead
/// of the default stderr hook. Worker panics are still caught and reported
/// after the board settles. Other threads keep the previous hook.
///
/// Installing twice is a no-op.
pub fn install_worker_panic_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let on_worker = thread::current()
                .name()
                .is_some_and(|name| name.starts_with(WORKER_THREAD_PREFIX));
            if on_worker {
                tracing::debug!("worker panicked: {info}");
            } else {
                previous(info);
            }
        }));
    });
}

/// Final state of one project in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOutcome {
    pub project: ProjectName,
    pub state: EntryState,
}

/// Everything known about a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub stage: StageName,
    /// One entry per requested project, in request order.
    pub outcomes: Vec<ProjectOutcome>,
    pub failures: BTreeMap<ProjectName, WorkerError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Process exit status for this run.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == EntryState::Done)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == EntryState::Failed)
            .count()
    }

    pub fn state_of(&self, project: &ProjectName) -> Option<EntryState> {
        self.outcomes
            .iter()
            .find(|o| &o.project == project)
            .map(|o| o.state)
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Runs one stage across many projects concurrently.
pub struct Orchestrator<R, E> {
    resolver: R,
    executor: E,
    log: OperatorLog,
    mode: RenderMode,
    refresh: Duration,
}

impl<R: CommandResolver, E: CommandExecutor> Orchestrator<R, E> {
    pub fn new(resolver: R, executor: E, log: OperatorLog) -> Self {
        Orchestrator {
            resolver,
            executor,
            log,
            mode: RenderMode::Plain,
            refresh: DEFAULT_REFRESH,
        }
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_refresh_interval(mut self, refresh: Duration) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run `stage` for every project in `projects` and report the outcome.
    ///
    /// Never returns before every worker has finished. Per-project failures
    /// are written to the operator log and returned in the report; they never
    /// stop other projects.
    pub fn run(&self, stage: &StageName, projects: &[ProjectName], config: &Config) -> RunReport {
        let started_at = Utc::now();
        let board = StatusBoard::new();
        let registry = ErrorRegistry::new();

        tracing::info!(stage = %stage, projects = projects.len(), "starting run");

        thread::scope(|scope| {
            for project in projects {
                let entry = board.create(format!("Project: {project}"));
                let registry = &registry;
                let launched = thread::Builder::new()
                    .name(format!("{WORKER_THREAD_PREFIX}{project}"))
                    .spawn_scoped(scope, move || {
                        self.work(stage, project, config, entry, registry)
                    });
                if let Err(err) = launched {
                    // The closure (and its entry handle) was dropped, which
                    // already marked the entry failed.
                    tracing::debug!(project = %project, error = %err, "could not launch worker");
                    registry.insert_if_absent(project.clone(), WorkerError::Launch(err));
                }
            }

            let mut out = self.log.clone();
            if let Err(err) = board.render(&mut out, self.mode, self.refresh) {
                tracing::warn!(error = %err, "status board render failed");
                board.wait();
            }
        });

        let failures = registry.drain();
        let outcomes: Vec<ProjectOutcome> = projects
            .iter()
            .zip(board.snapshot())
            .map(|(project, entry)| ProjectOutcome {
                project: project.clone(),
                state: entry.state,
            })
            .collect();

        for (project, err) in &failures {
            self.report_failure(project, err);
        }

        let finished_at = Utc::now();
        tracing::info!(
            stage = %stage,
            failed = failures.len(),
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "run finished"
        );

        RunReport {
            stage: stage.clone(),
            outcomes,
            failures,
            started_at,
            finished_at,
        }
    }

    fn work(
        &self,
        stage: &StageName,
        project: &ProjectName,
        config: &Config,
        entry: EntryHandle,
        registry: &ErrorRegistry,
    ) {
        tracing::info!(stage = %stage, project = %project, "worker started");
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.attempt(stage, project, config)))
            .unwrap_or_else(|payload| Err(WorkerError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(()) => {
                tracing::info!(stage = %stage, project = %project, "worker done");
                entry.mark_done();
            }
            Err(err) => {
                // Reported after the board settles; anything louder here would
                // land on the terminal mid-render.
                tracing::debug!(stage = %stage, project = %project, error = %err, "worker failed");
                registry.insert_if_absent(project.clone(), err);
                entry.mark_failed();
            }
        }
    }

    fn attempt(
        &self,
        stage: &StageName,
        project: &ProjectName,
        config: &Config,
    ) -> Result<(), WorkerError> {
        let spec = self.resolver.resolve(stage, project, config)?;
        tracing::debug!(
            project = %project,
            dir = %spec.working_dir.display(),
            "resolved: {}",
            spec.command_line
        );

        let mut output = Vec::new();
        if let Err(source) = self.executor.execute(stage, project, &mut output, &spec) {
            return Err(WorkerError::Execute { source, output });
        }
        Ok(())
    }

    fn report_failure(&self, project: &ProjectName, err: &WorkerError) {
        let mut written = Ok(());
        if let Some(output) = err.output() {
            written = self.log.raw(output);
        }
        if written.is_ok() {
            written = self.log.line(format!("Error with project {project}:\n{err}"));
        }
        if let Err(io) = written {
            tracing::warn!(project = %project, error = %io, "could not write failure report");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
