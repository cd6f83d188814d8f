//! [`CommandExecutor`] trait and the process-spawning [`ProcessExecutor`].
//!
//! The shell line is handed to `sh -c` (`cmd /C` on Windows). stdout and
//! stderr are drained by two scoped reader threads that forward chunks over a
//! channel, so the caller's sink receives one combined stream in arrival order
//! without itself having to be `Send`.

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;

use jules_core::{CommandSpec, ProjectName, StageName};

use crate::error::ExecError;

/// Runs a resolved command to completion, writing all of its output to `output`.
pub trait CommandExecutor: Sync {
    fn execute(
        &self,
        stage: &StageName,
        project: &ProjectName,
        output: &mut dyn Write,
        spec: &CommandSpec,
    ) -> Result<(), ExecError>;
}

/// Spawns the command through the platform shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        ProcessExecutor
    }
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}

type Chunk = io::Result<Vec<u8>>;

fn pump(mut reader: impl Read, tx: Sender<Chunk>) {
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Ok(buf[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}

impl CommandExecutor for ProcessExecutor {
    fn execute(
        &self,
        stage: &StageName,
        project: &ProjectName,
        output: &mut dyn Write,
        spec: &CommandSpec,
    ) -> Result<(), ExecError> {
        if !spec.working_dir.is_dir() {
            return Err(ExecError::MissingWorkingDir {
                path: spec.working_dir.clone(),
            });
        }

        let io_err = |source| ExecError::Io {
            command: spec.command_line.clone(),
            source,
        };

        tracing::debug!(
            stage = %stage,
            project = %project,
            dir = %spec.working_dir.display(),
            "spawning: {}",
            spec.command_line
        );

        let mut child = shell_command(&spec.command_line)
            .current_dir(&spec.working_dir)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                command: spec.command_line.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (tx, rx) = mpsc::channel::<Chunk>();

        let forwarded: io::Result<()> = thread::scope(|s| {
            if let Some(out) = stdout {
                let tx = tx.clone();
                s.spawn(move || pump(out, tx));
            }
            if let Some(err) = stderr {
                let tx = tx.clone();
                s.spawn(move || pump(err, tx));
            }
            drop(tx);

            for chunk in rx {
                output.write_all(&chunk?)?;
            }
            output.flush()
        });

        // Reap the child even if forwarding failed.
        let status = child.wait().map_err(io_err)?;
        forwarded.map_err(io_err)?;

        if status.success() {
            tracing::debug!(stage = %stage, project = %project, "command succeeded");
            Ok(())
        } else {
            Err(ExecError::Failed {
                command: spec.command_line.clone(),
                code: status.code(),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::TempDir;

    fn spec(line: &str, dir: &Path) -> CommandSpec {
        CommandSpec {
            stage: StageName::from("build"),
            project: ProjectName::from("api"),
            command_line: line.to_string(),
            working_dir: dir.to_path_buf(),
            env: BTreeMap::new(),
        }
    }

    fn run(spec: &CommandSpec) -> (Result<(), ExecError>, String) {
        let mut out = Vec::new();
        let result = ProcessExecutor::new().execute(&spec.stage, &spec.project, &mut out, spec);
        (result, String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn captures_stdout_and_stderr() {
        let dir = TempDir::new().expect("tempdir");
        let (result, out) = run(&spec("echo to-out; echo to-err 1>&2", dir.path()));
        result.expect("success");
        assert!(out.contains("to-out"), "{out}");
        assert!(out.contains("to-err"), "{out}");
    }

    #[test]
    fn non_zero_exit_is_failed_with_code() {
        let dir = TempDir::new().expect("tempdir");
        let (result, out) = run(&spec("echo partial; exit 3", dir.path()));
        match result {
            Err(ExecError::Failed { code, .. }) => assert_eq!(code, Some(3)),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(out.trim(), "partial");
    }

    #[test]
    fn runs_in_working_dir_with_env() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("marker.txt"), "here").expect("write");
        let mut s = spec("cat marker.txt; printf ' %s' \"$JULES_TEST_VAR\"", dir.path());
        s.env.insert("JULES_TEST_VAR".into(), "set".into());
        let (result, out) = run(&s);
        result.expect("success");
        assert_eq!(out, "here set");
    }

    #[test]
    fn missing_dir_is_reported_before_spawn() {
        let dir = TempDir::new().expect("tempdir");
        let (result, out) = run(&spec("true", &dir.path().join("gone")));
        assert!(matches!(result, Err(ExecError::MissingWorkingDir { .. })));
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_program_fails_through_shell() {
        let dir = TempDir::new().expect("tempdir");
        let (result, out) = run(&spec("definitely-not-a-real-binary-jules", dir.path()));
        match result {
            Err(ExecError::Failed { code, .. }) => assert_eq!(code, Some(127)),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(!out.is_empty(), "shell should explain the missing command");
    }
}
