//! `jules <stage> [project...]` — run a stage across projects.

use std::collections::HashSet;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory};
use colored::Colorize;

use jules_core::{ProjectName, StageName};
use jules_resolver::TemplateResolver;
use jules_runner::{OperatorLog, Orchestrator, ProcessExecutor, RenderMode, RunReport};

use super::ConfigArg;
use crate::Cli;

/// Exit status for a missing stage, matching clap's own usage errors.
const USAGE_EXIT: u8 = 2;

/// Arguments for a stage run.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stage to run, e.g. build, test, deploy.
    pub stage: Option<String>,

    /// Projects to run the stage for. Defaults to every configured project.
    pub projects: Vec<String>,

    /// Print one line per finished project instead of a live board.
    #[arg(long)]
    pub plain: bool,

    #[command(flatten)]
    pub config: ConfigArg,
}

impl RunArgs {
    pub fn run(self) -> Result<ExitCode> {
        // Checked before the config so a bare `jules` never fails on a missing file.
        let stage = match self.stage.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => StageName::from(s),
            _ => {
                eprintln!("{}", Cli::command().render_help());
                return Ok(ExitCode::from(USAGE_EXIT));
            }
        };

        let config = self.config.load()?;

        let projects = if self.projects.is_empty() {
            config.project_names()
        } else {
            dedup(self.projects)
        };

        let mode = if self.plain {
            RenderMode::Plain
        } else {
            RenderMode::detect()
        };
        let log = OperatorLog::stdout();
        let orchestrator =
            Orchestrator::new(TemplateResolver::new(), ProcessExecutor::new(), log.clone())
                .with_render_mode(mode);

        let report = orchestrator.run(&stage, &projects, &config);
        log.line(summary(&report))
            .context("could not write run summary")?;

        let code = u8::try_from(report.exit_code()).unwrap_or(1);
        Ok(ExitCode::from(code))
    }
}

/// Keep the first occurrence of each project, preserving order.
fn dedup(projects: Vec<String>) -> Vec<ProjectName> {
    let mut seen = HashSet::new();
    projects
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .map(ProjectName::from)
        .collect()
}

fn summary(report: &RunReport) -> String {
    let secs = report.elapsed().num_milliseconds() as f64 / 1000.0;
    let failed = report.failed();
    let counts = format!(
        "{} succeeded, {} failed in {secs:.1}s",
        report.succeeded(),
        failed
    );
    if failed == 0 {
        format!("{} {}: {counts}", "✓".green().bold(), report.stage)
    } else {
        format!("{} {}: {counts}", "✗".red().bold(), report.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_order() {
        let got = dedup(vec!["b".into(), "a".into(), "b".into(), "c".into(), "a".into()]);
        let want: Vec<ProjectName> = vec!["b".into(), "a".into(), "c".into()];
        assert_eq!(got, want);
    }
}
