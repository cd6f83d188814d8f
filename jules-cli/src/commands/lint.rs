//! `jules lint` — static configuration checks.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use jules_core::{
    lint::{self, LintIssue, LintReport, Severity},
    Config,
};
use jules_resolver::{CommandResolver, ResolveError, TemplateResolver};

use super::ConfigArg;

/// Arguments for `jules lint`.
#[derive(Args, Debug)]
pub struct LintArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub config: ConfigArg,
}

impl LintArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = self.config.load()?;
        let report = build_report(&config);

        if self.json {
            print_json(&config, &report)?;
        } else {
            print_table(&config, &report);
        }

        Ok(if report.has_errors() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}

/// Static checks plus a dry render of every template.
fn build_report(config: &Config) -> LintReport {
    let mut report = lint::lint(config);
    let resolver = TemplateResolver::new();

    for project in config.project_names() {
        for stage in config.known_stages() {
            // Missing and skipped pairs are already covered by the static pass.
            if config.stage_for(&stage, &project).is_none() {
                continue;
            }
            match resolver.resolve(&stage, &project, config) {
                Ok(_) | Err(ResolveError::Skipped { .. }) => {}
                Err(err) => report.push(
                    Some(&project),
                    Some(&stage),
                    Severity::Error,
                    err.to_string(),
                ),
            }
        }
    }
    report
}

#[derive(Serialize)]
struct LintJson<'a> {
    summary: LintSummaryJson,
    issues: &'a [LintIssue],
}

#[derive(Serialize)]
struct LintSummaryJson {
    projects: usize,
    stages: usize,
    errors: usize,
    warnings: usize,
}

#[derive(Tabled)]
struct LintTableRow {
    #[tabled(rename = "project")]
    project: String,
    #[tabled(rename = "stage")]
    stage: String,
    #[tabled(rename = "severity")]
    severity: String,
    #[tabled(rename = "issue")]
    message: String,
}

fn print_json(config: &Config, report: &LintReport) -> Result<()> {
    let errors = report.error_count();
    let payload = LintJson {
        summary: LintSummaryJson {
            projects: config.projects.len(),
            stages: config.known_stages().len(),
            errors,
            warnings: report.issues.len() - errors,
        },
        issues: &report.issues,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize lint JSON")?
    );
    Ok(())
}

fn print_table(config: &Config, report: &LintReport) {
    println!(
        "jules v{} | {} projects | {} stages | {} issues",
        env!("CARGO_PKG_VERSION"),
        config.projects.len(),
        config.known_stages().len(),
        report.issues.len(),
    );

    if report.issues.is_empty() {
        println!("{} configuration looks good", "✓".green().bold());
        return;
    }

    let rows: Vec<LintTableRow> = report
        .issues
        .iter()
        .map(|issue| LintTableRow {
            project: issue
                .project
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            stage: issue
                .stage
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            severity: severity_label(issue.severity),
            message: issue.message.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Error => "ERROR".red().bold().to_string(),
        Severity::Warning => "WARN".yellow().bold().to_string(),
    }
}
