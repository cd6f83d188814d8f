//! Static checks over a loaded [`Config`].
//!
//! Lint never runs anything. It walks every (project, stage) pair and reports
//! gaps that would otherwise only surface as per-project failures mid-run.

use serde::Serialize;

use crate::types::{Config, ProjectName, StageName};

/// How bad a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single lint finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub project: Option<ProjectName>,
    pub stage: Option<StageName>,
    pub severity: Severity,
    pub message: String,
}

/// All findings for one config, in the order they were discovered.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LintReport {
    pub issues: Vec<LintIssue>,
}

impl LintReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn push(
        &mut self,
        project: Option<&ProjectName>,
        stage: Option<&StageName>,
        severity: Severity,
        message: impl Into<String>,
    ) {
        self.issues.push(LintIssue {
            project: project.cloned(),
            stage: stage.cloned(),
            severity,
            message: message.into(),
        });
    }
}

/// Check every project against every known stage.
pub fn lint(config: &Config) -> LintReport {
    let mut report = LintReport::default();
    let stages = config.known_stages();

    if config.projects.is_empty() {
        report.push(None, None, Severity::Warning, "no projects configured");
    }

    for (name, project) in &config.projects {
        let dir = config.project_dir(name);
        if !dir.is_dir() {
            report.push(
                Some(name),
                None,
                Severity::Error,
                format!("working directory {} does not exist", dir.display()),
            );
        }

        for skipped in &project.skip {
            if !stages.contains(skipped) {
                report.push(
                    Some(name),
                    Some(skipped),
                    Severity::Warning,
                    "skips a stage that is not defined anywhere",
                );
            }
        }

        for overridden in project.stages.keys() {
            if project.skip.contains(overridden) {
                report.push(
                    Some(name),
                    Some(overridden),
                    Severity::Warning,
                    "overrides a stage it also skips",
                );
            }
        }

        for stage in &stages {
            if project.skip.contains(stage) {
                continue;
            }
            if config.stage_for(stage, name).is_none() {
                report.push(
                    Some(name),
                    Some(stage),
                    Severity::Error,
                    "no command template for this stage",
                );
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProjectConfig, StageConfig};
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            root: dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn clean_config_has_no_issues() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir(dir.path().join("api")).expect("mkdir");
        let mut cfg = config_in(&dir);
        cfg.stages.insert("build".into(), StageConfig::new("make"));
        cfg.projects.insert("api".into(), ProjectConfig::default());

        let report = lint(&cfg);
        assert!(report.issues.is_empty(), "{:?}", report.issues);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let mut cfg = config_in(&dir);
        cfg.stages.insert("build".into(), StageConfig::new("make"));
        cfg.projects.insert("ghost".into(), ProjectConfig::default());

        let report = lint(&cfg);
        assert!(report.has_errors());
        assert!(report.issues[0].message.contains("does not exist"));
    }

    #[test]
    fn project_only_stage_flags_other_projects() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir(dir.path().join("api")).expect("mkdir");
        std::fs::create_dir(dir.path().join("web")).expect("mkdir");
        let mut cfg = config_in(&dir);
        let mut web = ProjectConfig::default();
        web.stages.insert("bundle".into(), StageConfig::new("npm run bundle"));
        cfg.projects.insert("web".into(), web);
        cfg.projects.insert("api".into(), ProjectConfig::default());

        let report = lint(&cfg);
        assert_eq!(report.error_count(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.project, Some(ProjectName::from("api")));
        assert_eq!(issue.stage, Some(StageName::from("bundle")));
    }

    #[test]
    fn skipped_stage_is_not_required() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir(dir.path().join("api")).expect("mkdir");
        std::fs::create_dir(dir.path().join("web")).expect("mkdir");
        let mut cfg = config_in(&dir);
        let mut web = ProjectConfig::default();
        web.stages.insert("bundle".into(), StageConfig::new("npm run bundle"));
        cfg.projects.insert("web".into(), web);
        let api = ProjectConfig {
            skip: vec!["bundle".into()],
            ..ProjectConfig::default()
        };
        cfg.projects.insert("api".into(), api);

        assert!(!lint(&cfg).has_errors());
    }

    #[test]
    fn unknown_skip_is_a_warning() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir(dir.path().join("api")).expect("mkdir");
        let mut cfg = config_in(&dir);
        cfg.stages.insert("build".into(), StageConfig::new("make"));
        let api = ProjectConfig {
            skip: vec!["deploy".into()],
            ..ProjectConfig::default()
        };
        cfg.projects.insert("api".into(), api);

        let report = lint(&cfg);
        assert!(!report.has_errors());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].severity, Severity::Warning);
    }
}
