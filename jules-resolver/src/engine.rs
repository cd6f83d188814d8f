//! [`CommandResolver`] trait and the Tera-backed [`TemplateResolver`].
//!
//! # Lookup order
//!
//! 1. Project must exist in the config.
//! 2. A stage listed in the project's `skip` is refused.
//! 3. The project's own stage override, else the global stage template.
//! 4. Render with [`CommandContext`]; blank output is refused.

use std::collections::BTreeMap;

use tera::Tera;

use jules_core::{CommandSpec, Config, ProjectName, StageName};

use crate::context::CommandContext;
use crate::error::ResolveError;

/// Maps a (stage, project) pair to a runnable command.
///
/// Implementations must be pure functions of their inputs; the orchestrator
/// calls `resolve` once per worker, from many threads at once.
pub trait CommandResolver: Sync {
    fn resolve(
        &self,
        stage: &StageName,
        project: &ProjectName,
        config: &Config,
    ) -> Result<CommandSpec, ResolveError>;
}

/// Renders command templates from the config with Tera.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateResolver;

impl TemplateResolver {
    pub fn new() -> Self {
        TemplateResolver
    }

    fn render(
        &self,
        template: &str,
        stage: &StageName,
        project: &ProjectName,
        config: &Config,
    ) -> Result<String, ResolveError> {
        let template_err = |source| ResolveError::Template {
            stage: stage.clone(),
            project: project.clone(),
            source,
        };
        let ctx = CommandContext::new(stage, project, config)
            .to_tera_context()
            .map_err(template_err)?;
        // Shell lines must not be HTML-escaped.
        Tera::one_off(template, &ctx, false).map_err(template_err)
    }
}

impl CommandResolver for TemplateResolver {
    fn resolve(
        &self,
        stage: &StageName,
        project: &ProjectName,
        config: &Config,
    ) -> Result<CommandSpec, ResolveError> {
        let project_cfg = config
            .project(project)
            .ok_or_else(|| ResolveError::UnknownProject {
                project: project.clone(),
            })?;

        if project_cfg.skip.contains(stage) {
            return Err(ResolveError::Skipped {
                stage: stage.clone(),
                project: project.clone(),
            });
        }

        let stage_cfg = config
            .stage_for(stage, project)
            .ok_or_else(|| ResolveError::NoCommand {
                stage: stage.clone(),
                project: project.clone(),
            })?;

        let rendered = self.render(&stage_cfg.command, stage, project, config)?;
        let command_line = rendered.trim().to_string();
        if command_line.is_empty() {
            return Err(ResolveError::EmptyCommand {
                stage: stage.clone(),
                project: project.clone(),
            });
        }

        // Later layers win: global, stage, project.
        let mut env: BTreeMap<String, String> = config.env.clone();
        env.extend(stage_cfg.env.clone());
        env.extend(project_cfg.env.clone());

        Ok(CommandSpec {
            stage: stage.clone(),
            project: project.clone(),
            command_line,
            working_dir: config.project_dir(project),
            env,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jules_core::{ProjectConfig, StageConfig};
    use std::path::PathBuf;

    fn config() -> Config {
        let mut cfg = Config {
            root: PathBuf::from("/repo"),
            ..Config::default()
        };
        cfg.vars.insert("profile".into(), "release".into());
        cfg.env.insert("CI".into(), "1".into());
        let mut build = StageConfig::new("cargo build --{{ vars.profile }} -p {{ project }}");
        build.env.insert("CARGO_TERM_COLOR".into(), "never".into());
        cfg.stages.insert("build".into(), build);
        cfg.stages.insert("test".into(), StageConfig::new("cargo test"));

        let mut api = ProjectConfig::default();
        api.env.insert("CI".into(), "0".into());
        cfg.projects.insert("api".into(), api);

        let mut web = ProjectConfig {
            path: Some(PathBuf::from("frontend")),
            skip: vec!["test".into()],
            ..ProjectConfig::default()
        };
        web.stages
            .insert("build".into(), StageConfig::new("npm run build --prefix {{ path }}"));
        cfg.projects.insert("web".into(), web);
        cfg
    }

    #[test]
    fn renders_global_template() {
        let spec = TemplateResolver::new()
            .resolve(&"build".into(), &"api".into(), &config())
            .expect("resolve");
        assert_eq!(spec.command_line, "cargo build --release -p api");
        assert_eq!(spec.working_dir, PathBuf::from("/repo/api"));
    }

    #[test]
    fn env_layers_merge_with_project_last() {
        let spec = TemplateResolver::new()
            .resolve(&"build".into(), &"api".into(), &config())
            .expect("resolve");
        assert_eq!(spec.env["CI"], "0");
        assert_eq!(spec.env["CARGO_TERM_COLOR"], "never");
    }

    #[test]
    fn project_override_sees_path() {
        let spec = TemplateResolver::new()
            .resolve(&"build".into(), &"web".into(), &config())
            .expect("resolve");
        let expected = format!(
            "npm run build --prefix {}",
            PathBuf::from("/repo/frontend").display()
        );
        assert_eq!(spec.command_line, expected);
    }

    #[test]
    fn skipped_stage_is_refused() {
        let err = TemplateResolver::new()
            .resolve(&"test".into(), &"web".into(), &config())
            .unwrap_err();
        assert!(matches!(err, ResolveError::Skipped { .. }), "got: {err}");
    }

    #[test]
    fn unknown_project_is_refused() {
        let err = TemplateResolver::new()
            .resolve(&"build".into(), &"ghost".into(), &config())
            .unwrap_err();
        assert_eq!(err.to_string(), "project 'ghost' is not configured");
    }

    #[test]
    fn missing_stage_is_refused() {
        let err = TemplateResolver::new()
            .resolve(&"deploy".into(), &"api".into(), &config())
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoCommand { .. }), "got: {err}");
    }

    #[test]
    fn undefined_variable_is_a_template_error() {
        let mut cfg = config();
        cfg.stages
            .insert("deploy".into(), StageConfig::new("deploy {{ vars.region }}"));
        let err = TemplateResolver::new()
            .resolve(&"deploy".into(), &"api".into(), &cfg)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Template { .. }), "got: {err}");
    }

    #[test]
    fn blank_render_is_refused() {
        let mut cfg = config();
        cfg.stages.insert(
            "noop".into(),
            StageConfig::new("{% if project == 'nobody' %}run{% endif %}"),
        );
        let err = TemplateResolver::new()
            .resolve(&"noop".into(), &"api".into(), &cfg)
            .unwrap_err();
        assert!(matches!(err, ResolveError::EmptyCommand { .. }), "got: {err}");
    }
}
