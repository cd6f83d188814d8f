//! Template context — serializable payload a command template is rendered with.

use std::collections::BTreeMap;

use serde::Serialize;

use jules_core::{Config, ProjectName, StageName};

/// Variables visible to a command template.
///
/// | Name      | Value                                                   |
/// |-----------|---------------------------------------------------------|
/// | `project` | project name                                            |
/// | `stage`   | stage name                                              |
/// | `path`    | absolute working directory of the project               |
/// | `root`    | directory holding the config file                       |
/// | `vars`    | global `vars`, overlaid by the project's own `vars`     |
#[derive(Debug, Clone, Serialize)]
pub struct CommandContext {
    pub project: String,
    pub stage: String,
    pub path: String,
    pub root: String,
    pub vars: BTreeMap<String, String>,
}

impl CommandContext {
    pub fn new(stage: &StageName, project: &ProjectName, config: &Config) -> Self {
        let mut vars = config.vars.clone();
        if let Some(p) = config.project(project) {
            vars.extend(p.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        CommandContext {
            project: project.0.clone(),
            stage: stage.0.clone(),
            path: config.project_dir(project).display().to_string(),
            root: config.root.display().to_string(),
            vars,
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, tera::Error> {
        tera::Context::from_serialize(self)
    }
}
