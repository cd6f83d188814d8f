//! Domain types for the jules configuration.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! All config types are deserializable via serde + serde_yaml.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a project entry in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectName(pub String);

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed name for a stage (`build`, `test`, `deploy`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageName(pub String);

impl StageName {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for StageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StageName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// A command template for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    /// Tera template rendered into a shell line.
    pub command: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl StageConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: BTreeMap::new(),
        }
    }
}

/// Per-project settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Working directory, relative to the config file's directory.
    /// Defaults to a directory named after the project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Stage overrides for this project only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stages: BTreeMap<StageName, StageConfig>,
    /// Stages this project does not take part in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip: Vec<StageName>,
}

/// Root of the jules YAML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub stages: BTreeMap<StageName, StageConfig>,
    #[serde(default)]
    pub projects: BTreeMap<ProjectName, ProjectConfig>,
    /// Directory the config was loaded from. Not part of the file.
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Every configured project, in sorted order.
    pub fn project_names(&self) -> Vec<ProjectName> {
        self.projects.keys().cloned().collect()
    }

    pub fn project(&self, name: &ProjectName) -> Option<&ProjectConfig> {
        self.projects.get(name)
    }

    /// Working directory for `name`, whether or not it is configured.
    pub fn project_dir(&self, name: &ProjectName) -> PathBuf {
        let rel = self
            .projects
            .get(name)
            .and_then(|p| p.path.clone())
            .unwrap_or_else(|| PathBuf::from(&name.0));
        join_root(&self.root, &rel)
    }

    /// Stage template for `project`: the project override first, then the global stage.
    pub fn stage_for(&self, stage: &StageName, project: &ProjectName) -> Option<&StageConfig> {
        self.projects
            .get(project)
            .and_then(|p| p.stages.get(stage))
            .or_else(|| self.stages.get(stage))
    }

    /// All stage names known to the config, global and per-project overrides.
    pub fn known_stages(&self) -> Vec<StageName> {
        let mut all: Vec<StageName> = self
            .stages
            .keys()
            .chain(self.projects.values().flat_map(|p| p.stages.keys()))
            .cloned()
            .collect();
        all.sort();
        all.dedup();
        all
    }
}

fn join_root(root: &Path, rel: &Path) -> PathBuf {
    if rel.is_absolute() {
        rel.to_path_buf()
    } else {
        root.join(rel)
    }
}

// ---------------------------------------------------------------------------
// Resolved command
// ---------------------------------------------------------------------------

/// A fully resolved command, ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub stage: StageName,
    pub project: ProjectName,
    /// Rendered shell line, run through `sh -c`.
    pub command_line: String,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
