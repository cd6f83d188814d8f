//! Configuration loading.
//!
//! A single YAML file (`jules.yaml` by default) describes every stage template
//! and every project. Project paths are resolved against the directory the
//! file lives in, so the same config works from any working directory.
//!
//! # API pattern
//!
//! - `read_config_at(path)` — explicit path; used in tests with `TempDir`
//! - `read_config(path)` — resolves a relative path against the current
//!   directory, then delegates to `_at`

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::Config;

/// File name looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "jules.yaml";

/// Load and validate the config at `path`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with path
/// + line context) if malformed YAML, `ConfigError::Invalid` if the file
/// defines no stages or contains blank names/templates.
pub fn read_config_at(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = parse_config(&contents, path)?;
    config.root = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    validate(&config, path)?;
    Ok(config)
}

/// `read_config_at` convenience wrapper resolving relative paths against the cwd.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        cwd.join(path)
    };
    read_config_at(&absolute)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config, ConfigError> {
    // An empty file deserializes to `null`; treat it as an empty mapping so
    // validation produces the more useful message.
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn validate(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason,
    };

    if config.stages.is_empty() && config.projects.values().all(|p| p.stages.is_empty()) {
        return Err(invalid("no stages defined".to_string()));
    }
    for (stage, stage_cfg) in &config.stages {
        if stage.is_empty() {
            return Err(invalid("stage names must not be empty".to_string()));
        }
        if stage_cfg.command.trim().is_empty() {
            return Err(invalid(format!("stage '{stage}' has an empty command")));
        }
    }
    for (project, project_cfg) in &config.projects {
        if project.0.trim().is_empty() {
            return Err(invalid("project names must not be empty".to_string()));
        }
        for (stage, stage_cfg) in &project_cfg.stages {
            if stage_cfg.command.trim().is_empty() {
                return Err(invalid(format!(
                    "project '{project}' overrides stage '{stage}' with an empty command"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProjectName, StageName};
    use tempfile::TempDir;

    fn write(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    fn loads_and_sets_root() {
        let dir = TempDir::new().expect("tempdir");
        let path = write(
            &dir,
            "stages:\n  build:\n    command: make\nprojects:\n  api: {}\n",
        );
        let cfg = read_config_at(&path).expect("load");
        assert_eq!(cfg.root, dir.path());
        assert_eq!(cfg.project_names(), vec![ProjectName::from("api")]);
        assert!(cfg.stages.contains_key(&StageName::from("build")));
    }

    #[test]
    fn empty_file_is_invalid() {
        let dir = TempDir::new().expect("tempdir");
        let path = write(&dir, "");
        let err = read_config_at(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "got: {err}");
        assert!(err.to_string().contains("no stages defined"));
    }

    #[test]
    fn blank_command_is_invalid() {
        let dir = TempDir::new().expect("tempdir");
        let path = write(&dir, "stages:\n  build:\n    command: \"  \"\n");
        let err = read_config_at(&path).unwrap_err();
        assert!(err.to_string().contains("stage 'build' has an empty command"));
    }

    #[test]
    fn project_only_stages_are_accepted() {
        let dir = TempDir::new().expect("tempdir");
        let path = write(
            &dir,
            "projects:\n  api:\n    stages:\n      build:\n        command: make\n",
        );
        assert!(read_config_at(&path).is_ok());
    }
}
