pub mod lint;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use jules_core::{config, Config};

/// `--config` option shared by every command.
#[derive(Args, Debug)]
pub struct ConfigArg {
    /// Path to the configuration file.
    #[arg(short, long = "config", value_name = "PATH", default_value = config::DEFAULT_CONFIG_FILE)]
    pub path: PathBuf,
}

impl ConfigArg {
    pub fn load(&self) -> Result<Config> {
        let config = config::read_config(&self.path)
            .with_context(|| format!("could not load config {}", self.path.display()))?;
        tracing::debug!(
            path = %self.path.display(),
            projects = config.projects.len(),
            stages = config.stages.len(),
            "loaded config"
        );
        Ok(config)
    }
}
