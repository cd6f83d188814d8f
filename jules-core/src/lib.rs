//! jules core library — configuration types, loading, lint checks, errors.
//!
//! - [`types`] — newtypes, config structs and [`CommandSpec`]
//! - [`error`] — [`ConfigError`]
//! - [`config`] — read and validate `jules.yaml`
//! - [`lint`] — static checks over a loaded [`Config`]

pub mod config;
pub mod error;
pub mod lint;
pub mod types;

pub use error::ConfigError;
pub use types::{CommandSpec, Config, ProjectConfig, ProjectName, StageConfig, StageName};
