//! # jules-resolver
//!
//! Turns a (stage, project) pair into a runnable [`CommandSpec`] by rendering
//! the configured Tera command template.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jules_core::{Config, ProjectName, StageName};
//! use jules_resolver::{CommandResolver, TemplateResolver};
//!
//! fn show(config: &Config) {
//!     let resolver = TemplateResolver::new();
//!     let stage = StageName::from("build");
//!     for project in config.project_names() {
//!         match resolver.resolve(&stage, &project, config) {
//!             Ok(spec) => println!("{project}: {}", spec.command_line),
//!             Err(e) => println!("{project}: {e}"),
//!         }
//!     }
//! }
//! ```
//!
//! [`CommandSpec`]: jules_core::CommandSpec

pub mod context;
pub mod engine;
pub mod error;

pub use context::CommandContext;
pub use engine::{CommandResolver, TemplateResolver};
pub use error::ResolveError;
